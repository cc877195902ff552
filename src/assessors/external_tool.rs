//! Structured runner for external analysis tools
//!
//! Assessors that wrap bandit, radon, pytest, docker and friends go through
//! this module so that scoring code never scrapes raw process output:
//! 1. Run the tool as a subprocess with `std::process::Command`
//! 2. Get back a typed `ToolOutput` (exit code, stdout, stderr) or a `ToolError`
//! 3. Parse JSON through `ToolOutput::json`, which reports `Unparseable` explicitly

use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};

/// Why a tool run produced no usable output.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ToolError {
    #[error("{tool} not found. Please install it first.")]
    NotInstalled { tool: String },

    #[error("{tool} timed out after {secs}s")]
    TimedOut { tool: String, secs: u64 },

    #[error("Failed to run {tool}: {reason}")]
    Failed { tool: String, reason: String },

    #[error("Could not parse {tool} output: {reason}")]
    Unparseable { tool: String, reason: String },
}

impl ToolError {
    /// Missing or mis-configured tool, as opposed to a tool that ran badly
    pub fn is_unavailable(&self) -> bool {
        matches!(self, ToolError::NotInstalled { .. })
    }
}

/// Output from a tool that ran to completion (any exit code).
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub tool: String,
    pub stdout: String,
    pub stderr: String,
    /// `None` when the process was terminated by a signal
    pub return_code: Option<i32>,
}

impl ToolOutput {
    pub fn succeeded(&self) -> bool {
        self.return_code == Some(0)
    }

    /// Parse stdout as JSON
    pub fn json(&self) -> Result<JsonValue, ToolError> {
        parse_json(&self.tool, &self.stdout)
    }
}

/// Parse tool-produced JSON text, mapping failures to `Unparseable`.
pub fn parse_json(tool: &str, text: &str) -> Result<JsonValue, ToolError> {
    if text.trim().is_empty() {
        return Err(ToolError::Unparseable {
            tool: tool.to_string(),
            reason: "empty output".to_string(),
        });
    }
    serde_json::from_str(text).map_err(|e| ToolError::Unparseable {
        tool: tool.to_string(),
        reason: e.to_string(),
    })
}

/// Read a JSON report file written by a tool.
pub fn read_json_report(tool: &str, path: &Path) -> Result<JsonValue, ToolError> {
    let text = std::fs::read_to_string(path).map_err(|e| ToolError::Unparseable {
        tool: tool.to_string(),
        reason: format!("report {} not readable: {}", path.display(), e),
    })?;
    parse_json(tool, &text)
}

/// Run an external tool
///
/// # Arguments
/// * `cmd` - Command and arguments to run
/// * `tool_name` - Human-readable tool name for error messages
/// * `timeout_secs` - Timeout in seconds (0 = no timeout)
/// * `cwd` - Working directory for the tool
/// * `env` - Additional environment variables
pub fn run_external_tool(
    cmd: &[String],
    tool_name: &str,
    timeout_secs: u64,
    cwd: Option<&Path>,
    env: Option<&HashMap<String, String>>,
) -> Result<ToolOutput, ToolError> {
    let Some((program, args)) = cmd.split_first() else {
        return Err(ToolError::Failed {
            tool: tool_name.to_string(),
            reason: "Empty command".to_string(),
        });
    };

    debug!("Running {}: {} {:?}", tool_name, program, args);

    let mut command = Command::new(program);
    command.args(args);

    if let Some(dir) = cwd {
        command.current_dir(dir);
    }

    if let Some(extra_env) = env {
        for (key, value) in extra_env {
            command.env(key, value);
        }
    }

    command.stdin(Stdio::null());
    command.stdout(Stdio::piped());
    command.stderr(Stdio::piped());

    let mut child = command.spawn().map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ToolError::NotInstalled {
                tool: tool_name.to_string(),
            }
        } else {
            ToolError::Failed {
                tool: tool_name.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    // Drain pipes on their own threads so a chatty tool cannot block on a full pipe
    let stdout_reader = spawn_reader(child.stdout.take());
    let stderr_reader = spawn_reader(child.stderr.take());

    let status = match wait_with_timeout(&mut child, tool_name, timeout_secs) {
        Ok(status) => status,
        Err(e) => {
            release_readers(tool_name, [stdout_reader, stderr_reader]);
            return Err(e);
        }
    };

    Ok(ToolOutput {
        tool: tool_name.to_string(),
        stdout: stdout_reader.join().unwrap_or_default(),
        stderr: stderr_reader.join().unwrap_or_default(),
        return_code: status.code(),
    })
}

fn spawn_reader<R: Read + Send + 'static>(pipe: Option<R>) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        String::from_utf8_lossy(&buf).into_owned()
    })
}

/// After a kill the pipes close and the readers finish, unless a grandchild
/// inherited them. Wait briefly, then leave any straggler detached.
fn release_readers(tool_name: &str, readers: [thread::JoinHandle<String>; 2]) {
    let deadline = Instant::now() + READER_GRACE;
    while readers.iter().any(|r| !r.is_finished()) && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(20));
    }
    for reader in readers {
        if reader.is_finished() {
            let _ = reader.join();
        } else {
            debug!("{} left an output pipe open; detaching its reader", tool_name);
        }
    }
}

const READER_GRACE: Duration = Duration::from_secs(2);

/// Poll for completion, killing the process once the deadline passes
fn wait_with_timeout(
    child: &mut Child,
    tool_name: &str,
    timeout_secs: u64,
) -> Result<std::process::ExitStatus, ToolError> {
    let start = Instant::now();
    let timeout = Duration::from_secs(timeout_secs);

    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(status),
            Ok(None) => {
                if timeout_secs > 0 && start.elapsed() > timeout {
                    let _ = child.kill();
                    let _ = child.wait();
                    warn!("{} timed out after {}s", tool_name, timeout_secs);
                    return Err(ToolError::TimedOut {
                        tool: tool_name.to_string(),
                        secs: timeout_secs,
                    });
                }
                thread::sleep(Duration::from_millis(100));
            }
            Err(e) => {
                return Err(ToolError::Failed {
                    tool: tool_name.to_string(),
                    reason: format!("Failed to wait: {}", e),
                });
            }
        }
    }
}

/// Check if a tool is installed
pub fn is_tool_installed(tool: &str) -> bool {
    Command::new(tool)
        .arg("--version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Command prefix for a Python tool: the console script when it is on PATH,
/// otherwise `python -m <module>`.
pub fn python_tool_command(python: &str, tool: &str, module: &str) -> Vec<String> {
    if is_tool_installed(tool) {
        vec![tool.to_string()]
    } else {
        vec![python.to_string(), "-m".to_string(), module.to_string()]
    }
}

/// Owned argv from string-ish parts
pub fn argv<I, S>(parts: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    parts.into_iter().map(|p| p.as_ref().to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_tool_is_unavailable() {
        let err = run_external_tool(
            &argv(["repobench-definitely-not-a-tool", "--json"]),
            "ghost",
            5,
            None,
            None,
        )
        .unwrap_err();
        assert!(err.is_unavailable());
        assert_eq!(
            err,
            ToolError::NotInstalled {
                tool: "ghost".into()
            }
        );
    }

    #[test]
    fn test_empty_command() {
        let err = run_external_tool(&[], "nothing", 0, None, None).unwrap_err();
        assert!(matches!(err, ToolError::Failed { .. }));
    }

    #[test]
    fn test_json_parsing() {
        let output = ToolOutput {
            tool: "t".into(),
            stdout: r#"{"key": "value"}"#.into(),
            stderr: String::new(),
            return_code: Some(0),
        };
        assert!(output.succeeded());
        assert_eq!(output.json().unwrap()["key"], "value");

        let garbage = ToolOutput {
            stdout: "Traceback (most recent call last):".into(),
            ..output.clone()
        };
        assert!(matches!(garbage.json(), Err(ToolError::Unparseable { .. })));

        let empty = ToolOutput {
            stdout: "  \n".into(),
            ..output
        };
        assert!(matches!(empty.json(), Err(ToolError::Unparseable { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_captures_output_env_and_exit_code() {
        let mut env = HashMap::new();
        env.insert("REPOBENCH_TEST_VALUE".to_string(), "42".to_string());
        let output = run_external_tool(
            &argv(["sh", "-c", "echo $REPOBENCH_TEST_VALUE; echo oops >&2; exit 3"]),
            "sh",
            10,
            None,
            Some(&env),
        )
        .unwrap();
        assert_eq!(output.stdout.trim(), "42");
        assert_eq!(output.stderr.trim(), "oops");
        assert_eq!(output.return_code, Some(3));
        assert!(!output.succeeded());
    }

    #[cfg(unix)]
    #[test]
    fn test_timeout_kills_process() {
        let err = run_external_tool(&argv(["sleep", "5"]), "sleep", 1, None, None).unwrap_err();
        assert_eq!(
            err,
            ToolError::TimedOut {
                tool: "sleep".into(),
                secs: 1
            }
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_timeout_returns_despite_inherited_pipes() {
        // the background sleep keeps stdout open after its parent is killed
        let start = Instant::now();
        let err = run_external_tool(
            &argv(["sh", "-c", "sleep 30 & sleep 10"]),
            "sh",
            1,
            None,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, ToolError::TimedOut { .. }));
        assert!(start.elapsed() < Duration::from_secs(8), "{:?}", start.elapsed());
    }
}
