//! Security: bandit + safety statically, OWASP ZAP dynamically
//!
//! static  = 0.7 × bandit + 0.3 × safety
//! final   = static, or 0.6 × static + 0.4 × zap when a web app URL is set

use super::base::{Assessor, AssessorSettings, NO_PYTHON_FILES};
use super::external_tool::{
    argv, python_tool_command, read_json_report, run_external_tool, ToolError,
};
use crate::error::BenchError;
use crate::models::AssessmentOutcome;
use crate::parsers;
use crate::scoring::{
    adjust_for_size, clamp_score, classify_codebase, confidence_interval, MetricKind,
    DEFAULT_CONFIDENCE,
};
use anyhow::{bail, Context, Result};
use serde_json::Value;
use std::path::Path;
use tracing::{debug, warn};

const ZAP_IMAGE: &str = "zaproxy/zap-stable";
const MAX_BANDIT_FINDINGS: usize = 10;
const MAX_SAFETY_FINDINGS: usize = 5;
const DOCKER_KILL_TIMEOUT_SECS: u64 = 30;

pub struct SecurityAssessor {
    python: String,
    timeout_secs: u64,
    web_app_url: Option<String>,
    zap_timeout_secs: u64,
}

impl SecurityAssessor {
    pub fn new(settings: &AssessorSettings) -> Self {
        Self {
            python: settings.python.clone(),
            timeout_secs: settings.tool_timeout_secs,
            web_app_url: settings.web_app_url.clone(),
            zap_timeout_secs: settings.zap_timeout_secs,
        }
    }
}

/// A sub-score with the detail lines that justify it.
struct Partial {
    score: f64,
    details: Vec<String>,
}

impl Partial {
    fn single(score: f64, detail: impl Into<String>) -> Self {
        Self {
            score,
            details: vec![detail.into()],
        }
    }
}

impl Assessor for SecurityAssessor {
    fn id(&self) -> &'static str {
        "security"
    }

    fn description(&self) -> &'static str {
        "Static vulnerability scans (bandit, safety) and optional ZAP baseline scan"
    }

    fn assess(&self, codebase: &Path) -> Result<AssessmentOutcome> {
        if parsers::python_files(codebase).is_empty() {
            return Ok(AssessmentOutcome::neutral(0.0, NO_PYTHON_FILES));
        }

        let bandit = self.run_bandit(codebase);
        let safety = self.run_safety(codebase);
        let static_score = 0.7 * bandit.score + 0.3 * safety.score;

        let mut details = bandit.details;
        details.extend(safety.details);

        let mut samples = vec![static_score];
        let final_score = match self.web_app_url.as_deref() {
            Some(url) => {
                let zap = self.run_zap(url)?;
                details.extend(zap.details);
                samples.push(zap.score);
                0.6 * static_score + 0.4 * zap.score
            }
            None => {
                details.push(
                    "No web app URL provided (set BENCH_WEB_APP_URL or --web-app-url). Using static analysis only."
                        .to_string(),
                );
                static_score
            }
        };

        let bucket = classify_codebase(codebase);
        let adjusted = adjust_for_size(final_score, bucket, MetricKind::Other);

        Ok(AssessmentOutcome::new(adjusted, details)
            .with_metric("bandit_score", bandit.score)
            .with_metric("safety_score", safety.score)
            .with_metric("static_score", static_score)
            .with_metric("size_bucket", bucket.as_str())
            .with_metric("unadjusted_score", final_score)
            .with_confidence_interval(confidence_interval(&samples, DEFAULT_CONFIDENCE)))
    }
}

impl SecurityAssessor {
    fn run_bandit(&self, codebase: &Path) -> Partial {
        let mut cmd = python_tool_command(&self.python, "bandit", "bandit");
        cmd.extend(argv(["-r", &codebase.display().to_string(), "-f", "json", "-q"]));

        // bandit exits 1 when it finds issues; only the JSON matters
        match run_external_tool(&cmd, "bandit", self.timeout_secs, None, None)
            .and_then(|out| out.json())
        {
            Ok(report) => bandit_partial(&report),
            Err(e) => {
                debug!("{}", BenchError::from(e));
                Partial::single(0.0, "[Bandit] Could not run bandit.")
            }
        }
    }

    fn run_safety(&self, codebase: &Path) -> Partial {
        let requirements = codebase.join("requirements.txt");
        if !requirements.is_file() {
            return Partial::single(8.0, "[Safety] No requirements.txt found.");
        }

        let mut cmd = python_tool_command(&self.python, "safety", "safety");
        cmd.extend([
            "check".to_string(),
            format!("--file={}", requirements.display()),
            "--json".to_string(),
        ]);
        match run_external_tool(&cmd, "safety", self.timeout_secs, None, None)
            .and_then(|out| out.json())
        {
            Ok(report) => safety_partial(&report),
            Err(e) => {
                debug!("{}", BenchError::from(e));
                Partial::single(5.0, "[Safety] Could not run safety.")
            }
        }
    }

    fn run_zap(&self, url: &str) -> Result<Partial> {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            bail!("Invalid web app URL '{}': expected http:// or https://", url);
        }

        let scratch = tempfile::tempdir().context("Failed to create ZAP scratch dir")?;
        let container = zap_container_name();
        let cmd = zap_command(url, scratch.path(), &container);

        let mut details = vec![format!("[ZAP] Running baseline scan on {}", url)];
        let result = run_external_tool(&cmd, "zap", self.zap_timeout_secs, None, None)
            .and_then(|_| read_json_report("zap", &scratch.path().join("report.json")));
        if matches!(result, Err(ToolError::TimedOut { .. })) {
            // killing the docker client leaves the container running
            let kill = argv(["docker", "kill", container.as_str()]);
            if let Err(e) = run_external_tool(&kill, "docker", DOCKER_KILL_TIMEOUT_SECS, None, None) {
                warn!("Could not stop ZAP container {}: {}", container, e);
            }
        }

        let score = match result {
            Ok(report) => {
                let (high, medium, low) = zap_risk_counts(&report);
                details.push(format!(
                    "[ZAP] Findings - High: {}, Medium: {}, Low: {}",
                    high, medium, low
                ));
                clamp_score(10.0 - (4.0 * high as f64 + 2.0 * medium as f64 + 0.5 * low as f64))
            }
            Err(ToolError::TimedOut { .. }) => {
                details.push("[ZAP] Scan timed out (>2 min)".to_string());
                3.0
            }
            Err(e) if e.is_unavailable() => {
                debug!("{}", BenchError::from(e));
                details.push(
                    "[ZAP] Docker/ZAP not available. Install: docker pull zaproxy/zap-stable"
                        .to_string(),
                );
                5.0
            }
            Err(ToolError::Unparseable { .. }) => {
                details.push("[ZAP] Scan completed but could not parse results".to_string());
                5.0
            }
            Err(e) => {
                warn!("ZAP scan failed: {}", e);
                details.push(format!("[ZAP] Error: {}", e));
                3.0
            }
        };
        Ok(Partial { score, details })
    }
}

/// Unique per scan so a timed-out container can be killed by name.
fn zap_container_name() -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or_default();
    format!("repobench-zap-{}-{}", std::process::id(), nanos)
}

fn zap_command(url: &str, scratch: &Path, container: &str) -> Vec<String> {
    argv([
        "docker",
        "run",
        "--rm",
        "--name",
        container,
        "-v",
        format!("{}:/zap/wrk/:rw", scratch.display()).as_str(),
        "-t",
        ZAP_IMAGE,
        "zap-baseline.py",
        "-t",
        url,
        "-J",
        "report.json",
    ])
}

fn bandit_partial(report: &Value) -> Partial {
    let results = report
        .get("results")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    let count = |severity: &str| {
        results
            .iter()
            .filter(|r| r.get("issue_severity").and_then(Value::as_str) == Some(severity))
            .count()
    };
    let (high, medium, low) = (count("HIGH"), count("MEDIUM"), count("LOW"));

    let mut details = vec![format!(
        "[Bandit] High: {}, Medium: {}, Low: {}",
        high, medium, low
    )];
    details.extend(results.iter().take(MAX_BANDIT_FINDINGS).map(|r| {
        format!(
            "  - {} ({}:{})",
            str_field(r, "issue_text"),
            str_field(r, "filename"),
            r.get("line_number").and_then(Value::as_u64).unwrap_or(0)
        )
    }));

    let penalty = 3.0 * high as f64 + medium as f64 + 0.5 * low as f64;
    Partial {
        score: clamp_score(10.0 - penalty),
        details,
    }
}

/// Accepts both the legacy array report and the `{"vulnerabilities": [...]}` form.
fn safety_partial(report: &Value) -> Partial {
    let vulnerabilities = report
        .as_array()
        .or_else(|| report.get("vulnerabilities").and_then(Value::as_array))
        .map(Vec::as_slice)
        .unwrap_or_default();

    let mut details = vec![format!(
        "[Safety] {} vulnerable dependencies",
        vulnerabilities.len()
    )];
    details.extend(vulnerabilities.iter().take(MAX_SAFETY_FINDINGS).map(|v| {
        let package = v
            .get("package_name")
            .and_then(Value::as_str)
            .or_else(|| v.get(0).and_then(Value::as_str))
            .unwrap_or("unknown");
        let advisory = v
            .get("advisory")
            .and_then(Value::as_str)
            .or_else(|| v.get(3).and_then(Value::as_str))
            .unwrap_or_default();
        let advisory: String = advisory.chars().take(100).collect();
        format!("  - {}: {}...", package, advisory)
    }));

    Partial {
        score: clamp_score(10.0 - 2.0 * vulnerabilities.len() as f64),
        details,
    }
}

/// (high, medium, low) alert counts from a ZAP JSON report.
fn zap_risk_counts(report: &Value) -> (usize, usize, usize) {
    let mut counts = (0, 0, 0);
    let sites = report.get("site").and_then(Value::as_array);
    for alert in sites
        .into_iter()
        .flatten()
        .filter_map(|site| site.get("alerts").and_then(Value::as_array))
        .flatten()
    {
        let risk = match alert.get("riskcode") {
            Some(Value::String(code)) => code.parse::<u8>().ok(),
            Some(Value::Number(code)) => code.as_u64().map(|c| c as u8),
            _ => None,
        };
        match risk {
            Some(3) => counts.0 += 1,
            Some(2) => counts.1 += 1,
            Some(1) => counts.2 += 1,
            _ => {}
        }
    }
    counts
}

fn str_field<'a>(value: &'a Value, key: &str) -> &'a str {
    value.get(key).and_then(Value::as_str).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bandit_scoring() {
        let report = json!({
            "results": [
                {"issue_severity": "HIGH", "issue_text": "Use of exec", "filename": "a.py", "line_number": 3},
                {"issue_severity": "MEDIUM", "issue_text": "Pickle", "filename": "b.py", "line_number": 9},
                {"issue_severity": "LOW", "issue_text": "assert", "filename": "c.py", "line_number": 1}
            ]
        });
        let partial = bandit_partial(&report);
        assert_eq!(partial.score, 10.0 - 4.5);
        assert_eq!(partial.details[0], "[Bandit] High: 1, Medium: 1, Low: 1");
        assert_eq!(partial.details[1], "  - Use of exec (a.py:3)");
        assert_eq!(partial.details.len(), 4);
    }

    #[test]
    fn test_bandit_score_floors_at_zero() {
        let results: Vec<_> = (0..5)
            .map(|i| json!({"issue_severity": "HIGH", "issue_text": "x", "filename": "f.py", "line_number": i}))
            .collect();
        let partial = bandit_partial(&json!({ "results": results }));
        assert_eq!(partial.score, 0.0);
    }

    #[test]
    fn test_safety_report_shapes() {
        let object = json!({"vulnerabilities": [
            {"package_name": "django", "advisory": "Remote code execution"}
        ]});
        let partial = safety_partial(&object);
        assert_eq!(partial.score, 8.0);
        assert_eq!(partial.details[0], "[Safety] 1 vulnerable dependencies");
        assert_eq!(partial.details[1], "  - django: Remote code execution...");

        let legacy = json!([["flask", "<1.0", "0.9", "Old flask", "123"], ["jinja2", "<2", "1", "XSS", "456"]]);
        let partial = safety_partial(&legacy);
        assert_eq!(partial.score, 6.0);
        assert_eq!(partial.details[2], "  - jinja2: XSS...");
    }

    #[test]
    fn test_zap_risk_counts() {
        let report = json!({"site": [
            {"alerts": [{"riskcode": "3"}, {"riskcode": "2"}, {"riskcode": "1"}, {"riskcode": "0"}]},
            {"alerts": [{"riskcode": 1}]}
        ]});
        assert_eq!(zap_risk_counts(&report), (1, 1, 2));
        assert_eq!(zap_risk_counts(&json!({})), (0, 0, 0));
    }

    #[test]
    fn test_missing_requirements_is_neutral() {
        let dir = tempfile::tempdir().unwrap();
        let assessor = SecurityAssessor::new(&AssessorSettings::default());
        let partial = assessor.run_safety(dir.path());
        assert_eq!(partial.score, 8.0);
        assert_eq!(partial.details, vec!["[Safety] No requirements.txt found."]);
    }

    #[test]
    fn test_zap_container_is_named_and_removed() {
        let name = zap_container_name();
        assert!(name.starts_with(&format!("repobench-zap-{}-", std::process::id())));

        let cmd = zap_command("http://localhost:8000", Path::new("/tmp/scan"), &name);
        assert_eq!(&cmd[..5], ["docker", "run", "--rm", "--name", name.as_str()]);
        assert!(cmd.contains(&"/tmp/scan:/zap/wrk/:rw".to_string()));
        assert_eq!(cmd.last().map(String::as_str), Some("report.json"));
    }

    #[test]
    fn test_rejects_non_http_url() {
        let assessor = SecurityAssessor::new(&AssessorSettings::default());
        assert!(assessor.run_zap("ftp://example.com").is_err());
    }

    #[test]
    fn test_empty_codebase() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = SecurityAssessor::new(&AssessorSettings::default())
            .assess(dir.path())
            .unwrap();
        assert_eq!(outcome.details, vec![NO_PYTHON_FILES]);
    }
}
