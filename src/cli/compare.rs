//! `repobench compare` command

use crate::assessors::{AssessorRegistry, AssessorSettings};
use crate::config::{SkipList, UserConfig, WeightMap};
use crate::engine::ComparisonEngine;
use crate::error::BenchError;
use crate::history::{record_comparison, RunStore};
use crate::reporters::{self, OutputFormat};
use anyhow::{Context, Result};
use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, warn};

#[derive(Args, Debug)]
pub struct CompareArgs {
    /// First codebase directory
    pub codebase1: PathBuf,

    /// Second codebase directory
    pub codebase2: PathBuf,

    /// JSON weight map, e.g. '{"Readability": 1.2, "Security": 2}'
    #[arg(long, short = 'w', default_value = "{}")]
    pub weights: String,

    /// Comma-separated assessors to skip, e.g. 'Testability,GitHealth'
    #[arg(long)]
    pub skip: Option<String>,

    /// Write the full results as JSON to this file
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Python script to profile for the performance score
    #[arg(long, env = "BENCH_PROFILE_SCRIPT")]
    pub profile: Option<PathBuf>,

    /// Running web app to scan for the security score
    #[arg(long, env = "BENCH_WEB_APP_URL")]
    pub web_app_url: Option<String>,

    /// Show detail lines for every assessor
    #[arg(long, short = 'v')]
    pub verbose: bool,

    /// Output format: text or json
    #[arg(long, short = 'f', default_value = "text", value_parser = ["text", "json"])]
    pub format: String,

    /// Do not record this run in the history database
    #[arg(long)]
    pub no_history: bool,

    /// Run history database file
    #[arg(long, env = "REPOBENCH_HISTORY_DB")]
    pub history_db: Option<PathBuf>,

    /// Include the LLM score (needs an API key for the configured backend)
    #[arg(long)]
    pub llm: bool,
}

/// Assessor settings from the user config, overridden by flags.
fn build_settings(args: &CompareArgs, config: &UserConfig) -> Result<AssessorSettings> {
    let defaults = AssessorSettings::default();
    let llm = if args.llm || config.llm_enabled() {
        Some(config.llm_config().context("Invalid [llm] section in user config")?)
    } else {
        None
    };
    Ok(AssessorSettings {
        python: config.tools.python.clone().unwrap_or(defaults.python),
        tool_timeout_secs: config.tools.timeout_secs.unwrap_or(defaults.tool_timeout_secs),
        profile_script: args.profile.as_deref().map(absolute).transpose()?,
        profile_runs: config.tools.profile_runs.unwrap_or(defaults.profile_runs),
        web_app_url: args.web_app_url.clone().filter(|url| !url.trim().is_empty()),
        zap_timeout_secs: config
            .tools
            .zap_timeout_secs
            .unwrap_or(defaults.zap_timeout_secs),
        llm,
    })
}

/// Anchor a relative path at the current directory; tools run from inside the codebase.
fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    Ok(cwd.join(path))
}

/// Where to record runs, or `None` when recording is off.
pub(super) fn history_path(
    flag: Option<PathBuf>,
    config: &UserConfig,
    disabled: bool,
) -> Option<PathBuf> {
    if disabled || !config.history_enabled() {
        return None;
    }
    flag.or_else(|| config.history.path.clone())
        .or_else(RunStore::default_path)
}

fn progress_bar(total: usize) -> ProgressBar {
    let bar = ProgressBar::new(total as u64);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .expect("valid template")
            .progress_chars("█▓▒░  "),
    );
    bar
}

fn record(path: &Path, report: &crate::engine::ComparisonReport) {
    match RunStore::open(path) {
        Ok(store) => {
            if let Some(id) = record_comparison(&store, report) {
                debug!("Recorded run #{}", id);
            }
        }
        Err(e) => warn!("{}", BenchError::PersistenceFailure(format!("{:#}", e))),
    }
}

/// Run the `repobench compare` command.
pub fn run(args: CompareArgs) -> Result<()> {
    let weights = WeightMap::parse(&args.weights)?;
    let skip = args.skip.as_deref().map(SkipList::parse).unwrap_or_default();
    let format = OutputFormat::from_str(&args.format)?;
    let config = UserConfig::load();
    let settings = build_settings(&args, &config)?;

    let registry = AssessorRegistry::builtin(&settings);
    let engine = ComparisonEngine::new(registry)
        .with_weights(weights)
        .with_skip(skip);
    let bar = progress_bar(engine.active_assessors().len() * 2);
    let bar_handle = bar.clone();
    let engine = engine.with_progress_callback(Box::new(move |name, done, _total| {
        bar_handle.set_position(done as u64);
        bar_handle.set_message(name.to_string());
    }));

    let result = engine.compare(&args.codebase1, &args.codebase2);
    bar.finish_and_clear();
    let report = result?;

    println!("{}", reporters::render(&report, format, args.verbose)?);

    if let Some(path) = history_path(args.history_db.clone(), &config, args.no_history) {
        record(&path, &report);
    }

    if let Some(path) = &args.export {
        reporters::write_export(&report, path)?;
        if format == OutputFormat::Text {
            println!("{}", style(format!("Exported results to {}", path.display())).green());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;

    fn args(extra: &[&str]) -> CompareArgs {
        let mut argv = vec!["repobench", "compare", "a", "b"];
        argv.extend_from_slice(extra);
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Compare(args) => args,
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_settings_follow_flags_and_config() {
        let mut config = UserConfig::default();
        config.tools.python = Some("python3.12".into());
        config.tools.timeout_secs = Some(30);
        let settings = build_settings(
            &args(&["--profile", "bench.py", "--web-app-url", "http://localhost:8000"]),
            &config,
        )
        .unwrap();
        assert_eq!(settings.python, "python3.12");
        assert_eq!(settings.tool_timeout_secs, 30);
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(settings.profile_script, Some(cwd.join("bench.py")));
        assert_eq!(settings.web_app_url.as_deref(), Some("http://localhost:8000"));
        assert!(settings.llm.is_none());
    }

    #[test]
    fn test_profile_script_is_anchored_at_cwd() {
        let config = UserConfig::default();
        let relative = build_settings(&args(&["--profile", "scripts/bench.py"]), &config)
            .unwrap()
            .profile_script
            .unwrap();
        assert!(relative.is_absolute());
        assert!(relative.ends_with("scripts/bench.py"));

        let absolute = build_settings(&args(&["--profile", "/opt/bench.py"]), &config).unwrap();
        assert_eq!(absolute.profile_script, Some(PathBuf::from("/opt/bench.py")));
    }

    #[test]
    fn test_llm_flag_enables_llm() {
        let settings = build_settings(&args(&["--llm"]), &UserConfig::default()).unwrap();
        assert!(settings.llm.is_some());
    }

    #[test]
    fn test_history_path_resolution() {
        let mut config = UserConfig::default();
        let flag = Some(PathBuf::from("/tmp/flag.redb"));
        assert_eq!(history_path(flag.clone(), &config, true), None);
        assert_eq!(history_path(flag.clone(), &config, false), flag);

        config.history.path = Some(PathBuf::from("/tmp/config.redb"));
        assert_eq!(
            history_path(None, &config, false),
            Some(PathBuf::from("/tmp/config.redb"))
        );

        config.history.enabled = Some(false);
        assert_eq!(history_path(flag, &config, false), None);
    }
}
