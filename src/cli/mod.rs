//! CLI command definitions and handlers

mod assessors;
mod compare;
mod history;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// repobench - Compare two Python codebases
#[derive(Parser, Debug)]
#[command(name = "repobench")]
#[command(
    version,
    about = "Compare two Python codebases across independent quality dimensions",
    long_about = "repobench runs a fixed set of quality assessors (readability, maintainability, \
performance, security, testability, robustness, scalability, documentation, naming \
consistency, git health and an optional LLM score) over two codebases, normalizes and \
weights the scores, and names a winner.",
    after_help = "\
Examples:
  repobench compare ./service-a ./service-b
  repobench compare a b --weights '{\"Security\": 2, \"Performance\": 0.5}'
  repobench compare a b --skip Testability,GitHealth --export out/result.json
  repobench compare a b --format json > result.json
  repobench history --limit 5
  repobench assessors"
)]
pub struct Cli {
    /// Log level (error, warn, info, debug, trace); RUST_LOG takes priority
    #[arg(long, global = true, default_value = "warn", value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compare two codebases
    Compare(compare::CompareArgs),

    /// Show recently recorded comparisons
    History {
        /// Number of runs to show
        #[arg(long, short = 'n', default_value = "20")]
        limit: usize,

        /// Print runs as JSON
        #[arg(long)]
        json: bool,

        /// Run history database file
        #[arg(long, env = "REPOBENCH_HISTORY_DB")]
        history_db: Option<PathBuf>,
    },

    /// List the registered assessors
    Assessors,
}

/// Run the CLI with parsed arguments
pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Compare(args) => compare::run(args),
        Commands::History {
            limit,
            json,
            history_db,
        } => history::run(history_db, limit, json),
        Commands::Assessors => assessors::run(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_compare_defaults() {
        let cli = Cli::try_parse_from(["repobench", "compare", "a", "b"]).unwrap();
        assert_eq!(cli.log_level, "warn");
        let Commands::Compare(args) = cli.command else {
            panic!("expected compare");
        };
        assert_eq!(args.weights, "{}");
        assert!(args.skip.is_none());
        assert!(!args.verbose);
        assert_eq!(args.format, "text");
    }

    #[test]
    fn test_compare_requires_two_paths() {
        assert!(Cli::try_parse_from(["repobench", "compare", "a"]).is_err());
    }

    #[test]
    fn test_rejects_unknown_format() {
        assert!(
            Cli::try_parse_from(["repobench", "compare", "a", "b", "--format", "sarif"]).is_err()
        );
    }
}
