//! `repobench assessors` command

use crate::ai::AiConfig;
use crate::assessors::{AssessorRegistry, AssessorSettings};
use anyhow::Result;
use console::style;

/// Run the `repobench assessors` command.
pub fn run() -> Result<()> {
    // Register the LLM score too so it shows up in the listing
    let settings = AssessorSettings {
        llm: Some(AiConfig::default()),
        ..Default::default()
    };
    let registry = AssessorRegistry::builtin(&settings);

    println!();
    for entry in registry.iter() {
        let id = entry.assessor.id();
        let opt_in = if id == "llm_score" { " (opt-in: --llm)" } else { "" };
        println!(
            "  {:<16} {:<16} {}{}",
            style(&entry.name).cyan().bold(),
            style(id).dim(),
            entry.assessor.description(),
            opt_in
        );
    }
    println!();
    Ok(())
}
