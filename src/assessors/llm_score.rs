//! LlmScore: a qualitative 0-10 rating from a language model
//!
//! Only a sample of the codebase is sent: README files and the head of the
//! five largest Python files, capped at 16k characters.

use super::base::{Assessor, NO_PYTHON_FILES};
use crate::ai::{AiClient, AiConfig, AiError};
use crate::models::AssessmentOutcome;
use crate::parsers;
use crate::scoring::clamp_score;
use anyhow::Result;
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;
use tracing::{debug, warn};

const README_NAMES: [&str; 3] = ["README.md", "readme.md", "README.rst"];
const README_CHARS: usize = 2000;
const SAMPLED_FILES: usize = 5;
const LINES_PER_FILE: usize = 300;
const MAX_PROMPT_CHARS: usize = 16_000;

const PROMPT: &str = "You are an expert software architect reviewing a codebase.
Provide a single integer 0-10 (10 = enterprise-grade, 0 = awful)
representing overall code quality. Consider readability, maintainability,
testing, security, documentation, and scalability based *only* on the
snippet provided. After the score add a short one-sentence justification.

Respond **exactly** in the format: `SCORE: <int> - <justification>`.";

pub struct LlmScoreAssessor {
    config: AiConfig,
}

impl LlmScoreAssessor {
    pub fn new(config: AiConfig) -> Self {
        Self { config }
    }
}

fn score_line() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?is)^\s*score\s*:?\s*(\d+(?:\.\d+)?)\s*(?:-\s*(.*))?$").expect("valid regex")
    })
}

/// `(score, justification)` from a `SCORE: <n> - <why>` reply.
fn parse_reply(text: &str) -> Option<(f64, String)> {
    let caps = score_line().captures(text.trim())?;
    let score: f64 = caps.get(1)?.as_str().parse().ok()?;
    let justification = caps
        .get(2)
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default();
    Some((score, justification))
}

/// README excerpts plus the first lines of the largest Python files.
fn sample_code(codebase: &Path) -> String {
    let mut snippets = Vec::new();

    for name in README_NAMES {
        if let Ok(text) = std::fs::read_to_string(codebase.join(name)) {
            let head: String = text.chars().take(README_CHARS).collect();
            snippets.push(format!("# {}\n{}", name, head));
        }
    }

    let mut files: Vec<(u64, std::path::PathBuf)> = parsers::python_files(codebase)
        .into_iter()
        .map(|path| {
            let size = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
            (size, path)
        })
        .collect();
    files.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));

    for (_, path) in files.into_iter().take(SAMPLED_FILES) {
        let Ok(bytes) = std::fs::read(&path) else {
            continue;
        };
        let source = String::from_utf8_lossy(&bytes);
        let head: Vec<&str> = source.lines().take(LINES_PER_FILE).collect();
        snippets.push(format!("# {}\n{}", path.display(), head.join("\n")));
    }

    snippets.join("\n\n").chars().take(MAX_PROMPT_CHARS).collect()
}

impl Assessor for LlmScoreAssessor {
    fn id(&self) -> &'static str {
        "llm_score"
    }

    fn description(&self) -> &'static str {
        "Qualitative rating of a code sample by an LLM"
    }

    fn assess(&self, codebase: &Path) -> Result<AssessmentOutcome> {
        if parsers::python_files(codebase).is_empty() {
            return Ok(AssessmentOutcome::neutral(0.0, NO_PYTHON_FILES));
        }

        let client = match AiClient::from_env(self.config.clone()) {
            Ok(client) => client,
            Err(e @ AiError::MissingApiKey { .. }) => {
                return Ok(AssessmentOutcome::new(
                    0.0,
                    vec![
                        format!("LLM not configured ({}).", e),
                        "Skipping LLM score.".to_string(),
                    ],
                ));
            }
            Err(e) => return Ok(AssessmentOutcome::neutral(0.0, format!("LLM call failed: {}", e))),
        };

        let prompt = format!("{}\n\n{}", PROMPT, sample_code(codebase));
        debug!(
            "Requesting LLM score from {} ({}), {} chars",
            client.backend(),
            client.model(),
            prompt.len()
        );

        let reply = match client.complete(&prompt, None) {
            Ok(reply) => reply,
            Err(e) => {
                warn!("LLM scoring failed: {}", e);
                return Ok(AssessmentOutcome::neutral(0.0, format!("LLM call failed: {}", e)));
            }
        };

        let reply = reply.trim().to_string();
        match parse_reply(&reply) {
            Some((score, justification)) => {
                let detail = if justification.is_empty() {
                    reply.clone()
                } else {
                    justification
                };
                Ok(AssessmentOutcome::new(clamp_score(score), vec![detail])
                    .with_metric("backend", client.backend().as_str())
                    .with_metric("model", client.model()))
            }
            None => Ok(AssessmentOutcome::new(
                0.0,
                vec!["Unexpected LLM response".to_string(), reply],
            )),
        }
    }
}
