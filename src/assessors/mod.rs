//! Quality assessors
//!
//! Each assessor scores one quality dimension of a Python codebase.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   AssessorRegistry                          │
//! │  - Static, ordered table of (display name, assessor)        │
//! │  - Lookup by display name or id, case-insensitive           │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Assessor Trait                         │
//! │  - id(): snake_case identifier                              │
//! │  - description(): one-line summary                          │
//! │  - assess(path): score + details + raw metrics + CI         │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!              ┌───────────────┼───────────────┐
//!              ▼               ▼               ▼
//! ┌──────────────────┐ ┌──────────────┐ ┌──────────────────┐
//! │ Syntax-tree      │ │ External     │ │ History / LLM    │
//! │ (Robustness,     │ │ tools        │ │ (GitHealth,      │
//! │  Scalability,    │ │ (bandit,     │ │  LlmScore)       │
//! │  Consistency...) │ │  pytest...)  │ │                  │
//! └──────────────────┘ └──────────────┘ └──────────────────┘
//! ```
//!
//! Registration is an explicit table in [`AssessorRegistry::builtin`]; nothing
//! is discovered at runtime.

mod base;
mod consistency;
mod documentation;
pub mod external_tool;
mod git_health;
mod llm_score;
mod maintainability;
mod performance;
mod readability;
mod robustness;
mod scalability;
mod security;
mod testability;

pub use base::{
    Assessor, AssessorSettings, DEFAULT_PROFILE_RUNS, DEFAULT_TOOL_TIMEOUT_SECS,
    DEFAULT_ZAP_TIMEOUT_SECS,
};
pub use consistency::ConsistencyAssessor;
pub use documentation::DocumentationAssessor;
pub use git_health::GitHealthAssessor;
pub use llm_score::LlmScoreAssessor;
pub use maintainability::MaintainabilityAssessor;
pub use performance::PerformanceAssessor;
pub use readability::ReadabilityAssessor;
pub use robustness::RobustnessAssessor;
pub use scalability::ScalabilityAssessor;
pub use security::SecurityAssessor;
pub use testability::TestabilityAssessor;

use crate::error::{BenchError, BenchResult};
use std::sync::Arc;

/// Display name for an assessor id: `git_health` → `GitHealth`.
pub fn display_name(id: &str) -> String {
    id.split(|c: char| c == '_' || c.is_whitespace())
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect()
}

/// Key used for case-insensitive name matching: alphanumerics, lowercased.
/// `GitHealth`, `git_health` and `githealth` all map to `githealth`.
pub(crate) fn match_key(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// An assessor with its display name.
#[derive(Clone)]
pub struct RegisteredAssessor {
    pub name: String,
    pub assessor: Arc<dyn Assessor>,
}

/// Ordered assessor table. Order determines run and display order.
#[derive(Clone, Default)]
pub struct AssessorRegistry {
    entries: Vec<RegisteredAssessor>,
}

impl AssessorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every built-in assessor, configured from `settings`. The LLM score is
    /// only included when `settings.llm` is set.
    pub fn builtin(settings: &AssessorSettings) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(ReadabilityAssessor::new(settings)));
        registry.register(Arc::new(MaintainabilityAssessor::new(settings)));
        registry.register(Arc::new(PerformanceAssessor::new(settings)));
        registry.register(Arc::new(TestabilityAssessor::new(settings)));
        registry.register(Arc::new(RobustnessAssessor::new(settings)));
        registry.register(Arc::new(SecurityAssessor::new(settings)));
        registry.register(Arc::new(ScalabilityAssessor::new(settings)));
        registry.register(Arc::new(DocumentationAssessor::new(settings)));
        registry.register(Arc::new(ConsistencyAssessor::new(settings)));
        registry.register(Arc::new(GitHealthAssessor::new(settings)));
        if let Some(llm) = &settings.llm {
            registry.register(Arc::new(LlmScoreAssessor::new(llm.clone())));
        }
        registry
    }

    /// Append an assessor. A later registration with the same display name
    /// replaces the earlier one in place.
    pub fn register(&mut self, assessor: Arc<dyn Assessor>) {
        let name = display_name(assessor.id());
        let entry = RegisteredAssessor { name, assessor };
        match self.entries.iter_mut().find(|e| e.name == entry.name) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    /// Look up by display name or id, ignoring case and separators.
    pub fn get(&self, name: &str) -> BenchResult<&RegisteredAssessor> {
        let key = match_key(name);
        self.entries
            .iter()
            .find(|e| match_key(&e.name) == key)
            .ok_or_else(|| BenchError::NotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_ok()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegisteredAssessor> {
        self.entries.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for AssessorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::AiConfig;

    #[test]
    fn test_display_name() {
        assert_eq!(display_name("git_health"), "GitHealth");
        assert_eq!(display_name("readability"), "Readability");
        assert_eq!(display_name("llm_score"), "LlmScore");
        assert_eq!(display_name(" odd  name_"), "OddName");
    }

    #[test]
    fn test_builtin_order() {
        let registry = AssessorRegistry::builtin(&AssessorSettings::default());
        assert_eq!(
            registry.names(),
            vec![
                "Readability",
                "Maintainability",
                "Performance",
                "Testability",
                "Robustness",
                "Security",
                "Scalability",
                "Documentation",
                "Consistency",
                "GitHealth",
            ]
        );
    }

    #[test]
    fn test_llm_is_opt_in() {
        let settings = AssessorSettings {
            llm: Some(AiConfig::default()),
            ..Default::default()
        };
        let registry = AssessorRegistry::builtin(&settings);
        assert_eq!(registry.len(), 11);
        assert_eq!(registry.names().last(), Some(&"LlmScore"));
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let registry = AssessorRegistry::builtin(&AssessorSettings::default());
        assert_eq!(registry.get("githealth").unwrap().name, "GitHealth");
        assert_eq!(registry.get("git_health").unwrap().name, "GitHealth");
        assert_eq!(registry.get("SECURITY").unwrap().assessor.id(), "security");
        assert!(matches!(
            registry.get("Vibes"),
            Err(BenchError::NotFound(name)) if name == "Vibes"
        ));
    }

    #[test]
    fn test_register_replaces_same_name() {
        let mut registry = AssessorRegistry::new();
        let settings = AssessorSettings::default();
        registry.register(Arc::new(RobustnessAssessor::new(&settings)));
        registry.register(Arc::new(RobustnessAssessor::new(&settings)));
        assert_eq!(registry.len(), 1);
    }
}
