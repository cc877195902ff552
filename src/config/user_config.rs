//! User-level configuration for repobench
//!
//! Loaded from `~/.config/repobench/config.toml` (platform config dir). Every
//! field is optional; command-line flags take priority over the file.

use crate::ai::{AiConfig, LlmBackend};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
pub struct UserConfig {
    #[serde(default)]
    pub history: HistorySection,
    #[serde(default)]
    pub tools: ToolsSection,
    #[serde(default)]
    pub llm: LlmSection,
}

#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
pub struct HistorySection {
    /// Run history database file
    pub path: Option<PathBuf>,
    /// Set to false to never record runs
    pub enabled: Option<bool>,
}

#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
pub struct ToolsSection {
    /// Python interpreter for `python -m <tool>` fallbacks (default: python3)
    pub python: Option<String>,
    /// Per-tool timeout in seconds (default: 300)
    pub timeout_secs: Option<u64>,
    /// Dynamic security scan timeout in seconds (default: 120)
    pub zap_timeout_secs: Option<u64>,
    /// Profiling samples per codebase (default: 3)
    pub profile_runs: Option<usize>,
}

#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
pub struct LlmSection {
    /// Register the LlmScore assessor without passing `--llm`
    pub enabled: Option<bool>,
    /// "anthropic" (default), "openai" or "ollama"
    pub backend: Option<String>,
    pub model: Option<String>,
}

impl UserConfig {
    /// Load the user config file. A missing file yields defaults; an
    /// unreadable or invalid one is logged and ignored.
    pub fn load() -> Self {
        let mut config = UserConfig::default();
        if let Some(path) = Self::user_config_path().filter(|p| p.exists()) {
            match Self::load_from(&path) {
                Ok(user_config) => config.merge(user_config),
                Err(e) => warn!("Ignoring user config: {:#}", e),
            }
        }
        config
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config = toml::from_str::<UserConfig>(&content)
            .with_context(|| format!("Invalid TOML in {}", path.display()))?;
        debug!("Loaded user config from {}", path.display());
        Ok(config)
    }

    /// Get the user config file path
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("repobench").join("config.toml"))
    }

    /// Merge another config into this one (other takes priority)
    pub fn merge(&mut self, other: UserConfig) {
        if other.history.path.is_some() {
            self.history.path = other.history.path;
        }
        if other.history.enabled.is_some() {
            self.history.enabled = other.history.enabled;
        }
        if other.tools.python.is_some() {
            self.tools.python = other.tools.python;
        }
        if other.tools.timeout_secs.is_some() {
            self.tools.timeout_secs = other.tools.timeout_secs;
        }
        if other.tools.zap_timeout_secs.is_some() {
            self.tools.zap_timeout_secs = other.tools.zap_timeout_secs;
        }
        if other.tools.profile_runs.is_some() {
            self.tools.profile_runs = other.tools.profile_runs;
        }
        if other.llm.enabled.is_some() {
            self.llm.enabled = other.llm.enabled;
        }
        if other.llm.backend.is_some() {
            self.llm.backend = other.llm.backend;
        }
        if other.llm.model.is_some() {
            self.llm.model = other.llm.model;
        }
    }

    pub fn history_enabled(&self) -> bool {
        self.history.enabled.unwrap_or(true)
    }

    pub fn llm_enabled(&self) -> bool {
        self.llm.enabled.unwrap_or(false)
    }

    /// LLM client settings from the `[llm]` section
    pub fn llm_config(&self) -> Result<AiConfig> {
        let backend = match self.llm.backend.as_deref() {
            Some(name) => name.parse::<LlmBackend>()?,
            None => LlmBackend::default(),
        };
        Ok(AiConfig {
            backend,
            model: self.llm.model.clone(),
            ..Default::default()
        })
    }
}
