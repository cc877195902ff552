//! Configuration module for repobench
//!
//! This module handles:
//! - Weight maps and skip lists given on the command line
//! - The optional user config file (`~/.config/repobench/config.toml`)

mod user_config;
mod weights;

pub use user_config::{HistorySection, LlmSection, ToolsSection, UserConfig};
pub use weights::{SkipList, WeightMap, DEFAULT_WEIGHT};
