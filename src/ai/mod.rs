//! LLM access for qualitative scoring
//!
//! Bring-your-own-key: API keys are read from environment variables and never
//! stored in config files.
//!
//! # Environment Variables
//!
//! - `ANTHROPIC_API_KEY`: Required for the Anthropic backend
//! - `OPENAI_API_KEY`: Required for the OpenAI backend
//! - `OLLAMA_MODEL`: Optional model override for a local Ollama server
//!
//! # Example
//!
//! ```rust,ignore
//! use repobench::ai::{AiClient, AiConfig, LlmBackend};
//!
//! let client = AiClient::from_env(AiConfig { backend: LlmBackend::OpenAi, ..Default::default() })?;
//! let reply = client.complete("Rate this code", None)?;
//! ```

mod client;

pub use client::{AiClient, AiConfig, LlmBackend};

use thiserror::Error;

/// Errors that can occur talking to an LLM backend
#[derive(Error, Debug)]
pub enum AiError {
    #[error("Missing API key: {env_var} not set. Get your key at {signup_url}")]
    MissingApiKey { env_var: String, signup_url: String },

    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),
}

pub type AiResult<T> = Result<T, AiError>;
