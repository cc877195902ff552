//! LLM API client supporting Anthropic, OpenAI and Ollama backends
//!
//! Blocking calls over ureq; the comparison pipeline is synchronous, so no
//! async runtime is involved.

use crate::ai::{AiError, AiResult};
use serde_json::{json, Value};
use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Supported LLM backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LlmBackend {
    #[default]
    Anthropic,
    OpenAi,
    Ollama,
}

impl LlmBackend {
    pub fn env_key(&self) -> &'static str {
        match self {
            LlmBackend::Anthropic => "ANTHROPIC_API_KEY",
            LlmBackend::OpenAi => "OPENAI_API_KEY",
            LlmBackend::Ollama => "OLLAMA_MODEL",
        }
    }

    pub fn signup_url(&self) -> &'static str {
        match self {
            LlmBackend::Anthropic => "https://console.anthropic.com/settings/keys",
            LlmBackend::OpenAi => "https://platform.openai.com/api-keys",
            LlmBackend::Ollama => "https://ollama.ai (no key needed, just run locally)",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            LlmBackend::Anthropic => "claude-sonnet-4-20250514",
            LlmBackend::OpenAi => "gpt-4o",
            LlmBackend::Ollama => "llama3.1:8b",
        }
    }

    pub fn api_url(&self) -> &'static str {
        match self {
            LlmBackend::Anthropic => "https://api.anthropic.com/v1/messages",
            LlmBackend::OpenAi => "https://api.openai.com/v1/chat/completions",
            LlmBackend::Ollama => "http://localhost:11434/v1/chat/completions",
        }
    }

    pub fn requires_api_key(&self) -> bool {
        !matches!(self, LlmBackend::Ollama)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LlmBackend::Anthropic => "anthropic",
            LlmBackend::OpenAi => "openai",
            LlmBackend::Ollama => "ollama",
        }
    }
}

impl fmt::Display for LlmBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LlmBackend {
    type Err = AiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "anthropic" | "claude" => Ok(LlmBackend::Anthropic),
            "openai" => Ok(LlmBackend::OpenAi),
            "ollama" => Ok(LlmBackend::Ollama),
            other => Err(AiError::ConfigError(format!(
                "unknown LLM backend '{}' (expected anthropic, openai or ollama)",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AiConfig {
    pub backend: LlmBackend,
    pub model: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout_secs: u64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            backend: LlmBackend::default(),
            model: None,
            // A score line plus one sentence
            max_tokens: 256,
            temperature: 0.0,
            timeout_secs: 120,
        }
    }
}

impl AiConfig {
    pub fn model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.backend.default_model())
    }
}

/// Unified LLM client
pub struct AiClient {
    config: AiConfig,
    api_key: String,
    agent: ureq::Agent,
}

fn make_agent(timeout_secs: u64) -> ureq::Agent {
    ureq::config::Config::builder()
        .http_status_as_error(false)
        .timeout_global(Some(Duration::from_secs(timeout_secs)))
        .build()
        .new_agent()
}

impl AiClient {
    pub fn new(config: AiConfig, api_key: impl Into<String>) -> Self {
        let agent = make_agent(config.timeout_secs);
        Self {
            config,
            api_key: api_key.into(),
            agent,
        }
    }

    /// Build a client, reading the backend's API key from the environment.
    pub fn from_env(mut config: AiConfig) -> AiResult<Self> {
        if !config.backend.requires_api_key() {
            if let Ok(model) = env::var("OLLAMA_MODEL") {
                config.model.get_or_insert(model);
            }
            return Ok(Self::new(config, "ollama"));
        }

        let env_key = config.backend.env_key();
        let api_key = env::var(env_key)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| AiError::MissingApiKey {
                env_var: env_key.to_string(),
                signup_url: config.backend.signup_url().to_string(),
            })?;

        Ok(Self::new(config, api_key))
    }

    pub fn backend(&self) -> LlmBackend {
        self.config.backend
    }

    pub fn model(&self) -> &str {
        self.config.model()
    }

    /// One prompt in, one reply out.
    pub fn complete(&self, prompt: &str, system: Option<&str>) -> AiResult<String> {
        let backend = self.config.backend;
        let mut req = self
            .agent
            .post(backend.api_url())
            .header("Content-Type", "application/json");
        req = match backend {
            LlmBackend::Anthropic => req
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION),
            LlmBackend::OpenAi => req.header("Authorization", &format!("Bearer {}", self.api_key)),
            LlmBackend::Ollama => req,
        };

        let response = req
            .send_json(self.request_body(prompt, system))
            .map_err(|e| AiError::ApiError {
                status: 0,
                message: e.to_string(),
            })?;

        let status = response.status().as_u16();
        if status >= 400 {
            let message = response.into_body().read_to_string().unwrap_or_default();
            return Err(AiError::ApiError { status, message });
        }

        let reply: Value = response
            .into_body()
            .read_json()
            .map_err(|e| AiError::ParseError(e.to_string()))?;
        reply_text(backend, &reply)
    }

    /// Request JSON for the configured backend. Anthropic takes the system
    /// prompt as a top-level field; chat-completions APIs take it as a message.
    fn request_body(&self, prompt: &str, system: Option<&str>) -> Value {
        let model = self.config.model();
        let user = json!({"role": "user", "content": prompt});
        match (self.config.backend, system) {
            (LlmBackend::Anthropic, Some(system)) => json!({
                "model": model,
                "max_tokens": self.config.max_tokens,
                "temperature": self.config.temperature,
                "system": system,
                "messages": [user],
            }),
            (LlmBackend::Anthropic, None) => json!({
                "model": model,
                "max_tokens": self.config.max_tokens,
                "temperature": self.config.temperature,
                "messages": [user],
            }),
            (_, system) => {
                let mut messages = Vec::with_capacity(2);
                if let Some(system) = system {
                    messages.push(json!({"role": "system", "content": system}));
                }
                messages.push(user);
                json!({
                    "model": model,
                    "max_tokens": self.config.max_tokens,
                    "temperature": self.config.temperature,
                    "messages": messages,
                })
            }
        }
    }
}

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Text of the first reply block.
fn reply_text(backend: LlmBackend, reply: &Value) -> AiResult<String> {
    let text = match backend {
        LlmBackend::Anthropic => reply
            .get("content")
            .and_then(Value::as_array)
            .and_then(|blocks| {
                blocks
                    .iter()
                    .find(|b| b.get("type").and_then(Value::as_str) == Some("text"))
            })
            .and_then(|b| b.get("text"))
            .and_then(Value::as_str),
        LlmBackend::OpenAi | LlmBackend::Ollama => reply
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str),
    };
    text.map(str::to_string)
        .ok_or_else(|| AiError::ParseError(format!("No reply text in {} response", backend)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_parsing() {
        assert_eq!("Claude".parse::<LlmBackend>().unwrap(), LlmBackend::Anthropic);
        assert_eq!(" openai ".parse::<LlmBackend>().unwrap(), LlmBackend::OpenAi);
        assert_eq!("ollama".parse::<LlmBackend>().unwrap(), LlmBackend::Ollama);
        assert!(matches!(
            "gemini".parse::<LlmBackend>(),
            Err(AiError::ConfigError(_))
        ));
        assert_eq!(LlmBackend::OpenAi.to_string(), "openai");
    }

    #[test]
    fn test_config_model() {
        let config = AiConfig::default();
        assert_eq!(config.model(), "claude-sonnet-4-20250514");

        let config = AiConfig {
            model: Some("custom-model".to_string()),
            ..Default::default()
        };
        assert_eq!(config.model(), "custom-model");
    }

    #[test]
    fn test_ollama_needs_no_key() {
        let client = AiClient::from_env(AiConfig {
            backend: LlmBackend::Ollama,
            model: Some("tiny".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(client.backend(), LlmBackend::Ollama);
        assert_eq!(client.model(), "tiny");
    }

    fn client(backend: LlmBackend) -> AiClient {
        AiClient::new(
            AiConfig {
                backend,
                model: Some("m".to_string()),
                ..Default::default()
            },
            "key",
        )
    }

    #[test]
    fn test_request_body_places_system_prompt() {
        let body = client(LlmBackend::Anthropic).request_body("hi", None);
        assert!(body.get("system").is_none());
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["max_tokens"], 256);

        let body = client(LlmBackend::Anthropic).request_body("hi", Some("be terse"));
        assert_eq!(body["system"], "be terse");
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);

        let body = client(LlmBackend::OpenAi).request_body("hi", Some("be terse"));
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "hi");
        assert_eq!(body["model"], "m");
    }

    #[test]
    fn test_reply_text_per_backend() {
        let anthropic = json!({"content": [
            {"type": "thinking", "thinking": "..."},
            {"type": "text", "text": "Score: 7"}
        ]});
        assert_eq!(reply_text(LlmBackend::Anthropic, &anthropic).unwrap(), "Score: 7");

        let openai = json!({"choices": [{"message": {"role": "assistant", "content": "Score: 4"}}]});
        assert_eq!(reply_text(LlmBackend::Ollama, &openai).unwrap(), "Score: 4");

        assert!(matches!(
            reply_text(LlmBackend::OpenAi, &json!({"choices": []})),
            Err(AiError::ParseError(_))
        ));
    }
}
