//! LLM connection and pipeline configuration.

use std::fmt;

use anyhow::{Context, Result};

use crate::data::Language;
use crate::llm::context_limit::ProbePolicy;
use crate::llm::error::LlmError;
use crate::utils::settings::Settings;

/// Default OpenAI-compatible endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default model identifier.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Default sampling temperature.
pub const DEFAULT_TEMPERATURE: f32 = 0.3;

/// Resolved LLM configuration.
#[derive(Clone)]
pub struct LlmConfig {
    /// Bearer token for the chat-completion API.
    pub api_key: String,
    /// Base URL including the version prefix.
    pub base_url: String,
    /// Model identifier.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Declare and force the structured-output tool.
    pub use_tools: bool,
    /// Whether unknown models may be probed for their context limit.
    pub probe_policy: ProbePolicy,
    /// Default output language.
    pub language: Language,
}

impl fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("use_tools", &self.use_tools)
            .field("probe_policy", &self.probe_policy)
            .field("language", &self.language)
            .finish()
    }
}

impl LlmConfig {
    /// Resolves configuration from the environment and the default
    /// settings file.
    pub fn load(model_override: Option<&str>) -> Result<Self> {
        let settings = Settings::load()?;
        Self::from_settings(&settings, model_override)
    }

    /// Resolves configuration from the environment, falling back to
    /// `settings`.
    pub fn from_settings(settings: &Settings, model_override: Option<&str>) -> Result<Self> {
        Self::from_lookup(|key| settings.get_env_var(key), model_override)
    }

    /// Resolves configuration from any key lookup.
    fn from_lookup<F>(lookup: F, model_override: Option<&str>) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let first_of = |keys: &[&str]| keys.iter().copied().find_map(|key| lookup(key));

        let api_key = first_of(&["DIFFSCRIBE_API_KEY", "OPENAI_API_KEY"])
            .ok_or(LlmError::ApiKeyNotFound)?;

        let base_url = first_of(&["DIFFSCRIBE_BASE_URL", "OPENAI_BASE_URL"])
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let model = model_override
            .map(String::from)
            .or_else(|| lookup("DIFFSCRIBE_MODEL"))
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let temperature = match lookup("DIFFSCRIBE_TEMPERATURE") {
            Some(raw) => raw
                .trim()
                .parse::<f32>()
                .with_context(|| format!("Invalid DIFFSCRIBE_TEMPERATURE: {raw}"))?,
            None => DEFAULT_TEMPERATURE,
        };

        let use_tools = lookup("DIFFSCRIBE_USE_TOOLS").map_or(true, |val| parse_flag(&val));

        let probe_policy = if lookup("DIFFSCRIBE_PROBE_CONTEXT").is_some_and(|val| parse_flag(&val)) {
            ProbePolicy::Enabled
        } else {
            ProbePolicy::Disabled
        };

        let language = lookup("DIFFSCRIBE_LANGUAGE")
            .map_or_else(Language::default, |code| Language::from_code(&code));

        Ok(Self {
            api_key,
            base_url,
            model,
            temperature,
            use_tools,
            probe_policy,
            language,
        })
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
