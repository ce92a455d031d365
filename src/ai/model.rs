//! Language Model Descriptors
//!
//! Static metadata for a backend model: token limits, per-token pricing and timeout.
//! Descriptors are created once at startup from configuration and never mutated.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::constants::model as model_constants;
use crate::types::{RecastError, Result};

/// Request shape a backend expects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ApiStyle {
    /// Single text prompt (`/completions`)
    Completion,
    /// Structured message list (`/chat/completions`)
    #[default]
    Chat,
}

impl ApiStyle {
    /// Endpoint path relative to the API base
    pub fn endpoint(&self) -> &'static str {
        match self {
            Self::Completion => "completions",
            Self::Chat => "chat/completions",
        }
    }
}

impl std::fmt::Display for ApiStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Completion => write!(f, "completion"),
            Self::Chat => write!(f, "chat"),
        }
    }
}

/// Immutable description of a provider model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageModel {
    /// Display name, the lookup key in the registry
    pub label: String,
    /// Provider model id
    pub name: String,
    #[serde(default)]
    pub api: ApiStyle,
    /// Request plus response token limit
    pub max_total_tokens: usize,
    /// App-imposed response cap, not necessarily the provider's
    pub max_response_tokens: usize,
    pub usd_per_request_token: f64,
    pub usd_per_response_token: f64,
    #[serde(rename = "timeout_secs", with = "duration_secs")]
    pub timeout: Duration,
    #[serde(default = "default_max_temperature")]
    pub max_temperature: f64,
}

fn default_max_temperature() -> f64 {
    model_constants::DEFAULT_MAX_TEMPERATURE
}

impl LanguageModel {
    /// Token budget left for the request once the response cap is reserved
    pub fn max_request_tokens(&self) -> usize {
        self.max_total_tokens.saturating_sub(self.max_response_tokens)
    }

    /// Provider temperature for a normalized 0..1 randomness
    pub fn temperature(&self, normalized: f64) -> f64 {
        self.max_temperature * normalized.clamp(0.0, 1.0)
    }

    pub fn validate(&self) -> Result<()> {
        if self.label.trim().is_empty() || self.name.trim().is_empty() {
            return Err(RecastError::config(
                "Language model label and name must not be empty",
            ));
        }
        if self.max_response_tokens == 0 || self.max_response_tokens >= self.max_total_tokens {
            return Err(RecastError::config(format!(
                "Model {}: max_response_tokens ({}) must be in 1..{}",
                self.label, self.max_response_tokens, self.max_total_tokens
            )));
        }
        if self.usd_per_request_token < 0.0 || self.usd_per_response_token < 0.0 {
            return Err(RecastError::config(format!(
                "Model {}: token prices must not be negative",
                self.label
            )));
        }
        if self.timeout.is_zero() {
            return Err(RecastError::config(format!(
                "Model {}: timeout_secs must be greater than 0",
                self.label
            )));
        }
        if self.max_temperature < 0.0 {
            return Err(RecastError::config(format!(
                "Model {}: max_temperature must not be negative",
                self.label
            )));
        }
        Ok(())
    }
}

/// Built-in OpenAI model catalog, used as the configuration default
pub fn builtin_models() -> Vec<LanguageModel> {
    vec![
        LanguageModel {
            label: "Curie".to_string(),
            name: "text-curie-001".to_string(),
            api: ApiStyle::Completion,
            max_total_tokens: 2048,
            max_response_tokens: 256,
            usd_per_request_token: 0.000002,
            usd_per_response_token: 0.000002,
            timeout: Duration::from_secs(20),
            max_temperature: model_constants::DEFAULT_MAX_TEMPERATURE,
        },
        LanguageModel {
            label: "Turbo".to_string(),
            name: "gpt-3.5-turbo".to_string(),
            api: ApiStyle::Chat,
            max_total_tokens: 4096,
            max_response_tokens: 512,
            usd_per_request_token: 0.000002,
            usd_per_response_token: 0.000002,
            timeout: Duration::from_secs(60),
            max_temperature: model_constants::DEFAULT_MAX_TEMPERATURE,
        },
        LanguageModel {
            label: "DaVinci".to_string(),
            name: "text-davinci-003".to_string(),
            api: ApiStyle::Completion,
            max_total_tokens: 4096,
            max_response_tokens: 512,
            usd_per_request_token: 0.00002,
            usd_per_response_token: 0.00002,
            timeout: Duration::from_secs(60),
            max_temperature: model_constants::DEFAULT_MAX_TEMPERATURE,
        },
        LanguageModel {
            label: "GPT4".to_string(),
            name: "gpt-4".to_string(),
            api: ApiStyle::Chat,
            max_total_tokens: 8192,
            max_response_tokens: 1024,
            usd_per_request_token: 0.00003,
            usd_per_response_token: 0.00006,
            timeout: Duration::from_secs(120),
            max_temperature: model_constants::DEFAULT_MAX_TEMPERATURE,
        },
    ]
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(duration.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_models_are_valid() {
        let models = builtin_models();
        assert_eq!(models.len(), 4);
        for model in &models {
            model.validate().unwrap();
        }
        let labels: Vec<_> = models.iter().map(|m| m.label.as_str()).collect();
        assert_eq!(labels, ["Curie", "Turbo", "DaVinci", "GPT4"]);
    }

    #[test]
    fn test_temperature_scaling() {
        let model = &builtin_models()[1];
        assert!((model.temperature(0.35) - 0.7).abs() < 1e-9);
        assert_eq!(model.temperature(1.5), 2.0);
        assert_eq!(model.temperature(-1.0), 0.0);
    }

    #[test]
    fn test_max_request_tokens() {
        let gpt4 = &builtin_models()[3];
        assert_eq!(gpt4.max_request_tokens(), 8192 - 1024);
    }

    #[test]
    fn test_validate_rejects_response_cap_above_total() {
        let mut model = builtin_models()[0].clone();
        model.max_response_tokens = model.max_total_tokens;
        assert!(matches!(model.validate(), Err(RecastError::Config(_))));
    }

    #[test]
    fn test_api_style_endpoint() {
        assert_eq!(ApiStyle::Completion.endpoint(), "completions");
        assert_eq!(ApiStyle::Chat.endpoint(), "chat/completions");
    }

    #[test]
    fn test_descriptor_from_toml() {
        let model: LanguageModel = toml::from_str(
            r#"
            label = "Mini"
            name = "gpt-4o-mini"
            api = "chat"
            max_total_tokens = 16000
            max_response_tokens = 2000
            usd_per_request_token = 0.00000015
            usd_per_response_token = 0.0000006
            timeout_secs = 30
            "#,
        )
        .unwrap();
        assert_eq!(model.timeout, Duration::from_secs(30));
        assert_eq!(model.max_temperature, 2.0);
        assert_eq!(model.api, ApiStyle::Chat);
    }
}
