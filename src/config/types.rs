//! Configuration Types
//!
//! All configuration structures with sensible defaults.
//! Supports global (~/.config/recast/) and project (.recast/) level configuration.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::ai::model::{LanguageModel, builtin_models};
use crate::ai::tokenizer::TokenEstimator;
use crate::constants::{chunking, network, transform};
use crate::types::{RecastError, Result};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default transformation settings
    pub transform: TransformConfig,

    /// Chunking engine tuning
    pub chunking: ChunkingConfig,

    /// Token estimation settings
    pub estimation: EstimationConfig,

    /// Provider endpoint settings
    pub api: ApiConfig,

    /// Model catalog, replaced as a whole when set
    pub models: Vec<LanguageModel>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            transform: TransformConfig::default(),
            chunking: ChunkingConfig::default(),
            estimation: EstimationConfig::default(),
            api: ApiConfig::default(),
            models: builtin_models(),
        }
    }
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    /// Returns `RecastError::Config` on validation failure.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.transform.temperature) {
            return Err(RecastError::config(format!(
                "transform.temperature must be between 0.0 and 1.0, got {}",
                self.transform.temperature
            )));
        }

        if self.models.is_empty() {
            return Err(RecastError::config("At least one model must be configured"));
        }
        for (i, model) in self.models.iter().enumerate() {
            model.validate()?;
            if self.models[..i].iter().any(|m| m.label == model.label) {
                return Err(RecastError::config(format!(
                    "Duplicate model label: {}",
                    model.label
                )));
            }
        }

        for (key, label) in [
            ("transform.instruction_model", &self.transform.instruction_model),
            ("transform.shortening_model", &self.transform.shortening_model),
        ] {
            if !self.models.iter().any(|m| &m.label == label) {
                return Err(RecastError::config(format!(
                    "{} refers to unknown model: {}",
                    key, label
                )));
            }
        }

        self.api.base_url()?;
        if self.api.api_key_env.trim().is_empty() {
            return Err(RecastError::config("api.api_key_env must not be empty"));
        }

        Ok(())
    }

    pub fn model(&self, label: &str) -> Option<&LanguageModel> {
        self.models.iter().find(|m| m.label == label)
    }
}

// =============================================================================
// Transform Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformConfig {
    /// Model performing the requested transformation
    pub instruction_model: String,

    /// Model compressing oversized chunks, usually the cheaper one
    pub shortening_model: String,

    /// Appended to every chunk sent for shortening
    pub shortening_instruction: String,

    /// Normalized randomness (0.0 = deterministic, 1.0 = model maximum)
    pub temperature: f64,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            instruction_model: transform::DEFAULT_INSTRUCTION_MODEL.to_string(),
            shortening_model: transform::DEFAULT_SHORTENING_MODEL.to_string(),
            shortening_instruction: transform::DEFAULT_SHORTENING_INSTRUCTION.to_string(),
            temperature: transform::DEFAULT_TEMPERATURE_NORMALIZED,
        }
    }
}

// =============================================================================
// Chunking Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Characters shared by consecutive chunks
    pub overlap_chars: usize,

    /// Chunk size search precision (characters)
    pub accuracy_threshold: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            overlap_chars: chunking::DEFAULT_OVERLAP_CHARS,
            accuracy_threshold: chunking::DEFAULT_ACCURACY_THRESHOLD,
        }
    }
}

// =============================================================================
// Estimation Configuration
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimationConfig {
    /// Token estimator: "chars" or "tiktoken"
    pub tokenizer: TokenEstimator,
}

// =============================================================================
// API Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// OpenAI-compatible API base URL
    pub base_url: String,

    /// Environment variable holding the bearer token
    pub api_key_env: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: network::DEFAULT_API_BASE.to_string(),
            api_key_env: network::DEFAULT_API_KEY_ENV.to_string(),
        }
    }
}

impl ApiConfig {
    /// Parsed base URL, restricted to http(s)
    pub fn base_url(&self) -> Result<Url> {
        let url = Url::parse(&self.base_url).map_err(|e| {
            RecastError::config(format!("api.base_url is not a valid URL ({}): {}", e, self.base_url))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(RecastError::config(format!(
                "api.base_url must be an http(s) URL, got {}",
                self.base_url
            )));
        }
        Ok(url)
    }
}

// =============================================================================
// Tests
// =============================================================================
