//! CLI Common Utilities
//!
//! Shared initialization and context management for CLI commands.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::ai::provider::{EnvCredentials, ModelRegistry, SharedCredentials};
use crate::ai::tokenizer::TokenCounter;
use crate::config::{Config, ConfigLoader};
use crate::transform::{TextChunker, TextTransformer, TransformRequest};
use crate::types::{RecastError, Result};

/// Output format of the transform, estimate and models commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}. Valid values: text, json", s)),
        }
    }
}

/// Inputs shared by `transform` and `estimate`
#[derive(Debug, Clone, Default)]
pub struct TransformOptions {
    /// Inline text; wins over `file`, stdin is read when both are absent
    pub text: Option<String>,
    pub file: Option<PathBuf>,
    pub instruction: String,
    pub model: Option<String>,
    pub shortening_model: Option<String>,
    pub temperature: Option<f64>,
    pub dry_run: bool,
    pub format: OutputFormat,
}

/// Command execution context
///
/// Configuration plus the transformer built from it.
pub struct CommandContext {
    pub config: Config,
    pub transformer: TextTransformer,
}

impl CommandContext {
    /// Load config (explicit file, or the full resolution chain) and build the engine
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let config = match config_path {
            Some(path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load()?,
        };
        Self::from_config(config)
    }

    pub fn from_config(config: Config) -> Result<Self> {
        let credentials: SharedCredentials =
            Arc::new(EnvCredentials::new(config.api.api_key_env.as_str()));
        let registry = ModelRegistry::from_config(&config, credentials)?;
        let counter = TokenCounter::new(config.estimation.tokenizer);
        let chunker = TextChunker::new(counter.clone())
            .with_overlap(config.chunking.overlap_chars)
            .with_accuracy_threshold(config.chunking.accuracy_threshold);

        Ok(Self {
            transformer: TextTransformer::new(registry, counter).with_chunker(chunker),
            config,
        })
    }

    /// Request from CLI options, falling back to configured defaults
    pub fn request(&self, input_text: String, options: &TransformOptions) -> Result<TransformRequest> {
        let defaults = &self.config.transform;
        let temperature = options.temperature.unwrap_or(defaults.temperature);
        if !(0.0..=1.0).contains(&temperature) {
            return Err(RecastError::config(format!(
                "--temperature must be between 0.0 and 1.0, got {}",
                temperature
            )));
        }

        Ok(TransformRequest::new(input_text, postfix_instruction(&options.instruction))
            .with_instruction_model(
                options
                    .model
                    .clone()
                    .unwrap_or_else(|| defaults.instruction_model.clone()),
            )
            .with_shortening_model(
                options
                    .shortening_model
                    .clone()
                    .unwrap_or_else(|| defaults.shortening_model.clone()),
            )
            .with_shortening_instruction(defaults.shortening_instruction.clone())
            .with_temperature(temperature))
    }
}

/// Instruction as appended to the text, separated by a blank line
pub fn postfix_instruction(instruction: &str) -> String {
    let instruction = instruction.trim();
    if instruction.is_empty() {
        String::new()
    } else {
        format!("\n\n{}", instruction)
    }
}

/// Read the text to transform: inline argument, file, or stdin
pub fn read_input(text: Option<&str>, file: Option<&Path>) -> Result<String> {
    let input = match (text, file) {
        (Some(text), _) => text.to_string(),
        (None, Some(path)) => {
            debug!("Reading input from {}", path.display());
            std::fs::read_to_string(path)?
        }
        (None, None) => {
            debug!("Reading input from stdin");
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };

    if input.trim().is_empty() {
        return Err(RecastError::config("No input text given"));
    }
    Ok(input)
}

/// Token cancelled on the first Ctrl-C
pub fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let guard = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling transformation");
            guard.cancel();
        }
    });
    cancel
}
