//! Recast - LLM Text Transformation Engine
//!
//! Sends text plus an instruction to an OpenAI-compatible model and returns the
//! transformed text with its cost. Text too large for one round is split into
//! overlapping chunks, shortened by a cheaper model and reassembled until the
//! final round fits.
//!
//! ## Core Features
//!
//! - **Recursive shortening**: coarse-to-fine chunk size search per model budget
//! - **Dry run**: worst-case cost preview without any network call
//! - **Billing-aware failures**: failed rounds are priced by failure kind
//! - **Cancellation**: latest-request-wins for interactive callers
//!
//! ## Quick Start
//!
//! ```ignore
//! use recast::{Config, ModelRegistry, TextTransformer, TokenCounter, TransformRequest};
//! use recast::ai::EnvCredentials;
//!
//! let config = Config::default();
//! let registry = ModelRegistry::from_config(&config, Arc::new(EnvCredentials::default()))?;
//! let transformer = TextTransformer::new(registry, TokenCounter::char_based());
//! let request = TransformRequest::new(text, "\n\nFix the grammar:");
//! let result = transformer.execute(&request, false).await?;
//! println!("{} ({})", result.result_text, result.actual_cost.text);
//! ```
//!
//! ## Modules
//!
//! - [`ai`]: model descriptors, backends, token and cost estimation
//! - [`transform`]: chunking engine and orchestrator
//! - [`config`]: layered configuration
//! - [`cli`]: command implementations for the `recast` binary

pub mod ai;
pub mod cli;
pub mod config;
pub mod constants;
pub mod transform;
pub mod types;

// =============================================================================
// Core Re-exports
// =============================================================================

// Configuration
pub use config::{Config, ConfigLoader};

// Error Types
pub use types::error::{ErrorCategory, RecastError, Result, RoundError};

// =============================================================================
// Engine Re-exports
// =============================================================================

pub use ai::{
    ComputeCost, ComputeRound, LanguageModel, ModelBackend, ModelRegistry, Response, TokenCounter,
};
pub use transform::{
    LatestOnly, Status, TextChunker, TextTransformationResult, TextTransformer, TransformRequest,
};
