//! LLM Backend Abstraction
//!
//! Defines the `ModelBackend` trait: exactly one network round trip turning input
//! text into a normalized `Response`. Failures never escape a backend; they come
//! back as error responses with a billing-aware token estimate.
//!
//! ## Modules
//!
//! - `credentials`: bearer token sources
//! - `openai`: OpenAI-compatible HTTP backend (completion and chat styles)
//! - `registry`: label-keyed collection of configured backends

mod credentials;
mod openai;
mod registry;

#[cfg(test)]
pub(crate) mod mock;

pub use credentials::{CredentialsProvider, EnvCredentials, SharedCredentials, StaticCredentials};
pub use openai::OpenAiBackend;
pub use registry::ModelRegistry;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::ai::model::LanguageModel;
use crate::ai::tokenizer::{TokenCounter, UnitKind, price_units};
use crate::constants::transform::DRY_RUN_FILLER;
use crate::types::RoundError;

// =============================================================================
// Round Response
// =============================================================================

/// Outcome of one model round trip.
///
/// `error_title` is non-empty iff the round failed. A failed round has empty
/// `text` and unit counts holding the billing estimate of the failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub text: String,
    pub language_model_label: String,
    pub compute_units_in_request: usize,
    pub compute_units_in_response: usize,
    pub compute_unit_request_cost_usd: f64,
    pub compute_unit_response_cost_usd: f64,
    pub error_title: String,
    pub error_text: String,
}

impl Response {
    /// Successful round with provider-reported usage
    pub fn success(
        text: impl Into<String>,
        model: &LanguageModel,
        units_in_request: usize,
        units_in_response: usize,
    ) -> Self {
        Self {
            text: text.into(),
            language_model_label: model.label.clone(),
            compute_units_in_request: units_in_request,
            compute_units_in_response: units_in_response,
            compute_unit_request_cost_usd: UnitKind::Request.rate(model),
            compute_unit_response_cost_usd: UnitKind::Response.rate(model),
            error_title: String::new(),
            error_text: String::new(),
        }
    }

    /// Failed round. Billed failures assume the worst case of a maxed out round,
    /// unbilled ones cost nothing.
    pub fn failed(model: &LanguageModel, error: &RoundError) -> Self {
        let (units_in_request, units_in_response) = if error.is_billed() {
            (model.max_request_tokens(), model.max_response_tokens)
        } else {
            (0, 0)
        };
        Self {
            error_title: error.title().to_string(),
            error_text: error.details(),
            ..Self::success(String::new(), model, units_in_request, units_in_response)
        }
    }

    /// Worst-case stand-in for a round, produced without network access
    pub fn simulated(input_text: &str, model: &LanguageModel, counter: &TokenCounter) -> Self {
        let units_in_request =
            counter.estimate_total_units(input_text, model) - model.max_response_tokens;
        Self::success(
            DRY_RUN_FILLER
                .to_string()
                .repeat(model.max_response_tokens),
            model,
            units_in_request,
            model.max_response_tokens,
        )
    }

    pub fn is_error(&self) -> bool {
        !self.error_title.is_empty()
    }

    pub fn usd(&self) -> f64 {
        price_units(self.compute_units_in_request, self.compute_unit_request_cost_usd)
            + price_units(self.compute_units_in_response, self.compute_unit_response_cost_usd)
    }
}

// =============================================================================
// Backend Trait
// =============================================================================

/// One configured model, able to transform text in a single round trip
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Descriptor of the model this backend serves
    fn model(&self) -> &LanguageModel;

    /// Transform `input_text` with the provider temperature `temperature`.
    ///
    /// Never fails: transport and parse failures become error responses.
    async fn transform(&self, input_text: &str, temperature: f64) -> Response;
}

/// Shared backend handle for the registry and orchestrator
pub type SharedBackend = Arc<dyn ModelBackend>;
