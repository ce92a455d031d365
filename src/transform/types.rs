//! Orchestration request and result types

use serde::{Deserialize, Serialize};

use crate::ai::cost::ComputeCost;
use crate::ai::provider::Response;
use crate::constants::transform as transform_constants;

/// One orchestration call's input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformRequest {
    /// Text to transform, any length
    pub input_text: String,
    /// Appended to the (possibly shortened) text for the final round
    pub postfix_instruction: String,
    /// Label of the model performing the final round
    pub instruction_model: String,
    /// Appended to every chunk sent for shortening
    pub shortening_instruction: String,
    /// Label of the model compressing oversized chunks
    pub shortening_model: String,
    /// Randomness in 0..1, scaled per model
    pub temperature_normalized: f64,
}

impl TransformRequest {
    pub fn new(input_text: impl Into<String>, postfix_instruction: impl Into<String>) -> Self {
        Self {
            input_text: input_text.into(),
            postfix_instruction: postfix_instruction.into(),
            instruction_model: transform_constants::DEFAULT_INSTRUCTION_MODEL.to_string(),
            shortening_instruction: transform_constants::DEFAULT_SHORTENING_INSTRUCTION
                .to_string(),
            shortening_model: transform_constants::DEFAULT_SHORTENING_MODEL.to_string(),
            temperature_normalized: transform_constants::DEFAULT_TEMPERATURE_NORMALIZED,
        }
    }

    pub fn with_instruction_model(mut self, label: impl Into<String>) -> Self {
        self.instruction_model = label.into();
        self
    }

    pub fn with_shortening_model(mut self, label: impl Into<String>) -> Self {
        self.shortening_model = label.into();
        self
    }

    pub fn with_shortening_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.shortening_instruction = instruction.into();
        self
    }

    pub fn with_temperature(mut self, normalized: f64) -> Self {
        self.temperature_normalized = normalized;
        self
    }
}

/// Outcome classification surfaced to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Status {
    Success,
    Error { title: String, details: String },
}

impl Status {
    /// First error among `responses`, in round order
    pub fn from_responses(responses: &[Response]) -> Self {
        responses
            .iter()
            .find(|response| response.is_error())
            .map(|response| Status::Error {
                title: response.error_title.clone(),
                details: response.error_text.clone(),
            })
            .unwrap_or(Status::Success)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Status::Success)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextTransformationResult {
    pub is_dry_run: bool,
    /// Text of the final round only; shortening rounds are never surfaced
    pub result_text: String,
    /// Worst-case cost from the simulated pass
    pub estimated_cost: ComputeCost,
    /// Zero sentinel for dry runs
    pub actual_cost: ComputeCost,
    pub status: Status,
}

impl TextTransformationResult {
    pub fn from_rounds(is_dry_run: bool, simulated: &[Response], execution: &[Response]) -> Self {
        let actual_cost = if is_dry_run {
            ComputeCost::zero()
        } else {
            ComputeCost::from_responses(execution)
        };
        Self {
            is_dry_run,
            result_text: execution
                .last()
                .map(|response| response.text.clone())
                .unwrap_or_default(),
            estimated_cost: ComputeCost::from_responses(simulated),
            actual_cost,
            status: Status::from_responses(execution),
        }
    }
}
