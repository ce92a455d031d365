//! Compute Cost Aggregation
//!
//! Turns round responses into per-round accounting and an aggregate with a
//! human-readable summary.
//!
//! ## Usage
//!
//! ```ignore
//! let cost = ComputeCost::from_responses(&responses);
//! println!("~{}", cost.text); // "3 rounds, $0.011"
//! ```

use serde::{Deserialize, Serialize};

use crate::ai::provider::Response;

/// Accounting of one model invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputeRound {
    /// Label of the model that served the round
    pub language_model: String,
    pub compute_units_in_request: usize,
    pub compute_units_in_response: usize,
    pub usd: f64,
}

impl ComputeRound {
    pub fn from_response(response: &Response) -> Self {
        Self {
            language_model: response.language_model_label.clone(),
            compute_units_in_request: response.compute_units_in_request,
            compute_units_in_response: response.compute_units_in_response,
            usd: response.usd(),
        }
    }
}

/// Ordered rounds plus their aggregate price
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputeCost {
    pub compute_rounds: Vec<ComputeRound>,
    /// Always the sum of `compute_rounds[..].usd`
    pub usd: f64,
    /// Summary such as "2 rounds, $0.0024"
    pub text: String,
}

impl ComputeCost {
    /// Sentinel for runs that incurred no cost
    pub fn zero() -> Self {
        Self {
            compute_rounds: Vec::new(),
            usd: 0.0,
            text: String::new(),
        }
    }

    pub fn from_rounds(compute_rounds: Vec<ComputeRound>) -> Self {
        let usd = compute_rounds.iter().map(|round| round.usd).sum();
        let text = format!(
            "{} rounds, ${}",
            compute_rounds.len(),
            format_significant(usd, 2)
        );
        Self {
            compute_rounds,
            usd,
            text,
        }
    }

    pub fn from_responses(responses: &[Response]) -> Self {
        Self::from_rounds(responses.iter().map(ComputeRound::from_response).collect())
    }

    pub fn is_zero(&self) -> bool {
        self.compute_rounds.is_empty() && self.usd == 0.0
    }

    pub fn total_units(&self) -> usize {
        self.compute_rounds
            .iter()
            .map(|r| r.compute_units_in_request + r.compute_units_in_response)
            .sum()
    }
}

/// Round to `digits` significant digits and print without exponent
pub fn format_significant(value: f64, digits: usize) -> String {
    if value == 0.0 || !value.is_finite() {
        return "0".to_string();
    }
    let magnitude = decimal_magnitude(value);
    let digits = digits.max(1) as i64;
    // Integer digits past the significant ones are rounded away: 123.4 -> 120
    if magnitude >= digits - 1 {
        let step = 10f64.powi((magnitude - digits + 1) as i32);
        return format!("{:.0}", (value / step).round() * step);
    }
    let mut decimals = (digits - 1 - magnitude) as usize;
    let scale = 10f64.powi(decimals as i32);
    let rounded = (value * scale).round() / scale;
    // 0.0999 rounds up to 0.10, one decimal fewer keeps the digit count
    if decimal_magnitude(rounded) > magnitude {
        decimals = decimals.saturating_sub(1);
    }
    format!("{:.*}", decimals, rounded)
}

/// Exponent of the leading decimal digit, corrected for log10 imprecision
fn decimal_magnitude(value: f64) -> i64 {
    let value = value.abs();
    let mut magnitude = value.log10().floor() as i64;
    if 10f64.powi(magnitude as i32 + 1) <= value {
        magnitude += 1;
    } else if 10f64.powi(magnitude as i32) > value {
        magnitude -= 1;
    }
    magnitude
}

// =============================================================================
// Tests
// =============================================================================
