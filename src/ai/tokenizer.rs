//! Token Counting and Cost Estimation
//!
//! Computes compute-unit (token) counts of candidate texts without any network
//! access. This purity is what makes dry-run estimation possible.
//!
//! ## Strategy
//! - `CharBased`: 1 token per character. Conservative fallback, exact for nothing
//!   but never below the real count for typical text.
//! - `Tiktoken` (feature `tiktoken`): BPE keyed by the model's provider name.
//!
//! The response size is unknown before a call, so totals always add the model's
//! response cap as an upper bound.

use serde::{Deserialize, Serialize};

use crate::ai::model::LanguageModel;

/// Token estimation method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenEstimator {
    /// One token per character
    #[default]
    #[serde(rename = "chars")]
    CharBased,
    /// Model-specific BPE tokenizer, falls back to `CharBased` for unknown models
    Tiktoken,
}

impl std::fmt::Display for TokenEstimator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenEstimator::CharBased => write!(f, "chars"),
            TokenEstimator::Tiktoken => write!(f, "tiktoken"),
        }
    }
}

impl std::str::FromStr for TokenEstimator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "chars" | "charbased" => Ok(TokenEstimator::CharBased),
            "tiktoken" => Ok(TokenEstimator::Tiktoken),
            _ => Err(format!(
                "Unknown tokenizer: {}. Valid values: chars, tiktoken",
                s
            )),
        }
    }
}

/// Which side of a round a token count belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitKind {
    Request,
    Response,
}

impl UnitKind {
    /// Per-token price of this side of a round on `model`
    pub fn rate(self, model: &LanguageModel) -> f64 {
        match self {
            UnitKind::Request => model.usd_per_request_token,
            UnitKind::Response => model.usd_per_response_token,
        }
    }
}

/// Token counter for budget checks and cost estimates
#[derive(Clone, Default)]
pub struct TokenCounter {
    estimator: TokenEstimator,
    #[cfg(feature = "tiktoken")]
    bpe_cache: std::sync::Arc<bpe::BpeCache>,
}

impl std::fmt::Debug for TokenCounter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCounter")
            .field("estimator", &self.estimator)
            .finish()
    }
}

impl TokenCounter {
    pub fn new(estimator: TokenEstimator) -> Self {
        if estimator == TokenEstimator::Tiktoken && !cfg!(feature = "tiktoken") {
            tracing::warn!("Built without the `tiktoken` feature, using character estimate");
        }
        Self {
            estimator,
            #[cfg(feature = "tiktoken")]
            bpe_cache: Default::default(),
        }
    }

    /// Conservative 1 token per character counter
    pub fn char_based() -> Self {
        Self::new(TokenEstimator::CharBased)
    }

    pub fn estimator(&self) -> TokenEstimator {
        self.estimator
    }

    /// Estimated tokens of `text` sent as a request to `model`
    pub fn estimate_request_units(&self, text: &str, model: &LanguageModel) -> usize {
        match self.estimator {
            TokenEstimator::CharBased => count_chars(text),
            #[cfg(feature = "tiktoken")]
            TokenEstimator::Tiktoken => self
                .bpe_cache
                .count(&model.name, text)
                .unwrap_or_else(|| count_chars(text)),
            #[cfg(not(feature = "tiktoken"))]
            TokenEstimator::Tiktoken => {
                let _ = model;
                count_chars(text)
            }
        }
    }

    /// Request estimate plus the model's response cap
    pub fn estimate_total_units(&self, text: &str, model: &LanguageModel) -> usize {
        self.estimate_request_units(text, model) + model.max_response_tokens
    }

    /// Check if a request of `text` fits within the model's total budget
    pub fn fits(&self, text: &str, model: &LanguageModel) -> bool {
        self.estimate_total_units(text, model) <= model.max_total_tokens
    }
}

fn count_chars(text: &str) -> usize {
    text.chars().count()
}

/// Price of `units` tokens on the given side of a round
pub fn cost_usd(units: usize, model: &LanguageModel, kind: UnitKind) -> f64 {
    price_units(units, kind.rate(model))
}

/// Price of `units` tokens at a fixed per-token rate
pub fn price_units(units: usize, usd_per_unit: f64) -> f64 {
    units as f64 * usd_per_unit
}

#[cfg(feature = "tiktoken")]
mod bpe {
    use dashmap::DashMap;
    use std::sync::Arc;
    use tiktoken_rs::CoreBPE;
    use tracing::debug;

    /// Lazily built BPE per provider model name; `None` marks unsupported models
    #[derive(Default)]
    pub struct BpeCache {
        encoders: DashMap<String, Option<Arc<CoreBPE>>>,
    }

    impl BpeCache {
        pub fn count(&self, model_name: &str, text: &str) -> Option<usize> {
            let encoder = self
                .encoders
                .entry(model_name.to_string())
                .or_insert_with(|| match tiktoken_rs::get_bpe_from_model(model_name) {
                    Ok(bpe) => Some(Arc::new(bpe)),
                    Err(e) => {
                        debug!("No tokenizer for {}, using character estimate: {}", model_name, e);
                        None
                    }
                })
                .clone()?;
            Some(encoder.encode_with_special_tokens(text).len())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::model::builtin_models;

    fn davinci() -> LanguageModel {
        builtin_models()
            .into_iter()
            .find(|m| m.label == "DaVinci")
            .unwrap()
    }

    #[test]
    fn test_char_based_fallback_counts_characters() {
        let counter = TokenCounter::char_based();
        let model = davinci();
        assert_eq!(counter.estimate_request_units("Hello world", &model), 11);
        // Multi-byte characters count once
        assert_eq!(counter.estimate_request_units("héllo wörld", &model), 11);
        assert_eq!(counter.estimate_request_units("", &model), 0);
    }

    #[test]
    fn test_total_adds_response_cap() {
        let counter = TokenCounter::char_based();
        let model = davinci();
        assert_eq!(counter.estimate_total_units("Hello world", &model), 11 + 512);
    }

    #[test]
    fn test_fits_budget_boundary() {
        let counter = TokenCounter::char_based();
        let model = davinci();
        let exact = "a".repeat(model.max_request_tokens());
        assert!(counter.fits(&exact, &model));
        let over = "a".repeat(model.max_request_tokens() + 1);
        assert!(!counter.fits(&over, &model));
    }

    #[test]
    fn test_cost_uses_side_specific_rate() {
        let gpt4 = builtin_models().pop().unwrap();
        assert!((cost_usd(1000, &gpt4, UnitKind::Request) - 0.03).abs() < 1e-12);
        assert!((cost_usd(1000, &gpt4, UnitKind::Response) - 0.06).abs() < 1e-12);
        assert_eq!(cost_usd(0, &gpt4, UnitKind::Response), 0.0);
    }

    #[test]
    fn test_estimator_parse() {
        assert_eq!(
            "chars".parse::<TokenEstimator>().unwrap(),
            TokenEstimator::CharBased
        );
        assert_eq!(
            "TikToken".parse::<TokenEstimator>().unwrap(),
            TokenEstimator::Tiktoken
        );
        assert!("words".parse::<TokenEstimator>().is_err());
        assert_eq!(TokenEstimator::CharBased.to_string(), "chars");
    }

    #[cfg(not(feature = "tiktoken"))]
    #[test]
    fn test_tiktoken_without_feature_falls_back_to_chars() {
        let counter = TokenCounter::new(TokenEstimator::Tiktoken);
        assert_eq!(counter.estimate_request_units("Hello world", &davinci()), 11);
    }

    #[cfg(feature = "tiktoken")]
    #[test]
    fn test_tiktoken_counts_fewer_units_than_chars() {
        let counter = TokenCounter::new(TokenEstimator::Tiktoken);
        let model = builtin_models().pop().unwrap();
        let units = counter.estimate_request_units("Hello world, this is a test.", &model);
        assert!(units > 0);
        assert!(units < "Hello world, this is a test.".chars().count());
    }
}
