//! AI Integration Layer
//!
//! Model descriptors, token estimation, cost accounting and the HTTP backends
//! that perform single model rounds.

pub mod cost;
pub mod model;
pub mod provider;
pub mod timeout;
pub mod tokenizer;

pub use cost::{ComputeCost, ComputeRound};
pub use model::{ApiStyle, LanguageModel, builtin_models};
pub use provider::{
    CredentialsProvider, EnvCredentials, ModelBackend, ModelRegistry, OpenAiBackend, Response,
    SharedBackend, SharedCredentials, StaticCredentials,
};
pub use timeout::with_timeout;
pub use tokenizer::{TokenCounter, TokenEstimator, UnitKind, cost_usd, price_units};
