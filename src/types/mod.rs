pub mod error;

pub use error::{ErrorCategory, ErrorClassifier, RecastError, Result, RoundError};
