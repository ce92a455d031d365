//! Unified Error Type System
//!
//! Two layers of failure exist in the engine:
//!
//! - **RecastError**: fatal for the call that produced it (unknown model label,
//!   invalid configuration, cancellation). Returned through `Result`.
//! - **RoundError**: one model round trip failed. Never escapes the orchestrator;
//!   it is converted into an error `Response` carrying a billing estimate.
//!
//! ## Round Error Categories
//!
//! - **Timeout**: the provider may still have processed the request (billed)
//! - **Offline**: the request never reached the provider (not billed)
//! - **Unparseable**: billed unless the body is a provider error payload
//! - **Unknown**: not billed (policy, see `RoundError::is_billed`)

use std::time::Duration;
use thiserror::Error;

// =============================================================================
// Error Categories
// =============================================================================

/// Category of a failed model round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Request exceeded the model's timeout
    Timeout,
    /// Name resolution or connection failure
    Offline,
    /// Response body did not match the expected schema
    Unparseable,
    /// Anything else
    Unknown,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Timeout => write!(f, "TIMEOUT"),
            Self::Offline => write!(f, "OFFLINE"),
            Self::Unparseable => write!(f, "UNPARSEABLE"),
            Self::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

impl ErrorCategory {
    /// User-facing title for an error response
    pub fn title(&self) -> &'static str {
        match self {
            Self::Timeout => "Timed out",
            Self::Offline => "Offline",
            Self::Unparseable => "Unexpected response",
            Self::Unknown => "Error",
        }
    }
}

// =============================================================================
// Round Error
// =============================================================================

/// Marker that provider error payloads carry in their JSON body
const PROVIDER_ERROR_MARKER: &str = "\"error\"";

/// Failure of a single model round trip
#[derive(Debug, Clone)]
pub struct RoundError {
    /// Error category for billing decisions
    pub category: ErrorCategory,
    /// Detailed error message
    pub message: String,
    /// HTTP status, when a response was received
    pub status: Option<u16>,
    /// Raw response body, when a response was received
    pub raw_body: Option<String>,
}

impl std::fmt::Display for RoundError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status {
            Some(status) => write!(f, "[{}:{}] {}", self.category, status, self.message),
            None => write!(f, "[{}] {}", self.category, self.message),
        }
    }
}

impl std::error::Error for RoundError {}

impl RoundError {
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
            status: None,
            raw_body: None,
        }
    }

    pub fn timeout(after: Duration) -> Self {
        Self::new(
            ErrorCategory::Timeout,
            format!("No response within {:.1}s", after.as_secs_f64()),
        )
    }

    pub fn offline(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Offline, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Unknown, message)
    }

    /// Body received but not convertible to the expected schema
    pub fn unparseable(message: impl Into<String>, status: u16, raw_body: impl Into<String>) -> Self {
        Self {
            category: ErrorCategory::Unparseable,
            message: message.into(),
            status: Some(status),
            raw_body: Some(raw_body.into()),
        }
    }

    /// Whether the provider is assumed to have charged for the round.
    ///
    /// Unknown failures are treated as unbilled. This is a policy choice that may
    /// undercount provider costs for unclassified failures.
    pub fn is_billed(&self) -> bool {
        match self.category {
            ErrorCategory::Timeout => true,
            ErrorCategory::Unparseable => !self
                .raw_body
                .as_deref()
                .is_some_and(|body| body.contains(PROVIDER_ERROR_MARKER)),
            ErrorCategory::Offline | ErrorCategory::Unknown => false,
        }
    }

    pub fn title(&self) -> &'static str {
        self.category.title()
    }

    /// Details string shown to the user under the title
    pub fn details(&self) -> String {
        match (self.status, self.raw_body.as_deref()) {
            (Some(status), Some(body)) => {
                format!("{}\nHTTP {}\n{}", self.message, status, body)
            }
            (Some(status), None) => format!("{}\nHTTP {}", self.message, status),
            _ => self.message.clone(),
        }
    }
}

/// Fatal errors raised inside a round still end up as a round failure
impl From<RecastError> for RoundError {
    fn from(err: RecastError) -> Self {
        match err {
            RecastError::Timeout { duration, .. } => Self::timeout(duration),
            other => Self::unknown(other.to_string()),
        }
    }
}

// =============================================================================
// Error Classifier
// =============================================================================

/// Maps transport failures onto round error categories
pub struct ErrorClassifier;

impl ErrorClassifier {
    /// Classify a reqwest failure by its kind rather than its message
    pub fn classify_reqwest(err: &reqwest::Error) -> RoundError {
        let message = error_chain(err);
        if err.is_timeout() {
            return RoundError::new(ErrorCategory::Timeout, message);
        }
        if err.is_connect() {
            return RoundError::offline(message);
        }
        if err.is_decode() {
            let status = err.status().map(|s| s.as_u16()).unwrap_or_default();
            return RoundError::unparseable(message, status, String::new());
        }
        RoundError::unknown(message)
    }
}

/// Render an error with its sources, reqwest hides the useful part in them
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(inner) = source {
        message.push_str(": ");
        message.push_str(&inner.to_string());
        source = inner.source();
    }
    message
}

// =============================================================================
// Application Error
// =============================================================================

#[derive(Debug, Error)]
pub enum RecastError {
    // -------------------------------------------------------------------------
    // System Errors (auto From impl)
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HTTP client error: {0}")]
    Http(String),

    // -------------------------------------------------------------------------
    // Orchestration Errors
    // -------------------------------------------------------------------------
    /// Unknown model label, invalid settings. Fatal, never retried.
    #[error("Config error: {0}")]
    Config(String),

    /// The caller cancelled the run, or a newer run superseded it
    #[error("Transformation cancelled")]
    Cancelled,

    #[error("Timeout after {duration:?}: {operation}")]
    Timeout {
        operation: String,
        duration: Duration,
    },
}

pub type Result<T> = std::result::Result<T, RecastError>;

impl RecastError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn timeout(operation: impl Into<String>, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

// =============================================================================
// Tests
// =============================================================================
