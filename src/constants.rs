//! Global Constants
//!
//! Centralized constants for configuration and tuning.
//! All magic numbers should be defined here with documentation.

/// Chunking engine constants
pub mod chunking {
    /// Characters shared by consecutive chunks to keep context across the cut
    pub const DEFAULT_OVERLAP_CHARS: usize = 100;

    /// Chunk size search stops once the increment is this small (characters)
    pub const DEFAULT_ACCURACY_THRESHOLD: usize = 10;

    /// Separator between shortened chunks when they are reassembled
    pub const SHORTENED_PART_SEPARATOR: &str = "\n\n";
}

/// Transformation defaults
pub mod transform {
    /// Model performing the user-requested transformation
    pub const DEFAULT_INSTRUCTION_MODEL: &str = "DaVinci";

    /// Model compressing oversized chunks
    pub const DEFAULT_SHORTENING_MODEL: &str = "Turbo";

    /// Suffix appended to each chunk sent for shortening
    pub const DEFAULT_SHORTENING_INSTRUCTION: &str = "\n\nThe text above, slightly shortened:";

    /// Normalized randomness, scaled by the model's maximum temperature
    pub const DEFAULT_TEMPERATURE_NORMALIZED: f64 = 0.35;

    /// Character a simulated dry-run response is made of
    pub const DRY_RUN_FILLER: char = '#';
}

/// Model descriptor defaults
pub mod model {
    /// Upper bound of the provider temperature range
    pub const DEFAULT_MAX_TEMPERATURE: f64 = 2.0;
}

/// HTTP/Network constants
pub mod network {
    /// OpenAI-compatible API base URL
    pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

    /// Environment variable holding the bearer token
    pub const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";

    /// Connection establishment timeout (seconds)
    pub const CONNECTION_TIMEOUT_SECS: u64 = 10;
}
