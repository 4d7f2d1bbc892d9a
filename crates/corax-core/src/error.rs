//! Error types for value conversion and schema normalization

use thiserror::Error;

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while converting dynamic values
#[derive(Error, Debug)]
pub enum Error {
    /// A float that JSON cannot represent (NaN or infinity)
    #[error("value for key '{key}' is not a finite number")]
    NonFiniteNumber {
        /// Dotted path of the offending entry
        key: String,
    },

    /// A JSON-encoded string that failed to parse
    #[error("invalid JSON for '{key}': {source}. Content: {content}")]
    InvalidJson {
        /// Attribute or entry the content belongs to
        key: String,
        /// Raw content that was rejected
        content: String,
        /// Parser error
        #[source]
        source: serde_json::Error,
    },

    /// A value whose shape is not accepted at this position
    #[error("unsupported value for '{key}': expected {expected}, got {found}")]
    UnsupportedValue {
        /// Attribute or entry the value belongs to
        key: String,
        /// What was expected
        expected: &'static str,
        /// Kind of value found
        found: &'static str,
    },

    /// JSON encoding failure
    #[error("failed to encode JSON: {0}")]
    Serialize(#[from] serde_json::Error),
}
