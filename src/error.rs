//! Error types for the Corax provider

use std::io;

use reqwest::StatusCode;
use thiserror::Error;

/// Result type alias for the Corax provider
pub type Result<T> = std::result::Result<T, Error>;

/// Bodies shorter than this are used verbatim as the API error message
const MAX_INLINE_BODY: usize = 512;

/// Corax provider errors
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Input rejected before any request was sent
    #[error("{0}")]
    Validation(String),

    /// Operation the resource kind does not support
    #[error("{0}")]
    Unsupported(String),

    /// Request could not be delivered or the response could not be read
    #[error("{context}: {source}")]
    Transport {
        /// Step that failed
        context: String,
        /// Underlying HTTP error
        #[source]
        source: reqwest::Error,
    },

    /// Request body could not be encoded
    #[error("failed to marshal request body for {context}: {source}")]
    Encode {
        /// Request being built
        context: String,
        /// Encoder error
        #[source]
        source: serde_json::Error,
    },

    /// Non-2xx response from the Corax API
    #[error("API error: status {status}, message: {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Short description (body when small, status text otherwise)
        message: String,
        /// Raw response body
        body: String,
    },

    /// Response body did not match the expected shape
    #[error("failed to unmarshal response body for {context}: {source}, body: {body}")]
    Decode {
        /// Request whose response failed to decode
        context: String,
        /// Raw response body
        body: String,
        /// Decoder error
        #[source]
        source: serde_json::Error,
    },

    /// A lifecycle step failed
    #[error("{action}, got error: {source}")]
    Operation {
        /// What the handler was attempting, e.g. "Unable to read project p-1"
        action: String,
        /// Underlying failure
        #[source]
        source: Box<Error>,
    },

    /// Dynamic value or schema definition conversion error
    #[error(transparent)]
    Value(#[from] corax_core::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Build an API error from a non-2xx status and its raw body
    pub fn api(status: StatusCode, body: String) -> Self {
        let message = if status == StatusCode::NOT_FOUND {
            "resource not found".to_string()
        } else if !body.is_empty() && body.len() < MAX_INLINE_BODY {
            body.clone()
        } else {
            status
                .canonical_reason()
                .unwrap_or("unknown status")
                .to_string()
        };

        Self::Api {
            status: status.as_u16(),
            message,
            body,
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Wrap with the lifecycle step that failed
    #[must_use]
    pub fn context(self, action: impl Into<String>) -> Self {
        Self::Operation {
            action: action.into(),
            source: Box::new(self),
        }
    }

    /// Whether this is (or wraps) an API error with status 404
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Api { status: 404, .. } => true,
            Self::Operation { source, .. } => source.is_not_found(),
            _ => false,
        }
    }

    /// Diagnostic summary used when this error is reported to the operator
    #[must_use]
    pub fn summary(&self) -> &'static str {
        match self {
            Self::Validation(_) | Self::Value(_) => "Validation Error",
            Self::Unsupported(_) => "Update Not Supported",
            Self::Transport { .. } | Self::Api { .. } | Self::Decode { .. } | Self::Encode { .. } => {
                "Client Error"
            }
            Self::Config(_) => "Provider Configuration Error",
            Self::Operation { source, .. } => source.summary(),
            Self::Io(_) | Self::Json(_) | Self::Yaml(_) | Self::Internal(_) => "Provider Error",
        }
    }
}
