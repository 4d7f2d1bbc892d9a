//! Corax Provider Library
//!
//! Infrastructure-as-code provider for the Corax AI platform.
//!
//! # Features
//!
//! - **REST client**: authenticated JSON client for the Corax `/v1` API
//! - **Resources**: API keys, projects, chat and completion capabilities,
//!   model deployments and model providers
//! - **Lifecycle**: create, read, update, delete and import driven by plan
//!   and state documents, with diagnostics instead of panics
//! - **Schemas**: declarative attribute schemas with defaults and validators
//!
//! # Example
//!
//! ```no_run
//! use corax_provider::{config::ProviderConfig, provider::Provider};
//! use serde_json::json;
//!
//! # async fn run() -> corax_provider::Result<()> {
//! let provider = Provider::new(&ProviderConfig::load(None)?)?;
//! let response = provider
//!     .resource("corax_project")?
//!     .create(json!({"name": "test-project"}))
//!     .await;
//! assert!(!response.diagnostics.has_error());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod capability;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod harness;
pub mod provider;
pub mod resources;

pub use error::{Error, Result};

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Setup tracing/logging
///
/// Logs go to stderr so stdout stays a clean JSON document.
pub fn setup_tracing(level: &str, format: Option<&str>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::registry().with(filter);

    match format {
        Some("json") => {
            subscriber
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .try_init()
                .map_err(|e| Error::Internal(format!("failed to install subscriber: {e}")))?;
        }
        _ => {
            subscriber
                .with(fmt::layer().with_writer(std::io::stderr))
                .try_init()
                .map_err(|e| Error::Internal(format!("failed to install subscriber: {e}")))?;
        }
    }

    Ok(())
}
