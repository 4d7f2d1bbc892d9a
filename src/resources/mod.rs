//! Resource lifecycle handlers, one module per resource kind
//!
//! Every handler owns a shared [`CoraxClient`] and maps between its typed
//! state model and the client's wire types. A 404 on read removes the
//! resource from state; a 404 on delete counts as success.

pub mod api_key;
pub mod chat_capability;
pub mod completion_capability;
pub mod model_deployment;
pub mod model_provider;
pub mod project;

pub use api_key::{ApiKeyModel, ApiKeyResource};
pub use chat_capability::{ChatCapabilityModel, ChatCapabilityResource};
pub use completion_capability::{CompletionCapabilityModel, CompletionCapabilityResource};
pub use model_deployment::{ModelDeploymentModel, ModelDeploymentResource};
pub use model_provider::{ModelProviderModel, ModelProviderResource};
pub use project::{ProjectModel, ProjectResource};

use crate::capability::{self, CapabilityConfigModel, RETENTION_INFINITE, RETENTION_TIMED};
use crate::client::CapabilityConfig;
use crate::harness::{Attribute, AttributeKind, Validator};
use crate::Result;

/// `Ok(None)` for a 404, the value otherwise
pub(crate) fn found<T>(result: Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

/// Validate and map a capability `config` block for a request
pub(crate) fn config_payload(config: Option<&CapabilityConfigModel>) -> Result<Option<CapabilityConfig>> {
    if let Some(config) = config {
        capability::validate(config)?;
    }
    capability::to_wire(config)
}

/// Non-empty string attribute
pub(crate) fn name_attribute(description: &'static str) -> Attribute {
    Attribute::required("name", AttributeKind::String)
        .validate(Validator::LengthAtLeast(1))
        .describe(description)
}

/// `config` block shared by chat and completion capabilities
pub(crate) fn capability_config_attribute() -> Attribute {
    Attribute::optional(
        "config",
        AttributeKind::Object(vec![
            Attribute::optional("temperature", AttributeKind::Float)
                .describe("Sampling temperature."),
            Attribute::optional_computed(
                "blob_config",
                AttributeKind::Object(vec![
                    Attribute::optional_computed("max_file_size_mb", AttributeKind::Int)
                        .describe("Maximum size of one upload, in megabytes."),
                    Attribute::optional_computed("max_blobs", AttributeKind::Int)
                        .describe("Maximum number of uploads."),
                    Attribute::optional_computed("allowed_mime_types", AttributeKind::StringList)
                        .describe("Accepted MIME types."),
                ]),
            )
            .describe("Upload limits."),
            Attribute::optional(
                "data_retention",
                AttributeKind::Object(vec![
                    Attribute::required("type", AttributeKind::String)
                        .validate(Validator::OneOf(&[RETENTION_TIMED, RETENTION_INFINITE]))
                        .describe("Either 'timed' or 'infinite'."),
                    Attribute::optional("hours", AttributeKind::Int)
                        .validate(Validator::AtLeast(1))
                        .describe("Hours to keep data; required for 'timed', not allowed for 'infinite'."),
                ]),
            )
            .describe("Data retention policy."),
            Attribute::optional_computed("content_tracing", AttributeKind::Bool)
                .describe("Record content in observability systems. Defaults to true."),
            Attribute::optional("custom_parameters", AttributeKind::Dynamic)
                .describe("Free-form parameters as a JSON string or an object."),
        ]),
    )
    .describe("Behavioural configuration of the capability.")
}

/// Audit attributes every capability carries
pub(crate) fn capability_audit_attributes() -> [Attribute; 6] {
    [
        Attribute::computed("owner", AttributeKind::String).describe("Owner of the capability."),
        Attribute::computed("type", AttributeKind::String).describe("Capability type."),
        Attribute::computed("created_at", AttributeKind::String).describe("Creation time."),
        Attribute::computed("updated_at", AttributeKind::String).describe("Last modification time."),
        Attribute::computed("created_by", AttributeKind::String).describe("Creator."),
        Attribute::computed("updated_by", AttributeKind::String).describe("Last modifier."),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use reqwest::StatusCode;

    #[test]
    fn test_found() {
        assert_eq!(found(Ok(1)).unwrap(), Some(1));

        let gone: Result<i32> = Err(Error::api(StatusCode::NOT_FOUND, String::new()).context("read"));
        assert_eq!(found(gone).unwrap(), None);

        let failed: Result<i32> = Err(Error::api(StatusCode::BAD_GATEWAY, String::new()));
        assert!(found(failed).is_err());
    }

    #[test]
    fn test_config_payload_validates_first() {
        let config = CapabilityConfigModel {
            data_retention: Some(capability::DataRetentionModel {
                kind: RETENTION_INFINITE.to_string(),
                hours: Some(3),
            }),
            ..Default::default()
        };
        assert!(config_payload(Some(&config)).is_err());
        assert_eq!(config_payload(None).unwrap(), None);
    }
}
