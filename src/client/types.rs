//! Wire types for the Corax REST API
//!
//! Response types default every field the API may omit, so a sparse body
//! still decodes; request types skip optional fields instead of sending null
//! unless the endpoint needs an explicit null.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

// ============================================================================
// API keys
// ============================================================================

/// API key as returned by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiKey {
    /// Key id
    pub id: String,
    /// Display name
    pub name: String,
    /// Secret value, only present in the create response
    #[serde(default)]
    pub key: Option<String>,
    /// Public prefix of the key
    #[serde(default)]
    pub prefix: String,
    /// Creator
    #[serde(default)]
    pub created_by: String,
    /// Creation time (RFC 3339)
    #[serde(default)]
    pub created_at: String,
    /// Expiry time (RFC 3339)
    #[serde(default)]
    pub expires_at: Option<String>,
    /// Last modification time
    #[serde(default)]
    pub updated_at: Option<String>,
    /// Last use time
    #[serde(default)]
    pub last_used_at: Option<String>,
    /// Whether the key is usable
    #[serde(default)]
    pub is_active: bool,
    /// Number of authenticated calls made with the key
    #[serde(default)]
    pub usage_count: i64,
}

/// Body of `POST /v1/api-keys`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiKeyCreate {
    /// Display name
    pub name: String,
    /// Expiry time (RFC 3339)
    pub expires_at: String,
}

// ============================================================================
// Projects
// ============================================================================

/// Project as returned by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    /// Project id
    pub id: String,
    /// Display name
    pub name: String,
    /// Free-text description
    #[serde(default)]
    pub description: Option<String>,
    /// Visible to everyone in the organisation
    #[serde(default)]
    pub is_public: bool,
    /// Creator
    #[serde(default)]
    pub created_by: String,
    /// Creation time
    #[serde(default)]
    pub created_at: String,
    /// Last modifier
    #[serde(default)]
    pub updated_by: Option<String>,
    /// Last modification time
    #[serde(default)]
    pub updated_at: Option<String>,
    /// Owner
    #[serde(default)]
    pub owner: String,
    /// Number of collections in the project
    #[serde(default)]
    pub collection_count: i64,
    /// Number of capabilities in the project
    #[serde(default)]
    pub capability_count: i64,
}

/// Body of `POST /v1/projects`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectCreate {
    /// Display name
    pub name: String,
    /// Free-text description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Visibility
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_public: Option<bool>,
}

/// Body of `PUT /v1/projects/{id}`; every field is sent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectUpdate {
    /// Display name
    pub name: String,
    /// Description, `null` clears it
    pub description: Option<String>,
    /// Visibility
    pub is_public: bool,
}

// ============================================================================
// Capability configuration
// ============================================================================

/// Behavioural configuration embedded in a capability
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CapabilityConfig {
    /// Sampling temperature
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Upload limits
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blob_config: Option<BlobConfig>,
    /// How long execution data is kept
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_retention: Option<DataRetention>,
    /// Record content in observability systems
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_tracing: Option<bool>,
    /// Free-form parameters passed to the model
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_parameters: Option<Map<String, Value>>,
}

/// Upload limits for a capability
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlobConfig {
    /// Maximum size of one upload, in megabytes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_file_size_mb: Option<i64>,
    /// Maximum number of uploads
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_blobs: Option<i64>,
    /// Accepted MIME types
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_mime_types: Option<Vec<String>>,
}

/// Data retention policy
///
/// Requests are built with [`DataRetention::timed`] or
/// [`DataRetention::infinite`], so `infinite` never carries hours. Responses
/// decode whatever the server sends: `hours` may be null or missing and
/// `type` may be a value this client does not know.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataRetention {
    /// `timed` or `infinite`
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Retention period in hours
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hours: Option<i64>,
}

impl DataRetention {
    /// Keep data for `hours` hours
    pub fn timed(hours: i64) -> Self {
        Self {
            kind: "timed".to_string(),
            hours: Some(hours),
        }
    }

    /// Keep data forever
    pub fn infinite() -> Self {
        Self {
            kind: "infinite".to_string(),
            hours: None,
        }
    }
}

// ============================================================================
// Capabilities
// ============================================================================

/// Body of `POST /v1/capabilities` and `PUT /v1/capabilities/{id}`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CapabilityPayload {
    /// Chat capability
    Chat(ChatCapabilityPayload),
    /// Completion capability
    Completion(CompletionCapabilityPayload),
}

/// Fields of a chat capability request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatCapabilityPayload {
    /// Display name
    pub name: String,
    /// Visibility
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_public: Option<bool>,
    /// Model deployment to use
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_id: Option<String>,
    /// Owning project
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    /// System prompt
    pub system_prompt: String,
    /// Behavioural configuration; omitted when nothing is configured
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<CapabilityConfig>,
}

/// Fields of a completion capability request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionCapabilityPayload {
    /// Display name
    pub name: String,
    /// Visibility
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_public: Option<bool>,
    /// Semantic identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub semantic_id: Option<String>,
    /// Model deployment to use
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_id: Option<String>,
    /// Owning project
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    /// System prompt
    pub system_prompt: String,
    /// Completion prompt, may reference variables
    pub completion_prompt: String,
    /// `text` or `schema`
    pub output_type: String,
    /// Variable names
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variables: Option<Vec<String>>,
    /// Output schema, only for `schema` output
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_def: Option<Map<String, Value>>,
    /// Behavioural configuration; omitted when nothing is configured
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<CapabilityConfig>,
}

/// Capability as returned by the API.
///
/// Create and update responses carry the variant fields at the top level,
/// reads nest them under `configuration`, `input` and `output`. Both shapes
/// decode here and are reconciled by the conversion into [`Capability`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CapabilityResponse {
    /// Capability id
    pub id: String,
    /// Display name
    pub name: String,
    /// Discriminator
    #[serde(rename = "type")]
    pub kind: String,
    /// Semantic identifier
    pub semantic_id: Option<String>,
    /// Visibility
    pub is_public: Option<bool>,
    /// Model deployment
    pub model_id: Option<String>,
    /// Owning project
    pub project_id: Option<String>,
    /// Behavioural configuration
    pub config: Option<CapabilityConfig>,
    /// Owner
    pub owner: String,
    /// Creator
    pub created_by: String,
    /// Last modifier
    pub updated_by: String,
    /// Creation time
    pub created_at: String,
    /// Last modification time
    pub updated_at: String,
    /// Archive time
    pub archived_at: Option<String>,

    /// Flat variant fields
    pub system_prompt: Option<String>,
    /// Flat variant fields
    pub completion_prompt: Option<String>,
    /// Flat variant fields
    pub output_type: Option<String>,
    /// Flat variant fields
    pub schema_def: Option<Value>,
    /// Flat variant fields
    pub variables: Option<Value>,

    /// Nested prompts
    pub configuration: Option<Map<String, Value>>,
    /// Nested input description
    pub input: Option<Map<String, Value>>,
    /// Nested output description
    pub output: Option<Map<String, Value>>,
}

/// Variant-specific part of a capability
#[derive(Debug, Clone, PartialEq)]
pub enum CapabilityKind {
    /// Chat capability
    Chat {
        /// System prompt
        system_prompt: Option<String>,
    },
    /// Completion capability
    Completion {
        /// System prompt
        system_prompt: Option<String>,
        /// Completion prompt
        completion_prompt: Option<String>,
        /// `text` or `schema`
        output_type: Option<String>,
        /// Output schema
        schema_def: Option<Map<String, Value>>,
        /// Variable names
        variables: Option<BTreeSet<String>>,
    },
    /// A type this provider does not manage
    Other(String),
}

impl CapabilityKind {
    /// Wire discriminator
    pub fn type_name(&self) -> &str {
        match self {
            Self::Chat { .. } => "chat",
            Self::Completion { .. } => "completion",
            Self::Other(name) => name,
        }
    }
}

/// Capability with its variant resolved
#[derive(Debug, Clone, PartialEq)]
pub struct Capability {
    /// Capability id
    pub id: String,
    /// Display name
    pub name: String,
    /// Semantic identifier
    pub semantic_id: Option<String>,
    /// Visibility
    pub is_public: bool,
    /// Model deployment
    pub model_id: Option<String>,
    /// Owning project
    pub project_id: Option<String>,
    /// Behavioural configuration
    pub config: Option<CapabilityConfig>,
    /// Owner
    pub owner: String,
    /// Creator
    pub created_by: String,
    /// Last modifier
    pub updated_by: String,
    /// Creation time
    pub created_at: String,
    /// Last modification time
    pub updated_at: String,
    /// Variant fields
    pub kind: CapabilityKind,
}

impl From<CapabilityResponse> for Capability {
    fn from(raw: CapabilityResponse) -> Self {
        let nested_str = |block: &Option<Map<String, Value>>, key: &str| {
            block
                .as_ref()
                .and_then(|m| m.get(key))
                .and_then(Value::as_str)
                .map(str::to_string)
        };

        let system_prompt = raw
            .system_prompt
            .clone()
            .or_else(|| nested_str(&raw.configuration, "system_prompt"));

        let kind = match raw.kind.as_str() {
            "chat" => CapabilityKind::Chat { system_prompt },
            "completion" => {
                let completion_prompt = raw
                    .completion_prompt
                    .clone()
                    .or_else(|| nested_str(&raw.configuration, "completion_prompt"));
                let output_type = raw
                    .output_type
                    .clone()
                    .or_else(|| nested_str(&raw.output, "type"));

                // schema_def only means something for schema output
                let schema_def = if output_type.as_deref() == Some("schema") {
                    let value = raw
                        .schema_def
                        .clone()
                        .or_else(|| raw.output.as_ref().and_then(|o| o.get("result").cloned()));
                    match value {
                        Some(Value::Object(map)) if !map.is_empty() => Some(map),
                        Some(Value::Object(_) | Value::Null) | None => None,
                        Some(other) => {
                            warn!(
                                capability_id = %raw.id,
                                found = %json_kind(&other),
                                "Expected schema definition to be an object, treating as null"
                            );
                            None
                        }
                    }
                } else {
                    None
                };

                let variables = raw
                    .variables
                    .clone()
                    .or_else(|| raw.input.as_ref().and_then(|i| i.get("variables").cloned()))
                    .and_then(|v| variable_names(&raw.id, v));

                CapabilityKind::Completion {
                    system_prompt,
                    completion_prompt,
                    output_type,
                    schema_def,
                    variables,
                }
            }
            other => CapabilityKind::Other(other.to_string()),
        };

        Self {
            id: raw.id,
            name: raw.name,
            semantic_id: raw.semantic_id,
            is_public: raw.is_public.unwrap_or(false),
            model_id: raw.model_id,
            project_id: raw.project_id,
            config: raw.config,
            owner: raw.owner,
            created_by: raw.created_by,
            updated_by: raw.updated_by,
            created_at: raw.created_at,
            updated_at: raw.updated_at,
            kind,
        }
    }
}

/// Variable names from either a list of strings or a map keyed by name.
/// Empty collections become `None`.
fn variable_names(capability_id: &str, value: Value) -> Option<BTreeSet<String>> {
    let names: BTreeSet<String> = match value {
        Value::Null => return None,
        Value::Array(items) => {
            let mut names = BTreeSet::new();
            for (index, item) in items.into_iter().enumerate() {
                match item {
                    Value::String(s) => {
                        names.insert(s);
                    }
                    other => {
                        warn!(
                            capability_id,
                            index = %index,
                            found = %json_kind(&other),
                            "Variable is not a string, treating variables as null"
                        );
                        return None;
                    }
                }
            }
            names
        }
        Value::Object(map) => map.into_iter().map(|(k, _)| k).collect(),
        other => {
            warn!(
                capability_id,
                found = %json_kind(&other),
                "Expected variables to be a list or map, treating as null"
            );
            return None;
        }
    };

    if names.is_empty() { None } else { Some(names) }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}

// ============================================================================
// Model deployments
// ============================================================================

/// Model deployment as returned by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDeployment {
    /// Deployment id
    pub id: String,
    /// Display name
    pub name: String,
    /// Free-text description
    #[serde(default)]
    pub description: Option<String>,
    /// Task kinds served (`chat`, `completion`, `embedding`)
    #[serde(default)]
    pub supported_tasks: Vec<String>,
    /// Provider-specific settings
    #[serde(default, deserialize_with = "string_map")]
    pub configuration: BTreeMap<String, String>,
    /// Whether the deployment accepts traffic
    #[serde(default)]
    pub is_active: Option<bool>,
    /// Model provider backing this deployment
    pub provider_id: String,
    /// Creation time
    #[serde(default)]
    pub created_at: String,
    /// Last modification time
    #[serde(default)]
    pub updated_at: Option<String>,
    /// Creator
    #[serde(default)]
    pub created_by: String,
    /// Last modifier
    #[serde(default)]
    pub updated_by: Option<String>,
}

/// Body of `POST /v1/model-deployments` and `PUT /v1/model-deployments/{id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDeploymentPayload {
    /// Display name
    pub name: String,
    /// Free-text description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Task kinds served
    pub supported_tasks: Vec<String>,
    /// Provider-specific settings
    pub configuration: BTreeMap<String, String>,
    /// Whether the deployment accepts traffic
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    /// Model provider backing this deployment
    pub provider_id: String,
}

// ============================================================================
// Model providers
// ============================================================================

/// Model provider as returned by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelProvider {
    /// Provider id
    pub id: String,
    /// Display name
    pub name: String,
    /// Provider kind (e.g. `azure_openai`)
    pub provider_type: String,
    /// Connection settings; secrets may come back truncated
    #[serde(default, deserialize_with = "string_map")]
    pub configuration: BTreeMap<String, String>,
    /// Creation time
    #[serde(default)]
    pub created_at: String,
    /// Creator
    #[serde(default)]
    pub created_by: String,
    /// Last modification time
    #[serde(default)]
    pub updated_at: Option<String>,
    /// Last modifier
    #[serde(default)]
    pub updated_by: Option<String>,
}

/// Body of `POST /v1/model-providers`
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelProviderCreate {
    /// Display name
    pub name: String,
    /// Provider kind
    pub provider_type: String,
    /// Connection settings
    pub configuration: BTreeMap<String, String>,
}

/// Body of `PUT /v1/model-providers/{id}`
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelProviderUpdate {
    /// Provider id, repeated in the body
    pub id: String,
    /// Display name
    pub name: String,
    /// Provider kind
    pub provider_type: String,
    /// Connection settings
    pub configuration: BTreeMap<String, String>,
}

// ============================================================================
// Capability types
// ============================================================================

/// Capability type with its default model deployment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityType {
    /// Type id (`chat`, `completion`, ...)
    pub id: String,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Deployment used when a capability names no model
    #[serde(default)]
    pub default_model_deployment_id: Option<String>,
}

/// Body of `GET /v1/capability-types`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CapabilityTypeList {
    /// Capability types
    #[serde(rename = "_embedded", default)]
    pub embedded: Vec<CapabilityType>,
}

/// Body of `PUT /v1/capability-types/{type}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefaultModelDeploymentUpdate {
    /// Deployment to use by default
    pub default_model_deployment_id: String,
}

/// Accept non-string scalars in a string map by rendering them as text
fn string_map<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<BTreeMap<String, Value>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|(k, v)| {
            let text = match v {
                Value::String(s) => s,
                Value::Null => String::new(),
                other => other.to_string(),
            };
            (k, text)
        })
        .collect())
}
