//! `corax_completion_capability`
//!
//! Adds prompt templating and an output contract to the chat shape. The
//! output is either free text or JSON matching `schema_def`, and the pairing
//! is checked before any request:
//!
//! | `output_type` | `schema_def` |
//! |---------------|--------------|
//! | `text`        | must be unset |
//! | `schema`      | required, non-empty object |
//!
//! `schema_def` is stored as canonical JSON (keys sorted at every level), so
//! a JSON string and an equivalent object produce the same state.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use corax_core::{DynamicValue, schema_def, value::entries_to_json};

use super::{capability_audit_attributes, capability_config_attribute, config_payload, found, name_attribute};
use crate::capability::{self, CapabilityConfigModel};
use crate::client::{Capability, CapabilityKind, CapabilityPayload, CompletionCapabilityPayload, CoraxClient};
use crate::harness::{Attribute, AttributeKind, Diagnostics, Outcome, Resource, ResourceSchema, Validator};
use crate::{Error, Result};

const CAPABILITY_TYPE: &str = "completion";
const OUTPUT_TEXT: &str = "text";
const OUTPUT_SCHEMA: &str = "schema";

/// State of a completion capability
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionCapabilityModel {
    /// Capability id
    pub id: Option<String>,
    /// Display name
    pub name: String,
    /// Semantic identifier
    pub semantic_id: Option<String>,
    /// Visibility; `false` when unset
    pub is_public: Option<bool>,
    /// Model deployment
    pub model_id: Option<String>,
    /// Owning project
    pub project_id: Option<String>,
    /// System prompt
    pub system_prompt: Option<String>,
    /// Completion prompt, may reference variables
    pub completion_prompt: Option<String>,
    /// Variable names
    pub variables: Option<BTreeSet<String>>,
    /// `text` or `schema`
    pub output_type: Option<String>,
    /// Output schema; a JSON string or an object in plans, canonical JSON in state
    pub schema_def: Option<DynamicValue>,
    /// Behavioural configuration
    pub config: Option<CapabilityConfigModel>,
    /// Owner
    pub owner: Option<String>,
    /// Always `completion`
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Creation time
    pub created_at: Option<String>,
    /// Last modification time
    pub updated_at: Option<String>,
    /// Creator
    pub created_by: Option<String>,
    /// Last modifier
    pub updated_by: Option<String>,
}

impl CompletionCapabilityModel {
    /// Check the output contract and build the request body
    fn payload(&self) -> Result<CapabilityPayload> {
        let schema_def = self.schema_def_payload()?;
        let variables = self
            .variables
            .as_ref()
            .filter(|v| !v.is_empty())
            .map(|v| v.iter().cloned().collect());

        Ok(CapabilityPayload::Completion(CompletionCapabilityPayload {
            name: self.name.clone(),
            is_public: Some(self.is_public.unwrap_or(false)),
            semantic_id: self.semantic_id.clone(),
            model_id: self.model_id.clone(),
            project_id: self.project_id.clone(),
            system_prompt: self.system_prompt.clone().unwrap_or_default(),
            completion_prompt: self.completion_prompt.clone().unwrap_or_default(),
            output_type: self.output_type.clone().unwrap_or_default(),
            variables,
            schema_def,
            config: config_payload(self.config.as_ref())?,
        }))
    }

    fn schema_def_payload(&self) -> Result<Option<Map<String, Value>>> {
        let schema_def = self.schema_def.as_ref().filter(|v| !v.is_null());

        match self.output_type.as_deref().unwrap_or_default() {
            OUTPUT_SCHEMA => {
                let Some(schema_def) = schema_def else {
                    return Err(Error::validation(
                        "schema_def is required when output_type is 'schema'",
                    ));
                };
                match schema_def::parse(Some(schema_def))? {
                    Some(entries) if !entries.is_empty() => {
                        Ok(Some(entries_to_json(&entries, "schema_def")?))
                    }
                    _ => Err(Error::validation(
                        "schema_def was provided but conversion resulted in nil or empty map",
                    )),
                }
            }
            OUTPUT_TEXT if schema_def.is_some() => Err(Error::validation(
                "schema_def must not be set when output_type is 'text'",
            )),
            OUTPUT_TEXT => Ok(None),
            other => Err(Error::validation(format!(
                "unsupported output_type '{other}', must be either 'text' or 'schema'"
            ))),
        }
    }

    /// Overwrite everything the API reports.
    ///
    /// Prompts and output type the API leaves out keep their current
    /// values. `schema_def` falls back to the canonical form of the current
    /// value when the response omits it for schema output.
    fn apply(&mut self, capability: Capability) -> Result<()> {
        self.id = Some(capability.id);
        self.name = capability.name;
        self.semantic_id = capability.semantic_id.or_else(|| self.semantic_id.take());
        self.is_public = Some(capability.is_public);
        self.model_id = capability.model_id;
        self.project_id = capability.project_id;
        self.config = capability::from_wire(capability.config.as_ref());
        self.owner = Some(capability.owner);
        self.kind = Some(capability.kind.type_name().to_string());
        self.created_at = Some(capability.created_at);
        self.updated_at = Some(capability.updated_at);
        self.created_by = Some(capability.created_by);
        self.updated_by = Some(capability.updated_by);

        let CapabilityKind::Completion {
            system_prompt,
            completion_prompt,
            output_type,
            schema_def,
            variables,
        } = capability.kind
        else {
            return Ok(());
        };

        if system_prompt.is_none() || completion_prompt.is_none() {
            debug!(
                capability_id = self.id.as_deref().unwrap_or_default(),
                "Prompts missing from API response, keeping current values"
            );
        }
        self.system_prompt = system_prompt.or_else(|| self.system_prompt.take());
        self.completion_prompt = completion_prompt.or_else(|| self.completion_prompt.take());
        self.output_type = output_type.or_else(|| self.output_type.take());
        self.variables = variables;

        self.schema_def = if self.output_type.as_deref() == Some(OUTPUT_SCHEMA) {
            let source = match schema_def {
                Some(map) => Some(DynamicValue::from(map)),
                None => self.schema_def.take(),
            };
            schema_def::normalize(source.as_ref())?.map(DynamicValue::String)
        } else {
            None
        };
        Ok(())
    }
}

/// Manages completion capabilities
pub struct CompletionCapabilityResource {
    client: Arc<CoraxClient>,
}

impl CompletionCapabilityResource {
    /// Create the handler
    pub fn new(client: Arc<CoraxClient>) -> Self {
        Self { client }
    }

    /// Attribute schema; available without a client
    pub fn attribute_schema() -> ResourceSchema {
        let mut schema = ResourceSchema::new(
            "corax_completion_capability",
            "Manages a Corax completion capability.",
        )
        .attribute(Attribute::computed("id", AttributeKind::String).describe("Capability id."))
        .attribute(name_attribute("Name of the capability."))
        .attribute(
            Attribute::optional_computed("semantic_id", AttributeKind::String)
                .describe("Semantic identifier of the capability."),
        )
        .attribute(
            Attribute::optional_computed("is_public", AttributeKind::Bool)
                .with_default(false)
                .describe("Whether the capability is public. Defaults to false."),
        )
        .attribute(Attribute::optional("model_id", AttributeKind::String).describe("Model deployment to use."))
        .attribute(Attribute::optional("project_id", AttributeKind::String).describe("Owning project."))
        .attribute(Attribute::required("system_prompt", AttributeKind::String).describe("System prompt."))
        .attribute(
            Attribute::required("completion_prompt", AttributeKind::String)
                .describe("Completion prompt; may reference variables."),
        )
        .attribute(
            Attribute::optional("variables", AttributeKind::StringSet)
                .describe("Names of the variables used in the completion prompt."),
        )
        .attribute(
            Attribute::required("output_type", AttributeKind::String)
                .validate(Validator::OneOf(&[OUTPUT_TEXT, OUTPUT_SCHEMA]))
                .describe("Either 'text' or 'schema'."),
        )
        .attribute(
            Attribute::optional("schema_def", AttributeKind::Dynamic).describe(
                "Output schema as a JSON string or an object. Required for 'schema' output, not allowed for 'text'.",
            ),
        )
        .attribute(capability_config_attribute());
        for attribute in capability_audit_attributes() {
            schema = schema.attribute(attribute);
        }
        schema
    }
}

#[async_trait]
impl Resource for CompletionCapabilityResource {
    type Model = CompletionCapabilityModel;

    fn type_name(&self) -> &'static str {
        "corax_completion_capability"
    }

    fn schema(&self) -> ResourceSchema {
        Self::attribute_schema()
    }

    async fn create(&self, mut plan: CompletionCapabilityModel) -> Result<Outcome<CompletionCapabilityModel>> {
        debug!(name = %plan.name, "Creating completion capability");
        let payload = plan.payload()?;

        let created = self
            .client
            .create_capability(&payload)
            .await
            .map_err(|e| e.context("Unable to create completion capability"))?;

        plan.apply(created)?;
        info!(
            name = %plan.name,
            capability_id = plan.id.as_deref().unwrap_or_default(),
            "Completion capability created successfully"
        );
        Ok(Outcome::present(plan))
    }

    async fn read(&self, mut state: CompletionCapabilityModel) -> Result<Outcome<CompletionCapabilityModel>> {
        let id = state.id.clone().unwrap_or_default();
        debug!(capability_id = %id, "Reading completion capability");

        let Some(capability) = found(self.client.get_capability(&id).await)
            .map_err(|e| e.context(format!("Unable to read completion capability {id}")))?
        else {
            warn!(capability_id = %id, "Completion capability not found, removing from state");
            return Ok(Outcome::removed());
        };

        let found_type = capability.kind.type_name();
        if found_type != CAPABILITY_TYPE {
            return Ok(Outcome::removed().with_error(
                "Resource Type Mismatch",
                format!(
                    "Expected capability type '{CAPABILITY_TYPE}' but found '{found_type}' for ID {id}. Removing from state."
                ),
            ));
        }

        state.apply(capability)?;
        Ok(Outcome::present(state))
    }

    async fn update(
        &self,
        mut plan: CompletionCapabilityModel,
        prior: CompletionCapabilityModel,
    ) -> Result<Outcome<CompletionCapabilityModel>> {
        let id = prior.id.clone().unwrap_or_default();
        debug!(capability_id = %id, "Updating completion capability");
        let payload = plan.payload()?;

        let updated = self
            .client
            .update_capability(&id, &payload)
            .await
            .map_err(|e| e.context(format!("Unable to update completion capability {id}")))?;

        plan.apply(updated)?;
        // Audit fields stay as last read; the next read refreshes them.
        plan.created_at = prior.created_at;
        plan.created_by = prior.created_by;
        plan.updated_at = prior.updated_at;
        plan.updated_by = prior.updated_by;

        info!(capability_id = %id, "Completion capability updated successfully");
        Ok(Outcome::present(plan))
    }

    async fn delete(&self, state: CompletionCapabilityModel) -> Result<Diagnostics> {
        let id = state.id.unwrap_or_default();
        debug!(capability_id = %id, "Deleting completion capability");

        match found(self.client.delete_capability(&id).await)
            .map_err(|e| e.context(format!("Unable to delete completion capability {id}")))?
        {
            Some(()) => info!(capability_id = %id, "Completion capability deleted successfully"),
            None => warn!(capability_id = %id, "Completion capability not found, already deleted"),
        }
        Ok(Diagnostics::new())
    }
}
