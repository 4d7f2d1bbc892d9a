//! `corax_chat_capability`

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{capability_audit_attributes, capability_config_attribute, config_payload, found, name_attribute};
use crate::capability::{self, CapabilityConfigModel};
use crate::client::{Capability, CapabilityKind, CapabilityPayload, ChatCapabilityPayload, CoraxClient};
use crate::harness::{Attribute, AttributeKind, Diagnostics, Outcome, Resource, ResourceSchema};
use crate::Result;

const CAPABILITY_TYPE: &str = "chat";

/// State of a chat capability
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatCapabilityModel {
    /// Capability id
    pub id: Option<String>,
    /// Display name
    pub name: String,
    /// Visibility; `false` when unset
    pub is_public: Option<bool>,
    /// Model deployment
    pub model_id: Option<String>,
    /// Owning project
    pub project_id: Option<String>,
    /// System prompt
    pub system_prompt: Option<String>,
    /// Behavioural configuration
    pub config: Option<CapabilityConfigModel>,
    /// Owner
    pub owner: Option<String>,
    /// Always `chat`
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

impl ChatCapabilityModel {
    fn payload(&self) -> Result<CapabilityPayload> {
        Ok(CapabilityPayload::Chat(ChatCapabilityPayload {
            name: self.name.clone(),
            is_public: Some(self.is_public.unwrap_or(false)),
            model_id: self.model_id.clone(),
            project_id: self.project_id.clone(),
            system_prompt: self.system_prompt.clone().unwrap_or_default(),
            config: config_payload(self.config.as_ref())?,
        }))
    }

    /// Overwrite everything the API reports; a missing system prompt keeps
    /// the current value
    fn apply(&mut self, capability: Capability) {
        self.id = Some(capability.id);
        self.name = capability.name;
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

        match capability.kind {
            CapabilityKind::Chat {
                system_prompt: Some(prompt),
            } => self.system_prompt = Some(prompt),
            _ => warn!(
                capability_id = self.id.as_deref().unwrap_or_default(),
                "System prompt not found in API response for chat capability"
            ),
        }
    }
}

/// Manages chat capabilities
pub struct ChatCapabilityResource {
    client: Arc<CoraxClient>,
}

impl ChatCapabilityResource {
    /// Create the handler
    pub fn new(client: Arc<CoraxClient>) -> Self {
        Self { client }
    }

    /// Attribute schema; available without a client
    pub fn attribute_schema() -> ResourceSchema {
        let mut schema = ResourceSchema::new(
            "corax_chat_capability",
            "Manages a Corax chat capability.",
        )
        .attribute(Attribute::computed("id", AttributeKind::String).describe("Capability id."))
        .attribute(name_attribute("Name of the capability."))
        .attribute(
            Attribute::optional_computed("is_public", AttributeKind::Bool)
                .with_default(false)
                .describe("Whether the capability is public. Defaults to false."),
        )
        .attribute(Attribute::optional("model_id", AttributeKind::String).describe("Model deployment to use."))
        .attribute(Attribute::optional("project_id", AttributeKind::String).describe("Owning project."))
        .attribute(
            Attribute::required("system_prompt", AttributeKind::String)
                .describe("System prompt for the chat."),
        )
        .attribute(capability_config_attribute());
        for attribute in capability_audit_attributes() {
            schema = schema.attribute(attribute);
        }
        schema
    }
}

#[async_trait]
impl Resource for ChatCapabilityResource {
    type Model = ChatCapabilityModel;

    fn type_name(&self) -> &'static str {
        "corax_chat_capability"
    }

    fn schema(&self) -> ResourceSchema {
        Self::attribute_schema()
    }

    async fn create(&self, mut plan: ChatCapabilityModel) -> Result<Outcome<ChatCapabilityModel>> {
        debug!(name = %plan.name, "Creating chat capability");
        let payload = plan.payload()?;

        let created = self
            .client
            .create_capability(&payload)
            .await
            .map_err(|e| e.context("Unable to create chat capability"))?;

        plan.apply(created);
        info!(
            name = %plan.name,
            capability_id = plan.id.as_deref().unwrap_or_default(),
            "Chat capability created successfully"
        );
        Ok(Outcome::present(plan))
    }

    async fn read(&self, mut state: ChatCapabilityModel) -> Result<Outcome<ChatCapabilityModel>> {
        let id = state.id.clone().unwrap_or_default();
        debug!(capability_id = %id, "Reading chat capability");

        let Some(capability) = found(self.client.get_capability(&id).await)
            .map_err(|e| e.context(format!("Unable to read chat capability {id}")))?
        else {
            warn!(capability_id = %id, "Chat capability not found, removing from state");
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

        state.apply(capability);
        Ok(Outcome::present(state))
    }

    async fn update(
        &self,
        mut plan: ChatCapabilityModel,
        prior: ChatCapabilityModel,
    ) -> Result<Outcome<ChatCapabilityModel>> {
        let id = prior.id.clone().unwrap_or_default();
        debug!(capability_id = %id, "Updating chat capability");
        let payload = plan.payload()?;

        let updated = self
            .client
            .update_capability(&id, &payload)
            .await
            .map_err(|e| e.context(format!("Unable to update chat capability {id}")))?;

        plan.apply(updated);
        // Audit fields stay as last read; the next read refreshes them.
        plan.created_at = prior.created_at;
        plan.created_by = prior.created_by;
        plan.updated_at = prior.updated_at;
        plan.updated_by = prior.updated_by;

        info!(capability_id = %id, "Chat capability updated successfully");
        Ok(Outcome::present(plan))
    }

    async fn delete(&self, state: ChatCapabilityModel) -> Result<Diagnostics> {
        let id = state.id.unwrap_or_default();
        debug!(capability_id = %id, "Deleting chat capability");

        match found(self.client.delete_capability(&id).await)
            .map_err(|e| e.context(format!("Unable to delete chat capability {id}")))?
        {
            Some(()) => info!(capability_id = %id, "Chat capability deleted successfully"),
            None => warn!(capability_id = %id, "Chat capability not found, already deleted"),
        }
        Ok(Diagnostics::new())
    }
}
