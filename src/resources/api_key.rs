//! `corax_api_key`
//!
//! The secret is only returned by the create call, so state is the only
//! place it survives. Keys cannot be changed in place.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{found, name_attribute};
use crate::client::{ApiKey, ApiKeyCreate, CoraxClient};
use crate::harness::{Attribute, AttributeKind, Diagnostics, Outcome, Resource, ResourceSchema, Validator};
use crate::{Error, Result};

/// State of an API key
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiKeyModel {
    /// Key id
    pub id: Option<String>,
    /// Display name
    pub name: String,
    /// Expiry time (RFC 3339)
    pub expires_at: Option<String>,
    /// Secret, only known from the create response
    pub key: Option<String>,
    /// Public prefix
    pub prefix: Option<String>,
    /// Whether the key is usable
    pub is_active: Option<bool>,
    /// Last use time
    pub last_used_at: Option<String>,
    /// Number of calls made with the key
    pub usage_count: Option<i64>,
    /// Creation time
    pub created_at: Option<String>,
    /// Creator
    pub created_by: Option<String>,
    /// Last modification time
    pub updated_at: Option<String>,
}

impl std::fmt::Debug for ApiKeyModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeyModel")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("expires_at", &self.expires_at)
            .field("key", &self.key.as_ref().map(|_| "<redacted>"))
            .field("prefix", &self.prefix)
            .field("is_active", &self.is_active)
            .finish_non_exhaustive()
    }
}

impl ApiKeyModel {
    /// Overwrite everything but the secret
    fn apply(&mut self, api_key: ApiKey) {
        self.id = Some(api_key.id);
        self.name = api_key.name;
        self.expires_at = api_key.expires_at;
        self.prefix = Some(api_key.prefix);
        self.is_active = Some(api_key.is_active);
        self.last_used_at = api_key.last_used_at.filter(|t| !t.is_empty());
        self.usage_count = Some(api_key.usage_count);
        self.created_at = Some(api_key.created_at);
        self.created_by = Some(api_key.created_by);
        self.updated_at = api_key.updated_at.filter(|t| !t.is_empty());
    }
}

/// Manages API keys
pub struct ApiKeyResource {
    client: Arc<CoraxClient>,
}

impl ApiKeyResource {
    /// Create the handler
    pub fn new(client: Arc<CoraxClient>) -> Self {
        Self { client }
    }

    /// Attribute schema; available without a client
    pub fn attribute_schema() -> ResourceSchema {
        ResourceSchema::new("corax_api_key", "Manages a Corax API key.")
            .attribute(Attribute::computed("id", AttributeKind::String).describe("API key id."))
            .attribute(name_attribute("Name of the API key."))
            .attribute(
                Attribute::required("expires_at", AttributeKind::String)
                    .validate(Validator::Rfc3339)
                    .describe("Expiry time in RFC 3339 format."),
            )
            .attribute(
                Attribute::computed("key", AttributeKind::String)
                    .sensitive()
                    .describe("The secret. Only available after creation."),
            )
            .attribute(Attribute::computed("prefix", AttributeKind::String).describe("Public prefix of the key."))
            .attribute(Attribute::computed("is_active", AttributeKind::Bool).describe("Whether the key is usable."))
            .attribute(Attribute::computed("last_used_at", AttributeKind::String).describe("Last use time."))
            .attribute(
                Attribute::computed("usage_count", AttributeKind::Int)
                    .describe("Number of calls made with the key."),
            )
            .attribute(Attribute::computed("created_at", AttributeKind::String).describe("Creation time."))
            .attribute(Attribute::computed("created_by", AttributeKind::String).describe("Creator."))
            .attribute(Attribute::computed("updated_at", AttributeKind::String).describe("Last modification time."))
    }
}

#[async_trait]
impl Resource for ApiKeyResource {
    type Model = ApiKeyModel;

    fn type_name(&self) -> &'static str {
        "corax_api_key"
    }

    fn schema(&self) -> ResourceSchema {
        Self::attribute_schema()
    }

    async fn create(&self, mut plan: ApiKeyModel) -> Result<Outcome<ApiKeyModel>> {
        debug!(name = %plan.name, expires_at = plan.expires_at.as_deref().unwrap_or_default(), "Creating API key");

        let payload = ApiKeyCreate {
            name: plan.name.clone(),
            expires_at: plan.expires_at.clone().unwrap_or_default(),
        };
        let mut created = self
            .client
            .create_api_key(&payload)
            .await
            .map_err(|e| e.context("Unable to create API key"))?;

        plan.key = created.key.take();
        plan.apply(created);
        info!(api_key_id = plan.id.as_deref().unwrap_or_default(), "API key created successfully");
        Ok(Outcome::present(plan))
    }

    async fn read(&self, mut state: ApiKeyModel) -> Result<Outcome<ApiKeyModel>> {
        let id = state.id.clone().unwrap_or_default();
        debug!(api_key_id = %id, "Reading API key");

        match found(self.client.get_api_key(&id).await)
            .map_err(|e| e.context(format!("Unable to read API key {id}")))?
        {
            Some(api_key) => {
                // GET never returns the secret; keep the one from state.
                state.apply(api_key);
                Ok(Outcome::present(state))
            }
            None => {
                warn!(api_key_id = %id, "API key not found, removing from state");
                Ok(Outcome::removed())
            }
        }
    }

    async fn update(&self, _plan: ApiKeyModel, _prior: ApiKeyModel) -> Result<Outcome<ApiKeyModel>> {
        Err(Error::Unsupported(
            "Updating API Keys is not supported. Please create a new API Key and delete the old one if changes are needed."
                .to_string(),
        ))
    }

    async fn delete(&self, state: ApiKeyModel) -> Result<Diagnostics> {
        let id = state.id.unwrap_or_default();
        debug!(api_key_id = %id, "Deleting API key");

        match found(self.client.delete_api_key(&id).await)
            .map_err(|e| e.context(format!("Unable to delete API key {id}")))?
        {
            Some(()) => info!(api_key_id = %id, "API key deleted successfully"),
            None => warn!(api_key_id = %id, "API key already deleted, removing from state"),
        }
        Ok(Diagnostics::new())
    }
}
