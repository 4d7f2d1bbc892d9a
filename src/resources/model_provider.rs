//! `corax_model_provider`
//!
//! The API may return the provider's `api_key` setting truncated, so the
//! full value from the plan (create, update) or the prior state (read) wins
//! over what comes back.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{found, name_attribute};
use crate::client::{CoraxClient, ModelProvider, ModelProviderCreate, ModelProviderUpdate};
use crate::harness::{Attribute, AttributeKind, Diagnostics, Outcome, Resource, ResourceSchema};
use crate::Result;

/// Configuration entry holding the provider's secret
const API_KEY_SETTING: &str = "api_key";

/// State of a model provider
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelProviderModel {
    /// Provider id
    pub id: Option<String>,
    /// Display name
    pub name: String,
    /// Provider kind, e.g. `azure_openai`
    pub provider_type: String,
    /// Connection settings, secrets included
    pub configuration: BTreeMap<String, String>,
}

// Configuration carries credentials.
impl std::fmt::Debug for ModelProviderModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelProviderModel")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("provider_type", &self.provider_type)
            .field("configuration", &self.configuration.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ModelProviderModel {
    fn apply(&mut self, provider: ModelProvider) {
        self.id = Some(provider.id);
        self.name = provider.name;
        self.provider_type = provider.provider_type;
        self.configuration = provider.configuration;
    }

    /// Put back a full `api_key` setting the API may have truncated
    fn restore_api_key(&mut self, known: &BTreeMap<String, String>) {
        if let Some(key) = known.get(API_KEY_SETTING).filter(|k| !k.is_empty()) {
            self.configuration
                .insert(API_KEY_SETTING.to_string(), key.clone());
        }
    }
}

/// Manages model providers
pub struct ModelProviderResource {
    client: Arc<CoraxClient>,
}

impl ModelProviderResource {
    /// Create the handler
    pub fn new(client: Arc<CoraxClient>) -> Self {
        Self { client }
    }

    /// Attribute schema; available without a client
    pub fn attribute_schema() -> ResourceSchema {
        ResourceSchema::new("corax_model_provider", "Manages a Corax model provider.")
            .attribute(Attribute::computed("id", AttributeKind::String).describe("Provider id."))
            .attribute(name_attribute("Name of the provider."))
            .attribute(
                Attribute::required("provider_type", AttributeKind::String)
                    .describe("Provider kind, e.g. azure_openai."),
            )
            .attribute(
                Attribute::required("configuration", AttributeKind::StringMap)
                    .sensitive()
                    .describe("Connection settings such as api_key and endpoint."),
            )
    }
}

#[async_trait]
impl Resource for ModelProviderResource {
    type Model = ModelProviderModel;

    fn type_name(&self) -> &'static str {
        "corax_model_provider"
    }

    fn schema(&self) -> ResourceSchema {
        Self::attribute_schema()
    }

    async fn create(&self, mut plan: ModelProviderModel) -> Result<Outcome<ModelProviderModel>> {
        debug!(name = %plan.name, provider_type = %plan.provider_type, "Creating model provider");
        let planned = plan.configuration.clone();

        let payload = ModelProviderCreate {
            name: plan.name.clone(),
            provider_type: plan.provider_type.clone(),
            configuration: planned.clone(),
        };
        let created = self.client.create_model_provider(&payload).await.map_err(|e| {
            e.context(format!(
                "Unable to create model provider '{}' (provider_type: {})",
                payload.name, payload.provider_type
            ))
        })?;

        plan.apply(created);
        plan.restore_api_key(&planned);
        info!(
            name = %plan.name,
            provider_id = plan.id.as_deref().unwrap_or_default(),
            "Model provider created successfully"
        );
        Ok(Outcome::present(plan))
    }

    async fn read(&self, mut state: ModelProviderModel) -> Result<Outcome<ModelProviderModel>> {
        let id = state.id.clone().unwrap_or_default();
        debug!(provider_id = %id, "Reading model provider");
        let prior = state.configuration.clone();

        match found(self.client.get_model_provider(&id).await)
            .map_err(|e| e.context(format!("Unable to read model provider '{id}'")))?
        {
            Some(provider) => {
                state.apply(provider);
                state.restore_api_key(&prior);
                Ok(Outcome::present(state))
            }
            None => {
                warn!(provider_id = %id, "Model provider not found, removing from state");
                Ok(Outcome::removed())
            }
        }
    }

    async fn update(
        &self,
        mut plan: ModelProviderModel,
        prior: ModelProviderModel,
    ) -> Result<Outcome<ModelProviderModel>> {
        let id = prior.id.clone().unwrap_or_default();
        debug!(provider_id = %id, "Updating model provider");

        let payload = ModelProviderUpdate {
            id: id.clone(),
            name: plan.name.clone(),
            provider_type: plan.provider_type.clone(),
            configuration: plan.configuration.clone(),
        };
        let updated = self
            .client
            .update_model_provider(&id, &payload)
            .await
            .map_err(|e| e.context(format!("Unable to update model provider '{id}'")))?;

        // The plan is authoritative for everything but the id.
        plan.id = Some(updated.id).filter(|i| !i.is_empty()).or(prior.id);
        info!(provider_id = %id, "Model provider updated successfully");
        Ok(Outcome::present(plan))
    }

    async fn delete(&self, state: ModelProviderModel) -> Result<Diagnostics> {
        let id = state.id.unwrap_or_default();
        debug!(provider_id = %id, "Deleting model provider");

        match found(self.client.delete_model_provider(&id).await)
            .map_err(|e| e.context(format!("Unable to delete model provider '{id}'")))?
        {
            Some(()) => info!(provider_id = %id, "Model provider deleted successfully"),
            None => warn!(provider_id = %id, "Model provider not found, already deleted"),
        }
        Ok(Diagnostics::new())
    }
}
