//! `corax_model_deployment`

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{found, name_attribute};
use crate::client::{CoraxClient, ModelDeployment, ModelDeploymentPayload};
use crate::harness::{Attribute, AttributeKind, Diagnostics, Outcome, Resource, ResourceSchema};
use crate::Result;

/// State of a model deployment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelDeploymentModel {
    /// Deployment id
    pub id: Option<String>,
    /// Display name
    pub name: String,
    /// Free-text description
    pub description: Option<String>,
    /// Task kinds served
    pub supported_tasks: Vec<String>,
    /// Provider-specific settings
    pub configuration: BTreeMap<String, String>,
    /// Whether the deployment accepts traffic; `true` when unset
    pub is_active: Option<bool>,
    /// Backing model provider; fixed after creation
    pub provider_id: String,
}

impl ModelDeploymentModel {
    fn payload(&self, provider_id: &str) -> ModelDeploymentPayload {
        ModelDeploymentPayload {
            name: self.name.clone(),
            description: self.description.clone(),
            supported_tasks: self.supported_tasks.clone(),
            configuration: self.configuration.clone(),
            is_active: self.is_active,
            provider_id: provider_id.to_string(),
        }
    }

    fn apply(&mut self, deployment: ModelDeployment) {
        self.id = Some(deployment.id);
        self.name = deployment.name;
        self.description = deployment.description;
        self.supported_tasks = deployment.supported_tasks;
        self.configuration = deployment.configuration;
        self.is_active = Some(deployment.is_active.unwrap_or(true));
        self.provider_id = deployment.provider_id;
    }

    /// Whether any attribute the API accepts on update differs
    fn differs_from(&self, prior: &Self) -> bool {
        self.name != prior.name
            || self.description != prior.description
            || self.is_active != prior.is_active
            || self.supported_tasks != prior.supported_tasks
            || self.configuration != prior.configuration
    }
}

/// Manages model deployments
pub struct ModelDeploymentResource {
    client: Arc<CoraxClient>,
}

impl ModelDeploymentResource {
    /// Create the handler
    pub fn new(client: Arc<CoraxClient>) -> Self {
        Self { client }
    }

    /// Attribute schema; available without a client
    pub fn attribute_schema() -> ResourceSchema {
        ResourceSchema::new("corax_model_deployment", "Manages a Corax model deployment.")
            .attribute(Attribute::computed("id", AttributeKind::String).describe("Deployment id."))
            .attribute(name_attribute("Name of the deployment."))
            .attribute(Attribute::optional("description", AttributeKind::String).describe("Description."))
            .attribute(
                Attribute::required("supported_tasks", AttributeKind::StringList)
                    .describe("Task kinds served, e.g. chat, completion, embedding."),
            )
            .attribute(
                Attribute::required("configuration", AttributeKind::StringMap)
                    .describe("Provider-specific settings such as the model name."),
            )
            .attribute(
                Attribute::optional_computed("is_active", AttributeKind::Bool)
                    .with_default(true)
                    .describe("Whether the deployment accepts traffic. Defaults to true."),
            )
            .attribute(
                Attribute::required("provider_id", AttributeKind::String)
                    .describe("Model provider backing the deployment. Cannot be changed."),
            )
    }
}

#[async_trait]
impl Resource for ModelDeploymentResource {
    type Model = ModelDeploymentModel;

    fn type_name(&self) -> &'static str {
        "corax_model_deployment"
    }

    fn schema(&self) -> ResourceSchema {
        Self::attribute_schema()
    }

    async fn create(&self, mut plan: ModelDeploymentModel) -> Result<Outcome<ModelDeploymentModel>> {
        debug!(name = %plan.name, provider_id = %plan.provider_id, "Creating model deployment");

        let created = self
            .client
            .create_model_deployment(&plan.payload(&plan.provider_id))
            .await
            .map_err(|e| e.context("Unable to create model deployment"))?;

        plan.apply(created);
        info!(
            name = %plan.name,
            deployment_id = plan.id.as_deref().unwrap_or_default(),
            "Model deployment created successfully"
        );
        Ok(Outcome::present(plan))
    }

    async fn read(&self, mut state: ModelDeploymentModel) -> Result<Outcome<ModelDeploymentModel>> {
        let id = state.id.clone().unwrap_or_default();
        debug!(deployment_id = %id, "Reading model deployment");

        match found(self.client.get_model_deployment(&id).await)
            .map_err(|e| e.context(format!("Unable to read model deployment {id}")))?
        {
            Some(deployment) => {
                state.apply(deployment);
                Ok(Outcome::present(state))
            }
            None => {
                warn!(deployment_id = %id, "Model deployment not found, removing from state");
                Ok(Outcome::removed())
            }
        }
    }

    async fn update(
        &self,
        mut plan: ModelDeploymentModel,
        prior: ModelDeploymentModel,
    ) -> Result<Outcome<ModelDeploymentModel>> {
        let id = prior.id.clone().unwrap_or_default();
        debug!(deployment_id = %id, "Updating model deployment");

        let mut diagnostics = Diagnostics::new();
        if plan.provider_id != prior.provider_id {
            diagnostics.add_warning(
                "ProviderID Change",
                "ProviderID cannot be updated for a model deployment. This change will be ignored.",
            );
        }

        if !plan.differs_from(&prior) {
            debug!(deployment_id = %id, "No attribute changes detected for model deployment update");
            plan.id = prior.id;
            plan.provider_id = prior.provider_id;
            return Ok(Outcome {
                state: Some(plan),
                diagnostics,
            });
        }

        let updated = self
            .client
            .update_model_deployment(&id, &plan.payload(&prior.provider_id))
            .await
            .map_err(|e| e.context(format!("Unable to update model deployment {id}")))?;

        plan.apply(updated);
        info!(deployment_id = %id, "Model deployment updated successfully");
        Ok(Outcome {
            state: Some(plan),
            diagnostics,
        })
    }

    async fn delete(&self, state: ModelDeploymentModel) -> Result<Diagnostics> {
        let id = state.id.unwrap_or_default();
        debug!(deployment_id = %id, "Deleting model deployment");

        match found(self.client.delete_model_deployment(&id).await)
            .map_err(|e| e.context(format!("Unable to delete model deployment {id}")))?
        {
            Some(()) => info!(deployment_id = %id, "Model deployment deleted successfully"),
            None => warn!(deployment_id = %id, "Model deployment not found, already deleted"),
        }
        Ok(Diagnostics::new())
    }
}
