//! `corax_project`

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{found, name_attribute};
use crate::client::{CoraxClient, Project, ProjectCreate, ProjectUpdate};
use crate::harness::{Attribute, AttributeKind, Diagnostics, Outcome, Resource, ResourceSchema};
use crate::Result;

/// State of a project
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectModel {
    /// Project id
    pub id: Option<String>,
    /// Display name
    pub name: String,
    /// Free-text description
    pub description: Option<String>,
    /// Visibility; `false` when unset
    pub is_public: Option<bool>,
    /// Creator
    pub created_by: Option<String>,
    /// Creation time
    pub created_at: Option<String>,
    /// Owner
    pub owner: Option<String>,
    /// Number of collections in the project
    pub collection_count: Option<i64>,
    /// Number of capabilities in the project
    pub capability_count: Option<i64>,
}

impl ProjectModel {
    fn apply(&mut self, project: Project) {
        self.id = Some(project.id);
        self.name = project.name;
        self.description = project.description;
        self.is_public = Some(project.is_public);
        self.created_by = Some(project.created_by);
        self.created_at = Some(project.created_at);
        self.owner = Some(project.owner);
        self.collection_count = Some(project.collection_count);
        self.capability_count = Some(project.capability_count);
    }
}

/// Manages projects
pub struct ProjectResource {
    client: Arc<CoraxClient>,
}

impl ProjectResource {
    /// Create the handler
    pub fn new(client: Arc<CoraxClient>) -> Self {
        Self { client }
    }

    /// Attribute schema; available without a client
    pub fn attribute_schema() -> ResourceSchema {
        ResourceSchema::new("corax_project", "Manages a Corax project.")
            .attribute(Attribute::computed("id", AttributeKind::String).describe("Project id."))
            .attribute(name_attribute("Name of the project."))
            .attribute(Attribute::optional("description", AttributeKind::String).describe("Description."))
            .attribute(
                Attribute::optional_computed("is_public", AttributeKind::Bool)
                    .with_default(false)
                    .describe("Whether the project is public. Defaults to false."),
            )
            .attribute(Attribute::computed("created_by", AttributeKind::String).describe("Creator."))
            .attribute(Attribute::computed("created_at", AttributeKind::String).describe("Creation time."))
            .attribute(Attribute::computed("owner", AttributeKind::String).describe("Owner."))
            .attribute(
                Attribute::computed("collection_count", AttributeKind::Int)
                    .describe("Number of collections in the project."),
            )
            .attribute(
                Attribute::computed("capability_count", AttributeKind::Int)
                    .describe("Number of capabilities in the project."),
            )
    }
}

#[async_trait]
impl Resource for ProjectResource {
    type Model = ProjectModel;

    fn type_name(&self) -> &'static str {
        "corax_project"
    }

    fn schema(&self) -> ResourceSchema {
        Self::attribute_schema()
    }

    async fn create(&self, mut plan: ProjectModel) -> Result<Outcome<ProjectModel>> {
        debug!(name = %plan.name, "Creating project");

        let payload = ProjectCreate {
            name: plan.name.clone(),
            description: plan.description.clone(),
            is_public: plan.is_public,
        };
        let created = self
            .client
            .create_project(&payload)
            .await
            .map_err(|e| e.context("Unable to create project"))?;

        plan.apply(created);
        info!(project_id = plan.id.as_deref().unwrap_or_default(), "Project created successfully");
        Ok(Outcome::present(plan))
    }

    async fn read(&self, mut state: ProjectModel) -> Result<Outcome<ProjectModel>> {
        let id = state.id.clone().unwrap_or_default();
        debug!(project_id = %id, "Reading project");

        match found(self.client.get_project(&id).await)
            .map_err(|e| e.context(format!("Unable to read project {id}")))?
        {
            Some(project) => {
                state.apply(project);
                debug!(project_id = %id, "Successfully read project");
                Ok(Outcome::present(state))
            }
            None => {
                warn!(project_id = %id, "Project not found, removing from state");
                Ok(Outcome::removed())
            }
        }
    }

    async fn update(&self, mut plan: ProjectModel, prior: ProjectModel) -> Result<Outcome<ProjectModel>> {
        let id = prior.id.clone().unwrap_or_default();
        debug!(project_id = %id, "Updating project");

        // Full replacement: an unset description clears it.
        let payload = ProjectUpdate {
            name: plan.name.clone(),
            description: plan.description.clone(),
            is_public: plan.is_public.unwrap_or(false),
        };
        let updated = self
            .client
            .update_project(&id, &payload)
            .await
            .map_err(|e| e.context(format!("Unable to update project {id}")))?;

        plan.apply(updated);
        info!(project_id = %id, "Project updated successfully");
        Ok(Outcome::present(plan))
    }

    async fn delete(&self, state: ProjectModel) -> Result<Diagnostics> {
        let id = state.id.unwrap_or_default();
        debug!(project_id = %id, "Deleting project");

        match found(self.client.delete_project(&id).await)
            .map_err(|e| e.context(format!("Unable to delete project {id}")))?
        {
            Some(()) => info!(project_id = %id, "Project deleted successfully"),
            None => warn!(project_id = %id, "Project already deleted, removing from state"),
        }
        Ok(Diagnostics::new())
    }
}
