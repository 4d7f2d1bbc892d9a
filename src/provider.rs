//! Provider: configuration, shared client and the resource registry

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use crate::client::CoraxClient;
use crate::config::ProviderConfig;
use crate::harness::{DynResource, ResourceSchema};
use crate::resources::{
    ApiKeyResource, ChatCapabilityResource, CompletionCapabilityResource, ModelDeploymentResource,
    ModelProviderResource, ProjectResource,
};
use crate::{Error, Result};

/// Prefix of every resource type name
pub const TYPE_PREFIX: &str = "corax";

/// Schemas of every resource kind, sorted by type name
///
/// Needs no configuration or client.
pub fn resource_schemas() -> Vec<ResourceSchema> {
    let mut schemas = vec![
        ApiKeyResource::attribute_schema(),
        ProjectResource::attribute_schema(),
        ChatCapabilityResource::attribute_schema(),
        CompletionCapabilityResource::attribute_schema(),
        ModelDeploymentResource::attribute_schema(),
        ModelProviderResource::attribute_schema(),
    ];
    schemas.sort_by_key(|schema| schema.type_name);
    schemas
}

/// Schema of one resource kind
///
/// # Errors
///
/// Returns [`Error::Validation`] for an unknown type, listing the known ones.
pub fn resource_schema(type_name: &str) -> Result<ResourceSchema> {
    let schemas = resource_schemas();
    let known = schemas
        .iter()
        .map(|schema| schema.type_name)
        .collect::<Vec<_>>()
        .join(", ");
    schemas
        .into_iter()
        .find(|schema| schema.type_name == type_name)
        .ok_or_else(|| {
            Error::validation(format!(
                "unknown resource type '{type_name}', expected one of: {known}"
            ))
        })
}

/// A configured provider
///
/// Built once per invocation. Every handler holds the same client, so
/// concurrent operations share one connection pool and no mutable state.
pub struct Provider {
    client: Arc<CoraxClient>,
    resources: BTreeMap<&'static str, Box<dyn DynResource>>,
}

impl Provider {
    /// Build the client and register every resource kind
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the configuration is invalid.
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let client = Arc::new(CoraxClient::new(config)?);
        Ok(Self::with_client(client))
    }

    /// Register every resource kind against an existing client
    pub fn with_client(client: Arc<CoraxClient>) -> Self {
        let handlers: Vec<Box<dyn DynResource>> = vec![
            Box::new(ApiKeyResource::new(Arc::clone(&client))),
            Box::new(ProjectResource::new(Arc::clone(&client))),
            Box::new(ChatCapabilityResource::new(Arc::clone(&client))),
            Box::new(CompletionCapabilityResource::new(Arc::clone(&client))),
            Box::new(ModelDeploymentResource::new(Arc::clone(&client))),
            Box::new(ModelProviderResource::new(Arc::clone(&client))),
        ];

        let resources = handlers
            .into_iter()
            .map(|handler| (handler.type_name(), handler))
            .collect::<BTreeMap<_, _>>();
        debug!(count = resources.len(), base_url = %client.base_url(), "Provider configured");

        Self { client, resources }
    }

    /// Shared API client
    pub fn client(&self) -> &Arc<CoraxClient> {
        &self.client
    }

    /// Look up a resource handler by type name
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for an unknown type, listing the known ones.
    pub fn resource(&self, type_name: &str) -> Result<&dyn DynResource> {
        self.resources
            .get(type_name)
            .map(|handler| &**handler)
            .ok_or_else(|| {
                Error::validation(format!(
                    "unknown resource type '{type_name}', expected one of: {}",
                    self.resource_types().collect::<Vec<_>>().join(", ")
                ))
            })
    }

    /// Registered type names, sorted
    pub fn resource_types(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.resources.keys().copied()
    }

    /// Every resource schema, sorted by type name
    pub fn schemas(&self) -> Vec<ResourceSchema> {
        self.resources.values().map(|r| r.schema()).collect()
    }
}
