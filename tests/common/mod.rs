//! Shared helpers for tests against a mock Corax API

#![allow(dead_code)]

use std::sync::Arc;

use serde_json::{Value, json};
use wiremock::MockServer;

use corax_provider::client::CoraxClient;
use corax_provider::config::ProviderConfig;
use corax_provider::provider::Provider;

/// Key every test client authenticates with
pub const TEST_API_KEY: &str = "test-api-key";

pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

pub fn create_config(base_url: &str) -> ProviderConfig {
    ProviderConfig::new(base_url, TEST_API_KEY)
}

pub fn create_client(server: &MockServer) -> CoraxClient {
    CoraxClient::new(&create_config(&server.uri())).unwrap()
}

pub fn create_provider(server: &MockServer) -> Provider {
    Provider::with_client(Arc::new(create_client(server)))
}

/// JSON bodies of every request the server received, in order
pub async fn request_bodies(server: &MockServer) -> Vec<Value> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| !r.body.is_empty())
        .map(|r| serde_json::from_slice(&r.body).unwrap())
        .collect()
}

pub fn project_json(id: &str, name: &str, description: Option<&str>) -> Value {
    json!({
        "id": id,
        "name": name,
        "description": description,
        "is_public": false,
        "created_by": "alice",
        "created_at": "2025-01-01T00:00:00Z",
        "owner": "alice",
        "collection_count": 0,
        "capability_count": 0
    })
}

pub fn chat_capability_json(id: &str) -> Value {
    json!({
        "id": id,
        "name": "helper",
        "type": "chat",
        "is_public": false,
        "system_prompt": "You are a helpful assistant.",
        "owner": "alice",
        "created_by": "alice",
        "updated_by": "alice",
        "created_at": "2025-01-01T00:00:00Z",
        "updated_at": "2025-01-01T00:00:00Z"
    })
}

pub fn deployment_json(id: &str, provider_id: &str) -> Value {
    json!({
        "id": id,
        "name": "gpt-4o",
        "description": "Primary chat model",
        "supported_tasks": ["chat", "completion"],
        "configuration": {"model_name": "gpt-4o"},
        "is_active": true,
        "provider_id": provider_id,
        "created_at": "2025-01-01T00:00:00Z",
        "created_by": "alice"
    })
}
