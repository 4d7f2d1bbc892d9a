//! Lifecycle tests for every resource kind against a mock Corax API.
//!
//! Each test drives a handler through the provider registry with JSON plan
//! and state documents, the same way the command line does.

mod common;

use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, ResponseTemplate};

use common::{
    TEST_API_KEY, chat_capability_json, create_provider, deployment_json, project_json,
    request_bodies, setup_mock_server,
};

fn summaries(response: &corax_provider::harness::Response) -> Vec<String> {
    response
        .diagnostics
        .iter()
        .map(|d| d.summary.clone())
        .collect()
}

// =============================================================================
// Projects
// =============================================================================

#[tokio::test]
async fn test_project_create_sends_name_and_records_id() {
    // GIVEN: the API accepts a project with only a name
    let server = setup_mock_server().await;
    Mock::given(method("POST"))
        .and(path("/v1/projects"))
        .and(header("X-API-Key", TEST_API_KEY))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(project_json("proj-123", "test-project", None)),
        )
        .expect(1)
        .mount(&server)
        .await;
    let provider = create_provider(&server);

    // WHEN: creating from a plan with just a name
    let response = provider
        .resource("corax_project")
        .unwrap()
        .create(json!({"name": "test-project"}))
        .await;

    // THEN: state carries the server id and no description
    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
    let state = response.state.unwrap();
    assert_eq!(state["id"], "proj-123");
    assert_eq!(state["name"], "test-project");
    assert_eq!(state["description"], Value::Null);
    assert_eq!(state["is_public"], false);
}

#[tokio::test]
async fn test_project_update_clears_description() {
    let server = setup_mock_server().await;
    Mock::given(method("PUT"))
        .and(path("/v1/projects/proj-123"))
        .and(body_json(json!({
            "name": "renamed",
            "description": null,
            "is_public": false
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(project_json("proj-123", "renamed", None)),
        )
        .expect(1)
        .mount(&server)
        .await;
    let provider = create_provider(&server);

    let response = provider
        .resource("corax_project")
        .unwrap()
        .update(
            json!({"name": "renamed"}),
            json!({"id": "proj-123", "name": "old", "description": "was here"}),
        )
        .await;

    assert!(!response.diagnostics.has_error(), "{:?}", response.diagnostics);
    assert_eq!(response.state.unwrap()["description"], Value::Null);
}

#[tokio::test]
async fn test_project_read_not_found_removes_state() {
    let server = setup_mock_server().await;
    Mock::given(method("GET"))
        .and(path("/v1/projects/proj-123"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    let provider = create_provider(&server);

    let response = provider
        .resource("corax_project")
        .unwrap()
        .read(json!({"id": "proj-123", "name": "test-project"}))
        .await;

    assert_eq!(response.state, None);
    assert!(response.diagnostics.is_empty());
}

#[tokio::test]
async fn test_project_delete_not_found_succeeds() {
    let server = setup_mock_server().await;
    Mock::given(method("DELETE"))
        .and(path("/v1/projects/proj-123"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    let provider = create_provider(&server);

    let response = provider
        .resource("corax_project")
        .unwrap()
        .delete(json!({"id": "proj-123", "name": "test-project"}))
        .await;

    assert_eq!(response.state, None);
    assert!(!response.diagnostics.has_error());
}

#[tokio::test]
async fn test_server_error_keeps_prior_state() {
    let server = setup_mock_server().await;
    Mock::given(method("GET"))
        .and(path("/v1/projects/proj-123"))
        .respond_with(ResponseTemplate::new(500).set_body_string("database unavailable"))
        .mount(&server)
        .await;
    let provider = create_provider(&server);
    let prior = json!({"id": "proj-123", "name": "test-project"});

    let response = provider
        .resource("corax_project")
        .unwrap()
        .read(prior.clone())
        .await;

    assert_eq!(response.state, Some(prior));
    assert_eq!(summaries(&response), vec!["Client Error"]);
    let detail = &response.diagnostics.iter().next().unwrap().detail;
    assert!(detail.starts_with("Unable to read project proj-123, got error:"), "{detail}");
    assert!(detail.contains("database unavailable"));
}

#[tokio::test]
async fn test_missing_required_attribute_skips_request() {
    let server = setup_mock_server().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;
    let provider = create_provider(&server);

    let response = provider
        .resource("corax_project")
        .unwrap()
        .create(json!({"description": "no name"}))
        .await;

    assert_eq!(response.state, None);
    assert!(response.diagnostics.has_error());
}

// =============================================================================
// API keys
// =============================================================================

#[tokio::test]
async fn test_api_key_secret_only_from_create() {
    let server = setup_mock_server().await;
    Mock::given(method("POST"))
        .and(path("/v1/api-keys"))
        .and(body_json(json!({"name": "ci", "expires_at": "2030-01-01T00:00:00Z"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "key-1",
            "name": "ci",
            "key": "ck_live_secret",
            "prefix": "ck_live",
            "created_by": "alice",
            "created_at": "2025-01-01T00:00:00Z",
            "expires_at": "2030-01-01T00:00:00Z",
            "is_active": true,
            "usage_count": 0
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/api-keys/key-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "key-1",
            "name": "ci",
            "prefix": "ck_live",
            "created_by": "alice",
            "created_at": "2025-01-01T00:00:00Z",
            "expires_at": "2030-01-01T00:00:00Z",
            "last_used_at": "2025-02-01T00:00:00Z",
            "is_active": true,
            "usage_count": 7
        })))
        .mount(&server)
        .await;
    let provider = create_provider(&server);
    let api_key = provider.resource("corax_api_key").unwrap();

    let created = api_key
        .create(json!({"name": "ci", "expires_at": "2030-01-01T00:00:00Z"}))
        .await;
    let state = created.state.unwrap();
    assert_eq!(state["key"], "ck_live_secret");

    let refreshed = api_key.read(state).await.state.unwrap();
    assert_eq!(refreshed["key"], "ck_live_secret");
    assert_eq!(refreshed["usage_count"], 7);
    assert_eq!(refreshed["last_used_at"], "2025-02-01T00:00:00Z");
}

#[tokio::test]
async fn test_api_key_read_deleted_removes_state() {
    let server = setup_mock_server().await;
    Mock::given(method("GET"))
        .and(path("/v1/api-keys/key-1"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    let provider = create_provider(&server);

    let response = provider
        .resource("corax_api_key")
        .unwrap()
        .read(json!({"id": "key-1", "name": "ci", "key": "ck_live_secret"}))
        .await;

    assert_eq!(response.state, None);
}

#[tokio::test]
async fn test_api_key_update_is_rejected() {
    let server = setup_mock_server().await;
    let provider = create_provider(&server);
    let prior = json!({"id": "key-1", "name": "ci", "expires_at": "2030-01-01T00:00:00Z"});

    let response = provider
        .resource("corax_api_key")
        .unwrap()
        .update(
            json!({"name": "renamed", "expires_at": "2030-01-01T00:00:00Z"}),
            prior.clone(),
        )
        .await;

    assert_eq!(response.state, Some(prior));
    assert_eq!(summaries(&response), vec!["Update Not Supported"]);
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_api_key_rejects_malformed_expiry() {
    let server = setup_mock_server().await;
    let provider = create_provider(&server);

    let response = provider
        .resource("corax_api_key")
        .unwrap()
        .create(json!({"name": "ci", "expires_at": "next tuesday"}))
        .await;

    assert!(response.diagnostics.has_error());
    assert!(server.received_requests().await.unwrap().is_empty());
}

// =============================================================================
// Chat capabilities
// =============================================================================

#[tokio::test]
async fn test_chat_create_without_config_omits_config() {
    let server = setup_mock_server().await;
    Mock::given(method("POST"))
        .and(path("/v1/capabilities"))
        .respond_with(ResponseTemplate::new(201).set_body_json(chat_capability_json("cap-1")))
        .expect(1)
        .mount(&server)
        .await;
    let provider = create_provider(&server);

    let response = provider
        .resource("corax_chat_capability")
        .unwrap()
        .create(json!({"name": "helper", "system_prompt": "You are a helpful assistant."}))
        .await;

    assert!(!response.diagnostics.has_error(), "{:?}", response.diagnostics);
    let bodies = request_bodies(&server).await;
    assert_eq!(
        bodies[0],
        json!({
            "type": "chat",
            "name": "helper",
            "is_public": false,
            "system_prompt": "You are a helpful assistant."
        })
    );
    let state = response.state.unwrap();
    assert_eq!(state["id"], "cap-1");
    assert_eq!(state["type"], "chat");
}

#[tokio::test]
async fn test_chat_create_sends_config() {
    let server = setup_mock_server().await;
    Mock::given(method("POST"))
        .and(path("/v1/capabilities"))
        .respond_with(ResponseTemplate::new(201).set_body_json(chat_capability_json("cap-1")))
        .mount(&server)
        .await;
    let provider = create_provider(&server);

    provider
        .resource("corax_chat_capability")
        .unwrap()
        .create(json!({
            "name": "helper",
            "system_prompt": "You are a helpful assistant.",
            "config": {
                "temperature": 0.2,
                "data_retention": {"type": "timed", "hours": 24},
                "custom_parameters": "{\"top_p\": 0.9}"
            }
        }))
        .await;

    let bodies = request_bodies(&server).await;
    assert_eq!(
        bodies[0]["config"],
        json!({
            "temperature": 0.2,
            "data_retention": {"type": "timed", "hours": 24},
            "custom_parameters": {"top_p": 0.9}
        })
    );
}

#[tokio::test]
async fn test_chat_read_type_mismatch_removes_with_error() {
    let server = setup_mock_server().await;
    let mut body = chat_capability_json("cap-1");
    body["type"] = json!("completion");
    Mock::given(method("GET"))
        .and(path("/v1/capabilities/cap-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;
    let provider = create_provider(&server);

    let response = provider
        .resource("corax_chat_capability")
        .unwrap()
        .read(json!({"id": "cap-1", "name": "helper"}))
        .await;

    assert_eq!(response.state, None);
    assert_eq!(summaries(&response), vec!["Resource Type Mismatch"]);
}

#[tokio::test]
async fn test_chat_update_keeps_prior_audit_fields() {
    let server = setup_mock_server().await;
    let mut body = chat_capability_json("cap-1");
    body["updated_at"] = json!("2025-06-01T00:00:00Z");
    Mock::given(method("PUT"))
        .and(path("/v1/capabilities/cap-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;
    let provider = create_provider(&server);

    let response = provider
        .resource("corax_chat_capability")
        .unwrap()
        .update(
            json!({"name": "helper", "system_prompt": "You are a helpful assistant."}),
            json!({
                "id": "cap-1",
                "name": "helper",
                "updated_at": "2025-01-01T00:00:00Z",
                "created_by": "alice"
            }),
        )
        .await;

    let state = response.state.unwrap();
    assert_eq!(state["updated_at"], "2025-01-01T00:00:00Z");
    assert_eq!(state["created_by"], "alice");
}

#[tokio::test]
async fn test_chat_read_tolerates_retention_without_hours() {
    // GIVEN: the server reports timed retention but drops the hours
    let server = setup_mock_server().await;
    let mut body = chat_capability_json("cap-1");
    body["config"] = json!({"data_retention": {"type": "timed", "hours": null}});
    Mock::given(method("GET"))
        .and(path("/v1/capabilities/cap-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;
    let provider = create_provider(&server);

    // WHEN: refreshing the capability
    let response = provider
        .resource("corax_chat_capability")
        .unwrap()
        .read(json!({"id": "cap-1", "name": "helper"}))
        .await;

    // THEN: the config is mapped with hours unset instead of failing
    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
    let state = response.state.unwrap();
    assert_eq!(state["config"]["data_retention"], json!({"type": "timed", "hours": null}));
    assert_eq!(state["config"]["content_tracing"], true);
}

#[tokio::test]
async fn test_capability_delete_not_found_succeeds() {
    let server = setup_mock_server().await;
    Mock::given(method("DELETE"))
        .and(path("/v1/capabilities/cap-1"))
        .respond_with(ResponseTemplate::new(404))
        .expect(2)
        .mount(&server)
        .await;
    let provider = create_provider(&server);

    for resource_type in ["corax_chat_capability", "corax_completion_capability"] {
        let response = provider
            .resource(resource_type)
            .unwrap()
            .delete(json!({"id": "cap-1", "name": "helper"}))
            .await;

        assert_eq!(response.state, None, "{resource_type}");
        assert!(!response.diagnostics.has_error(), "{resource_type}");
    }
}

// =============================================================================
// Completion capabilities
// =============================================================================

fn completion_response(schema_def: Value) -> Value {
    json!({
        "id": "cap-2",
        "name": "summarizer",
        "type": "completion",
        "is_public": false,
        "system_prompt": "Be brief.",
        "completion_prompt": "Summarize {{text}}",
        "output_type": "schema",
        "schema_def": schema_def,
        "variables": ["text"],
        "owner": "alice",
        "created_by": "alice",
        "updated_by": "alice",
        "created_at": "2025-01-01T00:00:00Z",
        "updated_at": "2025-01-01T00:00:00Z"
    })
}

#[tokio::test]
async fn test_completion_schema_def_string_and_object_agree() {
    let server = setup_mock_server().await;
    Mock::given(method("POST"))
        .and(path("/v1/capabilities"))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(completion_response(json!({"summary": "string", "length": 3}))),
        )
        .expect(2)
        .mount(&server)
        .await;
    let provider = create_provider(&server);
    let completion = provider.resource("corax_completion_capability").unwrap();
    let plan = |schema_def: Value| {
        json!({
            "name": "summarizer",
            "system_prompt": "Be brief.",
            "completion_prompt": "Summarize {{text}}",
            "output_type": "schema",
            "variables": ["text"],
            "schema_def": schema_def
        })
    };

    let from_string = completion
        .create(plan(json!("{\"summary\": \"string\", \"length\": 3}")))
        .await;
    let from_object = completion
        .create(plan(json!({"summary": "string", "length": 3})))
        .await;

    let canonical = json!("{\"length\":3,\"summary\":\"string\"}");
    assert_eq!(from_string.state.unwrap()["schema_def"], canonical);
    assert_eq!(from_object.state.unwrap()["schema_def"], canonical);

    let bodies = request_bodies(&server).await;
    assert_eq!(bodies[0]["schema_def"], bodies[1]["schema_def"]);
    assert_eq!(bodies[0]["schema_def"], json!({"summary": "string", "length": 3}));
    assert_eq!(bodies[0]["type"], "completion");
}

#[tokio::test]
async fn test_completion_output_type_rules_checked_before_request() {
    let server = setup_mock_server().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;
    let provider = create_provider(&server);
    let completion = provider.resource("corax_completion_capability").unwrap();
    let base = json!({
        "name": "summarizer",
        "system_prompt": "Be brief.",
        "completion_prompt": "Summarize {{text}}"
    });

    let cases = [
        (
            json!({"output_type": "schema"}),
            "schema_def is required when output_type is 'schema'",
        ),
        (
            json!({"output_type": "text", "schema_def": "{\"a\": 1}"}),
            "schema_def must not be set when output_type is 'text'",
        ),
        (
            json!({"output_type": "schema", "schema_def": "{}"}),
            "schema_def was provided but conversion resulted in nil or empty map",
        ),
    ];

    for (extra, expected) in cases {
        let mut plan = base.clone();
        plan.as_object_mut()
            .unwrap()
            .extend(extra.as_object().unwrap().clone());

        let response = completion.create(plan).await;

        assert_eq!(response.state, None);
        let detail = &response.diagnostics.iter().next().unwrap().detail;
        assert!(detail.contains(expected), "{detail}");
    }
}

// =============================================================================
// Model deployments
// =============================================================================

fn deployment_state() -> Value {
    json!({
        "id": "dep-1",
        "name": "gpt-4o",
        "description": "Primary chat model",
        "supported_tasks": ["chat", "completion"],
        "configuration": {"model_name": "gpt-4o"},
        "is_active": true,
        "provider_id": "prov-1"
    })
}

#[tokio::test]
async fn test_deployment_provider_change_warns_and_skips_noop() {
    let server = setup_mock_server().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let provider = create_provider(&server);
    let mut plan = deployment_state();
    plan.as_object_mut().unwrap().remove("id");
    plan["provider_id"] = json!("prov-2");

    let response = provider
        .resource("corax_model_deployment")
        .unwrap()
        .update(plan, deployment_state())
        .await;

    assert_eq!(summaries(&response), vec!["ProviderID Change"]);
    assert!(!response.diagnostics.has_error());
    let state = response.state.unwrap();
    assert_eq!(state["provider_id"], "prov-1");
    assert_eq!(state["id"], "dep-1");
}

#[tokio::test]
async fn test_deployment_update_sends_prior_provider() {
    let server = setup_mock_server().await;
    let mut body = deployment_json("dep-1", "prov-1");
    body["name"] = json!("gpt-4o-mini");
    Mock::given(method("PUT"))
        .and(path("/v1/model-deployments/dep-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(&server)
        .await;
    let provider = create_provider(&server);
    let mut plan = deployment_state();
    plan["name"] = json!("gpt-4o-mini");
    plan["provider_id"] = json!("prov-2");

    let response = provider
        .resource("corax_model_deployment")
        .unwrap()
        .update(plan, deployment_state())
        .await;

    assert_eq!(summaries(&response), vec!["ProviderID Change"]);
    let bodies = request_bodies(&server).await;
    assert_eq!(bodies[0]["provider_id"], "prov-1");
    assert_eq!(response.state.unwrap()["name"], "gpt-4o-mini");
}

#[tokio::test]
async fn test_deployment_missing_is_active_reads_as_active() {
    let server = setup_mock_server().await;
    let mut body = deployment_json("dep-1", "prov-1");
    body.as_object_mut().unwrap().remove("is_active");
    Mock::given(method("GET"))
        .and(path("/v1/model-deployments/dep-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;
    let provider = create_provider(&server);

    let response = provider
        .resource("corax_model_deployment")
        .unwrap()
        .read(json!({"id": "dep-1"}))
        .await;

    assert_eq!(response.state.unwrap()["is_active"], true);
}

#[tokio::test]
async fn test_deployment_delete_not_found_succeeds() {
    let server = setup_mock_server().await;
    Mock::given(method("DELETE"))
        .and(path("/v1/model-deployments/dep-1"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    let provider = create_provider(&server);

    let response = provider
        .resource("corax_model_deployment")
        .unwrap()
        .delete(deployment_state())
        .await;

    assert_eq!(response.state, None);
    assert!(!response.diagnostics.has_error());
}

#[tokio::test]
async fn test_deployment_delete_server_error_keeps_state() {
    let server = setup_mock_server().await;
    Mock::given(method("DELETE"))
        .and(path("/v1/model-deployments/dep-1"))
        .respond_with(ResponseTemplate::new(409).set_body_string("deployment in use"))
        .mount(&server)
        .await;
    let provider = create_provider(&server);

    let response = provider
        .resource("corax_model_deployment")
        .unwrap()
        .delete(deployment_state())
        .await;

    assert_eq!(response.state, Some(deployment_state()));
    assert_eq!(summaries(&response), vec!["Client Error"]);
}

// =============================================================================
// Model providers
// =============================================================================

#[tokio::test]
async fn test_model_provider_keeps_full_api_key() {
    let server = setup_mock_server().await;
    let truncated = json!({
        "id": "prov-1",
        "name": "azure",
        "provider_type": "azure_openai",
        "configuration": {"api_key": "sk-...", "endpoint": "https://azure.example"}
    });
    Mock::given(method("POST"))
        .and(path("/v1/model-providers"))
        .respond_with(ResponseTemplate::new(201).set_body_json(truncated.clone()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/model-providers/prov-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(truncated))
        .mount(&server)
        .await;
    let provider = create_provider(&server);
    let model_provider = provider.resource("corax_model_provider").unwrap();

    let created = model_provider
        .create(json!({
            "name": "azure",
            "provider_type": "azure_openai",
            "configuration": {"api_key": "sk-full-secret", "endpoint": "https://azure.example"}
        }))
        .await
        .state
        .unwrap();
    assert_eq!(created["configuration"]["api_key"], "sk-full-secret");

    let refreshed = model_provider.read(created).await.state.unwrap();
    assert_eq!(refreshed["configuration"]["api_key"], "sk-full-secret");
    assert_eq!(refreshed["configuration"]["endpoint"], "https://azure.example");
}

#[tokio::test]
async fn test_model_provider_update_sends_id() {
    let server = setup_mock_server().await;
    Mock::given(method("PUT"))
        .and(path("/v1/model-providers/prov-1"))
        .and(body_json(json!({
            "id": "prov-1",
            "name": "azure-eu",
            "provider_type": "azure_openai",
            "configuration": {"api_key": "sk-full-secret"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "prov-1",
            "name": "azure-eu",
            "provider_type": "azure_openai",
            "configuration": {"api_key": "sk-..."}
        })))
        .expect(1)
        .mount(&server)
        .await;
    let provider = create_provider(&server);

    let response = provider
        .resource("corax_model_provider")
        .unwrap()
        .update(
            json!({
                "name": "azure-eu",
                "provider_type": "azure_openai",
                "configuration": {"api_key": "sk-full-secret"}
            }),
            json!({"id": "prov-1", "name": "azure", "provider_type": "azure_openai"}),
        )
        .await;

    let state = response.state.unwrap();
    assert_eq!(state["id"], "prov-1");
    assert_eq!(state["configuration"]["api_key"], "sk-full-secret");
}

// =============================================================================
// Import
// =============================================================================

#[tokio::test]
async fn test_import_then_read() {
    let server = setup_mock_server().await;
    Mock::given(method("GET"))
        .and(path("/v1/projects/proj-123"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(project_json(
                "proj-123",
                "test-project",
                Some("imported"),
            )),
        )
        .mount(&server)
        .await;
    let provider = create_provider(&server);
    let project = provider.resource("corax_project").unwrap();

    let seeded = project.import("proj-123");
    assert_eq!(seeded.state, Some(json!({"id": "proj-123"})));

    let state = project.read(seeded.state.unwrap()).await.state.unwrap();
    assert_eq!(state["name"], "test-project");
    assert_eq!(state["description"], "imported");
}
