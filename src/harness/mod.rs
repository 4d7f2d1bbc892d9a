//! Resource lifecycle harness
//!
//! Handlers implement [`Resource`] against their own typed model. The
//! blanket [`DynResource`] adapter turns any handler into a JSON-in,
//! JSON-out lifecycle:
//!
//! ```text
//! plan JSON ──▶ defaults ──▶ schema validation ──▶ typed model ──▶ handler
//!                                                                    │
//! Response { state, diagnostics } ◀── state JSON ◀── Outcome ◀───────┘
//! ```
//!
//! Handler errors never escape as `Err`: they become error diagnostics, and
//! the state falls back to what the operation started from (nothing for
//! create, the prior state for read, update and delete).

mod diagnostics;
pub mod schema;

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Value, json};
use tracing::debug;

pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use schema::{Attribute, AttributeKind, ResourceSchema, Validator};

use crate::Result;

/// Result of a lifecycle operation on a typed model
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome<M> {
    /// New state; `None` removes the resource from state
    pub state: Option<M>,
    /// Warnings (or errors) raised along the way
    pub diagnostics: Diagnostics,
}

impl<M> Outcome<M> {
    /// Resource exists with this state
    pub fn present(state: M) -> Self {
        Self {
            state: Some(state),
            diagnostics: Diagnostics::new(),
        }
    }

    /// Resource is gone and leaves state
    pub fn removed() -> Self {
        Self {
            state: None,
            diagnostics: Diagnostics::new(),
        }
    }

    /// Attach a warning
    #[must_use]
    pub fn with_warning(mut self, summary: impl Into<String>, detail: impl Into<String>) -> Self {
        self.diagnostics.add_warning(summary, detail);
        self
    }

    /// Attach an error while still reporting `state`
    #[must_use]
    pub fn with_error(mut self, summary: impl Into<String>, detail: impl Into<String>) -> Self {
        self.diagnostics.add_error(summary, detail);
        self
    }
}

/// A managed resource kind
#[async_trait]
pub trait Resource: Send + Sync {
    /// Typed state and plan model
    type Model: Serialize + DeserializeOwned + Send + Sync + 'static;

    /// Resource type name, e.g. `corax_project`
    fn type_name(&self) -> &'static str;

    /// Attribute schema
    fn schema(&self) -> ResourceSchema;

    /// Create the resource described by `plan`
    async fn create(&self, plan: Self::Model) -> Result<Outcome<Self::Model>>;

    /// Refresh `state` from the API
    async fn read(&self, state: Self::Model) -> Result<Outcome<Self::Model>>;

    /// Move the resource from `prior` to `plan`
    async fn update(&self, plan: Self::Model, prior: Self::Model) -> Result<Outcome<Self::Model>>;

    /// Delete the resource; a resource that is already gone is not an error
    async fn delete(&self, state: Self::Model) -> Result<Diagnostics>;
}

/// JSON response of a lifecycle operation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    /// New state; `None` when the resource is not (or no longer) in state
    pub state: Option<Value>,
    /// Diagnostics to show the operator
    pub diagnostics: Diagnostics,
}

impl Response {
    fn failed(state: Option<Value>, diagnostics: Diagnostics) -> Self {
        Self { state, diagnostics }
    }
}

/// Type-erased resource driven with JSON documents
#[async_trait]
pub trait DynResource: Send + Sync {
    /// Resource type name
    fn type_name(&self) -> &'static str;

    /// Attribute schema
    fn schema(&self) -> ResourceSchema;

    /// Create from a plan document
    async fn create(&self, plan: Value) -> Response;

    /// Refresh a state document
    async fn read(&self, state: Value) -> Response;

    /// Update from a plan document and the prior state document
    async fn update(&self, plan: Value, prior: Value) -> Response;

    /// Delete the resource in a state document
    async fn delete(&self, state: Value) -> Response;

    /// Seed state from an identifier; a read fills in the rest
    fn import(&self, id: &str) -> Response;
}

#[async_trait]
impl<R> DynResource for R
where
    R: Resource,
{
    fn type_name(&self) -> &'static str {
        Resource::type_name(self)
    }

    fn schema(&self) -> ResourceSchema {
        Resource::schema(self)
    }

    async fn create(&self, plan: Value) -> Response {
        debug!(resource = Resource::type_name(self), "Create");
        let plan = match prepare_plan::<R::Model>(&Resource::schema(self), plan) {
            Ok(plan) => plan,
            Err(diagnostics) => return Response::failed(None, diagnostics),
        };
        finish(Resource::create(self, plan).await, None)
    }

    async fn read(&self, state: Value) -> Response {
        debug!(resource = Resource::type_name(self), "Read");
        let model = match decode::<R::Model>("state", state.clone()) {
            Ok(model) => model,
            Err(diagnostics) => return Response::failed(Some(state), diagnostics),
        };
        finish(Resource::read(self, model).await, Some(state))
    }

    async fn update(&self, plan: Value, prior: Value) -> Response {
        debug!(resource = Resource::type_name(self), "Update");
        let plan = match prepare_plan::<R::Model>(&Resource::schema(self), plan) {
            Ok(plan) => plan,
            Err(diagnostics) => return Response::failed(Some(prior), diagnostics),
        };
        let prior_model = match decode::<R::Model>("state", prior.clone()) {
            Ok(model) => model,
            Err(diagnostics) => return Response::failed(Some(prior), diagnostics),
        };
        finish(Resource::update(self, plan, prior_model).await, Some(prior))
    }

    async fn delete(&self, state: Value) -> Response {
        debug!(resource = Resource::type_name(self), "Delete");
        let model = match decode::<R::Model>("state", state.clone()) {
            Ok(model) => model,
            Err(diagnostics) => return Response::failed(Some(state), diagnostics),
        };
        match Resource::delete(self, model).await {
            Ok(diagnostics) if diagnostics.has_error() => Response::failed(Some(state), diagnostics),
            Ok(diagnostics) => Response {
                state: None,
                diagnostics,
            },
            Err(e) => Response::failed(Some(state), Diagnostics::from_error(&e)),
        }
    }

    fn import(&self, id: &str) -> Response {
        if id.trim().is_empty() {
            let mut diagnostics = Diagnostics::new();
            diagnostics.add_error(
                "Missing Resource Identifier",
                format!("{} import requires a non-empty id", Resource::type_name(self)),
            );
            return Response::failed(None, diagnostics);
        }
        Response {
            state: Some(json!({ "id": id })),
            diagnostics: Diagnostics::new(),
        }
    }
}

/// Apply defaults, validate and decode a plan document
fn prepare_plan<M: DeserializeOwned>(
    schema: &ResourceSchema,
    mut plan: Value,
) -> std::result::Result<M, Diagnostics> {
    if let Value::Object(values) = &mut plan {
        schema.apply_defaults(values);
    }
    let diagnostics = schema.validate(&plan);
    if diagnostics.has_error() {
        return Err(diagnostics);
    }
    decode("plan", plan)
}

fn decode<M: DeserializeOwned>(what: &str, value: Value) -> std::result::Result<M, Diagnostics> {
    serde_json::from_value(value).map_err(|e| {
        let mut diagnostics = Diagnostics::new();
        diagnostics.add_error(
            format!("Invalid {}", capitalize(what)),
            format!("failed to decode {what}: {e}"),
        );
        diagnostics
    })
}

/// Encode a handler result, falling back to `fallback` state when the
/// handler fails. An `Outcome` is taken as-is, error diagnostics included.
fn finish<M: Serialize>(result: Result<Outcome<M>>, fallback: Option<Value>) -> Response {
    match result {
        Ok(Outcome { state, mut diagnostics }) => {
            let state = match state.map(serde_json::to_value).transpose() {
                Ok(state) => state,
                Err(e) => {
                    diagnostics.add_error("Provider Error", format!("failed to encode state: {e}"));
                    return Response::failed(fallback, diagnostics);
                }
            };
            Response { state, diagnostics }
        }
        Err(e) => Response::failed(fallback, Diagnostics::from_error(&e)),
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
