use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::response::Response;
use axum::Router;
use serde_json::{json, Value};
use uuid::Uuid;

use sovoli_gateway::app::app;
use sovoli_gateway::contract::ops::{HealthCheck, WhoAmI};
use sovoli_gateway::contract::{
    AccessRequirement, Contract, HandlerError, Operation, OperationHandler, RequestContext,
};
use sovoli_gateway::routing::{AccessClass, RouteEntry, RouteTable, TenantRule};
use sovoli_gateway::session::{generate_token, Claims, JwtIssuer, SessionResolver};
use sovoli_gateway::state::AppState;

pub const TEST_SECRET: &str = "integration-test-secret";

/// Route table used across the gateway tests. The broad `/w/:tenant/*`
/// pattern is deliberately declared before the `/w/public-page` literal to
/// pin down first-match-wins precedence.
pub fn test_routes() -> RouteTable {
    RouteTable::from_entries(&[
        RouteEntry::new("/", AccessClass::Public),
        RouteEntry::new("/health", AccessClass::Public),
        RouteEntry::new("/signin", AccessClass::Public),
        RouteEntry::new("/api/*", AccessClass::Public),
        RouteEntry::new("/dashboard/*", AccessClass::Authenticated),
        RouteEntry::new("/w/:tenant/*", AccessClass::TenantScoped)
            .with_tenant_from(TenantRule::PathSegment(1)),
        RouteEntry::new("/w/public-page", AccessClass::Public),
    ])
    .expect("test route table is valid")
}

struct CreateNote;

#[async_trait]
impl OperationHandler for CreateNote {
    async fn call(&self, input: Value, _ctx: &RequestContext) -> Result<Value, HandlerError> {
        Ok(json!({ "created": true, "title": input["title"] }))
    }
}

struct RenderReport;

#[async_trait]
impl OperationHandler for RenderReport {
    async fn call(&self, _input: Value, _ctx: &RequestContext) -> Result<Value, HandlerError> {
        // Violates the declared output schema on purpose
        Ok(json!({ "secret_debug": "do-not-leak" }))
    }
}

struct ReserveInventory;

#[async_trait]
impl OperationHandler for ReserveInventory {
    async fn call(&self, _input: Value, _ctx: &RequestContext) -> Result<Value, HandlerError> {
        Err(HandlerError::new("out_of_stock", "nothing left to reserve"))
    }
}

struct WorkspaceSummary;

#[async_trait]
impl OperationHandler for WorkspaceSummary {
    async fn call(&self, _input: Value, ctx: &RequestContext) -> Result<Value, HandlerError> {
        Ok(json!({ "tenant": ctx.tenant, "books": 3 }))
    }
}

/// Built-in operations plus fixtures exercising each dispatch failure mode
pub fn test_contract() -> Contract {
    Contract::builder()
        .operation("health.check", Operation::new(HealthCheck))
        .operation(
            "auth.whoami",
            Operation::new(WhoAmI).requires(AccessRequirement::Authenticated),
        )
        .operation(
            "notes.create",
            Operation::new(CreateNote).with_input_schema(json!({
                "type": "object",
                "required": ["title"],
                "properties": { "title": { "type": "string", "minLength": 1 } }
            })),
        )
        .operation(
            "report.render",
            Operation::new(RenderReport).with_output_schema(json!({
                "type": "object",
                "required": ["html"],
                "properties": { "html": { "type": "string" } }
            })),
        )
        .operation("inventory.reserve", Operation::new(ReserveInventory))
        .operation(
            "workspace.summary",
            Operation::new(WorkspaceSummary).requires(AccessRequirement::TenantMember),
        )
        .build()
        .expect("test contract is valid")
}

pub fn test_state() -> Arc<AppState> {
    let resolver = SessionResolver::new(
        Arc::new(JwtIssuer::new(TEST_SECRET)),
        Duration::from_millis(500),
    );
    Arc::new(AppState::new(
        test_routes(),
        test_contract(),
        resolver,
        "/signin",
    ))
}

pub fn test_app() -> Router {
    app(test_state())
}

/// Mint a signed session token for a test user
pub fn token_for(username: &str, tenants: &[&str]) -> String {
    let claims = Claims::new(
        Uuid::new_v4(),
        username.to_string(),
        format!("{} (test)", username),
        vec!["member".to_string()],
        tenants.iter().map(|t| t.to_string()).collect(),
        1,
    );
    generate_token(&claims, TEST_SECRET).expect("token generation")
}

pub async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read response body");
    serde_json::from_slice(&bytes).expect("response body is JSON")
}
