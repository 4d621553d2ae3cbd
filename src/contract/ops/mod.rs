//! Built-in operations registered on the default contract.

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{
    AccessRequirement, Contract, ContractError, HandlerError, Operation, OperationHandler,
    RequestContext,
};

/// `health.check` — liveness probe, callable by anyone with no input
pub struct HealthCheck;

#[async_trait]
impl OperationHandler for HealthCheck {
    async fn call(&self, _input: Value, _ctx: &RequestContext) -> Result<Value, HandlerError> {
        Ok(json!({ "status": "ok" }))
    }
}

/// `auth.whoami` — the caller's own user record
pub struct WhoAmI;

#[async_trait]
impl OperationHandler for WhoAmI {
    async fn call(&self, _input: Value, ctx: &RequestContext) -> Result<Value, HandlerError> {
        let session = ctx
            .session
            .as_ref()
            .ok_or_else(|| HandlerError::new("no_session", "caller has no session"))?;

        Ok(json!({
            "id": session.user.id,
            "username": session.user.username,
            "display_name": session.user.display_name,
            "roles": session.user.roles,
            "tenants": session.tenants,
        }))
    }
}

/// Assemble the contract shipped with the gateway binary
pub fn default_contract() -> Result<Contract, ContractError> {
    Contract::builder()
        .operation("health.check", Operation::new(HealthCheck))
        .operation(
            "auth.whoami",
            Operation::new(WhoAmI)
                .requires(AccessRequirement::Authenticated)
                .with_output_schema(json!({
                    "type": "object",
                    "required": ["id", "username", "display_name", "roles"],
                    "properties": {
                        "id": { "type": "string" },
                        "username": { "type": "string" },
                        "display_name": { "type": "string" },
                        "roles": { "type": "array", "items": { "type": "string" } },
                        "tenants": { "type": "array", "items": { "type": "string" } }
                    }
                })),
        )
        .build()
}
