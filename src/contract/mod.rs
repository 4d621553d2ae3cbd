//! Typed operation dispatch: a statically declared contract maps operation
//! ids to input/output schemas and handler capabilities. Input that fails
//! its schema never reaches a handler; output that fails its schema never
//! reaches the client.

pub mod error;
pub mod ops;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use jsonschema::{Draft, Validator};
use serde_json::Value;

use crate::access::{decide, Decision};
use crate::routing::{AccessClass, Classification};
use crate::session::Session;

pub use error::{ContractError, DispatchError, HandlerError};

/// Request-scoped context handed to handlers alongside validated input
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub session: Option<Session>,
    pub tenant: Option<String>,
}

/// Capability interface implemented by every operation body. Handlers
/// receive input that already passed the entry's input schema.
#[async_trait]
pub trait OperationHandler: Send + Sync {
    async fn call(&self, input: Value, ctx: &RequestContext) -> Result<Value, HandlerError>;
}

/// Authorization requirement an entry may declare; re-checked by the
/// dispatcher before the handler runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessRequirement {
    Authenticated,
    TenantMember,
}

impl AccessRequirement {
    fn as_class(self) -> AccessClass {
        match self {
            AccessRequirement::Authenticated => AccessClass::Authenticated,
            AccessRequirement::TenantMember => AccessClass::TenantScoped,
        }
    }
}

/// One operation declaration, prior to schema compilation
pub struct Operation {
    handler: Arc<dyn OperationHandler>,
    input_schema: Option<Value>,
    output_schema: Option<Value>,
    requires: Option<AccessRequirement>,
}

impl Operation {
    pub fn new(handler: impl OperationHandler + 'static) -> Self {
        Self {
            handler: Arc::new(handler),
            input_schema: None,
            output_schema: None,
            requires: None,
        }
    }

    pub fn with_input_schema(mut self, schema: Value) -> Self {
        self.input_schema = Some(schema);
        self
    }

    pub fn with_output_schema(mut self, schema: Value) -> Self {
        self.output_schema = Some(schema);
        self
    }

    pub fn requires(mut self, requirement: AccessRequirement) -> Self {
        self.requires = Some(requirement);
        self
    }
}

struct ContractEntry {
    input: Option<Validator>,
    output: Option<Validator>,
    requires: Option<AccessRequirement>,
    handler: Arc<dyn OperationHandler>,
}

/// Immutable operation registry, built once at startup and shared across
/// requests without locks.
pub struct Contract {
    entries: HashMap<String, ContractEntry>,
}

impl std::fmt::Debug for Contract {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Contract")
            .field("operations", &self.operation_ids())
            .finish()
    }
}

impl Contract {
    pub fn builder() -> ContractBuilder {
        ContractBuilder {
            operations: Vec::new(),
        }
    }

    pub fn operation_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.entries.keys().map(|k| k.as_str()).collect();
        ids.sort_unstable();
        ids
    }

    /// Dispatch one operation: lookup, input validation, access check,
    /// handler invocation, output validation. No retries at this layer.
    pub async fn dispatch(
        &self,
        operation: &str,
        input: Value,
        ctx: &RequestContext,
    ) -> Result<Value, DispatchError> {
        let entry = self
            .entries
            .get(operation)
            .ok_or_else(|| DispatchError::NotFound(operation.to_string()))?;

        if let Some(validator) = &entry.input {
            let errors: Vec<String> = validator
                .iter_errors(&input)
                .take(3)
                .map(|e| e.to_string())
                .collect();
            if !errors.is_empty() {
                tracing::debug!(operation, "input rejected: {}", errors.join("; "));
                return Err(DispatchError::InvalidInput(errors.join("; ")));
            }
        }

        if let Some(requirement) = entry.requires {
            let classification = Classification {
                class: requirement.as_class(),
                tenant: ctx.tenant.clone(),
            };
            // Redirect targets are meaningless at the API boundary; any
            // non-allow outcome short-circuits before the handler runs.
            match decide(&classification, ctx.session.clone(), "/", "/signin") {
                Decision::Allow(_) => {}
                Decision::RedirectTo(_) => return Err(DispatchError::Unauthorized),
                Decision::Reject(reason) => return Err(DispatchError::Forbidden(reason)),
            }
        }

        let output = entry
            .handler
            .call(input, ctx)
            .await
            .map_err(DispatchError::HandlerFailed)?;

        if let Some(validator) = &entry.output {
            if !validator.is_valid(&output) {
                tracing::error!(
                    operation,
                    "handler output failed its declared schema; suppressing response body"
                );
                return Err(DispatchError::InvalidOutput(operation.to_string()));
            }
        }

        Ok(output)
    }
}

/// Collects operation declarations; `build` compiles schemas and enforces
/// id uniqueness.
pub struct ContractBuilder {
    operations: Vec<(String, Operation)>,
}

impl ContractBuilder {
    pub fn operation(mut self, id: &str, operation: Operation) -> Self {
        self.operations.push((id.to_string(), operation));
        self
    }

    pub fn build(self) -> Result<Contract, ContractError> {
        let mut entries = HashMap::with_capacity(self.operations.len());

        for (id, operation) in self.operations {
            if entries.contains_key(&id) {
                return Err(ContractError::DuplicateOperation(id));
            }

            let input = operation
                .input_schema
                .map(|schema| compile_schema(&id, "input", &schema))
                .transpose()?;
            let output = operation
                .output_schema
                .map(|schema| compile_schema(&id, "output", &schema))
                .transpose()?;

            entries.insert(
                id,
                ContractEntry {
                    input,
                    output,
                    requires: operation.requires,
                    handler: operation.handler,
                },
            );
        }

        Ok(Contract { entries })
    }
}

fn compile_schema(
    operation: &str,
    which: &'static str,
    schema: &Value,
) -> Result<Validator, ContractError> {
    jsonschema::options()
        .with_draft(Draft::Draft202012)
        .build(schema)
        .map_err(|e| ContractError::InvalidSchema {
            operation: operation.to_string(),
            which,
            reason: e.to_string(),
        })
}
