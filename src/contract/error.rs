/// Domain-specific failure returned by an operation handler.
/// The kind travels to the client; keep it short and stable.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct HandlerError {
    pub kind: String,
    pub message: String,
}

impl HandlerError {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
        }
    }
}

/// Structured dispatch failure. None of these escape the dispatcher as
/// panics; callers map them to wire responses.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("unknown operation '{0}'")]
    NotFound(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("authentication required")]
    Unauthorized,
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("handler failed: {0}")]
    HandlerFailed(HandlerError),
    /// The handler's own return value failed the output schema. Always a
    /// defect on our side of the contract, never a client error.
    #[error("operation '{0}' produced output that failed its contract")]
    InvalidOutput(String),
}

/// Failure while assembling the contract table at startup
#[derive(Debug, thiserror::Error)]
pub enum ContractError {
    #[error("duplicate operation id '{0}'")]
    DuplicateOperation(String),
    #[error("invalid {which} schema for operation '{operation}': {reason}")]
    InvalidSchema {
        operation: String,
        which: &'static str,
        reason: String,
    },
}
