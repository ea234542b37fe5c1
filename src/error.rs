//! Error types for the board engine.

use thiserror::Error;

use crate::mutation::MutationPhase;

/// Result type for board operations
pub type Result<T> = std::result::Result<T, BoardError>;

/// Failures reported by a persistence gateway.
///
/// The engine never inspects the variant; it rolls back and hands the error to
/// the caller unchanged.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GatewayError {
    /// Network or transport failure
    #[error("transport error: {0}")]
    Transport(String),

    /// The backend rejected the input
    #[error("invalid value for {field}: {message}")]
    Validation { field: String, message: String },

    /// Referenced entity does not exist
    #[error("{resource} not found: {id}")]
    NotFound { resource: String, id: String },

    /// The backend refused a conflicting write
    #[error("conflict: {0}")]
    Conflict(String),

    /// The call did not finish in time
    #[error("request timed out after {elapsed_ms}ms")]
    Timeout { elapsed_ms: u64 },

    /// Local storage failure in a file-backed gateway
    #[error("storage error: {0}")]
    Storage(String),
}

impl GatewayError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn not_found(resource: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: id.into(),
        }
    }
}

impl From<std::io::Error> for GatewayError {
    fn from(e: std::io::Error) -> Self {
        Self::Storage(e.to_string())
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(e: serde_json::Error) -> Self {
        Self::Storage(format!("JSON: {e}"))
    }
}

/// Errors returned by the board engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BoardError {
    /// The gateway rejected the mutation
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// Input rejected before reaching the gateway
    #[error("invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    /// A mutation tried to skip or repeat a phase
    #[error("invalid mutation transition: {from:?} -> {to:?}")]
    InvalidTransition { from: MutationPhase, to: MutationPhase },
}

impl BoardError {
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// The gateway error behind this failure, if any.
    pub fn gateway(&self) -> Option<&GatewayError> {
        match self {
            Self::Gateway(e) => Some(e),
            _ => None,
        }
    }
}
