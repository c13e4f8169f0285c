//! Crate-wide error type.
//!
//! One variant per failure kind: validation, tool execution, model call,
//! transfer, budget, callback, output-schema, session, and
//! internal/invariant errors — typed variants callers can branch on rather
//! than a stringly-typed catch-all. Stays a plain `thiserror` enum since
//! this crate has no wire protocol to map error codes onto.

use thiserror::Error;

/// Stable machine-readable error codes surfaced on error `Event`s.
///
/// These are the `errorCode` values spec.md §7/§8 requires callers to be
/// able to match on (e.g. `OUTPUT_SCHEMA_VALIDATION_FAILED`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    Validation,
    ToolExecution,
    ModelCall,
    InvalidTransferTarget,
    TransferLimit,
    LlmCallsLimitExceeded,
    Callback,
    OutputSchemaValidationFailed,
    Session,
    Internal,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::Validation => "VALIDATION_ERROR",
            ErrorCode::ToolExecution => "TOOL_EXECUTION_ERROR",
            ErrorCode::ModelCall => "MODEL_CALL_ERROR",
            ErrorCode::InvalidTransferTarget => "INVALID_TRANSFER_TARGET",
            ErrorCode::TransferLimit => "TRANSFER_LIMIT_EXCEEDED",
            ErrorCode::LlmCallsLimitExceeded => "LLM_CALLS_LIMIT_EXCEEDED",
            ErrorCode::Callback => "CALLBACK_ERROR",
            ErrorCode::OutputSchemaValidationFailed => "OUTPUT_SCHEMA_VALIDATION_FAILED",
            ErrorCode::Session => "SESSION_ERROR",
            ErrorCode::Internal => "INTERNAL_ERROR",
        }
    }
}

#[derive(Error, Debug, Clone)]
#[non_exhaustive]
pub enum AgentError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("tool '{tool}' execution failed: {reason}")]
    ToolExecution { tool: String, reason: String },

    #[error("tool '{0}' not found")]
    ToolNotFound(String),

    #[error("model call failed: {0}")]
    ModelCall(String),

    #[error("transfer target '{0}' not found or reserved")]
    InvalidTransferTarget(String),

    #[error("transfer depth {depth} exceeds configured max {max}")]
    TransferLimit { depth: u32, max: u32 },

    #[error("LLM call budget exceeded: {used}/{max}")]
    LlmCallsLimitExceeded { used: u32, max: u32 },

    #[error("callback failed: {0}")]
    Callback(String),

    #[error("output schema validation failed: {0}")]
    OutputSchemaValidationFailed(String),

    #[error("session error: {0}")]
    Session(String),

    #[error("internal runtime invariant violated: {0}")]
    Internal(String),
}

impl AgentError {
    pub fn code(&self) -> ErrorCode {
        match self {
            AgentError::Validation(_) => ErrorCode::Validation,
            AgentError::ToolExecution { .. } | AgentError::ToolNotFound(_) => {
                ErrorCode::ToolExecution
            }
            AgentError::ModelCall(_) => ErrorCode::ModelCall,
            AgentError::InvalidTransferTarget(_) => ErrorCode::InvalidTransferTarget,
            AgentError::TransferLimit { .. } => ErrorCode::TransferLimit,
            AgentError::LlmCallsLimitExceeded { .. } => ErrorCode::LlmCallsLimitExceeded,
            AgentError::Callback(_) => ErrorCode::Callback,
            AgentError::OutputSchemaValidationFailed(_) => {
                ErrorCode::OutputSchemaValidationFailed
            }
            AgentError::Session(_) => ErrorCode::Session,
            AgentError::Internal(_) => ErrorCode::Internal,
        }
    }
}

impl From<serde_json::Error> for AgentError {
    fn from(e: serde_json::Error) -> Self {
        AgentError::Validation(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AgentError>;
