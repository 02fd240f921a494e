//! CodeAct runtime error types
//!
//! Re-exports taskcraft-error and provides runtime-specific conveniences.

// Re-export the core error types
pub use taskcraft_error::{Error, ErrorKind, ErrorStatus, Result};

// =============================================================================
// Runtime-specific error constructors
// =============================================================================

/// Create a ToolNotFound error
pub fn tool_not_found(name: impl Into<String>) -> Error {
    Error::tool_not_found(name)
}

/// Create a ToolFailed error
pub fn tool_failed(name: impl Into<String>, reason: impl Into<String>) -> Error {
    Error::tool_failed(name, reason)
}

/// Create a ToolUnavailable error
pub fn tool_unavailable(reason: impl Into<String>) -> Error {
    Error::new(ErrorKind::ToolUnavailable, reason)
}

/// Create a VariableNotFound error
pub fn variable_not_found(name: impl Into<String>) -> Error {
    Error::variable_not_found(name)
}

/// Create an InferenceFailed error
pub fn inference_failed(reason: impl Into<String>) -> Error {
    Error::inference_failed(reason)
}

/// Create a ProviderUnavailable error
pub fn provider_unavailable(reason: impl Into<String>) -> Error {
    Error::new(ErrorKind::ProviderUnavailable, reason)
}

/// Create an EvalTimeout error
pub fn eval_timeout(seconds: u64) -> Error {
    Error::eval_timeout(seconds)
}

/// Create an EvalFailed error
pub fn eval_failed(reason: impl Into<String>) -> Error {
    Error::eval_failed(reason)
}

/// Create a ParseFailed error
pub fn parse_error(message: impl Into<String>) -> Error {
    Error::parse_failed(message)
}

/// Create a ConfigInvalid error
pub fn config_invalid(message: impl Into<String>) -> Error {
    Error::new(ErrorKind::ConfigInvalid, message)
}

/// Create an InvalidArgument error
pub fn invalid_argument(message: impl Into<String>) -> Error {
    Error::new(ErrorKind::InvalidArgument, message)
}

/// Create a SerializationFailed error
pub fn serialization_error(message: impl Into<String>) -> Error {
    Error::new(ErrorKind::SerializationFailed, message)
}

/// Create an IoFailed error
pub fn io_error(message: impl Into<String>) -> Error {
    Error::new(ErrorKind::IoFailed, message)
}

/// Create a NetworkFailed error
pub fn network_error(message: impl Into<String>) -> Error {
    Error::new(ErrorKind::NetworkFailed, message)
}
