//! Error kinds for taskcraft operations

use std::fmt;

/// The kind of error that occurred.
///
/// This enum categorizes errors to help users write clear error handling logic.
/// Users can match on ErrorKind to decide how to handle specific error cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    // =========================================================================
    // General errors
    // =========================================================================
    /// An unexpected error occurred - catch-all for unhandled cases
    Unexpected,

    /// The requested feature or operation is not supported
    Unsupported,

    /// Invalid configuration or parameters
    ConfigInvalid,

    // =========================================================================
    // Tool errors
    // =========================================================================
    /// The requested tool is not registered with the provider
    ToolNotFound,

    /// The tool executed but reported a failure
    ToolFailed,

    /// The tool provider cannot be reached
    ToolUnavailable,

    // =========================================================================
    // Variables errors
    // =========================================================================
    /// The named variable is not present in the registry
    VariableNotFound,

    // =========================================================================
    // Script / evaluation errors
    // =========================================================================
    /// Failed to parse an action script
    ParseFailed,

    /// Script evaluation exceeded the wall-clock bound
    EvalTimeout,

    /// Script evaluation failed
    EvalFailed,

    /// Execution was interrupted by the caller
    Interrupted,

    /// The reasoning loop hit its recursion limit
    RecursionLimit,

    // =========================================================================
    // Inference / LLM errors
    // =========================================================================
    /// LLM inference failed
    InferenceFailed,

    /// Provider not available
    ProviderUnavailable,

    /// Rate limit exceeded
    RateLimited,

    /// Context too large for model
    ContextTooLarge,

    // =========================================================================
    // Mail / storage errors
    // =========================================================================
    /// Mailbox operation failed
    MailboxFailed,

    /// The requested message was not found
    MessageNotFound,

    /// Serialization/deserialization failed
    SerializationFailed,

    // =========================================================================
    // IO errors
    // =========================================================================
    /// File not found
    FileNotFound,

    /// Permission denied
    PermissionDenied,

    /// IO operation failed
    IoFailed,

    /// Network error
    NetworkFailed,

    // =========================================================================
    // Misc
    // =========================================================================
    /// Invalid argument passed to function
    InvalidArgument,
}

impl ErrorKind {
    /// Returns the error kind as a static string
    pub fn as_str(&self) -> &'static str {
        match self {
            // General
            ErrorKind::Unexpected => "Unexpected",
            ErrorKind::Unsupported => "Unsupported",
            ErrorKind::ConfigInvalid => "ConfigInvalid",

            // Tools
            ErrorKind::ToolNotFound => "ToolNotFound",
            ErrorKind::ToolFailed => "ToolFailed",
            ErrorKind::ToolUnavailable => "ToolUnavailable",

            // Variables
            ErrorKind::VariableNotFound => "VariableNotFound",

            // Script / evaluation
            ErrorKind::ParseFailed => "ParseFailed",
            ErrorKind::EvalTimeout => "EvalTimeout",
            ErrorKind::EvalFailed => "EvalFailed",
            ErrorKind::Interrupted => "Interrupted",
            ErrorKind::RecursionLimit => "RecursionLimit",

            // Inference
            ErrorKind::InferenceFailed => "InferenceFailed",
            ErrorKind::ProviderUnavailable => "ProviderUnavailable",
            ErrorKind::RateLimited => "RateLimited",
            ErrorKind::ContextTooLarge => "ContextTooLarge",

            // Mail / storage
            ErrorKind::MailboxFailed => "MailboxFailed",
            ErrorKind::MessageNotFound => "MessageNotFound",
            ErrorKind::SerializationFailed => "SerializationFailed",

            // IO
            ErrorKind::FileNotFound => "FileNotFound",
            ErrorKind::PermissionDenied => "PermissionDenied",
            ErrorKind::IoFailed => "IoFailed",
            ErrorKind::NetworkFailed => "NetworkFailed",

            // Misc
            ErrorKind::InvalidArgument => "InvalidArgument",
        }
    }

    /// Check if this error kind is retryable by default
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorKind::InferenceFailed
                | ErrorKind::NetworkFailed
                | ErrorKind::RateLimited
                | ErrorKind::EvalTimeout
                | ErrorKind::ProviderUnavailable
                | ErrorKind::ToolUnavailable
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_display() {
        assert_eq!(ErrorKind::ToolNotFound.to_string(), "ToolNotFound");
        assert_eq!(ErrorKind::InferenceFailed.to_string(), "InferenceFailed");
    }

    #[test]
    fn test_is_retryable() {
        assert!(ErrorKind::NetworkFailed.is_retryable());
        assert!(ErrorKind::RateLimited.is_retryable());
        assert!(ErrorKind::EvalTimeout.is_retryable());
        assert!(!ErrorKind::ToolNotFound.is_retryable());
        assert!(!ErrorKind::VariableNotFound.is_retryable());
    }
}
