//! Sandbox error types.

use thiserror::Error;

/// The underlying cause of a failed script execution.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScriptFault {
    /// The script could not be parsed.
    #[error("syntax error at offset {offset}: {message}")]
    Syntax {
        /// Byte offset into the script.
        offset: usize,
        /// What the parser expected.
        message: String,
    },

    /// The script raised an error while running.
    #[error("runtime error: {0}")]
    Runtime(String),

    /// The script exceeded a resource limit.
    #[error("limit exceeded: {0}")]
    LimitExceeded(String),
}

/// Error returned by `RuleSandbox`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SandboxError {
    /// The safety gate refused the script; it was never executed.
    #[error("unsafe script rejected: {reason}")]
    UnsafeScript {
        /// Which rule matched.
        reason: String,
    },

    /// An approved script failed while executing.
    #[error("script execution failed: {0}")]
    Execution(#[from] ScriptFault),

    /// Cancellation was observed before or during execution.
    #[error("script execution cancelled")]
    Cancelled,
}
