use thiserror::Error;

/// Top-level error type for the weave-core library.
#[derive(Debug, Error)]
pub enum WeaveError {
    /// Malformed workflow request: duplicate id, dangling dependency, cycle,
    /// unknown agent type, or a non-positive timeout. Never retried.
    #[error("validation error: {0}")]
    Validation(String),

    /// A tool/agent invocation raised or returned a failure.
    #[error("agent failure: {0}")]
    AgentFailure(String),

    /// A per-attempt deadline was exceeded.
    #[error("timeout: {0}")]
    Timeout(String),

    /// Cancellation was observed mid-flight.
    #[error("cancelled: {0}")]
    Cancelled(String),

    /// `agent_type` or tool name not found in a registry.
    #[error("registry error: {0}")]
    Registry(String),

    /// Configuration parse or validation error.
    #[error("config error: {0}")]
    Config(String),

    /// Invariant violation that should never happen in correct code.
    #[error("internal error: {0}")]
    Internal(String),

    /// Wraps `std::io::Error`.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the library.
pub type Result<T> = std::result::Result<T, WeaveError>;
