use thiserror::Error;

/// Errors related to pool lifecycle and configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    #[error("pool has already been started")]
    AlreadyStarted,
    #[error("pool is not running")]
    NotRunning,
    #[error("configuration rejected: {0}")]
    ConfigurationRejected(&'static str),
    #[error("worker thread setup failed: {0}")]
    ThreadSetup(String),
}

/// Errors from extracting a typed value out of a [`Payload`](crate::payload::Payload).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    #[error("payload holds a value of a different type (requested {requested})")]
    TypeMismatch { requested: &'static str },
    #[error("payload is empty")]
    Empty,
}
