use thiserror::Error;

/// Failures a log query can surface to its caller.
///
/// Unreadable sources and malformed records are recovered locally and never
/// show up here.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LogsError {
    #[error("Unknown service: {0}")]
    UnknownService(String),

    #[error("Log query aborted")]
    Aborted,
}

pub type Result<T> = std::result::Result<T, LogsError>;
