use std::io;

use thiserror::Error;

/// Errors raised while building an [`AsyncWriter`](crate::AsyncWriter).
#[derive(Debug, Error)]
pub enum BuildError {
    /// Invalid user supplied configuration.
    #[error("invalid writer configuration: {0}")]
    InvalidConfig(String),
    /// The delivery thread could not be started.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Outcome of a connection attempt cycle that produced no connection.
#[derive(Debug, Error)]
pub enum ConnectError {
    /// Every dial in the retry budget failed.
    #[error("could not connect to the log collector after {attempts} attempts: {source}")]
    Exhausted {
        attempts: u32,
        #[source]
        source: io::Error,
    },
    /// The writer was cancelled while waiting to retry.
    #[error("connection attempt abandoned because the writer was cancelled")]
    Cancelled,
}
