//! Error types for workbuf.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// A synchronization structure could not be allocated at setup time.
    #[error("out of memory: {0}")]
    OutOfMemory(String),

    #[error("configuration error: {0}")]
    Config(String),

    /// A harness run finished but its bookkeeping does not add up.
    #[error("harness error: {0}")]
    Harness(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;
