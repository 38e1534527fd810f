//! Error types for the cache server
//!
//! Provides unified error handling using thiserror.
//!
//! User-level bad input (blank key, duplicate key, missing key) is not an
//! error: engine operations report it through their boolean or optional
//! return value. The variants here cover the faults that actually abort
//! something - a connection, a frame, or startup.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache server.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Cache capacity must be at least 1; fatal at startup
    #[error("Invalid capacity: {0} (must be at least 1)")]
    InvalidCapacity(usize),

    /// Malformed JSON in the request stream; closes the connection
    #[error("Malformed frame: {0}")]
    MalformedFrame(#[from] serde_json::Error),

    /// Transport fault on a client socket
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// == Result Type Alias ==
/// Convenience Result type for the cache server.
pub type Result<T> = std::result::Result<T, CacheError>;
