//! Error types for the cache
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for cache operations.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Key absent, or present but already expired
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Arithmetic or typed read attempted on a value of the wrong kind
    #[error("The value for {key} is not {expected}")]
    WrongType {
        key: String,
        expected: &'static str,
    },

    /// A stored value cannot be represented in the snapshot format
    #[error("Cannot encode value of type {type_name} stored under key {key}")]
    Unencodable { key: String, type_name: String },

    /// Snapshot encoding or decoding failed
    #[error("Snapshot codec error: {0}")]
    Codec(String),

    /// Snapshot header is missing, foreign, or from an unknown version
    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),

    /// File or stream I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Operation exists only on network-backed caches
    #[error("{0} is not supported by the in-memory cache")]
    Unsupported(&'static str),

    /// Rejected configuration value
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A janitor was requested outside of a tokio runtime
    #[error("A cleanup interval requires a running tokio runtime")]
    NoRuntime,
}

impl From<bincode::Error> for CacheError {
    fn from(err: bincode::Error) -> Self {
        match *err {
            bincode::ErrorKind::Io(io) => CacheError::Io(io),
            other => CacheError::Codec(other.to_string()),
        }
    }
}

// == Result Type Alias ==
/// Convenience Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bincode_io_error_unwraps_to_io() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
        let err: CacheError = bincode::Error::from(bincode::ErrorKind::Io(io)).into();
        assert!(matches!(err, CacheError::Io(ref e) if e.kind() == std::io::ErrorKind::BrokenPipe));
    }

    #[test]
    fn test_bincode_codec_error_keeps_message() {
        let err: CacheError = bincode::Error::from(bincode::ErrorKind::Custom(
            "bad tag".to_string(),
        ))
        .into();
        assert!(matches!(err, CacheError::Codec(ref msg) if msg.contains("bad tag")));
    }

    #[test]
    fn test_wrong_type_message_names_key() {
        let err = CacheError::WrongType {
            key: "counter".to_string(),
            expected: "an integer",
        };
        assert_eq!(err.to_string(), "The value for counter is not an integer");
    }
}
