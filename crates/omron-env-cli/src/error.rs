//! Error types for the host bridge.

use omron_env_protocol::ProtocolError;
use thiserror::Error;

/// Errors that can occur in the bridge or the command line tool.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Frame building or parsing failed.
    #[error("{0}")]
    Protocol(#[from] ProtocolError),

    /// I/O error reading a file or stdin.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_yaml::Error),

    /// Output could not be serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A chunk given on the command line is not valid hex.
    #[error("invalid hex chunk: {0}")]
    Hex(#[from] hex::FromHexError),
}

/// Result type alias for bridge operations.
pub type BridgeResult<T> = Result<T, BridgeError>;
