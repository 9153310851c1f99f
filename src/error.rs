//! Error types for tallyd

use thiserror::Error;

/// Main error type for tallyd operations
#[derive(Error, Debug)]
pub enum TallydError {
    #[error("Invalid camera id: {camera} (cameras are numbered from 1)")]
    InvalidCamera { camera: u32 },

    #[error("Invalid tally kind: {kind:?}")]
    InvalidKind { kind: String },

    #[error("Observer is already registered")]
    DuplicateObserver,

    #[error("Malformed control message: {message}")]
    MalformedMessage { message: String },

    #[error("Invalid configuration: {message}")]
    Config { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for tallyd operations
pub type Result<T> = std::result::Result<T, TallydError>;
