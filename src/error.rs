//! Error types for the vector store

use thiserror::Error;

/// Result type alias for store operations
pub type Result<T> = std::result::Result<T, VectorDbError>;

/// Error types that can occur in registry and collection operations
#[derive(Error, Debug)]
pub enum VectorDbError {
    #[error("Collection already exists: {name}")]
    CollectionAlreadyExists { name: String },

    #[error("Collection not found: {name}")]
    CollectionNotFound { name: String },

    #[error("Invalid collection name: {reason}")]
    InvalidCollectionName { reason: String },

    #[error("Length mismatch: expected {expected} {field}, got {actual}")]
    LengthMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid argument: {reason}")]
    InvalidArgument { reason: String },

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Invalid vector: {reason}")]
    InvalidVector { reason: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}
