//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent invalid input at the edge of the engine.
///
/// Data-shape anomalies inside record lists never show up here: the tree
/// builder degrades to leaves instead (see [`crate::domain::Anomaly`]).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid combination '{text}': {reason}")]
    InvalidRecordText { text: String, reason: String },

    #[error("please enter an item name to search for")]
    EmptyTarget,

    #[error("'{0}' is a primitive item and has no recipe")]
    PrimitiveTarget(String),

    #[error("unknown item: {0}")]
    UnknownTarget(String),

    #[error("unknown search algorithm '{0}' (expected bfs, dfs or bidirectional)")]
    UnknownAlgorithm(String),

    #[error("recipe count must be between 1 and {max}, got {count}")]
    InvalidRecipeCount { count: u32, max: u32 },
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
