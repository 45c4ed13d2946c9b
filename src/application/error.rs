//! Application-level errors (wraps domain errors)

use thiserror::Error;

use crate::application::player::PlaybackError;
use crate::application::schema::SchemaError;
use crate::domain::DomainError;

/// Application errors wrap domain errors and add application-level context.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("{0}")]
    Schema(#[from] SchemaError),

    #[error("playback: {0}")]
    Playback(#[from] PlaybackError),

    #[error("config error: {message}")]
    Config { message: String },

    #[error("search response contains no recipes")]
    NoRecipes,

    #[error("recipe {index} out of range (response has {total})")]
    RecipeOutOfRange { index: usize, total: usize },

    #[error("step {index} out of range (timeline has {total})")]
    StepOutOfRange { index: usize, total: usize },

    #[error("operation failed: {context}")]
    OperationFailed {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
