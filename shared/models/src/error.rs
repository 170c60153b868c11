use thiserror::Error;

/// Errors raised while constructing or validating model types.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Corpus integrity violation: {0}")]
    CorpusIntegrity(String),

    #[error("Unknown intention '{intention}' for tool '{tool}'")]
    UnknownIntention { tool: String, intention: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type ModelResult<T> = Result<T, ModelError>;
