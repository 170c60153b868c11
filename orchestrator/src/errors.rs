use loreweave_models::ModelError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    /// Unknown character, malformed query: no downstream work happens
    #[error("Unknown character: {0}")]
    UnknownCharacter(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Both routing LLM calls failed after repair
    #[error("Routing failed: {0}")]
    RoutingFailed(String),

    #[error("Provider error: {0}")]
    Provider(#[from] crate::providers::ProviderError),

    #[error(transparent)]
    Model(#[from] ModelError),

    /// Missing storage, registry inconsistency, corpus violation
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<entity_search::SearchError> for EngineError {
    fn from(e: entity_search::SearchError) -> Self {
        EngineError::Internal(e.to_string())
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
