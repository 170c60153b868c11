use thiserror::Error;

#[derive(Error, Debug)]
pub enum RouterError {
    #[error("Weight artifact error: {0}")]
    Artifact(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type RouterResult<T> = Result<T, RouterError>;
