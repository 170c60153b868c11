use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionRagError {
    #[error("Expected session_notes intentions, got {0}")]
    WrongTool(String),

    #[error("{0} intentions supplied (1..=2 allowed)")]
    IntentionCount(usize),
}

pub type SessionRagResult<T> = Result<T, SessionRagError>;
