use thiserror::Error;

#[derive(Error, Debug)]
pub enum RulebookRagError {
    #[error("Expected rulebook intentions, got {0}")]
    WrongTool(String),

    #[error("{0} intentions supplied (1..=2 allowed)")]
    IntentionCount(usize),
}

pub type RulebookRagResult<T> = Result<T, RulebookRagError>;
