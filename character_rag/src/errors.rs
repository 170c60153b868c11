use thiserror::Error;

#[derive(Error, Debug)]
pub enum CharacterRagError {
    #[error("Expected character_data intentions, got {0}")]
    WrongTool(String),

    #[error("{0} intentions supplied (1..=2 allowed)")]
    IntentionCount(usize),
}

pub type CharacterRagResult<T> = Result<T, CharacterRagError>;
