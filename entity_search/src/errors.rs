use loreweave_models::Tool;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SearchError {
    /// A tool was selected but its storage handle was not supplied.
    /// This is a programmer error; the query aborts.
    #[error("Storage for selected tool '{}' was not provided", .0.as_str())]
    MissingStorage(Tool),
}

pub type SearchResult<T> = Result<T, SearchError>;
