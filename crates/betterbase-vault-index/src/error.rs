use thiserror::Error;

#[derive(Debug, Error)]
pub enum IndexError {
    /// The query normalizes to nothing searchable. Matching it would
    /// trivially succeed against every index, so it is rejected.
    #[error("Query is empty after normalization")]
    EmptyQuery,

    #[error("Invalid bloom parameters: {0}")]
    InvalidParams(String),

    #[error("Invalid bloom bit array: expected {expected} bytes, got {got}")]
    InvalidBloomLength { expected: usize, got: usize },
}

pub type Result<T> = std::result::Result<T, IndexError>;
