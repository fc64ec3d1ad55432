// core/engine/src/error.rs

use thiserror::Error;

/// Failures raised by a `DataSource`
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store unreachable: {0}")]
    Unreachable(String),

    #[error("Malformed record: {0}")]
    Malformed(String),

    #[error("Store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store payload could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Data fetch failed: {0}")]
    Store(#[from] StoreError),

    #[error("Project {0} is not part of the fitted project set")]
    UnknownProject(String),

    #[error("Invalid ranking parameters: {0}")]
    InvalidConfig(String),
}

impl EngineError {
    /// Short classification used in logs and error payloads
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::Store(_) => "store",
            EngineError::UnknownProject(_) => "internal",
            EngineError::InvalidConfig(_) => "config",
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
