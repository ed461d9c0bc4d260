use thiserror::Error;

#[derive(Debug, Error)]
pub enum DrillError {
    #[error("failed to decode persisted state: {0}")]
    Deserialize(#[from] serde_json::Error),

    #[error("invalid persisted state: {0}")]
    InvalidData(String),

    #[error("invalid dataset: {0}")]
    Dataset(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DrillError>;
