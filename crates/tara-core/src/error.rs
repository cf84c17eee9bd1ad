//! Unified Error Model
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TaraError {
    #[error("STORE/{0}")]
    StoreError(String),

    #[error("ADVISORY/{0}")]
    AdvisoryError(String),

    #[error("INPUT/{0}")]
    InputError(String),

    #[error("SERIALIZE/{0}")]
    SerializeError(String),

    #[error("CONFIG/{0}")]
    ConfigError(String),
}

impl From<serde_json::Error> for TaraError {
    fn from(err: serde_json::Error) -> Self {
        TaraError::SerializeError(err.to_string())
    }
}
