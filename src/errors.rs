use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("CONFIG_MISSING: {0}")]
    ConfigurationMissing(String),
    #[error("STORE_UNAVAILABLE: {0}")]
    StoreUnavailable(String),
    #[error("TABLE_NOT_FOUND: {0}")]
    TableNotFound(String),
    #[error("RECORD_NOT_FOUND: {0}")]
    RecordNotFound(String),
    #[error("VALIDATION_FAILED: {0}")]
    Validation(String),
    #[error("INTERNAL: {0}")]
    Internal(String),
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Internal(value.to_string())
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Internal(value.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(value: serde_json::Error) -> Self {
        Self::Internal(value.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(value: reqwest::Error) -> Self {
        Self::StoreUnavailable(value.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;
