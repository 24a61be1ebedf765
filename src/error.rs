use thiserror::Error;

use crate::upload::UploadStage;

#[derive(Error, Debug)]
pub enum PathError {
    #[error("Invalid locator {locator:?}: {reason}")]
    InvalidLocator { locator: String, reason: String },

    #[error("Coordinate out of range: lat {lat}, lon {lon}")]
    InvalidCoordinate { lat: f64, lon: f64 },

    #[error("Invalid frequency: {0:?}")]
    InvalidFrequency(String),

    #[error("Line {line}: expected {expected} columns, found {found}")]
    SchemaMismatch {
        line: u64,
        expected: usize,
        found: usize,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Upload failed after {stage}: {message}")]
    Upload { stage: UploadStage, message: String },
}

impl PathError {
    pub(crate) fn invalid_locator(locator: &str, reason: impl Into<String>) -> Self {
        PathError::InvalidLocator {
            locator: locator.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<toml::de::Error> for PathError {
    fn from(err: toml::de::Error) -> Self {
        PathError::Config(format!("TOML parse error: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, PathError>;
