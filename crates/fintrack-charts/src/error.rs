//! Error types for fintrack-charts

use fintrack_utils::FilenameError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("Invalid chart filename: {0}")]
    InvalidFilename(#[from] FilenameError),

    #[error("Could not write {path}: {message}")]
    Io { path: String, message: String },

    #[error("Could not serialise figure: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type ChartResult<T> = Result<T, ChartError>;
