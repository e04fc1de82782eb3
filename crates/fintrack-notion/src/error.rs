//! Error types for fintrack-notion

use thiserror::Error;

#[derive(Error, Debug)]
pub enum NotionError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unauthorized: the Notion API rejected the token (HTTP {status})")]
    Unauthorized { status: u16 },

    #[error("Notion API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Could not decode response for {source_id}: {message}")]
    Decode { source_id: String, message: String },

    #[error("Server reported more pages for {source_id} but sent no cursor")]
    MissingCursor { source_id: String },

    #[error("Unknown source: {source_id}")]
    UnknownSource { source_id: String },
}

impl NotionError {
    /// True for failures caused by credentials rather than data or transport
    pub fn is_auth(&self) -> bool {
        matches!(self, NotionError::Unauthorized { .. })
    }
}
