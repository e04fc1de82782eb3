//! Error types for fintrack-core
//!
//! Errors here abort a whole fetch-and-shape run. Problems with a single
//! record are not errors; see [`crate::normalize::SkipReason`].

use fintrack_notion::NotionError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error codes for programmatic error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Remote source rejected the credentials
    Unauthorized,
    /// Transport or API failure talking to the remote source
    SourceError,
    /// Required setting missing
    NotConfigured,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCode::Unauthorized => write!(f, "UNAUTHORIZED"),
            ErrorCode::SourceError => write!(f, "SOURCE_ERROR"),
            ErrorCode::NotConfigured => write!(f, "NOT_CONFIGURED"),
        }
    }
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetails {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    /// Suggestions for resolution
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

impl ErrorDetails {
    pub fn new(code: ErrorCode, message: String) -> Self {
        Self {
            code,
            message,
            details: None,
            suggestions: vec![],
        }
    }

    pub fn with_detail(mut self, detail: serde_json::Value) -> Self {
        self.details = Some(detail);
        self
    }

    pub fn with_suggestion(mut self, suggestion: String) -> Self {
        self.suggestions.push(suggestion);
        self
    }
}

impl std::fmt::Display for ErrorDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(ref details) = self.details {
            write!(f, "\nDetails: {}", details)?;
        }
        if !self.suggestions.is_empty() {
            write!(f, "\nSuggestions:")?;
            for suggestion in &self.suggestions {
                write!(f, "\n  - {}", suggestion)?;
            }
        }
        Ok(())
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorSeverity {
    /// Operation may be affected
    Warning,
    /// Operation failed
    Error,
    /// Nothing will work until fixed
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Warning => write!(f, "warning"),
            ErrorSeverity::Error => write!(f, "error"),
            ErrorSeverity::Critical => write!(f, "critical"),
        }
    }
}

/// Main error type for fintrack-core
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Remote source error: {0}")]
    Source(#[from] NotionError),

    #[error("Not configured: {field}")]
    NotConfigured { field: String },
}

impl CoreError {
    /// Get the error code
    pub fn code(&self) -> ErrorCode {
        match self {
            CoreError::Source(e) if e.is_auth() => ErrorCode::Unauthorized,
            CoreError::Source(_) => ErrorCode::SourceError,
            CoreError::NotConfigured { .. } => ErrorCode::NotConfigured,
        }
    }

    /// Get the severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            CoreError::Source(e) if e.is_auth() => ErrorSeverity::Critical,
            CoreError::Source(_) => ErrorSeverity::Error,
            CoreError::NotConfigured { .. } => ErrorSeverity::Critical,
        }
    }

    /// Convert to detailed error info
    pub fn to_details(&self) -> ErrorDetails {
        let mut details = ErrorDetails::new(self.code(), self.to_string());

        match self {
            CoreError::Source(NotionError::Unauthorized { status }) => {
                details = details
                    .with_detail(serde_json::json!({ "status": status }))
                    .with_suggestion("Check that NOTION_TOKEN holds a valid integration token.".to_string())
                    .with_suggestion(
                        "Share the databases with the integration in the Notion UI.".to_string(),
                    );
            }
            CoreError::Source(NotionError::Api { status, .. }) => {
                details = details.with_detail(serde_json::json!({ "status": status }));
                if *status == 404 {
                    details = details.with_suggestion(
                        "Check the database ids in the configuration.".to_string(),
                    );
                }
            }
            CoreError::NotConfigured { field } => {
                details = details.with_suggestion(format!(
                    "Set '{}' in config.yaml or the environment.",
                    field
                ));
            }
            _ => {}
        }

        details
    }
}

/// Result type with CoreError
pub type CoreResult<T> = Result<T, CoreError>;
