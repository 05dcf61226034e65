// src/error.rs

//! Unified error handling for the harvester.

use std::fmt;

use thiserror::Error;

/// Result type alias for harvester operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// Remote content could not be retrieved
    #[error("Transport error: {0}")]
    Transport(FetchError),

    /// Remote content exceeded the allowed payload size
    #[error("Remote file is too big for {url}: allowed {max_bytes} bytes, got {}", describe_actual(.actual))]
    SizeLimitExceeded {
        url: String,
        max_bytes: u64,
        actual: Option<u64>,
    },

    /// Page or record content could not be parsed
    #[error("Error parsing {context}: {message}")]
    Parse { context: String, message: String },

    /// The catalog rejected a record
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Another run changed the current item for this guid
    #[error("Current item for guid {guid} changed concurrently")]
    Conflict { guid: String },

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP client could not be built
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl AppError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a parse error with context.
    pub fn parse(context: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Parse {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Whether this error ends the whole run rather than a single item.
    pub fn is_run_level(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::SizeLimitExceeded { .. } | Self::Config(_)
        )
    }
}

impl From<FetchError> for AppError {
    fn from(err: FetchError) -> Self {
        match err.kind {
            FailureKind::TooLarge { max_bytes, actual } => Self::SizeLimitExceeded {
                url: err.url,
                max_bytes,
                actual,
            },
            _ => Self::Transport(err),
        }
    }
}

fn describe_actual(actual: &Option<u64>) -> String {
    actual.map_or_else(|| "more".to_string(), |n| n.to_string())
}

/// A classified failure to retrieve one page of content.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("could not get content from {url}: {kind} ({message})")]
pub struct FetchError {
    pub kind: FailureKind,
    pub url: String,
    pub message: String,
}

impl FetchError {
    pub fn new(kind: FailureKind, url: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            url: url.into(),
            message: message.into(),
        }
    }

    /// A 404 past the first page means the source ran out of pages.
    pub fn is_end_of_pagination(&self, page: u32) -> bool {
        page > 1 && self.kind == FailureKind::NotFound
    }
}

/// Failure categories the gather stage branches on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    NotFound,
    HttpStatus(u16),
    Connection,
    Timeout,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    MissingLocalFile,
    Io,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::NotFound => write!(f, "server responded with 404 Not Found"),
            FailureKind::HttpStatus(code) => write!(f, "server responded with {code}"),
            FailureKind::Connection => write!(f, "connection error"),
            FailureKind::Timeout => write!(f, "connection timed out"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "remote file is too big (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::MissingLocalFile => write!(f, "local file does not exist"),
            FailureKind::Io => write!(f, "i/o error"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn too_large_maps_to_size_limit() {
        let err = FetchError::new(
            FailureKind::TooLarge {
                max_bytes: 10,
                actual: None,
            },
            "http://example.com/catalog.json",
            "response too large",
        );
        let app: AppError = err.into();
        assert!(matches!(
            app,
            AppError::SizeLimitExceeded {
                max_bytes: 10,
                actual: None,
                ..
            }
        ));
        assert!(app.is_run_level());
    }

    #[test]
    fn not_found_ends_pagination_only_after_first_page() {
        let err = FetchError::new(FailureKind::NotFound, "http://example.com", "404");
        assert!(!err.is_end_of_pagination(1));
        assert!(err.is_end_of_pagination(2));

        let other = FetchError::new(FailureKind::HttpStatus(500), "http://example.com", "500");
        assert!(!other.is_end_of_pagination(3));
    }

    #[test]
    fn validation_is_item_level() {
        assert!(!AppError::validation("title missing").is_run_level());
    }
}
