//! Error types for repository operations

use std::time::Duration;

use chartsmith_core::ErrorKind;
use thiserror::Error;

/// Repository operation errors
#[derive(Debug, Error)]
pub enum RepoError {
    // ============ Configuration Errors ============
    #[error("Invalid repository URL: {url} - {reason}")]
    InvalidRepositoryUrl { url: String, reason: String },

    // ============ Network Errors ============
    #[error("HTTP error: {status} fetching {url}")]
    HttpError { status: u16, url: String },

    #[error("Network error: {message}")]
    NetworkError { message: String },

    #[error("Request to {url} timed out after {seconds}s")]
    Timeout { url: String, seconds: u64 },

    // ============ Index Errors ============
    #[error("Index parse error: {message}")]
    IndexParseError { message: String },

    // ============ Chart Errors ============
    #[error("Invalid chart name '{name}': must be a single path component")]
    InvalidChartName { name: String },

    #[error("Chart not found: {name} in repository {repo}")]
    ChartNotFound { name: String, repo: String },

    #[error("Version not found: {name}@{version} in repository {repo}")]
    VersionNotFound {
        name: String,
        version: String,
        repo: String,
    },

    #[error("No versions available for chart: {name}")]
    NoVersionsAvailable { name: String },

    // ============ Download Errors ============
    #[error("Integrity check failed for {name}: expected {expected}, got {actual}")]
    IntegrityCheckFailed {
        name: String,
        expected: String,
        actual: String,
    },

    #[error("Archive error: {message}")]
    Archive { message: String },

    #[error("Could not fetch {name}@{version}: {attempts}")]
    FetchFailed {
        name: String,
        version: String,
        attempts: String,
    },

    // ============ IO Errors ============
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for repository operations
pub type Result<T> = std::result::Result<T, RepoError>;

impl RepoError {
    /// Map a transport failure for `url` onto a repository error
    pub fn transport(e: reqwest::Error, url: &str, timeout: Duration) -> Self {
        if e.is_timeout() {
            RepoError::Timeout {
                url: url.to_string(),
                seconds: timeout.as_secs(),
            }
        } else if e.is_connect() {
            RepoError::NetworkError {
                message: format!("Connection to {} failed: {}", url, e),
            }
        } else if let Some(status) = e.status() {
            RepoError::HttpError {
                status: status.as_u16(),
                url: url.to_string(),
            }
        } else {
            RepoError::NetworkError {
                message: format!("{}: {}", url, e),
            }
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidRepositoryUrl { .. } => ErrorKind::Configuration,
            Self::HttpError { .. } | Self::NetworkError { .. } | Self::Timeout { .. } => {
                ErrorKind::Network
            }
            Self::IndexParseError { .. } => ErrorKind::Parse,
            Self::InvalidChartName { .. } => ErrorKind::Validation,
            Self::ChartNotFound { .. }
            | Self::VersionNotFound { .. }
            | Self::NoVersionsAvailable { .. } => ErrorKind::NotFound,
            Self::IntegrityCheckFailed { .. }
            | Self::Archive { .. }
            | Self::FetchFailed { .. }
            | Self::Io(_) => ErrorKind::Fetch,
        }
    }
}
