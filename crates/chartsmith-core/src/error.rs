//! Core error types

use thiserror::Error;

/// Error taxonomy shared by every Chartsmith crate
///
/// Each crate keeps its own error enum; `kind()` on those enums maps a
/// concrete failure onto one of these categories so callers can branch
/// without matching every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Invalid or incomplete caller-supplied configuration
    Configuration,
    /// A chart, version or directory does not exist
    NotFound,
    /// Transport failure, timeout or non-2xx response
    Network,
    /// Malformed YAML/JSON content
    Parse,
    /// Every archive URL for a chart failed
    Fetch,
    /// A required chart file is absent
    MissingFile,
    /// Structurally valid input that violates a rule
    Validation,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Configuration => "configuration",
            Self::NotFound => "not-found",
            Self::Network => "network",
            Self::Parse => "parse",
            Self::Fetch => "fetch",
            Self::MissingFile => "missing-file",
            Self::Validation => "validation",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid value path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("Expected a mapping for {context}, found {found}")]
    NotAMapping { context: String, found: String },

    #[error("Invalid override '{arg}'. Expected key=value")]
    InvalidOverride { arg: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Invalid chart metadata: {message}")]
    InvalidMetadata { message: String },
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidPath { .. }
            | Self::NotAMapping { .. }
            | Self::InvalidOverride { .. } => ErrorKind::Validation,
            Self::InvalidMetadata { .. } | Self::YamlParse(_) | Self::JsonParse(_) => {
                ErrorKind::Parse
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
