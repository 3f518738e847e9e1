//! Error types for chart assembly

use std::path::PathBuf;

use chartsmith_core::{CoreError, ErrorKind};
use chartsmith_repo::RepoError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuildError {
    // ============ Configuration Errors ============
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Need source type for chart {chart}")]
    MissingSourceType { chart: String },

    #[error("Unknown source type '{kind}' for chart {chart}")]
    UnknownSourceType { chart: String, kind: String },

    // ============ Intent Errors ============
    #[error("Invalid chart intent: {message}")]
    InvalidIntent { message: String },

    #[error("Invalid chart name '{name}': must be a single path component")]
    InvalidChartName { name: String },

    // ============ Source Errors ============
    #[error("Chart source directory not found: {}", path.display())]
    SourceNotFound { path: PathBuf },

    #[error("Invalid subpath '{subpath}': must be relative and stay inside the chart source")]
    InvalidSubpath { subpath: String },

    // ============ Chart Content Errors ============
    #[error("Missing {file} in chart {chart}")]
    MissingFile { chart: String, file: String },

    #[error("Invalid {file} in chart {chart}: {source}")]
    InvalidChartFile {
        chart: String,
        file: String,
        #[source]
        source: CoreError,
    },

    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ============ Dependency Errors ============
    #[error("Circular dependency detected: {chain}")]
    CircularDependency { chain: String },

    #[error("Dependency depth exceeds {max_depth} at chart {chart}")]
    DepthExceeded { chart: String, max_depth: usize },

    // ============ Wrapped Errors ============
    #[error(transparent)]
    Repo(#[from] RepoError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BuildError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidConfig { .. }
            | Self::MissingSourceType { .. }
            | Self::UnknownSourceType { .. } => ErrorKind::Configuration,
            Self::InvalidIntent { .. }
            | Self::InvalidChartName { .. }
            | Self::InvalidSubpath { .. }
            | Self::CircularDependency { .. }
            | Self::DepthExceeded { .. } => ErrorKind::Validation,
            Self::SourceNotFound { .. } => ErrorKind::NotFound,
            Self::MissingFile { .. } => ErrorKind::MissingFile,
            Self::InvalidChartFile { source, .. } => source.kind(),
            Self::Read { .. } | Self::Io(_) => ErrorKind::Fetch,
            Self::Repo(e) => e.kind(),
            Self::Core(e) => e.kind(),
        }
    }
}

pub type Result<T> = std::result::Result<T, BuildError>;
