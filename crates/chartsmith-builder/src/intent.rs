//! Chart intents: what to build and where its content comes from
//!
//! ```yaml
//! name: mongodb
//! version: 0.4.0
//! source:
//!   type: repo
//!   location: https://charts.example.com/stable
//! ```

use std::path::{Path, PathBuf};

use chartsmith_core::chart::scalar_serde;
use serde::{Deserialize, Serialize};

use crate::error::{BuildError, Result};

/// A chart to assemble
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChartIntent {
    pub name: String,

    /// Version to fetch for `repo` sources when the source carries none
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "scalar_serde::optional"
    )]
    pub version: Option<String>,

    pub source: SourceDescriptor,
}

/// Where chart content lives
///
/// `kind` stays a free-form string here so a missing or misspelled type
/// is reported as a configuration problem rather than a parse failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceDescriptor {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    /// Directory path or repository URL
    pub location: String,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "scalar_serde::optional"
    )]
    pub version: Option<String>,

    /// Path below the resolved root holding the chart
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subpath: Option<String>,
}

/// Validated source type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Directory,
    Repo,
}

impl ChartIntent {
    /// Intent for a chart in a local directory
    pub fn directory(name: impl Into<String>, location: impl AsRef<Path>) -> Self {
        Self {
            name: name.into(),
            version: None,
            source: SourceDescriptor {
                kind: Some("directory".to_string()),
                location: location.as_ref().to_string_lossy().into_owned(),
                version: None,
                subpath: None,
            },
        }
    }

    /// Intent for a chart fetched from a repository
    pub fn repo(
        name: impl Into<String>,
        location: impl Into<String>,
        version: Option<String>,
    ) -> Self {
        Self {
            name: name.into(),
            version: None,
            source: SourceDescriptor {
                kind: Some("repo".to_string()),
                location: location.into(),
                version,
                subpath: None,
            },
        }
    }

    /// Parse an intent from YAML (JSON is accepted too)
    pub fn from_yaml(text: &str) -> Result<Self> {
        let intent: Self = serde_yaml::from_str(text).map_err(|e| BuildError::InvalidIntent {
            message: e.to_string(),
        })?;
        intent.validate_name()?;
        Ok(intent)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| BuildError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_yaml(&content)
    }

    pub fn with_subpath(mut self, subpath: impl Into<String>) -> Self {
        self.source.subpath = Some(subpath.into());
        self
    }

    /// The name must be one path component; it names directories in workspaces
    pub fn validate_name(&self) -> Result<()> {
        if chartsmith_core::layout::is_chart_name(&self.name) {
            Ok(())
        } else {
            Err(BuildError::InvalidChartName {
                name: self.name.clone(),
            })
        }
    }

    /// Version requested from a repository: the source's, else the intent's
    pub fn effective_version(&self) -> Option<&str> {
        self.source
            .version
            .as_deref()
            .or(self.version.as_deref())
    }

    pub fn source_kind(&self) -> Result<SourceKind> {
        match self.source.kind.as_deref() {
            None => Err(BuildError::MissingSourceType {
                chart: self.name.clone(),
            }),
            Some("directory") => Ok(SourceKind::Directory),
            Some("repo") => Ok(SourceKind::Repo),
            Some(other) => Err(BuildError::UnknownSourceType {
                chart: self.name.clone(),
                kind: other.to_string(),
            }),
        }
    }

    /// The subpath, checked to be relative and free of `..`
    pub fn subpath(&self) -> Result<Option<PathBuf>> {
        let Some(subpath) = self.source.subpath.as_deref() else {
            return Ok(None);
        };

        let path = PathBuf::from(subpath);
        if !chartsmith_core::layout::is_contained(&path) {
            return Err(BuildError::InvalidSubpath {
                subpath: subpath.to_string(),
            });
        }
        Ok(Some(path))
    }
}
