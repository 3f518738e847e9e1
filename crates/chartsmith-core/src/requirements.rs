//! `requirements.yaml` parsing

use serde::{Deserialize, Serialize};

use crate::chart::scalar_serde;
use crate::error::Result;

/// A chart's declared direct dependencies
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirements {
    #[serde(default)]
    pub dependencies: Vec<DependencyDeclaration>,
}

/// One dependency entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyDeclaration {
    pub name: String,

    /// Exact version to fetch from the repository
    #[serde(deserialize_with = "scalar_serde::required")]
    pub version: String,

    /// Repository URL holding an `index.yaml`
    pub repository: String,
}

impl Requirements {
    /// Parse `requirements.yaml`; empty or comment-only documents declare nothing
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }

        match serde_yaml::from_str::<serde_yaml::Value>(yaml)? {
            serde_yaml::Value::Null => Ok(Self::default()),
            document => Ok(serde_yaml::from_value(document)?),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty()
    }
}
