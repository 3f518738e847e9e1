//! Builder configuration
//!
//! Loaded from `<config dir>/chartsmith/config.yaml` when present:
//!
//! ```yaml
//! workspaceRoot: /var/tmp/chartsmith
//! timeout: 5s
//! maxDepth: 10
//! verifyDigests: true
//! versionOrder: lexical
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use chartsmith_repo::{DEFAULT_TIMEOUT, FetchOptions, VersionOrder};
use serde::{Deserialize, Serialize};

use crate::error::{BuildError, Result};

/// Settings shared by every assembler in a build
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BuilderConfig {
    /// Directory under which per-chart workspaces are created
    #[serde(default = "default_workspace_root")]
    pub workspace_root: PathBuf,

    /// Per-request network timeout
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,

    /// Maximum dependency nesting below the root chart
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Verify downloaded archives against index digests
    #[serde(default = "default_verify_digests")]
    pub verify_digests: bool,

    #[serde(default)]
    pub version_order: VersionOrder,
}

fn default_workspace_root() -> PathBuf {
    std::env::temp_dir()
}

fn default_timeout() -> Duration {
    DEFAULT_TIMEOUT
}

fn default_max_depth() -> usize {
    10
}

fn default_verify_digests() -> bool {
    true
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            workspace_root: default_workspace_root(),
            timeout: default_timeout(),
            max_depth: default_max_depth(),
            verify_digests: default_verify_digests(),
            version_order: VersionOrder::default(),
        }
    }
}

impl BuilderConfig {
    /// Load configuration from default location, falling back to defaults
    pub fn load() -> Result<Self> {
        let path = Self::default_path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| BuildError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml).map_err(|e| BuildError::InvalidConfig {
            message: e.to_string(),
        })
    }

    /// Get default configuration path
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| BuildError::InvalidConfig {
            message: "Could not determine config directory".to_string(),
        })?;
        Ok(config_dir.join("chartsmith").join("config.yaml"))
    }

    pub fn with_workspace_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.workspace_root = root.into();
        self
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Options handed to the repository fetcher
    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            workspace_root: self.workspace_root.clone(),
            timeout: self.timeout,
            verify_digests: self.verify_digests,
            version_order: self.version_order,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BuilderConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(3));
        assert_eq!(config.max_depth, 10);
        assert!(config.verify_digests);
        assert_eq!(config.version_order, VersionOrder::Lexical);
        assert_eq!(BuilderConfig::from_yaml("").unwrap(), config);
    }

    #[test]
    fn test_parse() {
        let yaml = r#"
workspaceRoot: /var/tmp/chartsmith
timeout: 1m 30s
maxDepth: 4
verifyDigests: false
versionOrder: semantic
"#;
        let config = BuilderConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.workspace_root, PathBuf::from("/var/tmp/chartsmith"));
        assert_eq!(config.timeout, Duration::from_secs(90));
        assert_eq!(config.max_depth, 4);

        let options = config.fetch_options();
        assert!(!options.verify_digests);
        assert_eq!(options.version_order, VersionOrder::Semantic);
        assert_eq!(options.timeout, Duration::from_secs(90));
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = BuilderConfig::from_yaml("maxDepht: 3\n").unwrap_err();
        assert_eq!(err.kind(), chartsmith_core::ErrorKind::Configuration);
        assert!(err.to_string().contains("maxDepht"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "timeout: 250ms\n").unwrap();

        let config = BuilderConfig::load_from(&path).unwrap();
        assert_eq!(config.timeout, Duration::from_millis(250));
        assert_eq!(config.max_depth, 10);
    }

    #[test]
    fn test_default_path() {
        if let Ok(path) = BuilderConfig::default_path() {
            assert!(path.ends_with("chartsmith/config.yaml"));
        }
    }
}
