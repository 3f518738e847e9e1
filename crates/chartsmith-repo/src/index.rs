//! Repository index types
//!
//! Helm-compatible `index.yaml`: chart names map to the list of published
//! versions, each with the archive URLs it can be downloaded from.

use chartsmith_core::chart::scalar_serde;
use chrono::{DateTime, Utc};
use semver::Version;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

use crate::error::{RepoError, Result};

/// How a version is picked when several index entries qualify
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionOrder {
    /// Smallest version string by plain string comparison (`"1.5.0" < "2.0.0"`,
    /// but also `"10.0.0" < "9.0.0"`)
    #[default]
    Lexical,
    /// Highest semantic version; unparseable versions sort below parseable ones
    Semantic,
}

/// Repository index (Helm-compatible)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryIndex {
    /// API version
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// When this index was generated
    #[serde(default)]
    pub generated: Option<DateTime<Utc>>,

    /// Charts indexed by name
    #[serde(default)]
    pub entries: HashMap<String, Vec<ChartEntry>>,
}

fn default_api_version() -> String {
    "v1".to_string()
}

impl RepositoryIndex {
    /// Parse index from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| RepoError::IndexParseError {
            message: e.to_string(),
        })
    }

    /// Parse index from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let yaml = std::str::from_utf8(bytes).map_err(|e| RepoError::IndexParseError {
            message: format!("Invalid UTF-8: {}", e),
        })?;
        Self::from_yaml(yaml)
    }

    /// Get all published versions of a chart
    pub fn get(&self, name: &str) -> Option<&Vec<ChartEntry>> {
        self.entries.get(name)
    }

    /// Sorted list of chart names
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Sorted chart names containing `query`; matching is case-sensitive
    pub fn search(&self, query: &str) -> Vec<&str> {
        self.names()
            .into_iter()
            .filter(|name| name.contains(query))
            .collect()
    }

    /// Versions of a chart, in index order
    pub fn versions(&self, name: &str) -> Option<Vec<&str>> {
        self.entries
            .get(name)
            .map(|entries| entries.iter().map(|e| e.version.as_str()).collect())
    }

    /// Pick the entry to download
    ///
    /// With `version` set only exact matches qualify; otherwise every listed
    /// version does. Among the candidates `order` decides.
    pub fn select(
        &self,
        name: &str,
        version: Option<&str>,
        order: VersionOrder,
        repo: &str,
    ) -> Result<&ChartEntry> {
        let entries = self
            .entries
            .get(name)
            .ok_or_else(|| RepoError::ChartNotFound {
                name: name.to_string(),
                repo: repo.to_string(),
            })?;

        let candidates = entries
            .iter()
            .filter(|e| version.is_none_or(|wanted| e.version == wanted));

        let chosen = match order {
            VersionOrder::Lexical => candidates.min_by(|a, b| a.version.cmp(&b.version)),
            VersionOrder::Semantic => candidates.max_by(|a, b| compare_semver(a, b)),
        };

        chosen.ok_or_else(|| match version {
            Some(version) => RepoError::VersionNotFound {
                name: name.to_string(),
                version: version.to_string(),
                repo: repo.to_string(),
            },
            None => RepoError::NoVersionsAvailable {
                name: name.to_string(),
            },
        })
    }
}

fn compare_semver(a: &ChartEntry, b: &ChartEntry) -> Ordering {
    match (a.parsed_version(), b.parsed_version()) {
        (Some(va), Some(vb)) => va.cmp(&vb),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => a.version.cmp(&b.version),
    }
}

/// Chart entry in the index
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartEntry {
    /// Chart name
    #[serde(default)]
    pub name: String,

    /// Chart version
    #[serde(deserialize_with = "scalar_serde::required")]
    pub version: String,

    /// Application version
    #[serde(default, deserialize_with = "scalar_serde::optional")]
    pub app_version: Option<String>,

    /// Description
    #[serde(default)]
    pub description: Option<String>,

    /// URLs to download the chart archive, tried in order
    #[serde(default)]
    pub urls: Vec<String>,

    /// SHA256 digest of the archive
    #[serde(default)]
    pub digest: Option<String>,

    /// Creation timestamp
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,

    /// Deprecated flag
    #[serde(default)]
    pub deprecated: bool,
}

impl ChartEntry {
    /// Parse version as semver
    pub fn parsed_version(&self) -> Option<Version> {
        Version::parse(&self.version).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPO: &str = "https://charts.example.com";

    fn sample_index() -> RepositoryIndex {
        let yaml = r#"
apiVersion: v1
generated: "2024-01-01T00:00:00Z"
entries:
  demo:
    - name: demo
      version: "2.0.0"
      urls:
        - https://example.com/charts/demo-2.0.0.tgz
    - name: demo
      version: "1.5.0"
      urls:
        - https://example.com/charts/demo-1.5.0.tgz
      digest: "sha256:abc123"
  mongodb:
    - name: mongodb
      version: "10.0.0"
      description: NoSQL database
      urls:
        - mongodb-10.0.0.tgz
    - name: mongodb
      version: "9.3.1"
      urls:
        - mongodb-9.3.1.tgz
  redis:
    - name: redis
      version: 7
      appVersion: 7.2
      urls: []
"#;
        RepositoryIndex::from_yaml(yaml).unwrap()
    }

    #[test]
    fn test_parse_index() {
        let index = sample_index();
        assert_eq!(index.entries.len(), 3);
        assert_eq!(index.get("redis").unwrap()[0].version, "7");
        assert_eq!(
            index.get("redis").unwrap()[0].app_version.as_deref(),
            Some("7.2")
        );
        assert!(index.generated.is_some());
    }

    #[test]
    fn test_select_lexical_smallest() {
        let index = sample_index();
        let entry = index.select("demo", None, VersionOrder::Lexical, REPO).unwrap();
        assert_eq!(entry.version, "1.5.0");
    }

    #[test]
    fn test_select_lexical_is_not_semantic() {
        let index = sample_index();
        let entry = index.select("mongodb", None, VersionOrder::Lexical, REPO).unwrap();
        assert_eq!(entry.version, "10.0.0");
    }

    #[test]
    fn test_select_semantic_highest() {
        let index = sample_index();
        let entry = index.select("demo", None, VersionOrder::Semantic, REPO).unwrap();
        assert_eq!(entry.version, "2.0.0");
    }

    #[test]
    fn test_select_exact_version() {
        let index = sample_index();
        let entry = index
            .select("demo", Some("2.0.0"), VersionOrder::Lexical, REPO)
            .unwrap();
        assert_eq!(entry.urls, vec!["https://example.com/charts/demo-2.0.0.tgz"]);
    }

    #[test]
    fn test_select_missing_chart() {
        let index = sample_index();
        let err = index.select("nginx", None, VersionOrder::Lexical, REPO).unwrap_err();
        assert!(matches!(err, RepoError::ChartNotFound { .. }));
        assert_eq!(err.kind(), chartsmith_core::ErrorKind::NotFound);
    }

    #[test]
    fn test_select_missing_version() {
        let index = sample_index();
        let err = index
            .select("demo", Some("3.0.0"), VersionOrder::Lexical, REPO)
            .unwrap_err();
        assert!(matches!(err, RepoError::VersionNotFound { .. }));
        assert_eq!(err.kind(), chartsmith_core::ErrorKind::NotFound);
    }

    #[test]
    fn test_select_empty_entry_list() {
        let index = RepositoryIndex::from_yaml("entries:\n  ghost: []\n").unwrap();
        let err = index.select("ghost", None, VersionOrder::Lexical, REPO).unwrap_err();
        assert!(matches!(err, RepoError::NoVersionsAvailable { .. }));
    }

    #[test]
    fn test_names_and_search() {
        let index = sample_index();
        assert_eq!(index.names(), vec!["demo", "mongodb", "redis"]);
        assert_eq!(index.search("dis"), vec!["redis"]);
        assert!(index.search("DIS").is_empty());
        assert_eq!(index.search("o"), vec!["demo", "mongodb"]);
        assert!(index.search("postgres").is_empty());
    }

    #[test]
    fn test_versions() {
        let index = sample_index();
        assert_eq!(index.versions("demo"), Some(vec!["2.0.0", "1.5.0"]));
        assert_eq!(index.versions("nginx"), None);
    }

    #[test]
    fn test_malformed_index() {
        let err = RepositoryIndex::from_yaml("entries: [not, a, map]").unwrap_err();
        assert!(matches!(err, RepoError::IndexParseError { .. }));
        assert_eq!(err.kind(), chartsmith_core::ErrorKind::Parse);

        let err = RepositoryIndex::from_bytes(&[0xff, 0xfe]).unwrap_err();
        assert_eq!(err.kind(), chartsmith_core::ErrorKind::Parse);
    }
}
