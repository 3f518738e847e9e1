//! Chart tree types and their serialized form

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Chart metadata extracted from `Chart.yaml`
///
/// Absent optional fields are empty strings so the serialized tree has a
/// fixed shape regardless of which fields a chart declares.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartMetadata {
    pub name: String,
    pub version: String,
    pub description: String,
    pub api_version: String,
    pub app_version: String,
}

/// On-disk shape of `Chart.yaml`; only the mapped fields are read
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartFile {
    #[serde(deserialize_with = "scalar_serde::required")]
    name: String,
    #[serde(deserialize_with = "scalar_serde::required")]
    version: String,
    #[serde(default, deserialize_with = "scalar_serde::optional")]
    description: Option<String>,
    #[serde(default, deserialize_with = "scalar_serde::optional")]
    api_version: Option<String>,
    #[serde(default, deserialize_with = "scalar_serde::optional")]
    app_version: Option<String>,
}

impl ChartMetadata {
    /// Parse `Chart.yaml` content
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let file: ChartFile = serde_yaml::from_str(yaml)?;

        if file.name.trim().is_empty() {
            return Err(CoreError::InvalidMetadata {
                message: "name must not be empty".to_string(),
            });
        }

        Ok(Self {
            name: file.name,
            version: file.version,
            description: file.description.unwrap_or_default(),
            api_version: file.api_version.unwrap_or_default(),
            app_version: file.app_version.unwrap_or_default(),
        })
    }
}

/// Raw default values (`values.yaml`), empty when the chart has none
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartValues {
    raw: String,
}

impl ChartValues {
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }
}

/// A file under `templates/`, named relative to the chart root
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateFile {
    pub name: String,
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
}

/// Any chart file that is neither metadata, values, template nor subchart
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpaqueFile {
    pub path: String,
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
}

/// A fully materialized chart with its resolved dependencies
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartNode {
    pub metadata: ChartMetadata,
    pub values: ChartValues,
    pub templates: Vec<TemplateFile>,
    pub files: Vec<OpaqueFile>,
    pub dependencies: Vec<ChartNode>,
}

impl ChartNode {
    /// Deterministic byte encoding of the whole tree
    ///
    /// Compact JSON with declaration-order fields and base64 payloads; two
    /// equal trees always encode to the same bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decode bytes produced by [`ChartNode::to_bytes`]
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Human-readable rendering used for diffs
    pub fn to_pretty_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Number of nodes in the tree, this one included
    pub fn node_count(&self) -> usize {
        1 + self
            .dependencies
            .iter()
            .map(ChartNode::node_count)
            .sum::<usize>()
    }

    /// Direct dependency by chart name
    pub fn dependency(&self, name: &str) -> Option<&ChartNode> {
        self.dependencies.iter().find(|d| d.metadata.name == name)
    }
}

mod base64_bytes {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}

/// Chart files and indexes routinely write versions unquoted
/// (`version: 1.0`, `appVersion: 2`); accept any scalar and keep its
/// textual form.
pub mod scalar_serde {
    use serde::{Deserialize, Deserializer};

    fn to_text<E: serde::de::Error>(value: serde_yaml::Value) -> Result<String, E> {
        match value {
            serde_yaml::Value::String(s) => Ok(s),
            serde_yaml::Value::Number(n) => Ok(n.to_string()),
            serde_yaml::Value::Bool(b) => Ok(b.to_string()),
            other => Err(E::custom(format!("expected a scalar, found {:?}", other))),
        }
    }

    pub fn required<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        to_text(serde_yaml::Value::deserialize(deserializer)?)
    }

    pub fn optional<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match serde_yaml::Value::deserialize(deserializer)? {
            serde_yaml::Value::Null => Ok(None),
            other => to_text(other).map(Some),
        }
    }
}
