//! Values handling with coalescing merge support
//!
//! Chart defaults come from `values.yaml`; overrides arrive as dotted
//! paths (`image.tag=v2`). Both are folded into a single mapping with
//! [`coalesce`], whose rules are asymmetric:
//!
//! | existing (dst) | incoming (src) | result            |
//! |----------------|----------------|-------------------|
//! | absent         | anything       | src adopted       |
//! | mapping        | mapping        | recursive merge   |
//! | mapping        | non-mapping    | dst kept          |
//! | scalar         | mapping        | dst kept          |
//! | scalar         | non-mapping    | src overwrites    |
//! | sequence/null  | non-mapping    | dst kept          |

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use crate::chart::ChartValues;
use crate::error::{CoreError, Result};

/// Mapping node; keys iterate in sorted order so re-serialization is stable
pub type Mapping = BTreeMap<String, Value>;

/// A configuration value
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Scalar(Scalar),
    Sequence(Vec<Value>),
    Mapping(Mapping),
}

/// Leaf value
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Bool(bool),
    Number(serde_yaml::Number),
    String(String),
}

impl Value {
    /// Empty mapping
    pub fn mapping() -> Self {
        Value::Mapping(Mapping::new())
    }

    pub fn is_mapping(&self) -> bool {
        matches!(self, Value::Mapping(_))
    }

    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Value::Mapping(map) => Some(map),
            _ => None,
        }
    }

    /// Short name of the variant, used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Scalar(_) => "scalar",
            Value::Sequence(_) => "sequence",
            Value::Mapping(_) => "mapping",
        }
    }

    /// Get a nested value by dotted path
    pub fn get(&self, path: &str) -> Option<&Value> {
        path.split('.').try_fold(self, |current, key| match current {
            Value::Mapping(map) => map.get(key),
            _ => None,
        })
    }

    /// Parse a YAML document into a value
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Render as block-style YAML
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

impl From<serde_yaml::Value> for Value {
    fn from(value: serde_yaml::Value) -> Self {
        match value {
            serde_yaml::Value::Null => Value::Null,
            serde_yaml::Value::Bool(b) => Value::Scalar(Scalar::Bool(b)),
            serde_yaml::Value::Number(n) => Value::Scalar(Scalar::Number(n)),
            serde_yaml::Value::String(s) => Value::Scalar(Scalar::String(s)),
            serde_yaml::Value::Sequence(items) => {
                Value::Sequence(items.into_iter().map(Value::from).collect())
            }
            serde_yaml::Value::Mapping(map) => Value::Mapping(
                map.into_iter()
                    .map(|(k, v)| (mapping_key(k), Value::from(v)))
                    .collect(),
            ),
            serde_yaml::Value::Tagged(tagged) => Value::from(tagged.value),
        }
    }
}

/// YAML allows non-string keys (`1: x`, `true: y`); they become their textual form
fn mapping_key(key: serde_yaml::Value) -> String {
    match key {
        serde_yaml::Value::String(s) => s,
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::Null => "null".to_string(),
        other => serde_yaml::to_string(&other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Scalar(Scalar::String(s.to_string()))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Scalar(Scalar::String(s))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Scalar(Scalar::Bool(b))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Scalar(Scalar::Number(n.into()))
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::from(i64::from(n))
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Scalar(Scalar::Number(n.into()))
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Scalar(Scalar::Number(n.into()))
    }
}

impl From<Mapping> for Value {
    fn from(map: Mapping) -> Self {
        Value::Mapping(map)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Sequence(items)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Scalar(Scalar::Bool(b)) => serializer.serialize_bool(*b),
            Value::Scalar(Scalar::Number(n)) => n.serialize(serializer),
            Value::Scalar(Scalar::String(s)) => serializer.serialize_str(s),
            Value::Sequence(items) => serializer.collect_seq(items),
            Value::Mapping(map) => serializer.collect_map(map),
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        serde_yaml::Value::deserialize(deserializer).map(Value::from)
    }
}

/// Expand a dotted path into a single-branch nested mapping
///
/// `path_to_map("server.port", 80)` yields `{server: {port: 80}}`.
/// The path `"."` returns `value` untouched.
pub fn path_to_map(path: &str, value: Value) -> Result<Value> {
    if path == "." {
        return Ok(value);
    }

    let segments: Vec<&str> = path.split('.').collect();
    if segments.iter().any(|segment| segment.is_empty()) {
        return Err(CoreError::InvalidPath {
            path: path.to_string(),
            reason: "path segments must not be empty".to_string(),
        });
    }

    Ok(segments.into_iter().rev().fold(value, |leaf, segment| {
        Value::Mapping(Mapping::from([(segment.to_string(), leaf)]))
    }))
}

/// Merge `src` into `dst` in place
///
/// A mapping never replaces a non-mapping and a non-mapping never replaces
/// a mapping. Only scalars in `dst` are overwritten.
pub fn coalesce(dst: &mut Mapping, src: Mapping) {
    for (key, incoming) in src {
        match dst.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(incoming);
            }
            Entry::Occupied(mut slot) => {
                let existing = slot.get_mut();
                match incoming {
                    Value::Mapping(nested) => {
                        if let Value::Mapping(target) = existing {
                            coalesce(target, nested);
                        }
                    }
                    other => {
                        if matches!(existing, Value::Scalar(_)) {
                            *existing = other;
                        }
                    }
                }
            }
        }
    }
}

/// Parse a values document into a mapping
///
/// Empty text and documents holding only comments yield an empty mapping.
pub fn parse_mapping(text: &str) -> Result<Mapping> {
    if text.trim().is_empty() {
        return Ok(Mapping::new());
    }

    match Value::from_yaml(text)? {
        Value::Null => Ok(Mapping::new()),
        Value::Mapping(map) => Ok(map),
        other => Err(CoreError::NotAMapping {
            context: "values document".to_string(),
            found: other.type_name().to_string(),
        }),
    }
}

/// Fold dotted-path overrides into base YAML and re-render the result
///
/// Overrides are applied in iteration order, so a later path wins over an
/// earlier one touching the same scalar.
pub fn generate_values<I, K>(base_yaml: &str, overrides: I) -> Result<ChartValues>
where
    I: IntoIterator<Item = (K, Value)>,
    K: AsRef<str>,
{
    let mut merged = parse_mapping(base_yaml)?;

    for (path, value) in overrides {
        let path = path.as_ref();
        match path_to_map(path, value)? {
            Value::Mapping(expanded) => coalesce(&mut merged, expanded),
            other => {
                return Err(CoreError::NotAMapping {
                    context: format!("override '{}'", path),
                    found: other.type_name().to_string(),
                });
            }
        }
    }

    if merged.is_empty() {
        return Ok(ChartValues::default());
    }

    Ok(ChartValues::new(Value::Mapping(merged).to_yaml()?))
}

/// Parse a `key=value` override
///
/// The value is typed the way a shell user would expect: `true`/`false`,
/// `null`, integers and floats are recognised, `[...]`/`{...}` are read as
/// inline YAML, anything else stays a string.
pub fn parse_override(arg: &str) -> Result<(String, Value)> {
    let (key, raw) = arg.split_once('=').ok_or_else(|| CoreError::InvalidOverride {
        arg: arg.to_string(),
    })?;

    let value = match raw {
        "true" => Value::from(true),
        "false" => Value::from(false),
        "null" => Value::Null,
        _ => {
            if let Ok(n) = raw.parse::<i64>() {
                Value::from(n)
            } else if let Ok(n) = raw.parse::<f64>() {
                Value::from(n)
            } else if raw.starts_with('[') || raw.starts_with('{') {
                Value::from_yaml(raw).unwrap_or_else(|_| Value::from(raw))
            } else {
                Value::from(raw)
            }
        }
    };

    Ok((key.to_string(), value))
}

/// Parse a list of `key=value` overrides, keeping their order
pub fn parse_overrides(args: &[String]) -> Result<Vec<(String, Value)>> {
    args.iter().map(|arg| parse_override(arg)).collect()
}
