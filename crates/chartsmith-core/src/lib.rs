//! Chartsmith Core - chart tree types and value merging
//!
//! This crate provides the pure building blocks used by the resolver:
//! - `ChartNode`: a materialized chart with its dependency sub-trees
//! - `Value`: configuration values with coalescing merge
//! - `Requirements`: declared dependencies from `requirements.yaml`
//! - `layout`: which chart files are metadata, values, templates or opaque

pub mod chart;
pub mod error;
pub mod layout;
pub mod requirements;
pub mod values;

pub use chart::{ChartMetadata, ChartNode, ChartValues, OpaqueFile, TemplateFile};
pub use error::{CoreError, ErrorKind, Result};
pub use layout::FileClass;
pub use requirements::{DependencyDeclaration, Requirements};
pub use values::{
    Mapping, Scalar, Value, coalesce, generate_values, parse_mapping, parse_override,
    parse_overrides, path_to_map,
};
