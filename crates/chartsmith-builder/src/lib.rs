//! Chartsmith Builder
//!
//! Turns a chart intent into a fully resolved chart tree:
//!
//! - **Sources**: local directories or `index.yaml` repositories
//! - **Dependencies**: `requirements.yaml` entries assembled recursively,
//!   with cycle detection and a depth limit
//! - **Output**: a [`ChartNode`](chartsmith_core::ChartNode) tree with a
//!   deterministic byte encoding, plus line diffs between trees
//!
//! ## Example
//!
//! ```rust,no_run
//! use chartsmith_builder::{BuilderConfig, ChartAssembler, ChartIntent};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = BuilderConfig::load()?;
//! let intent = ChartIntent::repo("mongodb", "https://charts.example.com/stable", Some("0.4.0".into()));
//!
//! let mut assembler = ChartAssembler::new(intent, &config)?;
//! let tree = assembler.assemble_tree()?;
//! println!("{} with {} dependencies", tree.metadata.name, tree.dependencies.len());
//! let bytes = assembler.serialize()?;
//! # let _ = bytes;
//! # Ok(())
//! # }
//! ```

pub mod assembler;
pub mod config;
pub mod diff;
pub mod error;
pub mod intent;
pub mod source;

pub use assembler::ChartAssembler;
pub use config::BuilderConfig;
pub use diff::{DiffLine, LineType, TreeDiff};
pub use error::{BuildError, Result};
pub use intent::{ChartIntent, SourceDescriptor, SourceKind};
pub use source::{ResolvedSource, SourceResolver};
