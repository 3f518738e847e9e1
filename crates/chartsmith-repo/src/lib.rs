//! Chartsmith Repository Access
//!
//! Reads Helm-style `index.yaml` repositories and downloads chart archives
//! into private workspaces:
//!
//! - **Index**: parse, browse and select a chart version
//! - **Transport**: blocking HTTP(S) plus `file://` for local repositories
//! - **Archives**: gzip, zstd or plain tar, detected from the stream
//! - **Workspaces**: per-download directories removed on drop
//!
//! ## Example
//!
//! ```rust,no_run
//! use chartsmith_repo::{FetchOptions, RepositoryFetcher};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let fetcher = RepositoryFetcher::new(FetchOptions::default())?;
//! let chart = fetcher.fetch("https://charts.example.com", "mongodb", None)?;
//! println!("{} unpacked at {}", chart.version(), chart.root().display());
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod error;
pub mod fetch;
pub mod http;
pub mod index;
pub mod workspace;

pub use archive::{Compression, DigestReader, compute_digest, digest_matches};
pub use error::{RepoError, Result};
pub use fetch::{DEFAULT_TIMEOUT, FetchOptions, FetchedChart, RepositoryFetcher};
pub use http::{Body, HttpTransport, Transport};
pub use index::{ChartEntry, RepositoryIndex, VersionOrder};
pub use workspace::Workspace;
