//! Source resolution: turn a chart intent into a directory on disk

use std::path::{Path, PathBuf};

use chartsmith_repo::{FetchedChart, RepositoryFetcher};
use tracing::debug;

use crate::error::{BuildError, Result};
use crate::intent::{ChartIntent, SourceKind};

/// Chart content ready to be read
///
/// Directory sources are borrowed from the caller and never deleted.
/// Repository sources own the workspace they were unpacked into.
#[derive(Debug)]
pub struct ResolvedSource {
    root: PathBuf,
    fetched: Option<FetchedChart>,
}

impl ResolvedSource {
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether the content lives in a workspace owned by this value
    pub fn is_owned(&self) -> bool {
        self.fetched.is_some()
    }

    /// Version picked from the repository index, for repository sources
    pub fn fetched_version(&self) -> Option<&str> {
        self.fetched.as_ref().map(FetchedChart::version)
    }

    /// Delete any owned workspace now
    pub fn release(self) -> Result<()> {
        if let Some(fetched) = self.fetched {
            debug!(root = %self.root.display(), "releasing chart workspace");
            fetched.release()?;
        }
        Ok(())
    }
}

/// Dispatches a source descriptor to the filesystem or a repository
#[derive(Clone)]
pub struct SourceResolver {
    fetcher: RepositoryFetcher,
}

impl SourceResolver {
    pub fn new(fetcher: RepositoryFetcher) -> Self {
        Self { fetcher }
    }

    pub fn fetcher(&self) -> &RepositoryFetcher {
        &self.fetcher
    }

    pub fn resolve(&self, intent: &ChartIntent) -> Result<ResolvedSource> {
        intent.validate_name()?;
        let kind = intent.source_kind()?;
        let subpath = intent.subpath()?;

        match kind {
            SourceKind::Directory => {
                let mut root = PathBuf::from(&intent.source.location);
                if let Some(subpath) = subpath {
                    root.push(subpath);
                }
                if !root.is_dir() {
                    return Err(BuildError::SourceNotFound { path: root });
                }
                debug!(chart = %intent.name, root = %root.display(), "using directory source");
                Ok(ResolvedSource {
                    root,
                    fetched: None,
                })
            }
            SourceKind::Repo => {
                let fetched = self.fetcher.fetch(
                    &intent.source.location,
                    &intent.name,
                    intent.effective_version(),
                )?;

                let mut root = fetched.root().to_path_buf();
                if let Some(subpath) = subpath {
                    root.push(subpath);
                }
                if !root.is_dir() {
                    return Err(BuildError::SourceNotFound { path: root });
                }
                debug!(chart = %intent.name, root = %root.display(), "using repository source");
                Ok(ResolvedSource {
                    root,
                    fetched: Some(fetched),
                })
            }
        }
    }
}
