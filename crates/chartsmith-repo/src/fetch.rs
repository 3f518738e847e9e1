//! Chart download from a repository
//!
//! `fetch` reads the repository index, picks a version, then tries each
//! archive URL listed for it in order. Every attempt unpacks into its own
//! workspace; a failed attempt's workspace is dropped before the next URL
//! is tried.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::archive::{DigestReader, digest_matches, unpack};
use crate::error::{RepoError, Result};
use crate::http::{HttpTransport, Transport, index_url, parse_url, resolve_url};
use crate::index::{ChartEntry, RepositoryIndex, VersionOrder};
use crate::workspace::Workspace;

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3);

/// Options for repository downloads
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Directory under which per-download workspaces are created
    pub workspace_root: PathBuf,
    /// Per-request timeout
    pub timeout: Duration,
    /// Verify archives against the index digest when one is listed
    pub verify_digests: bool,
    /// Version picked when the caller gives none
    pub version_order: VersionOrder,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            workspace_root: std::env::temp_dir(),
            timeout: DEFAULT_TIMEOUT,
            verify_digests: true,
            version_order: VersionOrder::default(),
        }
    }
}

/// A chart unpacked into a private workspace
///
/// The chart files live as long as this value does.
#[derive(Debug)]
pub struct FetchedChart {
    workspace: Workspace,
    chart_root: PathBuf,
    version: String,
}

impl FetchedChart {
    /// `<workspace>/<chart name>`
    pub fn root(&self) -> &Path {
        &self.chart_root
    }

    /// Version selected from the index
    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    /// Delete the unpacked chart now
    pub fn release(self) -> Result<()> {
        self.workspace.close()
    }
}

/// Downloads charts from `index.yaml` repositories
#[derive(Clone)]
pub struct RepositoryFetcher {
    transport: Arc<dyn Transport>,
    options: FetchOptions,
}

impl RepositoryFetcher {
    /// Fetcher backed by the default HTTP/file transport
    pub fn new(options: FetchOptions) -> Result<Self> {
        Ok(Self::with_transport(Arc::new(HttpTransport::new()?), options))
    }

    pub fn with_transport(transport: Arc<dyn Transport>, options: FetchOptions) -> Self {
        Self { transport, options }
    }

    pub fn options(&self) -> &FetchOptions {
        &self.options
    }

    /// Download and parse a repository's index
    pub fn index(&self, repo_url: &str) -> Result<RepositoryIndex> {
        self.index_with_timeout(repo_url, self.options.timeout)
    }

    pub fn index_with_timeout(&self, repo_url: &str, timeout: Duration) -> Result<RepositoryIndex> {
        parse_url(repo_url)?;
        let url = index_url(repo_url);
        debug!(url = %url, "fetching repository index");

        let mut body = self.transport.open(&url, timeout)?;
        let mut bytes = Vec::new();
        body.read_to_end(&mut bytes)
            .map_err(|e| RepoError::NetworkError {
                message: format!("Failed to read {}: {}", url, e),
            })?;

        RepositoryIndex::from_bytes(&bytes)
    }

    /// Fetch `name` from the repository at `repo_url`
    ///
    /// With `version` unset the configured [`VersionOrder`] picks one.
    pub fn fetch(&self, repo_url: &str, name: &str, version: Option<&str>) -> Result<FetchedChart> {
        self.fetch_with_timeout(repo_url, name, version, self.options.timeout)
    }

    pub fn fetch_with_timeout(
        &self,
        repo_url: &str,
        name: &str,
        version: Option<&str>,
        timeout: Duration,
    ) -> Result<FetchedChart> {
        check_chart_name(name)?;
        let index = self.index_with_timeout(repo_url, timeout)?;
        let entry = index.select(name, version, self.options.version_order, repo_url)?;
        debug!(chart = name, version = %entry.version, "selected chart version");

        if entry.urls.is_empty() {
            return Err(RepoError::FetchFailed {
                name: name.to_string(),
                version: entry.version.clone(),
                attempts: "no download URLs listed".to_string(),
            });
        }

        let mut failures = Vec::with_capacity(entry.urls.len());
        for url in &entry.urls {
            let url = resolve_url(repo_url, url);
            match self.download(&url, name, entry, timeout) {
                Ok(fetched) => {
                    debug!(chart = name, root = %fetched.root().display(), "chart extracted");
                    return Ok(fetched);
                }
                Err(e) => {
                    warn!(url = %url, error = %e, "archive download failed, trying next URL");
                    failures.push(format!("{}: {}", url, e));
                }
            }
        }

        Err(RepoError::FetchFailed {
            name: name.to_string(),
            version: entry.version.clone(),
            attempts: failures.join("; "),
        })
    }

    fn download(
        &self,
        url: &str,
        name: &str,
        entry: &ChartEntry,
        timeout: Duration,
    ) -> Result<FetchedChart> {
        check_chart_name(name)?;
        let workspace = Workspace::create(&self.options.workspace_root)?;
        let body = self.transport.open(url, timeout)?;

        let expected = entry
            .digest
            .as_deref()
            .filter(|_| self.options.verify_digests);

        match expected {
            Some(expected) => {
                let mut reader = DigestReader::new(body);
                unpack(&mut reader, workspace.path())?;
                let actual = reader.finish()?;
                if !digest_matches(expected, &actual) {
                    return Err(RepoError::IntegrityCheckFailed {
                        name: format!("{}@{}", name, entry.version),
                        expected: expected.to_string(),
                        actual,
                    });
                }
            }
            None => {
                unpack(body, workspace.path())?;
            }
        }

        let chart_root = workspace.path().join(name);
        if !chart_root.is_dir() {
            return Err(RepoError::Archive {
                message: format!("archive does not contain a '{}/' directory", name),
            });
        }

        Ok(FetchedChart {
            workspace,
            chart_root,
            version: entry.version.clone(),
        })
    }
}

/// Chart names become a directory under the workspace
fn check_chart_name(name: &str) -> Result<()> {
    if chartsmith_core::layout::is_chart_name(name) {
        Ok(())
    } else {
        Err(RepoError::InvalidChartName {
            name: name.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Cursor;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Serves canned bodies and records every URL opened
    #[derive(Default)]
    struct StaticTransport {
        bodies: HashMap<String, Vec<u8>>,
        opened: Mutex<Vec<String>>,
    }

    impl StaticTransport {
        fn with(mut self, url: &str, body: Vec<u8>) -> Self {
            self.bodies.insert(url.to_string(), body);
            self
        }
    }

    impl Transport for StaticTransport {
        fn open(&self, url: &str, _timeout: Duration) -> Result<crate::http::Body> {
            self.opened.lock().unwrap().push(url.to_string());
            match self.bodies.get(url) {
                Some(body) => Ok(Box::new(Cursor::new(body.clone()))),
                None => Err(RepoError::HttpError {
                    status: 404,
                    url: url.to_string(),
                }),
            }
        }
    }

    fn chart_tarball(dir: &str, chart_yaml: &str) -> Vec<u8> {
        let mut builder = tar::Builder::new(Vec::new());
        let mut header = tar::Header::new_gnu();
        header.set_size(chart_yaml.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(
                &mut header,
                format!("{}/Chart.yaml", dir),
                chart_yaml.as_bytes(),
            )
            .unwrap();
        let tar = builder.into_inner().unwrap();

        let mut gz = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        std::io::Write::write_all(&mut gz, &tar).unwrap();
        gz.finish().unwrap()
    }

    const REPO: &str = "https://charts.example.com";

    fn fetcher(transport: StaticTransport, root: &Path) -> (Arc<StaticTransport>, RepositoryFetcher) {
        let transport = Arc::new(transport);
        let fetcher = RepositoryFetcher::with_transport(
            transport.clone(),
            FetchOptions {
                workspace_root: root.to_path_buf(),
                ..Default::default()
            },
        );
        (transport, fetcher)
    }

    #[test]
    fn test_falls_back_to_next_url() {
        let index = r#"
entries:
  demo:
    - version: "1.0.0"
      urls:
        - https://broken.example.com/demo-1.0.0.tgz
        - demo-1.0.0.tgz
"#;
        let transport = StaticTransport::default()
            .with("https://charts.example.com/index.yaml", index.as_bytes().to_vec())
            .with(
                "https://charts.example.com/demo-1.0.0.tgz",
                chart_tarball("demo", "name: demo\nversion: 1.0.0\n"),
            );
        let root = TempDir::new().unwrap();
        let (transport, fetcher) = fetcher(transport, root.path());

        let fetched = fetcher.fetch(REPO, "demo", None).unwrap();
        assert_eq!(fetched.version(), "1.0.0");
        assert!(fetched.root().join("Chart.yaml").is_file());
        assert_eq!(
            *transport.opened.lock().unwrap(),
            vec![
                "https://charts.example.com/index.yaml",
                "https://broken.example.com/demo-1.0.0.tgz",
                "https://charts.example.com/demo-1.0.0.tgz",
            ]
        );

        // only the successful attempt's workspace remains
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 1);
        fetched.release().unwrap();
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_all_urls_fail() {
        let index = r#"
entries:
  demo:
    - version: "1.0.0"
      urls: [a.tgz, b.tgz]
"#;
        let transport = StaticTransport::default()
            .with("https://charts.example.com/index.yaml", index.as_bytes().to_vec());
        let root = TempDir::new().unwrap();
        let (_, fetcher) = fetcher(transport, root.path());

        let err = fetcher.fetch(REPO, "demo", None).unwrap_err();
        assert!(matches!(err, RepoError::FetchFailed { .. }));
        assert_eq!(err.kind(), chartsmith_core::ErrorKind::Fetch);
        assert!(err.to_string().contains("a.tgz"));
        assert!(err.to_string().contains("b.tgz"));
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_rejects_names_outside_workspace() {
        let root = TempDir::new().unwrap();
        let (transport, fetcher) = fetcher(StaticTransport::default(), root.path());

        for bad in ["/abs", "../x", "a/b"] {
            let err = fetcher.fetch(REPO, bad, None).unwrap_err();
            assert!(matches!(err, RepoError::InvalidChartName { .. }), "name {}", bad);
            assert_eq!(err.kind(), chartsmith_core::ErrorKind::Validation);
        }
        assert!(transport.opened.lock().unwrap().is_empty());
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_archive_without_chart_directory() {
        let index = "entries:\n  demo:\n    - version: 1.0.0\n      urls: [demo.tgz]\n";
        let transport = StaticTransport::default()
            .with("https://charts.example.com/index.yaml", index.as_bytes().to_vec())
            .with(
                "https://charts.example.com/demo.tgz",
                chart_tarball("other", "name: other\nversion: 1.0.0\n"),
            );
        let root = TempDir::new().unwrap();
        let (_, fetcher) = fetcher(transport, root.path());

        let err = fetcher.fetch(REPO, "demo", None).unwrap_err();
        assert!(err.to_string().contains("'demo/'"));
    }

    #[test]
    fn test_digest_mismatch_counts_as_failure() {
        let archive = chart_tarball("demo", "name: demo\nversion: 1.0.0\n");
        let index = r#"
entries:
  demo:
    - version: "1.0.0"
      digest: "sha256:0000000000000000000000000000000000000000000000000000000000000000"
      urls: [demo.tgz]
"#;
        let transport = StaticTransport::default()
            .with("https://charts.example.com/index.yaml", index.as_bytes().to_vec())
            .with("https://charts.example.com/demo.tgz", archive);
        let root = TempDir::new().unwrap();
        let (_, fetcher) = fetcher(transport, root.path());

        let err = fetcher.fetch(REPO, "demo", None).unwrap_err();
        assert!(err.to_string().contains("Integrity check failed"));
    }

    #[test]
    fn test_digest_check_can_be_disabled() {
        let archive = chart_tarball("demo", "name: demo\nversion: 1.0.0\n");
        let index = r#"
entries:
  demo:
    - version: "1.0.0"
      digest: "sha256:0000"
      urls: [demo.tgz]
"#;
        let transport = StaticTransport::default()
            .with("https://charts.example.com/index.yaml", index.as_bytes().to_vec())
            .with("https://charts.example.com/demo.tgz", archive);
        let root = TempDir::new().unwrap();
        let fetcher = RepositoryFetcher::with_transport(
            Arc::new(transport),
            FetchOptions {
                workspace_root: root.path().to_path_buf(),
                verify_digests: false,
                ..Default::default()
            },
        );

        assert!(fetcher.fetch(REPO, "demo", None).is_ok());
    }

    #[test]
    fn test_index_errors_propagate() {
        let root = TempDir::new().unwrap();
        let (_, fetcher) = fetcher(StaticTransport::default(), root.path());

        let err = fetcher.fetch(REPO, "demo", None).unwrap_err();
        assert_eq!(err.kind(), chartsmith_core::ErrorKind::Network);

        let err = fetcher.fetch("not a url", "demo", None).unwrap_err();
        assert_eq!(err.kind(), chartsmith_core::ErrorKind::Configuration);
    }
}
