//! Blocking transport for repository indexes and chart archives
//!
//! `http(s)://` URLs go through a blocking reqwest client, `file://` URLs
//! are opened from the local filesystem so a directory laid out like a
//! chart repository can be used without a server.

use std::io::Read;
use std::time::Duration;

use url::Url;

use crate::error::{RepoError, Result};

/// A readable response body
pub type Body = Box<dyn Read + Send>;

/// Opens URLs as streamed bodies
///
/// Each call carries its own timeout; nothing else in the fetch path has a
/// deadline.
pub trait Transport: Send + Sync {
    fn open(&self, url: &str, timeout: Duration) -> Result<Body>;
}

/// Default transport: HTTP(S) via reqwest, `file://` via the filesystem
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("chartsmith/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RepoError::NetworkError {
                message: e.to_string(),
            })?;

        Ok(Self { client })
    }

    fn open_http(&self, url: &str, timeout: Duration) -> Result<Body> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .map_err(|e| RepoError::transport(e, url, timeout))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RepoError::HttpError {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        Ok(Box::new(response))
    }

    fn open_file(&self, parsed: &Url) -> Result<Body> {
        let path = parsed
            .to_file_path()
            .map_err(|_| RepoError::InvalidRepositoryUrl {
                url: parsed.to_string(),
                reason: "not a local file path".to_string(),
            })?;

        let file = std::fs::File::open(&path).map_err(|e| RepoError::NetworkError {
            message: format!("Cannot open {}: {}", path.display(), e),
        })?;

        Ok(Box::new(file))
    }
}

impl Transport for HttpTransport {
    fn open(&self, url: &str, timeout: Duration) -> Result<Body> {
        let parsed = parse_url(url)?;
        match parsed.scheme() {
            "http" | "https" => self.open_http(url, timeout),
            "file" => self.open_file(&parsed),
            other => Err(RepoError::InvalidRepositoryUrl {
                url: url.to_string(),
                reason: format!("unsupported scheme '{}'", other),
            }),
        }
    }
}

/// Parse a URL, reporting failures as configuration errors
pub fn parse_url(url: &str) -> Result<Url> {
    Url::parse(url).map_err(|e| RepoError::InvalidRepositoryUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })
}

/// Location of a repository's `index.yaml`
pub fn index_url(repo_url: &str) -> String {
    format!("{}/index.yaml", repo_url.trim_end_matches('/'))
}

/// Resolve an archive URL from the index against the repository URL
pub fn resolve_url(repo_url: &str, url: &str) -> String {
    if url.contains("://") {
        url.to_string()
    } else {
        format!(
            "{}/{}",
            repo_url.trim_end_matches('/'),
            url.trim_start_matches("./")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_url() {
        assert_eq!(
            index_url("https://charts.example.com/stable/"),
            "https://charts.example.com/stable/index.yaml"
        );
        assert_eq!(
            index_url("https://charts.example.com/stable"),
            "https://charts.example.com/stable/index.yaml"
        );
    }

    #[test]
    fn test_resolve_url() {
        let repo = "https://charts.example.com/stable";
        assert_eq!(
            resolve_url(repo, "mongodb-0.4.0.tgz"),
            "https://charts.example.com/stable/mongodb-0.4.0.tgz"
        );
        assert_eq!(
            resolve_url(repo, "./mongodb-0.4.0.tgz"),
            "https://charts.example.com/stable/mongodb-0.4.0.tgz"
        );
        assert_eq!(
            resolve_url(repo, "https://mirror.example.com/mongodb-0.4.0.tgz"),
            "https://mirror.example.com/mongodb-0.4.0.tgz"
        );
    }

    #[test]
    fn test_unsupported_scheme() {
        let transport = HttpTransport::new().unwrap();
        let err = transport
            .open("ftp://charts.example.com/index.yaml", Duration::from_secs(1))
            .err()
            .unwrap();
        assert_eq!(err.kind(), chartsmith_core::ErrorKind::Configuration);
    }

    #[test]
    fn test_file_scheme_missing_file() {
        let transport = HttpTransport::new().unwrap();
        let err = transport
            .open("file:///definitely/not/here/index.yaml", Duration::from_secs(1))
            .err()
            .unwrap();
        assert_eq!(err.kind(), chartsmith_core::ErrorKind::Network);
    }
}
