//! Shared fixtures for assembly tests

#![allow(dead_code)]

use std::io::Write;
use std::path::Path;
use std::sync::Once;

use tempfile::TempDir;
use tracing_subscriber::EnvFilter;

static INIT_LOGGING: Once = Once::new();

/// Install a test subscriber when `RUST_LOG` is set
pub fn init_test_logging() {
    INIT_LOGGING.call_once(|| {
        if std::env::var("RUST_LOG").is_err() {
            return;
        }
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Write `files` (root-relative path, content) under `root`
pub fn write_chart(root: &Path, files: &[(&str, &str)]) {
    for (rel, content) in files {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }
}

/// Gzipped tarball with every file placed under `<name>/`
pub fn chart_archive(name: &str, files: &[(&str, &str)]) -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());
    for (rel, content) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, format!("{}/{}", name, rel), content.as_bytes())
            .unwrap();
    }
    let tar = builder.into_inner().unwrap();

    let mut gz = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    gz.write_all(&tar).unwrap();
    gz.finish().unwrap()
}

/// A chart repository on the local filesystem, served through `file://`
pub struct FileRepo {
    dir: TempDir,
    entries: Vec<(String, String)>,
}

impl FileRepo {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
            entries: Vec::new(),
        }
    }

    pub fn url(&self) -> String {
        url::Url::from_directory_path(self.dir.path())
            .unwrap()
            .to_string()
    }

    /// Publish `name`@`version`; call [`FileRepo::publish`] afterwards
    pub fn add(&mut self, name: &str, version: &str, files: &[(&str, &str)]) -> &mut Self {
        let archive = format!("{}-{}.tgz", name, version);
        std::fs::write(self.dir.path().join(&archive), chart_archive(name, files)).unwrap();
        self.entries.push((name.to_string(), version.to_string()));
        self
    }

    /// Write `index.yaml` for everything added so far
    pub fn publish(&self) {
        let mut index = String::from("apiVersion: v1\nentries:\n");
        let mut names: Vec<&str> = self.entries.iter().map(|(n, _)| n.as_str()).collect();
        names.sort_unstable();
        names.dedup();

        for name in names {
            index.push_str(&format!("  {}:\n", name));
            for (_, version) in self.entries.iter().filter(|(n, _)| n == name) {
                index.push_str(&format!(
                    "    - name: {name}\n      version: \"{version}\"\n      urls:\n        - {name}-{version}.tgz\n"
                ));
            }
        }
        std::fs::write(self.dir.path().join("index.yaml"), index).unwrap();
    }
}

/// Number of entries directly under `dir`
pub fn entry_count(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
}
