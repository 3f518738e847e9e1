//! Scoped scratch directories for downloaded charts

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::error::Result;

const PREFIX: &str = "chartsmith-";

/// A uniquely named directory under the configured workspace root
///
/// The directory and everything in it is removed when the workspace is
/// dropped, whether or not the work that used it succeeded.
#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    /// Create a fresh workspace under `root`, creating `root` if needed
    pub fn create(root: &Path) -> Result<Self> {
        std::fs::create_dir_all(root)?;
        let dir = tempfile::Builder::new().prefix(PREFIX).tempdir_in(root)?;
        tracing::debug!(path = %dir.path().display(), "created workspace");
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Remove the directory now, reporting failures instead of ignoring them
    pub fn close(self) -> Result<()> {
        let path: PathBuf = self.dir.path().to_path_buf();
        self.dir.close()?;
        tracing::debug!(path = %path.display(), "removed workspace");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workspace_removed_on_drop() {
        let root = TempDir::new().unwrap();
        let path = {
            let ws = Workspace::create(root.path()).unwrap();
            std::fs::write(ws.path().join("file"), b"x").unwrap();
            ws.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn test_workspace_close() {
        let root = TempDir::new().unwrap();
        let ws = Workspace::create(&root.path().join("nested/root")).unwrap();
        let path = ws.path().to_path_buf();

        assert!(path.starts_with(root.path().join("nested/root")));
        assert!(
            path.file_name()
                .unwrap()
                .to_string_lossy()
                .starts_with("chartsmith-")
        );

        ws.close().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_workspaces_are_distinct() {
        let root = TempDir::new().unwrap();
        let a = Workspace::create(root.path()).unwrap();
        let b = Workspace::create(root.path()).unwrap();
        assert_ne!(a.path(), b.path());
    }
}
