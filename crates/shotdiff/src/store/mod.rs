use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use shotdiff::batch::plan::list_png_ids;
use tracing::warn;

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    Ok(())
}

/// Diff PNGs written under a root directory, one file per comparison id.
pub struct DiffStore {
    root: PathBuf,
}

impl DiffStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path(&self, id: &str) -> PathBuf {
        self.root.join(format!("{id}.png"))
    }

    pub fn write(&self, id: &str, png: &[u8]) -> Result<PathBuf> {
        let path = self.path(id);
        ensure_parent(&path)?;
        std::fs::write(&path, png).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }

    /// Drop a stale diff for `id`, e.g. after the pair started passing.
    /// A diff that cannot be deleted is logged, not fatal.
    pub fn remove(&self, id: &str) {
        if let Err(e) = self.try_remove(id) {
            warn!(id, path = %self.path(id).display(), error = %e, "failed to remove stale diff");
        }
    }

    /// Delete the diff for `id`. Already absent counts as success.
    fn try_remove(&self, id: &str) -> std::io::Result<()> {
        match std::fs::remove_file(self.path(id)) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }

    /// Remove every diff PNG under the root. Other files are left alone.
    pub fn clear(&self) {
        for id in list_png_ids(&self.root) {
            self.remove(&id);
        }
    }
}

/// Write a single diff file (for `compare`, where the user names the path).
pub fn write_file(path: &Path, png: &[u8]) -> Result<()> {
    ensure_parent(path)?;
    std::fs::write(path, png).with_context(|| format!("Failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_creates_nested_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiffStore::new(dir.path().join("diffs"));
        let path = store.write("home/desktop", b"png").unwrap();
        assert_eq!(path, dir.path().join("diffs/home/desktop.png"));
        assert_eq!(std::fs::read(&path).unwrap(), b"png");

        store.remove("home/desktop");
        assert!(!path.exists());
    }

    #[test]
    fn removing_absent_diff_is_fine() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiffStore::new(dir.path());
        assert!(store.try_remove("never/written").is_ok());
    }

    #[test]
    fn undeletable_diff_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiffStore::new(dir.path());
        // A directory where the diff file should be cannot be removed as a file.
        std::fs::create_dir_all(store.path("stuck")).unwrap();

        assert!(store.try_remove("stuck").is_err());
        store.remove("stuck");
        assert!(store.path("stuck").exists());
    }

    #[test]
    fn clear_removes_only_pngs() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiffStore::new(dir.path());
        let diff = store.write("a/b", b"x").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"keep").unwrap();
        store.clear();
        assert!(!diff.exists());
        assert!(dir.path().join("notes.txt").exists());
    }
}
