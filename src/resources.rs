use log::warn;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Scoped temporary file: the path is removed when the guard drops, on
/// every exit path, unless ownership is taken with [`TempFile::take_path`].
#[derive(Debug)]
pub struct TempFile {
    path: PathBuf,
    cleanup_on_drop: bool,
}

impl TempFile {
    /// Wrap an existing path
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            cleanup_on_drop: true,
        }
    }

    /// Reserve a per-process staging path in the system temp directory
    pub fn staging(label: &str, extension: &str) -> Self {
        let filename = format!("wordplug_{}_{}.{}", label, std::process::id(), extension);
        Self::new(std::env::temp_dir().join(filename))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Take ownership of the path and disable cleanup
    pub fn take_path(mut self) -> PathBuf {
        self.cleanup_on_drop = false;
        self.path.clone()
    }

    /// Manually remove the file (consumes self)
    pub fn cleanup(mut self) -> Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)
                .map_err(|e| crate::error::fs_error(e, self.path.clone()))?;
        }
        self.cleanup_on_drop = false;
        Ok(())
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        if self.cleanup_on_drop && self.path.exists() {
            if let Err(e) = std::fs::remove_file(&self.path) {
                warn!("Failed to clean up temporary file {:?}: {}", self.path, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    #[test]
    fn test_temp_file_removed_on_drop() {
        let temp_dir = tempfile::tempdir().unwrap();
        let file_path = temp_dir.path().join("scratch.wav");
        File::create(&file_path).unwrap();

        {
            let _guard = TempFile::new(file_path.clone());
            assert!(file_path.exists());
        }

        assert!(!file_path.exists());
    }

    #[test]
    fn test_take_path_disables_cleanup() {
        let temp_dir = tempfile::tempdir().unwrap();
        let file_path = temp_dir.path().join("keep.wav");
        File::create(&file_path).unwrap();

        let guard = TempFile::new(file_path.clone());
        let taken = guard.take_path();

        assert_eq!(taken, file_path);
        assert!(file_path.exists());
    }

    #[test]
    fn test_staging_path_is_unique_per_label() {
        let a = TempFile::staging("wav", "wav");
        let b = TempFile::staging("tagged", "m4a");
        assert_ne!(a.path(), b.path());
        assert!(a.path().to_string_lossy().ends_with(".wav"));
    }
}
