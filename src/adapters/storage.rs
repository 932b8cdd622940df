use crate::domain::ports::Storage;
use crate::utils::error::{Result, SurveyError};
use std::fs;
use std::path::{Path, PathBuf};

/// Filesystem storage rooted at `base_path`; absolute paths bypass the root.
#[derive(Debug, Clone, Default)]
pub struct LocalStorage {
    base_path: String,
}

impl LocalStorage {
    pub fn new(base_path: String) -> Self {
        Self { base_path }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        Path::new(&self.base_path).join(path)
    }
}

fn partial_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.{}.partial", name, std::process::id()))
}

impl Storage for LocalStorage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let full_path = self.resolve(path);
        let data = fs::read(full_path)?;
        Ok(data)
    }

    /// Writes to a hidden sibling first and renames it into place.
    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = self.resolve(path);
        let partial = partial_sibling(&full_path);

        if let Err(e) = fs::write(&partial, data) {
            let _ = fs::remove_file(&partial);
            return Err(SurveyError::output(path, e));
        }

        fs::rename(&partial, &full_path).map_err(|e| {
            let _ = fs::remove_file(&partial);
            SurveyError::output(path, e)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path().display().to_string());

        storage.write_file("corrected.csv", b"Site\nA\n").await.unwrap();

        assert_eq!(storage.read_file("corrected.csv").await.unwrap(), b"Site\nA\n");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_absolute_path_ignores_base() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("abs.csv");
        let storage = LocalStorage::default();

        storage
            .write_file(&target.display().to_string(), b"x")
            .await
            .unwrap();
        assert_eq!(fs::read(&target).unwrap(), b"x");
    }

    #[tokio::test]
    async fn test_write_into_missing_directory_fails_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path().display().to_string());

        let err = storage
            .write_file("missing/corrected.csv", b"x")
            .await
            .unwrap_err();

        assert!(matches!(err, SurveyError::OutputError { .. }));
        assert!(!dir.path().join("missing").exists());
    }

    #[tokio::test]
    async fn test_missing_input_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path().display().to_string());

        let err = storage.read_file("nope.csv").await.unwrap_err();
        assert!(matches!(err, SurveyError::IoError(_)));
    }
}
