//! Output writer.
//!
//! Content goes to a temporary sibling first and is renamed over the
//! destination, so a failed run never leaves a truncated file behind.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::debug;

use crate::error::{FedmetaError, FedmetaResult};

/// Atomically replace `path` with `content`.
pub async fn write_atomic(path: &Path, content: &[u8]) -> FedmetaResult<()> {
    let temp_path = temp_path_for(path);

    if let Err(e) = fs::write(&temp_path, content).await {
        let _ = fs::remove_file(&temp_path).await;
        return Err(output_error(path, format!("failed to write temp file: {}", e)));
    }

    if let Err(e) = fs::rename(&temp_path, path).await {
        let _ = fs::remove_file(&temp_path).await;
        return Err(output_error(path, format!("failed to rename temp file: {}", e)));
    }

    debug!(path = %path.display(), bytes = content.len(), "wrote file");
    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("fedmeta"));
    name.push(format!(".{}.tmp", std::process::id()));
    path.with_file_name(name)
}

fn output_error(path: &Path, message: String) -> FedmetaError {
    FedmetaError::Output {
        path: path.display().to_string(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_creates_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("metadata.json");

        write_atomic(&path, b"{\"entities\":[]}").await.unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"{\"entities\":[]}");
    }

    #[tokio::test]
    async fn test_write_replaces_existing_and_leaves_no_temp() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("metadata.json");
        std::fs::write(&path, b"old").unwrap();

        write_atomic(&path, b"new").await.unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"new");
        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[tokio::test]
    async fn test_write_into_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("metadata.json");

        let err = write_atomic(&path, b"x").await.unwrap_err();
        assert!(matches!(err, FedmetaError::Output { .. }));
        assert!(!path.exists());
    }

    #[test]
    fn test_temp_path_is_sibling() {
        let temp = temp_path_for(Path::new("/var/lib/fedmeta/metadata.json"));
        assert_eq!(temp.parent(), Some(Path::new("/var/lib/fedmeta")));
        assert!(temp
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("metadata.json."));
    }
}
