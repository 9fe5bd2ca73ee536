//! Cached copy of previously verified metadata.
//!
//! The cache is a single file holding a verified metadata document. Its
//! lifetime comes from the `cache_ttl` field inside the document (seconds)
//! counted from the file's modification time. Validation fails closed:
//! anything that cannot be read or parsed counts as stale.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use serde::Deserialize;
use tokio::fs;
use tracing::debug;

use crate::error::{FedmetaError, FedmetaResult};
use crate::output::write_atomic;

#[derive(Debug, Deserialize)]
struct CacheHeader {
    #[serde(default)]
    cache_ttl: Option<u64>,
}

/// A cached metadata file and the facts needed to judge its freshness.
#[derive(Debug, Clone)]
pub struct CachedCopy {
    pub path: PathBuf,

    /// Declared or default lifetime.
    pub cache_ttl: Duration,

    /// Last modification time of the file.
    pub modified: SystemTime,
}

impl CachedCopy {
    /// Inspect a cached file. `None` when it cannot be used at all.
    pub async fn inspect(path: &Path, default_ttl: Duration) -> Option<Self> {
        let content = match fs::read(path).await {
            Ok(content) => content,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "cached copy unreadable");
                return None;
            }
        };

        let header: CacheHeader = match serde_json::from_slice(&content) {
            Ok(header) => header,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "cached copy unparseable");
                return None;
            }
        };

        let modified = match fs::metadata(path).await.and_then(|m| m.modified()) {
            Ok(modified) => modified,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "cached copy has no mtime");
                return None;
            }
        };

        Some(Self {
            path: path.to_path_buf(),
            cache_ttl: header
                .cache_ttl
                .map(Duration::from_secs)
                .unwrap_or(default_ttl),
            modified,
        })
    }

    /// Whether the copy is still fresh at `now`.
    pub fn is_valid_at(&self, now: SystemTime) -> bool {
        is_fresh(self.modified, self.cache_ttl, now)
    }
}

/// `now < modified + ttl`.
pub fn is_fresh(modified: SystemTime, ttl: Duration, now: SystemTime) -> bool {
    match modified.checked_add(ttl) {
        Some(deadline) => now < deadline,
        None => true,
    }
}

/// Whether the cached file at `path` can be reused now.
pub async fn is_cache_valid(path: &Path, default_ttl: Duration) -> bool {
    is_cache_valid_at(path, default_ttl, SystemTime::now()).await
}

/// Whether the cached file at `path` can be reused at `now`.
pub async fn is_cache_valid_at(path: &Path, default_ttl: Duration, now: SystemTime) -> bool {
    match CachedCopy::inspect(path, default_ttl).await {
        Some(copy) => {
            let valid = copy.is_valid_at(now);
            debug!(
                path = %path.display(),
                ttl_secs = copy.cache_ttl.as_secs(),
                valid,
                "checked cached copy"
            );
            valid
        }
        None => false,
    }
}

/// Copy the cached file byte-for-byte to `output`.
///
/// Returns the copied bytes. When both paths name the same file nothing is
/// written, so the cache mtime is not refreshed by reuse.
pub async fn copy_cached(cached: &Path, output: &Path) -> FedmetaResult<Vec<u8>> {
    let content = fs::read(cached)
        .await
        .map_err(|e| cache_copy_error(cached, format!("failed to read: {}", e)))?;

    if same_file(cached, output).await {
        debug!(path = %cached.display(), "cached copy is the output, nothing to copy");
        return Ok(content);
    }

    write_atomic(output, &content)
        .await
        .map_err(|e| cache_copy_error(cached, e.to_string()))?;

    Ok(content)
}

async fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a).await, fs::canonicalize(b).await) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn cache_copy_error(path: &Path, message: String) -> FedmetaError {
    FedmetaError::CacheCopy {
        path: path.display().to_string(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const HOUR: Duration = Duration::from_secs(3600);

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    fn mtime(path: &Path) -> SystemTime {
        std::fs::metadata(path).unwrap().modified().unwrap()
    }

    #[test]
    fn test_is_fresh_boundary() {
        let m = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000_000);
        let ttl = Duration::from_secs(600);

        assert!(is_fresh(m, ttl, m));
        assert!(is_fresh(m, ttl, m + Duration::from_secs(599)));
        assert!(!is_fresh(m, ttl, m + ttl));
        assert!(!is_fresh(m, ttl, m + Duration::from_secs(601)));
    }

    #[test]
    fn test_zero_ttl_is_never_fresh() {
        let m = SystemTime::UNIX_EPOCH + Duration::from_secs(42);
        assert!(!is_fresh(m, Duration::ZERO, m));
    }

    #[tokio::test]
    async fn test_declared_ttl_is_used() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "md.json", r#"{"cache_ttl": 60, "entities": []}"#);
        let m = mtime(&path);

        assert!(is_cache_valid_at(&path, HOUR, m + Duration::from_secs(59)).await);
        assert!(!is_cache_valid_at(&path, HOUR, m + Duration::from_secs(60)).await);
    }

    #[tokio::test]
    async fn test_default_ttl_applies_when_missing() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "md.json", r#"{"entities": []}"#);
        let m = mtime(&path);

        let copy = CachedCopy::inspect(&path, HOUR).await.unwrap();
        assert_eq!(copy.cache_ttl, HOUR);

        assert!(is_cache_valid_at(&path, HOUR, m + Duration::from_secs(3599)).await);
        assert!(!is_cache_valid_at(&path, HOUR, m + HOUR).await);
    }

    #[tokio::test]
    async fn test_fresh_file_is_valid_now() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "md.json", r#"{"cache_ttl": 3600, "entities": []}"#);
        assert!(is_cache_valid(&path, HOUR).await);
    }

    #[tokio::test]
    async fn test_fails_closed() {
        let dir = TempDir::new().unwrap();

        let missing = dir.path().join("missing.json");
        assert!(!is_cache_valid(&missing, HOUR).await);

        let garbage = write(&dir, "garbage.json", "not json at all");
        assert!(!is_cache_valid(&garbage, HOUR).await);

        let bad_ttl = write(&dir, "bad_ttl.json", r#"{"cache_ttl": "soon"}"#);
        assert!(!is_cache_valid(&bad_ttl, HOUR).await);

        let negative = write(&dir, "negative.json", r#"{"cache_ttl": -5}"#);
        assert!(!is_cache_valid(&negative, HOUR).await);

        assert!(!is_cache_valid(dir.path(), HOUR).await);
    }

    #[tokio::test]
    async fn test_copy_cached_is_byte_identical() {
        let dir = TempDir::new().unwrap();
        let content = "{\"cache_ttl\": 3600,\n  \"entities\": [] }\n";
        let cached = write(&dir, "cache.json", content);
        let output = dir.path().join("out.json");

        let copied = copy_cached(&cached, &output).await.unwrap();

        assert_eq!(copied, content.as_bytes());
        assert_eq!(std::fs::read(&output).unwrap(), content.as_bytes());
    }

    #[tokio::test]
    async fn test_copy_cached_onto_itself_keeps_mtime() {
        let dir = TempDir::new().unwrap();
        let cached = write(&dir, "cache.json", r#"{"entities": []}"#);
        let before = mtime(&cached);

        copy_cached(&cached, &cached).await.unwrap();

        assert_eq!(mtime(&cached), before);
    }

    #[tokio::test]
    async fn test_copy_cached_failure_is_cache_copy_error() {
        let dir = TempDir::new().unwrap();
        let cached = write(&dir, "cache.json", r#"{"entities": []}"#);
        let output = dir.path().join("missing").join("out.json");

        let err = copy_cached(&cached, &output).await.unwrap_err();
        assert!(matches!(err, FedmetaError::CacheCopy { .. }));

        let err = copy_cached(&dir.path().join("nope.json"), &dir.path().join("out.json"))
            .await
            .unwrap_err();
        assert!(matches!(err, FedmetaError::CacheCopy { .. }));
    }
}
