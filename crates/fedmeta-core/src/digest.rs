use sha2::{Digest, Sha256};

/// SHA-256 digest of a payload, formatted as `sha256:<hex>`.
pub fn sha256_digest(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("sha256:{:x}", hasher.finalize())
}
