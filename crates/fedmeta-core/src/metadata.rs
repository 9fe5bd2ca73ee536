//! Verified federation metadata document.

use std::path::Path;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{FedmetaError, FedmetaResult};

/// Top-level metadata document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Metadata {
    /// Declared cache lifetime in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_ttl: Option<u64>,

    pub entities: Vec<Entity>,
}

/// A federation member.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Entity {
    pub entity_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,

    /// CA certificates for the entity's servers.
    #[serde(default)]
    pub issuers: Vec<Issuer>,

    #[serde(default)]
    pub servers: Vec<Server>,

    #[serde(default)]
    pub clients: Vec<Client>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Issuer {
    /// PEM encoded certificate.
    pub x509certificate: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Server {
    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_uri: Option<String>,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub pins: Vec<Pin>,
}

impl Server {
    /// Lower-cased, sorted, deduplicated tags.
    pub fn canonical_tags(&self) -> Vec<String> {
        canonical_tags(&self.tags)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Client {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub pins: Vec<Pin>,
}

/// A pinned public key: hash algorithm and base64 digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pin {
    #[serde(alias = "alg")]
    pub name: String,

    #[serde(alias = "digest")]
    pub value: String,
}

impl Metadata {
    /// Read and parse a metadata file.
    pub async fn load(path: &Path) -> FedmetaResult<Self> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| metadata_read_error(path, e.to_string()))?;
        Self::from_slice(&bytes).map_err(|e| metadata_read_error(path, e.to_string()))
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

fn metadata_read_error(path: &Path, message: String) -> FedmetaError {
    FedmetaError::MetadataRead {
        path: path.display().to_string(),
        message,
    }
}

/// Lower-case, sort and deduplicate a tag list.
pub fn canonical_tags<S: AsRef<str>>(tags: &[S]) -> Vec<String> {
    let mut result: Vec<String> = tags.iter().map(|t| t.as_ref().to_lowercase()).collect();
    result.sort();
    result.dedup();
    result
}

/// Normalize a URL so logically equal URLs compare equal as strings.
///
/// A missing scheme defaults to `https`. Returns `None` for unparseable input.
pub fn normalize_url(input: &str) -> Option<String> {
    let input = input.trim();
    let parsed = match Url::parse(input) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            Url::parse(&format!("https://{}", input)).ok()?
        }
        Err(_) => return None,
    };
    Some(parsed.to_string())
}

/// Whether two URLs are equal after normalization. False if either is invalid.
pub fn url_equals(a: &str, b: &str) -> bool {
    match (normalize_url(a), normalize_url(b)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// How an entity filter is compared with `entity_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EntityMatch {
    /// Exact string equality.
    #[default]
    Exact,

    /// Equality after URL normalization.
    NormalizedUrl,
}

impl EntityMatch {
    pub fn matches(self, entity_id: &str, wanted: &str) -> bool {
        match self {
            Self::Exact => entity_id == wanted,
            Self::NormalizedUrl => url_equals(entity_id, wanted),
        }
    }
}
