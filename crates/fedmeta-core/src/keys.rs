//! Trusted key set for signature verification.
//!
//! The key set is read once from a local file and never changes afterwards.
//! Three input shapes are accepted and normalized into the same [`KeySet`]:
//!
//! - a JWK Set: `{"keys": [<jwk>, ...]}`
//! - a single JWK object
//! - a PEM encoded public key (EC, RSA or Ed25519)

use std::fmt;
use std::path::Path;

use jsonwebtoken::jwk::{Jwk, JwkSet};
use jsonwebtoken::DecodingKey;
use tracing::{debug, warn};

use crate::error::{FedmetaError, FedmetaResult};

/// A single verification key.
#[derive(Clone)]
pub struct TrustedKey {
    /// Key ID from the JWK, if any.
    pub kid: Option<String>,

    /// Key material for the JWS primitive.
    pub key: DecodingKey,
}

impl fmt::Debug for TrustedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrustedKey")
            .field("kid", &self.kid)
            .finish_non_exhaustive()
    }
}

/// Immutable set of trusted verification keys.
#[derive(Debug, Clone, Default)]
pub struct KeySet {
    keys: Vec<TrustedKey>,
}

impl KeySet {
    /// Build a key set from already decoded keys.
    pub fn from_keys(keys: Vec<TrustedKey>) -> Self {
        Self { keys }
    }

    /// Load the key set from a local file.
    pub async fn load(path: &Path) -> FedmetaResult<Self> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| key_read_error(path, e.to_string()))?;

        let key_set = Self::parse(&bytes).map_err(|message| key_read_error(path, message))?;
        if key_set.is_empty() {
            return Err(key_read_error(path, "no usable keys".to_string()));
        }
        debug!(path = %path.display(), keys = key_set.len(), "loaded key set");
        Ok(key_set)
    }

    /// Parse key set bytes in any of the supported shapes.
    pub fn parse(bytes: &[u8]) -> Result<Self, String> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| format!("key set is not valid UTF-8: {}", e))?
            .trim();

        if text.starts_with("-----BEGIN") {
            return decode_pem(text.as_bytes()).map(|key| Self {
                keys: vec![TrustedKey { kid: None, key }],
            });
        }

        let value: serde_json::Value =
            serde_json::from_str(text).map_err(|e| format!("invalid key set JSON: {}", e))?;

        if value.get("keys").is_some() {
            let set: JwkSet =
                serde_json::from_value(value).map_err(|e| format!("invalid JWK set: {}", e))?;
            return Ok(Self::from_jwks(&set.keys));
        }

        let jwk: Jwk = serde_json::from_value(value).map_err(|e| format!("invalid JWK: {}", e))?;
        let key = DecodingKey::from_jwk(&jwk).map_err(|e| format!("unusable JWK: {}", e))?;
        Ok(Self {
            keys: vec![TrustedKey {
                kid: jwk.common.key_id.clone(),
                key,
            }],
        })
    }

    fn from_jwks(jwks: &[Jwk]) -> Self {
        let mut keys = Vec::with_capacity(jwks.len());
        for jwk in jwks {
            match DecodingKey::from_jwk(jwk) {
                Ok(key) => keys.push(TrustedKey {
                    kid: jwk.common.key_id.clone(),
                    key,
                }),
                Err(e) => {
                    warn!(kid = ?jwk.common.key_id, error = %e, "skipping unusable key");
                }
            }
        }
        Self { keys }
    }

    /// Keys in file order.
    pub fn keys(&self) -> &[TrustedKey] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

fn decode_pem(pem: &[u8]) -> Result<DecodingKey, String> {
    DecodingKey::from_ec_pem(pem)
        .or_else(|_| DecodingKey::from_rsa_pem(pem))
        .or_else(|_| DecodingKey::from_ed_pem(pem))
        .map_err(|e| format!("unsupported PEM public key: {}", e))
}

fn key_read_error(path: &Path, message: String) -> FedmetaError {
    FedmetaError::KeyRead {
        path: path.display().to_string(),
        message,
    }
}
