//! Envelope verification.
//!
//! Each signature entry is tried in envelope order against the whole key set.
//! Expired or unverifiable entries are skipped; the first entry that verifies
//! yields the payload and ends the search.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use jsonwebtoken::{crypto, Algorithm};
use tracing::{debug, info};

use crate::config::AlgorithmPolicy;
use crate::digest::sha256_digest;
use crate::envelope::{SignatureEntry, SignedEnvelope};
use crate::error::{FedmetaError, FedmetaResult};
use crate::keys::KeySet;


/// Payload of a successfully verified envelope.
#[derive(Debug, Clone)]
pub struct VerifiedPayload {
    /// Decoded payload bytes, exactly as signed.
    pub payload: Vec<u8>,

    /// Position of the entry that verified.
    pub entry_index: usize,

    /// Key ID of the key that verified the entry.
    pub kid: Option<String>,

    /// Algorithm of the verified entry.
    pub algorithm: Algorithm,

    /// Digest of the payload (sha256:...).
    pub digest: String,
}

/// Result of trying one signature entry.
#[derive(Debug)]
enum EntryOutcome {
    Verified {
        payload: Vec<u8>,
        kid: Option<String>,
        algorithm: Algorithm,
    },
    Expired(DateTime<Utc>),
    Rejected(String),
}

/// Verify a downloaded envelope against the trusted key set.
pub fn verify_envelope(
    envelope_bytes: &[u8],
    key_set: &KeySet,
    policy: &AlgorithmPolicy,
) -> FedmetaResult<VerifiedPayload> {
    verify_envelope_at(envelope_bytes, key_set, policy, Utc::now())
}

/// Verify a downloaded envelope, judging expiry against `now`.
pub fn verify_envelope_at(
    envelope_bytes: &[u8],
    key_set: &KeySet,
    policy: &AlgorithmPolicy,
    now: DateTime<Utc>,
) -> FedmetaResult<VerifiedPayload> {
    let envelope = SignedEnvelope::from_slice(envelope_bytes)?;

    if envelope.signatures.is_empty() {
        return Err(FedmetaError::verification("no signatures in envelope"));
    }

    let mut expired = 0usize;
    let mut rejected = 0usize;

    for (index, entry) in envelope.signatures.iter().enumerate() {
        match verify_entry(&envelope, entry, key_set, policy, now) {
            EntryOutcome::Verified {
                payload,
                kid,
                algorithm,
            } => {
                let digest = sha256_digest(&payload);
                debug!(index, kid = ?kid, algorithm = ?algorithm, %digest, "signature verified");
                return Ok(VerifiedPayload {
                    payload,
                    entry_index: index,
                    kid,
                    algorithm,
                    digest,
                });
            }
            EntryOutcome::Expired(expired_at) => {
                info!(index, %expired_at, "signature expired");
                expired += 1;
            }
            EntryOutcome::Rejected(reason) => {
                debug!(index, %reason, "signature rejected");
                rejected += 1;
            }
        }
    }

    Err(FedmetaError::verification(format!(
        "no signature entry verified ({} expired, {} rejected)",
        expired, rejected
    )))
}

fn verify_entry(
    envelope: &SignedEnvelope,
    entry: &SignatureEntry,
    key_set: &KeySet,
    policy: &AlgorithmPolicy,
    now: DateTime<Utc>,
) -> EntryOutcome {
    let header = match entry.unverified_header() {
        Ok(header) => header,
        Err(reason) => return EntryOutcome::Rejected(reason),
    };

    let expires_at = match header.expires_at() {
        Some(at) => at,
        None => return EntryOutcome::Rejected(format!("exp out of range: {}", header.exp)),
    };
    if expires_at < now {
        return EntryOutcome::Expired(expires_at);
    }

    let alg_name = match header.alg.as_deref() {
        Some(name) => name,
        None => return EntryOutcome::Rejected("protected header has no alg".to_string()),
    };
    let algorithm = match Algorithm::from_str(alg_name) {
        Ok(alg) => alg,
        Err(_) => return EntryOutcome::Rejected(format!("unsupported algorithm: {}", alg_name)),
    };
    if !policy.permits(algorithm) {
        return EntryOutcome::Rejected(format!(
            "algorithm {:?} not allowed (allowed: {})",
            algorithm, policy
        ));
    }

    let (signing_input, signature) = match envelope.signing_input(entry) {
        Ok(parts) => parts,
        Err(reason) => return EntryOutcome::Rejected(reason),
    };

    match verify_signature(signature, signing_input.as_bytes(), algorithm, key_set) {
        Ok(kid) => match envelope.payload_bytes() {
            Ok(payload) => EntryOutcome::Verified {
                payload,
                kid,
                algorithm,
            },
            Err(reason) => EntryOutcome::Rejected(reason),
        },
        Err(reason) => EntryOutcome::Rejected(reason),
    }
}

/// Try every key of the set; the first key that verifies wins.
///
/// Only the signature is checked. The payload stays opaque bytes.
fn verify_signature(
    signature: &str,
    signing_input: &[u8],
    algorithm: Algorithm,
    key_set: &KeySet,
) -> Result<Option<String>, String> {
    if key_set.is_empty() {
        return Err("key set is empty".to_string());
    }

    let mut last_error = None;

    for key in key_set.keys() {
        match crypto::verify(signature, signing_input, &key.key, algorithm) {
            Ok(true) => return Ok(key.kid.clone()),
            Ok(false) => last_error = Some("signature does not match".to_string()),
            Err(e) => last_error = Some(e.to_string()),
        }
    }

    Err(last_error.unwrap_or_else(|| "no key verified the signature".to_string()))
}
