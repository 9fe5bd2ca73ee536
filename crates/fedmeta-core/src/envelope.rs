//! Wire format of the signed metadata envelope (JWS JSON serialization).
//!
//! Parsing and shape checks only; no cryptographic verification.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{FedmetaError, FedmetaResult};

/// Signed envelope: one payload shared by independently verifiable signatures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignedEnvelope {
    /// Base64url-encoded payload.
    pub payload: String,

    /// Signature entries, tried in order.
    pub signatures: Vec<SignatureEntry>,
}

/// One signature over the envelope payload.
///
/// Fields are optional so that one malformed entry does not reject the
/// whole envelope.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignatureEntry {
    /// Base64url-encoded protected header.
    #[serde(default)]
    pub protected: Option<String>,

    /// Base64url-encoded signature.
    #[serde(default)]
    pub signature: Option<String>,
}

/// Fields of the protected header needed before verification.
#[derive(Debug, Clone, Deserialize)]
pub struct ProtectedHeader {
    /// Expiry, Unix seconds.
    #[serde(deserialize_with = "deserialize_exp")]
    pub exp: i64,

    #[serde(default)]
    pub alg: Option<String>,

    #[serde(default)]
    pub kid: Option<String>,
}

impl ProtectedHeader {
    /// Expiry as a UTC timestamp, `None` if out of range.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ExpValue {
    Int(i64),
    Float(f64),
    Text(String),
}

fn deserialize_exp<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;

    match ExpValue::deserialize(deserializer)? {
        ExpValue::Int(v) => Ok(v),
        ExpValue::Float(v) if v.is_finite() => Ok(v.trunc() as i64),
        ExpValue::Float(v) => Err(D::Error::custom(format!("invalid exp: {}", v))),
        ExpValue::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| D::Error::custom(format!("invalid exp: {}", s))),
    }
}

impl SignedEnvelope {
    /// Parse the downloaded envelope.
    pub fn from_slice(bytes: &[u8]) -> FedmetaResult<Self> {
        serde_json::from_slice(bytes)
            .map_err(|e| FedmetaError::verification(format!("invalid signed envelope: {}", e)))
    }

    /// JWS signing input `protected.payload` and the entry's signature.
    pub fn signing_input<'a>(
        &self,
        entry: &'a SignatureEntry,
    ) -> Result<(String, &'a str), String> {
        let protected = entry
            .protected
            .as_deref()
            .ok_or("signature entry has no protected header")?;
        let signature = entry
            .signature
            .as_deref()
            .ok_or("signature entry has no signature")?;
        Ok((format!("{}.{}", protected, self.payload), signature))
    }

    /// Decoded payload bytes.
    pub fn payload_bytes(&self) -> Result<Vec<u8>, String> {
        decode_b64url(&self.payload).map_err(|e| format!("invalid payload encoding: {}", e))
    }
}

impl SignatureEntry {
    /// Decode the protected header without verifying the signature.
    pub fn unverified_header(&self) -> Result<ProtectedHeader, String> {
        let protected = self
            .protected
            .as_deref()
            .ok_or("signature entry has no protected header")?;
        let bytes =
            decode_b64url(protected).map_err(|e| format!("invalid protected header: {}", e))?;
        serde_json::from_slice(&bytes).map_err(|e| format!("invalid protected header: {}", e))
    }
}

/// Base64url decoding that tolerates trailing padding.
pub(crate) fn decode_b64url(input: &str) -> Result<Vec<u8>, base64::DecodeError> {
    URL_SAFE_NO_PAD.decode(input.trim().trim_end_matches('='))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(value: &serde_json::Value) -> String {
        URL_SAFE_NO_PAD.encode(value.to_string())
    }

    #[test]
    fn test_parse_envelope() {
        let doc = serde_json::json!({
            "payload": URL_SAFE_NO_PAD.encode(b"{\"entities\":[]}"),
            "signatures": [
                {"protected": "aaa", "signature": "bbb"},
                {"signature": "ccc"}
            ]
        });
        let envelope = SignedEnvelope::from_slice(doc.to_string().as_bytes()).unwrap();

        assert_eq!(envelope.signatures.len(), 2);
        let (input, signature) = envelope.signing_input(&envelope.signatures[0]).unwrap();
        assert_eq!(input, format!("aaa.{}", envelope.payload));
        assert_eq!(signature, "bbb");
        assert!(envelope.signing_input(&envelope.signatures[1]).is_err());
        assert_eq!(envelope.payload_bytes().unwrap(), b"{\"entities\":[]}");
    }

    #[test]
    fn test_envelope_without_signatures_field_is_rejected() {
        let err = SignedEnvelope::from_slice(br#"{"payload": "e30"}"#).unwrap_err();
        assert!(matches!(err, FedmetaError::Verification { .. }));

        let err = SignedEnvelope::from_slice(b"<html>not json</html>").unwrap_err();
        assert!(matches!(err, FedmetaError::Verification { .. }));
    }

    #[test]
    fn test_header_exp_accepts_int_and_string() {
        let entry = SignatureEntry {
            protected: Some(encode(&serde_json::json!({"alg": "ES256", "exp": 1700000000}))),
            signature: None,
        };
        let header = entry.unverified_header().unwrap();
        assert_eq!(header.exp, 1_700_000_000);
        assert_eq!(header.alg.as_deref(), Some("ES256"));
        assert_eq!(
            header.expires_at().unwrap(),
            DateTime::from_timestamp(1_700_000_000, 0).unwrap()
        );

        let entry = SignatureEntry {
            protected: Some(encode(&serde_json::json!({"alg": "ES256", "exp": "1700000000"}))),
            signature: None,
        };
        assert_eq!(entry.unverified_header().unwrap().exp, 1_700_000_000);
    }

    #[test]
    fn test_header_without_exp_is_malformed() {
        let entry = SignatureEntry {
            protected: Some(encode(&serde_json::json!({"alg": "ES256"}))),
            signature: Some("sig".to_string()),
        };
        assert!(entry.unverified_header().is_err());

        let entry = SignatureEntry {
            protected: Some("%%%".to_string()),
            signature: Some("sig".to_string()),
        };
        assert!(entry.unverified_header().is_err());
    }

    #[test]
    fn test_padded_base64url_is_tolerated() {
        assert_eq!(decode_b64url("e30=").unwrap(), b"{}");
        assert_eq!(decode_b64url("e30").unwrap(), b"{}");
    }
}
