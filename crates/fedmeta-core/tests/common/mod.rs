//! Shared helpers for minting signed metadata envelopes in tests.

#![allow(dead_code)]

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use p256::ecdsa::signature::Signer;
use p256::ecdsa::{Signature, SigningKey};
use p256::elliptic_curve::sec1::ToEncodedPoint;
use serde_json::json;

pub const METADATA: &str = r#"{"cache_ttl": 3600, "entities": [{"entity_id": "https://a.example.org"}, {"entity_id": "https://b.example.org"}]}"#;

/// ES256 signer with a random key.
pub struct TestSigner {
    key: SigningKey,
    kid: String,
}

impl TestSigner {
    pub fn new(kid: &str) -> Self {
        Self {
            key: SigningKey::random(&mut rand::thread_rng()),
            kid: kid.to_string(),
        }
    }

    pub fn jwks(&self) -> String {
        let point = self.key.verifying_key().to_encoded_point(false);
        json!({
            "keys": [{
                "kty": "EC",
                "crv": "P-256",
                "kid": self.kid,
                "x": URL_SAFE_NO_PAD.encode(point.x().unwrap()),
                "y": URL_SAFE_NO_PAD.encode(point.y().unwrap()),
            }]
        })
        .to_string()
    }

    /// Envelope with one entry per `exp`, in order.
    pub fn envelope(&self, payload: &str, exps: &[i64]) -> String {
        let payload_b64 = URL_SAFE_NO_PAD.encode(payload);
        let signatures: Vec<_> = exps
            .iter()
            .map(|exp| {
                let header = json!({"alg": "ES256", "kid": self.kid, "exp": exp});
                let protected = URL_SAFE_NO_PAD.encode(header.to_string());
                let signing_input = format!("{}.{}", protected, payload_b64);
                let signature: Signature = self.key.sign(signing_input.as_bytes());
                json!({
                    "protected": protected,
                    "signature": URL_SAFE_NO_PAD.encode(signature.to_bytes()),
                })
            })
            .collect();

        json!({ "payload": payload_b64, "signatures": signatures }).to_string()
    }
}

pub fn in_a_day() -> i64 {
    chrono::Utc::now().timestamp() + 86_400
}

pub fn yesterday() -> i64 {
    chrono::Utc::now().timestamp() - 86_400
}
