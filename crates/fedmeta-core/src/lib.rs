//! Fetch, verify and inspect signed federation metadata.
//!
//! This crate provides:
//!
//! - Download of a JWS signed metadata envelope
//! - Verification against a local trusted key set with per-entry expiry
//! - Reuse of a cached copy while its `cache_ttl` has not elapsed
//! - Atomic output so failed runs leave existing files untouched
//! - Listing and server resolution over verified metadata
//!
//! # Quick Start
//!
//! ```no_run
//! use fedmeta_core::{fetch_and_verify, FetchConfig, FetchRequest};
//!
//! # async fn example() -> Result<(), fedmeta_core::FedmetaError> {
//! let config = FetchConfig::from_env();
//! let request = FetchRequest::new("keys.jwks", "metadata.json").with_cached("metadata.json");
//!
//! let outcome = fetch_and_verify(&config, &request).await?;
//! println!("metadata digest: {}", outcome.digest());
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! | Environment Variable | Description |
//! |---------------------|-------------|
//! | `FEDMETA_URL` | Metadata URL (default: [`DEFAULT_METADATA_URL`]) |
//! | `FEDMETA_TIMEOUT` | Request timeout in seconds (default: 30) |
//! | `FEDMETA_DEFAULT_CACHE_TTL` | TTL for cached copies without `cache_ttl` (default: 3600) |
//! | `FEDMETA_ALGORITHMS` | `any` or an allow-list such as `ES256,ES384` (default: `ES256`) |

pub mod cache;
pub mod client;
pub mod config;
mod digest;
pub mod envelope;
pub mod error;
pub mod keys;
pub mod listing;
pub mod metadata;
pub mod output;
pub mod pipeline;
pub mod resolve;
pub mod verify;

// Re-export main types
pub use cache::{copy_cached, is_cache_valid, CachedCopy};
pub use client::MetadataClient;
pub use config::{
    AlgorithmPolicy, FetchConfig, DEFAULT_CACHE_TTL_SECS, DEFAULT_METADATA_URL,
    DEFAULT_TIMEOUT_SECS,
};
pub use digest::sha256_digest;
pub use envelope::{SignatureEntry, SignedEnvelope};
pub use error::{FedmetaError, FedmetaResult};
pub use keys::{KeySet, TrustedKey};
pub use listing::{write_listing, ListOptions};
pub use metadata::{
    canonical_tags, normalize_url, url_equals, Client, Entity, EntityMatch, Issuer, Metadata,
    Pin, Server,
};
pub use output::write_atomic;
pub use pipeline::{fetch_and_verify, FetchOutcome, FetchRequest};
pub use resolve::{concatenate_pins, resolve_server, EndPoint, ServerConnection, ServerSelector};
pub use verify::{verify_envelope, verify_envelope_at, VerifiedPayload};

// Algorithm names used by `AlgorithmPolicy`.
pub use jsonwebtoken::Algorithm;
