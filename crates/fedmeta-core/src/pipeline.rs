//! Fetch-and-verify run.
//!
//! Order of work:
//! 1. A fresh cached copy is copied to the output and the run ends.
//! 2. The trusted key set is loaded.
//! 3. The envelope is downloaded and verified.
//! 4. The verified payload is written to the output, and to the cache path
//!    when one was given.
//!
//! Nothing is written before verification succeeds.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::cache::{copy_cached, is_cache_valid};
use crate::client::MetadataClient;
use crate::config::FetchConfig;
use crate::digest::sha256_digest;
use crate::error::FedmetaResult;
use crate::keys::KeySet;
use crate::output::write_atomic;
use crate::verify::verify_envelope;

/// Paths involved in one run.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    /// Trusted key set file.
    pub keys_path: PathBuf,

    /// Where the verified metadata is written.
    pub output_path: PathBuf,

    /// Previously verified metadata that may be reused.
    pub cached_path: Option<PathBuf>,
}

impl FetchRequest {
    pub fn new(keys_path: impl Into<PathBuf>, output_path: impl Into<PathBuf>) -> Self {
        Self {
            keys_path: keys_path.into(),
            output_path: output_path.into(),
            cached_path: None,
        }
    }

    pub fn with_cached(mut self, cached_path: impl Into<PathBuf>) -> Self {
        self.cached_path = Some(cached_path.into());
        self
    }
}

/// What a successful run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The cached copy was still fresh and was reused.
    FromCache { digest: String },

    /// A downloaded envelope verified.
    Verified {
        digest: String,
        entry_index: usize,
        kid: Option<String>,
    },
}

impl FetchOutcome {
    /// Digest of the metadata now at the output path.
    pub fn digest(&self) -> &str {
        match self {
            Self::FromCache { digest } | Self::Verified { digest, .. } => digest,
        }
    }
}

/// Produce verified metadata at `request.output_path`.
pub async fn fetch_and_verify(
    config: &FetchConfig,
    request: &FetchRequest,
) -> FedmetaResult<FetchOutcome> {
    let default_ttl = Duration::from_secs(config.default_cache_ttl_secs);

    if let Some(cached) = &request.cached_path {
        if is_cache_valid(cached, default_ttl).await {
            let content = copy_cached(cached, &request.output_path).await?;
            let digest = sha256_digest(&content);
            info!(
                cached = %cached.display(),
                output = %request.output_path.display(),
                %digest,
                "using cached metadata"
            );
            return Ok(FetchOutcome::FromCache { digest });
        }
        debug!(cached = %cached.display(), "cached metadata not usable, fetching");
    }

    let key_set = KeySet::load(&request.keys_path).await?;

    let client = MetadataClient::new(config)?;
    let envelope = client.fetch(&config.url).await?;

    let verified = verify_envelope(&envelope, &key_set, &config.algorithms)?;

    write_atomic(&request.output_path, &verified.payload).await?;

    // Output is already written; refresh failure is not fatal.
    if let Some(cached) = &request.cached_path {
        if let Err(e) = refresh_cache(cached, &request.output_path, &verified.payload).await {
            warn!(cached = %cached.display(), error = %e, "failed to refresh cached metadata");
        }
    }

    info!(
        url = %config.url,
        output = %request.output_path.display(),
        index = verified.entry_index,
        kid = ?verified.kid,
        digest = %verified.digest,
        "verified metadata written"
    );

    Ok(FetchOutcome::Verified {
        digest: verified.digest,
        entry_index: verified.entry_index,
        kid: verified.kid,
    })
}

async fn refresh_cache(cached: &Path, output: &Path, payload: &[u8]) -> FedmetaResult<()> {
    if cached == output {
        return Ok(());
    }
    write_atomic(cached, payload).await?;
    debug!(cached = %cached.display(), "refreshed cached metadata");
    Ok(())
}
