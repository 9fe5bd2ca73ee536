//! Fetch configuration and its defaults.

use std::fmt;
use std::str::FromStr;

use jsonwebtoken::Algorithm;
use serde::{Deserialize, Serialize};

use crate::error::{FedmetaError, FedmetaResult};

/// Metadata published by the federation operator.
pub const DEFAULT_METADATA_URL: &str =
    "https://fedscim-poc.skolfederation.se/md/skolfederation-fedscim-0_1.json";

/// TTL applied to a cached copy that does not declare `cache_ttl`.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 3600;

/// Network timeout for the metadata download.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Which JWS algorithms a signature entry may use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlgorithmPolicy {
    /// Accept whatever algorithm the protected header names.
    Any,

    /// Only accept the listed algorithms.
    Pinned(Vec<Algorithm>),
}

impl AlgorithmPolicy {
    /// Whether `alg` may be used to verify an entry.
    pub fn permits(&self, alg: Algorithm) -> bool {
        match self {
            Self::Any => true,
            Self::Pinned(allowed) => allowed.contains(&alg),
        }
    }

    /// Pin a single algorithm.
    pub fn pinned(alg: Algorithm) -> Self {
        Self::Pinned(vec![alg])
    }
}

impl Default for AlgorithmPolicy {
    fn default() -> Self {
        Self::pinned(Algorithm::ES256)
    }
}

impl FromStr for AlgorithmPolicy {
    type Err = FedmetaError;

    /// Parses `any` or a comma separated list such as `ES256,ES384`.
    fn from_str(s: &str) -> FedmetaResult<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("any") {
            return Ok(Self::Any);
        }

        let mut allowed = Vec::new();
        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let alg = Algorithm::from_str(part).map_err(|_| FedmetaError::Config {
                message: format!("unknown signature algorithm: {}", part),
            })?;
            if !allowed.contains(&alg) {
                allowed.push(alg);
            }
        }

        if allowed.is_empty() {
            return Err(FedmetaError::Config {
                message: "algorithm allow-list is empty".to_string(),
            });
        }

        Ok(Self::Pinned(allowed))
    }
}

impl fmt::Display for AlgorithmPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => write!(f, "any"),
            Self::Pinned(allowed) => {
                let names: Vec<String> = allowed.iter().map(|a| format!("{:?}", a)).collect();
                write!(f, "{}", names.join(","))
            }
        }
    }
}

/// Fetch-and-verify configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Metadata URL.
    #[serde(default = "default_metadata_url")]
    pub url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// TTL for cached copies without `cache_ttl`.
    #[serde(default = "default_cache_ttl")]
    pub default_cache_ttl_secs: u64,

    /// Accepted signature algorithms.
    #[serde(default)]
    pub algorithms: AlgorithmPolicy,
}

fn default_metadata_url() -> String {
    DEFAULT_METADATA_URL.to_string()
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_cache_ttl() -> u64 {
    DEFAULT_CACHE_TTL_SECS
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            url: default_metadata_url(),
            timeout_secs: default_timeout(),
            default_cache_ttl_secs: default_cache_ttl(),
            algorithms: AlgorithmPolicy::default(),
        }
    }
}

impl FetchConfig {
    /// Create config from environment variables.
    ///
    /// | Variable | Description |
    /// |----------|-------------|
    /// | `FEDMETA_URL` | Metadata URL |
    /// | `FEDMETA_TIMEOUT` | Request timeout in seconds |
    /// | `FEDMETA_DEFAULT_CACHE_TTL` | TTL for cached copies without `cache_ttl` |
    /// | `FEDMETA_ALGORITHMS` | `any` or a comma separated allow-list |
    pub fn from_env() -> Self {
        let algorithms = match std::env::var("FEDMETA_ALGORITHMS") {
            Ok(v) => v.parse().unwrap_or_else(|e| {
                tracing::warn!(error = %e, "ignoring FEDMETA_ALGORITHMS");
                AlgorithmPolicy::default()
            }),
            Err(_) => AlgorithmPolicy::default(),
        };

        Self {
            url: std::env::var("FEDMETA_URL").unwrap_or_else(|_| default_metadata_url()),
            timeout_secs: env_secs("FEDMETA_TIMEOUT", default_timeout),
            default_cache_ttl_secs: env_secs("FEDMETA_DEFAULT_CACHE_TTL", default_cache_ttl),
            algorithms,
        }
    }

    /// Set the metadata URL.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Set the request timeout.
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Set the default cache TTL.
    pub fn with_default_cache_ttl_secs(mut self, secs: u64) -> Self {
        self.default_cache_ttl_secs = secs;
        self
    }

    /// Set the algorithm policy.
    pub fn with_algorithms(mut self, algorithms: AlgorithmPolicy) -> Self {
        self.algorithms = algorithms;
        self
    }
}

fn env_secs(name: &str, default: fn() -> u64) -> u64 {
    match std::env::var(name) {
        Ok(v) => v.trim().parse().unwrap_or_else(|e| {
            tracing::warn!(
                variable = name,
                value = %v,
                error = %e,
                "ignoring invalid seconds value"
            );
            default()
        }),
        Err(_) => default(),
    }
}
