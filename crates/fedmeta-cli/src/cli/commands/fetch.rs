//! `fedmeta fetch` - download, verify and store federation metadata.

use anyhow::Result;
use tracing::info;

use fedmeta_core::{fetch_and_verify, AlgorithmPolicy, FetchConfig, FetchOutcome, FetchRequest};

use crate::cli::args::FetchArgs;
use crate::exit_codes::EXIT_SUCCESS;

pub async fn run(args: FetchArgs) -> Result<i32> {
    let config = build_config(&args);
    info!(url = %config.url, algorithms = %config.algorithms, "fetching metadata");

    let mut request = FetchRequest::new(&args.keys, &args.output);
    if let Some(cached) = &args.cached {
        request = request.with_cached(cached);
    }

    match fetch_and_verify(&config, &request).await? {
        FetchOutcome::FromCache { digest } => {
            info!(output = %args.output.display(), %digest, "metadata up to date (cached)");
        }
        FetchOutcome::Verified {
            digest,
            entry_index,
            kid,
        } => {
            info!(
                output = %args.output.display(),
                %digest,
                index = entry_index,
                kid = kid.as_deref().unwrap_or("-"),
                "metadata verified"
            );
        }
    }

    Ok(EXIT_SUCCESS)
}

/// Defaults, then flags (clap has already folded in `FEDMETA_*`).
fn build_config(args: &FetchArgs) -> FetchConfig {
    let mut config = FetchConfig::default();

    if let Some(url) = &args.url {
        config = config.with_url(url.clone());
    }
    if let Some(timeout) = args.timeout {
        config = config.with_timeout_secs(timeout);
    }
    if let Some(ttl) = args.default_cache_ttl {
        config = config.with_default_cache_ttl_secs(ttl);
    }
    if args.any_algorithm {
        config = config.with_algorithms(AlgorithmPolicy::Any);
    } else if let Some(algorithms) = &args.algorithms {
        config = config.with_algorithms(algorithms.clone());
    }

    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn args() -> FetchArgs {
        FetchArgs {
            url: None,
            keys: PathBuf::from("keys.jwks"),
            output: PathBuf::from("md.json"),
            cached: None,
            timeout: None,
            default_cache_ttl: None,
            algorithms: None,
            any_algorithm: false,
        }
    }

    #[test]
    fn test_flags_override_defaults() {
        let config = build_config(&FetchArgs {
            url: Some("https://md.example.org/md.json".to_string()),
            timeout: Some(3),
            default_cache_ttl: Some(10),
            any_algorithm: true,
            ..args()
        });

        assert_eq!(config.url, "https://md.example.org/md.json");
        assert_eq!(config.timeout_secs, 3);
        assert_eq!(config.default_cache_ttl_secs, 10);
        assert_eq!(config.algorithms, AlgorithmPolicy::Any);
    }

    #[test]
    fn test_any_algorithm_wins_over_pinned_list() {
        let config = build_config(&FetchArgs {
            algorithms: Some("ES384".parse().unwrap()),
            any_algorithm: true,
            ..args()
        });
        assert_eq!(config.algorithms, AlgorithmPolicy::Any);

        let config = build_config(&FetchArgs {
            algorithms: Some("ES384".parse().unwrap()),
            ..args()
        });
        assert_eq!(config.algorithms.to_string(), "ES384");
    }

    #[test]
    fn test_unset_flags_keep_defaults() {
        let config = build_config(&args());
        let defaults = FetchConfig::default();
        assert_eq!(config.url, defaults.url);
        assert_eq!(config.timeout_secs, defaults.timeout_secs);
        assert_eq!(config.default_cache_ttl_secs, defaults.default_cache_ttl_secs);
        assert_eq!(config.algorithms, defaults.algorithms);
    }
}
