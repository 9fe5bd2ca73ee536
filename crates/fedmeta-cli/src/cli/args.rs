use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use fedmeta_core::AlgorithmPolicy;

#[derive(Parser, Debug)]
#[command(
    name = "fedmeta",
    version,
    about = "Fetch, verify and inspect signed federation metadata"
)]
pub struct Cli {
    /// Debug logging (overrides RUST_LOG)
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Download and verify metadata, reusing a fresh cached copy
    Fetch(FetchArgs),
    /// Print entities of verified metadata
    List(ListArgs),
    /// Print connection details for an entity's servers
    Resolve(ResolveArgs),
}

#[derive(Args, Debug)]
pub struct FetchArgs {
    /// Metadata URL
    #[arg(long, env = "FEDMETA_URL")]
    pub url: Option<String>,

    /// Trusted key set (JWKS, JWK or PEM public key)
    #[arg(long)]
    pub keys: PathBuf,

    /// Where verified metadata is written
    #[arg(long, short)]
    pub output: PathBuf,

    /// Previously verified metadata to reuse while fresh
    #[arg(long)]
    pub cached: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long, env = "FEDMETA_TIMEOUT")]
    pub timeout: Option<u64>,

    /// TTL for cached copies without cache_ttl
    #[arg(long, env = "FEDMETA_DEFAULT_CACHE_TTL")]
    pub default_cache_ttl: Option<u64>,

    /// Accepted signature algorithms, comma separated, or `any`
    #[arg(long, env = "FEDMETA_ALGORITHMS")]
    pub algorithms: Option<AlgorithmPolicy>,

    /// Accept any signature algorithm (overrides --algorithms)
    #[arg(long)]
    pub any_algorithm: bool,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Verified metadata file
    pub metadata: PathBuf,

    /// Only print this entity
    #[arg(long)]
    pub entity: Option<String>,

    /// Compare --entity with entity ids as normalized URLs
    #[arg(long)]
    pub normalize_urls: bool,

    /// Print server names
    #[arg(long)]
    pub servers: bool,

    /// Print server base URIs
    #[arg(long)]
    pub base_uris: bool,

    /// Print client names
    #[arg(long)]
    pub clients: bool,

    /// Print distinct server tag combinations
    #[arg(long)]
    pub server_tags: bool,
}

#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Verified metadata file
    pub metadata: PathBuf,

    /// Entity id (compared as normalized URL)
    #[arg(long)]
    pub entity: String,

    /// Server name; may be omitted when the entity has a single server
    #[arg(long, conflicts_with = "tags")]
    pub server: Option<String>,

    /// Select every server with exactly these tags
    #[arg(long, value_delimiter = ',')]
    pub tags: Option<Vec<String>>,

    /// Write the entity's CA certificates to this file
    #[arg(long)]
    pub ca_out: Option<PathBuf>,
}
