//! `fedmeta list` - print entities of a verified metadata file.

use std::io::Write;

use anyhow::{Context, Result};
use tracing::debug;

use fedmeta_core::{write_listing, EntityMatch, ListOptions, Metadata};

use crate::cli::args::ListArgs;
use crate::exit_codes::EXIT_SUCCESS;

pub async fn run(args: ListArgs) -> Result<i32> {
    let metadata = Metadata::load(&args.metadata).await?;

    let options = ListOptions {
        entity: args.entity,
        entity_match: if args.normalize_urls {
            EntityMatch::NormalizedUrl
        } else {
            EntityMatch::Exact
        },
        servers: args.servers,
        base_uris: args.base_uris,
        clients: args.clients,
        server_tags: args.server_tags,
    };

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let printed =
        write_listing(&metadata, &options, &mut out).context("failed to write listing")?;
    out.flush().context("failed to write listing")?;

    debug!(entities = printed, "listed metadata");
    Ok(EXIT_SUCCESS)
}
