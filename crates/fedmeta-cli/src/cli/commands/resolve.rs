//! `fedmeta resolve` - connection details for an entity's servers.
//!
//! One line per end point: `name<TAB>base_uri<TAB>pins`, where pins use
//! curl's `--pinnedpubkey` syntax.

use anyhow::Result;
use tracing::info;

use fedmeta_core::{resolve_server, write_atomic, Metadata, ServerSelector};

use crate::cli::args::ResolveArgs;
use crate::exit_codes::EXIT_SUCCESS;

pub async fn run(args: ResolveArgs) -> Result<i32> {
    let metadata = Metadata::load(&args.metadata).await?;

    let selector = match args.tags {
        Some(tags) => ServerSelector::Tags(tags),
        None => ServerSelector::Name(args.server),
    };

    let connection = resolve_server(&metadata, &args.entity, &selector)?;

    for end_point in &connection.end_points {
        println!(
            "{}\t{}\t{}",
            end_point.name,
            end_point.url,
            end_point.pinned_public_keys()
        );
    }

    if let Some(ca_out) = &args.ca_out {
        write_atomic(ca_out, connection.ca_certificates.as_bytes()).await?;
        info!(path = %ca_out.display(), entity = %connection.entity_id, "wrote CA certificates");
    }

    Ok(EXIT_SUCCESS)
}
