//! Plain-text listing of verified metadata.

use std::io::{self, Write};

use crate::metadata::{Entity, EntityMatch, Metadata};

/// What to print for each entity.
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    /// Only print the entity with this id.
    pub entity: Option<String>,

    /// How `entity` is compared with `entity_id`.
    pub entity_match: EntityMatch,

    /// Print server names.
    pub servers: bool,

    /// Print server base URIs.
    pub base_uris: bool,

    /// Print client names.
    pub clients: bool,

    /// Print each distinct server tag combination.
    pub server_tags: bool,
}

impl ListOptions {
    fn selects(&self, entity: &Entity) -> bool {
        match &self.entity {
            Some(wanted) => self.entity_match.matches(&entity.entity_id, wanted),
            None => true,
        }
    }
}

/// Write the listing and return how many entities were printed.
pub fn write_listing<W: Write>(
    metadata: &Metadata,
    options: &ListOptions,
    out: &mut W,
) -> io::Result<usize> {
    let mut printed = 0;

    for entity in metadata.entities.iter().filter(|e| options.selects(e)) {
        writeln!(out, "{}", entity.entity_id)?;
        printed += 1;

        if options.servers || options.base_uris {
            for server in &entity.servers {
                match (options.servers, options.base_uris) {
                    (true, true) => writeln!(
                        out,
                        "\t{}\t{}",
                        server.name,
                        server.base_uri.as_deref().unwrap_or("-")
                    )?,
                    (true, false) => writeln!(out, "\t{}", server.name)?,
                    _ => {
                        if let Some(base_uri) = &server.base_uri {
                            writeln!(out, "\t{}", base_uri)?;
                        }
                    }
                }
            }
        }

        if options.clients {
            for client in &entity.clients {
                writeln!(out, "\t{}", client.name)?;
            }
        }

        if options.server_tags {
            for tags in distinct_tag_sets(entity) {
                writeln!(out, "\t[{}]", tags.join(", "))?;
            }
        }
    }

    Ok(printed)
}

/// Canonical tag sets of an entity's servers, first occurrence order.
fn distinct_tag_sets(entity: &Entity) -> Vec<Vec<String>> {
    let mut seen: Vec<Vec<String>> = Vec::new();
    for server in &entity.servers {
        let tags = server.canonical_tags();
        if !seen.contains(&tags) {
            seen.push(tags);
        }
    }
    seen
}
