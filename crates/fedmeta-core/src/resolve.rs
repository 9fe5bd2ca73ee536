//! Connection details for one entity's server(s).
//!
//! Finds the entity by normalized URL, selects servers by name or by tag set,
//! and collects base URIs, pinned keys and the entity's CA certificates.

use crate::error::{FedmetaError, FedmetaResult};
use crate::metadata::{canonical_tags, url_equals, Entity, Metadata, Pin, Server};

/// How servers of an entity are selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerSelector {
    /// By name. `None` requires the entity to have exactly one server.
    Name(Option<String>),

    /// Every server whose canonical tag set equals these tags.
    Tags(Vec<String>),
}

/// Where and how to reach one server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndPoint {
    pub name: String,
    pub url: String,
    pub pins: Vec<Pin>,
}

impl EndPoint {
    /// Pins in curl's `--pinnedpubkey` syntax.
    pub fn pinned_public_keys(&self) -> String {
        concatenate_pins(&self.pins)
    }
}

/// End points plus the CA bundle to authenticate them with.
#[derive(Debug, Clone)]
pub struct ServerConnection {
    pub entity_id: String,
    pub end_points: Vec<EndPoint>,

    /// Issuer certificates joined with newlines.
    pub ca_certificates: String,
}

/// Resolve the servers of `entity_id` chosen by `selector`.
pub fn resolve_server(
    metadata: &Metadata,
    entity_id: &str,
    selector: &ServerSelector,
) -> FedmetaResult<ServerConnection> {
    // Last match wins when several entries normalize to the same id.
    let entity = metadata
        .entities
        .iter()
        .rev()
        .find(|e| url_equals(&e.entity_id, entity_id))
        .ok_or_else(|| {
            FedmetaError::lookup(format!("no entity matching {} in metadata", entity_id))
        })?;

    if entity.servers.is_empty() {
        return Err(FedmetaError::lookup(format!(
            "entity {} has no servers",
            entity.entity_id
        )));
    }

    let servers = match selector {
        ServerSelector::Name(name) => vec![select_by_name(entity, name.as_deref())?],
        ServerSelector::Tags(tags) => select_by_tags(entity, tags)?,
    };

    let mut end_points = Vec::with_capacity(servers.len());
    for server in servers {
        let url = server.base_uri.clone().ok_or_else(|| {
            FedmetaError::lookup(format!("server {} has no base_uri", server.name))
        })?;
        if server.pins.is_empty() {
            return Err(FedmetaError::lookup(format!(
                "server {} has no pins",
                server.name
            )));
        }
        end_points.push(EndPoint {
            name: server.name.clone(),
            url,
            pins: server.pins.clone(),
        });
    }

    let ca_certificates = ca_bundle(entity);
    if ca_certificates.is_empty() {
        return Err(FedmetaError::lookup(format!(
            "entity {} has no issuer certificates",
            entity.entity_id
        )));
    }

    Ok(ServerConnection {
        entity_id: entity.entity_id.clone(),
        end_points,
        ca_certificates,
    })
}

fn select_by_name<'a>(entity: &'a Entity, name: Option<&str>) -> FedmetaResult<&'a Server> {
    match name {
        None => match entity.servers.as_slice() {
            [only] => Ok(only),
            _ => Err(FedmetaError::lookup(format!(
                "entity {} has {} servers, more than one server matched; specify a server name",
                entity.entity_id,
                entity.servers.len()
            ))),
        },
        Some(name) => entity
            .servers
            .iter()
            .rev()
            .find(|s| s.name == name)
            .ok_or_else(|| {
                FedmetaError::lookup(format!(
                    "no server named {} for entity {}",
                    name, entity.entity_id
                ))
            }),
    }
}

fn select_by_tags<'a>(entity: &'a Entity, tags: &[String]) -> FedmetaResult<Vec<&'a Server>> {
    let wanted = canonical_tags(tags);
    let matched: Vec<&Server> = entity
        .servers
        .iter()
        .filter(|s| s.canonical_tags() == wanted)
        .collect();

    if matched.is_empty() {
        return Err(FedmetaError::lookup(format!(
            "no server tagged [{}] for entity {}",
            wanted.join(", "),
            entity.entity_id
        )));
    }
    Ok(matched)
}

fn ca_bundle(entity: &Entity) -> String {
    let mut bundle = String::new();
    for issuer in &entity.issuers {
        bundle.push_str(&issuer.x509certificate);
        bundle.push('\n');
    }
    bundle
}

/// Render pins as `name//value` joined by `;`.
pub fn concatenate_pins(pins: &[Pin]) -> String {
    pins.iter()
        .map(|p| format!("{}//{}", p.name, p.value))
        .collect::<Vec<_>>()
        .join(";")
}
