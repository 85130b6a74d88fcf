//! Pure lookup tables over the provider store.
//!
//! Absence is not an error anywhere here; callers render a fallback
//! ("Unknown flavor", etc.) when a lookup misses.

use crate::core::domain::model::provider::Provider;
use crate::core::domain::model::resource::{Flavor, Image, IpAddress, IpKind, Network};
use crate::core::domain::model::server::Server;

pub fn provider_by_name<'a>(providers: &'a [Provider], name: &str) -> Option<&'a Provider> {
    providers.iter().find(|p| p.name == name)
}

pub fn provider_by_name_mut<'a>(
    providers: &'a mut [Provider],
    name: &str,
) -> Option<&'a mut Provider> {
    providers.iter_mut().find(|p| p.name == name)
}

pub fn server_by_uuid<'a>(provider: &'a Provider, uuid: &str) -> Option<&'a Server> {
    provider
        .servers
        .loaded()?
        .iter()
        .find(|s| s.os_props.uuid == uuid)
}

pub fn flavor_by_uuid<'a>(provider: &'a Provider, uuid: &str) -> Option<&'a Flavor> {
    provider.flavors.iter().find(|f| f.id == uuid)
}

pub fn image_by_uuid<'a>(provider: &'a Provider, uuid: &str) -> Option<&'a Image> {
    provider.images.iter().find(|i| i.id == uuid)
}

/// First network flagged external; floating IPs are allocated from here.
pub fn external_network(provider: &Provider) -> Option<&Network> {
    provider.networks.iter().find(|n| n.is_external)
}

/// First floating address on the server.
pub fn floating_ip(server: &Server) -> Option<&IpAddress> {
    server.os_props.details.as_ref().and_then(|d| {
        d.addresses.iter().find(|a| a.kind == IpKind::Floating)
    })
}
