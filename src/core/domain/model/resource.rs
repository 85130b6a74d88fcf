//! Domain models for provider resources other than servers.
//!
//! These mirror the JSON shapes returned by the Glance, Nova and Neutron
//! list endpoints, with fields the console does not use left out.

use serde::{Deserialize, Serialize};

/// A compute instance size/class, from `GET /flavors/detail`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Flavor {
    /// Flavor identifier (UUID or short ID, provider-chosen).
    pub id: String,
    pub name: String,
    /// Virtual CPU count.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vcpus: Option<u32>,
    /// Memory in MiB.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ram: Option<u64>,
    /// Root disk in GiB.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disk: Option<u64>,
}

/// A bootable image, from the Glance `GET /v2/images` endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Image {
    pub id: String,
    /// Human-readable name (may be absent on imports in progress).
    #[serde(default)]
    pub name: Option<String>,
    /// Image status (e.g. `active`, `queued`, `saving`).
    pub status: String,
    /// Image size in bytes, absent until upload completes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// An SSH keypair registered with the provider, from `GET /os-keypairs`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Keypair {
    pub name: String,
    pub public_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
}

/// A Neutron network, from `GET /v2.0/networks`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Network {
    pub id: String,
    pub name: String,
    /// True for the provider's external (router-attached) network, which is
    /// where floating IPs are allocated from.
    #[serde(rename = "router:external", default)]
    pub is_external: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// A Neutron port, from `GET /v2.0/ports?device_id=...`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Port {
    pub id: String,
    /// UUID of the server (or router) this port is attached to.
    pub device_id: String,
    pub network_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// An IP address attached to a server, flattened from Nova's per-network
/// address map.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct IpAddress {
    pub address: String,
    pub kind: IpKind,
}

/// Whether an address is the server's private fixed address or a publicly
/// routable floating one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IpKind {
    Fixed,
    Floating,
}
