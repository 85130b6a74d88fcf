//! Domain model for compute servers.
//!
//! A server is split into the attributes the provider reports (`OsProps`)
//! and the client-local session state layered on top of them (`LocalProps`).
//! Identity key is the uuid, unique within one provider's server list.

use serde::{Deserialize, Serialize};

use crate::core::domain::model::resource::{IpAddress, IpKind};

/// A compute server as tracked by one provider session.
#[derive(Debug, Clone, PartialEq)]
pub struct Server {
    pub os_props: OsProps,
    pub local_props: LocalProps,
}

impl Server {
    /// Wraps provider-reported properties with fresh client-local state.
    pub fn new(os_props: OsProps) -> Self {
        Self {
            os_props,
            local_props: LocalProps::default(),
        }
    }

    /// First floating address on the server, if any.
    pub fn floating_ip(&self) -> Option<&IpAddress> {
        self.os_props.details.as_ref().and_then(|d| {
            d.addresses.iter().find(|a| a.kind == IpKind::Floating)
        })
    }

    /// First fixed address on the server, if any.
    pub fn fixed_ip(&self) -> Option<&IpAddress> {
        self.os_props.details.as_ref().and_then(|d| {
            d.addresses.iter().find(|a| a.kind == IpKind::Fixed)
        })
    }
}

/// Provider-reported identity and attributes.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct OsProps {
    pub uuid: String,
    pub name: String,
    /// Absent when the server came from a name-only listing and its detail
    /// response has not arrived yet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<ServerDetails>,
}

/// Detail attributes from a Nova server detail response.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ServerDetails {
    /// Server status (e.g. `ACTIVE`, `BUILD`, `ERROR`).
    pub status: String,
    /// Nova power state code (1 = running, 4 = shutdown, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power_state: Option<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub addresses: Vec<IpAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flavor_uuid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_uuid: Option<String>,
}

impl ServerDetails {
    pub fn is_active(&self) -> bool {
        self.status.eq_ignore_ascii_case("active")
    }
}

/// Client-local session state for one server. Never sent to the provider.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LocalProps {
    /// Checked in the UI for bulk actions.
    pub selected: bool,
    /// Set when a delete request has been issued for this server.
    pub deletion_attempted: bool,
    pub cockpit_status: CockpitStatus,
    pub floating_ip_state: FloatingIpState,
}

/// Readiness of the interactive session endpoint reachable through the
/// server's floating IP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CockpitStatus {
    #[default]
    NotChecked,
    CheckedNotReady,
    Ready,
}

/// Progress of floating-IP acquisition for one server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FloatingIpState {
    /// Server is not in a state where an address could be attached.
    #[default]
    NotRequestable,
    /// Active with a fixed address; an allocation would succeed.
    Requestable,
    /// An allocation request is in flight.
    RequestedWaiting,
    /// A floating address is attached.
    Success,
    /// The last allocation attempt failed. Sticky until an address appears.
    Failed,
}

impl FloatingIpState {
    /// Re-derives the acquisition state from fresh server details.
    ///
    /// A present floating IP always wins. An in-flight request and a failed
    /// attempt both hold their state until an address shows up; otherwise
    /// the state follows from whether an allocation could succeed right now.
    pub fn derive(
        has_fixed_ip: bool,
        has_floating_ip: bool,
        is_active: bool,
        prior: FloatingIpState,
    ) -> FloatingIpState {
        if has_floating_ip {
            FloatingIpState::Success
        } else {
            match prior {
                FloatingIpState::RequestedWaiting => FloatingIpState::RequestedWaiting,
                FloatingIpState::Failed => FloatingIpState::Failed,
                _ => {
                    if is_active && has_fixed_ip {
                        FloatingIpState::Requestable
                    } else {
                        FloatingIpState::NotRequestable
                    }
                }
            }
        }
    }
}

/// A view-scoped draft for a create-server form. Consumed exactly once when
/// submitted, then discarded.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateServerRequest {
    pub name: String,
    pub provider_name: String,
    pub image_uuid: String,
    pub image_name: String,
    pub count: u32,
    pub flavor_uuid: String,
    /// Boot from a volume instead of the image-backed root disk.
    pub vol_backed: bool,
    pub vol_backed_size_gb: u32,
    pub keypair_name: Option<String>,
    /// Cloud-init user data passed verbatim to the instance.
    pub user_data: String,
}

impl CreateServerRequest {
    pub fn new(provider_name: &str, image_uuid: &str, image_name: &str) -> Self {
        Self {
            name: String::new(),
            provider_name: provider_name.to_string(),
            image_uuid: image_uuid.to_string(),
            image_name: image_name.to_string(),
            count: 1,
            flavor_uuid: String::new(),
            vol_backed: false,
            vol_backed_size_gb: 10,
            keypair_name: None,
            user_data: String::new(),
        }
    }
}
