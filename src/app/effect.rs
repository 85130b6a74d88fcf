//! Declared side effects returned by the reducer.
//!
//! The reducer never performs I/O; it describes it. The runtime executes
//! each effect as a fire-and-forget task that delivers exactly one response
//! event back onto the queue (plus a `TokenRefreshed` event when the token
//! had to be renewed first).

use crate::core::domain::model::credentials::Credentials;
use crate::core::domain::model::server::CreateServerRequest;

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Keystone password exchange; answers with `AuthCompleted`.
    Authenticate { credentials: Credentials },
    /// Nova server listing; answers with `ServersListed`.
    RefreshServers { provider_name: String },
    /// Nova server detail; answers with `ServerFetched`.
    FetchServer { provider_name: String, uuid: String },
    /// Nova server creation; answers with `ServerCreated`.
    CreateServer {
        provider_name: String,
        request: CreateServerRequest,
    },
    /// Nova server deletion; answers with `ServerDeleted`.
    DeleteServer { provider_name: String, uuid: String },
    /// Answers with `FlavorsListed`.
    RefreshFlavors { provider_name: String },
    /// Answers with `ImagesListed`.
    RefreshImages { provider_name: String },
    /// Answers with `KeypairsListed`.
    RefreshKeypairs { provider_name: String },
    /// Answers with `NetworksListed`.
    RefreshNetworks { provider_name: String },
    /// Neutron port listing for one server; answers with `PortsListed`.
    ListServerPorts {
        provider_name: String,
        server_uuid: String,
    },
    /// Neutron floating-IP allocation; answers with `FloatingIpAllocated`.
    AllocateFloatingIp {
        provider_name: String,
        server_uuid: String,
        external_network_uuid: String,
        port_uuid: String,
    },
    /// Readiness probe against a session endpoint; answers with
    /// `CockpitChecked`.
    CheckCockpit {
        provider_name: String,
        server_uuid: String,
        url: String,
    },
    /// Opaque side channel; no response event.
    OpenUrl { url: String },
}
