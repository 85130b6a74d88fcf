//! Typed events processed by the reducer.
//!
//! Everything that can change the model arrives here: user actions from the
//! rendering layer, the heartbeat tick, and exactly one response event per
//! outbound request. Response events carry the originating provider's name
//! and any resource key threaded through from the request, never a captured
//! reference to store state.

use chrono::{DateTime, Utc};

use crate::core::domain::error::StratusError;
use crate::core::domain::model::navigation::View;
use crate::core::domain::model::provider::{Provider, ProviderAuth};
use crate::core::domain::model::resource::{Flavor, Image, Keypair, Network, Port};
use crate::core::domain::model::server::Server;

#[derive(Debug)]
pub enum Event {
    // User actions
    SetCredentialField(CredentialField, String),
    /// Bulk-replace the credentials draft from pasted OpenRC text.
    PasteOpenRc(String),
    SubmitLogin,
    Navigate(View),
    EditDraft(DraftEdit),
    SubmitCreateServer,
    ToggleServerSelected {
        provider_name: String,
        uuid: String,
    },
    SetAllServersSelected {
        provider_name: String,
        selected: bool,
    },
    DeleteServer {
        provider_name: String,
        uuid: String,
    },
    DeleteSelectedServers {
        provider_name: String,
    },
    RequestFloatingIp {
        provider_name: String,
        uuid: String,
    },
    /// Open the interactive session for a server in the browser.
    OpenServerSession {
        provider_name: String,
        uuid: String,
    },

    // Timer
    Tick {
        now: DateTime<Utc>,
    },

    // Responses
    AuthCompleted {
        result: Result<Provider, StratusError>,
    },
    /// A token refresh happened while executing some other request.
    TokenRefreshed {
        provider_name: String,
        auth: ProviderAuth,
    },
    ServersListed {
        provider_name: String,
        result: Result<Vec<Server>, StratusError>,
    },
    ServerFetched {
        provider_name: String,
        uuid: String,
        result: Result<Server, StratusError>,
    },
    ServerCreated {
        provider_name: String,
        result: Result<String, StratusError>,
    },
    /// Deliberately not inspected beyond a debug log; deletion is applied
    /// optimistically when the request is issued.
    ServerDeleted {
        provider_name: String,
        uuid: String,
        result: Result<(), StratusError>,
    },
    FlavorsListed {
        provider_name: String,
        result: Result<Vec<Flavor>, StratusError>,
    },
    ImagesListed {
        provider_name: String,
        result: Result<Vec<Image>, StratusError>,
    },
    KeypairsListed {
        provider_name: String,
        result: Result<Vec<Keypair>, StratusError>,
    },
    NetworksListed {
        provider_name: String,
        result: Result<Vec<Network>, StratusError>,
    },
    PortsListed {
        provider_name: String,
        server_uuid: String,
        result: Result<Vec<Port>, StratusError>,
    },
    FloatingIpAllocated {
        provider_name: String,
        server_uuid: String,
        result: Result<String, StratusError>,
    },
    CockpitChecked {
        provider_name: String,
        server_uuid: String,
        ready: bool,
    },
}

/// One field of the login form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialField {
    AuthUrl,
    ProjectDomain,
    ProjectName,
    UserDomain,
    Username,
    Password,
}

/// One edit to the create-server draft held in the navigation state.
#[derive(Debug, Clone, PartialEq)]
pub enum DraftEdit {
    SetName(String),
    SetCount(u32),
    SetFlavor(String),
    SetVolBacked(bool),
    SetVolBackedSizeGb(u32),
    SetKeypair(Option<String>),
    SetUserData(String),
}
