//! The application state and its two mutation primitives.
//!
//! Membership and order of the provider and server collections change only
//! through the primitives in this module; everything else may read, or
//! update fields of an element in place, but never insert, remove or
//! reorder. That keeps the uniqueness and sort-order invariants enforced in
//! exactly one place.

use chrono::{DateTime, Utc};

use crate::core::domain::model::credentials::Credentials;
use crate::core::domain::model::navigation::View;
use crate::core::domain::model::provider::Provider;
use crate::core::domain::model::server::Server;
use crate::core::domain::model::toast::Toast;

/// The whole client-side model, threaded through the reducer by reference.
#[derive(Debug, Clone)]
pub struct AppState {
    pub view: View,
    /// Sorted by provider name; names are unique.
    pub providers: Vec<Provider>,
    /// The login form draft.
    pub credentials: Credentials,
    pub toasts: Vec<Toast>,
    /// Append-only log of formatted errors.
    pub log: Vec<String>,
    /// Wall clock as of the last tick, used for toast deadlines and display.
    pub clock: DateTime<Utc>,
}

impl AppState {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            view: View::Login,
            providers: Vec::new(),
            credentials: Credentials::default(),
            toasts: Vec::new(),
            log: Vec::new(),
            clock: now,
        }
    }
}

/// Inserts or replaces a provider by name, keeping the list sorted by name.
///
/// O(n) per call; provider counts are tens, not thousands.
pub fn upsert_provider(providers: &mut Vec<Provider>, provider: Provider) {
    providers.retain(|p| p.name != provider.name);
    providers.push(provider);
    providers.sort_by(|a, b| a.name.cmp(&b.name));
}

/// Inserts or replaces a server by uuid within one provider, keeping the
/// list sorted by display name.
pub fn upsert_server(provider: &mut Provider, server: Server) {
    let servers = match provider.servers.loaded_mut() {
        Some(servers) => servers,
        None => {
            provider.servers = crate::core::domain::model::provider::Remote::Loaded(Vec::new());
            provider.servers.loaded_mut().unwrap()
        }
    };
    servers.retain(|s| s.os_props.uuid != server.os_props.uuid);
    servers.push(server);
    servers.sort_by(|a, b| a.os_props.name.cmp(&b.os_props.name));
}

/// Removes a server by uuid. Used by the optimistic delete path; sort order
/// of the remaining servers is untouched.
pub fn remove_server(provider: &mut Provider, uuid: &str) {
    if let Some(servers) = provider.servers.loaded_mut() {
        servers.retain(|s| s.os_props.uuid != uuid);
    }
}
