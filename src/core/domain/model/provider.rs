//! Provider sessions.
//!
//! A provider is one configured OpenStack cloud endpoint plus everything the
//! console has learned about it: resolved service endpoints, the current
//! auth token, and per-resource caches.

use chrono::{DateTime, Utc};

use crate::core::domain::model::credentials::Credentials;
use crate::core::domain::model::resource::{Flavor, Image, Keypair, Network, Port};
use crate::core::domain::model::server::Server;

/// A scoped Keystone token with its expiry deadline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    value: String,
    expires_at: DateTime<Utc>,
}

impl Token {
    pub fn new(value: String, expires_at: DateTime<Utc>) -> Self {
        Self { value, expires_at }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// True if the token is no longer usable at the given instant.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Resolved service endpoints plus the current token for one provider.
///
/// Endpoint URLs come from the public interface entries of the Keystone
/// service catalog at login time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderAuth {
    /// Keystone endpoint the session was created against.
    pub auth_url: String,
    /// Nova endpoint.
    pub compute_url: String,
    /// Glance endpoint.
    pub image_url: String,
    /// Neutron endpoint.
    pub network_url: String,
    pub token: Token,
}

/// The lifecycle of a lazily requested remote collection.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Remote<T> {
    #[default]
    NotRequested,
    Loading,
    Loaded(T),
    Failed(String),
}

impl<T> Remote<T> {
    pub fn loaded(&self) -> Option<&T> {
        match self {
            Remote::Loaded(value) => Some(value),
            _ => None,
        }
    }

    pub fn loaded_mut(&mut self) -> Option<&mut T> {
        match self {
            Remote::Loaded(value) => Some(value),
            _ => None,
        }
    }
}

/// One provider session. Uniquely identified by `name` within the store.
#[derive(Debug, Clone, PartialEq)]
pub struct Provider {
    /// Derived from the auth URL's hostname at login time.
    pub name: String,
    /// The credentials the session was opened with; needed again whenever
    /// the token expires mid-session.
    pub credentials: Credentials,
    pub auth: ProviderAuth,
    pub servers: Remote<Vec<Server>>,
    pub flavors: Vec<Flavor>,
    pub images: Vec<Image>,
    pub keypairs: Vec<Keypair>,
    pub networks: Vec<Network>,
    pub ports: Vec<Port>,
}

impl Provider {
    pub fn new(name: String, credentials: Credentials, auth: ProviderAuth) -> Self {
        Self {
            name,
            credentials,
            auth,
            servers: Remote::NotRequested,
            flavors: Vec::new(),
            images: Vec::new(),
            keypairs: Vec::new(),
            networks: Vec::new(),
            ports: Vec::new(),
        }
    }
}
