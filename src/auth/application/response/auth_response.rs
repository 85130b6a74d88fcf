//! Keystone v3 token-issue response body and service-catalog handling.
//!
//! The token value itself travels in the `X-Subject-Token` response header;
//! the body carries the expiry and the service catalog we resolve endpoint
//! URLs from.

use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct AuthResponse {
    pub token: TokenBody,
}

#[derive(Debug, Deserialize)]
pub struct TokenBody {
    pub expires_at: DateTime<Utc>,
    #[serde(default)]
    pub catalog: Vec<CatalogService>,
}

#[derive(Debug, Deserialize)]
pub struct CatalogService {
    /// Service type, e.g. `compute`, `image`, `network`, `identity`.
    #[serde(rename = "type")]
    pub service_type: String,
    #[serde(default)]
    pub endpoints: Vec<CatalogEndpoint>,
}

#[derive(Debug, Deserialize)]
pub struct CatalogEndpoint {
    /// `public`, `internal` or `admin`.
    pub interface: String,
    pub url: String,
}

impl AuthResponse {
    /// The public-interface endpoint URL for a service type, if the catalog
    /// carries one.
    pub fn public_endpoint(&self, service_type: &str) -> Option<&str> {
        self.token
            .catalog
            .iter()
            .find(|s| s.service_type == service_type)?
            .endpoints
            .iter()
            .find(|e| e.interface == "public")
            .map(|e| e.url.as_str())
    }
}
