//! Credentialed HTTP plumbing for the Nova, Glance and Neutron services.
//!
//! Every call goes through [`ApiClient::ensure_token`] first: a token that
//! is still valid at the wall-clock read is used as-is, an expired or absent
//! one triggers exactly one Keystone exchange before the dependent request
//! is built. A request is never issued with a token known to be expired at
//! issue time.

use std::collections::HashMap;

use chrono::Utc;
use reqwest::{Client, Method, StatusCode};
use serde::Deserialize;
use serde_json::json;

use crate::auth::application::service::auth_service::AuthService;
use crate::core::domain::error::{StratusError, StratusResult};
use crate::core::domain::model::credentials::Credentials;
use crate::core::domain::model::provider::ProviderAuth;
use crate::core::domain::model::resource::{
    Flavor, Image, IpAddress, IpKind, Keypair, Network, Port,
};
use crate::core::domain::model::server::{CreateServerRequest, OsProps, Server, ServerDetails};

const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";

/// The outcome of a token check: the auth to use now, plus the fresh auth to
/// report back to the store when a refresh happened.
pub struct ValidatedAuth {
    pub auth: ProviderAuth,
    pub refreshed: bool,
}

pub struct ApiClient {
    http_client: Client,
    auth_service: AuthService,
}

impl ApiClient {
    pub fn new(http_client: Client) -> Self {
        let auth_service = AuthService::new(http_client.clone());
        Self {
            http_client,
            auth_service,
        }
    }

    pub fn auth_service(&self) -> &AuthService {
        &self.auth_service
    }

    /// Returns auth with a token valid at the current wall-clock read,
    /// re-authenticating first when the cached one is expired.
    pub async fn ensure_token(
        &self,
        credentials: &Credentials,
        auth: &ProviderAuth,
    ) -> StratusResult<ValidatedAuth> {
        if !auth.token.is_expired(Utc::now()) {
            return Ok(ValidatedAuth {
                auth: auth.clone(),
                refreshed: false,
            });
        }
        tracing::debug!(auth_url = %auth.auth_url, "token expired, re-authenticating");
        let fresh = self.auth_service.fetch_auth(credentials).await?;
        Ok(ValidatedAuth {
            auth: fresh,
            refreshed: true,
        })
    }

    /// Nova `GET /servers/detail`.
    pub async fn list_servers(&self, auth: &ProviderAuth) -> StratusResult<Vec<Server>> {
        let url = format!("{}/servers/detail", auth.compute_url);
        let wire: ServersWire = self.request_json(Method::GET, &url, auth, None).await?;
        Ok(wire.servers.into_iter().map(ServerWire::into_server).collect())
    }

    /// Nova `GET /servers/{uuid}`.
    pub async fn get_server(&self, auth: &ProviderAuth, uuid: &str) -> StratusResult<Server> {
        let url = format!("{}/servers/{}", auth.compute_url, uuid);
        let wire: ServerDetailWire = self.request_json(Method::GET, &url, auth, None).await?;
        Ok(wire.server.into_server())
    }

    /// Nova `POST /servers`. Returns the provider-assigned uuid of the
    /// (first) created server; callers refresh the list rather than trust
    /// a locally synthesized record.
    pub async fn create_server(
        &self,
        auth: &ProviderAuth,
        request: &CreateServerRequest,
    ) -> StratusResult<String> {
        let url = format!("{}/servers", auth.compute_url);
        let mut server = json!({
            "name": request.name,
            "flavorRef": request.flavor_uuid,
            "min_count": request.count,
            "max_count": request.count,
        });
        if request.vol_backed {
            server["block_device_mapping_v2"] = json!([{
                "boot_index": 0,
                "uuid": request.image_uuid,
                "source_type": "image",
                "destination_type": "volume",
                "volume_size": request.vol_backed_size_gb,
                "delete_on_termination": true,
            }]);
        } else {
            server["imageRef"] = json!(request.image_uuid);
        }
        if let Some(keypair) = &request.keypair_name {
            server["key_name"] = json!(keypair);
        }
        if !request.user_data.is_empty() {
            server["user_data"] = json!(request.user_data);
        }
        let body = json!({ "server": server });

        let wire: CreatedServerWire = self
            .request_json(Method::POST, &url, auth, Some(body))
            .await?;
        Ok(wire.server.id)
    }

    /// Nova `DELETE /servers/{uuid}`. The response body is not inspected;
    /// deletion is treated optimistically by the caller.
    pub async fn delete_server(&self, auth: &ProviderAuth, uuid: &str) -> StratusResult<()> {
        let url = format!("{}/servers/{}", auth.compute_url, uuid);
        self.request_empty(Method::DELETE, &url, auth).await
    }

    /// Nova `GET /flavors/detail`.
    pub async fn list_flavors(&self, auth: &ProviderAuth) -> StratusResult<Vec<Flavor>> {
        let url = format!("{}/flavors/detail", auth.compute_url);
        let wire: FlavorsWire = self.request_json(Method::GET, &url, auth, None).await?;
        Ok(wire.flavors)
    }

    /// Nova `GET /os-keypairs`.
    pub async fn list_keypairs(&self, auth: &ProviderAuth) -> StratusResult<Vec<Keypair>> {
        let url = format!("{}/os-keypairs", auth.compute_url);
        let wire: KeypairsWire = self.request_json(Method::GET, &url, auth, None).await?;
        Ok(wire.keypairs.into_iter().map(|k| k.keypair).collect())
    }

    /// Glance `GET /v2/images`.
    pub async fn list_images(&self, auth: &ProviderAuth) -> StratusResult<Vec<Image>> {
        let url = format!("{}/v2/images", auth.image_url);
        let wire: ImagesWire = self.request_json(Method::GET, &url, auth, None).await?;
        Ok(wire.images)
    }

    /// Neutron `GET /v2.0/networks`.
    pub async fn list_networks(&self, auth: &ProviderAuth) -> StratusResult<Vec<Network>> {
        let url = format!("{}/v2.0/networks", auth.network_url);
        let wire: NetworksWire = self.request_json(Method::GET, &url, auth, None).await?;
        Ok(wire.networks)
    }

    /// Neutron `GET /v2.0/ports?device_id={uuid}`.
    pub async fn list_ports(
        &self,
        auth: &ProviderAuth,
        device_uuid: &str,
    ) -> StratusResult<Vec<Port>> {
        let url = format!("{}/v2.0/ports?device_id={}", auth.network_url, device_uuid);
        let wire: PortsWire = self.request_json(Method::GET, &url, auth, None).await?;
        Ok(wire.ports)
    }

    /// Neutron `POST /v2.0/floatingips`: allocate an address on the external
    /// network and bind it to the given port.
    pub async fn allocate_floating_ip(
        &self,
        auth: &ProviderAuth,
        external_network_uuid: &str,
        port_uuid: &str,
    ) -> StratusResult<String> {
        let url = format!("{}/v2.0/floatingips", auth.network_url);
        let body = json!({
            "floatingip": {
                "floating_network_id": external_network_uuid,
                "port_id": port_uuid,
            }
        });
        let wire: FloatingIpWire = self
            .request_json(Method::POST, &url, auth, Some(body))
            .await?;
        Ok(wire.floatingip.floating_ip_address)
    }

    /// Fire-and-forget readiness probe for an interactive session endpoint.
    /// Any reachable response counts as ready; transport errors do not.
    pub async fn probe_url(&self, url: &str) -> bool {
        match self.http_client.get(url).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    async fn request_json<T>(
        &self,
        method: Method,
        url: &str,
        auth: &ProviderAuth,
        body: Option<serde_json::Value>,
    ) -> StratusResult<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let response = self.send(method, url, auth, body).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| StratusError::Connection(format!("Failed to parse response: {}", e)))
    }

    async fn request_empty(
        &self,
        method: Method,
        url: &str,
        auth: &ProviderAuth,
    ) -> StratusResult<()> {
        self.send(method, url, auth, None).await.map(|_| ())
    }

    async fn send(
        &self,
        method: Method,
        url: &str,
        auth: &ProviderAuth,
        body: Option<serde_json::Value>,
    ) -> StratusResult<reqwest::Response> {
        let mut builder = self
            .http_client
            .request(method, url)
            .header(AUTH_TOKEN_HEADER, auth.token.as_str());
        if let Some(body) = body {
            builder = builder.json(&body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| StratusError::Connection(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            // The token was checked before issue, so a 401 here means it was
            // revoked server-side. Surfaced like any other API error; the
            // next gated request re-authenticates.
            return Err(StratusError::Authentication(
                "Token rejected by the service".to_string(),
            ));
        }
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown".to_string());
            return Err(StratusError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response)
    }
}

/// Cockpit listens on the floating IP at a fixed port.
pub fn cockpit_ping_url(floating_ip: &str) -> String {
    format!("https://{}:9090/ping", floating_ip)
}

// Wire shapes. Nova nests everything one level deep and spells some fields
// with extension prefixes; these stay private to the client.

#[derive(Deserialize)]
struct ServersWire {
    servers: Vec<ServerWire>,
}

#[derive(Deserialize)]
struct ServerDetailWire {
    server: ServerWire,
}

#[derive(Deserialize)]
struct ServerWire {
    id: String,
    name: String,
    #[serde(default)]
    status: Option<String>,
    #[serde(rename = "OS-EXT-STS:power_state", default)]
    power_state: Option<i64>,
    #[serde(default)]
    addresses: HashMap<String, Vec<AddressWire>>,
    /// Object with an `id` normally; the empty string for volume-backed
    /// servers, hence the loose type.
    #[serde(default)]
    image: Option<serde_json::Value>,
    #[serde(default)]
    flavor: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct AddressWire {
    addr: String,
    #[serde(rename = "OS-EXT-IPS:type", default)]
    ip_type: Option<String>,
}

impl ServerWire {
    fn into_server(self) -> Server {
        let addresses = self
            .addresses
            .into_values()
            .flatten()
            .map(|a| IpAddress {
                kind: match a.ip_type.as_deref() {
                    Some("floating") => IpKind::Floating,
                    _ => IpKind::Fixed,
                },
                address: a.addr,
            })
            .collect();
        let details = ServerDetails {
            status: self.status.unwrap_or_else(|| "UNKNOWN".to_string()),
            power_state: self.power_state,
            addresses,
            flavor_uuid: ref_uuid(self.flavor.as_ref()),
            image_uuid: ref_uuid(self.image.as_ref()),
        };
        Server::new(OsProps {
            uuid: self.id,
            name: self.name,
            details: Some(details),
        })
    }
}

fn ref_uuid(value: Option<&serde_json::Value>) -> Option<String> {
    value?
        .get("id")
        .and_then(|id| id.as_str())
        .map(|id| id.to_string())
}

#[derive(Deserialize)]
struct CreatedServerWire {
    server: CreatedServerId,
}

#[derive(Deserialize)]
struct CreatedServerId {
    id: String,
}

#[derive(Deserialize)]
struct FlavorsWire {
    flavors: Vec<Flavor>,
}

#[derive(Deserialize)]
struct KeypairsWire {
    keypairs: Vec<KeypairEntry>,
}

#[derive(Deserialize)]
struct KeypairEntry {
    keypair: Keypair,
}

#[derive(Deserialize)]
struct ImagesWire {
    images: Vec<Image>,
}

#[derive(Deserialize)]
struct NetworksWire {
    networks: Vec<Network>,
}

#[derive(Deserialize)]
struct PortsWire {
    ports: Vec<Port>,
}

#[derive(Deserialize)]
struct FloatingIpWire {
    floatingip: FloatingIpBody,
}

#[derive(Deserialize)]
struct FloatingIpBody {
    floating_ip_address: String,
}
