//! The Keystone password-authentication exchange.

use reqwest::{
    header::{HeaderMap, ACCEPT, CONTENT_TYPE},
    Client, StatusCode,
};
use url::Url;

use crate::auth::application::{
    request::auth_request::AuthRequest, response::auth_response::AuthResponse,
};
use crate::core::domain::error::{StratusError, StratusResult, ValidationError};
use crate::core::domain::model::credentials::Credentials;
use crate::core::domain::model::provider::{Provider, ProviderAuth, Token};

const SUBJECT_TOKEN_HEADER: &str = "X-Subject-Token";

/// Performs the Keystone v3 `POST /auth/tokens` exchange and builds a
/// provider session from the response.
pub struct AuthService {
    http_client: Client,
    default_headers: HeaderMap,
}

impl AuthService {
    pub fn new(http_client: Client) -> Self {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(CONTENT_TYPE, "application/json".parse().unwrap());
        default_headers.insert(ACCEPT, "application/json".parse().unwrap());
        Self {
            http_client,
            default_headers,
        }
    }

    /// Authenticates and returns a fresh provider session.
    ///
    /// The provider name is the hostname of the auth URL, so sessions
    /// against the same cloud replace each other in the store.
    pub async fn execute(&self, credentials: &Credentials) -> StratusResult<Provider> {
        let name = provider_name(&credentials.auth_url)?;
        let auth = self.fetch_auth(credentials).await?;
        Ok(Provider::new(name, credentials.clone(), auth))
    }

    /// Authenticates and returns only the resolved endpoints and token.
    /// Used for in-flight token refresh, where the session already exists.
    pub async fn fetch_auth(&self, credentials: &Credentials) -> StratusResult<ProviderAuth> {
        let url = build_tokens_url(&credentials.auth_url);
        let request = AuthRequest::from_credentials(credentials);

        tracing::debug!(url = %url, username = %credentials.username, "requesting keystone token");

        let response = self
            .http_client
            .post(&url)
            .headers(self.default_headers.clone())
            .json(&request)
            .send()
            .await
            .map_err(|e| StratusError::Connection(e.to_string()))?;

        match response.status() {
            StatusCode::CREATED | StatusCode::OK => {
                self.handle_successful_auth(credentials, response).await
            }
            StatusCode::UNAUTHORIZED => Err(StratusError::Authentication(
                "Invalid credentials provided".to_string(),
            )),
            StatusCode::BAD_REQUEST => Err(StratusError::Validation {
                source: ValidationError::Field {
                    field: "request".to_string(),
                    message: "Identity service rejected the request format".to_string(),
                },
            }),
            StatusCode::NOT_FOUND => Err(StratusError::Connection(
                "Token endpoint not found; check the auth URL".to_string(),
            )),
            status => Err(StratusError::Api {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_else(|_| "unknown".to_string()),
            }),
        }
    }

    async fn handle_successful_auth(
        &self,
        credentials: &Credentials,
        response: reqwest::Response,
    ) -> StratusResult<ProviderAuth> {
        let token_value = response
            .headers()
            .get(SUBJECT_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string())
            .ok_or_else(|| {
                StratusError::Authentication(
                    "Token response missing X-Subject-Token header".to_string(),
                )
            })?;

        let body = response.json::<AuthResponse>().await.map_err(|e| {
            StratusError::Connection(format!("Failed to parse token response: {}", e))
        })?;

        let compute_url = require_endpoint(&body, "compute")?;
        let image_url = require_endpoint(&body, "image")?;
        let network_url = require_endpoint(&body, "network")?;

        Ok(ProviderAuth {
            auth_url: credentials.auth_url.clone(),
            compute_url,
            image_url,
            network_url,
            token: Token::new(token_value, body.token.expires_at),
        })
    }
}

fn require_endpoint(body: &AuthResponse, service_type: &str) -> StratusResult<String> {
    body.public_endpoint(service_type)
        .map(|u| u.trim_end_matches('/').to_string())
        .ok_or_else(|| StratusError::Authentication(format!(
            "Service catalog has no public {} endpoint",
            service_type
        )))
}

fn build_tokens_url(auth_url: &str) -> String {
    format!("{}/auth/tokens", auth_url.trim_end_matches('/'))
}

/// Derives the provider's store key from the auth URL's hostname.
pub fn provider_name(auth_url: &str) -> StratusResult<String> {
    let parsed = Url::parse(auth_url).map_err(|e| {
        StratusError::Validation {
            source: ValidationError::Field {
                field: "auth_url".to_string(),
                message: e.to_string(),
            },
        }
    })?;
    parsed
        .host_str()
        .map(|h| h.to_string())
        .ok_or(StratusError::Validation {
            source: ValidationError::Field {
                field: "auth_url".to_string(),
                message: "Auth URL has no hostname".to_string(),
            },
        })
}
