use crate::auth::application::service::auth_service::AuthService;
use crate::{Credentials, StratusError};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn credentials_for(server: &MockServer) -> Credentials {
    Credentials {
        auth_url: format!("{}/v3", server.uri()),
        project_domain: "default".to_string(),
        project_name: "demo".to_string(),
        user_domain: "default".to_string(),
        username: "alice".to_string(),
        password: "secret".to_string(),
    }
}

fn token_body(server: &MockServer) -> serde_json::Value {
    serde_json::json!({
        "token": {
            "expires_at": "2099-01-01T00:00:00Z",
            "catalog": [
                {
                    "type": "compute",
                    "endpoints": [
                        { "interface": "public", "url": format!("{}/compute/v2.1", server.uri()) }
                    ]
                },
                {
                    "type": "image",
                    "endpoints": [
                        { "interface": "public", "url": format!("{}/image", server.uri()) }
                    ]
                },
                {
                    "type": "network",
                    "endpoints": [
                        { "interface": "public", "url": format!("{}/network", server.uri()) }
                    ]
                }
            ]
        }
    })
}

#[tokio::test]
async fn login_builds_a_provider_from_the_catalog() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v3/auth/tokens"))
        .respond_with(
            ResponseTemplate::new(201)
                .insert_header("X-Subject-Token", "gAAAAABtoken")
                .set_body_json(token_body(&mock_server)),
        )
        .mount(&mock_server)
        .await;

    let service = AuthService::new(reqwest::Client::new());
    let provider = service
        .execute(&credentials_for(&mock_server))
        .await
        .unwrap();

    assert_eq!(provider.name, "127.0.0.1");
    assert_eq!(provider.auth.token.as_str(), "gAAAAABtoken");
    assert!(provider
        .auth
        .compute_url
        .ends_with("/compute/v2.1"));
    assert!(provider.auth.image_url.ends_with("/image"));
    assert!(provider.auth.network_url.ends_with("/network"));
    assert!(provider.flavors.is_empty());
}

#[tokio::test]
async fn invalid_credentials_map_to_authentication_error() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v3/auth/tokens"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&mock_server)
        .await;

    let service = AuthService::new(reqwest::Client::new());
    let result = service.execute(&credentials_for(&mock_server)).await;
    assert!(matches!(result, Err(StratusError::Authentication(_))));
}

#[tokio::test]
async fn missing_subject_token_header_is_an_error() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v3/auth/tokens"))
        .respond_with(ResponseTemplate::new(201).set_body_json(token_body(&mock_server)))
        .mount(&mock_server)
        .await;

    let service = AuthService::new(reqwest::Client::new());
    let result = service.execute(&credentials_for(&mock_server)).await;
    assert!(matches!(result, Err(StratusError::Authentication(_))));
}

#[tokio::test]
async fn catalog_without_compute_endpoint_is_an_error() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v3/auth/tokens"))
        .respond_with(
            ResponseTemplate::new(201)
                .insert_header("X-Subject-Token", "tok")
                .set_body_json(serde_json::json!({
                    "token": { "expires_at": "2099-01-01T00:00:00Z", "catalog": [] }
                })),
        )
        .mount(&mock_server)
        .await;

    let service = AuthService::new(reqwest::Client::new());
    let result = service.execute(&credentials_for(&mock_server)).await;
    assert!(matches!(result, Err(StratusError::Authentication(_))));
}
