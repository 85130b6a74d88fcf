//! Keystone v3 password-authentication request body.

use serde::Serialize;

use crate::core::domain::model::credentials::Credentials;

#[derive(Debug, Serialize)]
pub struct AuthRequest {
    pub auth: Auth,
}

#[derive(Debug, Serialize)]
pub struct Auth {
    pub identity: Identity,
    pub scope: Scope,
}

#[derive(Debug, Serialize)]
pub struct Identity {
    pub methods: Vec<String>,
    pub password: PasswordMethod,
}

#[derive(Debug, Serialize)]
pub struct PasswordMethod {
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct User {
    pub name: String,
    pub domain: DomainIdentifier,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct Scope {
    pub project: Project,
}

#[derive(Debug, Serialize)]
pub struct Project {
    pub name: String,
    pub domain: DomainIdentifier,
}

/// Keystone accepts a domain either by ID or by name. OpenRC files carry one
/// or the other, so we guess from the shape: `default` and UUID-looking
/// values go in the `id` slot, everything else in `name`.
#[derive(Debug, Serialize)]
pub enum DomainIdentifier {
    #[serde(rename = "id")]
    Id(String),
    #[serde(rename = "name")]
    Name(String),
}

impl DomainIdentifier {
    pub fn from_value(value: &str) -> Self {
        if value == "default" || looks_like_uuid(value) {
            DomainIdentifier::Id(value.to_string())
        } else {
            DomainIdentifier::Name(value.to_string())
        }
    }
}

fn looks_like_uuid(value: &str) -> bool {
    let hex = value.chars().filter(|c| c.is_ascii_hexdigit()).count();
    let hyphens = value.chars().filter(|c| *c == '-').count();
    hex + hyphens == value.len() && (hex == 32 && (hyphens == 0 || hyphens == 4))
}

impl AuthRequest {
    pub fn from_credentials(credentials: &Credentials) -> Self {
        Self {
            auth: Auth {
                identity: Identity {
                    methods: vec!["password".to_string()],
                    password: PasswordMethod {
                        user: User {
                            name: credentials.username.clone(),
                            domain: DomainIdentifier::from_value(&credentials.user_domain),
                            password: credentials.password.clone(),
                        },
                    },
                },
                scope: Scope {
                    project: Project {
                        name: credentials.project_name.clone(),
                        domain: DomainIdentifier::from_value(&credentials.project_domain),
                    },
                },
            },
        }
    }
}
