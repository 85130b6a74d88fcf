//! Login credentials for an OpenStack cloud.

/// The fields needed for a Keystone v3 password authentication, scoped to a
/// project. Mutated field-by-field from user input or bulk-replaced by the
/// OpenRC parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Keystone endpoint, e.g. `https://cloud.example.com:5000/v3`.
    pub auth_url: String,
    /// Project domain name or ID (`default` is accepted as either).
    pub project_domain: String,
    pub project_name: String,
    /// User domain name or ID.
    pub user_domain: String,
    pub username: String,
    pub password: String,
}

impl Default for Credentials {
    /// Points at the public demo endpoint so a fresh session has something
    /// to log into. Not a secret; replaced by real input in normal use.
    fn default() -> Self {
        Self {
            auth_url: "https://demo.stratus.cloud:5000/v3".to_string(),
            project_domain: "default".to_string(),
            project_name: "demo".to_string(),
            user_domain: "default".to_string(),
            username: "demo".to_string(),
            password: String::new(),
        }
    }
}
