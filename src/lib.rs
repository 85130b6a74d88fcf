//! Stratus is the client core of an OpenStack compute console: the state
//! machine that keeps credentials, auth tokens and multi-provider resource
//! state consistent while asynchronous API responses arrive in any order.
//!
//! The crate deliberately stops short of rendering. A front end feeds
//! [`Event`]s into the [`Runtime`] and redraws from [`Runtime::state`];
//! everything between those two points lives here.
//!
//! # Example
//!
//! ```no_run
//! use stratus::{ApiClient, Event, Runtime};
//!
//! #[tokio::main]
//! async fn main() {
//!     let api = ApiClient::new(reqwest::Client::new());
//!     let runtime = Runtime::new(api);
//!     let events = runtime.sender();
//!
//!     // A rendering layer would hold on to `events` and push user
//!     // actions; here we just log in with the default demo credentials.
//!     events.send(Event::SubmitLogin).unwrap();
//!     runtime.run().await;
//! }
//! ```

mod app;
mod auth;
mod core;

pub use crate::app::effect::Effect;
pub use crate::app::event::{CredentialField, DraftEdit, Event};
pub use crate::app::reducer::update;
pub use crate::app::runtime::Runtime;
pub use crate::auth::application::service::auth_service::{provider_name, AuthService};
pub use crate::auth::application::service::openrc::parse_openrc;
pub use crate::core::domain::error::{StratusError, StratusResult, ValidationError};
pub use crate::core::domain::lookup;
pub use crate::core::domain::model::credentials::Credentials;
pub use crate::core::domain::model::navigation::{ProviderView, View};
pub use crate::core::domain::model::provider::{Provider, ProviderAuth, Remote, Token};
pub use crate::core::domain::model::resource::{
    Flavor, Image, IpAddress, IpKind, Keypair, Network, Port,
};
pub use crate::core::domain::model::server::{
    CockpitStatus, CreateServerRequest, FloatingIpState, LocalProps, OsProps, Server,
    ServerDetails,
};
pub use crate::core::domain::model::toast::{Toast, TOAST_LIFETIME_SECONDS};
pub use crate::core::domain::store::{upsert_provider, upsert_server, AppState};
pub use crate::core::infrastructure::api_client::ApiClient;

#[cfg(test)]
mod tests;
