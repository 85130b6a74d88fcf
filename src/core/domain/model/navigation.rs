//! Navigation state.
//!
//! The single source of truth for which view is rendered and which request a
//! poll tick should re-issue. Exhaustive matching on these variants replaces
//! view-routing by convention.

use crate::core::domain::model::server::CreateServerRequest;

/// Top-level view state.
#[derive(Debug, Clone, PartialEq)]
pub enum View {
    /// No provider selected; only the login form exists here.
    Login,
    /// A provider is selected; `name` keys into the provider store.
    Provider {
        name: String,
        view: ProviderView,
    },
}

/// Views scoped to a selected provider.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderView {
    Home,
    ListImages,
    ListServers,
    ServerDetail { uuid: String },
    /// Carries the in-progress create-server draft.
    CreateServer { draft: CreateServerRequest },
}
