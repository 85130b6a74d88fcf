//! The update function.
//!
//! One event in, state mutated to completion, effects out. Every response
//! handler re-resolves its provider by name from current store state; a
//! provider that vanished while the request was in flight drops the
//! response with a surfaced error instead of applying it to stale state.
//! Errors never unwind an update; they become a log entry and a toast.

use crate::app::effect::Effect;
use crate::app::event::{CredentialField, DraftEdit, Event};
use crate::app::scheduler;
use crate::auth::application::service::openrc::parse_openrc;
use crate::core::domain::error::StratusError;
use crate::core::domain::lookup::{
    external_network, floating_ip, provider_by_name, provider_by_name_mut, server_by_uuid,
};
use crate::core::domain::model::navigation::{ProviderView, View};
use crate::core::domain::model::provider::{Provider, ProviderAuth, Remote};
use crate::core::domain::model::server::{CockpitStatus, FloatingIpState, Server};
use crate::core::domain::model::toast::Toast;
use crate::core::domain::store::{remove_server, upsert_provider, upsert_server, AppState};
use crate::core::infrastructure::api_client::cockpit_ping_url;

/// Applies one event to the state and returns the effects to execute.
pub fn update(state: &mut AppState, event: Event) -> Vec<Effect> {
    match event {
        Event::SetCredentialField(field, value) => {
            set_credential_field(state, field, value);
            Vec::new()
        }
        Event::PasteOpenRc(text) => {
            state.credentials = parse_openrc(&state.credentials, &text);
            Vec::new()
        }
        Event::SubmitLogin => vec![Effect::Authenticate {
            credentials: state.credentials.clone(),
        }],
        Event::Navigate(view) => navigate(state, view),
        Event::EditDraft(edit) => {
            edit_draft(state, edit);
            Vec::new()
        }
        Event::SubmitCreateServer => submit_create_server(state),
        Event::ToggleServerSelected {
            provider_name,
            uuid,
        } => {
            with_server_mut(state, &provider_name, &uuid, |server| {
                server.local_props.selected = !server.local_props.selected;
            });
            Vec::new()
        }
        Event::SetAllServersSelected {
            provider_name,
            selected,
        } => {
            if let Some(provider) = provider_by_name_mut(&mut state.providers, &provider_name) {
                if let Some(servers) = provider.servers.loaded_mut() {
                    for server in servers.iter_mut() {
                        server.local_props.selected = selected;
                    }
                }
            }
            Vec::new()
        }
        Event::DeleteServer {
            provider_name,
            uuid,
        } => delete_servers(state, &provider_name, vec![uuid]),
        Event::DeleteSelectedServers { provider_name } => {
            let uuids: Vec<String> = provider_by_name(&state.providers, &provider_name)
                .and_then(|p| p.servers.loaded())
                .map(|servers| {
                    servers
                        .iter()
                        .filter(|s| s.local_props.selected)
                        .map(|s| s.os_props.uuid.clone())
                        .collect()
                })
                .unwrap_or_default();
            delete_servers(state, &provider_name, uuids)
        }
        Event::RequestFloatingIp {
            provider_name,
            uuid,
        } => {
            with_server_mut(state, &provider_name, &uuid, |server| {
                server.local_props.floating_ip_state = FloatingIpState::RequestedWaiting;
            });
            vec![Effect::ListServerPorts {
                provider_name,
                server_uuid: uuid,
            }]
        }
        Event::OpenServerSession {
            provider_name,
            uuid,
        } => open_server_session(state, &provider_name, &uuid),

        Event::Tick { now } => scheduler::handle_tick(state, now),

        Event::AuthCompleted { result } => auth_completed(state, result),
        Event::TokenRefreshed {
            provider_name,
            auth,
        } => token_refreshed(state, &provider_name, auth),
        Event::ServersListed {
            provider_name,
            result,
        } => servers_listed(state, &provider_name, result),
        Event::ServerFetched {
            provider_name,
            uuid,
            result,
        } => server_fetched(state, &provider_name, &uuid, result),
        Event::ServerCreated {
            provider_name,
            result,
        } => server_created(state, &provider_name, result),
        Event::ServerDeleted {
            provider_name,
            uuid,
            result,
        } => {
            // Optimistic removal already happened at request time. The
            // outcome is deliberately not surfaced; see the crate docs.
            tracing::debug!(
                provider = %provider_name,
                uuid = %uuid,
                ok = result.is_ok(),
                "delete response ignored"
            );
            Vec::new()
        }
        Event::FlavorsListed {
            provider_name,
            result,
        } => replace_collection(state, &provider_name, "flavors", result, |p, flavors| {
            p.flavors = flavors;
        }),
        Event::ImagesListed {
            provider_name,
            result,
        } => replace_collection(state, &provider_name, "images", result, |p, images| {
            p.images = images;
        }),
        Event::KeypairsListed {
            provider_name,
            result,
        } => replace_collection(state, &provider_name, "keypairs", result, |p, keypairs| {
            p.keypairs = keypairs;
        }),
        Event::NetworksListed {
            provider_name,
            result,
        } => replace_collection(state, &provider_name, "networks", result, |p, networks| {
            p.networks = networks;
        }),
        Event::PortsListed {
            provider_name,
            server_uuid,
            result,
        } => ports_listed(state, &provider_name, &server_uuid, result),
        Event::FloatingIpAllocated {
            provider_name,
            server_uuid,
            result,
        } => floating_ip_allocated(state, &provider_name, &server_uuid, result),
        Event::CockpitChecked {
            provider_name,
            server_uuid,
            ready,
        } => {
            if missing_provider(state, &provider_name, "cockpit check") {
                return Vec::new();
            }
            with_server_mut(state, &provider_name, &server_uuid, |server| {
                server.local_props.cockpit_status = if ready {
                    CockpitStatus::Ready
                } else {
                    CockpitStatus::CheckedNotReady
                };
            });
            Vec::new()
        }
    }
}

/// Appends to the message log and raises a toast. Never fails, never
/// unwinds; the state transition that called this still completes.
fn surface_error(state: &mut AppState, message: String) {
    tracing::warn!(message = %message, "error surfaced to user");
    state.toasts.push(Toast::new(message.clone(), state.clock));
    state.log.push(message);
}

/// True (after surfacing the stale-response error) when the provider named
/// in a response event no longer exists in the store.
fn missing_provider(state: &mut AppState, provider_name: &str, context: &str) -> bool {
    if provider_by_name(&state.providers, provider_name).is_some() {
        return false;
    }
    surface_error(
        state,
        format!(
            "Dropped {} response for unknown provider '{}'",
            context, provider_name
        ),
    );
    true
}

fn set_credential_field(state: &mut AppState, field: CredentialField, value: String) {
    let creds = &mut state.credentials;
    match field {
        CredentialField::AuthUrl => creds.auth_url = value,
        CredentialField::ProjectDomain => creds.project_domain = value,
        CredentialField::ProjectName => creds.project_name = value,
        CredentialField::UserDomain => creds.user_domain = value,
        CredentialField::Username => creds.username = value,
        CredentialField::Password => creds.password = value,
    }
}

fn navigate(state: &mut AppState, view: View) -> Vec<Effect> {
    let effects = match &view {
        View::Provider {
            name,
            view: ProviderView::ListServers,
        } => {
            match provider_by_name_mut(&mut state.providers, name) {
                Some(provider) => {
                    // Show a spinner on first entry; keep stale data visible
                    // while a refresh is in flight on later entries.
                    if !matches!(provider.servers, Remote::Loaded(_)) {
                        provider.servers = Remote::Loading;
                    }
                    vec![Effect::RefreshServers {
                        provider_name: name.clone(),
                    }]
                }
                None => {
                    surface_error(state, format!("Unknown provider '{}'", name));
                    return Vec::new();
                }
            }
        }
        View::Provider {
            name,
            view: ProviderView::ServerDetail { uuid },
        } => vec![Effect::FetchServer {
            provider_name: name.clone(),
            uuid: uuid.clone(),
        }],
        _ => Vec::new(),
    };
    state.view = view;
    effects
}

fn edit_draft(state: &mut AppState, edit: DraftEdit) {
    if let View::Provider {
        view: ProviderView::CreateServer { draft },
        ..
    } = &mut state.view
    {
        match edit {
            DraftEdit::SetName(name) => draft.name = name,
            DraftEdit::SetCount(count) => draft.count = count.max(1),
            DraftEdit::SetFlavor(flavor_uuid) => draft.flavor_uuid = flavor_uuid,
            DraftEdit::SetVolBacked(vol_backed) => draft.vol_backed = vol_backed,
            DraftEdit::SetVolBackedSizeGb(size) => draft.vol_backed_size_gb = size,
            DraftEdit::SetKeypair(keypair) => draft.keypair_name = keypair,
            DraftEdit::SetUserData(user_data) => draft.user_data = user_data,
        }
    }
}

/// Consumes the draft exactly once: the submit navigates away to the server
/// list and the request rides out as an effect.
fn submit_create_server(state: &mut AppState) -> Vec<Effect> {
    let draft = match &state.view {
        View::Provider {
            view: ProviderView::CreateServer { draft },
            ..
        } => draft.clone(),
        _ => return Vec::new(),
    };
    let provider_name = draft.provider_name.clone();
    let mut effects = navigate(
        state,
        View::Provider {
            name: provider_name.clone(),
            view: ProviderView::ListServers,
        },
    );
    effects.push(Effect::CreateServer {
        provider_name,
        request: draft,
    });
    effects
}

/// Optimistic delete: the servers leave local state now; the eventual
/// responses are not inspected for success.
fn delete_servers(state: &mut AppState, provider_name: &str, uuids: Vec<String>) -> Vec<Effect> {
    if provider_by_name(&state.providers, provider_name).is_none() {
        surface_error(state, format!("Unknown provider '{}'", provider_name));
        return Vec::new();
    }
    let Some(provider) = provider_by_name_mut(&mut state.providers, provider_name) else {
        return Vec::new();
    };
    let mut effects = Vec::new();
    for uuid in uuids {
        with_server_in_provider(provider, &uuid, |server| {
            server.local_props.deletion_attempted = true;
        });
        remove_server(provider, &uuid);
        effects.push(Effect::DeleteServer {
            provider_name: provider_name.to_string(),
            uuid,
        });
    }
    effects
}

fn open_server_session(state: &mut AppState, provider_name: &str, uuid: &str) -> Vec<Effect> {
    let address = provider_by_name(&state.providers, provider_name)
        .and_then(|p| server_by_uuid(p, uuid))
        .and_then(floating_ip)
        .map(|ip| ip.address.clone());
    match address {
        Some(address) => vec![Effect::OpenUrl {
            url: format!("https://{}:9090", address),
        }],
        None => {
            surface_error(
                state,
                "Server has no floating IP to reach its session endpoint".to_string(),
            );
            Vec::new()
        }
    }
}

fn auth_completed(
    state: &mut AppState,
    result: Result<Provider, StratusError>,
) -> Vec<Effect> {
    match result {
        Ok(provider) => {
            let name = provider.name.clone();
            upsert_provider(&mut state.providers, provider);
            state.view = View::Provider {
                name: name.clone(),
                view: ProviderView::Home,
            };
            state.toasts.push(Toast::new(
                format!("Logged in to {}", name),
                state.clock,
            ));
            // Servers stay lazy; everything else loads eagerly.
            vec![
                Effect::RefreshFlavors {
                    provider_name: name.clone(),
                },
                Effect::RefreshImages {
                    provider_name: name.clone(),
                },
                Effect::RefreshKeypairs {
                    provider_name: name.clone(),
                },
                Effect::RefreshNetworks {
                    provider_name: name,
                },
            ]
        }
        Err(e) => {
            surface_error(state, format!("Authentication failed: {}", e));
            Vec::new()
        }
    }
}

fn token_refreshed(
    state: &mut AppState,
    provider_name: &str,
    auth: ProviderAuth,
) -> Vec<Effect> {
    if missing_provider(state, provider_name, "token refresh") {
        return Vec::new();
    }
    if let Some(provider) = provider_by_name_mut(&mut state.providers, provider_name) {
        provider.auth = auth;
    }
    Vec::new()
}

fn servers_listed(
    state: &mut AppState,
    provider_name: &str,
    result: Result<Vec<Server>, StratusError>,
) -> Vec<Effect> {
    if missing_provider(state, provider_name, "server list") {
        return Vec::new();
    }
    match result {
        Ok(servers) => {
            let mut servers: Vec<Server> =
                servers.into_iter().map(|s| reconcile_server(s, None)).collect();
            servers.sort_by(|a, b| a.os_props.name.cmp(&b.os_props.name));
            if let Some(provider) = provider_by_name_mut(&mut state.providers, provider_name) {
                provider.servers = Remote::Loaded(servers);
            }
        }
        Err(e) => {
            let message = format!("Listing servers on {} failed: {}", provider_name, e);
            if let Some(provider) = provider_by_name_mut(&mut state.providers, provider_name) {
                provider.servers = Remote::Failed(e.to_string());
            }
            surface_error(state, message);
        }
    }
    Vec::new()
}

fn server_fetched(
    state: &mut AppState,
    provider_name: &str,
    uuid: &str,
    result: Result<Server, StratusError>,
) -> Vec<Effect> {
    if missing_provider(state, provider_name, "server detail") {
        return Vec::new();
    }
    match result {
        Ok(incoming) => {
            let Some(provider) = provider_by_name_mut(&mut state.providers, provider_name) else {
                return Vec::new();
            };
            let prior = server_by_uuid(provider, uuid).cloned();
            let server = reconcile_server(incoming, prior.as_ref());

            // Probe the session endpoint once a floating IP shows up.
            let probe = match (floating_ip(&server), server.local_props.cockpit_status) {
                (Some(ip), CockpitStatus::NotChecked) => Some(Effect::CheckCockpit {
                    provider_name: provider_name.to_string(),
                    server_uuid: uuid.to_string(),
                    url: cockpit_ping_url(&ip.address),
                }),
                _ => None,
            };

            upsert_server(provider, server);
            probe.into_iter().collect()
        }
        Err(e) => {
            surface_error(
                state,
                format!("Fetching server {} on {} failed: {}", uuid, provider_name, e),
            );
            Vec::new()
        }
    }
}

fn server_created(
    state: &mut AppState,
    provider_name: &str,
    result: Result<String, StratusError>,
) -> Vec<Effect> {
    if missing_provider(state, provider_name, "server create") {
        return Vec::new();
    }
    match result {
        Ok(uuid) => {
            // The canonical record comes from a list refresh, not from a
            // locally synthesized server.
            tracing::debug!(provider = %provider_name, uuid = %uuid, "server created");
            vec![Effect::RefreshServers {
                provider_name: provider_name.to_string(),
            }]
        }
        Err(e) => {
            surface_error(
                state,
                format!("Creating server on {} failed: {}", provider_name, e),
            );
            Vec::new()
        }
    }
}

fn replace_collection<T>(
    state: &mut AppState,
    provider_name: &str,
    what: &str,
    result: Result<Vec<T>, StratusError>,
    assign: impl FnOnce(&mut Provider, Vec<T>),
) -> Vec<Effect> {
    if missing_provider(state, provider_name, what) {
        return Vec::new();
    }
    match result {
        Ok(items) => {
            if let Some(provider) = provider_by_name_mut(&mut state.providers, provider_name) {
                assign(provider, items);
            }
        }
        Err(e) => surface_error(
            state,
            format!("Listing {} on {} failed: {}", what, provider_name, e),
        ),
    }
    Vec::new()
}

fn ports_listed(
    state: &mut AppState,
    provider_name: &str,
    server_uuid: &str,
    result: Result<Vec<crate::core::domain::model::resource::Port>, StratusError>,
) -> Vec<Effect> {
    if missing_provider(state, provider_name, "port list") {
        return Vec::new();
    }
    let ports = match result {
        Ok(ports) => ports,
        Err(e) => {
            fail_floating_ip(state, provider_name, server_uuid);
            surface_error(
                state,
                format!("Listing ports on {} failed: {}", provider_name, e),
            );
            return Vec::new();
        }
    };

    let Some(provider) = provider_by_name_mut(&mut state.providers, provider_name) else {
        return Vec::new();
    };
    provider.ports = ports;

    let port_uuid = provider
        .ports
        .iter()
        .find(|p| p.device_id == server_uuid)
        .map(|p| p.id.clone());
    let external_network_uuid = external_network(provider).map(|n| n.id.clone());

    match (port_uuid, external_network_uuid) {
        (Some(port_uuid), Some(external_network_uuid)) => vec![Effect::AllocateFloatingIp {
            provider_name: provider_name.to_string(),
            server_uuid: server_uuid.to_string(),
            external_network_uuid,
            port_uuid,
        }],
        (None, _) => {
            fail_floating_ip(state, provider_name, server_uuid);
            surface_error(
                state,
                format!("Server {} has no port to attach a floating IP to", server_uuid),
            );
            Vec::new()
        }
        (_, None) => {
            fail_floating_ip(state, provider_name, server_uuid);
            surface_error(
                state,
                format!("Provider {} has no external network", provider_name),
            );
            Vec::new()
        }
    }
}

fn floating_ip_allocated(
    state: &mut AppState,
    provider_name: &str,
    server_uuid: &str,
    result: Result<String, StratusError>,
) -> Vec<Effect> {
    if missing_provider(state, provider_name, "floating IP") {
        return Vec::new();
    }
    match result {
        Ok(address) => {
            // The new address is observed through the normal detail-merge
            // path rather than hand-constructed here.
            state.toasts.push(Toast::new(
                format!("Floating IP {} assigned", address),
                state.clock,
            ));
            vec![Effect::FetchServer {
                provider_name: provider_name.to_string(),
                uuid: server_uuid.to_string(),
            }]
        }
        Err(e) => {
            fail_floating_ip(state, provider_name, server_uuid);
            surface_error(
                state,
                format!("Floating IP request for {} failed: {}", server_uuid, e),
            );
            Vec::new()
        }
    }
}

fn fail_floating_ip(state: &mut AppState, provider_name: &str, server_uuid: &str) {
    with_server_mut(state, provider_name, server_uuid, |server| {
        server.local_props.floating_ip_state = FloatingIpState::Failed;
    });
}

/// Carries prior client-local state onto an incoming server record and
/// re-derives the floating-IP acquisition state from the fresh details.
fn reconcile_server(mut incoming: Server, prior: Option<&Server>) -> Server {
    if let Some(prior) = prior {
        incoming.local_props = prior.local_props.clone();
    }
    let (has_fixed, has_floating, is_active) = match &incoming.os_props.details {
        Some(details) => (
            incoming.fixed_ip().is_some(),
            incoming.floating_ip().is_some(),
            details.is_active(),
        ),
        None => (false, false, false),
    };
    incoming.local_props.floating_ip_state = FloatingIpState::derive(
        has_fixed,
        has_floating,
        is_active,
        incoming.local_props.floating_ip_state,
    );
    incoming
}

fn with_server_mut(
    state: &mut AppState,
    provider_name: &str,
    uuid: &str,
    mutate: impl FnOnce(&mut Server),
) {
    if let Some(provider) = provider_by_name_mut(&mut state.providers, provider_name) {
        with_server_in_provider(provider, uuid, mutate);
    }
}

fn with_server_in_provider(provider: &mut Provider, uuid: &str, mutate: impl FnOnce(&mut Server)) {
    if let Some(servers) = provider.servers.loaded_mut() {
        if let Some(server) = servers.iter_mut().find(|s| s.os_props.uuid == uuid) {
            mutate(server);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::domain::model::credentials::Credentials;
    use crate::core::domain::model::provider::Token;
    use crate::core::domain::model::resource::{IpAddress, IpKind, Network, Port};
    use crate::core::domain::model::server::{OsProps, ServerDetails};
    use chrono::{Duration, TimeZone, Utc};

    fn test_auth() -> ProviderAuth {
        ProviderAuth {
            auth_url: "https://cloud.test:5000/v3".to_string(),
            compute_url: "https://cloud.test:8774/v2.1".to_string(),
            image_url: "https://cloud.test:9292".to_string(),
            network_url: "https://cloud.test:9696".to_string(),
            token: Token::new("tok".to_string(), Utc::now() + Duration::hours(1)),
        }
    }

    fn provider(name: &str) -> Provider {
        Provider::new(name.to_string(), Credentials::default(), test_auth())
    }

    fn state_with_provider(name: &str) -> AppState {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let mut state = AppState::new(now);
        upsert_provider(&mut state.providers, provider(name));
        state
    }

    fn server(uuid: &str, name: &str) -> Server {
        Server::new(OsProps {
            uuid: uuid.to_string(),
            name: name.to_string(),
            details: Some(ServerDetails {
                status: "ACTIVE".to_string(),
                power_state: Some(1),
                addresses: vec![IpAddress {
                    address: "10.0.0.5".to_string(),
                    kind: IpKind::Fixed,
                }],
                flavor_uuid: None,
                image_uuid: None,
            }),
        })
    }

    fn loaded_servers<'a>(state: &'a AppState, provider_name: &str) -> &'a [Server] {
        provider_by_name(&state.providers, provider_name)
            .unwrap()
            .servers
            .loaded()
            .unwrap()
    }

    #[test]
    fn stale_response_is_dropped_with_a_logged_error() {
        let mut state = state_with_provider("cloud.test");
        let before = state.providers.clone();

        let effects = update(
            &mut state,
            Event::ServersListed {
                provider_name: "gone.cloud".to_string(),
                result: Ok(vec![server("u1", "web")]),
            },
        );

        assert!(effects.is_empty());
        assert_eq!(state.providers, before);
        assert_eq!(state.log.len(), 1);
        assert!(state.log[0].contains("gone.cloud"));
        assert_eq!(state.toasts.len(), 1);
    }

    #[test]
    fn server_list_response_replaces_collection_sorted() {
        let mut state = state_with_provider("cloud.test");
        update(
            &mut state,
            Event::ServersListed {
                provider_name: "cloud.test".to_string(),
                result: Ok(vec![server("u9", "zulu"), server("u1", "alpha")]),
            },
        );
        let names: Vec<_> = loaded_servers(&state, "cloud.test")
            .iter()
            .map(|s| s.os_props.name.as_str())
            .collect();
        assert_eq!(names, vec!["alpha", "zulu"]);

        // A later, shorter listing fully replaces, never merges.
        update(
            &mut state,
            Event::ServersListed {
                provider_name: "cloud.test".to_string(),
                result: Ok(vec![server("u1", "alpha")]),
            },
        );
        assert_eq!(loaded_servers(&state, "cloud.test").len(), 1);
    }

    #[test]
    fn server_list_failure_marks_remote_failed_and_toasts() {
        let mut state = state_with_provider("cloud.test");
        update(
            &mut state,
            Event::ServersListed {
                provider_name: "cloud.test".to_string(),
                result: Err(StratusError::Connection("boom".to_string())),
            },
        );
        let p = provider_by_name(&state.providers, "cloud.test").unwrap();
        assert!(matches!(p.servers, Remote::Failed(_)));
        assert_eq!(state.toasts.len(), 1);
        assert_eq!(state.log.len(), 1);
    }

    #[test]
    fn detail_response_merges_by_uuid_leaving_others_untouched() {
        let mut state = state_with_provider("cloud.test");
        update(
            &mut state,
            Event::ServersListed {
                provider_name: "cloud.test".to_string(),
                result: Ok(vec![server("u1", "alpha"), server("u2", "bravo")]),
            },
        );
        // Mark u1 selected, then merge a detail update for u2.
        update(
            &mut state,
            Event::ToggleServerSelected {
                provider_name: "cloud.test".to_string(),
                uuid: "u1".to_string(),
            },
        );
        let mut updated = server("u2", "bravo");
        updated.os_props.details.as_mut().unwrap().status = "SHUTOFF".to_string();
        update(
            &mut state,
            Event::ServerFetched {
                provider_name: "cloud.test".to_string(),
                uuid: "u2".to_string(),
                result: Ok(updated),
            },
        );

        let servers = loaded_servers(&state, "cloud.test");
        assert_eq!(servers.len(), 2);
        let u1 = servers.iter().find(|s| s.os_props.uuid == "u1").unwrap();
        assert!(u1.local_props.selected);
        let u2 = servers.iter().find(|s| s.os_props.uuid == "u2").unwrap();
        assert_eq!(u2.os_props.details.as_ref().unwrap().status, "SHUTOFF");
    }

    #[test]
    fn detail_merge_preserves_local_props_and_rederives_floating_state() {
        let mut state = state_with_provider("cloud.test");
        update(
            &mut state,
            Event::ServersListed {
                provider_name: "cloud.test".to_string(),
                result: Ok(vec![server("u1", "alpha")]),
            },
        );
        // Active with a fixed IP only: requestable after the list arrives.
        {
            let servers = loaded_servers(&state, "cloud.test");
            assert_eq!(
                servers[0].local_props.floating_ip_state,
                FloatingIpState::Requestable
            );
        }

        update(
            &mut state,
            Event::RequestFloatingIp {
                provider_name: "cloud.test".to_string(),
                uuid: "u1".to_string(),
            },
        );
        // A detail refresh without the address yet keeps the in-flight state.
        update(
            &mut state,
            Event::ServerFetched {
                provider_name: "cloud.test".to_string(),
                uuid: "u1".to_string(),
                result: Ok(server("u1", "alpha")),
            },
        );
        {
            let servers = loaded_servers(&state, "cloud.test");
            assert_eq!(
                servers[0].local_props.floating_ip_state,
                FloatingIpState::RequestedWaiting
            );
        }

        // Once the address appears the state resolves to success.
        let mut with_ip = server("u1", "alpha");
        with_ip
            .os_props
            .details
            .as_mut()
            .unwrap()
            .addresses
            .push(IpAddress {
                address: "203.0.113.7".to_string(),
                kind: IpKind::Floating,
            });
        update(
            &mut state,
            Event::ServerFetched {
                provider_name: "cloud.test".to_string(),
                uuid: "u1".to_string(),
                result: Ok(with_ip),
            },
        );
        let servers = loaded_servers(&state, "cloud.test");
        assert_eq!(
            servers[0].local_props.floating_ip_state,
            FloatingIpState::Success
        );
    }

    #[test]
    fn detail_with_floating_ip_triggers_one_cockpit_probe() {
        let mut state = state_with_provider("cloud.test");
        let mut with_ip = server("u1", "alpha");
        with_ip
            .os_props
            .details
            .as_mut()
            .unwrap()
            .addresses
            .push(IpAddress {
                address: "203.0.113.7".to_string(),
                kind: IpKind::Floating,
            });
        let effects = update(
            &mut state,
            Event::ServerFetched {
                provider_name: "cloud.test".to_string(),
                uuid: "u1".to_string(),
                result: Ok(with_ip.clone()),
            },
        );
        assert_eq!(
            effects,
            vec![Effect::CheckCockpit {
                provider_name: "cloud.test".to_string(),
                server_uuid: "u1".to_string(),
                url: "https://203.0.113.7:9090/ping".to_string(),
            }]
        );

        // After the probe answered, further refreshes do not probe again.
        update(
            &mut state,
            Event::CockpitChecked {
                provider_name: "cloud.test".to_string(),
                server_uuid: "u1".to_string(),
                ready: true,
            },
        );
        let effects = update(
            &mut state,
            Event::ServerFetched {
                provider_name: "cloud.test".to_string(),
                uuid: "u1".to_string(),
                result: Ok(with_ip),
            },
        );
        assert!(effects.is_empty());
        let servers = loaded_servers(&state, "cloud.test");
        assert_eq!(servers[0].local_props.cockpit_status, CockpitStatus::Ready);
    }

    #[test]
    fn delete_is_optimistic_and_ignores_the_response() {
        let mut state = state_with_provider("cloud.test");
        update(
            &mut state,
            Event::ServersListed {
                provider_name: "cloud.test".to_string(),
                result: Ok(vec![server("u1", "alpha"), server("u2", "bravo")]),
            },
        );
        let effects = update(
            &mut state,
            Event::DeleteServer {
                provider_name: "cloud.test".to_string(),
                uuid: "u1".to_string(),
            },
        );
        assert_eq!(
            effects,
            vec![Effect::DeleteServer {
                provider_name: "cloud.test".to_string(),
                uuid: "u1".to_string(),
            }]
        );
        // Removed synchronously, before any response.
        assert_eq!(loaded_servers(&state, "cloud.test").len(), 1);

        // Even a failing delete response changes nothing and surfaces nothing.
        let logged = state.log.len();
        update(
            &mut state,
            Event::ServerDeleted {
                provider_name: "cloud.test".to_string(),
                uuid: "u1".to_string(),
                result: Err(StratusError::Api {
                    status: 409,
                    message: "locked".to_string(),
                }),
            },
        );
        assert_eq!(loaded_servers(&state, "cloud.test").len(), 1);
        assert_eq!(state.log.len(), logged);
    }

    #[test]
    fn delete_selected_removes_all_selected_servers() {
        let mut state = state_with_provider("cloud.test");
        update(
            &mut state,
            Event::ServersListed {
                provider_name: "cloud.test".to_string(),
                result: Ok(vec![
                    server("u1", "alpha"),
                    server("u2", "bravo"),
                    server("u3", "charlie"),
                ]),
            },
        );
        for uuid in ["u1", "u3"] {
            update(
                &mut state,
                Event::ToggleServerSelected {
                    provider_name: "cloud.test".to_string(),
                    uuid: uuid.to_string(),
                },
            );
        }
        let effects = update(
            &mut state,
            Event::DeleteSelectedServers {
                provider_name: "cloud.test".to_string(),
            },
        );
        assert_eq!(effects.len(), 2);
        let names: Vec<_> = loaded_servers(&state, "cloud.test")
            .iter()
            .map(|s| s.os_props.name.as_str())
            .collect();
        assert_eq!(names, vec!["bravo"]);
    }

    #[test]
    fn deleting_on_an_unknown_provider_surfaces_an_error() {
        let mut state = state_with_provider("cloud.test");
        let effects = update(
            &mut state,
            Event::DeleteServer {
                provider_name: "gone.cloud".to_string(),
                uuid: "u1".to_string(),
            },
        );
        assert!(effects.is_empty());
        assert_eq!(state.log.len(), 1);
        assert!(state.log[0].contains("gone.cloud"));
        assert_eq!(state.toasts.len(), 1);
    }

    #[test]
    fn create_success_refreshes_the_list_instead_of_synthesizing() {
        let mut state = state_with_provider("cloud.test");
        let effects = update(
            &mut state,
            Event::ServerCreated {
                provider_name: "cloud.test".to_string(),
                result: Ok("new-uuid".to_string()),
            },
        );
        assert_eq!(
            effects,
            vec![Effect::RefreshServers {
                provider_name: "cloud.test".to_string()
            }]
        );
    }

    #[test]
    fn floating_ip_chain_ports_to_allocation_to_refresh() {
        let mut state = state_with_provider("cloud.test");
        update(
            &mut state,
            Event::NetworksListed {
                provider_name: "cloud.test".to_string(),
                result: Ok(vec![Network {
                    id: "ext-net".to_string(),
                    name: "public".to_string(),
                    is_external: true,
                    status: None,
                }]),
            },
        );
        update(
            &mut state,
            Event::ServersListed {
                provider_name: "cloud.test".to_string(),
                result: Ok(vec![server("u1", "alpha")]),
            },
        );

        let effects = update(
            &mut state,
            Event::RequestFloatingIp {
                provider_name: "cloud.test".to_string(),
                uuid: "u1".to_string(),
            },
        );
        assert_eq!(
            effects,
            vec![Effect::ListServerPorts {
                provider_name: "cloud.test".to_string(),
                server_uuid: "u1".to_string(),
            }]
        );

        let effects = update(
            &mut state,
            Event::PortsListed {
                provider_name: "cloud.test".to_string(),
                server_uuid: "u1".to_string(),
                result: Ok(vec![Port {
                    id: "port-1".to_string(),
                    device_id: "u1".to_string(),
                    network_id: "int-net".to_string(),
                    status: None,
                }]),
            },
        );
        assert_eq!(
            effects,
            vec![Effect::AllocateFloatingIp {
                provider_name: "cloud.test".to_string(),
                server_uuid: "u1".to_string(),
                external_network_uuid: "ext-net".to_string(),
                port_uuid: "port-1".to_string(),
            }]
        );

        let effects = update(
            &mut state,
            Event::FloatingIpAllocated {
                provider_name: "cloud.test".to_string(),
                server_uuid: "u1".to_string(),
                result: Ok("203.0.113.7".to_string()),
            },
        );
        assert_eq!(
            effects,
            vec![Effect::FetchServer {
                provider_name: "cloud.test".to_string(),
                uuid: "u1".to_string(),
            }]
        );
    }

    #[test]
    fn floating_ip_failure_marks_the_server_failed() {
        let mut state = state_with_provider("cloud.test");
        update(
            &mut state,
            Event::ServersListed {
                provider_name: "cloud.test".to_string(),
                result: Ok(vec![server("u1", "alpha")]),
            },
        );
        update(
            &mut state,
            Event::FloatingIpAllocated {
                provider_name: "cloud.test".to_string(),
                server_uuid: "u1".to_string(),
                result: Err(StratusError::Api {
                    status: 409,
                    message: "quota exceeded".to_string(),
                }),
            },
        );
        let servers = loaded_servers(&state, "cloud.test");
        assert_eq!(
            servers[0].local_props.floating_ip_state,
            FloatingIpState::Failed
        );
        assert_eq!(state.toasts.len(), 1);
    }

    #[test]
    fn auth_success_upserts_navigates_and_loads_eagerly() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let mut state = AppState::new(now);
        let effects = update(
            &mut state,
            Event::AuthCompleted {
                result: Ok(provider("cloud.test")),
            },
        );
        assert_eq!(state.providers.len(), 1);
        assert_eq!(
            state.view,
            View::Provider {
                name: "cloud.test".to_string(),
                view: ProviderView::Home,
            }
        );
        assert_eq!(effects.len(), 4);
        assert!(effects.iter().all(|e| matches!(
            e,
            Effect::RefreshFlavors { .. }
                | Effect::RefreshImages { .. }
                | Effect::RefreshKeypairs { .. }
                | Effect::RefreshNetworks { .. }
        )));
        // Logging in again replaces the session rather than duplicating it.
        update(
            &mut state,
            Event::AuthCompleted {
                result: Ok(provider("cloud.test")),
            },
        );
        assert_eq!(state.providers.len(), 1);
    }

    #[test]
    fn token_refresh_merges_into_current_provider() {
        let mut state = state_with_provider("cloud.test");
        let mut fresh = test_auth();
        fresh.token = Token::new("fresh".to_string(), Utc::now() + Duration::hours(2));
        update(
            &mut state,
            Event::TokenRefreshed {
                provider_name: "cloud.test".to_string(),
                auth: fresh.clone(),
            },
        );
        let p = provider_by_name(&state.providers, "cloud.test").unwrap();
        assert_eq!(p.auth.token.as_str(), "fresh");

        // A refresh for a vanished provider is dropped with an error.
        update(
            &mut state,
            Event::TokenRefreshed {
                provider_name: "gone.cloud".to_string(),
                auth: fresh,
            },
        );
        assert_eq!(state.log.len(), 1);
    }

    #[test]
    fn openrc_paste_overlays_the_credentials_draft() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let mut state = AppState::new(now);
        let default_password = state.credentials.password.clone();
        update(
            &mut state,
            Event::PasteOpenRc("export OS_USERNAME=\"alice\"\n".to_string()),
        );
        assert_eq!(state.credentials.username, "alice");
        assert_eq!(state.credentials.password, default_password);
    }

    #[test]
    fn navigating_to_server_list_requests_a_refresh() {
        let mut state = state_with_provider("cloud.test");
        let effects = update(
            &mut state,
            Event::Navigate(View::Provider {
                name: "cloud.test".to_string(),
                view: ProviderView::ListServers,
            }),
        );
        assert_eq!(
            effects,
            vec![Effect::RefreshServers {
                provider_name: "cloud.test".to_string()
            }]
        );
        let p = provider_by_name(&state.providers, "cloud.test").unwrap();
        assert_eq!(p.servers, Remote::Loading);
    }

    #[test]
    fn submitting_a_draft_consumes_it_and_navigates_to_the_list() {
        use crate::core::domain::model::server::CreateServerRequest;
        let mut state = state_with_provider("cloud.test");
        let mut draft = CreateServerRequest::new("cloud.test", "img-1", "ubuntu");
        draft.name = "web".to_string();
        draft.flavor_uuid = "flavor-1".to_string();
        state.view = View::Provider {
            name: "cloud.test".to_string(),
            view: ProviderView::CreateServer { draft },
        };

        let effects = update(&mut state, Event::SubmitCreateServer);
        assert!(matches!(
            state.view,
            View::Provider {
                view: ProviderView::ListServers,
                ..
            }
        ));
        assert!(effects.iter().any(|e| matches!(
            e,
            Effect::CreateServer { request, .. } if request.name == "web"
        )));
        assert!(effects
            .iter()
            .any(|e| matches!(e, Effect::RefreshServers { .. })));
    }

    #[test]
    fn draft_edits_apply_only_in_the_create_view() {
        let mut state = state_with_provider("cloud.test");
        // No create view open: the edit is a no-op, not a panic.
        update(&mut state, Event::EditDraft(DraftEdit::SetName("x".to_string())));

        use crate::core::domain::model::server::CreateServerRequest;
        state.view = View::Provider {
            name: "cloud.test".to_string(),
            view: ProviderView::CreateServer {
                draft: CreateServerRequest::new("cloud.test", "img-1", "ubuntu"),
            },
        };
        update(&mut state, Event::EditDraft(DraftEdit::SetCount(3)));
        update(&mut state, Event::EditDraft(DraftEdit::SetCount(0)));
        if let View::Provider {
            view: ProviderView::CreateServer { draft },
            ..
        } = &state.view
        {
            // Count is clamped to at least one instance.
            assert_eq!(draft.count, 1);
        } else {
            panic!("create view lost");
        }
    }

    #[test]
    fn open_session_requires_a_floating_ip() {
        let mut state = state_with_provider("cloud.test");
        update(
            &mut state,
            Event::ServersListed {
                provider_name: "cloud.test".to_string(),
                result: Ok(vec![server("u1", "alpha")]),
            },
        );
        let effects = update(
            &mut state,
            Event::OpenServerSession {
                provider_name: "cloud.test".to_string(),
                uuid: "u1".to_string(),
            },
        );
        assert!(effects.is_empty());
        assert_eq!(state.toasts.len(), 1);
    }
}
