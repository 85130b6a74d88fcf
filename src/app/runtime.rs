//! The event loop.
//!
//! A single-consumer queue feeds the reducer one event at a time; effects
//! come back and are executed as fire-and-forget tasks, each delivering
//! exactly one response event onto the same queue. Arbitrarily many
//! requests may be outstanding at once and responses may arrive in any
//! order; the reducer's re-resolve-before-merge rule absorbs that.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::app::effect::Effect;
use crate::app::event::Event;
use crate::app::reducer::update;
use crate::core::domain::error::{StratusError, StratusResult};
use crate::core::domain::lookup::provider_by_name;
use crate::core::domain::model::credentials::Credentials;
use crate::core::domain::model::provider::ProviderAuth;
use crate::core::domain::store::AppState;
use crate::core::infrastructure::api_client::ApiClient;

const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Hook for the browser-opening side channel. Fire-and-forget: no result
/// comes back.
pub type UrlOpener = Box<dyn Fn(&str) + Send>;

pub struct Runtime {
    state: AppState,
    api: Arc<ApiClient>,
    events_tx: UnboundedSender<Event>,
    events_rx: UnboundedReceiver<Event>,
    url_opener: Option<UrlOpener>,
}

impl Runtime {
    pub fn new(api: ApiClient) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            state: AppState::new(Utc::now()),
            api: Arc::new(api),
            events_tx,
            events_rx,
            url_opener: None,
        }
    }

    pub fn with_url_opener(mut self, opener: impl Fn(&str) + Send + 'static) -> Self {
        self.url_opener = Some(Box::new(opener));
        self
    }

    /// A handle the rendering layer uses to feed user events in.
    pub fn sender(&self) -> UnboundedSender<Event> {
        self.events_tx.clone()
    }

    /// The current model, for rendering.
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Applies one event to completion and launches its effects.
    pub fn apply(&mut self, event: Event) {
        tracing::trace!(?event, "applying event");
        for effect in update(&mut self.state, event) {
            self.execute(effect);
        }
    }

    /// Waits for the next queued event and applies it. Returns `false` once
    /// every sender is gone and the queue is drained.
    pub async fn step(&mut self) -> bool {
        match self.events_rx.recv().await {
            Some(event) => {
                self.apply(event);
                true
            }
            None => false,
        }
    }

    /// Drives the loop forever: a heartbeat tick every second, interleaved
    /// with queued events.
    pub async fn run(mut self) {
        let mut ticker = tokio::time::interval(TICK_INTERVAL);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = ticker.tick() => self.apply(Event::Tick { now: Utc::now() }),
                event = self.events_rx.recv() => match event {
                    Some(event) => self.apply(event),
                    None => break,
                },
            }
        }
    }

    fn session(&self, provider_name: &str) -> Option<(Credentials, ProviderAuth)> {
        provider_by_name(&self.state.providers, provider_name)
            .map(|p| (p.credentials.clone(), p.auth.clone()))
    }

    fn execute(&mut self, effect: Effect) {
        match effect {
            Effect::Authenticate { credentials } => {
                let api = Arc::clone(&self.api);
                let tx = self.events_tx.clone();
                tokio::spawn(async move {
                    let result = api.auth_service().execute(&credentials).await;
                    let _ = tx.send(Event::AuthCompleted { result });
                });
            }
            Effect::RefreshServers { provider_name } => {
                let name = provider_name.clone();
                self.spawn_gated(
                    &provider_name,
                    |api, auth| async move { api.list_servers(&auth).await },
                    move |result| Event::ServersListed {
                        provider_name: name,
                        result,
                    },
                );
            }
            Effect::FetchServer {
                provider_name,
                uuid,
            } => {
                let name = provider_name.clone();
                let fetch_uuid = uuid.clone();
                self.spawn_gated(
                    &provider_name,
                    move |api, auth| async move { api.get_server(&auth, &fetch_uuid).await },
                    move |result| Event::ServerFetched {
                        provider_name: name,
                        uuid,
                        result,
                    },
                );
            }
            Effect::CreateServer {
                provider_name,
                request,
            } => {
                let name = provider_name.clone();
                self.spawn_gated(
                    &provider_name,
                    move |api, auth| async move { api.create_server(&auth, &request).await },
                    move |result| Event::ServerCreated {
                        provider_name: name,
                        result,
                    },
                );
            }
            Effect::DeleteServer {
                provider_name,
                uuid,
            } => {
                let name = provider_name.clone();
                let delete_uuid = uuid.clone();
                self.spawn_gated(
                    &provider_name,
                    move |api, auth| async move { api.delete_server(&auth, &delete_uuid).await },
                    move |result| Event::ServerDeleted {
                        provider_name: name,
                        uuid,
                        result,
                    },
                );
            }
            Effect::RefreshFlavors { provider_name } => {
                let name = provider_name.clone();
                self.spawn_gated(
                    &provider_name,
                    |api, auth| async move { api.list_flavors(&auth).await },
                    move |result| Event::FlavorsListed {
                        provider_name: name,
                        result,
                    },
                );
            }
            Effect::RefreshImages { provider_name } => {
                let name = provider_name.clone();
                self.spawn_gated(
                    &provider_name,
                    |api, auth| async move { api.list_images(&auth).await },
                    move |result| Event::ImagesListed {
                        provider_name: name,
                        result,
                    },
                );
            }
            Effect::RefreshKeypairs { provider_name } => {
                let name = provider_name.clone();
                self.spawn_gated(
                    &provider_name,
                    |api, auth| async move { api.list_keypairs(&auth).await },
                    move |result| Event::KeypairsListed {
                        provider_name: name,
                        result,
                    },
                );
            }
            Effect::RefreshNetworks { provider_name } => {
                let name = provider_name.clone();
                self.spawn_gated(
                    &provider_name,
                    |api, auth| async move { api.list_networks(&auth).await },
                    move |result| Event::NetworksListed {
                        provider_name: name,
                        result,
                    },
                );
            }
            Effect::ListServerPorts {
                provider_name,
                server_uuid,
            } => {
                let name = provider_name.clone();
                let device = server_uuid.clone();
                self.spawn_gated(
                    &provider_name,
                    move |api, auth| async move { api.list_ports(&auth, &device).await },
                    move |result| Event::PortsListed {
                        provider_name: name,
                        server_uuid,
                        result,
                    },
                );
            }
            Effect::AllocateFloatingIp {
                provider_name,
                server_uuid,
                external_network_uuid,
                port_uuid,
            } => {
                let name = provider_name.clone();
                self.spawn_gated(
                    &provider_name,
                    move |api, auth| async move {
                        api.allocate_floating_ip(&auth, &external_network_uuid, &port_uuid)
                            .await
                    },
                    move |result| Event::FloatingIpAllocated {
                        provider_name: name,
                        server_uuid,
                        result,
                    },
                );
            }
            Effect::CheckCockpit {
                provider_name,
                server_uuid,
                url,
            } => {
                let api = Arc::clone(&self.api);
                let tx = self.events_tx.clone();
                tokio::spawn(async move {
                    let ready = api.probe_url(&url).await;
                    let _ = tx.send(Event::CockpitChecked {
                        provider_name,
                        server_uuid,
                        ready,
                    });
                });
            }
            Effect::OpenUrl { url } => {
                tracing::info!(url = %url, "opening external url");
                if let Some(opener) = &self.url_opener {
                    opener(&url);
                }
            }
        }
    }

    /// Spawns a credentialed request task. The token is validated (and
    /// refreshed if needed) inside the task, before the dependent request
    /// is built, so the request is never issued with a known-expired token.
    /// A refresh additionally reports the new auth back through a
    /// `TokenRefreshed` event.
    fn spawn_gated<T, F, Fut, W>(&self, provider_name: &str, call: F, wrap: W)
    where
        T: Send + 'static,
        F: FnOnce(Arc<ApiClient>, ProviderAuth) -> Fut + Send + 'static,
        Fut: Future<Output = StratusResult<T>> + Send + 'static,
        W: FnOnce(StratusResult<T>) -> Event + Send + 'static,
    {
        let Some((credentials, auth)) = self.session(provider_name) else {
            // Routed through the normal response path so the reducer can
            // surface it like any other stale reference.
            let _ = self.events_tx.send(wrap(Err(StratusError::Connection(format!(
                "No session for provider '{}'",
                provider_name
            )))));
            return;
        };
        let api = Arc::clone(&self.api);
        let tx = self.events_tx.clone();
        let name = provider_name.to_string();
        tokio::spawn(async move {
            let validated = match api.ensure_token(&credentials, &auth).await {
                Ok(validated) => validated,
                Err(e) => {
                    let _ = tx.send(wrap(Err(e)));
                    return;
                }
            };
            if validated.refreshed {
                let _ = tx.send(Event::TokenRefreshed {
                    provider_name: name,
                    auth: validated.auth.clone(),
                });
            }
            let result = call(api, validated.auth).await;
            let _ = tx.send(wrap(result));
        });
    }
}
