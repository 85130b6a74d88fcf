//! The heartbeat tick.
//!
//! Every tick advances the model clock and prunes expired toasts. Ticks
//! whose wall-clock second lands on the poll cadence additionally re-issue
//! the refresh request matching the current view, so displayed server
//! status stays current without a push channel.

use chrono::{DateTime, Timelike, Utc};

use crate::app::effect::Effect;
use crate::core::domain::model::navigation::{ProviderView, View};
use crate::core::domain::model::toast::prune_toasts;
use crate::core::domain::store::AppState;

/// Polls fire on wall-clock seconds divisible by this, so a delayed tick
/// cannot shift the cadence permanently.
pub const POLL_CADENCE_SECONDS: u32 = 10;

pub fn handle_tick(state: &mut AppState, now: DateTime<Utc>) -> Vec<Effect> {
    state.clock = now;
    prune_toasts(&mut state.toasts, now);

    if now.second() % POLL_CADENCE_SECONDS != 0 {
        return Vec::new();
    }

    match &state.view {
        View::Provider {
            name,
            view: ProviderView::ListServers,
        } => vec![Effect::RefreshServers {
            provider_name: name.clone(),
        }],
        View::Provider {
            name,
            view: ProviderView::ServerDetail { uuid },
        } => vec![Effect::FetchServer {
            provider_name: name.clone(),
            uuid: uuid.clone(),
        }],
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::domain::model::toast::Toast;
    use chrono::{Duration, TimeZone};

    fn at_second(second: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, second).unwrap()
    }

    #[test]
    fn tick_updates_clock_and_prunes_toasts() {
        let mut state = AppState::new(at_second(0));
        state.toasts.push(Toast::new("old".to_string(), at_second(0)));
        let effects = handle_tick(&mut state, at_second(11));
        assert_eq!(state.clock, at_second(11));
        assert!(state.toasts.is_empty());
        assert!(effects.is_empty());
    }

    #[test]
    fn poll_fires_on_cadence_for_server_list_view() {
        let mut state = AppState::new(at_second(0));
        state.view = View::Provider {
            name: "cloud.test".to_string(),
            view: ProviderView::ListServers,
        };
        assert!(handle_tick(&mut state, at_second(7)).is_empty());
        let effects = handle_tick(&mut state, at_second(20));
        assert_eq!(
            effects,
            vec![Effect::RefreshServers {
                provider_name: "cloud.test".to_string()
            }]
        );
    }

    #[test]
    fn poll_fires_detail_fetch_on_server_detail_view() {
        let mut state = AppState::new(at_second(0));
        state.view = View::Provider {
            name: "cloud.test".to_string(),
            view: ProviderView::ServerDetail {
                uuid: "u1".to_string(),
            },
        };
        let effects = handle_tick(&mut state, at_second(30));
        assert_eq!(
            effects,
            vec![Effect::FetchServer {
                provider_name: "cloud.test".to_string(),
                uuid: "u1".to_string()
            }]
        );
    }

    #[test]
    fn poll_is_a_noop_outside_provider_scoped_server_views() {
        let mut state = AppState::new(at_second(0));
        assert!(handle_tick(&mut state, at_second(10)).is_empty());
        state.view = View::Provider {
            name: "cloud.test".to_string(),
            view: ProviderView::Home,
        };
        assert!(handle_tick(&mut state, at_second(10)).is_empty());
    }

    #[test]
    fn toast_survives_until_deadline() {
        let mut state = AppState::new(at_second(0));
        let toast = Toast::new("msg".to_string(), at_second(0));
        let deadline = toast.expires_at;
        state.toasts.push(toast);
        handle_tick(&mut state, deadline - Duration::seconds(1));
        assert_eq!(state.toasts.len(), 1);
        handle_tick(&mut state, deadline);
        assert!(state.toasts.is_empty());
    }
}
