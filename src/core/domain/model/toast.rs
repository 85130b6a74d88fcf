//! Transient, auto-dismissing notifications.

use chrono::{DateTime, Duration, Utc};

/// How long a toast stays visible.
pub const TOAST_LIFETIME_SECONDS: i64 = 10;

/// One transient message with its expiry deadline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Toast {
    pub fn new(message: String, created_at: DateTime<Utc>) -> Self {
        let expires_at = created_at + Duration::seconds(TOAST_LIFETIME_SECONDS);
        Self {
            message,
            created_at,
            expires_at,
        }
    }

    /// A toast expires exactly at its deadline, not after it.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Drops every toast whose deadline has passed, preserving order.
pub fn prune_toasts(toasts: &mut Vec<Toast>, now: DateTime<Utc>) {
    toasts.retain(|t| !t.is_expired(now));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn toast_present_strictly_before_deadline_absent_at_it() {
        let t0 = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let toast = Toast::new("hello".to_string(), t0);
        let just_before = toast.expires_at - Duration::milliseconds(1);
        assert!(!toast.is_expired(just_before));
        assert!(toast.is_expired(toast.expires_at));
        assert!(toast.is_expired(toast.expires_at + Duration::seconds(1)));
    }

    #[test]
    fn prune_keeps_order_of_survivors() {
        let t0 = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let mut toasts = vec![
            Toast::new("old".to_string(), t0),
            Toast::new("newer".to_string(), t0 + Duration::seconds(5)),
            Toast::new("newest".to_string(), t0 + Duration::seconds(8)),
        ];
        prune_toasts(&mut toasts, t0 + Duration::seconds(12));
        let messages: Vec<_> = toasts.iter().map(|t| t.message.as_str()).collect();
        assert_eq!(messages, vec!["newer", "newest"]);
    }
}
