//! Push notification channel. The UI context drives the subscription
//! lifecycle through the app; the service-worker context calls the pure
//! functions here directly — it shares no memory with the UI context,
//! so nothing in this module touches the model or capabilities.

use serde::{Deserialize, Serialize};

/// Application server key the platform needs when creating a
/// subscription; overridable through [`crate::model::Config`].
pub const DEFAULT_VAPID_PUBLIC_KEY: &str =
    "BCCs2eonMI-6H2ctvFaWg-UYdDv387Vno_bj7eMVBqB66E2-ksG2uUoz5oFDflmOMu7tO_gH2EO6U3qc1W6CQdBd";

pub const DEFAULT_NOTIFICATION_TITLE: &str = "Notifikasi Baru";
pub const DEFAULT_NOTIFICATION_BODY: &str = "Anda memiliki notifikasi baru";
pub const DEFAULT_REDIRECT_URL: &str = "/";
pub const NOTIFICATION_ICON: &str = "/images/icons/icon-192x192.png";

/// Browser-issued subscription descriptor. The application never
/// persists this; it only mirrors it to the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushSubscription {
    pub endpoint: String,
    pub keys: SubscriptionKeys,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionKeys {
    pub p256dh: String,
    pub auth: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PushStatus {
    /// Platform subscription not checked yet.
    #[default]
    Unknown,
    Unsubscribed,
    Subscribed,
}

/// Wire shape of an inbound push payload; every field is optional and
/// independently defaulted.
#[derive(Debug, Clone, Default, Deserialize)]
struct PushMessage {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

/// What the service worker shows for one inbound push.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationContent {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    /// Navigation target for a click on the notification.
    pub url: String,
}

impl NotificationContent {
    /// Defensive parse: an absent or malformed payload degrades to the
    /// default notification instead of failing the push event.
    #[must_use]
    pub fn from_payload(payload: Option<&[u8]>) -> Self {
        let message = payload
            .map(|bytes| match serde_json::from_slice::<PushMessage>(bytes) {
                Ok(message) => message,
                Err(e) => {
                    tracing::warn!(error = %e, "malformed push payload, using defaults");
                    PushMessage::default()
                }
            })
            .unwrap_or_default();

        Self {
            title: message
                .title
                .unwrap_or_else(|| DEFAULT_NOTIFICATION_TITLE.to_string()),
            body: message
                .body
                .unwrap_or_else(|| DEFAULT_NOTIFICATION_BODY.to_string()),
            icon: NOTIFICATION_ICON.to_string(),
            badge: NOTIFICATION_ICON.to_string(),
            url: message
                .url
                .unwrap_or_else(|| DEFAULT_REDIRECT_URL.to_string()),
        }
    }
}

/// An open window as the service worker sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowClient {
    pub id: String,
    pub url: String,
}

/// Exactly one of these happens per notification click.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ClickAction {
    Focus { id: String },
    Open { url: String },
}

/// Focus the first window already showing the target, otherwise open a
/// new one at it.
#[must_use]
pub fn resolve_click(target_url: &str, windows: &[WindowClient]) -> ClickAction {
    windows
        .iter()
        .find(|client| client.url.contains(target_url))
        .map_or_else(
            || ClickAction::Open {
                url: target_url.to_string(),
            },
            |client| ClickAction::Focus {
                id: client.id.clone(),
            },
        )
}
