use std::fmt;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use zeroize::Zeroize;

use crate::push::{PushStatus, PushSubscription};

/// Secret wrapper for tokens and passwords travelling through events
/// and view state: Debug output is redacted, memory is zeroized on drop.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl Drop for Secret {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReportId(pub String);

impl ReportId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    #[must_use]
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Canonical report shape every upstream record is normalized into.
///
/// `title` is derived from `description` because the upstream API has
/// no separate title field; both are kept so the views that read each
/// keep working if the API ever grows one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub id: ReportId,
    pub title: String,
    pub description: String,
    pub evidence_images: Vec<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub created_at: String,
    pub reporter_name: String,
}

impl Report {
    /// A report is located iff both coordinates are present. `0.0` is a
    /// valid coordinate; only absence disqualifies.
    #[must_use]
    pub fn located(&self) -> Option<LatLon> {
        Some(LatLon::new(self.latitude?, self.longitude?))
    }

    #[must_use]
    pub fn is_located(&self) -> bool {
        self.located().is_some()
    }
}

/// Render lifecycle of one screen region. Re-entrant: any reload puts
/// the region back into `Loading`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum RegionState<T> {
    #[default]
    Idle,
    Loading,
    Populated(T),
    Empty,
    Error(String),
}

impl<T> RegionState<T> {
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    #[must_use]
    pub const fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    #[must_use]
    pub fn populated(&self) -> Option<&T> {
        match self {
            Self::Populated(value) => Some(value),
            _ => None,
        }
    }
}

/// Session mirror of the external token provider. The shell pushes
/// token changes in; the core only ever reads them.
#[derive(Default)]
pub struct Session {
    pub token: Option<SecretString>,
    pub user_id: Option<String>,
    pub name: Option<String>,
}

impl Session {
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginSession {
    pub token: Secret,
    pub user_id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AuthState {
    #[default]
    Idle,
    InFlight,
    LoggedIn(LoginSession),
    Failed {
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RegisterState {
    #[default]
    Idle,
    InFlight,
    Succeeded {
        message: String,
    },
    Failed {
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SubmitState {
    #[default]
    Idle,
    InFlight,
    Succeeded {
        message: String,
    },
    Failed {
        message: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BookmarkAffordance {
    #[default]
    Save,
    Remove,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BookmarkFeedback {
    Saved { message: String },
    Removed { message: String },
    Failed { message: String },
}

/// Photo staged for submission. The buffer has capacity one: staging a
/// new photo replaces the previous one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedPhoto {
    pub id: String,
    #[serde(with = "serde_bytes")]
    pub data: Vec<u8>,
    pub mime_type: String,
}

impl StagedPhoto {
    #[must_use]
    pub fn new(data: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            data,
            mime_type: mime_type.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub base_url: String,
    pub vapid_public_key: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: crate::gateway::BASE_URL.to_string(),
            vapid_public_key: crate::push::DEFAULT_VAPID_PUBLIC_KEY.to_string(),
        }
    }
}

#[derive(Default)]
pub struct PushChannelState {
    pub status: PushStatus,
    pub subscription: Option<PushSubscription>,
    pub in_flight: bool,
    pub feedback: Option<String>,
}

/// All mutable state the core owns. Per-view fields are reset when the
/// owning view is entered and discarded on navigation away.
#[derive(Default)]
pub struct Model {
    pub config: Config,
    pub session: Session,

    pub auth: AuthState,
    pub register: RegisterState,

    // Home (list) view
    pub list: RegionState<Vec<Report>>,
    pub map: RegionState<Vec<crate::map::MapPin>>,

    // Candidate coordinate from the last map click. Inert in the list
    // view; the submission view reads it into its location inputs.
    pub selected_location: Option<LatLon>,

    // Detail view
    pub detail: RegionState<Report>,
    pub detail_id: Option<ReportId>,
    pub bookmark_affordance: BookmarkAffordance,
    pub bookmark_feedback: Option<BookmarkFeedback>,

    // Bookmark view
    pub bookmarks: RegionState<Vec<Report>>,

    // Submission view
    pub staged_photo: Option<StagedPhoto>,
    pub submit: SubmitState,

    pub push: PushChannelState,
}

impl Model {
    #[must_use]
    pub fn access_token(&self) -> Option<String> {
        use secrecy::ExposeSecret;
        self.session
            .token
            .as_ref()
            .map(|token| token.expose_secret().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(lat: Option<f64>, lon: Option<f64>) -> Report {
        Report {
            id: ReportId::new("r-1"),
            title: "Jalan berlubang".into(),
            description: "Jalan berlubang".into(),
            evidence_images: vec![],
            latitude: lat,
            longitude: lon,
            created_at: "2024-01-01T00:00:00Z".into(),
            reporter_name: "Unknown".into(),
        }
    }

    #[test]
    fn located_requires_both_coordinates() {
        assert!(report(Some(-6.2), Some(106.8)).is_located());
        assert!(!report(Some(-6.2), None).is_located());
        assert!(!report(None, Some(106.8)).is_located());
        assert!(!report(None, None).is_located());
    }

    #[test]
    fn zero_is_a_valid_coordinate() {
        assert!(report(Some(0.0), Some(0.0)).is_located());
    }

    #[test]
    fn secret_debug_is_redacted() {
        let secret = Secret::new("jwt-token");
        assert_eq!(format!("{secret:?}"), "[REDACTED]");
        assert_eq!(secret.expose(), "jwt-token");
    }

    #[test]
    fn region_state_defaults_to_idle() {
        let state: RegionState<Vec<Report>> = RegionState::default();
        assert!(state.is_idle());
    }

    #[test]
    fn staged_photo_ids_are_unique() {
        let a = StagedPhoto::new(vec![1], "image/png");
        let b = StagedPhoto::new(vec![1], "image/png");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn session_authentication_follows_token_presence() {
        let mut session = Session::default();
        assert!(!session.is_authenticated());
        session.token = Some(SecretString::new("token".into()));
        assert!(session.is_authenticated());
    }
}
