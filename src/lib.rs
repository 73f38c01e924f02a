//! Portable application core for CityCare, a citizen damage-reporting
//! client. The core owns the report pipeline (fetch, normalize, render
//! state, bookmark, notify) and is driven by its shells through events;
//! every side effect goes out through a serializable capability
//! operation and comes back as an event.

#![forbid(unsafe_code)]
#![allow(clippy::module_name_repetitions)]

pub mod app;
pub mod bookmarks;
pub mod cache;
pub mod capabilities;
pub mod event;
pub mod gateway;
pub mod map;
pub mod model;
pub mod push;

use serde::{Deserialize, Serialize};

pub use app::{App, ViewModel};
pub use capabilities::{Capabilities, Effect};
pub use event::Event;
pub use model::{Model, Report, ReportId};

/// Budget for every network call; the shell aborts the request when it
/// is exceeded and reports [`capabilities::HttpError::Timeout`].
pub const DEFAULT_TIMEOUT_MS: u64 = 15_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Local precondition failure; no network was attempted.
    Validation,
    /// The request exceeded its timeout budget and was cancelled.
    NetworkTimeout,
    /// Transport failure other than a timeout.
    Network,
    /// The server answered with its embedded error flag set.
    Upstream,
    /// The response had an unexpected shape; degraded, not thrown.
    MalformedResponse,
    /// Local persistence is unavailable.
    Storage,
    /// Permanently stubbed functionality.
    FeatureUnavailable,
}

impl ErrorKind {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Validation => "VALIDATION_ERROR",
            Self::NetworkTimeout => "NETWORK_TIMEOUT",
            Self::Network => "NETWORK_ERROR",
            Self::Upstream => "UPSTREAM_ERROR",
            Self::MalformedResponse => "MALFORMED_RESPONSE",
            Self::Storage => "STORAGE_ERROR",
            Self::FeatureUnavailable => "FEATURE_UNAVAILABLE",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppError {
    pub kind: ErrorKind,
    pub message: String,
}

impl AppError {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.kind.code()
    }

    #[must_use]
    pub fn user_facing_message(&self) -> String {
        match self.kind {
            ErrorKind::Validation | ErrorKind::Upstream | ErrorKind::FeatureUnavailable => {
                self.message.clone()
            }
            ErrorKind::NetworkTimeout => "The request timed out. Please try again.".into(),
            ErrorKind::Network => {
                "Unable to connect. Please check your internet connection and try again.".into()
            }
            ErrorKind::MalformedResponse => {
                "Received an unexpected response from the server.".into()
            }
            ErrorKind::Storage => {
                "Unable to access local storage. Please free up some storage space.".into()
            }
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code(), self.message)
    }
}

impl std::error::Error for AppError {}

/// Uniform outcome of every gateway and store operation. Expected
/// failures travel in [`ApiResult::Failure`]; nothing crosses the
/// public boundary as a panic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ApiResult<T> {
    Success {
        data: T,
        #[serde(default)]
        message: Option<String>,
    },
    Failure {
        kind: ErrorKind,
        message: String,
    },
}

impl<T> ApiResult<T> {
    #[must_use]
    pub fn success(data: T) -> Self {
        Self::Success {
            data,
            message: None,
        }
    }

    #[must_use]
    pub fn success_with_message(data: T, message: impl Into<String>) -> Self {
        Self::Success {
            data,
            message: Some(message.into()),
        }
    }

    #[must_use]
    pub fn failure(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::Failure {
            kind,
            message: message.into(),
        }
    }

    #[must_use]
    pub const fn ok(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Success { message, .. } => message.as_deref(),
            Self::Failure { message, .. } => Some(message.as_str()),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ApiResult<U> {
        match self {
            Self::Success { data, message } => ApiResult::Success {
                data: f(data),
                message,
            },
            Self::Failure { kind, message } => ApiResult::Failure { kind, message },
        }
    }
}

impl<T: Default> ApiResult<T> {
    /// Payload on success, the type's empty value on failure. Keeps the
    /// "failed list is an empty list" degradation without untyped nulls.
    #[must_use]
    pub fn data_or_default(self) -> T {
        match self {
            Self::Success { data, .. } => data,
            Self::Failure { .. } => T::default(),
        }
    }
}

impl<T> From<AppError> for ApiResult<T> {
    fn from(error: AppError) -> Self {
        Self::Failure {
            kind: error.kind,
            message: error.message,
        }
    }
}
