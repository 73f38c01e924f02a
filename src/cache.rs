//! Offline cache policy, consumed by the service-worker shell. The
//! worker classifies each outbound request here and applies the
//! returned strategy against the returned cache namespace; eviction
//! stays with the underlying cache storage.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::{AppError, ErrorKind};

pub const APP_SHELL_CACHE: &str = "citycare-app-shell-v1";
pub const GOOGLE_FONTS_CACHE: &str = "google-fonts";
pub const ICON_CDN_CACHE: &str = "fontawesome";
pub const AVATAR_CACHE: &str = "avatars-api";
pub const API_CACHE: &str = "stories-api";
pub const API_IMAGE_CACHE: &str = "stories-api-images";
pub const MAP_TILE_CACHE: &str = "maptiler-api";

/// Entry point served for navigations while fully offline.
pub const NAVIGATION_FALLBACK: &str = "/index.html";

/// App shell assets cached at install time.
pub const PRECACHE_MANIFEST: &[&str] = &[
    "/",
    "/index.html",
    "/app.bundle.js",
    "/styles.css",
    "/favicon.png",
    "/manifest.json",
    "/images/icons/icon-192x192.png",
    "/images/icons/icon-512x512.png",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Destination {
    Document,
    Image,
    Script,
    Style,
    Font,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceClass {
    GoogleFonts,
    IconCdn,
    AvatarCdn,
    ApiJson,
    ApiImage,
    MapTiles,
    /// Everything unmatched goes straight to the network.
    Passthrough,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheStrategy {
    CacheFirst,
    NetworkFirst,
    StaleWhileRevalidate,
    NetworkOnly,
}

impl ResourceClass {
    #[must_use]
    pub const fn strategy(self) -> CacheStrategy {
        match self {
            Self::GoogleFonts | Self::IconCdn | Self::AvatarCdn | Self::MapTiles => {
                CacheStrategy::CacheFirst
            }
            Self::ApiJson => CacheStrategy::NetworkFirst,
            Self::ApiImage => CacheStrategy::StaleWhileRevalidate,
            Self::Passthrough => CacheStrategy::NetworkOnly,
        }
    }

    #[must_use]
    pub const fn cache_name(self) -> Option<&'static str> {
        match self {
            Self::GoogleFonts => Some(GOOGLE_FONTS_CACHE),
            Self::IconCdn => Some(ICON_CDN_CACHE),
            Self::AvatarCdn => Some(AVATAR_CACHE),
            Self::ApiJson => Some(API_CACHE),
            Self::ApiImage => Some(API_IMAGE_CACHE),
            Self::MapTiles => Some(MAP_TILE_CACHE),
            Self::Passthrough => None,
        }
    }

    /// Avatar assets arrive as opaque (status 0) cross-origin responses
    /// and are the only class allowed to cache them.
    #[must_use]
    pub const fn allows_opaque_responses(self) -> bool {
        matches!(self, Self::AvatarCdn)
    }
}

/// Classifies requests against the configured API origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchClassifier {
    api_origin: String,
}

impl FetchClassifier {
    pub fn new(api_base_url: &str) -> Result<Self, AppError> {
        let url = Url::parse(api_base_url).map_err(|e| {
            AppError::new(ErrorKind::Validation, format!("invalid API base URL: {e}"))
        })?;
        Ok(Self {
            api_origin: url.origin().ascii_serialization(),
        })
    }

    /// Total: every request maps to exactly one class; unparseable URLs
    /// fall through to the network untouched.
    #[must_use]
    pub fn classify(&self, request_url: &str, destination: Destination) -> ResourceClass {
        let Ok(url) = Url::parse(request_url) else {
            return ResourceClass::Passthrough;
        };
        let Some(host) = url.host_str() else {
            return ResourceClass::Passthrough;
        };

        if host == "fonts.googleapis.com" || host == "fonts.gstatic.com" {
            return ResourceClass::GoogleFonts;
        }

        if host == "cdnjs.cloudflare.com" || host.contains("fontawesome") {
            return ResourceClass::IconCdn;
        }

        if host.contains("avatars.githubusercontent") {
            return ResourceClass::AvatarCdn;
        }

        if url.origin().ascii_serialization() == self.api_origin {
            return if destination == Destination::Image {
                ResourceClass::ApiImage
            } else {
                ResourceClass::ApiJson
            };
        }

        if host.contains("maptiler") || host.ends_with("tile.openstreetmap.org") {
            return ResourceClass::MapTiles;
        }

        ResourceClass::Passthrough
    }
}

/// Offline fallback for a failed fetch: navigations get the cached app
/// shell entry point, everything else just fails.
#[must_use]
pub const fn offline_fallback(destination: Destination) -> Option<&'static str> {
    match destination {
        Destination::Document => Some(NAVIGATION_FALLBACK),
        _ => None,
    }
}
