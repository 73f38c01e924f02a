use serde::{Deserialize, Serialize};

use crate::capabilities::{HttpResult, KvResult, PushResult};
use crate::model::{ReportId, Secret};

/// Everything that can happen to the core: commands from the UI binding
/// layer and capability results coming back from the shell. Capability
/// payloads are boxed to keep the enum small.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    // Session mirror of the external token provider. The shell pushes
    // the current token in; `None` means logged out.
    SessionTokenChanged {
        token: Option<Secret>,
        user_id: Option<String>,
        name: Option<String>,
    },

    // Auth
    RegisterRequested {
        name: String,
        email: String,
        password: Secret,
    },
    LoginRequested {
        email: String,
        password: Secret,
    },

    // Home view: report list plus map
    ListViewEntered,
    MapClicked {
        lat: f64,
        lon: f64,
    },

    // Detail view
    DetailViewEntered {
        id: ReportId,
    },
    SaveBookmarkRequested,
    RemoveBookmarkRequested {
        id: ReportId,
    },

    // Bookmark view
    BookmarkViewEntered,

    // Submission view
    NewViewEntered,
    PhotoStaged {
        #[serde(with = "serde_bytes")]
        data: Vec<u8>,
        mime_type: String,
    },
    PhotoDiscarded,
    SubmitRequested {
        description: String,
        latitude: f64,
        longitude: f64,
    },

    // Push channel (UI side)
    PushStatusRequested,
    PushSubscribeRequested,
    PushUnsubscribeRequested,

    // Capability results
    RegisterResponse(Box<HttpResult>),
    LoginResponse(Box<HttpResult>),
    ListResponse(Box<HttpResult>),
    DetailResponse(Box<HttpResult>),
    CreateReportResponse(Box<HttpResult>),
    BroadcastResponse(Box<HttpResult>),
    SubscribeServerResponse(Box<HttpResult>),
    UnsubscribeServerResponse(Box<HttpResult>),
    PlatformSubscriptionFetched(Box<PushResult>),
    PlatformSubscribed(Box<PushResult>),
    PlatformUnsubscribed(Box<PushResult>),
    BookmarkProbed(Box<KvResult>),
    BookmarkWritten(Box<KvResult>),
    BookmarkRemoved {
        id: ReportId,
        result: Box<KvResult>,
    },
    BookmarksListed(Box<KvResult>),
}
