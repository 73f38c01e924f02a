//! Remote report gateway: builds every outbound request and normalizes
//! every upstream response into [`ApiResult`] values. All functions are
//! pure; the app layer wires the requests to the http capability.
//!
//! `ok` is always derived from the envelope's `error` flag, never from
//! the HTTP status: an HTTP success carrying `error: true` is a failure,
//! and the reverse holds too.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::capabilities::{HttpError, HttpRequest, HttpResponse, HttpResult};
use crate::model::{LoginSession, Report, ReportId, Secret, StagedPhoto};
use crate::{ApiResult, AppError, ErrorKind};

pub const BASE_URL: &str = "https://story-api.dicoding.dev/v1";

pub const MIN_PASSWORD_LENGTH: usize = 8;
pub const REGISTER_VALIDATION_MESSAGE: &str =
    "Invalid registration data. Password must be at least 8 chars";
pub const UPLOAD_FAILED_MESSAGE: &str = "Gagal upload story.";
pub const UNKNOWN_REPORTER: &str = "Unknown";
pub const COMMENTS_UNAVAILABLE_MESSAGE: &str = "Comment feature not available";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    base: String,
}

impl Endpoints {
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self {
            base: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn join(&self, path: &str) -> String {
        format!("{}/{path}", self.base)
    }

    #[must_use]
    pub fn register(&self) -> String {
        self.join("register")
    }

    #[must_use]
    pub fn login(&self) -> String {
        self.join("login")
    }

    #[must_use]
    pub fn stories(&self) -> String {
        self.join("stories")
    }

    #[must_use]
    pub fn story_detail(&self, id: &ReportId) -> String {
        self.join(&format!("stories/{id}"))
    }

    #[must_use]
    pub fn notifications_subscribe(&self) -> String {
        self.join("notifications/subscribe")
    }

    #[must_use]
    pub fn notifications_send(&self) -> String {
        self.join("notifications/send")
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self::new(BASE_URL)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ListQuery {
    pub page: Option<u32>,
    pub size: Option<u32>,
    pub location: Option<bool>,
}

impl ListQuery {
    fn query_string(self) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        if let Some(page) = self.page {
            serializer.append_pair("page", &page.to_string());
        }
        if let Some(size) = self.size {
            serializer.append_pair("size", &size.to_string());
        }
        if let Some(location) = self.location {
            serializer.append_pair("location", if location { "1" } else { "0" });
        }
        serializer.finish()
    }
}

fn with_bearer(request: HttpRequest, token: Option<&str>) -> HttpRequest {
    match token {
        Some(token) => request.bearer(token),
        None => request,
    }
}

// --- Request builders ---

/// Validates locally before anything touches the network; a failure here
/// means zero requests were issued.
pub fn register_request(
    endpoints: &Endpoints,
    name: &str,
    email: &str,
    password: &str,
) -> Result<HttpRequest, AppError> {
    if name.is_empty() || email.is_empty() || password.len() < MIN_PASSWORD_LENGTH {
        return Err(AppError::new(
            ErrorKind::Validation,
            REGISTER_VALIDATION_MESSAGE,
        ));
    }

    let body = serde_json::json!({
        "name": name,
        "email": email,
        "password": password,
    })
    .to_string()
    .into_bytes();

    Ok(HttpRequest::post(endpoints.register())
        .header("Content-Type", "application/json")
        .body(body))
}

#[must_use]
pub fn login_request(endpoints: &Endpoints, email: &str, password: &str) -> HttpRequest {
    let body = serde_json::json!({
        "email": email,
        "password": password,
    })
    .to_string()
    .into_bytes();

    HttpRequest::post(endpoints.login())
        .header("Content-Type", "application/json")
        .body(body)
}

#[must_use]
pub fn list_reports_request(
    endpoints: &Endpoints,
    token: Option<&str>,
    query: ListQuery,
) -> HttpRequest {
    let query_string = query.query_string();
    let url = if query_string.is_empty() {
        endpoints.stories()
    } else {
        format!("{}?{query_string}", endpoints.stories())
    };
    with_bearer(HttpRequest::get(url), token)
}

#[must_use]
pub fn report_detail_request(
    endpoints: &Endpoints,
    token: Option<&str>,
    id: &ReportId,
) -> HttpRequest {
    with_bearer(HttpRequest::get(endpoints.story_detail(id)), token)
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewReportPayload {
    pub description: String,
    pub photo: StagedPhoto,
    pub latitude: f64,
    pub longitude: f64,
}

#[must_use]
pub fn multipart_boundary() -> String {
    format!("----CityCareBoundary{}", Uuid::new_v4().simple())
}

/// Forwards the payload verbatim; photo/description presence is the
/// submission orchestrator's contract, not re-validated here.
#[must_use]
pub fn create_report_request(
    endpoints: &Endpoints,
    token: Option<&str>,
    payload: &NewReportPayload,
    boundary: &str,
) -> HttpRequest {
    with_bearer(HttpRequest::post(endpoints.stories()), token)
        .header(
            "Content-Type",
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(encode_multipart(boundary, payload))
}

#[must_use]
pub fn encode_multipart(boundary: &str, payload: &NewReportPayload) -> Vec<u8> {
    let mut body = Vec::with_capacity(payload.photo.data.len() + 512);

    push_text_part(&mut body, boundary, "description", &payload.description);

    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"photo\"; \
             filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
            photo_filename(&payload.photo.mime_type),
            payload.photo.mime_type
        )
        .as_bytes(),
    );
    body.extend_from_slice(&payload.photo.data);
    body.extend_from_slice(b"\r\n");

    push_text_part(&mut body, boundary, "lat", &payload.latitude.to_string());
    push_text_part(&mut body, boundary, "lon", &payload.longitude.to_string());

    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    body
}

fn push_text_part(body: &mut Vec<u8>, boundary: &str, name: &str, value: &str) {
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
        )
        .as_bytes(),
    );
}

fn photo_filename(mime_type: &str) -> String {
    let extension = match mime_type {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/webp" => "webp",
        _ => "bin",
    };
    format!("photo.{extension}")
}

#[must_use]
pub fn subscribe_push_request(
    endpoints: &Endpoints,
    token: Option<&str>,
    subscription: &crate::push::PushSubscription,
) -> HttpRequest {
    let body = serde_json::json!({
        "endpoint": subscription.endpoint,
        "keys": {
            "p256dh": subscription.keys.p256dh,
            "auth": subscription.keys.auth,
        },
    })
    .to_string()
    .into_bytes();

    with_bearer(HttpRequest::post(endpoints.notifications_subscribe()), token)
        .header("Content-Type", "application/json")
        .body(body)
}

/// Deregistration reuses the subscribe route with a DELETE verb; that is
/// the server's contract for this endpoint.
#[must_use]
pub fn unsubscribe_push_request(
    endpoints: &Endpoints,
    token: Option<&str>,
    endpoint: &str,
) -> HttpRequest {
    let body = serde_json::json!({ "endpoint": endpoint }).to_string().into_bytes();

    with_bearer(HttpRequest::delete(endpoints.notifications_subscribe()), token)
        .header("Content-Type", "application/json")
        .body(body)
}

#[must_use]
pub fn notify_report_request(
    endpoints: &Endpoints,
    token: &str,
    report_id: Option<&ReportId>,
) -> HttpRequest {
    let body = match report_id {
        Some(id) => serde_json::json!({ "reportId": id.as_str() }),
        None => serde_json::json!({}),
    }
    .to_string()
    .into_bytes();

    HttpRequest::post(endpoints.notifications_send())
        .header("Content-Type", "application/json")
        .bearer(token)
        .body(body)
}

// --- Comment endpoints: permanently stubbed, zero network ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportComment {
    pub id: String,
    pub body: String,
    pub reporter_name: String,
}

#[must_use]
pub fn comments_for_report(_report_id: &ReportId) -> ApiResult<Vec<ReportComment>> {
    ApiResult::success_with_message(Vec::new(), COMMENTS_UNAVAILABLE_MESSAGE)
}

#[must_use]
pub fn submit_comment(_report_id: &ReportId, _body: &str) -> ApiResult<ReportComment> {
    ApiResult::failure(ErrorKind::FeatureUnavailable, COMMENTS_UNAVAILABLE_MESSAGE)
}

// --- Response normalization ---

/// Upstream record shape for a single story; every field is defaulted so
/// partial records normalize instead of failing the whole response.
#[derive(Debug, Clone, Deserialize)]
struct StoryRecord {
    #[serde(default)]
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: String,
    #[serde(default, rename = "photoUrl")]
    photo_url: Option<String>,
    #[serde(default, rename = "createdAt")]
    created_at: String,
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default)]
    lon: Option<f64>,
}

impl StoryRecord {
    fn into_report(self) -> Report {
        Report {
            id: ReportId::new(self.id),
            title: self.description.clone(),
            description: self.description,
            evidence_images: self.photo_url.into_iter().collect(),
            latitude: self.lat,
            longitude: self.lon,
            created_at: self.created_at,
            reporter_name: self
                .name
                .unwrap_or_else(|| UNKNOWN_REPORTER.to_string()),
        }
    }
}

fn transport_failure(error: HttpError) -> (ErrorKind, String) {
    match error {
        HttpError::Timeout => (
            ErrorKind::NetworkTimeout,
            AppError::new(ErrorKind::NetworkTimeout, "timeout").user_facing_message(),
        ),
        HttpError::Network { message } => (ErrorKind::Network, message),
        HttpError::Other { message } => (ErrorKind::Network, message),
    }
}

fn envelope_value(response: &HttpResponse) -> Result<Value, AppError> {
    match serde_json::from_slice::<Value>(&response.body) {
        Ok(value) => Ok(value),
        Err(e) if response.is_success() => Err(AppError::new(
            ErrorKind::MalformedResponse,
            format!("unparseable response body: {e}"),
        )),
        Err(_) => Err(AppError::new(
            ErrorKind::Upstream,
            format!("HTTP error: {}", response.status),
        )),
    }
}

fn envelope_message(value: &Value) -> String {
    value
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn envelope_error(value: &Value) -> Option<String> {
    let is_error = value.get("error").and_then(Value::as_bool).unwrap_or(false);
    is_error.then(|| envelope_message(value))
}

fn non_empty(message: String) -> Option<String> {
    if message.is_empty() {
        None
    } else {
        Some(message)
    }
}

pub fn parse_list_response(result: HttpResult) -> ApiResult<Vec<Report>> {
    let response = match result {
        Ok(response) => response,
        Err(error) => {
            let (kind, message) = transport_failure(error);
            return ApiResult::failure(kind, message);
        }
    };

    let value = match envelope_value(&response) {
        Ok(value) => value,
        Err(error) => return error.into(),
    };

    if let Some(message) = envelope_error(&value) {
        return ApiResult::failure(ErrorKind::Upstream, message);
    }

    let Some(list) = value.get("listStory").and_then(Value::as_array) else {
        tracing::warn!("listStory is missing or not an array");
        return ApiResult::failure(ErrorKind::MalformedResponse, "Invalid data format received");
    };

    let reports = list
        .iter()
        .filter_map(|item| match serde_json::from_value::<StoryRecord>(item.clone()) {
            Ok(record) => Some(record.into_report()),
            Err(e) => {
                tracing::warn!(error = %e, "skipping malformed report record");
                None
            }
        })
        .collect();

    ApiResult::Success {
        data: reports,
        message: non_empty(envelope_message(&value)),
    }
}

pub fn parse_detail_response(result: HttpResult) -> ApiResult<Report> {
    let response = match result {
        Ok(response) => response,
        Err(error) => {
            let (kind, message) = transport_failure(error);
            return ApiResult::failure(kind, message);
        }
    };

    let value = match envelope_value(&response) {
        Ok(value) => value,
        Err(error) => return error.into(),
    };

    if let Some(message) = envelope_error(&value) {
        return ApiResult::failure(ErrorKind::Upstream, message);
    }

    let Some(story) = value.get("story") else {
        let message =
            non_empty(envelope_message(&value)).unwrap_or_else(|| "Invalid data format received".into());
        return ApiResult::failure(ErrorKind::MalformedResponse, message);
    };

    match serde_json::from_value::<StoryRecord>(story.clone()) {
        Ok(record) => ApiResult::Success {
            data: record.into_report(),
            message: non_empty(envelope_message(&value)),
        },
        Err(e) => {
            ApiResult::failure(ErrorKind::MalformedResponse, format!("malformed story: {e}"))
        }
    }
}

pub fn parse_login_response(result: HttpResult) -> ApiResult<LoginSession> {
    let response = match result {
        Ok(response) => response,
        Err(error) => {
            let (kind, message) = transport_failure(error);
            return ApiResult::failure(kind, message);
        }
    };

    let value = match envelope_value(&response) {
        Ok(value) => value,
        Err(error) => return error.into(),
    };

    if let Some(message) = envelope_error(&value) {
        return ApiResult::failure(ErrorKind::Upstream, message);
    }

    #[derive(Deserialize)]
    struct LoginResult {
        #[serde(default)]
        token: String,
        #[serde(default, rename = "userId")]
        user_id: String,
        #[serde(default)]
        name: String,
    }

    let Some(login) = value.get("loginResult") else {
        return ApiResult::failure(ErrorKind::MalformedResponse, "missing loginResult");
    };

    match serde_json::from_value::<LoginResult>(login.clone()) {
        Ok(login) => ApiResult::Success {
            data: LoginSession {
                token: Secret::new(login.token),
                user_id: login.user_id,
                name: login.name,
            },
            message: non_empty(envelope_message(&value)),
        },
        Err(e) => ApiResult::failure(
            ErrorKind::MalformedResponse,
            format!("malformed loginResult: {e}"),
        ),
    }
}

/// For operations whose payload is just the envelope: register, create
/// report, subscribe/unsubscribe, notification send.
pub fn parse_envelope_response(result: HttpResult) -> ApiResult<()> {
    let response = match result {
        Ok(response) => response,
        Err(error) => {
            let (kind, message) = transport_failure(error);
            return ApiResult::failure(kind, message);
        }
    };

    let value = match envelope_value(&response) {
        Ok(value) => value,
        Err(error) => return error.into(),
    };

    if let Some(message) = envelope_error(&value) {
        return ApiResult::failure(ErrorKind::Upstream, message);
    }

    ApiResult::Success {
        data: (),
        message: non_empty(envelope_message(&value)),
    }
}
