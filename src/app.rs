//! The CityCare app core: list/detail, submission, bookmark, and push
//! orchestrators behind one Elm-style update loop. Every flow is a
//! plain event in, state change plus capability requests out; the view
//! model is a pure function of the model.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::bookmarks;
use crate::capabilities::{Capabilities, KvOutput, PushOutput};
use crate::event::Event;
use crate::gateway::{self, Endpoints, ListQuery, NewReportPayload, UPLOAD_FAILED_MESSAGE};
use crate::map::{self, MapPin};
use crate::model::{
    AuthState, BookmarkAffordance, BookmarkFeedback, LatLon, Model, RegionState, RegisterState,
    Report, Session, StagedPhoto, SubmitState,
};
use crate::push::PushStatus;
use crate::{ApiResult, AppError, ErrorKind};

pub const SUBMIT_SUCCESS_MESSAGE: &str = "Story berhasil diunggah!";
pub const REGISTER_SUCCESS_MESSAGE: &str = "Registration successful";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapViewModel {
    pub state: RegionState<Vec<MapPin>>,
    pub center: LatLon,
    pub zoom: f64,
    pub tile_url_template: String,
    pub attribution: String,
}

/// Photo metadata for the view; the bytes stay in the model until
/// submission builds the multipart body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedPhotoView {
    pub id: String,
    pub mime_type: String,
    pub size_bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushViewModel {
    pub status: PushStatus,
    pub in_flight: bool,
    pub feedback: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewModel {
    pub is_authenticated: bool,
    pub auth: AuthState,
    pub register: RegisterState,
    pub list: RegionState<Vec<Report>>,
    pub map: MapViewModel,
    pub selected_location: Option<LatLon>,
    pub detail: RegionState<Report>,
    pub bookmark_affordance: BookmarkAffordance,
    pub bookmark_feedback: Option<BookmarkFeedback>,
    pub bookmarks: RegionState<Vec<Report>>,
    pub staged_photo: Option<StagedPhotoView>,
    pub submit: SubmitState,
    pub push: PushViewModel,
}

#[derive(Default)]
pub struct App;

impl App {
    fn endpoints(model: &Model) -> Endpoints {
        Endpoints::new(&model.config.base_url)
    }

    fn storage_failure(error: crate::capabilities::KvError) -> BookmarkFeedback {
        BookmarkFeedback::Failed {
            message: bookmarks::storage_error(error).user_facing_message(),
        }
    }
}

impl crux_core::App for App {
    type Event = Event;
    type Model = Model;
    type ViewModel = ViewModel;
    type Capabilities = Capabilities;

    #[allow(clippy::too_many_lines)]
    fn update(&self, event: Event, model: &mut Model, caps: &Capabilities) {
        match event {
            // --- Session mirror ---
            Event::SessionTokenChanged {
                token,
                user_id,
                name,
            } => {
                model.session = Session {
                    token: token.map(|secret| SecretString::new(secret.expose().to_owned())),
                    user_id,
                    name,
                };
                caps.render.render();
            }

            // --- Auth ---
            Event::RegisterRequested {
                name,
                email,
                password,
            } => {
                let endpoints = Self::endpoints(model);
                match gateway::register_request(&endpoints, &name, &email, password.expose()) {
                    Ok(request) => {
                        model.register = RegisterState::InFlight;
                        caps.http
                            .send(request, |result| Event::RegisterResponse(Box::new(result)));
                    }
                    // Fails fast: no request was issued.
                    Err(error) => {
                        model.register = RegisterState::Failed {
                            message: error.user_facing_message(),
                        };
                    }
                }
                caps.render.render();
            }

            Event::RegisterResponse(result) => {
                model.register = match gateway::parse_envelope_response(*result) {
                    ApiResult::Success { message, .. } => RegisterState::Succeeded {
                        message: message.unwrap_or_else(|| REGISTER_SUCCESS_MESSAGE.to_string()),
                    },
                    ApiResult::Failure { message, .. } => RegisterState::Failed { message },
                };
                caps.render.render();
            }

            Event::LoginRequested { email, password } => {
                model.auth = AuthState::InFlight;
                caps.render.render();

                let request =
                    gateway::login_request(&Self::endpoints(model), &email, password.expose());
                caps.http
                    .send(request, |result| Event::LoginResponse(Box::new(result)));
            }

            Event::LoginResponse(result) => {
                model.auth = match gateway::parse_login_response(*result) {
                    ApiResult::Success { data, .. } => AuthState::LoggedIn(data),
                    ApiResult::Failure { message, .. } => AuthState::Failed { message },
                };
                caps.render.render();
            }

            // --- Home view: list plus map ---
            Event::ListViewEntered => {
                model.list = RegionState::Loading;
                model.map = RegionState::Loading;
                model.selected_location = None;
                caps.render.render();

                let request = gateway::list_reports_request(
                    &Self::endpoints(model),
                    model.access_token().as_deref(),
                    ListQuery::default(),
                );
                caps.http
                    .send(request, |result| Event::ListResponse(Box::new(result)));
            }

            // Responses are applied as they resolve; rapid reloads are
            // not sequenced, last one wins.
            Event::ListResponse(result) => {
                match gateway::parse_list_response(*result) {
                    ApiResult::Success { data, .. } => {
                        model.map = RegionState::Populated(map::pins_for_reports(&data));
                        model.list = if data.is_empty() {
                            RegionState::Empty
                        } else {
                            RegionState::Populated(data)
                        };
                    }
                    ApiResult::Failure { kind, message } => {
                        tracing::warn!(code = kind.code(), %message, "report list failed");
                        model.list = RegionState::Error(message.clone());
                        model.map = RegionState::Error(message);
                    }
                }
                caps.render.render();
            }

            Event::MapClicked { lat, lon } => {
                // Transient marker plus candidate coordinate. Inert on
                // the list view; the submission view reads it.
                model.selected_location = Some(LatLon::new(lat, lon));
                caps.render.render();
            }

            // --- Detail view ---
            Event::DetailViewEntered { id } => {
                model.detail = RegionState::Loading;
                model.detail_id = Some(id.clone());
                model.bookmark_affordance = BookmarkAffordance::Save;
                model.bookmark_feedback = None;
                caps.render.render();

                let request = gateway::report_detail_request(
                    &Self::endpoints(model),
                    model.access_token().as_deref(),
                    &id,
                );
                caps.http
                    .send(request, |result| Event::DetailResponse(Box::new(result)));

                // Probe runs alongside the fetch; its failure must not
                // block detail rendering.
                match bookmarks::get_op(&id) {
                    Ok(op) => caps
                        .kv
                        .run(op, |result| Event::BookmarkProbed(Box::new(result))),
                    Err(error) => tracing::warn!(%error, "bookmark probe skipped"),
                }
            }

            Event::DetailResponse(result) => {
                model.detail = match gateway::parse_detail_response(*result) {
                    ApiResult::Success { data, .. } => RegionState::Populated(data),
                    ApiResult::Failure { message, .. } => RegionState::Error(message),
                };
                caps.render.render();
            }

            Event::BookmarkProbed(result) => {
                model.bookmark_affordance = match *result {
                    Ok(KvOutput::Value(Some(_))) => BookmarkAffordance::Remove,
                    Ok(_) => BookmarkAffordance::Save,
                    Err(error) => {
                        tracing::warn!(%error, "bookmark probe failed");
                        BookmarkAffordance::Save
                    }
                };
                caps.render.render();
            }

            Event::SaveBookmarkRequested => {
                let Some(report) = model.detail.populated().cloned() else {
                    tracing::warn!("bookmark save requested with no report loaded");
                    return;
                };

                match bookmarks::put_op(&report) {
                    Ok(op) => caps
                        .kv
                        .run(op, |result| Event::BookmarkWritten(Box::new(result))),
                    Err(error) => {
                        model.bookmark_feedback = Some(BookmarkFeedback::Failed {
                            message: error.user_facing_message(),
                        });
                        caps.render.render();
                    }
                }
            }

            Event::BookmarkWritten(result) => {
                match *result {
                    Ok(_) => {
                        model.bookmark_affordance = BookmarkAffordance::Remove;
                        model.bookmark_feedback = Some(BookmarkFeedback::Saved {
                            message: bookmarks::SAVED_MESSAGE.to_string(),
                        });
                    }
                    Err(error) => {
                        model.bookmark_feedback = Some(Self::storage_failure(error));
                    }
                }
                caps.render.render();
            }

            Event::RemoveBookmarkRequested { id } => match bookmarks::remove_op(&id) {
                Ok(op) => {
                    caps.kv.run(op, move |result| Event::BookmarkRemoved {
                        id,
                        result: Box::new(result),
                    });
                }
                Err(error) => {
                    model.bookmark_feedback = Some(BookmarkFeedback::Failed {
                        message: error.user_facing_message(),
                    });
                    caps.render.render();
                }
            },

            Event::BookmarkRemoved { id, result } => {
                match *result {
                    // Removing an absent id lands here too; it is a
                    // no-op, not an error.
                    Ok(_) => {
                        if model.detail_id.as_ref() == Some(&id) {
                            model.bookmark_affordance = BookmarkAffordance::Save;
                            model.bookmark_feedback = Some(BookmarkFeedback::Removed {
                                message: bookmarks::REMOVED_MESSAGE.to_string(),
                            });
                        }
                        if !model.bookmarks.is_idle() {
                            model.bookmarks = RegionState::Loading;
                            caps.kv.run(bookmarks::list_op(), |result| {
                                Event::BookmarksListed(Box::new(result))
                            });
                        }
                    }
                    Err(error) => {
                        model.bookmark_feedback = Some(Self::storage_failure(error));
                    }
                }
                caps.render.render();
            }

            // --- Bookmark view ---
            Event::BookmarkViewEntered => {
                model.bookmarks = RegionState::Loading;
                caps.render.render();
                caps.kv.run(bookmarks::list_op(), |result| {
                    Event::BookmarksListed(Box::new(result))
                });
            }

            Event::BookmarksListed(result) => {
                model.bookmarks = match *result {
                    Ok(KvOutput::Entries(entries)) => {
                        let reports = bookmarks::decode_entries(entries);
                        if reports.is_empty() {
                            RegionState::Empty
                        } else {
                            RegionState::Populated(reports)
                        }
                    }
                    Ok(_) => RegionState::Error(
                        AppError::new(ErrorKind::Storage, "unexpected storage output")
                            .user_facing_message(),
                    ),
                    Err(error) => {
                        RegionState::Error(bookmarks::storage_error(error).user_facing_message())
                    }
                };
                caps.render.render();
            }

            // --- Submission view ---
            Event::NewViewEntered => {
                model.staged_photo = None;
                model.submit = SubmitState::Idle;
                model.selected_location = Some(map::DEFAULT_SUBMIT_LOCATION);
                caps.render.render();
            }

            // The staging buffer has capacity one: a new photo replaces
            // whatever was staged before.
            Event::PhotoStaged { data, mime_type } => {
                model.staged_photo = Some(StagedPhoto::new(data, mime_type));
                caps.render.render();
            }

            Event::PhotoDiscarded => {
                model.staged_photo = None;
                caps.render.render();
            }

            Event::SubmitRequested {
                description,
                latitude,
                longitude,
            } => {
                // Caller contract: the view validates description and
                // photo presence before submitting.
                let Some(photo) = model.staged_photo.clone() else {
                    tracing::error!("submit requested without a staged photo");
                    return;
                };

                model.submit = SubmitState::InFlight;
                caps.render.render();

                let payload = NewReportPayload {
                    description,
                    photo,
                    latitude,
                    longitude,
                };
                let boundary = gateway::multipart_boundary();
                let request = gateway::create_report_request(
                    &Self::endpoints(model),
                    model.access_token().as_deref(),
                    &payload,
                    &boundary,
                );
                caps.http.send(request, |result| {
                    Event::CreateReportResponse(Box::new(result))
                });
            }

            Event::CreateReportResponse(result) => {
                match gateway::parse_envelope_response(*result) {
                    ApiResult::Success { message, .. } => {
                        model.submit = SubmitState::Succeeded {
                            message: message
                                .unwrap_or_else(|| SUBMIT_SUCCESS_MESSAGE.to_string()),
                        };
                        model.staged_photo = None;

                        // Best-effort broadcast to all users; its outcome
                        // never reaches the user and never blocks success.
                        if let Some(token) = model.access_token() {
                            let request = gateway::notify_report_request(
                                &Self::endpoints(model),
                                &token,
                                None,
                            );
                            caps.http.send(request, |result| {
                                Event::BroadcastResponse(Box::new(result))
                            });
                        } else {
                            tracing::debug!("broadcast skipped: no access token");
                        }
                    }
                    ApiResult::Failure { message, .. } => {
                        let message = if message.is_empty() {
                            UPLOAD_FAILED_MESSAGE.to_string()
                        } else {
                            message
                        };
                        model.submit = SubmitState::Failed { message };
                    }
                }
                caps.render.render();
            }

            Event::BroadcastResponse(result) => match gateway::parse_envelope_response(*result) {
                ApiResult::Success { .. } => tracing::debug!("broadcast notification accepted"),
                ApiResult::Failure { message, .. } => {
                    tracing::warn!(%message, "broadcast notification failed");
                }
            },

            // --- Push channel (UI side) ---
            Event::PushStatusRequested => {
                caps.push.get_subscription(|result| {
                    Event::PlatformSubscriptionFetched(Box::new(result))
                });
            }

            Event::PlatformSubscriptionFetched(result) => {
                match *result {
                    Ok(PushOutput::Subscription(Some(subscription))) => {
                        model.push.status = PushStatus::Subscribed;
                        model.push.subscription = Some(subscription);
                    }
                    Ok(PushOutput::Subscription(None)) => {
                        model.push.status = PushStatus::Unsubscribed;
                        model.push.subscription = None;
                    }
                    Ok(PushOutput::Unsubscribed { .. }) => {}
                    Err(error) => {
                        tracing::warn!(%error, "push status check failed");
                        model.push.status = PushStatus::Unsubscribed;
                    }
                }
                caps.render.render();
            }

            Event::PushSubscribeRequested => {
                if model.push.in_flight {
                    return;
                }
                model.push.in_flight = true;
                model.push.feedback = None;
                caps.render.render();

                caps.push
                    .subscribe(model.config.vapid_public_key.clone(), |result| {
                        Event::PlatformSubscribed(Box::new(result))
                    });
            }

            Event::PlatformSubscribed(result) => match *result {
                Ok(PushOutput::Subscription(Some(subscription))) => {
                    model.push.subscription = Some(subscription.clone());
                    let request = gateway::subscribe_push_request(
                        &Self::endpoints(model),
                        model.access_token().as_deref(),
                        &subscription,
                    );
                    caps.http.send(request, |result| {
                        Event::SubscribeServerResponse(Box::new(result))
                    });
                }
                Ok(_) => {
                    model.push.in_flight = false;
                    model.push.status = PushStatus::Unsubscribed;
                    model.push.feedback = Some("Push subscription unavailable".into());
                    caps.render.render();
                }
                Err(error) => {
                    model.push.in_flight = false;
                    model.push.status = PushStatus::Unsubscribed;
                    model.push.feedback = Some(error.user_message());
                    caps.render.render();
                }
            },

            Event::SubscribeServerResponse(result) => {
                model.push.in_flight = false;
                match gateway::parse_envelope_response(*result) {
                    ApiResult::Success { message, .. } => {
                        model.push.status = PushStatus::Subscribed;
                        model.push.feedback = message;
                    }
                    ApiResult::Failure { message, .. } => {
                        // Server refused: roll the platform subscription
                        // back so the channel stays unsubscribed.
                        model.push.status = PushStatus::Unsubscribed;
                        model.push.subscription = None;
                        model.push.feedback = Some(message);
                        caps.push
                            .unsubscribe(|result| Event::PlatformUnsubscribed(Box::new(result)));
                    }
                }
                caps.render.render();
            }

            Event::PushUnsubscribeRequested => {
                let endpoint = model
                    .push
                    .subscription
                    .as_ref()
                    .map(|subscription| subscription.endpoint.clone());

                // The local handle is discarded regardless of whether the
                // server acknowledges the deregistration.
                model.push.status = PushStatus::Unsubscribed;
                model.push.subscription = None;
                model.push.in_flight = false;
                model.push.feedback = None;

                if let Some(endpoint) = endpoint {
                    let request = gateway::unsubscribe_push_request(
                        &Self::endpoints(model),
                        model.access_token().as_deref(),
                        &endpoint,
                    );
                    caps.http.send(request, |result| {
                        Event::UnsubscribeServerResponse(Box::new(result))
                    });
                }
                caps.push
                    .unsubscribe(|result| Event::PlatformUnsubscribed(Box::new(result)));
                caps.render.render();
            }

            Event::UnsubscribeServerResponse(result) => {
                match gateway::parse_envelope_response(*result) {
                    ApiResult::Success { .. } => tracing::debug!("push deregistration accepted"),
                    ApiResult::Failure { message, .. } => {
                        tracing::warn!(%message, "push deregistration failed");
                    }
                }
            }

            Event::PlatformUnsubscribed(result) => {
                if let Err(error) = *result {
                    tracing::warn!(%error, "platform unsubscribe failed");
                }
            }
        }
    }

    fn view(&self, model: &Model) -> ViewModel {
        ViewModel {
            is_authenticated: model.session.is_authenticated(),
            auth: model.auth.clone(),
            register: model.register.clone(),
            list: model.list.clone(),
            map: MapViewModel {
                state: model.map.clone(),
                center: map::DEFAULT_CENTER,
                zoom: map::DEFAULT_ZOOM,
                tile_url_template: map::TILE_URL_TEMPLATE.to_string(),
                attribution: map::TILE_ATTRIBUTION.to_string(),
            },
            selected_location: model.selected_location,
            detail: model.detail.clone(),
            bookmark_affordance: model.bookmark_affordance,
            bookmark_feedback: model.bookmark_feedback.clone(),
            bookmarks: model.bookmarks.clone(),
            staged_photo: model.staged_photo.as_ref().map(|photo| StagedPhotoView {
                id: photo.id.clone(),
                mime_type: photo.mime_type.clone(),
                size_bytes: photo.data.len() as u64,
            }),
            submit: model.submit.clone(),
            push: PushViewModel {
                status: model.push.status,
                in_flight: model.push.in_flight,
                feedback: model.push.feedback.clone(),
            },
        }
    }
}
