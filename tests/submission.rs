use citycare_core::app::SUBMIT_SUCCESS_MESSAGE;
use citycare_core::capabilities::{HttpError, HttpRequest, HttpResponse};
use citycare_core::gateway::UPLOAD_FAILED_MESSAGE;
use citycare_core::model::{Secret, SubmitState};
use citycare_core::{App, Effect, Event, Model};
use crux_core::testing::AppTester;
use crux_core::Request;

fn ok(status: u16, body: &str) -> Result<HttpResponse, HttpError> {
    Ok(HttpResponse::new(status, body.as_bytes().to_vec()))
}

fn http_requests(effects: Vec<Effect>) -> Vec<Request<HttpRequest>> {
    effects
        .into_iter()
        .filter_map(|e| match e {
            Effect::Http(request) => Some(request),
            _ => None,
        })
        .collect()
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack
        .windows(needle.len())
        .any(|window| window == needle)
}

fn login(app: &AppTester<App, Effect>, model: &mut Model) {
    let _ = app.update(
        Event::SessionTokenChanged {
            token: Some(Secret::new("jwt-abc")),
            user_id: Some("user-1".into()),
            name: Some("Budi".into()),
        },
        model,
    );
}

#[test]
fn staging_a_second_photo_replaces_the_first() {
    let app = AppTester::<App, _>::default();
    let mut model = Model::default();
    login(&app, &mut model);

    let _ = app.update(Event::NewViewEntered, &mut model);
    let _ = app.update(
        Event::PhotoStaged {
            data: b"first-photo".to_vec(),
            mime_type: "image/png".into(),
        },
        &mut model,
    );
    let _ = app.update(
        Event::PhotoStaged {
            data: b"second-photo".to_vec(),
            mime_type: "image/jpeg".into(),
        },
        &mut model,
    );

    let update = app.update(
        Event::SubmitRequested {
            description: "Pohon tumbang".into(),
            latitude: -6.175389,
            longitude: 106.827139,
        },
        &mut model,
    );
    assert_eq!(model.submit, SubmitState::InFlight);

    let requests = http_requests(update.effects);
    assert_eq!(requests.len(), 1);
    let body = requests[0].operation.body.as_ref().expect("multipart body");

    // Exactly one photo part, and it is the most recently staged one.
    assert!(contains(body, b"second-photo"));
    assert!(!contains(body, b"first-photo"));
    let photo_parts = body
        .windows(b"name=\"photo\"".len())
        .filter(|window| *window == b"name=\"photo\"")
        .count();
    assert_eq!(photo_parts, 1);
}

#[test]
fn successful_submit_reports_success_even_if_broadcast_fails() {
    let app = AppTester::<App, _>::default();
    let mut model = Model::default();
    login(&app, &mut model);

    let _ = app.update(Event::NewViewEntered, &mut model);
    let _ = app.update(
        Event::PhotoStaged {
            data: vec![1, 2, 3],
            mime_type: "image/jpeg".into(),
        },
        &mut model,
    );

    let update = app.update(
        Event::SubmitRequested {
            description: "Pohon tumbang".into(),
            latitude: -6.2,
            longitude: 106.8,
        },
        &mut model,
    );
    let mut create_requests = http_requests(update.effects);

    let update = app
        .resolve(
            &mut create_requests[0],
            ok(201, r#"{"error": false, "message": "Story created"}"#),
        )
        .expect("resolve create");

    let mut follow_up_effects = Vec::new();
    for event in update.events {
        follow_up_effects.extend(app.update(event, &mut model).effects);
    }

    assert_eq!(
        model.submit,
        SubmitState::Succeeded {
            message: "Story created".into()
        }
    );
    // Staged photo is consumed by the successful submission.
    assert!(model.staged_photo.is_none());

    // The broadcast went out as a separate fire-and-forget request.
    let mut broadcasts = http_requests(follow_up_effects);
    assert_eq!(broadcasts.len(), 1);
    assert!(broadcasts[0]
        .operation
        .url
        .ends_with("/notifications/send"));

    // Broadcast failure never surfaces: the submit outcome is untouched.
    let update = app
        .resolve(
            &mut broadcasts[0],
            ok(500, r#"{"error": true, "message": "fan-out failed"}"#),
        )
        .expect("resolve broadcast");
    for event in update.events {
        let _ = app.update(event, &mut model);
    }
    assert_eq!(
        model.submit,
        SubmitState::Succeeded {
            message: "Story created".into()
        }
    );
}

#[test]
fn failed_submit_keeps_the_form_and_uses_the_default_message() {
    let app = AppTester::<App, _>::default();
    let mut model = Model::default();
    login(&app, &mut model);

    let _ = app.update(Event::NewViewEntered, &mut model);
    let _ = app.update(
        Event::PhotoStaged {
            data: vec![9, 9, 9],
            mime_type: "image/png".into(),
        },
        &mut model,
    );

    let update = app.update(
        Event::SubmitRequested {
            description: "Saluran mampet".into(),
            latitude: -6.2,
            longitude: 106.8,
        },
        &mut model,
    );
    let mut requests = http_requests(update.effects);

    // Upstream failure with no message: the default upload message wins.
    let update = app
        .resolve(&mut requests[0], ok(200, r#"{"error": true}"#))
        .expect("resolve create");
    for event in update.events {
        let _ = app.update(event, &mut model);
    }

    assert_eq!(
        model.submit,
        SubmitState::Failed {
            message: UPLOAD_FAILED_MESSAGE.into()
        }
    );
    // The form stays intact for a retry.
    assert!(model.staged_photo.is_some());
}

#[test]
fn upstream_message_wins_over_the_default_on_failure() {
    let app = AppTester::<App, _>::default();
    let mut model = Model::default();
    login(&app, &mut model);

    let _ = app.update(Event::NewViewEntered, &mut model);
    let _ = app.update(
        Event::PhotoStaged {
            data: vec![1],
            mime_type: "image/png".into(),
        },
        &mut model,
    );

    let update = app.update(
        Event::SubmitRequested {
            description: "x".into(),
            latitude: 0.0,
            longitude: 0.0,
        },
        &mut model,
    );
    let mut requests = http_requests(update.effects);

    let update = app
        .resolve(
            &mut requests[0],
            ok(413, r#"{"error": true, "message": "Photo too large"}"#),
        )
        .expect("resolve create");
    for event in update.events {
        let _ = app.update(event, &mut model);
    }

    assert_eq!(
        model.submit,
        SubmitState::Failed {
            message: "Photo too large".into()
        }
    );
}

#[test]
fn submit_success_falls_back_to_the_default_success_message() {
    let app = AppTester::<App, _>::default();
    let mut model = Model::default();
    login(&app, &mut model);

    let _ = app.update(Event::NewViewEntered, &mut model);
    let _ = app.update(
        Event::PhotoStaged {
            data: vec![1],
            mime_type: "image/webp".into(),
        },
        &mut model,
    );

    let update = app.update(
        Event::SubmitRequested {
            description: "x".into(),
            latitude: 0.0,
            longitude: 0.0,
        },
        &mut model,
    );
    let mut requests = http_requests(update.effects);

    let update = app
        .resolve(&mut requests[0], ok(201, r#"{"error": false}"#))
        .expect("resolve create");
    for event in update.events {
        let _ = app.update(event, &mut model);
    }

    assert_eq!(
        model.submit,
        SubmitState::Succeeded {
            message: SUBMIT_SUCCESS_MESSAGE.into()
        }
    );
}

#[test]
fn entering_the_view_resets_previous_session_state() {
    let app = AppTester::<App, _>::default();
    let mut model = Model::default();
    login(&app, &mut model);

    let _ = app.update(
        Event::PhotoStaged {
            data: vec![1],
            mime_type: "image/png".into(),
        },
        &mut model,
    );
    let _ = app.update(Event::NewViewEntered, &mut model);

    // Fresh per-view state: the old staged photo is gone and the form
    // starts at the default pick location.
    assert!(model.staged_photo.is_none());
    assert_eq!(model.submit, SubmitState::Idle);
    let selected = model.selected_location.expect("default location");
    assert!((selected.lat - -6.175389).abs() < 1e-9);
    assert!((selected.lon - 106.827139).abs() < 1e-9);
}
