use citycare_core::capabilities::{HttpError, HttpResponse};
use citycare_core::gateway::REGISTER_VALIDATION_MESSAGE;
use citycare_core::model::{AuthState, RegisterState, Secret};
use citycare_core::{App, Effect, Event, Model};
use crux_core::testing::AppTester;

fn ok(status: u16, body: &str) -> Result<HttpResponse, HttpError> {
    Ok(HttpResponse::new(status, body.as_bytes().to_vec()))
}

#[test]
fn short_password_fails_registration_with_zero_network_calls() {
    let app = AppTester::<App, _>::default();
    let mut model = Model::default();

    let update = app.update(
        Event::RegisterRequested {
            name: "Budi".into(),
            email: "budi@example.com".into(),
            password: Secret::new("short"),
        },
        &mut model,
    );

    assert_eq!(
        model.register,
        RegisterState::Failed {
            message: REGISTER_VALIDATION_MESSAGE.into()
        }
    );
    assert!(
        !update.effects.iter().any(|e| matches!(e, Effect::Http(_))),
        "validation failure must not issue a request"
    );
}

#[test]
fn valid_registration_posts_and_reports_the_server_message() {
    let app = AppTester::<App, _>::default();
    let mut model = Model::default();

    let update = app.update(
        Event::RegisterRequested {
            name: "Budi".into(),
            email: "budi@example.com".into(),
            password: Secret::new("password123"),
        },
        &mut model,
    );
    assert_eq!(model.register, RegisterState::InFlight);

    let mut requests: Vec<_> = update
        .effects
        .into_iter()
        .filter_map(|e| match e {
            Effect::Http(request) => Some(request),
            _ => None,
        })
        .collect();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].operation.url.ends_with("/register"));

    let update = app
        .resolve(
            &mut requests[0],
            ok(201, r#"{"error": false, "message": "User created"}"#),
        )
        .expect("resolve register");
    for event in update.events {
        let _ = app.update(event, &mut model);
    }

    assert_eq!(
        model.register,
        RegisterState::Succeeded {
            message: "User created".into()
        }
    );
}

#[test]
fn login_success_carries_the_normalized_session() {
    let app = AppTester::<App, _>::default();
    let mut model = Model::default();

    let update = app.update(
        Event::LoginRequested {
            email: "budi@example.com".into(),
            password: Secret::new("password123"),
        },
        &mut model,
    );
    assert_eq!(model.auth, AuthState::InFlight);

    let mut requests: Vec<_> = update
        .effects
        .into_iter()
        .filter_map(|e| match e {
            Effect::Http(request) => Some(request),
            _ => None,
        })
        .collect();
    assert!(requests[0].operation.url.ends_with("/login"));

    let body = r#"{
        "error": false,
        "message": "success",
        "loginResult": {"userId": "user-1", "name": "Budi", "token": "jwt-abc"}
    }"#;
    let update = app.resolve(&mut requests[0], ok(200, body)).expect("resolve login");
    for event in update.events {
        let _ = app.update(event, &mut model);
    }

    let AuthState::LoggedIn(session) = &model.auth else {
        panic!("expected a logged-in state, got {:?}", model.auth);
    };
    assert_eq!(session.user_id, "user-1");
    assert_eq!(session.token.expose(), "jwt-abc");

    // Token custody stays with the external provider: the shell stores
    // the token and mirrors it back in before the core is authenticated.
    assert!(!model.session.is_authenticated());
    let _ = app.update(
        Event::SessionTokenChanged {
            token: Some(Secret::new("jwt-abc")),
            user_id: Some(session.user_id.clone()),
            name: Some(session.name.clone()),
        },
        &mut model,
    );
    assert!(model.session.is_authenticated());
}

#[test]
fn login_failure_surfaces_the_upstream_message() {
    let app = AppTester::<App, _>::default();
    let mut model = Model::default();

    let update = app.update(
        Event::LoginRequested {
            email: "budi@example.com".into(),
            password: Secret::new("wrong-password"),
        },
        &mut model,
    );
    let mut requests: Vec<_> = update
        .effects
        .into_iter()
        .filter_map(|e| match e {
            Effect::Http(request) => Some(request),
            _ => None,
        })
        .collect();

    let update = app
        .resolve(
            &mut requests[0],
            ok(401, r#"{"error": true, "message": "Invalid password"}"#),
        )
        .expect("resolve login");
    for event in update.events {
        let _ = app.update(event, &mut model);
    }

    assert_eq!(
        model.auth,
        AuthState::Failed {
            message: "Invalid password".into()
        }
    );
}

#[test]
fn login_timeout_is_a_user_visible_failure() {
    let app = AppTester::<App, _>::default();
    let mut model = Model::default();

    let update = app.update(
        Event::LoginRequested {
            email: "budi@example.com".into(),
            password: Secret::new("password123"),
        },
        &mut model,
    );
    let mut requests: Vec<_> = update
        .effects
        .into_iter()
        .filter_map(|e| match e {
            Effect::Http(request) => Some(request),
            _ => None,
        })
        .collect();
    assert_eq!(requests[0].operation.timeout_ms, 15_000);

    let update = app
        .resolve(&mut requests[0], Err(HttpError::Timeout))
        .expect("resolve login");
    for event in update.events {
        let _ = app.update(event, &mut model);
    }

    let AuthState::Failed { message } = &model.auth else {
        panic!("expected a failed state, got {:?}", model.auth);
    };
    assert!(message.contains("timed out"));
}
