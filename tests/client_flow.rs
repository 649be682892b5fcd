mod common;

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use campus_vibe::auth::Credentials;
use campus_vibe::gate::{Decision, GateState, Redirect};
use campus_vibe::onboarding::StepOutcome;
use campus_vibe::CampusVibe;

use common::{fill, RecordingNavigator};

fn session_body() -> serde_json::Value {
    json!({
        "access_token": "user_token",
        "refresh_token": "refresh",
        "expires_in": 3600,
        "token_type": "bearer",
        "user": {
            "id": "u-1",
            "email": "asha@campus.edu",
            "user_metadata": { "full_name": "Asha" }
        }
    })
}

fn stub_row() -> serde_json::Value {
    json!({
        "uid": "u-1",
        "email": "asha@campus.edu",
        "name": "Asha",
        "gender": null,
        "interestedIn": null,
        "createdAt": "2024-09-01T10:00:00Z",
        "needsOnboarding": true
    })
}

fn complete_row() -> serde_json::Value {
    json!({
        "uid": "u-1",
        "email": "asha@campus.edu",
        "name": "Asha",
        "gender": "female",
        "interestedIn": "everyone",
        "createdAt": "2024-09-01T10:00:00Z",
        "needsOnboarding": false,
        "profileDetails": {
            "relationshipGoal": "long-term",
            "interests": ["music", "travel"],
            "bio": "Loves hiking and old films.",
            "height": 170,
            "languages": ["english"],
            "hasPets": "no",
            "favorites": { "songs": "", "movies": "Inception" }
        }
    })
}

async fn mount_auth(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "password"))
        .respond_with(ResponseTemplate::new(200).set_body_json(session_body()))
        .mount(server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/users"))
        .and(query_param("uid", "eq.u-1"))
        .respond_with(ResponseTemplate::new(204))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_first_sign_in_through_onboarding() {
    let server = MockServer::start().await;
    mount_auth(&server).await;

    // never written, then the stub, then the finished profile
    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .and(header("Authorization", "Bearer user_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([stub_row()])))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([complete_row()])))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/users"))
        .and(query_param("on_conflict", "uid"))
        .and(body_partial_json(json!({ "uid": "u-1", "needsOnboarding": true })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/users"))
        .and(body_partial_json(json!({
            "needsOnboarding": false,
            "profileDetails": {
                "height": 170,
                "hasPets": "no",
                "favorites": { "movies": "Inception" }
            }
        })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let app = CampusVibe::new(&server.uri(), "anon_key");
    let navigator = RecordingNavigator::default();
    let mut guard = app.route_guard();

    assert_eq!(guard.evaluate(app.session().snapshot().gate_state(), "/", &navigator), Decision::Wait);

    app.session()
        .sign_in(&Credentials::new("asha@campus.edu", "secret"))
        .await
        .unwrap();
    let state = app.session().snapshot().gate_state();
    assert_eq!(state, GateState::NeedsOnboarding);
    guard.evaluate(state, "/", &navigator);
    assert_eq!(
        navigator.redirects.lock().unwrap().last(),
        Some(&Redirect {
            to: "/onboarding".to_string(),
            from: None,
        })
    );

    let toasts = app.toasts().active(chrono::Utc::now());
    assert!(toasts.iter().any(|t| t.notification.title == "Welcome!"));

    let wizard = app.onboarding_wizard();
    assert_eq!(wizard.draft().unwrap().name, "Asha");
    wizard.edit(fill);

    assert_eq!(app.advance_onboarding(&wizard).await.unwrap(), StepOutcome::Advanced(1));
    assert_eq!(app.advance_onboarding(&wizard).await.unwrap(), StepOutcome::Advanced(2));
    match app.advance_onboarding(&wizard).await.unwrap() {
        StepOutcome::Submitted(record) => assert_eq!(record.uid, "u-1"),
        other => panic!("unexpected outcome: {:?}", other),
    }

    let snapshot = app.session().snapshot();
    assert_eq!(snapshot.gate_state(), GateState::Active);
    assert_eq!(guard.evaluate(snapshot.gate_state(), "/", &navigator), Decision::Allow);
}

#[tokio::test]
async fn test_profile_outage_reports_error() {
    let server = MockServer::start().await;
    mount_auth(&server).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([complete_row()])))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .mount(&server)
        .await;

    let app = CampusVibe::new(&server.uri(), "anon_key");
    app.session()
        .sign_in(&Credentials::new("asha@campus.edu", "secret"))
        .await
        .unwrap();

    let snapshot = app.session().snapshot();
    assert!(!snapshot.is_loading);
    assert_eq!(snapshot.auth_error.as_deref(), Some("Failed to fetch user profile"));
    assert_eq!(snapshot.gate_state(), GateState::NeedsOnboarding);

    let titles: Vec<String> = app
        .toasts()
        .active(chrono::Utc::now())
        .into_iter()
        .map(|t| t.notification.title)
        .collect();
    assert!(titles.contains(&"Error".to_string()));
}

#[tokio::test]
async fn test_sign_out_returns_to_login() {
    let server = MockServer::start().await;
    mount_auth(&server).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([complete_row()])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/logout"))
        .and(header("Authorization", "Bearer user_token"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let app = CampusVibe::new(&server.uri(), "anon_key");
    app.session()
        .sign_in(&Credentials::new("asha@campus.edu", "secret"))
        .await
        .unwrap();
    assert_eq!(app.session().snapshot().gate_state(), GateState::Active);

    app.session().sign_out().await.unwrap();
    assert_eq!(app.session().snapshot().gate_state(), GateState::Unauthenticated);

    let navigator = RecordingNavigator::default();
    let mut guard = app.route_guard();
    guard.evaluate(GateState::Unauthenticated, "/profile", &navigator);
    assert_eq!(
        navigator.redirects.lock().unwrap()[0],
        Redirect {
            to: "/login".to_string(),
            from: Some("/profile".to_string()),
        }
    );
}
