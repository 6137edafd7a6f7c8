//! End-to-end session behavior of the application wiring, against a scripted
//! backend and a session file in a temp directory.

use async_trait::async_trait;
use homehero::{HomeHero, Settings};
use homehero_http::traits::HttpTransport;
use homehero_http::{ApiRequest, ApiResponse, ClientConfig, Identity, RouteDecision, SyncState};
use parking_lot::Mutex;
use serde_json::json;
use std::sync::Arc;
use tempfile::tempdir;

#[derive(Default)]
struct Backend {
    calls: Mutex<Vec<(String, Option<String>)>>,
    issued: Mutex<u32>,
}

impl Backend {
    fn calls(&self) -> Vec<(String, Option<String>)> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl HttpTransport for Backend {
    async fn send(&self, _url: &str, request: &ApiRequest) -> homehero_http::Result<ApiResponse> {
        self.calls.lock().push((
            format!("{} {}", request.method, request.path),
            request.bearer().map(str::to_string),
        ));
        let response = match request.path.as_str() {
            "/jwt" => {
                let mut issued = self.issued.lock();
                *issued += 1;
                ApiResponse::json_value(200, &json!({"success": true, "token": format!("tok-{}", *issued)}))
            }
            "/logout" => ApiResponse::json_value(200, &json!({"success": true})),
            "/bookings/user/cam@x.com" => ApiResponse::json_value(200, &json!([{"_id": "b1", "status": "pending"}])),
            "/users/stats/cam@x.com" => ApiResponse::json_value(403, &json!({"message": "Forbidden"})),
            _ => ApiResponse::json_value(404, &json!({"message": "Not found"})),
        };
        Ok(response)
    }
}

fn settings(dir: &std::path::Path) -> Settings {
    Settings::new(
        ClientConfig::public("http://backend.test"),
        dir.join("session.json"),
    )
}

#[tokio::test]
async fn sign_in_persists_and_restores_across_restarts() {
    let dir = tempdir().unwrap();
    let backend = Arc::new(Backend::default());

    let app = HomeHero::start_with_transport(settings(dir.path()), backend.clone())
        .await
        .unwrap();
    assert_eq!(app.state(), SyncState::SignedOut);
    assert!(matches!(app.guard("/my-bookings"), RouteDecision::Redirect(_)));

    let state = app
        .sign_in(Identity::new("cam@x.com").with_display_name("Cam"))
        .await
        .unwrap();
    assert!(matches!(state, SyncState::SignedIn { has_token: true, .. }));
    assert_eq!(app.store().token().as_deref(), Some("tok-1"));
    assert_eq!(app.guard("/my-bookings"), RouteDecision::Allow);

    let bookings = app.api.user_bookings("cam@x.com").await.unwrap();
    assert_eq!(bookings.len(), 1);
    assert_eq!(
        backend.calls().last().unwrap(),
        &("GET /bookings/user/cam@x.com".to_string(), Some("tok-1".to_string()))
    );
    app.shutdown().await;

    // A new process finds the identity on disk and exchanges again.
    let app = HomeHero::start_with_transport(settings(dir.path()), backend.clone())
        .await
        .unwrap();
    assert_eq!(app.current_user().unwrap().email, "cam@x.com");
    assert_eq!(app.store().token().as_deref(), Some("tok-2"));
    app.shutdown().await;
}

#[tokio::test]
async fn rejected_request_signs_out_and_redirects() {
    let dir = tempdir().unwrap();
    let backend = Arc::new(Backend::default());
    let app = HomeHero::start_with_transport(settings(dir.path()), backend.clone())
        .await
        .unwrap();
    app.sign_in(Identity::new("cam@x.com")).await.unwrap();

    let err = app.api.user_stats("cam@x.com").await.unwrap_err();
    assert!(err.is_access_denied());
    assert!(!app.store().has_token());
    assert!(app.current_user().is_none());

    let redirect = app.take_redirect().expect("teardown redirect");
    assert_eq!(redirect.route, "/login");
    assert_eq!(redirect.return_to.as_deref(), Some("/users/stats/cam@x.com"));
    assert_eq!(
        redirect.message.as_deref(),
        Some("Session expired. Please login again.")
    );
    app.shutdown().await;

    let app = HomeHero::start_with_transport(settings(dir.path()), backend)
        .await
        .unwrap();
    assert_eq!(app.state(), SyncState::SignedOut);
    assert!(app.store().token().is_none());
    app.shutdown().await;
}

#[tokio::test]
async fn sign_out_clears_the_session_file() {
    let dir = tempdir().unwrap();
    let backend = Arc::new(Backend::default());
    let app = HomeHero::start_with_transport(settings(dir.path()), backend.clone())
        .await
        .unwrap();
    app.sign_in(Identity::new("cam@x.com")).await.unwrap();
    app.sign_out().await.unwrap();
    assert_eq!(app.state(), SyncState::SignedOut);
    assert!(!app.store().has_token());
    app.shutdown().await;

    assert!(backend.calls().iter().any(|(call, _)| call == "POST /logout"));
    let saved = std::fs::read_to_string(dir.path().join("session.json")).unwrap();
    assert!(!saved.contains("access-token"));
    assert!(!saved.contains("identity"));
}
