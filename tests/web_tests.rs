use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use calview::components::google_calendar::models::CalendarEvent;
use calview::components::ComponentManager;
use calview::config::Config;
use calview::session::{Session, SessionPhase};
use calview::web::{build_router, AppState};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower::util::ServiceExt;

/// Build app state with no registered components
fn test_state() -> AppState {
    let config = Arc::new(RwLock::new(Config {
        google_client_id: "test_client_id".to_string(),
        google_client_secret: "test_client_secret".to_string(),
        port: 3000,
        timezone: "UTC".to_string(),
        open_browser: false,
        google_api_base: "https://www.googleapis.com".to_string(),
        google_oauth_base: "https://oauth2.googleapis.com".to_string(),
        components: HashMap::new(),
    }));
    let components = Arc::new(ComponentManager::new(Arc::clone(&config)));
    let session = Arc::new(RwLock::new(Session::new()));

    AppState::new(config, components, session)
}

/// Put the session into the ready state with the given events
async fn authenticate(state: &AppState, events: Vec<CalendarEvent>) {
    let mut session = state.session.write().await;
    session.mark_initialized();
    assert!(session.begin_sign_in("state-token".to_string()));
    assert!(session.sign_in_succeeded("user@example.com".to_string()));
    assert!(session.fetch_complete(events));
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn health_endpoint_responds() {
    let app = build_router(test_state());
    let response = app.oneshot(get("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "OK");
}

#[tokio::test]
async fn events_page_requires_authentication() {
    let app = build_router(test_state());
    let response = app.oneshot(get("/events")).await.unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/");
}

#[tokio::test]
async fn csv_export_requires_authentication() {
    let app = build_router(test_state());
    let response = app.oneshot(get("/export.csv")).await.unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/");
}

#[tokio::test]
async fn sign_in_is_a_noop_before_initialization() {
    let state = test_state();
    let app = build_router(state.clone());

    let response = app.oneshot(get("/auth/sign-in")).await.unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/");
    assert_eq!(
        state.session.read().await.phase(),
        SessionPhase::Unauthenticated
    );
}

#[tokio::test]
async fn sign_in_redirects_to_consent_screen_when_ready() {
    let state = test_state();
    state.session.write().await.mark_initialized();
    let app = build_router(state.clone());

    let response = app.oneshot(get("/auth/sign-in")).await.unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let location = response.headers()[header::LOCATION].to_str().unwrap();
    assert!(location.starts_with("https://accounts.google.com/o/oauth2/v2/auth?"));
    assert!(location.contains("state="));
    assert!(location.contains("calendar.events.public.readonly"));
    assert_eq!(
        state.session.read().await.phase(),
        SessionPhase::Authenticating
    );
}

#[tokio::test]
async fn callback_with_mismatched_state_fails_the_sign_in() {
    let state = test_state();
    {
        let mut session = state.session.write().await;
        session.mark_initialized();
        assert!(session.begin_sign_in("expected-token".to_string()));
    }
    let app = build_router(state.clone());

    let response = app
        .oneshot(get("/auth/callback?code=abc&state=wrong-token"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/");
    assert_eq!(
        state.session.read().await.phase(),
        SessionPhase::Unauthenticated
    );
}

#[tokio::test]
async fn callback_with_consent_denied_fails_the_sign_in() {
    let state = test_state();
    {
        let mut session = state.session.write().await;
        session.mark_initialized();
        assert!(session.begin_sign_in("expected-token".to_string()));
    }
    let app = build_router(state.clone());

    let response = app
        .oneshot(get(
            "/auth/callback?error=access_denied&state=expected-token",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/");
    assert_eq!(
        state.session.read().await.phase(),
        SessionPhase::Unauthenticated
    );
}

#[tokio::test]
async fn fetch_without_calendar_component_returns_no_events() {
    let state = test_state();
    let events = state.fetch_user_events("user@example.com").await;
    assert!(events.is_empty());
}

fn sample_events() -> Vec<CalendarEvent> {
    vec![
        CalendarEvent {
            id: "all-day".to_string(),
            start_date: Some("2024-03-02".to_string()),
            ..Default::default()
        },
        CalendarEvent {
            id: "standup".to_string(),
            summary: Some("Standup".to_string()),
            location: Some("Room 1".to_string()),
            start_date_time: Some("2024-03-01T09:00:00+00:00".to_string()),
            ..Default::default()
        },
    ]
}

#[tokio::test]
async fn events_page_renders_the_table() {
    let state = test_state();
    authenticate(&state, sample_events()).await;
    let app = build_router(state.clone());

    let response = app.oneshot(get("/events")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_string(response).await;
    assert!(body.contains("user@example.com"));
    assert!(body.contains("<td>Standup</td>"));
    assert!(body.contains("<td>No Title</td>"));
    assert!(body.contains("<td>All Day</td>"));
    assert!(body.contains("<td>Room 1</td>"));
}

#[tokio::test]
async fn events_page_applies_the_name_filter() {
    let state = test_state();
    authenticate(&state, sample_events()).await;
    let app = build_router(state.clone());

    let response = app.oneshot(get("/events?search=standup")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_string(response).await;
    assert!(body.contains("<td>Standup</td>"));
    assert!(!body.contains("<td>No Title</td>"));
    // The submitted term is echoed back into the search box
    assert!(body.contains("value=\"standup\""));
}

#[tokio::test]
async fn events_page_applies_the_date_filter() {
    let state = test_state();
    authenticate(&state, sample_events()).await;
    let app = build_router(state.clone());

    let response = app.oneshot(get("/events?date=2024-03-02")).await.unwrap();
    let body = body_string(response).await;
    assert!(body.contains("<td>No Title</td>"));
    assert!(!body.contains("<td>Standup</td>"));

    // A day with no events shows the empty note instead
    let app = build_router(state.clone());
    let response = app.oneshot(get("/events?date=2024-07-01")).await.unwrap();
    let body = body_string(response).await;
    assert!(body.contains("No events found for the selected date."));
}

#[tokio::test]
async fn csv_export_downloads_the_full_list() {
    let state = test_state();
    authenticate(&state, sample_events()).await;
    let app = build_router(state.clone());

    // Filters in the table never narrow the export
    let response = app.oneshot(get("/export.csv")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/csv; charset=utf-8"
    );
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"events.csv\""
    );

    let body = body_string(response).await;
    assert!(body.starts_with("Name,Date,Time,Location"));
    assert!(body.contains("No Title,3/2/2024,All Day,N/A"));
    assert!(body.contains("Standup,3/1/2024,9:00:00 AM,Room 1"));
}
