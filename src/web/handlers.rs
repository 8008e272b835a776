use crate::components::google_calendar::auth;
use crate::session::SessionPhase;
use crate::view::{self, csv, state as view_state};
use crate::view::state::ViewState;
use crate::web::AppState;
use axum::{
    extract::{Query, State},
    http::header,
    response::{Html, IntoResponse, Redirect, Response},
};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{error, info, warn};
use url::form_urlencoded;
use uuid::Uuid;

/// Query parameters of the OAuth callback redirect
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// Query parameters of the events table page
#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    pub search: Option<String>,
    pub date: Option<String>,
    pub page: Option<String>,
}

impl EventsQuery {
    /// Rebuild the view state, ignoring anything that does not parse
    fn view_state(&self) -> ViewState {
        ViewState {
            search_term: self.search.clone().unwrap_or_default(),
            selected_date: self
                .date
                .as_deref()
                .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()),
            current_page: self
                .page
                .as_deref()
                .and_then(|p| p.parse::<usize>().ok())
                .unwrap_or(1),
        }
    }
}

/// Handler for the landing page
pub async fn index_handler(State(state): State<AppState>) -> Response {
    let session = state.session.read().await;
    if session.is_authenticated() {
        return Redirect::to("/events").into_response();
    }

    Html(include_str!("../../assets/index.html")).into_response()
}

/// Handler starting the interactive sign-in flow.
///
/// A no-op redirect back to the landing page when initialization never
/// completed or a sign-in is already underway.
pub async fn sign_in_handler(State(state): State<AppState>) -> Redirect {
    let config = state.config.read().await;
    let mut session = state.session.write().await;

    if !session.is_initialized() || session.phase() != SessionPhase::Unauthenticated {
        return Redirect::to("/");
    }

    let state_token = Uuid::new_v4().to_string();
    match auth::consent_url(&config, &state_token) {
        Ok(url) => {
            session.begin_sign_in(state_token);
            info!("Redirecting to Google consent screen");
            Redirect::to(&url)
        }
        Err(e) => {
            error!("Error building consent URL: {:?}", e);
            Redirect::to("/")
        }
    }
}

/// Handler for the OAuth callback redirect
pub async fn oauth_callback_handler(
    State(state): State<AppState>,
    Query(params): Query<CallbackQuery>,
) -> Redirect {
    // Validate the round-tripped CSRF state token first
    let expected_state = {
        let mut session = state.session.write().await;
        session.take_pending_auth_state()
    };
    let state_matches = matches!(
        (&expected_state, &params.state),
        (Some(expected), Some(received)) if expected == received
    );

    if let Some(error) = &params.error {
        warn!("Sign-in was not completed: {}", error);
        state.session.write().await.sign_in_failed();
        return Redirect::to("/");
    }

    let code = match (&params.code, state_matches) {
        (Some(code), true) => code.clone(),
        _ => {
            error!("Invalid OAuth callback: missing code or state mismatch");
            state.session.write().await.sign_in_failed();
            return Redirect::to("/");
        }
    };

    let handle = match state.calendar_handle().await {
        Some(handle) => handle,
        None => {
            error!("Calendar component not initialized, cannot complete sign-in");
            state.session.write().await.sign_in_failed();
            return Redirect::to("/");
        }
    };

    let email = match handle.complete_sign_in(code).await {
        Ok(email) => email,
        Err(e) => {
            error!("Error during authentication: {:?}", e);
            state.session.write().await.sign_in_failed();
            return Redirect::to("/");
        }
    };

    info!("User {} successfully authenticated", email);
    state.session.write().await.sign_in_succeeded(email.clone());

    // Fetch failures are swallowed: the table renders empty instead
    let events = state.fetch_user_events(&email).await;
    info!("Fetched {} calendar events", events.len());
    state.session.write().await.fetch_complete(events);

    Redirect::to("/events")
}

/// Handler for the events table page
pub async fn events_handler(
    State(state): State<AppState>,
    Query(params): Query<EventsQuery>,
) -> Response {
    let tz = state.timezone().await;
    let session = state.session.read().await;
    if !session.is_authenticated() {
        return Redirect::to("/").into_response();
    }

    let view = params.view_state();
    let filtered = view_state::filtered_events(session.events(), &view, &tz);
    let page = view_state::clamp_page(view.current_page, filtered.len());
    let visible = view_state::page_slice(&filtered, page);

    // Render table rows
    let mut rows = String::new();
    for event in visible {
        rows.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            html_escape(view::event_name(event)),
            html_escape(&view::event_date_text(event, &tz)),
            html_escape(&view::event_time_text(event, &tz)),
            html_escape(view::event_location_text(event)),
        ));
    }

    let no_events_message = if filtered.is_empty() {
        "<p class=\"empty-note\">No events found for the selected date.</p>"
    } else {
        ""
    };

    let html = include_str!("../../assets/events.html")
        .replace("{{USER_EMAIL}}", &html_escape(session.user_email().unwrap_or("")))
        .replace("{{SEARCH_VALUE}}", &html_escape(&view.search_term))
        .replace(
            "{{DATE_VALUE}}",
            &view
                .selected_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
        )
        .replace("{{PAGE_VALUE}}", &page.to_string())
        .replace("{{EVENT_ROWS}}", &rows)
        .replace("{{NO_EVENTS_MESSAGE}}", no_events_message)
        .replace("{{PAGINATION}}", &pagination_links(&view, page, filtered.len()));

    Html(html).into_response()
}

/// Handler for the CSV export download.
///
/// Exports the full fetched list, independent of the table's filters and
/// current page.
pub async fn export_csv_handler(State(state): State<AppState>) -> Response {
    let tz = state.timezone().await;
    let session = state.session.read().await;
    if !session.is_authenticated() {
        return Redirect::to("/").into_response();
    }

    let body = csv::export_events(session.events(), &tz);

    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", csv::CSV_FILE_NAME),
            ),
        ],
        body,
    )
        .into_response()
}

/// Handler for API health check
pub async fn health_handler() -> &'static str {
    "OK"
}

/// Build the pager links, carrying the active filters through
fn pagination_links(view: &ViewState, current_page: usize, filtered_len: usize) -> String {
    let pages = view_state::page_count(filtered_len);
    if pages <= 1 {
        return String::new();
    }

    let mut links = String::new();
    for page in 1..=pages {
        let mut query = form_urlencoded::Serializer::new(String::new());
        if !view.search_term.is_empty() {
            query.append_pair("search", &view.search_term);
        }
        if let Some(date) = view.selected_date {
            query.append_pair("date", &date.format("%Y-%m-%d").to_string());
        }
        query.append_pair("page", &page.to_string());

        let class = if page == current_page {
            "page-link current"
        } else {
            "page-link"
        };
        links.push_str(&format!(
            "<a class=\"{}\" href=\"/events?{}\">{}</a>\n",
            class,
            query.finish(),
            page
        ));
    }

    links
}

/// Minimal HTML escaping for interpolated text
fn html_escape(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#39;"),
            _ => result.push(c),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn html_escape_neutralizes_markup() {
        assert_eq!(html_escape("plain"), "plain");
        assert_eq!(
            html_escape("<script>\"x\" & 'y'</script>"),
            "&lt;script&gt;&quot;x&quot; &amp; &#39;y&#39;&lt;/script&gt;"
        );
    }

    #[test]
    fn query_parsing_ignores_junk() {
        let query = EventsQuery {
            search: Some("standup".to_string()),
            date: Some("03/01/2024".to_string()),
            page: Some("three".to_string()),
        };
        let view = query.view_state();
        assert_eq!(view.search_term, "standup");
        assert!(view.selected_date.is_none());
        assert_eq!(view.current_page, 1);

        let query = EventsQuery {
            search: None,
            date: Some("2024-03-01".to_string()),
            page: Some("2".to_string()),
        };
        let view = query.view_state();
        assert_eq!(view.search_term, "");
        assert_eq!(
            view.selected_date,
            Some(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())
        );
        assert_eq!(view.current_page, 2);
    }

    #[test]
    fn pagination_links_carry_filters() {
        let view = ViewState {
            search_term: "team sync".to_string(),
            selected_date: Some(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()),
            current_page: 2,
        };
        let links = pagination_links(&view, 2, 12);

        assert!(links.contains("search=team+sync"));
        assert!(links.contains("date=2024-03-01"));
        assert!(links.contains("page=1"));
        assert!(links.contains("page=3"));
        assert!(links.contains("class=\"page-link current\" href=\"/events?search=team+sync&date=2024-03-01&page=2\""));
    }

    #[test]
    fn single_page_has_no_pager() {
        assert_eq!(pagination_links(&ViewState::new(), 1, 5), "");
        assert_eq!(pagination_links(&ViewState::new(), 1, 0), "");
    }
}
