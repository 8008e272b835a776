pub mod handlers;

use crate::components::google_calendar::{CalendarEvent, GoogleCalendar, GoogleCalendarHandle};
use crate::components::ComponentManager;
use crate::config::Config;
use crate::session::Session;
use axum::{routing::get, Router};
use chrono_tz::Tz;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing::{error, warn};

/// Shared state for the web layer
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<RwLock<Config>>,
    pub components: Arc<ComponentManager>,
    pub session: Arc<RwLock<Session>>,
}

impl AppState {
    pub fn new(
        config: Arc<RwLock<Config>>,
        components: Arc<ComponentManager>,
        session: Arc<RwLock<Session>>,
    ) -> Self {
        Self {
            config,
            components,
            session,
        }
    }

    /// Handle of the calendar component, when it initialized
    pub async fn calendar_handle(&self) -> Option<GoogleCalendarHandle> {
        let component = self.components.get_component_by_name("google_calendar")?;
        let calendar = component.as_any().downcast_ref::<GoogleCalendar>()?;
        calendar.get_handle().await
    }

    /// Fetch the signed-in user's events, swallowing failures.
    ///
    /// Returns an empty list when the calendar component never initialized
    /// or the fetch fails; the table then simply renders empty.
    pub async fn fetch_user_events(&self, calendar_id: &str) -> Vec<CalendarEvent> {
        let handle = match self.calendar_handle().await {
            Some(handle) => handle,
            None => {
                warn!("Calendar component not initialized, returning no events");
                return Vec::new();
            }
        };

        match handle.fetch_user_events(calendar_id.to_string()).await {
            Ok(events) => events,
            Err(e) => {
                error!("Error fetching calendar events: {:?}", e);
                Vec::new()
            }
        }
    }

    /// Timezone from config, falling back to UTC
    pub async fn timezone(&self) -> Tz {
        let config_read = self.config.read().await;
        config_read.timezone.parse().unwrap_or(chrono_tz::UTC)
    }
}

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index_handler))
        .route("/auth/sign-in", get(handlers::sign_in_handler))
        .route("/auth/callback", get(handlers::oauth_callback_handler))
        .route("/events", get(handlers::events_handler))
        .route("/export.csv", get(handlers::export_csv_handler))
        .route("/health", get(handlers::health_handler))
        // Serve static files
        .nest_service("/assets", ServeDir::new("assets"))
        // Other middlewares
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
