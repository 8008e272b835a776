mod actor;
pub mod auth;
mod handle;
pub mod models;
pub mod time;
pub mod token;

pub use actor::GoogleCalendarActor;
pub use handle::GoogleCalendarHandle;
pub use models::CalendarEvent;

use crate::components::Component;
use crate::config::Config;
use crate::error::{component_error, AppResult};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Google Calendar component: the app's client for Google's calendar and
/// identity APIs
#[derive(Default)]
pub struct GoogleCalendar {
    handle: RwLock<Option<GoogleCalendarHandle>>,
}

impl GoogleCalendar {
    /// Create a new Google Calendar component
    pub fn new() -> Self {
        Self {
            handle: RwLock::new(None),
        }
    }

    /// Get the handle if the component has been initialized
    pub async fn get_handle(&self) -> Option<GoogleCalendarHandle> {
        let handle_lock = self.handle.read().await;
        handle_lock.clone()
    }
}

#[async_trait]
impl Component for GoogleCalendar {
    fn name(&self) -> &'static str {
        "google_calendar"
    }

    async fn init(&self, config: Arc<RwLock<Config>>) -> AppResult<()> {
        // Without credentials the consent flow cannot be driven
        {
            let config_read = config.read().await;
            if config_read.google_client_id.is_empty() || config_read.google_client_secret.is_empty()
            {
                return Err(component_error(
                    "Google client credentials are not configured",
                ));
            }
        }

        // Create a new handle if one doesn't exist
        let mut handle_lock = self.handle.write().await;
        if handle_lock.is_none() {
            *handle_lock = Some(GoogleCalendarHandle::new(config));
        }

        Ok(())
    }

    async fn shutdown(&self) -> AppResult<()> {
        // Shutdown the handle if it exists
        let handle_lock = self.handle.read().await;
        if let Some(handle) = &*handle_lock {
            handle.shutdown().await?;
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}
