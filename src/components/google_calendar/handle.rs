use super::actor::{GoogleCalendarActor, GoogleCalendarActorHandle};
use super::models::CalendarEvent;
use crate::config::Config;
use crate::error::AppResult;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

/// Handle for interacting with the Google Calendar actor
#[derive(Clone)]
pub struct GoogleCalendarHandle {
    actor_handle: GoogleCalendarActorHandle,
    _actor_task: Arc<JoinHandle<()>>,
}

impl GoogleCalendarHandle {
    /// Create a new GoogleCalendarHandle and spawn the actor
    pub fn new(config: Arc<RwLock<Config>>) -> Self {
        // Create the actor and get its handle
        let (mut actor, handle) = GoogleCalendarActor::new(config);

        // Spawn a task to run the actor
        let actor_task = tokio::spawn(async move {
            actor.run().await;
        });

        Self {
            actor_handle: handle,
            _actor_task: Arc::new(actor_task),
        }
    }

    /// Finish the sign-in flow, returning the signed-in user's email
    pub async fn complete_sign_in(&self, code: String) -> AppResult<String> {
        self.actor_handle.complete_sign_in(code).await
    }

    /// Fetch the user's events, newest first
    pub async fn fetch_user_events(&self, calendar_id: String) -> AppResult<Vec<CalendarEvent>> {
        self.actor_handle.fetch_user_events(calendar_id).await
    }

    /// Shutdown the actor
    pub async fn shutdown(&self) -> AppResult<()> {
        self.actor_handle.shutdown().await
    }
}
