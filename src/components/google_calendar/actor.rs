use super::auth;
use super::models::CalendarEvent;
use super::time;
use super::token::TokenManager;
use crate::config::Config;
use crate::error::{google_calendar_error, AppResult};
use chrono_tz::Tz;
use reqwest::Client;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tracing::info;
use url::Url;

/// The Google Calendar actor that processes messages
pub struct GoogleCalendarActor {
    config: Arc<RwLock<Config>>,
    token_manager: TokenManager,
    client: Client,
    command_rx: mpsc::Receiver<GoogleCalendarCommand>,
}

/// Commands that can be sent to the Google Calendar actor
pub enum GoogleCalendarCommand {
    CompleteSignIn {
        code: String,
        respond_to: mpsc::Sender<AppResult<String>>,
    },
    FetchUserEvents {
        calendar_id: String,
        respond_to: mpsc::Sender<AppResult<Vec<CalendarEvent>>>,
    },
    Shutdown,
}

/// Handle for communicating with the Google Calendar actor
#[derive(Clone)]
pub struct GoogleCalendarActorHandle {
    command_tx: mpsc::Sender<GoogleCalendarCommand>,
}

impl GoogleCalendarActorHandle {
    /// Finish the sign-in flow: exchange the code and resolve the user email
    pub async fn complete_sign_in(&self, code: String) -> AppResult<String> {
        let (respond_to, mut response_rx) = mpsc::channel(1);
        self.command_tx
            .send(GoogleCalendarCommand::CompleteSignIn { code, respond_to })
            .await
            .map_err(|e| google_calendar_error(&format!("Actor mailbox error: {}", e)))?;

        response_rx
            .recv()
            .await
            .ok_or_else(|| google_calendar_error("Response channel closed"))?
    }

    /// Fetch the user's events, newest first
    pub async fn fetch_user_events(&self, calendar_id: String) -> AppResult<Vec<CalendarEvent>> {
        let (respond_to, mut response_rx) = mpsc::channel(1);
        self.command_tx
            .send(GoogleCalendarCommand::FetchUserEvents {
                calendar_id,
                respond_to,
            })
            .await
            .map_err(|e| google_calendar_error(&format!("Actor mailbox error: {}", e)))?;

        response_rx
            .recv()
            .await
            .ok_or_else(|| google_calendar_error("Response channel closed"))?
    }

    /// Shutdown the actor
    pub async fn shutdown(&self) -> AppResult<()> {
        let _ = self.command_tx.send(GoogleCalendarCommand::Shutdown).await;
        Ok(())
    }
}

impl GoogleCalendarActor {
    /// Create a new actor and return its handle
    pub fn new(config: Arc<RwLock<Config>>) -> (Self, GoogleCalendarActorHandle) {
        let (command_tx, command_rx) = mpsc::channel(32);
        let client = Client::new();

        let actor = Self {
            config: Arc::clone(&config),
            token_manager: TokenManager::new(config, client.clone()),
            client,
            command_rx,
        };

        let handle = GoogleCalendarActorHandle { command_tx };

        (actor, handle)
    }

    /// Start the actor's processing loop
    pub async fn run(&mut self) {
        info!("Google Calendar actor started");

        // Process commands
        while let Some(cmd) = self.command_rx.recv().await {
            match cmd {
                GoogleCalendarCommand::CompleteSignIn { code, respond_to } => {
                    let result = self.complete_sign_in(&code).await;
                    let _ = respond_to.send(result).await;
                }
                GoogleCalendarCommand::FetchUserEvents {
                    calendar_id,
                    respond_to,
                } => {
                    let result = Self::fetch_user_events(
                        Arc::clone(&self.config),
                        self.token_manager.clone(),
                        self.client.clone(),
                        &calendar_id,
                    )
                    .await;
                    let _ = respond_to.send(result).await;
                }
                GoogleCalendarCommand::Shutdown => {
                    info!("Google Calendar actor shutting down");
                    break;
                }
            }
        }

        info!("Google Calendar actor shut down");
    }

    /// Exchange the authorization code, then resolve the signed-in email
    async fn complete_sign_in(&self, code: &str) -> AppResult<String> {
        self.token_manager.exchange_code(code).await?;

        let access_token = self.token_manager.access_token().await?;
        let api_base = {
            let config_read = self.config.read().await;
            config_read.google_api_base.clone()
        };

        auth::fetch_user_email(&self.client, &api_base, &access_token).await
    }

    /// Fetch up to 100 single-event-expanded items from the user's calendar,
    /// sorted descending by effective start instant.
    pub async fn fetch_user_events(
        config: Arc<RwLock<Config>>,
        token_manager: TokenManager,
        client: Client,
        calendar_id: &str,
    ) -> AppResult<Vec<CalendarEvent>> {
        let (api_base, timezone) = {
            let config_read = config.read().await;
            (
                config_read.google_api_base.clone(),
                config_read.timezone.clone(),
            )
        };

        // Get authentication token
        let access_token = token_manager.access_token().await?;

        // Build URL with query parameters
        let url_str = format!("{}/calendar/v3/calendars/{}/events", api_base, calendar_id);
        let mut url = Url::parse(&url_str)
            .map_err(|e| google_calendar_error(&format!("Failed to parse URL: {}", e)))?;

        url.query_pairs_mut()
            .append_pair("maxResults", "100")
            .append_pair("singleEvents", "true")
            .append_pair("orderBy", "startTime");

        // Make API request
        let response = client
            .get(url)
            .header("Authorization", format!("Bearer {}", access_token))
            .send()
            .await
            .map_err(|e| google_calendar_error(&format!("Failed to fetch events: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            return Err(google_calendar_error(&format!(
                "Failed to fetch events: HTTP {} - {}",
                status, error_body
            )));
        }

        let response_data: Value = response
            .json()
            .await
            .map_err(|e| google_calendar_error(&format!("Failed to parse events response: {}", e)))?;

        // A response without a well-formed item list renders as an empty table
        let mut events = parse_event_items(&response_data);

        let tz: Tz = timezone.parse().unwrap_or(chrono_tz::UTC);
        time::sort_descending_by_start(&mut events, &tz);

        Ok(events)
    }
}

/// Convert a calendar list response into CalendarEvent values.
///
/// Missing or malformed `items` yield an empty list rather than an error.
pub fn parse_event_items(response_data: &Value) -> Vec<CalendarEvent> {
    let items = match response_data.get("items").and_then(|i| i.as_array()) {
        Some(items) => items,
        None => return Vec::new(),
    };

    items
        .iter()
        .map(|event| {
            let id = event
                .get("id")
                .and_then(|id| id.as_str())
                .unwrap_or("")
                .to_string();
            let summary = event
                .get("summary")
                .and_then(|s| s.as_str())
                .map(|s| s.to_string());
            let description = event
                .get("description")
                .and_then(|s| s.as_str())
                .map(|s| s.to_string());
            let location = event
                .get("location")
                .and_then(|s| s.as_str())
                .map(|s| s.to_string());
            let created = event
                .get("created")
                .and_then(|s| s.as_str())
                .map(|s| s.to_string());

            let start_date_time = event
                .get("start")
                .and_then(|start| start.get("dateTime"))
                .and_then(|dt| dt.as_str())
                .map(|s| s.to_string());
            let start_date = event
                .get("start")
                .and_then(|start| start.get("date"))
                .and_then(|d| d.as_str())
                .map(|s| s.to_string());

            let end_date_time = event
                .get("end")
                .and_then(|end| end.get("dateTime"))
                .and_then(|dt| dt.as_str())
                .map(|s| s.to_string());
            let end_date = event
                .get("end")
                .and_then(|end| end.get("date"))
                .and_then(|d| d.as_str())
                .map(|s| s.to_string());

            CalendarEvent {
                id,
                summary,
                description,
                location,
                created,
                start_date_time,
                start_date,
                end_date_time,
                end_date,
            }
        })
        .collect()
}
