use crate::error::{env_error, AppResult};
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;

/// Default port for the local web interface
pub const DEFAULT_PORT: u16 = 3000;

/// Base URL for Google's REST APIs
pub const DEFAULT_API_BASE: &str = "https://www.googleapis.com";

/// Base URL for Google's OAuth token endpoint
pub const DEFAULT_OAUTH_BASE: &str = "https://oauth2.googleapis.com";

/// OAuth scopes requested during the interactive sign-in flow
pub const OAUTH_SCOPES: [&str; 2] = [
    "https://www.googleapis.com/auth/userinfo.email",
    "https://www.googleapis.com/auth/calendar.events.public.readonly",
];

/// Main configuration structure for the application
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Google OAuth client ID
    pub google_client_id: String,
    /// Google OAuth client secret
    pub google_client_secret: String,
    /// Port the local web interface listens on
    pub port: u16,
    /// Timezone used for all-day events and display formatting
    pub timezone: String,
    /// Whether to open the UI in the default browser on startup
    pub open_browser: bool,
    /// Base URL for Google REST APIs, overridable for tests
    pub google_api_base: String,
    /// Base URL for the OAuth token endpoint, overridable for tests
    pub google_oauth_base: String,
    /// Map of component names to their enabled status
    pub components: HashMap<String, bool>,
}

impl Config {
    /// Load configuration from environment and config file
    pub fn load() -> AppResult<Self> {
        // Load .env file if it exists
        dotenv().ok();

        // Required environment variables
        let google_client_id =
            env::var("GOOGLE_CLIENT_ID").map_err(|_| env_error("GOOGLE_CLIENT_ID"))?;
        let google_client_secret =
            env::var("GOOGLE_CLIENT_SECRET").map_err(|_| env_error("GOOGLE_CLIENT_SECRET"))?;

        // Parse numeric values
        let port = match env::var("PORT") {
            Ok(value) => value
                .parse::<u16>()
                .map_err(|_| env_error("Invalid PORT format"))?,
            Err(_) => DEFAULT_PORT,
        };

        // Default timezone
        let timezone = env::var("TIMEZONE").unwrap_or_else(|_| String::from("UTC"));

        // Browser auto-open can be disabled for headless runs
        let open_browser = env::var("OPEN_BROWSER")
            .map(|v| !matches!(v.as_str(), "0" | "false" | "no"))
            .unwrap_or(true);

        let google_api_base =
            env::var("GOOGLE_API_BASE").unwrap_or_else(|_| String::from(DEFAULT_API_BASE));
        let google_oauth_base =
            env::var("GOOGLE_OAUTH_BASE").unwrap_or_else(|_| String::from(DEFAULT_OAUTH_BASE));

        // Initialize default components
        let mut components = HashMap::new();
        components.insert("google_calendar".to_string(), true);

        // Load components configuration from file if it exists
        if let Ok(content) = fs::read_to_string("config/components.toml") {
            if let Ok(file_components) = toml::from_str::<HashMap<String, bool>>(&content) {
                // Merge with defaults
                for (key, value) in file_components {
                    components.insert(key, value);
                }
            }
        }

        Ok(Config {
            google_client_id,
            google_client_secret,
            port,
            timezone,
            open_browser,
            google_api_base,
            google_oauth_base,
            components,
        })
    }

    /// Redirect URI registered for the OAuth flow
    pub fn redirect_uri(&self) -> String {
        format!("http://localhost:{}/auth/callback", self.port)
    }

    /// Check if a component is enabled
    pub fn is_component_enabled(&self, name: &str) -> bool {
        *self.components.get(name).unwrap_or(&false)
    }
}
