use miette::{Diagnostic, Result};
use thiserror::Error;

/// Main error type for the application
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("Environment error: {0}")]
    #[diagnostic(code(calview::environment))]
    Environment(String),

    #[error("Configuration error: {0}")]
    #[diagnostic(code(calview::config))]
    Config(String),

    #[error("OAuth error: {0}")]
    #[diagnostic(code(calview::oauth))]
    OAuth(String),

    #[error("Google Calendar API error: {0}")]
    #[diagnostic(code(calview::google_calendar))]
    GoogleCalendar(String),

    #[error("Component error: {0}")]
    #[diagnostic(code(calview::component))]
    Component(String),

    #[error(transparent)]
    #[diagnostic(code(calview::io))]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    #[diagnostic(code(calview::serialization))]
    Serialization(String),

    #[error("Other error: {0}")]
    #[diagnostic(code(calview::other))]
    Other(String),
}

// Implement From for TOML serialization errors
impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

// Implement From for TOML deserialization errors
impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Type alias for Result with our Error type
pub type AppResult<T> = Result<T, Error>;

/// Helper to create environment errors
pub fn env_error(var: &str) -> Error {
    Error::Environment(format!("Missing environment variable: {}", var))
}

/// Helper to create configuration errors
#[allow(dead_code)]
pub fn config_error(message: &str) -> Error {
    Error::Config(message.to_string())
}

/// Helper to create OAuth errors
pub fn oauth_error(message: &str) -> Error {
    Error::OAuth(message.to_string())
}

/// Helper to create Google Calendar errors
pub fn google_calendar_error(message: &str) -> Error {
    Error::GoogleCalendar(message.to_string())
}

/// Helper to create component errors
pub fn component_error(message: &str) -> Error {
    Error::Component(message.to_string())
}

/// Helper to create other errors
#[allow(dead_code)]
pub fn other_error(message: &str) -> Error {
    Error::Other(message.to_string())
}
