use crate::config::Config;
use crate::error::{oauth_error, AppResult};
use chrono::Utc;
use reqwest::Client;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Manages the OAuth token for the signed-in user.
///
/// The token lives in process memory only and is dropped on exit; nothing is
/// ever written to disk.
#[derive(Clone)]
pub struct TokenManager {
    config: Arc<RwLock<Config>>,
    client: Client,
    token: Arc<RwLock<Option<Value>>>,
}

impl TokenManager {
    pub fn new(config: Arc<RwLock<Config>>, client: Client) -> Self {
        Self {
            config,
            client,
            token: Arc::new(RwLock::new(None)),
        }
    }

    /// Exchange an authorization code for tokens and store them
    pub async fn exchange_code(&self, code: &str) -> AppResult<()> {
        let (client_id, client_secret, redirect_uri, oauth_base) = {
            let config_read = self.config.read().await;
            (
                config_read.google_client_id.clone(),
                config_read.google_client_secret.clone(),
                config_read.redirect_uri(),
                config_read.google_oauth_base.clone(),
            )
        };

        let params = [
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("code", code.to_string()),
            ("redirect_uri", redirect_uri),
            ("grant_type", "authorization_code".to_string()),
        ];

        let response = self
            .client
            .post(format!("{}/token", oauth_base))
            .form(&params)
            .send()
            .await
            .map_err(|e| oauth_error(&format!("Failed to exchange authorization code: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            return Err(oauth_error(&format!(
                "Failed to exchange authorization code: HTTP {} - {}",
                status, error_body
            )));
        }

        let token_data: Value = response
            .json()
            .await
            .map_err(|e| oauth_error(&format!("Failed to parse token response: {}", e)))?;

        if token_data.get("access_token").and_then(|t| t.as_str()).is_none() {
            return Err(oauth_error("Token response missing 'access_token' field"));
        }

        self.store(token_data).await;
        Ok(())
    }

    /// Get a valid access token, refreshing it first when expired
    pub async fn access_token(&self) -> AppResult<String> {
        let token = {
            let token_read = self.token.read().await;
            token_read
                .clone()
                .ok_or_else(|| oauth_error("No token available; sign-in has not completed"))?
        };

        let expires_at = token.get("expires_at").and_then(|v| v.as_i64()).unwrap_or(0);
        let token = if expires_at > Utc::now().timestamp() {
            token
        } else {
            // Token is expired, refresh it
            self.refresh(&token).await?
        };

        token
            .get("access_token")
            .and_then(|t| t.as_str())
            .map(|t| t.to_string())
            .ok_or_else(|| oauth_error("No access token available"))
    }

    /// Refresh an expired token
    async fn refresh(&self, token: &Value) -> AppResult<Value> {
        let refresh_token = token
            .get("refresh_token")
            .and_then(|v| v.as_str())
            .ok_or_else(|| oauth_error("No refresh token in token data"))?;

        let (client_id, client_secret, oauth_base) = {
            let config_read = self.config.read().await;
            (
                config_read.google_client_id.clone(),
                config_read.google_client_secret.clone(),
                config_read.google_oauth_base.clone(),
            )
        };

        let params = [
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("refresh_token", refresh_token.to_string()),
            ("grant_type", "refresh_token".to_string()),
        ];

        let response = self
            .client
            .post(format!("{}/token", oauth_base))
            .form(&params)
            .send()
            .await
            .map_err(|e| oauth_error(&format!("Failed to refresh token: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            return Err(oauth_error(&format!(
                "Failed to refresh token: HTTP {} - {}",
                status, error_body
            )));
        }

        let new_token: Value = response
            .json()
            .await
            .map_err(|e| oauth_error(&format!("Failed to parse token response: {}", e)))?;

        let access_token = new_token
            .get("access_token")
            .cloned()
            .ok_or_else(|| oauth_error("Token response missing 'access_token' field"))?;

        // Combine the new access token with the existing refresh token
        let mut token_data = serde_json::Map::new();
        token_data.insert("access_token".to_string(), access_token);
        token_data.insert("refresh_token".to_string(), json!(refresh_token));

        // Calculate expiry
        let expires_in = new_token
            .get("expires_in")
            .and_then(|v| v.as_i64())
            .unwrap_or(3600);
        let expires_at = Utc::now().timestamp() + expires_in;
        token_data.insert("expires_at".to_string(), json!(expires_at));

        let token_json = Value::Object(token_data);
        *self.token.write().await = Some(token_json.clone());

        Ok(token_json)
    }

    /// Store token data, stamping an absolute expiry timestamp
    pub async fn set_token(&self, token_json: Value) {
        self.store(token_json).await;
    }

    async fn store(&self, mut token_data: Value) {
        if let Some(obj) = token_data.as_object_mut() {
            if obj.get("expires_at").is_none() {
                let expires_in = obj.get("expires_in").and_then(|v| v.as_i64()).unwrap_or(3600);
                let expires_at = Utc::now().timestamp() + expires_in;
                obj.insert("expires_at".to_string(), json!(expires_at));
            }
        }

        *self.token.write().await = Some(token_data);
    }
}
