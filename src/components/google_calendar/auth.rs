use crate::config::{Config, OAUTH_SCOPES};
use crate::error::{oauth_error, AppResult};
use reqwest::Client;
use serde_json::Value;
use url::Url;

/// Google's interactive consent screen
const CONSENT_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";

/// Build the consent URL the browser is redirected to for sign-in
pub fn consent_url(config: &Config, state: &str) -> AppResult<String> {
    let mut url = Url::parse(CONSENT_URL)
        .map_err(|e| oauth_error(&format!("Failed to parse consent URL: {}", e)))?;

    url.query_pairs_mut()
        .append_pair("client_id", &config.google_client_id)
        .append_pair("redirect_uri", &config.redirect_uri())
        .append_pair("response_type", "code")
        .append_pair("access_type", "offline")
        .append_pair("prompt", "consent")
        .append_pair("scope", &OAUTH_SCOPES.join(" "))
        .append_pair("state", state);

    Ok(url.into())
}

/// Fetch the signed-in user's email address from the userinfo endpoint
pub async fn fetch_user_email(
    client: &Client,
    api_base: &str,
    access_token: &str,
) -> AppResult<String> {
    let response = client
        .get(format!("{}/oauth2/v2/userinfo", api_base))
        .header("Authorization", format!("Bearer {}", access_token))
        .send()
        .await
        .map_err(|e| oauth_error(&format!("Failed to fetch user info: {}", e)))?;

    if !response.status().is_success() {
        let status = response.status();
        let error_body = response
            .text()
            .await
            .unwrap_or_else(|_| "Could not read error response".to_string());
        return Err(oauth_error(&format!(
            "Failed to fetch user info: HTTP {} - {}",
            status, error_body
        )));
    }

    let user_info: Value = response
        .json()
        .await
        .map_err(|e| oauth_error(&format!("Failed to parse user info response: {}", e)))?;

    user_info
        .get("email")
        .and_then(|e| e.as_str())
        .map(|e| e.to_string())
        .ok_or_else(|| oauth_error("No email in user info response"))
}
