use serde::Deserialize;

use crate::error::{GmailError, Result};

const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";

/// Exchanges stored refresh tokens for short-lived access tokens.
#[derive(Clone)]
pub struct GoogleTokenClient {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

impl GoogleTokenClient {
    pub fn new(
        http: reqwest::Client,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            http,
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    pub async fn refresh_access_token(&self, refresh_token: &str) -> Result<String> {
        let params = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ];

        let response = self.http.post(TOKEN_ENDPOINT).form(&params).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GmailError::TokenRefresh(format!("{status}: {body}")));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| GmailError::TokenRefresh(e.to_string()))?;
        Ok(token.access_token)
    }
}
