//! API client for the Central Server REST API.
//!
//! Thin wrappers: attach the bearer token when one is present, make
//! exactly one attempt per call, and turn any non-2xx response into an
//! `ApiError` carrying the HTTP status. No retries and no backoff;
//! callers surface failures as notifications.

// Allow dead code: client constructors exercised by tests
#![allow(dead_code)]

use std::time::Duration;

use anyhow::Result;
use reqwest::{header, Client};
use serde::{de::DeserializeOwned, Deserialize};
use tracing::debug;

use crate::models::{CurrentUserResponse, Notification, NotificationsWrapper, ReportPage};

use super::ApiError;

/// HTTP request timeout in seconds.
/// 30s allows for slow API responses while failing fast enough for good UX.
const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[allow(dead_code)]
    token_type: Option<String>,
}

/// Client for the Central Server.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: trim_base_url(base_url.into()),
            token: None,
        })
    }

    /// Set the bearer token for authenticated requests
    pub fn set_token(&mut self, token: String) {
        self.token = Some(token);
    }

    pub fn clear_token(&mut self) {
        self.token = None;
    }

    /// Create a client with the given token, sharing the connection pool.
    pub fn with_token(&self, token: String) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            token: Some(token),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Authorization header when a token is held; absent otherwise.
    fn auth_headers(&self) -> Result<header::HeaderMap> {
        let mut headers = header::HeaderMap::new();
        if let Some(ref token) = self.token {
            headers.insert(
                header::AUTHORIZATION,
                header::HeaderValue::from_str(&format!("Bearer {}", token))?,
            );
        }
        Ok(headers)
    }

    /// Check if a response is successful, returning an error with the
    /// status and body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        let response = self
            .client
            .get(&url)
            .headers(self.auth_headers()?)
            .send()
            .await
            .map_err(ApiError::NetworkError)?;

        let response = Self::check_response(response).await?;
        let parsed = response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(format!("{}: {}", url, e)))?;
        Ok(parsed)
    }

    /// Exchange credentials for an access token.
    /// `POST /auth/token`, form-encoded password grant.
    pub async fn login(&self, username: &str, password: &str) -> Result<String> {
        let url = self.url("/auth/token");
        let response = self
            .client
            .post(&url)
            .form(&[
                ("grant_type", "password"),
                ("username", username),
                ("password", password),
            ])
            .send()
            .await
            .map_err(ApiError::NetworkError)?;

        let response = Self::check_response(response).await?;
        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(format!("token response: {}", e)))?;
        debug!("Token issued");
        Ok(token.access_token)
    }

    /// Fetch the current user's profile and permissions
    pub async fn fetch_current_user(&self) -> Result<CurrentUserResponse> {
        self.get("/users/me").await
    }

    /// Fetch the current user's avatar as raw bytes
    pub async fn fetch_avatar(&self) -> Result<Vec<u8>> {
        let url = self.url("/users/me/avatar");
        let response = self
            .client
            .get(&url)
            .headers(self.auth_headers()?)
            .send()
            .await
            .map_err(ApiError::NetworkError)?;

        let response = Self::check_response(response).await?;
        let bytes = response.bytes().await.map_err(ApiError::NetworkError)?;
        Ok(bytes.to_vec())
    }

    /// Fetch the notification list
    pub async fn fetch_notifications(&self) -> Result<Vec<Notification>> {
        let url = self.url("/notifications");
        let response = self
            .client
            .get(&url)
            .headers(self.auth_headers()?)
            .send()
            .await
            .map_err(ApiError::NetworkError)?;

        let response = Self::check_response(response).await?;
        let text = response.text().await.map_err(ApiError::NetworkError)?;
        debug!("Notifications response received");

        // Bare array or wrapped object, depending on deployment
        if let Ok(list) = serde_json::from_str::<Vec<Notification>>(&text) {
            return Ok(list);
        }
        let wrapper: NotificationsWrapper = serde_json::from_str(&text)
            .map_err(|e| ApiError::InvalidResponse(format!("notifications: {}", e)))?;
        Ok(wrapper.notifications)
    }

    /// Archive one notification
    pub async fn archive_notification(&self, id: i64) -> Result<()> {
        let url = self.url(&format!("/notifications/{}/archive", id));
        let response = self
            .client
            .post(&url)
            .headers(self.auth_headers()?)
            .send()
            .await
            .map_err(ApiError::NetworkError)?;

        Self::check_response(response).await?;
        debug!(id, "Notification archived");
        Ok(())
    }

    /// Fetch one page of monthly reports
    pub async fn fetch_monthly_reports(&self, offset: i64, limit: i64) -> Result<ReportPage> {
        let path = format!("/reports/monthly?offset={}&limit={}", offset, limit);
        let mut page: ReportPage = self.get(&path).await?;
        // Servers that omit echo fields still get coherent pagination
        if page.limit == 0 {
            page.limit = limit;
        }
        if page.offset == 0 && offset != 0 {
            page.offset = offset;
        }
        Ok(page)
    }
}

fn trim_base_url(mut base: String) -> String {
    while base.ends_with('/') {
        base.pop();
    }
    base
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trim_base_url() {
        assert_eq!(
            trim_base_url("https://canteen.example.org/".to_string()),
            "https://canteen.example.org"
        );
        assert_eq!(
            trim_base_url("https://canteen.example.org".to_string()),
            "https://canteen.example.org"
        );
    }

    #[test]
    fn test_auth_header_absent_without_token() {
        let client = ApiClient::new("https://canteen.example.org").unwrap();
        let headers = client.auth_headers().unwrap();
        assert!(headers.get(header::AUTHORIZATION).is_none());
    }

    #[test]
    fn test_auth_header_present_with_token() {
        let client = ApiClient::new("https://canteen.example.org")
            .unwrap()
            .with_token("abc123".to_string());
        let headers = client.auth_headers().unwrap();
        assert_eq!(
            headers.get(header::AUTHORIZATION).unwrap(),
            "Bearer abc123"
        );
    }

    #[test]
    fn test_parse_token_response() {
        let json = r#"{"access_token": "abc123", "token_type": "bearer"}"#;
        let token: TokenResponse = serde_json::from_str(json).expect("Failed to parse token");
        assert_eq!(token.access_token, "abc123");
    }
}
