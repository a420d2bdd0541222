//! API client for the EPFPS backend.
//!
//! Every endpoint used by the client state layer lives here: configuration
//! lookup lists, sign-in, session verification and the user profile.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{header, Client};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use super::{ApiError, ApiResponse, RemoteResult, SessionVerification};
use crate::models::{ConfigurationSnapshot, DetailedUserInfo, SessionPayload};

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum number of retries for rate-limited (429) requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

const CONFIGURATION_PATH: &str = "configurations";
const SIGN_IN_PATH: &str = "auth/sign-in";
const SESSION_PATH: &str = "auth/session";
const CURRENT_USER_PATH: &str = "users/me";

#[derive(Debug, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// API client for the EPFPS backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    /// Create a new ApiClient with the given token, sharing the connection pool.
    pub fn with_token(&self, token: String) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            token: Some(token),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn auth_headers(&self) -> Result<header::HeaderMap, ApiError> {
        let mut headers = header::HeaderMap::new();
        if let Some(ref token) = self.token {
            let value = header::HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| ApiError::InvalidSessionData)?;
            headers.insert(header::AUTHORIZATION, value);
        }
        Ok(headers)
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    /// GET with exponential backoff on 429.
    async fn get_response(&self, url: &str) -> Result<reqwest::Response, ApiError> {
        let mut retries = 0;
        let mut backoff_ms = INITIAL_BACKOFF_MS;

        loop {
            let response = self
                .client
                .get(url)
                .headers(self.auth_headers()?)
                .send()
                .await?;

            if response.status() != reqwest::StatusCode::TOO_MANY_REQUESTS {
                return Self::check_response(response).await;
            }

            retries += 1;
            if retries > MAX_RATE_LIMIT_RETRIES {
                return Err(ApiError::RateLimited);
            }
            warn!(url, retry = retries, backoff_ms, "Rate limited, backing off");
            tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
            backoff_ms *= 2;
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        let response = self
            .get_response(&url)
            .await
            .with_context(|| format!("GET {} failed", url))?;
        response
            .json()
            .await
            .with_context(|| format!("Failed to parse JSON response from {}", url))
    }

    async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        let url = self.url(path);
        let response = self
            .client
            .post(&url)
            .headers(self.auth_headers()?)
            .json(body)
            .send()
            .await
            .with_context(|| format!("Failed to send POST request to {}", url))?;
        let response = Self::check_response(response).await?;
        response
            .json()
            .await
            .with_context(|| format!("Failed to parse JSON response from {}", url))
    }

    // ===== Endpoints =====

    /// Fetch every reference list in one envelope.
    ///
    /// The envelope is returned undecoded so the caller decides what a
    /// non-success code means for its cache.
    pub async fn fetch_configuration(&self) -> Result<ApiResponse<ConfigurationSnapshot>> {
        debug!("Fetching configuration");
        self.get(CONFIGURATION_PATH).await
    }

    /// Confirm with the server that the current token is still valid.
    pub async fn verify_session(&self) -> Result<String, ApiError> {
        if self.token.is_none() {
            return Err(ApiError::Unauthorized);
        }

        let response = self.get_response(&self.url(SESSION_PATH)).await?;
        let body: SessionVerification = response
            .json()
            .await
            .map_err(|_| ApiError::InvalidSessionData)?;
        body.into_token()
    }

    pub async fn sign_in(&self, credentials: &Credentials) -> Result<SessionPayload> {
        let response: ApiResponse<SessionPayload> = self
            .post(SIGN_IN_PATH, credentials)
            .await
            .context("Sign-in request failed")?;

        match response.into_result() {
            RemoteResult::Success(payload) => Ok(payload),
            RemoteResult::Failure(failure) => Err(anyhow::anyhow!("Sign-in rejected: {}", failure)),
        }
    }

    pub async fn fetch_user_details(&self) -> Result<DetailedUserInfo> {
        let response: ApiResponse<DetailedUserInfo> = self.get(CURRENT_USER_PATH).await?;
        match response.into_result() {
            RemoteResult::Success(info) => Ok(info),
            RemoteResult::Failure(failure) => {
                Err(anyhow::anyhow!("Failed to fetch user details: {}", failure))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = ApiClient::new("https://api.epfps.cm/v1/").unwrap();
        assert_eq!(client.base_url(), "https://api.epfps.cm/v1");
        assert_eq!(client.url(CONFIGURATION_PATH), "https://api.epfps.cm/v1/configurations");
    }

    #[test]
    fn test_auth_headers() {
        let client = ApiClient::new("https://api.epfps.cm").unwrap();
        assert!(client.auth_headers().unwrap().is_empty());

        let authed = client.with_token("abc".into());
        let headers = authed.auth_headers().unwrap();
        assert_eq!(headers[header::AUTHORIZATION], "Bearer abc");
    }

    #[test]
    fn test_token_with_newline_is_invalid_session() {
        let client = ApiClient::new("https://api.epfps.cm").unwrap().with_token("a\nb".into());
        assert!(matches!(client.auth_headers(), Err(ApiError::InvalidSessionData)));
    }

    #[tokio::test]
    async fn test_verify_without_token_is_unauthorized() {
        let client = ApiClient::new("https://api.epfps.cm").unwrap();
        assert!(matches!(client.verify_session().await, Err(ApiError::Unauthorized)));
    }
}
