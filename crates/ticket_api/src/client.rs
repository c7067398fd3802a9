use std::time::Duration;

use crate::config::ClientConfig;
use crate::error::{FetchError, Result};
use crate::rate_limiter::RateLimiter;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Client as HttpClient, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

const MAX_ERROR_BODY_CHARS: usize = 512;

/// JSON-over-HTTP client shared by the Sayori and Jira adapters.
#[derive(Clone)]
pub struct ApiClient {
    http: HttpClient,
    config: ClientConfig,
    limiter: RateLimiter,
}

impl ApiClient {
    /// Builds the HTTP client with default headers and a pacing limiter.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = build_http_client(&config)?;
        let limiter = RateLimiter::new(config.cooldown);
        Ok(Self {
            http,
            config,
            limiter,
        })
    }

    /// GETs `path` relative to the configured base URL and decodes the body.
    ///
    /// Retryable failures are repeated up to `retry_max_attempts` times with
    /// exponential backoff; everything else is returned on first failure.
    pub async fn get_json<T>(&self, path: &str, query: &[(&str, &str)]) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let url = self.url_for(path);
        let mut attempt = 0_usize;
        loop {
            attempt = attempt.saturating_add(1);
            match self.get_once(&url, query).await {
                Ok(value) => return Ok(value),
                Err(err) if attempt < self.config.retry_max_attempts && err.is_retryable() => {
                    let delay = retry_delay(self.config.retry_base_delay, attempt);
                    warn!(%url, attempt, ?delay, error = %err, "retrying request");
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn get_once<T>(&self, url: &str, query: &[(&str, &str)]) -> Result<T>
    where
        T: DeserializeOwned,
    {
        self.limiter.wait_turn().await;
        debug!(%url, "GET");
        let mut request = self.http.get(url);
        if !query.is_empty() {
            request = request.query(query);
        }
        let response = request.send().await?;
        Self::parse_json(response).await
    }

    fn url_for(&self, path: &str) -> String {
        let mut base = self.config.api_root();
        base.push_str(path.trim_start_matches('/'));
        base
    }

    async fn parse_json<T>(response: Response) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let status = response.status();
        if status.is_success() {
            let body = response.text().await?;
            serde_json::from_str::<T>(&body).map_err(FetchError::from)
        } else if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let body = response.text().await.unwrap_or_default();
            Err(FetchError::Authentication(format!(
                "Access denied ({}) - {}",
                status,
                truncate_for_error(&body)
            )))
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(build_http_error(status, &body))
        }
    }
}

fn build_http_client(config: &ClientConfig) -> Result<HttpClient> {
    let mut headers = HeaderMap::new();

    if let Some(token) = &config.token {
        let auth_value = header_value(format!("{} {}", config.auth_scheme.as_str(), token.trim()))?;
        headers.insert(AUTHORIZATION, auth_value);
    }
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(USER_AGENT, header_value(config.user_agent.clone())?);

    HttpClient::builder()
        .default_headers(headers)
        .timeout(config.timeout)
        .connect_timeout(config.connect_timeout)
        .build()
        .map_err(|err| FetchError::Other(err.to_string()))
}

fn header_value(value: String) -> Result<HeaderValue> {
    HeaderValue::from_str(&value).map_err(|err| FetchError::Other(err.to_string()))
}

fn build_http_error(status: StatusCode, body: &str) -> FetchError {
    let code = extract_error_code(body);
    FetchError::http(status, code, truncate_for_error(body))
}

fn extract_error_code(body: &str) -> Option<String> {
    let value = serde_json::from_str::<Value>(body).ok()?;
    if let Some(code) = value.get("code").and_then(|c| c.as_str()) {
        return Some(code.to_string());
    }
    // Jira reports failures as {"errorMessages": [...]}.
    value
        .get("errorMessages")
        .and_then(|messages| messages.as_array())
        .and_then(|messages| messages.first())
        .and_then(|message| message.as_str())
        .map(|message| message.to_string())
}

fn truncate_for_error(body: &str) -> String {
    if body.chars().count() <= MAX_ERROR_BODY_CHARS {
        return body.to_string();
    }
    let mut truncated: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
    truncated.push('…');
    truncated
}

pub(crate) fn retry_delay(base: Duration, attempt: usize) -> Duration {
    let exponent = attempt.saturating_sub(1).min(10) as u32;
    base.saturating_mul(1_u32 << exponent)
}
