//! Records client for the AirTable REST API.
//!
//! # Design
//! `RecordsClient` is the seam the repository depends on: three raw calls
//! that return JSON text or status + body and never interpret the payload.
//! `AirTableClient` implements it over reqwest. Each call is split into
//! `build_request`, which produces a plain `HttpRequest`, and `execute`,
//! which performs the single round-trip. No retries, no backoff.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::AirTableConfig;
use crate::error::ItemError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Raw access to AirTable tables. Paths are relative to the base, e.g.
/// `Items` or `Items/rec123`.
#[async_trait]
pub trait RecordsClient: Send + Sync {
    /// GET `path` and return the body. Non-success statuses are errors.
    async fn get_string(&self, path: &str) -> Result<String, ItemError>;

    /// POST a JSON `body` to `path`; the response is returned as-is.
    async fn post(&self, path: &str, body: String) -> Result<HttpResponse, ItemError>;

    /// PATCH a JSON `body` to `path`; the response is returned as-is.
    async fn patch(&self, path: &str, body: String) -> Result<HttpResponse, ItemError>;
}

/// reqwest-backed client bound to one AirTable base.
#[derive(Debug, Clone)]
pub struct AirTableClient {
    base_url: String,
    api_key: String,
    http: reqwest::Client,
}

impl AirTableClient {
    pub fn new(config: &AirTableConfig) -> Result<Self, ItemError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("items-core/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            base_url: config.base_url(),
            api_key: config.api_key.clone(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_request(&self, method: HttpMethod, path: &str, body: Option<String>) -> HttpRequest {
        let mut headers = vec![(
            "authorization".to_string(),
            format!("Bearer {}", self.api_key),
        )];
        if body.is_some() {
            headers.push(("content-type".to_string(), "application/json".to_string()));
        }
        HttpRequest {
            method,
            path: format!("{}/{}", self.base_url, path.trim_start_matches('/')),
            headers,
            body,
        }
    }

    pub async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ItemError> {
        debug!(method = ?request.method, path = %request.path, "sending AirTable request");

        let mut builder = match request.method {
            HttpMethod::Get => self.http.get(&request.path),
            HttpMethod::Post => self.http.post(&request.path),
            HttpMethod::Patch => self.http.patch(&request.path),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.text().await?;

        debug!(status, bytes = body.len(), "AirTable response received");
        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

#[async_trait]
impl RecordsClient for AirTableClient {
    async fn get_string(&self, path: &str) -> Result<String, ItemError> {
        let response = self.execute(self.build_request(HttpMethod::Get, path, None)).await?;
        if !response.is_success() {
            warn!(status = response.status, path, "AirTable GET failed");
            return Err(ItemError::Http {
                status: response.status,
                body: response.body,
            });
        }
        Ok(response.body)
    }

    async fn post(&self, path: &str, body: String) -> Result<HttpResponse, ItemError> {
        self.execute(self.build_request(HttpMethod::Post, path, Some(body)))
            .await
    }

    async fn patch(&self, path: &str, body: String) -> Result<HttpResponse, ItemError> {
        self.execute(self.build_request(HttpMethod::Patch, path, Some(body)))
            .await
    }
}
