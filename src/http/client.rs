//! HTTP client with built-in retry logic.

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::debug;
use reqwest::header::{HeaderMap, LOCATION};
use reqwest::{Client, StatusCode, redirect};

use super::error::HttpError;
use super::retry::{RetryPolicy, with_retry};

/// Metadata of a 2xx response. The body is never read.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    /// Effective URL of the response that was actually received.
    pub url: String,
    pub headers: HeaderMap,
}

impl HttpResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    pub fn location(&self) -> Option<&str> {
        self.header(LOCATION.as_str())
    }
}

/// Issues a GET request and reports the outcome as a tagged result.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn get(&self, url: &str) -> Result<HttpResponse, HttpError>;
}

/// HTTP client that retries transient failures according to a [`RetryPolicy`].
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    policy: RetryPolicy,
}

impl HttpClient {
    /// Wraps an existing reqwest Client with the default retry policy.
    ///
    /// The client should have redirect-following disabled, otherwise 3xx
    /// responses are never observed.
    pub fn new(client: Client) -> Self {
        Self::with_policy(client, RetryPolicy::default())
    }

    pub fn with_policy(client: Client, policy: RetryPolicy) -> Self {
        Self { client, policy }
    }

    /// Builds a client that never follows redirects.
    pub fn build(user_agent: &str, policy: RetryPolicy) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .redirect(redirect::Policy::none())
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self::with_policy(client, policy))
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Performs a GET request, retrying 429 and 5xx responses.
    /// Any non-2xx status is returned as [`HttpError::Status`].
    #[tracing::instrument(skip(self))]
    pub async fn fetch(&self, url: &str) -> Result<HttpResponse, HttpError> {
        debug!("GET {}...", url);
        with_retry(&self.policy, "GET", || self.fetch_once(url)).await
    }

    /// Single attempt without retry.
    async fn fetch_once(&self, url: &str) -> Result<HttpResponse, HttpError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| {
                HttpError::Network(anyhow::Error::from(e).context("Failed to send request"))
            })?;

        let status = response.status();
        let url = response.url().to_string();
        let headers = response.headers().clone();

        if status.is_success() {
            Ok(HttpResponse {
                status,
                url,
                headers,
            })
        } else {
            Err(HttpError::Status {
                status,
                url,
                headers,
            })
        }
    }
}

#[async_trait]
impl Fetch for HttpClient {
    async fn get(&self, url: &str) -> Result<HttpResponse, HttpError> {
        self.fetch(url).await
    }
}
