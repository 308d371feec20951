use anyhow::Result;
use log::debug;

use crate::art::{ArtResolver, DEFAULT_API_URL};
use crate::http::{HttpClient, RetryPolicy};

/// User agent sent with every request unless overridden.
pub fn default_user_agent() -> String {
    format!("coverart/{}", env!("COVERART_VERSION"))
}

/// Settings for talking to the art archive.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub user_agent: String,
    pub retry: RetryPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self::new(None, None, RetryPolicy::default())
    }
}

impl Config {
    pub fn new(api_url: Option<String>, user_agent: Option<String>, retry: RetryPolicy) -> Self {
        Self {
            api_url: api_url.unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            user_agent: user_agent.unwrap_or_else(default_user_agent),
            retry,
        }
    }

    /// Builds a client that never follows redirects.
    pub fn http_client(&self) -> Result<HttpClient> {
        debug!(
            "Using {} (user agent {:?}, {} retries, {}ms backoff unit)",
            self.api_url,
            self.user_agent,
            self.retry.max_retries,
            self.retry.delay_unit.as_millis()
        );
        HttpClient::build(&self.user_agent, self.retry)
    }

    pub fn resolver(&self) -> Result<ArtResolver<HttpClient>> {
        Ok(ArtResolver::with_api_url(
            self.http_client()?,
            &self.api_url,
        ))
    }
}
