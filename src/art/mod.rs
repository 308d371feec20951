//! Front-cover lookup against the Cover Art Archive.
//!
//! A lookup never fails from the caller's point of view: it produces a URL or
//! nothing, logging why when it is nothing.

mod endpoint;

use log::{debug, error};
use reqwest::StatusCode;

use crate::config::Config;
use crate::http::{Fetch, HttpError, HttpResponse, describe};

pub use endpoint::{DEFAULT_API_URL, front_cover_url};

/// Outcome of a single lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The archive served the image directly; holds the effective URL.
    Found(String),
    /// The archive redirected to the image; holds the `location` target (not fetched).
    Redirect(String),
    /// No art exists for this album.
    NotFound,
    /// A success status other than 200 or 307.
    Unhandled(StatusCode),
    /// Any other failure, normalized to a message.
    Failed(String),
}

impl Resolution {
    pub fn into_url(self) -> Option<String> {
        match self {
            Resolution::Found(url) | Resolution::Redirect(url) => Some(url),
            Resolution::NotFound | Resolution::Unhandled(_) | Resolution::Failed(_) => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Found(_) | Resolution::Redirect(_))
    }
}

/// Resolves album ids to front-cover image URLs.
pub struct ArtResolver<F: Fetch> {
    fetcher: F,
    api_url: String,
}

impl<F: Fetch> ArtResolver<F> {
    /// Creates a resolver against the public archive.
    pub fn new(fetcher: F) -> Self {
        Self::with_api_url(fetcher, DEFAULT_API_URL)
    }

    pub fn with_api_url(fetcher: F, api_url: &str) -> Self {
        Self {
            fetcher,
            api_url: api_url.to_string(),
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Looks up the front cover and classifies the outcome without logging.
    #[tracing::instrument(skip(self))]
    pub async fn resolve(&self, album_id: &str) -> Resolution {
        let endpoint = front_cover_url(&self.api_url, album_id);
        debug!("Looking up front cover from {}...", endpoint);

        match self.fetcher.get(&endpoint).await {
            Ok(response) => classify_response(&response),
            Err(err) => classify_error(&err),
        }
    }

    /// Returns the front-cover URL, or `None` when there is no art or the
    /// lookup failed. The two cases are only distinguished in the log.
    pub async fn album_art(&self, album_id: &str) -> Option<String> {
        let resolution = self.resolve(album_id).await;

        match &resolution {
            Resolution::NotFound => error!("{}", not_found_message(album_id)),
            Resolution::Failed(message) => error!("Error retrieving cover art: {}", message),
            Resolution::Unhandled(status) => {
                debug!("Unhandled status {} for album ID: {}", status, album_id)
            }
            Resolution::Found(_) | Resolution::Redirect(_) => {}
        }

        resolution.into_url()
    }
}

/// One-shot lookup against the public archive with the default configuration.
pub async fn get_album_art(album_id: &str) -> Option<String> {
    match Config::default().resolver() {
        Ok(resolver) => resolver.album_art(album_id).await,
        Err(e) => {
            error!("Error retrieving cover art: {:#}", e);
            None
        }
    }
}

fn not_found_message(album_id: &str) -> String {
    format!("No album art found for album ID: {}", album_id)
}

fn classify_response(response: &HttpResponse) -> Resolution {
    match response.status {
        StatusCode::OK => Resolution::Found(response.url.clone()),
        StatusCode::TEMPORARY_REDIRECT => redirect_to(response.location()),
        status => Resolution::Unhandled(status),
    }
}

fn classify_error(err: &HttpError) -> Resolution {
    match err {
        HttpError::Status {
            status: StatusCode::TEMPORARY_REDIRECT,
            ..
        } => redirect_to(err.location()),
        HttpError::Status {
            status: StatusCode::NOT_FOUND,
            ..
        } => Resolution::NotFound,
        HttpError::Status { .. } | HttpError::Network(_) => Resolution::Failed(describe(err)),
    }
}

fn redirect_to(location: Option<&str>) -> Resolution {
    match location {
        Some(location) if !location.is_empty() => Resolution::Redirect(location.to_string()),
        _ => Resolution::Failed("redirect without a usable location header".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{HttpClient, MockFetch, RetryPolicy};
    use mockall::predicate::eq;
    use reqwest::header::{HeaderMap, HeaderValue, LOCATION};
    use std::time::Duration;

    const ALBUM_ID: &str = "76df3287-6cda-33eb-8e9a-044b5e15ffdd";
    const ENDPOINT: &str =
        "http://coverartarchive.org/release/76df3287-6cda-33eb-8e9a-044b5e15ffdd/front";
    const IMAGE: &str = "http://archive.org/download/mbid-76df3287/front.jpg";

    fn location_headers(location: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(LOCATION, HeaderValue::from_str(location).unwrap());
        headers
    }

    fn response(status: u16, headers: HeaderMap) -> HttpResponse {
        HttpResponse {
            status: StatusCode::from_u16(status).unwrap(),
            url: ENDPOINT.to_string(),
            headers,
        }
    }

    fn status_error(status: u16, headers: HeaderMap) -> HttpError {
        HttpError::Status {
            status: StatusCode::from_u16(status).unwrap(),
            url: ENDPOINT.to_string(),
            headers,
        }
    }

    fn resolver_returning<R>(result: R) -> ArtResolver<MockFetch>
    where
        R: Fn() -> Result<HttpResponse, HttpError> + Send + 'static,
    {
        let mut fetcher = MockFetch::new();
        fetcher
            .expect_get()
            .with(eq(ENDPOINT))
            .times(1)
            .returning(move |_| result());
        ArtResolver::new(fetcher)
    }

    fn fast_client() -> HttpClient {
        HttpClient::build(
            "coverart-test",
            RetryPolicy::linear(3, Duration::from_millis(1)),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_ok_returns_effective_url() {
        let resolver = resolver_returning(|| Ok(response(200, HeaderMap::new())));
        assert_eq!(
            resolver.resolve(ALBUM_ID).await,
            Resolution::Found(ENDPOINT.to_string())
        );
    }

    #[tokio::test]
    async fn test_redirect_on_success_path() {
        let resolver = resolver_returning(|| Ok(response(307, location_headers(IMAGE))));
        assert_eq!(resolver.album_art(ALBUM_ID).await, Some(IMAGE.to_string()));
    }

    #[tokio::test]
    async fn test_redirect_on_error_path() {
        let resolver = resolver_returning(|| Err(status_error(307, location_headers(IMAGE))));
        assert_eq!(
            resolver.resolve(ALBUM_ID).await,
            Resolution::Redirect(IMAGE.to_string())
        );
    }

    #[test_log::test(tokio::test)]
    async fn test_not_found() {
        let resolver = resolver_returning(|| Err(status_error(404, HeaderMap::new())));
        assert_eq!(resolver.album_art(ALBUM_ID).await, None);
    }

    #[tokio::test]
    async fn test_not_found_classification() {
        let resolver = resolver_returning(|| Err(status_error(404, HeaderMap::new())));
        assert_eq!(resolver.resolve(ALBUM_ID).await, Resolution::NotFound);
    }

    #[test]
    fn test_not_found_message_names_album() {
        assert!(not_found_message(ALBUM_ID).contains(ALBUM_ID));
    }

    #[tokio::test]
    async fn test_unhandled_success_status() {
        let resolver = resolver_returning(|| Ok(response(204, HeaderMap::new())));
        assert_eq!(
            resolver.resolve(ALBUM_ID).await,
            Resolution::Unhandled(StatusCode::NO_CONTENT)
        );

        let resolver = resolver_returning(|| Ok(response(204, HeaderMap::new())));
        assert_eq!(resolver.album_art(ALBUM_ID).await, None);
    }

    #[tokio::test]
    async fn test_other_status_error_is_normalized() {
        let resolver = resolver_returning(|| Err(status_error(503, HeaderMap::new())));
        match resolver.resolve(ALBUM_ID).await {
            Resolution::Failed(message) => {
                assert!(message.contains("503"));
                assert!(message.contains(ENDPOINT));
            }
            other => panic!("Expected Failed, got {:?}", other),
        }
    }

    #[test_log::test(tokio::test)]
    async fn test_network_failure_resolves_to_none() {
        let resolver = resolver_returning(|| {
            Err(HttpError::Network(
                anyhow::anyhow!("connection refused").context("Failed to send request"),
            ))
        });
        assert_eq!(resolver.album_art(ALBUM_ID).await, None);
    }

    #[tokio::test]
    async fn test_network_failure_message() {
        let resolver = resolver_returning(|| {
            Err(HttpError::Network(anyhow::anyhow!("dns lookup failed")))
        });
        assert_eq!(
            resolver.resolve(ALBUM_ID).await,
            Resolution::Failed("dns lookup failed".to_string())
        );
    }

    #[tokio::test]
    async fn test_redirect_without_location() {
        let resolver = resolver_returning(|| Err(status_error(307, HeaderMap::new())));
        let resolution = resolver.resolve(ALBUM_ID).await;
        assert!(matches!(resolution, Resolution::Failed(_)));
        assert_eq!(resolution.into_url(), None);
    }

    #[tokio::test]
    async fn test_other_redirect_statuses_are_failures() {
        let resolver = resolver_returning(|| Err(status_error(302, location_headers(IMAGE))));
        assert!(matches!(
            resolver.resolve(ALBUM_ID).await,
            Resolution::Failed(_)
        ));
    }

    #[tokio::test]
    async fn test_lookup_is_idempotent() {
        let mut fetcher = MockFetch::new();
        fetcher
            .expect_get()
            .times(2)
            .returning(|_| Err(status_error(307, location_headers(IMAGE))));
        let resolver = ArtResolver::new(fetcher);

        let first = resolver.album_art(ALBUM_ID).await;
        let second = resolver.album_art(ALBUM_ID).await;
        assert_eq!(first, second);
        assert_eq!(first, Some(IMAGE.to_string()));
    }

    #[test]
    fn test_resolution_into_url() {
        assert_eq!(
            Resolution::Found(IMAGE.to_string()).into_url(),
            Some(IMAGE.to_string())
        );
        assert_eq!(
            Resolution::Redirect(IMAGE.to_string()).into_url(),
            Some(IMAGE.to_string())
        );
        assert_eq!(Resolution::NotFound.into_url(), None);
        assert_eq!(Resolution::Unhandled(StatusCode::ACCEPTED).into_url(), None);
        assert_eq!(Resolution::Failed("x".to_string()).into_url(), None);

        assert!(Resolution::Redirect(IMAGE.to_string()).is_resolved());
        assert!(!Resolution::NotFound.is_resolved());
    }

    #[tokio::test]
    async fn test_resolver_against_server_redirect() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/release/abc/front")
            .with_status(307)
            .with_header("location", IMAGE)
            .create_async()
            .await;

        let resolver = ArtResolver::with_api_url(fast_client(), &server.url());
        assert_eq!(resolver.album_art("abc").await, Some(IMAGE.to_string()));
    }

    #[tokio::test]
    async fn test_resolver_against_server_ok() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/release/abc/front")
            .with_status(200)
            .with_body("jpeg")
            .create_async()
            .await;

        let resolver = ArtResolver::with_api_url(fast_client(), &server.url());
        assert_eq!(
            resolver.album_art("abc").await,
            Some(format!("{}/release/abc/front", server.url()))
        );
    }

    #[tokio::test]
    async fn test_resolver_recovers_after_three_server_errors() {
        let mut server = mockito::Server::new_async().await;
        let failing = server
            .mock("GET", "/release/abc/front")
            .with_status(500)
            .expect(3)
            .create_async()
            .await;
        let redirect = server
            .mock("GET", "/release/abc/front")
            .with_status(307)
            .with_header("location", IMAGE)
            .expect(1)
            .create_async()
            .await;

        let resolver = ArtResolver::with_api_url(fast_client(), &server.url());
        assert_eq!(resolver.album_art("abc").await, Some(IMAGE.to_string()));

        failing.assert_async().await;
        redirect.assert_async().await;
    }

    #[tokio::test]
    async fn test_resolver_gives_up_after_four_server_errors() {
        let mut server = mockito::Server::new_async().await;
        let failing = server
            .mock("GET", "/release/abc/front")
            .with_status(500)
            .expect(4)
            .create_async()
            .await;

        let resolver = ArtResolver::with_api_url(fast_client(), &server.url());
        match resolver.resolve("abc").await {
            Resolution::Failed(message) => assert!(message.contains("500")),
            other => panic!("Expected Failed, got {:?}", other),
        }

        failing.assert_async().await;
    }

    #[tokio::test]
    async fn test_resolver_not_found_against_server() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/release/missing/front")
            .with_status(404)
            .expect(1)
            .create_async()
            .await;

        let resolver = ArtResolver::with_api_url(fast_client(), &server.url());
        assert_eq!(resolver.resolve("missing").await, Resolution::NotFound);

        mock.assert_async().await;
    }
}
