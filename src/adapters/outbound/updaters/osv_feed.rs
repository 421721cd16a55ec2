use super::osv_schema::parse_osv_feed;
use crate::ports::outbound::{FetchOutcome, RawContent, Updater};
use crate::shared::error::{Stage, UpdateError};
use crate::shared::security::MAX_FILE_SIZE;
use crate::vulnerability_updates::domain::{Fingerprint, UpdateOperationSet, UpdaterName};
use async_trait::async_trait;
use reqwest::header::{ETAG, IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED};
use reqwest::{Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const ETAG_PREFIX: &str = "etag:";
const LAST_MODIFIED_PREFIX: &str = "last-modified:";
const CONTENT_PREFIX: &str = "content:";

/// Configuration fragment for the `osv` updater.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OsvFeedConfig {
    /// URL of a JSON array of OSV records.
    pub url: String,
    /// Keep only packages of this ecosystem (e.g. "PyPI").
    pub ecosystem: Option<String>,
    /// Extra attempts after a transient failure.
    pub max_retries: u32,
}

impl Default for OsvFeedConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            ecosystem: None,
            max_retries: 2,
        }
    }
}

/// OsvFeedUpdater adapter fetching an OSV feed over HTTP.
///
/// Uses conditional requests so an unchanged feed costs one round trip:
/// the fingerprint stores the `ETag` (or `Last-Modified`) of the last
/// response and is replayed as `If-None-Match` (or `If-Modified-Since`).
/// Servers without validators fall back to a content hash.
pub struct OsvFeedUpdater {
    name: UpdaterName,
    client: reqwest::Client,
    config: OsvFeedConfig,
    body_limit: u64,
}

impl OsvFeedUpdater {
    pub fn new(
        name: UpdaterName,
        client: reqwest::Client,
        config: OsvFeedConfig,
    ) -> Result<Self, UpdateError> {
        if config.url.is_empty() {
            return Err(UpdateError::config("`url` is required"));
        }
        if !(config.url.starts_with("https://") || config.url.starts_with("http://")) {
            return Err(UpdateError::config(format!(
                "`url` must be an http(s) URL, got '{}'",
                config.url
            )));
        }
        Ok(Self {
            name,
            client,
            config,
            body_limit: MAX_FILE_SIZE,
        })
    }

    /// Caps the response body size; larger feeds fail permanently.
    pub fn with_body_limit(mut self, limit: u64) -> Self {
        self.body_limit = limit;
        self
    }

    async fn fetch_once(&self, prior: &Fingerprint) -> Result<FetchOutcome, UpdateError> {
        let mut request = self.client.get(&self.config.url);
        if let Some(etag) = prior.as_str().strip_prefix(ETAG_PREFIX) {
            request = request.header(IF_NONE_MATCH, etag);
        } else if let Some(date) = prior.as_str().strip_prefix(LAST_MODIFIED_PREFIX) {
            request = request.header(IF_MODIFIED_SINCE, date);
        }

        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        if status == StatusCode::NOT_MODIFIED {
            return Ok(FetchOutcome::NotModified);
        }
        if !status.is_success() {
            return Err(status_error(status));
        }

        let validator = validator_fingerprint(&response);
        let bytes = self.read_body(response).await?;
        let fingerprint = validator.unwrap_or_else(|| content_fingerprint(&bytes));

        if !prior.is_empty() && &fingerprint == prior {
            return Ok(FetchOutcome::NotModified);
        }
        Ok(FetchOutcome::Modified(RawContent::new(bytes, fingerprint)))
    }

    async fn read_body(&self, mut response: Response) -> Result<Vec<u8>, UpdateError> {
        if let Some(length) = response.content_length() {
            if length > self.body_limit {
                return Err(body_too_large(length, self.body_limit));
            }
        }

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(transport_error)? {
            let total = (body.len() + chunk.len()) as u64;
            if total > self.body_limit {
                return Err(body_too_large(total, self.body_limit));
            }
            body.extend_from_slice(&chunk);
        }
        Ok(body)
    }
}

#[async_trait]
impl Updater for OsvFeedUpdater {
    fn name(&self) -> &UpdaterName {
        &self.name
    }

    async fn fetch(
        &self,
        prior: &Fingerprint,
        cancel: &CancellationToken,
    ) -> Result<FetchOutcome, UpdateError> {
        let mut attempt = 0;
        loop {
            match self.fetch_once(prior).await {
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    attempt += 1;
                    tracing::debug!(updater = %self.name, attempt, error = %e, "retrying fetch");
                    let backoff = Duration::from_millis(200 * u64::from(attempt));
                    tokio::select! {
                        _ = cancel.cancelled() => {
                            return Err(UpdateError::Cancelled { stage: Stage::Fetching });
                        }
                        _ = tokio::time::sleep(backoff) => {}
                    }
                }
                other => return other,
            }
        }
    }

    fn parse(&self, raw: RawContent) -> Result<UpdateOperationSet, UpdateError> {
        let (bytes, fingerprint) = raw.into_parts();
        parse_osv_feed(
            &bytes,
            &self.name,
            fingerprint,
            self.config.ecosystem.as_deref(),
        )
    }
}

fn transport_error(e: reqwest::Error) -> UpdateError {
    if e.is_builder() {
        UpdateError::permanent(format!("invalid request: {}", e))
    } else {
        UpdateError::transient(e.to_string())
    }
}

fn status_error(status: StatusCode) -> UpdateError {
    let reason = format!("upstream returned HTTP {}", status);
    if status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS
        || status.is_server_error()
    {
        UpdateError::transient(reason)
    } else {
        UpdateError::permanent(reason)
    }
}

fn validator_fingerprint(response: &Response) -> Option<Fingerprint> {
    let header = |name: reqwest::header::HeaderName| {
        response
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
    };
    header(ETAG)
        .map(|etag| Fingerprint::new(format!("{}{}", ETAG_PREFIX, etag)))
        .or_else(|| {
            header(LAST_MODIFIED)
                .map(|date| Fingerprint::new(format!("{}{}", LAST_MODIFIED_PREFIX, date)))
        })
}

fn body_too_large(size: u64, limit: u64) -> UpdateError {
    UpdateError::permanent(format!(
        "response body of at least {} bytes exceeds the {} byte limit",
        size, limit
    ))
}

/// Hex BLAKE3 digest of the body, stable across builds and toolchains.
fn content_fingerprint(bytes: &[u8]) -> Fingerprint {
    Fingerprint::new(format!(
        "{}{}-{}",
        CONTENT_PREFIX,
        blake3::hash(bytes).to_hex(),
        bytes.len()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn offline_client() -> reqwest::Client {
        reqwest::Client::builder()
            .no_proxy()
            .timeout(Duration::from_secs(2))
            .build()
            .unwrap()
    }

    fn updater(url: &str) -> Result<OsvFeedUpdater, UpdateError> {
        OsvFeedUpdater::new(
            UpdaterName::new("osv").unwrap(),
            reqwest::Client::new(),
            OsvFeedConfig {
                url: url.to_string(),
                ..OsvFeedConfig::default()
            },
        )
    }

    #[test]
    fn test_new_requires_url() {
        let err = updater("").err().unwrap();
        assert!(matches!(err, UpdateError::Config { .. }));
    }

    #[test]
    fn test_new_rejects_non_http_url() {
        let err = updater("ftp://example.com/feed.json").err().unwrap();
        assert!(err.to_string().contains("http(s)"));
    }

    #[test]
    fn test_status_error_classification() {
        assert!(status_error(StatusCode::SERVICE_UNAVAILABLE).is_retryable());
        assert!(status_error(StatusCode::TOO_MANY_REQUESTS).is_retryable());
        assert!(status_error(StatusCode::REQUEST_TIMEOUT).is_retryable());
        assert!(!status_error(StatusCode::NOT_FOUND).is_retryable());
        assert!(!status_error(StatusCode::FORBIDDEN).is_retryable());
    }

    #[test]
    fn test_content_fingerprint_is_stable() {
        let a = content_fingerprint(b"[]");
        let b = content_fingerprint(b"[]");
        let c = content_fingerprint(b"[ ]");
        assert_eq!(a, b);
        assert_ne!(a, c);

        let digest = a
            .as_str()
            .strip_prefix(CONTENT_PREFIX)
            .and_then(|rest| rest.strip_suffix("-2"))
            .unwrap();
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|ch| ch.is_ascii_hexdigit()));
    }

    fn served_updater(url: String, max_retries: u32) -> OsvFeedUpdater {
        OsvFeedUpdater::new(
            UpdaterName::new("osv").unwrap(),
            offline_client(),
            OsvFeedConfig {
                url,
                max_retries,
                ..OsvFeedConfig::default()
            },
        )
        .unwrap()
    }

    fn modified_fingerprint(outcome: FetchOutcome) -> Fingerprint {
        match outcome {
            FetchOutcome::Modified(raw) => raw.fingerprint().clone(),
            FetchOutcome::NotModified => panic!("expected a modified feed"),
        }
    }

    #[tokio::test]
    async fn test_etag_becomes_fingerprint() {
        let server = MockServer::start_async().await;
        let feed = server
            .mock_async(|when, then| {
                when.method(GET).path("/feed.json");
                then.status(200).header("ETag", "\"v1\"").body("[]");
            })
            .await;
        let updater = served_updater(server.url("/feed.json"), 0);

        let outcome = updater
            .fetch(&Fingerprint::empty(), &CancellationToken::new())
            .await
            .unwrap();

        feed.assert_async().await;
        assert_eq!(modified_fingerprint(outcome).as_str(), "etag:\"v1\"");
    }

    #[tokio::test]
    async fn test_prior_etag_sent_as_if_none_match() {
        let server = MockServer::start_async().await;
        let not_modified = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/feed.json")
                    .header("If-None-Match", "\"v1\"");
                then.status(304);
            })
            .await;
        let updater = served_updater(server.url("/feed.json"), 0);

        let outcome = updater
            .fetch(&Fingerprint::from("etag:\"v1\""), &CancellationToken::new())
            .await
            .unwrap();

        not_modified.assert_async().await;
        assert!(matches!(outcome, FetchOutcome::NotModified));
    }

    #[tokio::test]
    async fn test_last_modified_round_trip() {
        let date = "Wed, 21 Oct 2026 07:28:00 GMT";
        let server = MockServer::start_async().await;
        let mut feed = server
            .mock_async(|when, then| {
                when.method(GET).path("/feed.json");
                then.status(200).header("Last-Modified", date).body("[]");
            })
            .await;
        let updater = served_updater(server.url("/feed.json"), 0);
        let cancel = CancellationToken::new();

        let first = updater.fetch(&Fingerprint::empty(), &cancel).await.unwrap();
        let fingerprint = modified_fingerprint(first);
        assert_eq!(fingerprint.as_str(), format!("last-modified:{}", date));
        feed.delete_async().await;

        let not_modified = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/feed.json")
                    .header("If-Modified-Since", date);
                then.status(304);
            })
            .await;
        let second = updater.fetch(&fingerprint, &cancel).await.unwrap();

        not_modified.assert_async().await;
        assert!(matches!(second, FetchOutcome::NotModified));
    }

    #[tokio::test]
    async fn test_unchanged_body_without_validators_is_not_modified() {
        let server = MockServer::start_async().await;
        let feed = server
            .mock_async(|when, then| {
                when.method(GET).path("/feed.json");
                then.status(200).body("[]");
            })
            .await;
        let updater = served_updater(server.url("/feed.json"), 0);
        let cancel = CancellationToken::new();

        let first = updater.fetch(&Fingerprint::empty(), &cancel).await.unwrap();
        let fingerprint = modified_fingerprint(first);
        assert_eq!(fingerprint, content_fingerprint(b"[]"));

        let second = updater.fetch(&fingerprint, &cancel).await.unwrap();
        assert!(matches!(second, FetchOutcome::NotModified));
        feed.assert_hits_async(2).await;
    }

    #[tokio::test]
    async fn test_server_error_is_retried_until_success() {
        let server = MockServer::start_async().await;
        let mut unavailable = server
            .mock_async(|when, then| {
                when.method(GET).path("/feed.json");
                then.status(503);
            })
            .await;
        let updater = served_updater(server.url("/feed.json"), 3);
        let fetch = tokio::spawn(async move {
            updater
                .fetch(&Fingerprint::empty(), &CancellationToken::new())
                .await
        });

        // The first retry waits 200ms, long enough to swap the response.
        while unavailable.hits_async().await == 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        unavailable.delete_async().await;
        let available = server
            .mock_async(|when, then| {
                when.method(GET).path("/feed.json");
                then.status(200).header("ETag", "\"v2\"").body("[]");
            })
            .await;

        let outcome = fetch.await.unwrap().unwrap();
        available.assert_async().await;
        assert_eq!(modified_fingerprint(outcome).as_str(), "etag:\"v2\"");
    }

    #[tokio::test]
    async fn test_oversized_body_is_rejected() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/feed.json");
                then.status(200).body("x".repeat(64));
            })
            .await;
        let updater = served_updater(server.url("/feed.json"), 2).with_body_limit(16);

        let err = updater
            .fetch(&Fingerprint::empty(), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(!err.is_retryable());
        assert!(err.to_string().contains("16 byte limit"));
    }

    #[tokio::test]
    async fn test_body_at_limit_is_accepted() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/feed.json");
                then.status(200).body("[]");
            })
            .await;
        let updater = served_updater(server.url("/feed.json"), 0).with_body_limit(2);

        let outcome = updater
            .fetch(&Fingerprint::empty(), &CancellationToken::new())
            .await
            .unwrap();
        assert!(matches!(outcome, FetchOutcome::Modified(_)));
    }

    #[tokio::test]
    async fn test_connection_refused_is_transient() {
        // Port 9 (discard) on localhost is not expected to accept HTTP.
        let updater = OsvFeedUpdater::new(
            UpdaterName::new("osv").unwrap(),
            offline_client(),
            OsvFeedConfig {
                url: "http://127.0.0.1:9/feed.json".to_string(),
                max_retries: 0,
                ..OsvFeedConfig::default()
            },
        )
        .unwrap();

        let err = updater
            .fetch(&Fingerprint::empty(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_cancelled_during_backoff() {
        let updater = OsvFeedUpdater::new(
            UpdaterName::new("osv").unwrap(),
            offline_client(),
            OsvFeedConfig {
                url: "http://127.0.0.1:9/feed.json".to_string(),
                max_retries: 5,
                ..OsvFeedConfig::default()
            },
        )
        .unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = updater
            .fetch(&Fingerprint::empty(), &cancel)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            UpdateError::Cancelled {
                stage: Stage::Fetching
            }
        );
    }
}
