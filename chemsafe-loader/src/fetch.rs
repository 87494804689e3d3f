//! Fetch adapter: remote content for a URI
//!
//! The primary transport is a regular client sending the catalog locale
//! cookie. When it errors or yields an empty body, a second attempt streams
//! the body through a plain client with an English `Accept-Language`
//! header. There is no retry beyond that single fallback.

use crate::error::{LoaderError, LoaderResult};
use async_trait::async_trait;
use futures::StreamExt;
use governor::{Quota, RateLimiter};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE, COOKIE};
use reqwest::Client;
use std::num::NonZeroU32;
use std::time::Duration;
use tracing::{debug, warn};

const USER_AGENT: &str = concat!("chemsafe/", env!("CARGO_PKG_VERSION"));

/// Source of raw page content
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, uri: &str) -> LoaderResult<String>;
}

/// Make a scraped link absolute against the source's base URL
///
/// Links already under the base pass through, site-relative links are
/// prefixed, anything else is rejected.
pub fn normalize_uri(uri: &str, base_url: &str) -> LoaderResult<String> {
    let base = base_url.trim_end_matches('/');
    if is_under(uri, base) {
        Ok(uri.to_string())
    } else if uri.starts_with('/') {
        Ok(format!("{}{}", base, uri))
    } else {
        Err(LoaderError::UnnormalizableUri {
            uri: uri.to_string(),
            base: base_url.to_string(),
        })
    }
}

/// `uri` is the base itself or continues it with a path or query
fn is_under(uri: &str, base: &str) -> bool {
    if base.is_empty() {
        return false;
    }
    match uri.strip_prefix(base) {
        Some(rest) => rest.is_empty() || rest.starts_with('/') || rest.starts_with('?'),
        None => false,
    }
}

/// Transport settings for [`HttpFetcher`]
#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub locale_cookie: String,
    pub timeout: Duration,
    pub requests_per_second: u32,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            locale_cookie: "SialLocaleDef=CountryCode~CH|WebLang~-3|".to_string(),
            timeout: Duration::from_secs(30),
            requests_per_second: 2,
        }
    }
}

/// reqwest-based fetcher with a streaming fallback
pub struct HttpFetcher {
    primary: Client,
    fallback: Client,
    rate_limiter: RateLimiter<
        governor::state::direct::NotKeyed,
        governor::state::InMemoryState,
        governor::clock::DefaultClock,
    >,
}

impl HttpFetcher {
    pub fn new(settings: &FetchSettings) -> LoaderResult<Self> {
        let mut primary_headers = HeaderMap::new();
        primary_headers.insert(
            COOKIE,
            HeaderValue::from_str(&settings.locale_cookie)
                .map_err(|e| LoaderError::Parse(format!("Invalid locale cookie: {}", e)))?,
        );
        let primary = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(settings.timeout)
            .default_headers(primary_headers)
            .build()?;

        let mut fallback_headers = HeaderMap::new();
        fallback_headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en"));
        let fallback = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(settings.timeout)
            .default_headers(fallback_headers)
            .build()?;

        let per_second = NonZeroU32::new(settings.requests_per_second).unwrap_or(NonZeroU32::MIN);
        let rate_limiter = RateLimiter::direct(Quota::per_second(per_second));

        Ok(Self {
            primary,
            fallback,
            rate_limiter,
        })
    }

    async fn fetch_primary(&self, uri: &str) -> Result<String, String> {
        let response = self.primary.get(uri).send().await.map_err(|e| e.to_string())?;
        let status = response.status();
        if !status.is_success() {
            return Err(format!("HTTP {}", status.as_u16()));
        }
        let body = response.text().await.map_err(|e| e.to_string())?;
        if body.trim().is_empty() {
            return Err("empty body".to_string());
        }
        Ok(body)
    }

    async fn fetch_fallback(&self, uri: &str) -> Result<String, String> {
        let response = self.fallback.get(uri).send().await.map_err(|e| e.to_string())?;
        let status = response.status();
        if !status.is_success() {
            return Err(format!("HTTP {}", status.as_u16()));
        }

        let mut body = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            body.extend_from_slice(&chunk.map_err(|e| e.to_string())?);
        }

        let body = String::from_utf8_lossy(&body).into_owned();
        if body.trim().is_empty() {
            return Err("empty body".to_string());
        }
        Ok(body)
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, uri: &str) -> LoaderResult<String> {
        self.rate_limiter.until_ready().await;
        debug!(uri = %uri, "Fetching");

        let primary_error = match self.fetch_primary(uri).await {
            Ok(body) => {
                debug!(uri = %uri, bytes = body.len(), "Fetched via primary transport");
                return Ok(body);
            }
            Err(e) => e,
        };
        warn!(uri = %uri, error = %primary_error, "Primary transport failed, trying fallback");

        self.rate_limiter.until_ready().await;
        match self.fetch_fallback(uri).await {
            Ok(body) => {
                debug!(uri = %uri, bytes = body.len(), "Fetched via fallback transport");
                Ok(body)
            }
            Err(fallback_error) => Err(LoaderError::Fetch {
                uri: uri.to_string(),
                reason: format!("primary: {}; fallback: {}", primary_error, fallback_error),
            }),
        }
    }
}
