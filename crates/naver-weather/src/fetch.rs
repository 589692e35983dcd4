//! Rate-limited, retrying HTML fetch.
//!
//! `Fetcher` talks to the network through `HttpTransport` so the retry and
//! pacing logic can be exercised against a scripted mock.

use crate::error::{error_chain, FetchError};
use crate::rate_limit::RateLimiter;
use std::sync::Arc;
use std::time::Duration;

/// Naver search endpoint; the query is appended percent-encoded.
pub const SEARCH_URL: &str = "https://search.naver.com/search.naver?query=";

/// Suffix appended to every query ("<region> weather").
pub const WEATHER_QUERY_SUFFIX: &str = "+날씨";

/// Per-attempt HTTP timeout.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(6);

/// Attempts per fetch before giving up.
pub const MAX_RETRIES: u32 = 3;

/// First backoff delay; doubles on each further attempt.
pub const BACKOFF_BASE: Duration = Duration::from_millis(800);

/// Desktop browser User-Agent. The search page serves a reduced layout (or
/// rejects the request) for non-browser clients.
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

pub const ACCEPT_LANGUAGE: &str = "ko-KR,ko;q=0.9";

/// Longest slice of an error body kept in a `FetchError::Status`.
const ERROR_BODY_LIMIT: usize = 200;

/// Status and body of one HTTP GET.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// Abstraction over the HTTP client.
///
/// `Fetcher` calls this trait instead of `reqwest` directly, which makes the
/// retry loop testable with mock implementations.
pub trait HttpTransport: Send + Sync + 'static {
    fn get(
        &self,
        url: &str,
    ) -> impl std::future::Future<Output = Result<HttpResponse, FetchError>> + Send;
}

impl<T: HttpTransport> HttpTransport for Arc<T> {
    async fn get(&self, url: &str) -> Result<HttpResponse, FetchError> {
        self.as_ref().get(url).await
    }
}

// ── ReqwestTransport: real implementation ────────────────────────────────

/// HTTP transport backed by a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Build a client with browser-like headers and the fixed request timeout.
    pub fn new() -> Result<Self, FetchError> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT_LANGUAGE,
            reqwest::header::HeaderValue::from_static(ACCEPT_LANGUAGE),
        );

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()?;

        Ok(Self { client })
    }
}

impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &str) -> Result<HttpResponse, FetchError> {
        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(HttpResponse { status, body })
    }
}

/// Search URL for a region's weather widget.
pub fn search_url(region: &str) -> String {
    format!("{}{}{}", SEARCH_URL, urlencoding::encode(region), WEATHER_QUERY_SUFFIX)
}

// ── Fetcher ──────────────────────────────────────────────────────────────

/// Fetches pages through a shared `RateLimiter`, retrying with exponential backoff.
pub struct Fetcher<T: HttpTransport> {
    transport: T,
    limiter: Arc<RateLimiter>,
    max_retries: u32,
    backoff_base: Duration,
}

impl<T: HttpTransport> Fetcher<T> {
    pub fn new(transport: T, limiter: Arc<RateLimiter>) -> Self {
        Self {
            transport,
            limiter,
            max_retries: MAX_RETRIES,
            backoff_base: BACKOFF_BASE,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// Backoff slept after the given (1-based) failed attempt.
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        self.backoff_base * 2u32.saturating_pow(attempt.saturating_sub(1))
    }

    /// GET `url` and return the body of the first 2xx response.
    ///
    /// Every attempt takes a rate-limit slot first, success or not. A failed
    /// attempt is followed by its backoff sleep, including the last one.
    pub async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let mut last_error = None;

        for attempt in 1..=self.max_retries {
            self.limiter.acquire().await;

            match self.attempt(url).await {
                Ok(body) => {
                    log::debug!("[fetch] {} ok on attempt {} ({} bytes)", url, attempt, body.len());
                    return Ok(body);
                }
                Err(e) => {
                    let backoff = self.backoff_for(attempt);
                    log::warn!(
                        "[fetch] attempt {}/{} failed{}: {}. backoff {:.1}s",
                        attempt,
                        self.max_retries,
                        if e.is_transient_status() { " (transient)" } else { "" },
                        error_chain(&e),
                        backoff.as_secs_f64()
                    );
                    tokio::time::sleep(backoff).await;
                    last_error = Some(e);
                }
            }
        }

        Err(FetchError::RetriesExhausted {
            attempts: self.max_retries,
            last: Box::new(
                last_error.unwrap_or_else(|| FetchError::Transport("no attempts made".to_string())),
            ),
        })
    }

    async fn attempt(&self, url: &str) -> Result<String, FetchError> {
        let response = self.transport.get(url).await?;
        if (200..300).contains(&response.status) {
            Ok(response.body)
        } else {
            Err(FetchError::Status {
                status: response.status,
                body: response.body.chars().take(ERROR_BODY_LIMIT).collect(),
            })
        }
    }
}

// ── MockTransport for testing ────────────────────────────────────────────

#[cfg(any(test, feature = "test-harness"))]
pub mod mock {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tokio::time::Instant;

    /// Scripted transport. Pops queued responses in order, then repeats
    /// `fallback` forever. Records every requested URL and when it was sent.
    pub struct MockTransport {
        pub queued: Mutex<VecDeque<Result<HttpResponse, String>>>,
        pub fallback: Result<HttpResponse, String>,
        pub requests: Mutex<Vec<(String, Instant)>>,
    }

    impl MockTransport {
        /// Always answers `200` with the given body.
        pub fn with_body(body: &str) -> Self {
            Self::with_fallback(Ok(HttpResponse {
                status: 200,
                body: body.to_string(),
            }))
        }

        /// Always answers with the given status and an empty body.
        pub fn with_status(status: u16) -> Self {
            Self::with_fallback(Ok(HttpResponse {
                status,
                body: String::new(),
            }))
        }

        /// Always fails at the transport level.
        pub fn failing(message: &str) -> Self {
            Self::with_fallback(Err(message.to_string()))
        }

        pub fn with_fallback(fallback: Result<HttpResponse, String>) -> Self {
            Self {
                queued: Mutex::new(VecDeque::new()),
                fallback,
                requests: Mutex::new(Vec::new()),
            }
        }

        /// Queue a response to be returned before the fallback.
        pub fn push(&self, response: Result<HttpResponse, String>) {
            self.queued.lock().unwrap().push_back(response);
        }

        pub fn call_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }

        pub fn urls(&self) -> Vec<String> {
            self.requests
                .lock()
                .unwrap()
                .iter()
                .map(|(url, _)| url.clone())
                .collect()
        }

        pub fn request_times(&self) -> Vec<Instant> {
            self.requests.lock().unwrap().iter().map(|(_, t)| *t).collect()
        }
    }

    impl HttpTransport for MockTransport {
        async fn get(&self, url: &str) -> Result<HttpResponse, FetchError> {
            self.requests
                .lock()
                .unwrap()
                .push((url.to_string(), Instant::now()));
            let next = self
                .queued
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| self.fallback.clone());
            next.map_err(FetchError::Transport)
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────────
