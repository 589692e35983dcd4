//! Weather lookup orchestration.
//!
//! `WeatherService` ties the pieces together for one query: cache check,
//! rate-limited fetch, extraction, cache write and rendering. It is shared by
//! every caller, so there is exactly one rate limiter and one cache per process.

use crate::cache::WeatherCache;
use crate::config::Config;
use crate::error::{error_chain, Result, WeatherError};
use crate::extract::Extractor;
use crate::fetch::{search_url, Fetcher, HttpTransport, ReqwestTransport};
use crate::format::{render, OutputFormat};
use crate::rate_limit::RateLimiter;
use crate::record::{WeatherRecord, FIELD_NAMES};
use crate::selectors::SelectorTable;
use serde::Serialize;
use std::sync::Arc;

/// Returned when the region is blank.
pub const EMPTY_REGION_MESSAGE: &str = "지역명이 비어 있습니다. 예: region='서울'";

/// Prefix of the message returned when the upstream fetch fails.
pub const FETCH_FAILURE_MESSAGE: &str =
    "[오류] 날씨 정보를 가져오는 중 문제가 발생했습니다. 잠시 후 다시 시도해 주세요.";

/// Characters of the underlying error shown to the caller.
const REASON_LIMIT: usize = 120;

/// Static descriptor of what the service returns and how it is tuned.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SupportedFields {
    pub fields: Vec<String>,
    pub cache_ttl_seconds: u64,
    pub rate_limit_seconds: f64,
}

pub struct WeatherService<T: HttpTransport> {
    fetcher: Fetcher<T>,
    extractor: Extractor,
    cache: WeatherCache,
}

impl WeatherService<ReqwestTransport> {
    /// Service backed by the real HTTP client, with the selector table named
    /// in `config` (or the built-in one).
    pub fn from_config(config: &Config) -> Result<Self> {
        let selectors = config.selector_table()?;
        let transport = ReqwestTransport::new()?;
        Ok(Self::new(transport, config, &selectors))
    }
}

impl<T: HttpTransport> WeatherService<T> {
    pub fn new(transport: T, config: &Config, selectors: &SelectorTable) -> Self {
        let limiter = Arc::new(RateLimiter::new(config.rate_limit_interval));
        Self {
            fetcher: Fetcher::new(transport, limiter),
            extractor: Extractor::new(selectors),
            cache: WeatherCache::new(config.cache_ttl),
        }
    }

    pub fn transport(&self) -> &T {
        self.fetcher.transport()
    }

    /// Look up `region` and render it as `format` ("text" or "json").
    ///
    /// Never fails: validation and fetch errors come back as short
    /// user-facing strings.
    pub async fn query(&self, region: &str, format: &str) -> String {
        let format = OutputFormat::parse(format);
        match self.lookup(region).await {
            Ok(record) => render(&record, format),
            Err(WeatherError::EmptyRegion) => EMPTY_REGION_MESSAGE.to_string(),
            Err(e) => {
                log::error!("Weather lookup for '{}' failed: {}", region.trim(), error_chain(&e));
                failure_message(&e)
            }
        }
    }

    /// Cached record for `region`, fetching and extracting it on a miss.
    ///
    /// Concurrent misses for the same region each fetch independently.
    pub async fn lookup(&self, region: &str) -> Result<WeatherRecord> {
        let region = region.trim();
        if region.is_empty() {
            return Err(WeatherError::EmptyRegion);
        }

        if let Some(record) = self.cache.get(region).await {
            log::info!("[cache] hit for '{}'", region);
            return Ok(record);
        }
        log::debug!("[cache] miss for '{}'", region);

        let html = self.fetcher.fetch(&search_url(region)).await?;
        let record = self.extractor.parse(&html, region);
        self.cache.put(region, record.clone()).await;
        Ok(record)
    }

    pub fn supported_fields(&self) -> SupportedFields {
        SupportedFields {
            fields: FIELD_NAMES.iter().map(|f| f.to_string()).collect(),
            cache_ttl_seconds: self.cache.ttl().as_secs(),
            rate_limit_seconds: self.fetcher.limiter().interval().as_secs_f64(),
        }
    }
}

fn failure_message(error: &WeatherError) -> String {
    let reason: String = error_chain(error).chars().take(REASON_LIMIT).collect();
    format!("{} (reason: {})", FETCH_FAILURE_MESSAGE, reason)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::mock::MockTransport;
    use crate::fetch::HttpResponse;
    use crate::format::DEGRADED_NOTICE;
    use std::time::Duration;

    const PAGE: &str = r#"
<html><body>
  <div class="temperature_text"><strong><span class="blind">현재 온도</span>23°</strong></div>
  <span class="weather_main">맑음</span>
  <div class="temperature_info">
    <dl class="summary_list">
      <dt>체감</dt><dd class="sensible"><em>21°</em></dd>
      <dt>습도</dt><dd>60%</dd>
    </dl>
  </div>
</body></html>
"#;

    fn service(transport: MockTransport) -> (WeatherService<Arc<MockTransport>>, Arc<MockTransport>) {
        let transport = Arc::new(transport);
        let service = WeatherService::new(
            transport.clone(),
            &Config::default(),
            &SelectorTable::default(),
        );
        (service, transport)
    }

    fn reason_of(message: &str) -> &str {
        message
            .strip_prefix(FETCH_FAILURE_MESSAGE)
            .and_then(|rest| rest.strip_prefix(" (reason: "))
            .and_then(|rest| rest.strip_suffix(')'))
            .unwrap_or_else(|| panic!("not a failure message: {message}"))
    }

    #[tokio::test(start_paused = true)]
    async fn json_query_end_to_end() {
        let (svc, transport) = service(MockTransport::with_body(PAGE));
        let out = svc.query("서울", "json").await;

        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["region"], "서울");
        assert_eq!(value["temperature"], "23°C");
        assert_eq!(value["status"], "맑음");
        assert_eq!(value["humidity"], "60%");
        assert_eq!(value["source"], search_url("서울"));
        assert_eq!(transport.urls(), vec![search_url("서울")]);
    }

    #[tokio::test(start_paused = true)]
    async fn text_query_with_mixed_case_format() {
        let (svc, _) = service(MockTransport::with_body(PAGE));
        let out = svc.query("서울", "TEXT").await;
        assert!(out.starts_with("[네이버 날씨] 서울\n"));
        assert!(out.contains("- 기온: 23°C"));
        assert!(!out.contains(DEGRADED_NOTICE));
    }

    #[tokio::test(start_paused = true)]
    async fn blank_region_never_hits_network() {
        let (svc, transport) = service(MockTransport::with_body(PAGE));
        assert_eq!(svc.query("", "text").await, EMPTY_REGION_MESSAGE);
        assert_eq!(svc.query("   \t", "json").await, EMPTY_REGION_MESSAGE);
        assert!(matches!(svc.lookup(" ").await, Err(WeatherError::EmptyRegion)));
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn region_is_trimmed_before_lookup_and_caching() {
        let (svc, transport) = service(MockTransport::with_body(PAGE));
        let record = svc.lookup("  서울 ").await.unwrap();
        assert_eq!(record.region, "서울");

        svc.query("서울", "text").await;
        assert_eq!(transport.call_count(), 1);
        assert_eq!(transport.urls()[0], search_url("서울"));
    }

    #[tokio::test(start_paused = true)]
    async fn second_query_is_served_from_cache() {
        let (svc, transport) = service(MockTransport::with_body(PAGE));
        let first = svc.query("서울", "json").await;
        let second = svc.query("서울", "json").await;
        assert_eq!(first, second);
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_entry_is_refetched() {
        let (svc, transport) = service(MockTransport::with_body(PAGE));
        svc.query("서울", "text").await;
        tokio::time::advance(Duration::from_secs(601)).await;
        svc.query("서울", "text").await;
        assert_eq!(transport.call_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn fetch_failure_is_reported_and_not_cached() {
        let (svc, transport) = service(MockTransport::with_status(503));
        let out = svc.query("서울", "json").await;
        assert!(reason_of(&out).contains("HTTP 503"));
        assert_eq!(transport.call_count(), 3);

        // Nothing was cached, so the next query goes upstream again.
        transport.push(Ok(HttpResponse {
            status: 200,
            body: PAGE.to_string(),
        }));
        let out = svc.query("서울", "json").await;
        assert!(out.contains("\"temperature\": \"23°C\""));
        assert_eq!(transport.call_count(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn failure_reason_is_truncated_to_120_chars() {
        let (svc, _) = service(MockTransport::failing(&"연결 실패 ".repeat(100)));
        let out = svc.query("서울", "text").await;
        assert_eq!(reason_of(&out).chars().count(), 120);
    }

    #[tokio::test(start_paused = true)]
    async fn page_without_widget_renders_degraded_text() {
        let (svc, _) = service(MockTransport::with_body("<html><body>없음</body></html>"));
        let out = svc.query("서울", "text").await;
        assert!(out.contains(DEGRADED_NOTICE));
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_regions_share_one_rate_limiter() {
        let (svc, transport) = service(MockTransport::with_body(PAGE));
        let (a, b) = tokio::join!(svc.query("서울", "text"), svc.query("부산", "text"));
        assert!(a.contains("서울"));
        assert!(b.contains("부산"));

        let times = transport.request_times();
        assert_eq!(times.len(), 2);
        assert_eq!(times[1] - times[0], Duration::from_secs(1));
    }

    #[test]
    fn supported_fields_reflect_config() {
        let config = Config {
            cache_ttl: Duration::from_secs(120),
            rate_limit_interval: Duration::from_millis(500),
            ..Config::default()
        };
        let svc = WeatherService::new(
            MockTransport::with_body(PAGE),
            &config,
            &SelectorTable::default(),
        );
        let fields = svc.supported_fields();
        assert_eq!(fields.fields, FIELD_NAMES);
        assert_eq!(fields.cache_ttl_seconds, 120);
        assert_eq!(fields.rate_limit_seconds, 0.5);

        let json = serde_json::to_value(&fields).unwrap();
        assert_eq!(json["cache_ttl_seconds"], 120);
        assert_eq!(json["fields"][0], "region");
    }
}
