//! The weather record produced by one fetch + extraction cycle.

use serde::{Deserialize, Serialize};

/// Weather fields scraped for a single region.
///
/// Every scraped field is optional: a selector that found nothing leaves the
/// field unset. `region` and `source` are always populated.
///
/// Field order here is the key order of the JSON output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherRecord {
    /// Caller-supplied place name, trimmed.
    pub region: String,
    /// Short condition description (e.g. "맑음").
    pub status: Option<String>,
    /// Normalized temperature, e.g. "23°C".
    pub temperature: Option<String>,
    /// Raw "feels like" text as found on the page.
    pub sensible_temperature: Option<String>,
    /// Relative humidity, e.g. "60%".
    pub humidity: Option<String>,
    /// The exact URL that was queried.
    pub source: String,
    /// Unix seconds at creation.
    pub timestamp: i64,
}

impl WeatherRecord {
    /// Record with only `region` and `source` set, stamped with the current time.
    pub fn empty(region: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            status: None,
            temperature: None,
            sensible_temperature: None,
            humidity: None,
            source: source.into(),
            timestamp: now_secs(),
        }
    }

    /// Number of scraped fields that are present.
    pub fn extracted_fields(&self) -> usize {
        [
            &self.status,
            &self.temperature,
            &self.sensible_temperature,
            &self.humidity,
        ]
        .iter()
        .filter(|f| f.is_some())
        .count()
    }
}

/// Field names in output order, as advertised by the metadata resource.
pub const FIELD_NAMES: [&str; 7] = [
    "region",
    "status",
    "temperature",
    "sensible_temperature",
    "humidity",
    "source",
    "timestamp",
];

fn now_secs() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}
