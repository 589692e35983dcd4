//! Rendering of weather records for tool output.

use crate::record::WeatherRecord;

/// Shown when extraction found little or nothing.
pub const DEGRADED_NOTICE: &str = "- 안내: 일부 정보 수집에 실패했습니다. 잠시 후 다시 시도해 주세요.";

/// Output mode requested by the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl OutputFormat {
    /// Case-insensitive; anything other than "json" is text.
    pub fn parse(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("json") {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = std::convert::Infallible;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Render a record in the requested format.
pub fn render(record: &WeatherRecord, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => render_json(record),
        OutputFormat::Text => render_text(record),
    }
}

/// Pretty JSON, 2-space indent, non-ASCII kept literal.
pub fn render_json(record: &WeatherRecord) -> String {
    // serde_json only escapes control characters and quotes, so Hangul
    // passes through unchanged.
    serde_json::to_string_pretty(record).unwrap_or_else(|e| {
        log::error!("Failed to serialize weather record: {}", e);
        "{}".to_string()
    })
}

/// Human-readable block: a header line, then one labelled line per present field.
pub fn render_text(record: &WeatherRecord) -> String {
    let mut lines = vec![format!("[네이버 날씨] {}", record.region)];

    let fields = [
        ("상태", record.status.as_deref()),
        ("기온", record.temperature.as_deref()),
        ("체감온도", record.sensible_temperature.as_deref()),
        ("습도", record.humidity.as_deref()),
        ("참고", Some(record.source.as_str())),
    ];
    for (label, value) in fields {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            lines.push(format!("- {}: {}", label, value));
        }
    }

    // Header plus at most one line (normally just the source) means
    // extraction came back essentially empty.
    if lines.len() <= 2 {
        lines.push(DEGRADED_NOTICE.to_string());
        if !record.source.is_empty() {
            lines.push(format!("- 참고: {}", record.source));
        }
    }

    lines.join("\n")
}
