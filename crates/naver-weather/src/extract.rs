//! HTML extraction for the Naver weather widget.
//!
//! Each field is looked up through an ordered selector group; the first
//! selector whose element has non-empty text wins. Nothing here fails: a
//! field that cannot be found is simply left unset.

use crate::fetch::search_url;
use crate::normalize::normalize_temperature;
use crate::record::WeatherRecord;
use crate::selectors::{HumidityScan, SelectorTable};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

/// "습도" (humidity), optional whitespace, 1-3 digits, optional percent sign.
static HUMIDITY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"습도\s*([0-9]{1,3})\s*%?").expect("valid humidity pattern"));

/// A selector group compiled once. Entries that fail to parse are dropped
/// with a warning at construction.
#[derive(Debug)]
struct CompiledGroup(Vec<Selector>);

impl CompiledGroup {
    fn compile(name: &str, selectors: &[String]) -> Self {
        let compiled = selectors
            .iter()
            .filter_map(|raw| match Selector::parse(raw) {
                Ok(selector) => Some(selector),
                Err(e) => {
                    log::warn!("Skipping invalid selector '{}' in {}: {:?}", raw, name, e);
                    None
                }
            })
            .collect();
        Self(compiled)
    }

    /// Text of the first element, in group order, whose trimmed text is non-empty.
    ///
    /// Only the first element matched by each selector is considered.
    fn first_text(&self, doc: &Html) -> Option<String> {
        self.0.iter().find_map(|selector| {
            let element = doc.select(selector).next()?;
            let text = stripped_text(element, "");
            (!text.is_empty()).then_some(text)
        })
    }

    /// First element matched by each selector, skipping selectors with no match.
    fn first_element<'a>(&'a self, doc: &'a Html) -> impl Iterator<Item = ElementRef<'a>> + 'a {
        self.0
            .iter()
            .filter_map(move |selector| doc.select(selector).next())
    }
}

/// Text nodes of `element`, each trimmed, empty ones dropped, joined by `sep`.
fn stripped_text(element: ElementRef<'_>, sep: &str) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(sep)
}

/// Interprets a `SelectorTable` against fetched HTML.
#[derive(Debug)]
pub struct Extractor {
    temp_primary: CompiledGroup,
    temp_fallback: CompiledGroup,
    status_primary: CompiledGroup,
    status_fallback: CompiledGroup,
    sensible_temp: CompiledGroup,
    humidity_blocks: CompiledGroup,
    humidity_scan: HumidityScan,
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new(&SelectorTable::default())
    }
}

impl Extractor {
    pub fn new(table: &SelectorTable) -> Self {
        Self {
            temp_primary: CompiledGroup::compile("temp_primary", &table.temp_primary),
            temp_fallback: CompiledGroup::compile("temp_fallback", &table.temp_fallback),
            status_primary: CompiledGroup::compile("status_primary", &table.status_primary),
            status_fallback: CompiledGroup::compile("status_fallback", &table.status_fallback),
            sensible_temp: CompiledGroup::compile("sensible_temp", &table.sensible_temp),
            humidity_blocks: CompiledGroup::compile(
                "humidity_guess_blocks",
                &table.humidity_guess_blocks,
            ),
            humidity_scan: table.humidity_scan,
        }
    }

    /// Build a record for `region` from the page HTML.
    ///
    /// `source` is always the search URL for `region`; every other field is
    /// present only if its selectors found text.
    pub fn parse(&self, html: &str, region: &str) -> WeatherRecord {
        let doc = Html::parse_document(html);
        let mut record = WeatherRecord::empty(region, search_url(region));

        record.temperature = self
            .temp_primary
            .first_text(&doc)
            .or_else(|| self.temp_fallback.first_text(&doc))
            .map(|raw| normalize_temperature(&raw));
        record.status = self
            .status_primary
            .first_text(&doc)
            .or_else(|| self.status_fallback.first_text(&doc));
        record.sensible_temperature = self.sensible_temp.first_text(&doc);
        record.humidity = self.guess_humidity(&doc);

        log::debug!(
            "Extracted {}/4 fields for '{}' (status={:?}, temperature={:?}, sensible={:?}, humidity={:?})",
            record.extracted_fields(),
            region,
            record.status,
            record.temperature,
            record.sensible_temperature,
            record.humidity
        );
        record
    }

    fn guess_humidity(&self, doc: &Html) -> Option<String> {
        for block in self.humidity_blocks.first_element(doc) {
            let text = stripped_text(block, " ");
            if let Some(caps) = HUMIDITY_PATTERN.captures(&text) {
                return Some(format!("{}%", &caps[1]));
            }
            if self.humidity_scan == HumidityScan::FirstBlock {
                return None;
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_PAGE: &str = r#"
<html><body>
  <div class="weather_info">
    <div class="temperature_text"><strong><span class="blind">현재 온도</span>23°</strong></div>
    <span class="weather_main">맑음</span>
    <div class="temperature_info">
      <dl class="summary_list">
        <dt class="term">체감</dt><dd class="desc sensible"><em>21.5°</em></dd>
        <dt class="term">습도</dt><dd class="desc">60%</dd>
        <dt class="term">풍속</dt><dd class="desc">2m/s</dd>
      </dl>
    </div>
  </div>
</body></html>
"#;

    fn parse(html: &str) -> WeatherRecord {
        Extractor::default().parse(html, "서울")
    }

    #[test]
    fn extracts_all_fields() {
        let record = parse(FULL_PAGE);
        assert_eq!(record.region, "서울");
        assert_eq!(record.temperature.as_deref(), Some("23°C"));
        assert_eq!(record.status.as_deref(), Some("맑음"));
        assert_eq!(record.sensible_temperature.as_deref(), Some("21.5°"));
        assert_eq!(record.humidity.as_deref(), Some("60%"));
        assert_eq!(record.source, search_url("서울"));
    }

    #[test]
    fn label_inside_temperature_is_normalized_away() {
        let record = parse(r#"<div class="temperature_text"><strong>현재 온도22.7°</strong></div>"#);
        assert_eq!(record.temperature.as_deref(), Some("22.7°C"));
    }

    #[test]
    fn falls_back_when_primary_missing() {
        let html = r#"
            <div class="temperature_text">-4°</div>
            <div class="status"><span class="weather">흐림</span></div>
        "#;
        let record = parse(html);
        assert_eq!(record.temperature.as_deref(), Some("-4°C"));
        assert_eq!(record.status.as_deref(), Some("흐림"));
    }

    #[test]
    fn empty_primary_match_is_skipped() {
        let html = r#"
            <span class="weather_main">   </span>
            <div class="status">비</div>
        "#;
        assert_eq!(parse(html).status.as_deref(), Some("비"));
    }

    #[test]
    fn nothing_found_leaves_fields_unset() {
        let record = parse("<html><body><p>검색 결과가 없습니다</p></body></html>");
        assert_eq!(record.extracted_fields(), 0);
        assert_eq!(record.region, "서울");
        assert!(!record.source.is_empty());
    }

    #[test]
    fn garbage_input_never_panics() {
        for html in ["", "<<<>>>", "<div class=", "\u{0}\u{fffd}", "<strong>23°"] {
            let record = parse(html);
            assert_eq!(record.region, "서울");
            assert!(!record.source.is_empty());
        }
    }

    #[test]
    fn humidity_without_percent_sign() {
        let html = r#"<ul class="summary_list"><li>습도 75</li></ul>"#;
        assert_eq!(parse(html).humidity.as_deref(), Some("75%"));
    }

    #[test]
    fn humidity_scan_stops_at_first_existing_block() {
        // .summary_list exists but has no humidity; .weather_info does.
        let html = r#"
            <ul class="summary_list"><li>풍속 3m/s</li></ul>
            <div class="weather_info">습도 40%</div>
        "#;
        assert_eq!(parse(html).humidity, None);
    }

    #[test]
    fn humidity_scan_all_blocks_keeps_looking() {
        let html = r#"
            <ul class="summary_list"><li>풍속 3m/s</li></ul>
            <div class="weather_info">습도 40%</div>
        "#;
        let table = SelectorTable {
            humidity_scan: HumidityScan::AllBlocks,
            ..SelectorTable::default()
        };
        let record = Extractor::new(&table).parse(html, "서울");
        assert_eq!(record.humidity.as_deref(), Some("40%"));
    }

    #[test]
    fn humidity_skips_missing_blocks() {
        let html = r#"<div class="temperature_info"><span>습도</span><span>88%</span></div>"#;
        assert_eq!(parse(html).humidity.as_deref(), Some("88%"));
    }

    #[test]
    fn invalid_selectors_are_skipped() {
        let table = SelectorTable {
            status_primary: vec!["!!not a selector".to_string(), ".weather_main".to_string()],
            ..SelectorTable::default()
        };
        let record = Extractor::new(&table).parse(FULL_PAGE, "서울");
        assert_eq!(record.status.as_deref(), Some("맑음"));
    }
}
