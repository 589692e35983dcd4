//! Temperature text cleanup.

use regex::Regex;
use std::sync::LazyLock;

/// Leading noise glued in front of the number, e.g. "현재온도" in "현재온도22.7°".
static LEADING_NOISE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\d\-+]*").expect("valid leading-noise pattern"));

/// Normalize scraped temperature text to `<number>°C`.
///
/// Returns the input unchanged when nothing is left after stripping, so a
/// bare `"°C"` is never produced.
pub fn normalize_temperature(raw: &str) -> String {
    let cleaned = LEADING_NOISE.replace(raw, "");
    let stripped: String = cleaned
        .chars()
        .filter(|c| !matches!(c, '도' | ' ' | '°'))
        .collect();
    let value = stripped.strip_prefix('+').unwrap_or(&stripped);

    if value.is_empty() {
        raw.to_string()
    } else {
        format!("{}°C", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_degrees() {
        assert_eq!(normalize_temperature("23°"), "23°C");
    }

    #[test]
    fn korean_degree_word() {
        assert_eq!(normalize_temperature("23도"), "23°C");
    }

    #[test]
    fn label_glued_to_number() {
        assert_eq!(normalize_temperature("현재온22.7°"), "22.7°C");
        assert_eq!(normalize_temperature("현재 온도 22.7°"), "22.7°C");
    }

    #[test]
    fn plus_sign_is_dropped_minus_kept() {
        assert_eq!(normalize_temperature("+5°"), "5°C");
        assert_eq!(normalize_temperature("-3.5°"), "-3.5°C");
        assert_eq!(normalize_temperature("기온-1도"), "-1°C");
    }

    #[test]
    fn inner_spaces_removed() {
        assert_eq!(normalize_temperature("1 2 °"), "12°C");
    }

    #[test]
    fn nothing_left_returns_raw() {
        assert_eq!(normalize_temperature("°"), "°");
        assert_eq!(normalize_temperature("정보 없음"), "정보 없음");
        assert_eq!(normalize_temperature("+"), "+");
    }
}
