//! Selector table for the Naver weather widget.
//!
//! Selectors are data, not code: when the upstream page layout changes the
//! table can be replaced with a YAML file without touching extraction logic.
//!
//! ```yaml
//! temp_primary: [".temperature_text > strong"]
//! status_primary: [".weather_main"]
//! humidity_guess_blocks: [".summary_list", ".weather_info"]
//! humidity_scan: first_block   # or all_blocks
//! ```
//!
//! Keys missing from the file keep their built-in defaults.

use crate::config::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// An ordered list of CSS selectors, tried until one yields non-empty text.
pub type SelectorGroup = Vec<String>;

/// All selector groups used by the extractor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorTable {
    /// Current temperature, e.g. "23°".
    pub temp_primary: SelectorGroup,
    pub temp_fallback: SelectorGroup,
    /// Condition text, e.g. "맑음".
    pub status_primary: SelectorGroup,
    pub status_fallback: SelectorGroup,
    /// "Feels like" temperature. No fallback tier.
    pub sensible_temp: SelectorGroup,
    /// Coarse blocks scanned for a "습도 NN%" pattern.
    pub humidity_guess_blocks: SelectorGroup,
    pub humidity_scan: HumidityScan,
}

/// How far the humidity scan walks `humidity_guess_blocks`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HumidityScan {
    /// Stop at the first block that exists, matched or not.
    #[default]
    FirstBlock,
    /// Keep scanning later blocks until the pattern matches.
    AllBlocks,
}

fn group(selectors: &[&str]) -> SelectorGroup {
    selectors.iter().map(|s| s.to_string()).collect()
}

impl Default for SelectorTable {
    fn default() -> Self {
        Self {
            temp_primary: group(&[".temperature_text > strong"]),
            temp_fallback: group(&["span.temperature_text strong", ".temperature_text"]),
            status_primary: group(&[".weather_main"]),
            status_fallback: group(&[".status .weather", ".status", ".weather"]),
            sensible_temp: group(&[".temperature_info .sensible em"]),
            humidity_guess_blocks: group(&[".summary_list", ".weather_info", ".temperature_info"]),
            humidity_scan: HumidityScan::FirstBlock,
        }
    }
}

impl SelectorTable {
    /// Load a selector table from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::IoError(format!("{}: {}", path.as_ref().display(), e)))?;
        Self::parse(&contents)
    }

    /// Parse a selector table from a YAML string
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(yaml).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}
