//! Naver weather lookup exposed as an MCP tool.
//!
//! A query for a Korean place name goes through a TTL cache, a rate-limited
//! retrying fetch of the Naver search page, selector-based extraction and a
//! text or JSON formatter.

pub mod cache;
pub mod config;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod format;
pub mod mcp;
pub mod normalize;
pub mod rate_limit;
pub mod record;
pub mod selectors;
pub mod service;

// Re-export commonly used types
pub use config::Config;
pub use error::{FetchError, WeatherError};
pub use format::OutputFormat;
pub use record::WeatherRecord;
pub use selectors::SelectorTable;
pub use service::{SupportedFields, WeatherService};
