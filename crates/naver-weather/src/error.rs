//! Error taxonomy for weather lookups.
//!
//! Nothing here ever reaches the tool caller as a fault: `WeatherService`
//! turns every variant into a short user-facing string.
//!
//! Variants that wrap another error keep it as `source()` instead of
//! repeating it in their own message; use [`error_chain`] to render the
//! whole chain.

use std::error::Error as StdError;

/// Errors from a single upstream fetch.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP request failed")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("Failed to fetch after {attempts} attempts")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        last: Box<FetchError>,
    },
}

impl FetchError {
    /// Whether the upstream signalled a transient condition (429 or 5xx).
    pub fn is_transient_status(&self) -> bool {
        matches!(self, FetchError::Status { status, .. } if *status == 429 || *status >= 500)
    }
}

/// Errors from a weather query.
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("region must not be empty")]
    EmptyRegion,

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("configuration error")]
    Config(#[from] crate::config::ConfigError),
}

pub type Result<T> = std::result::Result<T, WeatherError>;

/// `err` followed by each of its causes, joined with ": ".
///
/// Causes whose text is empty or already contained in the message are
/// skipped.
pub fn error_chain(err: &(dyn StdError + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();

    while let Some(cause) = source {
        let cause_msg = cause.to_string();
        if !cause_msg.is_empty() && !message.contains(&cause_msg) {
            message.push_str(": ");
            message.push_str(&cause_msg);
        }
        source = cause.source();
    }

    message
}
