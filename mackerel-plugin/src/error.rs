//! Error types for the plugin helper.

use thiserror::Error;

/// Error a plugin returns when it cannot fetch its readings.
pub type FetchError = Box<dyn std::error::Error + Send + Sync>;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort or suppress a plugin run.
#[derive(Debug, Error)]
pub enum Error {
    /// The plugin failed to fetch its readings.
    #[error("failed to fetch metrics: {0}")]
    Fetch(#[source] FetchError),

    /// Reading or writing the state file failed, or output could not be written.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The state file or definition document could not be (de)serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A wildcard metric declaration did not compile.
    #[error("invalid metric pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// The state file was written less than a second ago.
    ///
    /// Another invocation is running back to back with this one; output is
    /// skipped for this run.
    #[error("state was recently updated")]
    StateRecentlyUpdated,
}

/// Why a counter rate could not be computed.
///
/// These only drop the affected metric from the current run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RateError {
    /// The previous reading is older than the accepted window.
    #[error("too long duration: {0}s since last fetch")]
    TooLongDuration(i64),

    /// The previous reading is not older than the current one.
    #[error("non-positive duration: {0}s since last fetch")]
    NonPositiveDuration(i64),

    /// The counter went backwards by more than a wraparound explains.
    #[error("counter seems to be reset")]
    CounterReset,
}
