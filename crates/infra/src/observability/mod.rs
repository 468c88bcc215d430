//! Tracing subscriber setup for binaries
//!
//! Logs go to stderr so command output on stdout stays clean. The filter
//! comes from `RUST_LOG`, falling back to the supplied default level.
//! Setting `GCAL_LOG_FORMAT=json` switches to one JSON object per line.

use tracing_subscriber::EnvFilter;

const LOG_FORMAT_VAR: &str = "GCAL_LOG_FORMAT";

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

impl LogFormat {
    /// Parse a format name; anything but `json` means compact.
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Compact
        }
    }

    /// Format named by `GCAL_LOG_FORMAT`.
    pub fn from_env() -> Self {
        std::env::var(LOG_FORMAT_VAR).map(|value| Self::parse(&value)).unwrap_or_default()
    }
}

/// Install the global subscriber.
///
/// Returns `false` if a subscriber was already installed.
pub fn init_tracing(default_level: &str) -> bool {
    init_tracing_with(default_level, LogFormat::from_env())
}

pub fn init_tracing_with(default_level: &str, format: LogFormat) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true);

    let installed = match format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.is_ok()
}
