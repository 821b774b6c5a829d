use crate::config::TelemetryConfig;
use std::env;
use std::fmt;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
pub enum TelemetryError {
    InvalidFilter {
        key: &'static str,
        value: String,
        source: ParseError,
    },
    Subscriber(Box<dyn std::error::Error + Send + Sync>),
}

impl fmt::Display for TelemetryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TelemetryError::InvalidFilter { key, value, .. } => {
                write!(f, "{key} '{value}' is not a valid log filter")
            }
            TelemetryError::Subscriber(err) => {
                write!(f, "could not install the console log subscriber: {err}")
            }
        }
    }
}

impl std::error::Error for TelemetryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TelemetryError::InvalidFilter { source, .. } => Some(source),
            TelemetryError::Subscriber(err) => Some(&**err),
        }
    }
}

/// `RUST_LOG` wins when set; otherwise `APP_LOG_LEVEL` from config.
fn filter_directives(config: &TelemetryConfig) -> (&'static str, String) {
    match env::var("RUST_LOG") {
        Ok(raw) if !raw.trim().is_empty() => ("RUST_LOG", raw),
        _ => ("APP_LOG_LEVEL", config.log_level.clone()),
    }
}

fn build_filter(config: &TelemetryConfig) -> Result<EnvFilter, TelemetryError> {
    let (key, value) = filter_directives(config);
    EnvFilter::try_new(&value).map_err(|source| TelemetryError::InvalidFilter {
        key,
        value,
        source,
    })
}

/// Installs the global subscriber. Events go to stderr so command output on
/// stdout stays machine readable.
pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let env_filter = build_filter(config)?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .with_ansi(false)
        .try_init()
        .map_err(TelemetryError::Subscriber)
}
