use std::env;
use std::fmt;

use url::Url;

/// Distinguishes runtime behavior for different stages of the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub api: ApiConfig,
    pub review: ReviewConfig,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let api = ApiConfig::new(
            &env::var("APP_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            env::var("APP_SESSION_COOKIE")
                .ok()
                .filter(|cookie| !cookie.trim().is_empty()),
        )?;

        let page_size = read_number("APP_PAGE_SIZE", 25, ConfigError::InvalidPageSize)?;
        if page_size == 0 {
            return Err(ConfigError::InvalidPageSize);
        }

        let review = ReviewConfig {
            page_size,
            student_reason_min: read_number(
                "APP_STUDENT_REASON_MIN",
                1,
                ConfigError::InvalidReasonBounds,
            )?,
            enrollment_reason_min: read_number(
                "APP_ENROLLMENT_REASON_MIN",
                3,
                ConfigError::InvalidReasonBounds,
            )?,
            reason_max: read_number("APP_REASON_MAX", 300, ConfigError::InvalidReasonBounds)?,
        };
        review.validate()?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            api,
            review,
            telemetry: TelemetryConfig { log_level },
        })
    }
}

const DEFAULT_API_URL: &str = "http://127.0.0.1:3000/api/";

fn read_number(key: &str, default: usize, error: ConfigError) -> Result<usize, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw.trim().parse::<usize>().map_err(|_| error),
        Err(_) => Ok(default),
    }
}

/// Where the back-office REST API lives and how requests authenticate.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: Url,
    pub session_cookie: Option<String>,
}

impl ApiConfig {
    /// Parses the base URL, forcing a trailing slash so relative endpoint
    /// paths join under it instead of replacing its last segment.
    pub fn new(base_url: &str, session_cookie: Option<String>) -> Result<Self, ConfigError> {
        let raw = base_url.trim();
        let normalized = if raw.ends_with('/') {
            raw.to_string()
        } else {
            format!("{raw}/")
        };
        let base_url = Url::parse(&normalized).map_err(|source| ConfigError::InvalidApiUrl {
            value: raw.to_string(),
            source,
        })?;

        Ok(Self {
            base_url,
            session_cookie,
        })
    }
}

/// Limits applied by the admission review screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReviewConfig {
    pub page_size: usize,
    pub student_reason_min: usize,
    pub enrollment_reason_min: usize,
    pub reason_max: usize,
}

impl ReviewConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.student_reason_min == 0
            || self.enrollment_reason_min == 0
            || self.student_reason_min > self.reason_max
            || self.enrollment_reason_min > self.reason_max
        {
            return Err(ConfigError::InvalidReasonBounds);
        }
        Ok(())
    }
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            page_size: 25,
            student_reason_min: 1,
            enrollment_reason_min: 3,
            reason_max: 300,
        }
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidApiUrl {
        value: String,
        source: url::ParseError,
    },
    InvalidPageSize,
    InvalidReasonBounds,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidApiUrl { value, .. } => {
                write!(f, "APP_API_URL '{value}' is not an absolute URL")
            }
            ConfigError::InvalidPageSize => {
                write!(f, "APP_PAGE_SIZE must be a positive integer")
            }
            ConfigError::InvalidReasonBounds => write!(
                f,
                "rejection reason minimums must be positive integers no larger than APP_REASON_MAX"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidApiUrl { source, .. } => Some(source),
            ConfigError::InvalidPageSize | ConfigError::InvalidReasonBounds => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for key in [
            "APP_ENV",
            "APP_API_URL",
            "APP_SESSION_COOKIE",
            "APP_PAGE_SIZE",
            "APP_STUDENT_REASON_MIN",
            "APP_ENROLLMENT_REASON_MIN",
            "APP_REASON_MAX",
            "APP_LOG_LEVEL",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.api.base_url.as_str(), "http://127.0.0.1:3000/api/");
        assert!(config.api.session_cookie.is_none());
        assert_eq!(config.review, ReviewConfig::default());
        assert_eq!(config.telemetry.log_level, "info");
    }

    #[test]
    fn api_url_gains_trailing_slash() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_API_URL", "https://desk.example.org/v1");
        env::set_var("APP_SESSION_COOKIE", "session=abc");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.api.base_url.as_str(), "https://desk.example.org/v1/");
        assert_eq!(config.api.session_cookie.as_deref(), Some("session=abc"));
        reset_env();
    }

    #[test]
    fn rejects_relative_api_url() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_API_URL", "/api");
        let err = AppConfig::load().expect_err("relative url rejected");
        assert!(matches!(err, ConfigError::InvalidApiUrl { .. }));
        reset_env();
    }

    #[test]
    fn rejects_zero_page_size() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_PAGE_SIZE", "0");
        let err = AppConfig::load().expect_err("zero page size rejected");
        assert!(matches!(err, ConfigError::InvalidPageSize));
        reset_env();
    }

    #[test]
    fn rejects_minimum_above_maximum() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_ENROLLMENT_REASON_MIN", "40");
        env::set_var("APP_REASON_MAX", "20");
        let err = AppConfig::load().expect_err("inverted bounds rejected");
        assert!(matches!(err, ConfigError::InvalidReasonBounds));
        reset_env();
    }

    #[test]
    fn rejects_zero_reason_minimum() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_STUDENT_REASON_MIN", "0");
        let err = AppConfig::load().expect_err("empty reasons would pass");
        assert!(matches!(err, ConfigError::InvalidReasonBounds));

        reset_env();
        env::set_var("APP_ENROLLMENT_REASON_MIN", "0");
        let err = AppConfig::load().expect_err("empty reasons would pass");
        assert!(matches!(err, ConfigError::InvalidReasonBounds));
        reset_env();
    }
}
