use crate::api::ApiError;
use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::workflows::error::WorkflowError;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Api(ApiError),
    Workflow(WorkflowError),
}

impl AppError {
    /// Text for the operator. Workflow failures use their banner so server
    /// messages reach the screen verbatim.
    pub fn operator_message(&self) -> String {
        match self {
            AppError::Workflow(err) => err.banner(),
            AppError::Api(err) => err.user_message(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Api(err) => write!(f, "api error: {}", err),
            AppError::Workflow(err) => write!(f, "workflow error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Api(err) => Some(err),
            AppError::Workflow(err) => Some(err),
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<ApiError> for AppError {
    fn from(value: ApiError) -> Self {
        Self::Api(value)
    }
}

impl From<WorkflowError> for AppError {
    fn from(value: WorkflowError) -> Self {
        Self::Workflow(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::error::ValidationError;

    #[test]
    fn operator_message_prefers_banners() {
        let rejected = AppError::from(WorkflowError::Api(ApiError::Rejected {
            path: "/students/s-1/status".to_string(),
            status: 422,
            message: "Reason is required".to_string(),
        }));
        assert_eq!(rejected.operator_message(), "Reason is required");

        let invalid = AppError::from(WorkflowError::from(ValidationError::EmptyNote));
        assert_eq!(invalid.operator_message(), "an enrollment note is required");

        let config = AppError::from(ConfigError::InvalidPageSize);
        assert_eq!(
            config.operator_message(),
            "configuration error: APP_PAGE_SIZE must be a positive integer"
        );
    }
}
