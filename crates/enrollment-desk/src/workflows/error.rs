use crate::api::ApiError;
use crate::session::PermissionDenied;

/// Input rejected before any request is built.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("a reason is required (minimum {min} characters, got {actual})")]
    ReasonTooShort { min: usize, actual: usize },
    #[error("the reason is longer than allowed ({actual} of {max} characters)")]
    ReasonTooLong { max: usize, actual: usize },
    #[error("an enrollment note is required")]
    EmptyNote,
    #[error("select at least one student to enroll")]
    EmptySelection,
    #[error("the report window starts after it ends")]
    InvertedWindow,
    #[error("a {0} must be selected")]
    MissingField(&'static str),
    #[error("the enrollment update changes nothing")]
    EmptyUpdate,
}

#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    NotPermitted(#[from] PermissionDenied),
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl WorkflowError {
    /// Message for the inline error banner of the view that triggered the call.
    pub fn banner(&self) -> String {
        match self {
            WorkflowError::Validation(err) => err.to_string(),
            WorkflowError::NotPermitted(err) => err.to_string(),
            WorkflowError::Api(err) => err.user_message(),
        }
    }

    /// Whether the failure happened before anything was sent.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            WorkflowError::Validation(_) | WorkflowError::NotPermitted(_)
        )
    }
}
