use chrono::NaiveDate;
use serde::Serialize;

use crate::config::ReviewConfig;
use crate::workflows::domain::{AdmissionStatus, RecordId};
use crate::workflows::error::ValidationError;

/// Length bounds, in characters after trimming, for a rejection reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReasonPolicy {
    pub min: usize,
    pub max: usize,
}

impl ReasonPolicy {
    pub const fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }

    pub const fn students(config: &ReviewConfig) -> Self {
        Self::new(config.student_reason_min, config.reason_max)
    }

    pub const fn enrollments(config: &ReviewConfig) -> Self {
        Self::new(config.enrollment_reason_min, config.reason_max)
    }

    pub fn validate(&self, raw: &str) -> Result<RejectionReason, ValidationError> {
        let trimmed = raw.trim();
        let actual = trimmed.chars().count();
        if actual < self.min {
            return Err(ValidationError::ReasonTooShort {
                min: self.min,
                actual,
            });
        }
        if actual > self.max {
            return Err(ValidationError::ReasonTooLong {
                max: self.max,
                actual,
            });
        }
        Ok(RejectionReason(trimmed.to_string()))
    }
}

/// A reason that already passed a [`ReasonPolicy`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RejectionReason(String);

impl RejectionReason {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Body of `POST …/status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum StatusChange {
    Active,
    Rejected { reason: RejectionReason },
}

impl StatusChange {
    pub const fn label(&self) -> &'static str {
        match self {
            StatusChange::Active => "active",
            StatusChange::Rejected { .. } => "rejected",
        }
    }
}

/// Body of `POST /students/enrollment/close`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CloseEnrollmentRequest {
    pub enrollment_id: RecordId,
}

/// Body of `POST /enrollments/:studentId/:enrollmentId/log`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnrollmentNote {
    note: String,
}

impl EnrollmentNote {
    pub fn new(raw: &str) -> Result<Self, ValidationError> {
        let note = raw.trim();
        if note.is_empty() {
            return Err(ValidationError::EmptyNote);
        }
        Ok(Self {
            note: note.to_string(),
        })
    }

    pub fn text(&self) -> &str {
        &self.note
    }
}

/// Body of `POST /enrollments/create/:studentId`. New enrollments start
/// pending and wait in the enrollment queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEnrollment {
    course_id: RecordId,
    teacher_id: RecordId,
    admin_id: RecordId,
    start_date: NaiveDate,
}

impl NewEnrollment {
    pub fn new(
        course_id: RecordId,
        teacher_id: RecordId,
        admin_id: RecordId,
        start_date: NaiveDate,
    ) -> Result<Self, ValidationError> {
        for (field, id) in [
            ("course", &course_id),
            ("teacher", &teacher_id),
            ("supervisor", &admin_id),
        ] {
            if id.as_str().trim().is_empty() {
                return Err(ValidationError::MissingField(field));
            }
        }
        Ok(Self {
            course_id,
            teacher_id,
            admin_id,
            start_date,
        })
    }

    pub fn course_id(&self) -> &RecordId {
        &self.course_id
    }
}

/// Statuses an operator may move an accepted enrollment to. Pending and
/// rejected are reachable only through the review queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressStatus {
    Active,
    Late,
    Dropout,
    Graduated,
}

impl ProgressStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "active" => Some(Self::Active),
            "late" => Some(Self::Late),
            "dropout" => Some(Self::Dropout),
            "graduated" => Some(Self::Graduated),
            _ => None,
        }
    }

    pub const fn status(self) -> AdmissionStatus {
        match self {
            Self::Active => AdmissionStatus::Active,
            Self::Late => AdmissionStatus::Late,
            Self::Dropout => AdmissionStatus::Dropout,
            Self::Graduated => AdmissionStatus::Graduated,
        }
    }
}

/// Body of `PATCH /enrollments/update/:id`; absent fields are left as they are.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub teacher_id: Option<RecordId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_id: Option<RecordId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ProgressStatus>,
}

impl EnrollmentUpdate {
    pub fn is_empty(&self) -> bool {
        self.teacher_id.is_none() && self.admin_id.is_none() && self.status.is_none()
    }
}
