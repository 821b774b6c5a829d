use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Backend identifier. Some collections use numeric keys, the rest use
/// opaque strings; both are carried as text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RecordId(pub String);

impl RecordId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(i64),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(text) => RecordId(text),
            Raw::Number(number) => RecordId(number.to_string()),
        })
    }
}

/// Lifecycle status shared by students and enrollments.
///
/// The two machines are independent: a student's aggregate status does not
/// follow from any single enrollment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdmissionStatus {
    Pending,
    Active,
    Late,
    Dropout,
    Graduated,
    Rejected,
    #[default]
    #[serde(other)]
    Unknown,
}

impl AdmissionStatus {
    pub const fn ordered() -> [Self; 6] {
        [
            Self::Pending,
            Self::Active,
            Self::Late,
            Self::Dropout,
            Self::Graduated,
            Self::Rejected,
        ]
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Late => "late",
            Self::Dropout => "dropout",
            Self::Graduated => "graduated",
            Self::Rejected => "rejected",
            Self::Unknown => "unknown",
        }
    }

    /// Label shown to operators.
    pub const fn display_label(self) -> &'static str {
        match self {
            Self::Pending => "بنتظار القبول",
            Self::Active => "يدرس",
            Self::Late => "متاخر",
            Self::Dropout => "سقط",
            Self::Graduated => "انتهي من المرحلة",
            Self::Rejected => "مرفوض",
            Self::Unknown => "-",
        }
    }

    /// Only pending records are offered the accept/reject decision.
    pub const fn awaits_decision(self) -> bool {
        matches!(self, Self::Pending)
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ordered()
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(raw.trim()))
    }
}

impl fmt::Display for AdmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Minimal shape of a populated reference (admin, teacher, branch, course...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawSummary")]
pub struct Summary {
    pub id: RecordId,
    pub name: String,
}

/// Populated documents may carry `id`, `_id`, or both.
#[derive(Deserialize)]
struct RawSummary {
    #[serde(default)]
    id: Option<RecordId>,
    #[serde(default, rename = "_id")]
    object_id: Option<RecordId>,
    #[serde(default)]
    name: Option<String>,
}

impl TryFrom<RawSummary> for Summary {
    type Error = &'static str;

    fn try_from(raw: RawSummary) -> Result<Self, Self::Error> {
        let id = raw.id.or(raw.object_id).ok_or("reference without id")?;
        Ok(Self {
            id,
            name: raw.name.unwrap_or_default(),
        })
    }
}

/// A foreign key the backend may or may not have populated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reference {
    Populated(Summary),
    Id(RecordId),
}

impl Reference {
    pub fn id(&self) -> &RecordId {
        match self {
            Reference::Populated(summary) => &summary.id,
            Reference::Id(id) => id,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Reference::Populated(summary) if !summary.name.is_empty() => Some(&summary.name),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: RecordId,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub national_id: Option<String>,
    #[serde(default)]
    pub status: AdmissionStatus,
    #[serde(default, rename = "adminId")]
    pub admin: Option<Reference>,
    #[serde(default, rename = "branchId")]
    pub branch: Option<Reference>,
    #[serde(default)]
    pub created_by: Option<Reference>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
    pub id: RecordId,
    #[serde(default)]
    pub status: AdmissionStatus,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default, rename = "studentId")]
    pub student: Option<Reference>,
    #[serde(default, rename = "courseId")]
    pub course: Option<Reference>,
    #[serde(default, rename = "teacherId")]
    pub teacher: Option<Reference>,
    #[serde(default, rename = "adminId")]
    pub admin: Option<Reference>,
    #[serde(default)]
    pub created_by: Option<Reference>,
    #[serde(default)]
    pub accepted_by: Option<Reference>,
    #[serde(default)]
    pub accepted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub rejected_by: Option<Reference>,
    #[serde(default)]
    pub rejected_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub rejection_reason: Option<String>,
}

impl Enrollment {
    pub fn student_name(&self) -> &str {
        self.student
            .as_ref()
            .and_then(Reference::name)
            .unwrap_or_default()
    }
}

/// Free-text note attached to an enrollment. Never edited once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentLog {
    pub id: RecordId,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub note: String,
    #[serde(default, rename = "adminId")]
    pub author: Option<Reference>,
    #[serde(default)]
    pub student: Option<Reference>,
    #[serde(default, rename = "enrollmentId")]
    pub enrollment: Option<Reference>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Records listed by name in review queues.
pub trait Named {
    fn sort_name(&self) -> &str;
}

impl Named for Student {
    fn sort_name(&self) -> &str {
        &self.name
    }
}

impl Named for Enrollment {
    fn sort_name(&self) -> &str {
        self.student_name()
    }
}
