//! Branch analytics and the enrollment log feed.

use std::ops::AddAssign;
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::api::{ApiClient, Endpoint, QueryKey, Transport};
use crate::session::Session;
use crate::workflows::domain::{AdmissionStatus, EnrollmentLog};
use crate::workflows::error::{ValidationError, WorkflowError};

/// Enrollments per status within the report window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    #[serde(default)]
    pub pending: u64,
    #[serde(default)]
    pub active: u64,
    #[serde(default)]
    pub late: u64,
    #[serde(default)]
    pub graduated: u64,
    #[serde(default)]
    pub rejected: u64,
    #[serde(default)]
    pub dropout: u64,
}

impl StatusCounts {
    pub fn get(&self, status: AdmissionStatus) -> u64 {
        match status {
            AdmissionStatus::Pending => self.pending,
            AdmissionStatus::Active => self.active,
            AdmissionStatus::Late => self.late,
            AdmissionStatus::Graduated => self.graduated,
            AdmissionStatus::Rejected => self.rejected,
            AdmissionStatus::Dropout => self.dropout,
            AdmissionStatus::Unknown => 0,
        }
    }

    pub fn total(&self) -> u64 {
        AdmissionStatus::ordered()
            .into_iter()
            .map(|status| self.get(status))
            .sum()
    }
}

impl AddAssign for StatusCounts {
    fn add_assign(&mut self, other: Self) {
        self.pending += other.pending;
        self.active += other.active;
        self.late += other.late;
        self.graduated += other.graduated;
        self.rejected += other.rejected;
        self.dropout += other.dropout;
    }
}

/// One branch's row from `/reports`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchReport {
    #[serde(rename = "branchName", default)]
    pub branch_name: String,
    #[serde(default)]
    pub new_enrollments: u64,
    #[serde(default)]
    pub new_enrollments_accepted: u64,
    #[serde(default)]
    pub new_students: u64,
    #[serde(default)]
    pub new_students_accepted: u64,
    #[serde(default)]
    pub enrollment_status_counts: StatusCounts,
}

/// Every branch summed together.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SystemReport {
    pub branches: usize,
    pub new_enrollments: u64,
    pub new_enrollments_accepted: u64,
    pub new_students: u64,
    pub new_students_accepted: u64,
    pub enrollment_status_counts: StatusCounts,
}

impl SystemReport {
    pub fn aggregate(reports: &[BranchReport]) -> Self {
        reports.iter().fold(
            SystemReport {
                branches: reports.len(),
                ..SystemReport::default()
            },
            |mut total, report| {
                total.new_enrollments += report.new_enrollments;
                total.new_enrollments_accepted += report.new_enrollments_accepted;
                total.new_students += report.new_students;
                total.new_students_accepted += report.new_students_accepted;
                total.enrollment_status_counts += report.enrollment_status_counts;
                total
            },
        )
    }

    /// Share of new students accepted, in percent. `None` without new students.
    pub fn student_acceptance_pct(&self) -> Option<f64> {
        percent(self.new_students_accepted, self.new_students)
    }

    pub fn enrollment_acceptance_pct(&self) -> Option<f64> {
        percent(self.new_enrollments_accepted, self.new_enrollments)
    }
}

fn percent(part: u64, whole: u64) -> Option<f64> {
    (whole > 0).then(|| part as f64 * 100.0 / whole as f64)
}

/// Optional bounds on the report period. Open ends are left to the server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportWindow {
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
}

impl ReportWindow {
    pub fn new(
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Self, ValidationError> {
        if let (Some(start), Some(end)) = (start, end) {
            if start > end {
                return Err(ValidationError::InvertedWindow);
            }
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> Option<DateTime<Utc>> {
        self.start
    }

    pub fn end(&self) -> Option<DateTime<Utc>> {
        self.end
    }

    fn query_key(&self) -> QueryKey {
        let mut key = QueryKey::new(Endpoint::Reports.path());
        if let Some(start) = self.start {
            key = key.with_param("start", start.to_rfc3339_opts(SecondsFormat::Millis, true));
        }
        if let Some(end) = self.end {
            key = key.with_param("end", end.to_rfc3339_opts(SecondsFormat::Millis, true));
        }
        key
    }
}

#[derive(Debug)]
pub struct Reports<T> {
    api: Arc<ApiClient<T>>,
}

impl<T: Transport> Reports<T> {
    pub fn new(api: Arc<ApiClient<T>>) -> Self {
        Self { api }
    }

    /// Per-branch rows; the endpoint answers with a bare array.
    pub async fn branch_reports(
        &self,
        _session: &Session,
        window: &ReportWindow,
    ) -> Result<Vec<BranchReport>, WorkflowError> {
        Ok(self.api.query(&window.query_key()).await?)
    }

    pub async fn system_report(
        &self,
        session: &Session,
        window: &ReportWindow,
    ) -> Result<SystemReport, WorkflowError> {
        let reports = self.branch_reports(session, window).await?;
        Ok(SystemReport::aggregate(&reports))
    }

    /// Latest enrollment notes across the center, newest first. Undated
    /// entries go last.
    pub async fn log_feed(&self, _session: &Session) -> Result<Vec<EnrollmentLog>, WorkflowError> {
        let key = QueryKey::new(Endpoint::EnrollmentLogFeed.path());
        let mut logs: Vec<EnrollmentLog> = self.api.refetch_data(&key).await?;
        logs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(logs)
    }
}
