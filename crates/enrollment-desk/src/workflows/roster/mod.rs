//! Student roster: the list behind the students screen, with the filter,
//! sort and pagination helpers every table view shares.

pub mod filters;
pub mod table;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::{ApiClient, Endpoint, QueryKey, Transport};
use crate::session::{Permission, Session};
use crate::workflows::domain::{AdmissionStatus, RecordId, Reference, Student, Summary};
use crate::workflows::error::WorkflowError;

pub use filters::{RosterFilters, StatusFilter};
pub use table::{
    empty_rows, rows_in_page, sort_rows, status_tabs, SortColumn, SortDirection, StatusTab,
};

/// The enrollment the backend considers current. Every field may be absent
/// for students that never enrolled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentEnrollment {
    #[serde(default)]
    pub id: Option<RecordId>,
    #[serde(default)]
    pub status: Option<AdmissionStatus>,
    #[serde(default, rename = "teacherId")]
    pub teacher: Option<Reference>,
    #[serde(default, rename = "courseId")]
    pub course: Option<Reference>,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
}

/// One row of `/students/list`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntry {
    pub student: Student,
    #[serde(default, deserialize_with = "null_as_default")]
    pub current_enrollment: CurrentEnrollment,
    #[serde(default)]
    pub enrollments: Vec<CurrentEnrollment>,
}

fn null_as_default<'de, D>(deserializer: D) -> Result<CurrentEnrollment, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<CurrentEnrollment>::deserialize(deserializer)?.unwrap_or_default())
}

impl RosterEntry {
    pub fn teacher_name(&self) -> Option<&str> {
        self.current_enrollment
            .teacher
            .as_ref()
            .and_then(Reference::name)
    }

    pub fn course_name(&self) -> Option<&str> {
        self.current_enrollment
            .course
            .as_ref()
            .and_then(Reference::name)
    }
}

/// Distinct admins, branches and teachers present in the roster, offered as
/// filter choices. First occurrence wins; order follows the roster.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOptions {
    pub admins: Vec<Summary>,
    pub branches: Vec<Summary>,
    pub teachers: Vec<Summary>,
}

impl FilterOptions {
    pub fn collect(rows: &[RosterEntry]) -> Self {
        let mut options = FilterOptions::default();
        for row in rows {
            push_unique(&mut options.admins, row.student.admin.as_ref());
            push_unique(&mut options.branches, row.student.branch.as_ref());
            push_unique(&mut options.teachers, row.current_enrollment.teacher.as_ref());
        }
        options
    }
}

fn push_unique(target: &mut Vec<Summary>, reference: Option<&Reference>) {
    let Some(Reference::Populated(summary)) = reference else {
        return;
    };
    if summary.name.is_empty() || target.iter().any(|known| known.id == summary.id) {
        return;
    }
    target.push(summary.clone());
}

/// Loads the full roster. The server returns every student; filtering and
/// paging happen locally.
pub async fn fetch_roster<T: Transport>(
    api: &ApiClient<T>,
    session: &Session,
) -> Result<Vec<RosterEntry>, WorkflowError> {
    session.require(Permission::ReadStudent)?;
    let key = QueryKey::new(Endpoint::StudentList.path());
    Ok(api.query_data(&key).await?)
}

/// A filtered, sorted page of the roster ready for display.
#[derive(Debug, Clone, PartialEq)]
pub struct RosterPage {
    pub rows: Vec<RosterEntry>,
    pub matching: usize,
    pub empty_rows: usize,
    pub tabs: Vec<StatusTab>,
}

/// Runs the table pipeline: stable sort, filters, then the requested page.
/// Tab counts are taken before the status filter so every tab stays visible.
pub fn view_page(
    rows: &[RosterEntry],
    filters: &RosterFilters,
    column: SortColumn,
    direction: SortDirection,
    page: usize,
    rows_per_page: usize,
) -> RosterPage {
    let mut sorted = rows.to_vec();
    sort_rows(&mut sorted, column, direction);

    let tabs = status_tabs(&filters.without_status().apply(&sorted));
    let filtered = filters.apply(&sorted);
    let matching = filtered.len();

    RosterPage {
        rows: rows_in_page(&filtered, page, rows_per_page).to_vec(),
        matching,
        empty_rows: empty_rows(page, rows_per_page, matching),
        tabs,
    }
}
