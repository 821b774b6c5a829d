//! Reference listings (admins, branches, roles, teachers, courses, rounds),
//! record deletion and round bulk enrollment.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::{ApiClient, ApiError, Endpoint, Invalidation, QueryKey, Transport};
use crate::session::{Permission, RoleGrant, Session};
use crate::workflows::domain::{Enrollment, RecordId, Reference};
use crate::workflows::error::{ValidationError, WorkflowError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Admin {
    pub id: RecordId,
    pub name: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default, rename = "roleId")]
    pub role: Option<RoleGrant>,
    #[serde(default, rename = "branchIds")]
    pub branches: Vec<Reference>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    pub id: RecordId,
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

/// A grantable permission as listed by `/role/permissions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionEntry {
    pub id: RecordId,
    pub name: String,
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Teacher {
    pub id: RecordId,
    pub name: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default, rename = "branchId")]
    pub branch: Option<Reference>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: RecordId,
    pub name: String,
    #[serde(default)]
    pub price: f64,
    /// Length of one round, as entered by staff.
    #[serde(default)]
    pub duration: u32,
}

/// A scheduled cohort of a course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Round {
    pub id: RecordId,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub course: Option<Course>,
    #[serde(default)]
    pub teacher: Option<Reference>,
    #[serde(default)]
    pub enrollments: Vec<Enrollment>,
}

/// Records that can be deleted from their list screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Student,
    Admin,
    Branch,
    Role,
    Teacher,
    Course,
}

impl Resource {
    fn delete_path(self, id: &RecordId) -> String {
        let id = id.as_str();
        match self {
            Resource::Student => Endpoint::DeleteStudent(id).path(),
            Resource::Admin => Endpoint::DeleteAdmin(id).path(),
            Resource::Branch => Endpoint::DeleteBranch(id).path(),
            Resource::Role => Endpoint::DeleteRole(id).path(),
            Resource::Teacher => Endpoint::DeleteTeacher(id).path(),
            Resource::Course => Endpoint::DeleteCourse(id).path(),
        }
    }

    fn list_key(self) -> QueryKey {
        let endpoint = match self {
            Resource::Student => Endpoint::StudentList,
            Resource::Admin => Endpoint::AdminList,
            Resource::Branch => Endpoint::BranchList,
            Resource::Role => Endpoint::RoleList,
            Resource::Teacher => Endpoint::TeacherList,
            Resource::Course => Endpoint::CourseList,
        };
        QueryKey::new(endpoint.path())
    }

    /// Role screens reuse the branch management codes.
    const fn required(self) -> Option<Permission> {
        match self {
            Resource::Student => Some(Permission::UpdateStudent),
            Resource::Branch | Resource::Role => Some(Permission::UpdateBranch),
            Resource::Teacher => Some(Permission::UpdateTeacher),
            Resource::Admin | Resource::Course => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Resource::Student => "student",
            Resource::Admin => "admin",
            Resource::Branch => "branch",
            Resource::Role => "role",
            Resource::Teacher => "teacher",
            Resource::Course => "course",
        }
    }
}

/// Body of `POST /round/bulk-enroll`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkEnrollRequest {
    pub student_ids: Vec<RecordId>,
    pub round_id: RecordId,
}

impl BulkEnrollRequest {
    /// Drops repeated ids, keeping first-selection order.
    pub fn new(round_id: RecordId, student_ids: &[RecordId]) -> Result<Self, ValidationError> {
        let mut unique: Vec<RecordId> = Vec::with_capacity(student_ids.len());
        for id in student_ids {
            if !unique.contains(id) {
                unique.push(id.clone());
            }
        }
        if unique.is_empty() {
            return Err(ValidationError::EmptySelection);
        }
        Ok(Self {
            student_ids: unique,
            round_id,
        })
    }
}

#[derive(Debug)]
pub struct Directory<T> {
    api: Arc<ApiClient<T>>,
}

impl<T: Transport> Directory<T> {
    pub fn new(api: Arc<ApiClient<T>>) -> Self {
        Self { api }
    }

    pub async fn admins(&self, _session: &Session) -> Result<Vec<Admin>, WorkflowError> {
        self.list(Endpoint::AdminList).await
    }

    pub async fn branches(&self, session: &Session) -> Result<Vec<Branch>, WorkflowError> {
        session.require(Permission::ReadBranch)?;
        self.list(Endpoint::BranchList).await
    }

    pub async fn roles(&self, _session: &Session) -> Result<Vec<RoleGrant>, WorkflowError> {
        self.list(Endpoint::RoleList).await
    }

    pub async fn permissions(
        &self,
        _session: &Session,
    ) -> Result<Vec<PermissionEntry>, WorkflowError> {
        self.list(Endpoint::PermissionList).await
    }

    pub async fn teachers(&self, session: &Session) -> Result<Vec<Teacher>, WorkflowError> {
        session.require(Permission::ReadTeacher)?;
        self.list(Endpoint::TeacherList).await
    }

    pub async fn courses(&self, _session: &Session) -> Result<Vec<Course>, WorkflowError> {
        self.list(Endpoint::CourseList).await
    }

    /// Rounds come back as a bare array.
    pub async fn rounds(&self, _session: &Session) -> Result<Vec<Round>, WorkflowError> {
        let key = QueryKey::new(Endpoint::RoundList.path());
        Ok(self.api.query(&key).await?)
    }

    pub async fn round(&self, _session: &Session, round_id: &RecordId) -> Result<Round, WorkflowError> {
        let key = QueryKey::new(Endpoint::RoundDetails(round_id.as_str()).path());
        Ok(self.api.query(&key).await?)
    }

    pub async fn delete(
        &self,
        session: &Session,
        resource: Resource,
        id: &RecordId,
    ) -> Result<(), WorkflowError> {
        if let Some(permission) = resource.required() {
            session.require(permission)?;
        }
        self.api
            .delete(
                &resource.delete_path(id),
                &[Invalidation::Key(resource.list_key())],
            )
            .await?;

        info!(
            resource = resource.label(),
            %id,
            admin_id = %session.admin().id,
            "record deleted"
        );
        Ok(())
    }

    /// Enrolls every selected student into the round and returns the round
    /// as the server now reports it.
    pub async fn bulk_enroll(
        &self,
        session: &Session,
        round_id: &RecordId,
        student_ids: &[RecordId],
    ) -> Result<Round, WorkflowError> {
        session.require(Permission::AcceptEnrollment)?;
        let request = BulkEnrollRequest::new(round_id.clone(), student_ids)?;
        let path = Endpoint::RoundBulkEnroll.path();
        let body = serde_json::to_value(&request).map_err(|source| ApiError::Decode {
            path: path.clone(),
            source,
        })?;

        let details = QueryKey::new(Endpoint::RoundDetails(round_id.as_str()).path());
        self.api
            .post(
                &path,
                &body,
                &[
                    Invalidation::Key(details.clone()),
                    Invalidation::Key(QueryKey::new(Endpoint::RoundList.path())),
                    Invalidation::Key(QueryKey::new(Endpoint::StudentList.path())),
                ],
            )
            .await?;

        info!(
            %round_id,
            students = request.student_ids.len(),
            admin_id = %session.admin().id,
            "students enrolled into round"
        );
        Ok(self.api.query(&details).await?)
    }

    async fn list<R>(&self, endpoint: Endpoint<'_>) -> Result<Vec<R>, WorkflowError>
    where
        R: serde::de::DeserializeOwned,
    {
        let key = QueryKey::new(endpoint.path());
        Ok(self.api.query_data(&key).await?)
    }
}
