use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{info, warn};

use super::requests::{
    CloseEnrollmentRequest, EnrollmentNote, EnrollmentUpdate, NewEnrollment, ReasonPolicy,
    StatusChange,
};
use crate::api::endpoints::{STUDENT_DETAILS_PREFIX, STUDENT_ENROLLMENTS_PREFIX};
use crate::api::{ApiClient, ApiError, Endpoint, Invalidation, QueryKey, Transport};
use crate::config::ReviewConfig;
use crate::session::{Permission, Session};
use crate::workflows::domain::{Enrollment, Named, RecordId, Student};
use crate::workflows::error::{ValidationError, WorkflowError};

/// "Are you sure" step shown before an accept fires.
pub trait ConfirmationGate {
    fn confirm(&self, question: &str) -> bool;
}

/// A pre-answered gate, e.g. from a `--yes` flag.
impl ConfirmationGate for bool {
    fn confirm(&self, _question: &str) -> bool {
        *self
    }
}

/// Result of an accept/reject attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum ReviewOutcome<R> {
    /// The operator declined the confirmation; nothing was sent.
    Cancelled,
    /// The server took the decision; `remaining` is the refetched queue.
    Submitted { remaining: Vec<R> },
    /// The server took the decision but the queue could not be read back.
    SubmittedStale { refetch_error: String },
}

impl<R> ReviewOutcome<R> {
    pub fn remaining(&self) -> &[R] {
        match self {
            ReviewOutcome::Cancelled | ReviewOutcome::SubmittedStale { .. } => &[],
            ReviewOutcome::Submitted { remaining } => remaining,
        }
    }

    pub fn was_submitted(&self) -> bool {
        !matches!(self, ReviewOutcome::Cancelled)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Queue {
    Students,
    Enrollments,
}

impl Queue {
    fn pending_key(self) -> QueryKey {
        match self {
            Queue::Students => QueryKey::new(Endpoint::PendingStudents.path()),
            Queue::Enrollments => QueryKey::new(Endpoint::PendingEnrollments.path()),
        }
    }

    fn status_path(self, id: &RecordId) -> String {
        match self {
            Queue::Students => Endpoint::StudentStatus(id.as_str()).path(),
            Queue::Enrollments => Endpoint::EnrollmentStatus(id.as_str()).path(),
        }
    }

    fn stale_after_decision(self, id: &RecordId) -> Vec<Invalidation> {
        match self {
            Queue::Students => vec![
                Invalidation::Key(QueryKey::new(Endpoint::StudentDetails(id.as_str()).path())),
                Invalidation::Key(QueryKey::new(Endpoint::StudentList.path())),
            ],
            Queue::Enrollments => vec![
                Invalidation::Prefix(STUDENT_ENROLLMENTS_PREFIX.to_string()),
                Invalidation::Prefix(STUDENT_DETAILS_PREFIX.to_string()),
                Invalidation::Key(QueryKey::new(Endpoint::StudentList.path())),
            ],
        }
    }

    const fn noun(self) -> &'static str {
        match self {
            Queue::Students => "student",
            Queue::Enrollments => "enrollment",
        }
    }
}

/// Review desk for pending students and enrollments.
///
/// Every mutation is followed by a fresh read of the affected queue; the
/// server decides what is still pending, so nothing is removed locally.
#[derive(Debug)]
pub struct AdmissionDesk<T> {
    api: Arc<ApiClient<T>>,
    student_reasons: ReasonPolicy,
    enrollment_reasons: ReasonPolicy,
    page_size: usize,
}

impl<T: Transport> AdmissionDesk<T> {
    pub fn new(api: Arc<ApiClient<T>>, config: &ReviewConfig) -> Self {
        Self {
            api,
            student_reasons: ReasonPolicy::students(config),
            enrollment_reasons: ReasonPolicy::enrollments(config),
            page_size: config.page_size,
        }
    }

    pub fn student_reason_policy(&self) -> ReasonPolicy {
        self.student_reasons
    }

    pub fn enrollment_reason_policy(&self) -> ReasonPolicy {
        self.enrollment_reasons
    }

    pub async fn pending_students(&self, session: &Session) -> Result<Vec<Student>, WorkflowError> {
        session.require(Permission::AcceptStudent)?;
        let students = self.api.query_data(&Queue::Students.pending_key()).await?;
        Ok(self.order_queue(students))
    }

    pub async fn pending_enrollments(
        &self,
        session: &Session,
    ) -> Result<Vec<Enrollment>, WorkflowError> {
        session.require(Permission::AcceptStudent)?;
        let enrollments = self
            .api
            .query_data(&Queue::Enrollments.pending_key())
            .await?;
        Ok(self.order_queue(enrollments))
    }

    pub async fn accept_student(
        &self,
        session: &Session,
        student_id: &RecordId,
        gate: &impl ConfirmationGate,
    ) -> Result<ReviewOutcome<Student>, WorkflowError> {
        self.accept(session, Queue::Students, student_id, gate).await
    }

    pub async fn reject_student(
        &self,
        session: &Session,
        student_id: &RecordId,
        reason: &str,
    ) -> Result<ReviewOutcome<Student>, WorkflowError> {
        session.require(Permission::AcceptStudent)?;
        let reason = self.student_reasons.validate(reason)?;
        self.decide(
            session,
            Queue::Students,
            student_id,
            StatusChange::Rejected { reason },
        )
        .await
    }

    pub async fn accept_enrollment(
        &self,
        session: &Session,
        enrollment_id: &RecordId,
        gate: &impl ConfirmationGate,
    ) -> Result<ReviewOutcome<Enrollment>, WorkflowError> {
        self.accept(session, Queue::Enrollments, enrollment_id, gate)
            .await
    }

    pub async fn reject_enrollment(
        &self,
        session: &Session,
        enrollment_id: &RecordId,
        reason: &str,
    ) -> Result<ReviewOutcome<Enrollment>, WorkflowError> {
        session.require(Permission::AcceptStudent)?;
        let reason = self.enrollment_reasons.validate(reason)?;
        self.decide(
            session,
            Queue::Enrollments,
            enrollment_id,
            StatusChange::Rejected { reason },
        )
        .await
    }

    /// Ends an active enrollment outside the accept/reject flow.
    pub async fn close_enrollment(
        &self,
        session: &Session,
        enrollment_id: &RecordId,
    ) -> Result<(), WorkflowError> {
        session.require(Permission::AcceptEnrollment)?;
        let path = Endpoint::CloseEnrollment.path();
        let body = to_body(
            &path,
            &CloseEnrollmentRequest {
                enrollment_id: enrollment_id.clone(),
            },
        )?;
        self.api
            .post(
                &path,
                &body,
                &[
                    Invalidation::Prefix(STUDENT_ENROLLMENTS_PREFIX.to_string()),
                    Invalidation::Prefix(STUDENT_DETAILS_PREFIX.to_string()),
                    Invalidation::Key(QueryKey::new(Endpoint::StudentList.path())),
                ],
            )
            .await?;

        info!(
            enrollment_id = %enrollment_id,
            admin_id = %session.admin().id,
            "enrollment closed"
        );
        Ok(())
    }

    /// Opens a pending enrollment for a student; it then waits in the
    /// enrollment queue like any other.
    pub async fn create_enrollment(
        &self,
        session: &Session,
        student_id: &RecordId,
        request: &NewEnrollment,
    ) -> Result<(), WorkflowError> {
        let path = Endpoint::CreateEnrollment(student_id.as_str()).path();
        let body = to_body(&path, request)?;
        self.api
            .post(
                &path,
                &body,
                &[
                    Invalidation::Key(QueryKey::new(
                        Endpoint::StudentDetails(student_id.as_str()).path(),
                    )),
                    Invalidation::Key(QueryKey::new(
                        Endpoint::StudentEnrollments(student_id.as_str()).path(),
                    )),
                    Invalidation::Key(Queue::Enrollments.pending_key()),
                    Invalidation::Key(QueryKey::new(Endpoint::StudentList.path())),
                ],
            )
            .await?;

        info!(
            %student_id,
            course_id = %request.course_id(),
            admin_id = %session.admin().id,
            "enrollment opened"
        );
        Ok(())
    }

    /// Reassigns an enrollment's teacher or supervisor, or moves an accepted
    /// enrollment along (late, dropout, graduated). Status changes need
    /// `ACCEPT_ENROLLMENT`.
    pub async fn update_enrollment(
        &self,
        session: &Session,
        enrollment_id: &RecordId,
        update: &EnrollmentUpdate,
    ) -> Result<(), WorkflowError> {
        if update.status.is_some() {
            session.require(Permission::AcceptEnrollment)?;
        }
        if update.is_empty() {
            return Err(ValidationError::EmptyUpdate.into());
        }
        let path = Endpoint::UpdateEnrollment(enrollment_id.as_str()).path();
        let body = to_body(&path, update)?;
        self.api
            .patch(
                &path,
                &body,
                &[
                    Invalidation::Prefix(STUDENT_ENROLLMENTS_PREFIX.to_string()),
                    Invalidation::Prefix(STUDENT_DETAILS_PREFIX.to_string()),
                    Invalidation::Key(QueryKey::new(Endpoint::StudentList.path())),
                ],
            )
            .await?;

        info!(
            %enrollment_id,
            status = update.status.map(|status| status.status().as_str()),
            admin_id = %session.admin().id,
            "enrollment updated"
        );
        Ok(())
    }

    /// Appends a note to an enrollment. Status is unaffected.
    pub async fn append_log(
        &self,
        session: &Session,
        student_id: &RecordId,
        enrollment_id: &RecordId,
        note: &str,
    ) -> Result<(), WorkflowError> {
        let note = EnrollmentNote::new(note)?;
        let path = Endpoint::EnrollmentLog {
            student_id: student_id.as_str(),
            enrollment_id: enrollment_id.as_str(),
        }
        .path();
        let body = to_body(&path, &note)?;
        self.api
            .post(
                &path,
                &body,
                &[
                    Invalidation::Key(QueryKey::new(
                        Endpoint::StudentDetails(student_id.as_str()).path(),
                    )),
                    Invalidation::Key(QueryKey::new(Endpoint::EnrollmentLogFeed.path())),
                ],
            )
            .await?;

        info!(
            student_id = %student_id,
            enrollment_id = %enrollment_id,
            admin_id = %session.admin().id,
            "enrollment note appended"
        );
        Ok(())
    }

    pub async fn student_details(
        &self,
        session: &Session,
        student_id: &RecordId,
    ) -> Result<Student, WorkflowError> {
        session.require(Permission::ReadStudent)?;
        let key = QueryKey::new(Endpoint::StudentDetails(student_id.as_str()).path());
        Ok(self.api.query_data(&key).await?)
    }

    pub async fn student_enrollments(
        &self,
        session: &Session,
        student_id: &RecordId,
    ) -> Result<Vec<Enrollment>, WorkflowError> {
        session.require(Permission::ReadStudent)?;
        let key = QueryKey::new(Endpoint::StudentEnrollments(student_id.as_str()).path());
        Ok(self.api.query_data(&key).await?)
    }

    async fn accept<R>(
        &self,
        session: &Session,
        queue: Queue,
        id: &RecordId,
        gate: &impl ConfirmationGate,
    ) -> Result<ReviewOutcome<R>, WorkflowError>
    where
        R: DeserializeOwned + Named,
    {
        session.require(Permission::AcceptStudent)?;
        let question = format!("Accept {} {id}?", queue.noun());
        if !gate.confirm(&question) {
            info!(%id, queue = queue.noun(), "acceptance cancelled by operator");
            return Ok(ReviewOutcome::Cancelled);
        }
        self.decide(session, queue, id, StatusChange::Active).await
    }

    async fn decide<R>(
        &self,
        session: &Session,
        queue: Queue,
        id: &RecordId,
        change: StatusChange,
    ) -> Result<ReviewOutcome<R>, WorkflowError>
    where
        R: DeserializeOwned + Named,
    {
        let path = queue.status_path(id);
        let body = to_body(&path, &change)?;
        self.api
            .post(&path, &body, &queue.stale_after_decision(id))
            .await?;

        info!(
            %id,
            queue = queue.noun(),
            status = change.label(),
            admin_id = %session.admin().id,
            "review decision submitted"
        );

        match self.api.refetch_data(&queue.pending_key()).await {
            Ok(remaining) => Ok(ReviewOutcome::Submitted {
                remaining: self.order_queue(remaining),
            }),
            Err(err) => {
                warn!(%id, queue = queue.noun(), error = %err, "pending queue refetch failed");
                Ok(ReviewOutcome::SubmittedStale {
                    refetch_error: err.user_message(),
                })
            }
        }
    }

    fn order_queue<R: Named>(&self, mut rows: Vec<R>) -> Vec<R> {
        rows.sort_by_cached_key(|row| row.sort_name().to_lowercase());
        rows.truncate(self.page_size);
        rows
    }
}

fn to_body<B: Serialize>(path: &str, body: &B) -> Result<serde_json::Value, ApiError> {
    serde_json::to_value(body).map_err(|source| ApiError::Decode {
        path: path.to_string(),
        source,
    })
}
