/// Every REST resource the console talks to, with path parameters filled in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint<'a> {
    CurrentAdmin,
    PendingStudents,
    StudentStatus(&'a str),
    PendingEnrollments,
    EnrollmentStatus(&'a str),
    CloseEnrollment,
    CreateEnrollment(&'a str),
    UpdateEnrollment(&'a str),
    EnrollmentLog {
        student_id: &'a str,
        enrollment_id: &'a str,
    },
    StudentList,
    StudentDetails(&'a str),
    StudentEnrollments(&'a str),
    DeleteStudent(&'a str),
    AdminList,
    DeleteAdmin(&'a str),
    BranchList,
    DeleteBranch(&'a str),
    RoleList,
    DeleteRole(&'a str),
    PermissionList,
    TeacherList,
    DeleteTeacher(&'a str),
    CourseList,
    DeleteCourse(&'a str),
    RoundList,
    RoundDetails(&'a str),
    RoundBulkEnroll,
    Reports,
    EnrollmentLogFeed,
}

impl Endpoint<'_> {
    pub fn path(&self) -> String {
        match self {
            Endpoint::CurrentAdmin => "/auth/me".to_string(),
            Endpoint::PendingStudents => "/students/status/pending/list".to_string(),
            Endpoint::StudentStatus(id) => format!("/students/{id}/status"),
            Endpoint::PendingEnrollments => "/enrollments/pending".to_string(),
            Endpoint::EnrollmentStatus(id) => format!("/enrollments/{id}/status"),
            Endpoint::CloseEnrollment => "/students/enrollment/close".to_string(),
            Endpoint::CreateEnrollment(student_id) => format!("/enrollments/create/{student_id}"),
            Endpoint::UpdateEnrollment(id) => format!("/enrollments/update/{id}"),
            Endpoint::EnrollmentLog {
                student_id,
                enrollment_id,
            } => format!("/enrollments/{student_id}/{enrollment_id}/log"),
            Endpoint::StudentList => "/students/list".to_string(),
            Endpoint::StudentDetails(id) => format!("/students/details/{id}"),
            Endpoint::StudentEnrollments(id) => format!("/enrollments/student/{id}"),
            Endpoint::DeleteStudent(id) => format!("/students/delete/{id}"),
            Endpoint::AdminList => "/admin/list".to_string(),
            Endpoint::DeleteAdmin(id) => format!("/admin/delete/{id}"),
            Endpoint::BranchList => "/branch/list".to_string(),
            Endpoint::DeleteBranch(id) => format!("/branch/delete/{id}"),
            Endpoint::RoleList => "/role/list".to_string(),
            Endpoint::DeleteRole(id) => format!("/role/delete/{id}"),
            Endpoint::PermissionList => "/role/permissions".to_string(),
            Endpoint::TeacherList => "/teacher/list".to_string(),
            Endpoint::DeleteTeacher(id) => format!("/teacher/delete/{id}"),
            Endpoint::CourseList => "/course/list".to_string(),
            Endpoint::DeleteCourse(id) => format!("/course/delete/{id}"),
            Endpoint::RoundList => "/round".to_string(),
            Endpoint::RoundDetails(id) => format!("/round/{id}"),
            Endpoint::RoundBulkEnroll => "/round/bulk-enroll".to_string(),
            Endpoint::Reports => "/reports".to_string(),
            Endpoint::EnrollmentLogFeed => "/reports/logs".to_string(),
        }
    }
}

/// Path prefix shared by every cached student details entry.
pub const STUDENT_DETAILS_PREFIX: &str = "/students/details/";
/// Path prefix shared by every cached per-student enrollment list.
pub const STUDENT_ENROLLMENTS_PREFIX: &str = "/enrollments/student/";
