use crate::commands::{self, Connection};
use crate::infra::{parse_date, parse_progress, parse_status, parse_status_filter};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use enrollment_desk::error::AppError;
use enrollment_desk::workflows::admission::ProgressStatus;
use enrollment_desk::workflows::domain::AdmissionStatus;
use enrollment_desk::workflows::roster::StatusFilter;

#[derive(Parser, Debug)]
#[command(
    name = "enrollment-desk",
    about = "Review admissions and browse the education center back office from the command line",
    version
)]
struct Cli {
    #[command(flatten)]
    connection: ConnectionArgs,
    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ConnectionArgs {
    /// Override APP_API_URL
    #[arg(long, global = true)]
    pub(crate) api_url: Option<String>,
    /// Override APP_SESSION_COOKIE (raw Cookie header value)
    #[arg(long, global = true)]
    pub(crate) cookie: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the signed-in admin and granted permission codes
    Whoami,
    /// List records waiting for an admission decision
    Pending(PendingArgs),
    /// Accept a pending student or enrollment
    Accept(AcceptArgs),
    /// Reject a pending student or enrollment with a reason
    Reject(RejectArgs),
    /// Close an active enrollment
    CloseEnrollment(CloseArgs),
    /// Open a new pending enrollment for a student
    OpenEnrollment(OpenEnrollmentArgs),
    /// Reassign an enrollment or move it to late, dropout or graduated
    UpdateEnrollment(UpdateEnrollmentArgs),
    /// Append a note to an enrollment
    Note(NoteArgs),
    /// Show one student with their enrollments
    Student(StudentArgs),
    /// Browse the student roster with filters and paging
    Students(RosterArgs),
    /// List admins, branches, roles, permissions, teachers, courses or rounds
    Directory(DirectoryArgs),
    /// Show one round with its enrollments
    Round(RoundArgs),
    /// Enroll several students into a round
    Enroll(EnrollArgs),
    /// Delete a record from its list
    Delete(DeleteArgs),
    /// Branch analytics for an optional date window
    Report(ReportArgs),
    /// Latest enrollment notes across the center
    Logs(OutputArgs),
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum QueueKind {
    Students,
    Enrollments,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Subject {
    Student,
    Enrollment,
}

#[derive(Args, Debug, Default, Clone, Copy)]
pub(crate) struct OutputArgs {
    /// Write CSV to stdout instead of a text table
    #[arg(long)]
    pub(crate) csv: bool,
}

#[derive(Args, Debug)]
pub(crate) struct PendingArgs {
    #[arg(value_enum)]
    pub(crate) queue: QueueKind,
    #[command(flatten)]
    pub(crate) output: OutputArgs,
}

#[derive(Args, Debug)]
pub(crate) struct AcceptArgs {
    #[arg(value_enum)]
    pub(crate) subject: Subject,
    pub(crate) id: String,
    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub(crate) yes: bool,
}

#[derive(Args, Debug)]
pub(crate) struct RejectArgs {
    #[arg(value_enum)]
    pub(crate) subject: Subject,
    pub(crate) id: String,
    /// Why the record is rejected
    #[arg(long)]
    pub(crate) reason: String,
}

#[derive(Args, Debug)]
pub(crate) struct CloseArgs {
    pub(crate) enrollment_id: String,
}

#[derive(Args, Debug)]
pub(crate) struct OpenEnrollmentArgs {
    pub(crate) student_id: String,
    #[arg(long)]
    pub(crate) course: String,
    #[arg(long)]
    pub(crate) teacher: String,
    /// Supervising admin
    #[arg(long)]
    pub(crate) admin: String,
    /// First day of the course (YYYY-MM-DD, defaults to today)
    #[arg(long, value_parser = parse_date)]
    pub(crate) start: Option<NaiveDate>,
}

#[derive(Args, Debug)]
pub(crate) struct UpdateEnrollmentArgs {
    pub(crate) enrollment_id: String,
    #[arg(long)]
    pub(crate) teacher: Option<String>,
    #[arg(long)]
    pub(crate) admin: Option<String>,
    /// active, late, dropout or graduated
    #[arg(long, value_parser = parse_progress)]
    pub(crate) status: Option<ProgressStatus>,
}

#[derive(Args, Debug)]
pub(crate) struct NoteArgs {
    pub(crate) student_id: String,
    pub(crate) enrollment_id: String,
    #[arg(long)]
    pub(crate) note: String,
}

#[derive(Args, Debug)]
pub(crate) struct StudentArgs {
    pub(crate) id: String,
    #[command(flatten)]
    pub(crate) output: OutputArgs,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum SortArg {
    #[default]
    Name,
    Created,
    Status,
}

#[derive(Args, Debug)]
pub(crate) struct RosterArgs {
    /// Match part of a name or phone number
    #[arg(long, default_value = "")]
    pub(crate) name: String,
    /// `all` or one student status
    #[arg(long, default_value = "all", value_parser = parse_status_filter)]
    pub(crate) status: StatusFilter,
    #[arg(long = "admin")]
    pub(crate) admins: Vec<String>,
    #[arg(long = "branch")]
    pub(crate) branches: Vec<String>,
    /// Teacher of the current enrollment
    #[arg(long = "teacher")]
    pub(crate) teachers: Vec<String>,
    /// Status of the current enrollment
    #[arg(long = "enrollment-status", value_parser = parse_status)]
    pub(crate) enrollment_statuses: Vec<AdmissionStatus>,
    #[arg(long, value_enum, default_value_t)]
    pub(crate) sort: SortArg,
    #[arg(long)]
    pub(crate) desc: bool,
    /// Zero-based page
    #[arg(long, default_value_t = 0)]
    pub(crate) page: usize,
    /// Rows per page (defaults to APP_PAGE_SIZE)
    #[arg(long)]
    pub(crate) rows: Option<usize>,
    #[command(flatten)]
    pub(crate) output: OutputArgs,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Listing {
    Admins,
    Branches,
    Roles,
    Permissions,
    Teachers,
    Courses,
    Rounds,
}

#[derive(Args, Debug)]
pub(crate) struct DirectoryArgs {
    #[arg(value_enum)]
    pub(crate) listing: Listing,
    #[command(flatten)]
    pub(crate) output: OutputArgs,
}

#[derive(Args, Debug)]
pub(crate) struct RoundArgs {
    pub(crate) id: String,
    #[command(flatten)]
    pub(crate) output: OutputArgs,
}

#[derive(Args, Debug)]
pub(crate) struct EnrollArgs {
    #[arg(long)]
    pub(crate) round: String,
    #[arg(required = true)]
    pub(crate) student_ids: Vec<String>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DeleteKind {
    Student,
    Admin,
    Branch,
    Role,
    Teacher,
    Course,
}

#[derive(Args, Debug)]
pub(crate) struct DeleteArgs {
    #[arg(value_enum)]
    pub(crate) kind: DeleteKind,
    pub(crate) id: String,
    #[arg(long, short = 'y')]
    pub(crate) yes: bool,
}

#[derive(Args, Debug)]
pub(crate) struct ReportArgs {
    /// First day of the window (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub(crate) start: Option<NaiveDate>,
    /// Last day of the window, inclusive (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub(crate) end: Option<NaiveDate>,
    /// Only print the system-wide total
    #[arg(long)]
    pub(crate) total_only: bool,
    #[command(flatten)]
    pub(crate) output: OutputArgs,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let connection = Connection::open(cli.connection).await?;

    match cli.command {
        Command::Whoami => commands::whoami(&connection),
        Command::Pending(args) => commands::pending(&connection, args).await,
        Command::Accept(args) => commands::accept(&connection, args).await,
        Command::Reject(args) => commands::reject(&connection, args).await,
        Command::CloseEnrollment(args) => commands::close_enrollment(&connection, args).await,
        Command::OpenEnrollment(args) => commands::open_enrollment(&connection, args).await,
        Command::UpdateEnrollment(args) => commands::update_enrollment(&connection, args).await,
        Command::Note(args) => commands::note(&connection, args).await,
        Command::Student(args) => commands::student(&connection, args).await,
        Command::Students(args) => commands::students(&connection, args).await,
        Command::Directory(args) => commands::directory(&connection, args).await,
        Command::Round(args) => commands::round(&connection, args).await,
        Command::Enroll(args) => commands::enroll(&connection, args).await,
        Command::Delete(args) => commands::delete(&connection, args).await,
        Command::Report(args) => commands::report(&connection, args).await,
        Command::Logs(args) => commands::logs(&connection, args).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn reject_requires_reason() {
        let parsed = Cli::try_parse_from(["enrollment-desk", "reject", "student", "s-2"]);
        assert!(parsed.is_err());

        let parsed = Cli::try_parse_from([
            "enrollment-desk",
            "reject",
            "enrollment",
            "e-1",
            "--reason",
            "schedule conflict",
            "--api-url",
            "http://localhost:4000/api",
        ])
        .expect("parses");
        assert_eq!(
            parsed.connection.api_url.as_deref(),
            Some("http://localhost:4000/api")
        );
        match parsed.command {
            Command::Reject(args) => {
                assert_eq!(args.subject, Subject::Enrollment);
                assert_eq!(args.reason, "schedule conflict");
            }
            other => panic!("expected reject, got {other:?}"),
        }
    }

    #[test]
    fn unknown_status_is_a_usage_error() {
        let parsed =
            Cli::try_parse_from(["enrollment-desk", "students", "--status", "archived"]);
        assert!(parsed.is_err());

        let parsed = Cli::try_parse_from([
            "enrollment-desk",
            "students",
            "--status",
            "pending",
            "--enrollment-status",
            "late",
        ])
        .expect("parses");
        match parsed.command {
            Command::Students(args) => {
                assert_eq!(args.status, StatusFilter::Only(AdmissionStatus::Pending));
                assert_eq!(args.enrollment_statuses, [AdmissionStatus::Late]);
            }
            other => panic!("expected students, got {other:?}"),
        }
    }

    #[test]
    fn roster_flags_repeat() {
        let parsed = Cli::try_parse_from([
            "enrollment-desk",
            "students",
            "--branch",
            "b-1",
            "--branch",
            "b-2",
            "--sort",
            "created",
            "--desc",
            "--csv",
        ])
        .expect("parses");
        match parsed.command {
            Command::Students(args) => {
                assert_eq!(args.branches, ["b-1", "b-2"]);
                assert_eq!(args.sort, SortArg::Created);
                assert!(args.desc);
                assert!(args.output.csv);
                assert_eq!(args.status, StatusFilter::All);
            }
            other => panic!("expected students, got {other:?}"),
        }
    }

    #[test]
    fn update_enrollment_limits_status_to_progress_states() {
        let parsed = Cli::try_parse_from([
            "enrollment-desk",
            "update-enrollment",
            "e-4",
            "--status",
            "graduated",
        ])
        .expect("parses");
        match parsed.command {
            Command::UpdateEnrollment(args) => {
                assert_eq!(args.status, Some(ProgressStatus::Graduated));
                assert!(args.teacher.is_none());
            }
            other => panic!("expected update-enrollment, got {other:?}"),
        }

        let parsed = Cli::try_parse_from([
            "enrollment-desk",
            "update-enrollment",
            "e-4",
            "--status",
            "rejected",
        ]);
        assert!(parsed.is_err());
    }
}
