use std::io::{self, Write};
use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use enrollment_desk::api::{ApiClient, HttpTransport};
use enrollment_desk::config::{ApiConfig, AppConfig};
use enrollment_desk::error::AppError;
use enrollment_desk::telemetry;
use enrollment_desk::workflows::admission::{
    AdmissionDesk, EnrollmentUpdate, NewEnrollment, ReviewOutcome,
};
use enrollment_desk::workflows::directory::{Directory, Resource};
use enrollment_desk::workflows::domain::RecordId;
use enrollment_desk::workflows::reports::{ReportWindow, Reports, SystemReport};
use enrollment_desk::workflows::roster::{self, RosterFilters, SortColumn, SortDirection};
use enrollment_desk::workflows::WorkflowError;
use enrollment_desk::{load_session, Session};

use crate::cli::{
    AcceptArgs, CloseArgs, ConnectionArgs, DeleteArgs, DeleteKind, DirectoryArgs, EnrollArgs,
    Listing, NoteArgs, OpenEnrollmentArgs, OutputArgs, PendingArgs, QueueKind, RejectArgs,
    ReportArgs, RosterArgs, RoundArgs, SortArg, StudentArgs, Subject, UpdateEnrollmentArgs,
};
use crate::infra::{end_of_day, start_of_day, Gate};
use crate::render::{
    tab_line, write_rows, DirectoryRow, EnrollmentRow, LogRow, OutputFormat, ReportRow,
    RosterRow, StudentRow, TableRow,
};

/// Everything a command needs: settings, the shared API client and the
/// resolved operator session.
pub(crate) struct Connection {
    config: AppConfig,
    session: Session,
    desk: AdmissionDesk<HttpTransport>,
    directory: Directory<HttpTransport>,
    reports: Reports<HttpTransport>,
    api: Arc<ApiClient<HttpTransport>>,
}

impl Connection {
    pub(crate) async fn open(args: ConnectionArgs) -> Result<Self, AppError> {
        let mut config = AppConfig::load()?;
        telemetry::init(&config.telemetry)?;

        if args.api_url.is_some() || args.cookie.is_some() {
            let base_url = args
                .api_url
                .unwrap_or_else(|| config.api.base_url.to_string());
            let cookie = args.cookie.or(config.api.session_cookie.take());
            config.api = ApiConfig::new(&base_url, cookie)?;
        }

        let transport = HttpTransport::new(&config.api)?;
        let api = Arc::new(ApiClient::new(transport));
        let session = load_session(&api).await?;
        info!(
            admin_id = %session.admin().id,
            environment = ?config.environment,
            base_url = %config.api.base_url,
            "session resolved"
        );

        Ok(Self {
            desk: AdmissionDesk::new(api.clone(), &config.review),
            directory: Directory::new(api.clone()),
            reports: Reports::new(api.clone()),
            config,
            session,
            api,
        })
    }
}

fn print<R: TableRow>(rows: &[R], output: OutputArgs) -> Result<(), AppError> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_rows(&mut out, rows, OutputFormat::from_flag(output.csv))?;
    Ok(())
}

fn say(message: impl std::fmt::Display) -> Result<(), AppError> {
    let mut out = io::stdout().lock();
    writeln!(out, "{message}")?;
    Ok(())
}

fn report_outcome<R>(outcome: &ReviewOutcome<R>, verb: &str, id: &str) -> Result<(), AppError> {
    match outcome {
        ReviewOutcome::Cancelled => say("Cancelled; nothing was sent."),
        ReviewOutcome::Submitted { remaining } => say(format!(
            "{verb} {id}. {} record(s) still pending.",
            remaining.len()
        )),
        ReviewOutcome::SubmittedStale { refetch_error } => say(format!(
            "{verb} {id}. The pending list could not be refreshed: {refetch_error}"
        )),
    }
}

pub(crate) fn whoami(connection: &Connection) -> Result<(), AppError> {
    let admin = connection.session.admin();
    say(format!("{} ({})", admin.name, admin.id))?;
    if let Some(role) = &admin.role {
        say(format!("role: {}", role.name))?;
    }
    let codes: Vec<&str> = connection.session.permission_codes().collect();
    if codes.is_empty() {
        say("permissions: none")
    } else {
        say(format!("permissions: {}", codes.join(", ")))
    }
}

pub(crate) async fn pending(connection: &Connection, args: PendingArgs) -> Result<(), AppError> {
    let session = &connection.session;
    match args.queue {
        QueueKind::Students => {
            let students = connection.desk.pending_students(session).await?;
            let rows: Vec<StudentRow> = students.iter().map(StudentRow::from).collect();
            print(&rows, args.output)
        }
        QueueKind::Enrollments => {
            let enrollments = connection.desk.pending_enrollments(session).await?;
            let rows: Vec<EnrollmentRow> = enrollments.iter().map(EnrollmentRow::from).collect();
            print(&rows, args.output)
        }
    }
}

pub(crate) async fn accept(connection: &Connection, args: AcceptArgs) -> Result<(), AppError> {
    let id = RecordId::new(args.id);
    let gate = Gate::from_flag(args.yes);
    let session = &connection.session;
    match args.subject {
        Subject::Student => {
            let outcome = connection.desk.accept_student(session, &id, &gate).await?;
            report_outcome(&outcome, "Accepted student", id.as_str())
        }
        Subject::Enrollment => {
            let outcome = connection.desk.accept_enrollment(session, &id, &gate).await?;
            report_outcome(&outcome, "Accepted enrollment", id.as_str())
        }
    }
}

pub(crate) async fn reject(connection: &Connection, args: RejectArgs) -> Result<(), AppError> {
    let id = RecordId::new(args.id);
    let session = &connection.session;
    match args.subject {
        Subject::Student => {
            let outcome = connection
                .desk
                .reject_student(session, &id, &args.reason)
                .await?;
            report_outcome(&outcome, "Rejected student", id.as_str())
        }
        Subject::Enrollment => {
            let outcome = connection
                .desk
                .reject_enrollment(session, &id, &args.reason)
                .await?;
            report_outcome(&outcome, "Rejected enrollment", id.as_str())
        }
    }
}

pub(crate) async fn close_enrollment(
    connection: &Connection,
    args: CloseArgs,
) -> Result<(), AppError> {
    let id = RecordId::new(args.enrollment_id);
    connection
        .desk
        .close_enrollment(&connection.session, &id)
        .await?;
    say(format!("Closed enrollment {id}."))
}

pub(crate) async fn open_enrollment(
    connection: &Connection,
    args: OpenEnrollmentArgs,
) -> Result<(), AppError> {
    let student_id = RecordId::new(args.student_id);
    let start = args.start.unwrap_or_else(|| Utc::now().date_naive());
    let request = NewEnrollment::new(
        RecordId::new(args.course),
        RecordId::new(args.teacher),
        RecordId::new(args.admin),
        start,
    )
    .map_err(WorkflowError::from)?;
    connection
        .desk
        .create_enrollment(&connection.session, &student_id, &request)
        .await?;
    say(format!(
        "Opened enrollment for student {student_id}; it now waits for acceptance."
    ))
}

pub(crate) async fn update_enrollment(
    connection: &Connection,
    args: UpdateEnrollmentArgs,
) -> Result<(), AppError> {
    let id = RecordId::new(args.enrollment_id);
    let update = EnrollmentUpdate {
        teacher_id: args.teacher.map(RecordId::new),
        admin_id: args.admin.map(RecordId::new),
        status: args.status,
    };
    connection
        .desk
        .update_enrollment(&connection.session, &id, &update)
        .await?;
    say(format!("Updated enrollment {id}."))
}

pub(crate) async fn note(connection: &Connection, args: NoteArgs) -> Result<(), AppError> {
    let student_id = RecordId::new(args.student_id);
    let enrollment_id = RecordId::new(args.enrollment_id);
    connection
        .desk
        .append_log(&connection.session, &student_id, &enrollment_id, &args.note)
        .await?;
    say(format!("Note added to enrollment {enrollment_id}."))
}

pub(crate) async fn student(connection: &Connection, args: StudentArgs) -> Result<(), AppError> {
    let id = RecordId::new(args.id);
    let session = &connection.session;
    let student = connection.desk.student_details(session, &id).await?;
    let enrollments = connection.desk.student_enrollments(session, &id).await?;

    print(&[StudentRow::from(&student)], args.output)?;
    if !args.output.csv {
        say("")?;
        say("Enrollments:")?;
    }
    let rows: Vec<EnrollmentRow> = enrollments.iter().map(EnrollmentRow::from).collect();
    print(&rows, args.output)
}

fn roster_filters(args: &RosterArgs) -> RosterFilters {
    let ids = |raw: &[String]| -> Vec<RecordId> {
        raw.iter().map(|id| RecordId::new(id.as_str())).collect()
    };
    RosterFilters {
        name: args.name.clone(),
        admins: ids(&args.admins),
        branches: ids(&args.branches),
        teachers: ids(&args.teachers),
        enrollment_statuses: args.enrollment_statuses.clone(),
        status: args.status,
    }
}

pub(crate) async fn students(connection: &Connection, args: RosterArgs) -> Result<(), AppError> {
    let filters = roster_filters(&args);
    let rows = roster::fetch_roster(&connection.api, &connection.session).await?;

    let column = match args.sort {
        SortArg::Name => SortColumn::Name,
        SortArg::Created => SortColumn::CreatedAt,
        SortArg::Status => SortColumn::Status,
    };
    let direction = if args.desc {
        SortDirection::Desc
    } else {
        SortDirection::Asc
    };
    let rows_per_page = args.rows.unwrap_or(connection.config.review.page_size).max(1);
    let page = roster::view_page(&rows, &filters, column, direction, args.page, rows_per_page);

    let table: Vec<RosterRow> = page.rows.iter().map(RosterRow::from).collect();
    if !args.output.csv {
        say(tab_line(&page.tabs))?;
    }
    print(&table, args.output)?;
    if !args.output.csv {
        say(format!(
            "page {} | {} of {} matching",
            args.page,
            table.len(),
            page.matching
        ))?;
    }
    Ok(())
}

pub(crate) async fn directory(connection: &Connection, args: DirectoryArgs) -> Result<(), AppError> {
    let session = &connection.session;
    let directory = &connection.directory;
    let rows: Vec<DirectoryRow> = match args.listing {
        Listing::Admins => directory_rows(&directory.admins(session).await?),
        Listing::Branches => directory_rows(&directory.branches(session).await?),
        Listing::Roles => directory_rows(&directory.roles(session).await?),
        Listing::Permissions => directory_rows(&directory.permissions(session).await?),
        Listing::Teachers => directory_rows(&directory.teachers(session).await?),
        Listing::Courses => directory_rows(&directory.courses(session).await?),
        Listing::Rounds => directory_rows(&directory.rounds(session).await?),
    };
    print(&rows, args.output)
}

fn directory_rows<'a, T>(items: &'a [T]) -> Vec<DirectoryRow>
where
    DirectoryRow: From<&'a T>,
{
    items.iter().map(DirectoryRow::from).collect()
}

pub(crate) async fn round(connection: &Connection, args: RoundArgs) -> Result<(), AppError> {
    let id = RecordId::new(args.id);
    let round = connection.directory.round(&connection.session, &id).await?;
    print(&[DirectoryRow::from(&round)], args.output)?;
    let enrollments: Vec<EnrollmentRow> =
        round.enrollments.iter().map(EnrollmentRow::from).collect();
    print(&enrollments, args.output)
}

pub(crate) async fn enroll(connection: &Connection, args: EnrollArgs) -> Result<(), AppError> {
    let round_id = RecordId::new(args.round);
    let student_ids: Vec<RecordId> = args.student_ids.into_iter().map(RecordId::new).collect();
    let round = connection
        .directory
        .bulk_enroll(&connection.session, &round_id, &student_ids)
        .await?;
    say(format!(
        "Round {round_id} now has {} enrollment(s).",
        round.enrollments.len()
    ))
}

pub(crate) async fn delete(connection: &Connection, args: DeleteArgs) -> Result<(), AppError> {
    use enrollment_desk::workflows::admission::ConfirmationGate;

    let resource = match args.kind {
        DeleteKind::Student => Resource::Student,
        DeleteKind::Admin => Resource::Admin,
        DeleteKind::Branch => Resource::Branch,
        DeleteKind::Role => Resource::Role,
        DeleteKind::Teacher => Resource::Teacher,
        DeleteKind::Course => Resource::Course,
    };
    let id = RecordId::new(args.id);
    let question = format!("Delete {} {id}?", resource.label());
    if !Gate::from_flag(args.yes).confirm(&question) {
        return say("Cancelled; nothing was sent.");
    }
    connection
        .directory
        .delete(&connection.session, resource, &id)
        .await?;
    say(format!("Deleted {} {id}.", resource.label()))
}

pub(crate) async fn report(connection: &Connection, args: ReportArgs) -> Result<(), AppError> {
    let window = ReportWindow::new(args.start.map(start_of_day), args.end.map(end_of_day))
        .map_err(WorkflowError::from)?;
    let branches = connection
        .reports
        .branch_reports(&connection.session, &window)
        .await?;
    let system = SystemReport::aggregate(&branches);

    let mut rows: Vec<ReportRow> = if args.total_only {
        Vec::new()
    } else {
        branches.iter().map(ReportRow::from).collect()
    };
    rows.push(ReportRow::from(&system));
    print(&rows, args.output)?;

    if !args.output.csv {
        let pct = |value: Option<f64>| {
            value
                .map(|value| format!("{value:.1}%"))
                .unwrap_or_else(|| "n/a".to_string())
        };
        say(format!(
            "{} branch(es) | students accepted {} | enrollments accepted {}",
            system.branches,
            pct(system.student_acceptance_pct()),
            pct(system.enrollment_acceptance_pct())
        ))?;
    }
    Ok(())
}

pub(crate) async fn logs(connection: &Connection, output: OutputArgs) -> Result<(), AppError> {
    let logs = connection.reports.log_feed(&connection.session).await?;
    let rows: Vec<LogRow> = logs.iter().map(LogRow::from).collect();
    print(&rows, output)
}
