use std::io::{self, Write};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use enrollment_desk::workflows::directory::{
    Admin, Branch, Course, PermissionEntry, Round, Teacher,
};
use enrollment_desk::workflows::domain::{
    AdmissionStatus, Enrollment, EnrollmentLog, Reference, Student,
};
use enrollment_desk::session::RoleGrant;
use enrollment_desk::workflows::reports::{BranchReport, StatusCounts, SystemReport};
use enrollment_desk::workflows::roster::{RosterEntry, StatusFilter, StatusTab};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OutputFormat {
    Text,
    Csv,
}

impl OutputFormat {
    pub(crate) fn from_flag(csv: bool) -> Self {
        if csv {
            OutputFormat::Csv
        } else {
            OutputFormat::Text
        }
    }
}

/// A flat record printable as an aligned text row or a CSV line.
pub(crate) trait TableRow: Serialize {
    const HEADERS: &'static [&'static str];

    fn cells(&self) -> Vec<String>;
}

pub(crate) fn write_rows<R, W>(out: &mut W, rows: &[R], format: OutputFormat) -> io::Result<()>
where
    R: TableRow,
    W: Write,
{
    match format {
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(out);
            if rows.is_empty() {
                writer.write_record(R::HEADERS)?;
            }
            for row in rows {
                writer.serialize(row)?;
            }
            writer.flush()
        }
        OutputFormat::Text => {
            if rows.is_empty() {
                return writeln!(out, "(no records)");
            }
            let cells: Vec<Vec<String>> = rows.iter().map(TableRow::cells).collect();
            write_aligned(out, R::HEADERS, &cells)
        }
    }
}

fn write_aligned<W: Write>(out: &mut W, headers: &[&str], rows: &[Vec<String>]) -> io::Result<()> {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (index, cell) in row.iter().enumerate() {
            if let Some(width) = widths.get_mut(index) {
                *width = (*width).max(cell.chars().count());
            }
        }
    }

    let header: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
    write_line(out, &header, &widths)?;
    let rule: Vec<String> = widths.iter().map(|width| "-".repeat(*width)).collect();
    write_line(out, &rule, &widths)?;
    for row in rows {
        write_line(out, row, &widths)?;
    }
    Ok(())
}

fn write_line<W: Write>(out: &mut W, cells: &[String], widths: &[usize]) -> io::Result<()> {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| {
            let pad = width.saturating_sub(cell.chars().count());
            format!("{cell}{}", " ".repeat(pad))
        })
        .collect();
    writeln!(out, "{}", padded.join("  ").trim_end())
}

fn name_of(reference: Option<&Reference>) -> String {
    reference
        .map(|reference| {
            reference
                .name()
                .map(str::to_string)
                .unwrap_or_else(|| reference.id().to_string())
        })
        .unwrap_or_default()
}

fn date(value: Option<DateTime<Utc>>) -> String {
    value
        .map(|value| value.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

fn timestamp(value: Option<DateTime<Utc>>) -> String {
    value
        .map(|value| value.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_default()
}

#[derive(Debug, Serialize)]
pub(crate) struct StudentRow {
    id: String,
    name: String,
    phone: String,
    status: &'static str,
    status_label: &'static str,
    branch: String,
    created_at: String,
}

impl From<&Student> for StudentRow {
    fn from(student: &Student) -> Self {
        Self {
            id: student.id.to_string(),
            name: student.name.clone(),
            phone: student.phone.clone().unwrap_or_default(),
            status: student.status.as_str(),
            status_label: student.status.display_label(),
            branch: name_of(student.branch.as_ref()),
            created_at: date(student.created_at),
        }
    }
}

impl TableRow for StudentRow {
    const HEADERS: &'static [&'static str] =
        &["id", "name", "phone", "status", "status_label", "branch", "created_at"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.name.clone(),
            self.phone.clone(),
            self.status.to_string(),
            self.status_label.to_string(),
            self.branch.clone(),
            self.created_at.clone(),
        ]
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct EnrollmentRow {
    id: String,
    student: String,
    course: String,
    teacher: String,
    status: &'static str,
    status_label: &'static str,
    start_date: String,
    rejection_reason: String,
}

impl From<&Enrollment> for EnrollmentRow {
    fn from(enrollment: &Enrollment) -> Self {
        Self {
            id: enrollment.id.to_string(),
            student: name_of(enrollment.student.as_ref()),
            course: name_of(enrollment.course.as_ref()),
            teacher: name_of(enrollment.teacher.as_ref()),
            status: enrollment.status.as_str(),
            status_label: enrollment.status.display_label(),
            start_date: date(enrollment.start_date),
            rejection_reason: enrollment.rejection_reason.clone().unwrap_or_default(),
        }
    }
}

impl TableRow for EnrollmentRow {
    const HEADERS: &'static [&'static str] = &[
        "id",
        "student",
        "course",
        "teacher",
        "status",
        "status_label",
        "start_date",
        "rejection_reason",
    ];

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.student.clone(),
            self.course.clone(),
            self.teacher.clone(),
            self.status.to_string(),
            self.status_label.to_string(),
            self.start_date.clone(),
            self.rejection_reason.clone(),
        ]
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct RosterRow {
    id: String,
    name: String,
    phone: String,
    status: &'static str,
    branch: String,
    admin: String,
    teacher: String,
    course: String,
    enrollment_status: &'static str,
}

impl From<&RosterEntry> for RosterRow {
    fn from(entry: &RosterEntry) -> Self {
        let student = &entry.student;
        Self {
            id: student.id.to_string(),
            name: student.name.clone(),
            phone: student.phone.clone().unwrap_or_default(),
            status: student.status.display_label(),
            branch: name_of(student.branch.as_ref()),
            admin: name_of(student.admin.as_ref()),
            teacher: entry.teacher_name().unwrap_or_default().to_string(),
            course: entry.course_name().unwrap_or_default().to_string(),
            enrollment_status: entry
                .current_enrollment
                .status
                .map(AdmissionStatus::display_label)
                .unwrap_or("-"),
        }
    }
}

impl TableRow for RosterRow {
    const HEADERS: &'static [&'static str] = &[
        "id",
        "name",
        "phone",
        "status",
        "branch",
        "admin",
        "teacher",
        "course",
        "enrollment_status",
    ];

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.name.clone(),
            self.phone.clone(),
            self.status.to_string(),
            self.branch.clone(),
            self.admin.clone(),
            self.teacher.clone(),
            self.course.clone(),
            self.enrollment_status.to_string(),
        ]
    }
}

/// Two-column rows for the simpler directory listings.
#[derive(Debug, Serialize)]
pub(crate) struct DirectoryRow {
    id: String,
    name: String,
    detail: String,
}

impl TableRow for DirectoryRow {
    const HEADERS: &'static [&'static str] = &["id", "name", "detail"];

    fn cells(&self) -> Vec<String> {
        vec![self.id.clone(), self.name.clone(), self.detail.clone()]
    }
}

impl From<&Admin> for DirectoryRow {
    fn from(admin: &Admin) -> Self {
        Self {
            id: admin.id.to_string(),
            name: admin.name.clone(),
            detail: admin
                .role
                .as_ref()
                .map(|role| role.name.clone())
                .unwrap_or_default(),
        }
    }
}

impl From<&Branch> for DirectoryRow {
    fn from(branch: &Branch) -> Self {
        Self {
            id: branch.id.to_string(),
            name: branch.name.clone(),
            detail: branch.address.clone().unwrap_or_default(),
        }
    }
}

impl From<&RoleGrant> for DirectoryRow {
    fn from(role: &RoleGrant) -> Self {
        let codes: Vec<&str> = role.permissions.iter().map(|p| p.code.as_str()).collect();
        Self {
            id: role.id.to_string(),
            name: role.name.clone(),
            detail: codes.join(" "),
        }
    }
}

impl From<&PermissionEntry> for DirectoryRow {
    fn from(permission: &PermissionEntry) -> Self {
        Self {
            id: permission.id.to_string(),
            name: permission.name.clone(),
            detail: permission.code.clone(),
        }
    }
}

impl From<&Teacher> for DirectoryRow {
    fn from(teacher: &Teacher) -> Self {
        Self {
            id: teacher.id.to_string(),
            name: teacher.name.clone(),
            detail: name_of(teacher.branch.as_ref()),
        }
    }
}

impl From<&Course> for DirectoryRow {
    fn from(course: &Course) -> Self {
        Self {
            id: course.id.to_string(),
            name: course.name.clone(),
            detail: format!("price {} / duration {}", course.price, course.duration),
        }
    }
}

impl From<&Round> for DirectoryRow {
    fn from(round: &Round) -> Self {
        Self {
            id: round.id.to_string(),
            name: round
                .course
                .as_ref()
                .map(|course| course.name.clone())
                .unwrap_or_default(),
            detail: format!(
                "{} -> {} | {} | {} enrolled",
                date(round.start_date),
                date(round.end_date),
                name_of(round.teacher.as_ref()),
                round.enrollments.len()
            ),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct LogRow {
    created_at: String,
    author: String,
    student: String,
    note: String,
}

impl From<&EnrollmentLog> for LogRow {
    fn from(log: &EnrollmentLog) -> Self {
        Self {
            created_at: timestamp(log.created_at),
            author: name_of(log.author.as_ref()),
            student: name_of(log.student.as_ref()),
            note: log.note.clone(),
        }
    }
}

impl TableRow for LogRow {
    const HEADERS: &'static [&'static str] = &["created_at", "author", "student", "note"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.created_at.clone(),
            self.author.clone(),
            self.student.clone(),
            self.note.clone(),
        ]
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ReportRow {
    branch: String,
    new_students: u64,
    new_students_accepted: u64,
    new_enrollments: u64,
    new_enrollments_accepted: u64,
    pending: u64,
    active: u64,
    late: u64,
    graduated: u64,
    rejected: u64,
    dropout: u64,
}

impl ReportRow {
    fn build(branch: String, counts: [u64; 4], statuses: &StatusCounts) -> Self {
        let [new_students, new_students_accepted, new_enrollments, new_enrollments_accepted] =
            counts;
        Self {
            branch,
            new_students,
            new_students_accepted,
            new_enrollments,
            new_enrollments_accepted,
            pending: statuses.pending,
            active: statuses.active,
            late: statuses.late,
            graduated: statuses.graduated,
            rejected: statuses.rejected,
            dropout: statuses.dropout,
        }
    }
}

impl From<&BranchReport> for ReportRow {
    fn from(report: &BranchReport) -> Self {
        Self::build(
            report.branch_name.clone(),
            [
                report.new_students,
                report.new_students_accepted,
                report.new_enrollments,
                report.new_enrollments_accepted,
            ],
            &report.enrollment_status_counts,
        )
    }
}

impl From<&SystemReport> for ReportRow {
    fn from(report: &SystemReport) -> Self {
        Self::build(
            "TOTAL".to_string(),
            [
                report.new_students,
                report.new_students_accepted,
                report.new_enrollments,
                report.new_enrollments_accepted,
            ],
            &report.enrollment_status_counts,
        )
    }
}

impl TableRow for ReportRow {
    const HEADERS: &'static [&'static str] = &[
        "branch",
        "new_students",
        "new_students_accepted",
        "new_enrollments",
        "new_enrollments_accepted",
        "pending",
        "active",
        "late",
        "graduated",
        "rejected",
        "dropout",
    ];

    fn cells(&self) -> Vec<String> {
        vec![
            self.branch.clone(),
            self.new_students.to_string(),
            self.new_students_accepted.to_string(),
            self.new_enrollments.to_string(),
            self.new_enrollments_accepted.to_string(),
            self.pending.to_string(),
            self.active.to_string(),
            self.late.to_string(),
            self.graduated.to_string(),
            self.rejected.to_string(),
            self.dropout.to_string(),
        ]
    }
}

/// `all (12) | بنتظار القبول (3) | ...`
pub(crate) fn tab_line(tabs: &[StatusTab]) -> String {
    tabs.iter()
        .map(|tab| {
            let label = match tab.filter {
                StatusFilter::All => "all",
                StatusFilter::Only(status) => status.display_label(),
            };
            format!("{label} ({})", tab.count)
        })
        .collect::<Vec<_>>()
        .join(" | ")
}
