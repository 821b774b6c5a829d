use std::io::{self, BufRead, Write};

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use enrollment_desk::workflows::admission::{ConfirmationGate, ProgressStatus};
use enrollment_desk::workflows::domain::AdmissionStatus;
use enrollment_desk::workflows::roster::StatusFilter;
use tracing::debug;

/// Asks on stderr and reads the answer from stdin. Anything other than
/// `y`/`yes` declines, including a closed stdin.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct PromptGate;

impl ConfirmationGate for PromptGate {
    fn confirm(&self, question: &str) -> bool {
        let mut stderr = io::stderr();
        if write!(stderr, "{question} [y/N] ").and_then(|_| stderr.flush()).is_err() {
            return false;
        }
        let mut answer = String::new();
        match io::stdin().lock().read_line(&mut answer) {
            Ok(_) => is_yes(&answer),
            Err(err) => {
                debug!(error = %err, "confirmation prompt could not read stdin");
                false
            }
        }
    }
}

/// `--yes` skips the prompt entirely.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Gate {
    Assume,
    Prompt(PromptGate),
}

impl Gate {
    pub(crate) fn from_flag(yes: bool) -> Self {
        if yes {
            Gate::Assume
        } else {
            Gate::Prompt(PromptGate)
        }
    }
}

impl ConfirmationGate for Gate {
    fn confirm(&self, question: &str) -> bool {
        match self {
            Gate::Assume => true,
            Gate::Prompt(prompt) => prompt.confirm(question),
        }
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes" | "نعم")
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

pub(crate) fn parse_status(raw: &str) -> Result<AdmissionStatus, String> {
    AdmissionStatus::parse(raw).ok_or_else(|| {
        format!("unknown status '{raw}' (pending, active, late, dropout, graduated, rejected)")
    })
}

pub(crate) fn parse_progress(raw: &str) -> Result<ProgressStatus, String> {
    ProgressStatus::parse(raw)
        .ok_or_else(|| format!("unknown status '{raw}' (active, late, dropout, graduated)"))
}

pub(crate) fn parse_status_filter(raw: &str) -> Result<StatusFilter, String> {
    StatusFilter::parse(raw).ok_or_else(|| format!("unknown status '{raw}' (all or a status)"))
}

/// Midnight UTC at the start of `date`.
pub(crate) fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

/// Last millisecond of `date`, so a one-day window covers the whole day.
pub(crate) fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
    let last = NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::MIN);
    Utc.from_utc_datetime(&date.and_time(last))
}
