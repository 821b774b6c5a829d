use std::fmt;

use super::RosterEntry;
use crate::workflows::domain::{AdmissionStatus, RecordId, Reference};

/// Student status tab selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Only(AdmissionStatus),
}

impl StatusFilter {
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.trim().eq_ignore_ascii_case("all") {
            return Some(Self::All);
        }
        AdmissionStatus::parse(raw).map(Self::Only)
    }

    pub fn matches(self, status: AdmissionStatus) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => wanted == status,
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Only(status) => f.write_str(status.as_str()),
        }
    }
}

/// Roster filters. Empty lists and an empty name mean "no constraint".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RosterFilters {
    /// Case-insensitive substring of the student's name or phone.
    pub name: String,
    pub admins: Vec<RecordId>,
    pub branches: Vec<RecordId>,
    /// Teacher of the current enrollment.
    pub teachers: Vec<RecordId>,
    /// Status of the current enrollment.
    pub enrollment_statuses: Vec<AdmissionStatus>,
    pub status: StatusFilter,
}

impl RosterFilters {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Same filters with the status tab reset to `all`.
    pub fn without_status(&self) -> Self {
        Self {
            status: StatusFilter::All,
            ..self.clone()
        }
    }

    /// Keeps matching rows in their incoming order.
    pub fn apply(&self, rows: &[RosterEntry]) -> Vec<RosterEntry> {
        let search = self.name.trim().to_lowercase();
        rows.iter()
            .filter(|row| self.matches(row, &search))
            .cloned()
            .collect()
    }

    fn matches(&self, row: &RosterEntry, search: &str) -> bool {
        let student = &row.student;
        if !self.admins.is_empty() && !contains_ref(&self.admins, student.admin.as_ref()) {
            return false;
        }
        if !self.branches.is_empty() && !contains_ref(&self.branches, student.branch.as_ref()) {
            return false;
        }
        if !self.status.matches(student.status) {
            return false;
        }
        let current = &row.current_enrollment;
        if !self.teachers.is_empty() && !contains_ref(&self.teachers, current.teacher.as_ref()) {
            return false;
        }
        if !self.enrollment_statuses.is_empty()
            && !current
                .status
                .is_some_and(|status| self.enrollment_statuses.contains(&status))
        {
            return false;
        }
        if !search.is_empty() {
            let in_name = student.name.to_lowercase().contains(search);
            let in_phone = student
                .phone
                .as_deref()
                .is_some_and(|phone| phone.to_lowercase().contains(search));
            if !in_name && !in_phone {
                return false;
            }
        }
        true
    }
}

fn contains_ref(ids: &[RecordId], reference: Option<&Reference>) -> bool {
    reference.is_some_and(|reference| ids.contains(reference.id()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::roster::fixtures::row;

    fn roster() -> Vec<RosterEntry> {
        vec![
            row("s-1", "Amal Saeed", "0501112233", "active", "b-1", Some(("t-1", "Karim")), Some("active")),
            row("s-2", "Bilal Omar", "0509998877", "pending", "b-2", None, None),
            row("s-3", "Dana Ali", "0551112233", "active", "b-2", Some(("t-2", "Rania")), Some("late")),
        ]
    }

    fn ids(rows: &[RosterEntry]) -> Vec<&str> {
        rows.iter().map(|row| row.student.id.as_str()).collect()
    }

    #[test]
    fn empty_filters_keep_everything_in_order() {
        let filters = RosterFilters::default();
        assert!(filters.is_empty());
        assert_eq!(ids(&filters.apply(&roster())), ["s-1", "s-2", "s-3"]);
    }

    #[test]
    fn name_search_covers_phone_and_ignores_case() {
        let filters = RosterFilters {
            name: "  DANA ".to_string(),
            ..RosterFilters::default()
        };
        assert_eq!(ids(&filters.apply(&roster())), ["s-3"]);

        let filters = RosterFilters {
            name: "1112233".to_string(),
            ..RosterFilters::default()
        };
        assert_eq!(ids(&filters.apply(&roster())), ["s-1", "s-3"]);
    }

    #[test]
    fn filters_combine() {
        let filters = RosterFilters {
            branches: vec![RecordId::new("b-2")],
            status: StatusFilter::Only(AdmissionStatus::Active),
            ..RosterFilters::default()
        };
        assert_eq!(ids(&filters.apply(&roster())), ["s-3"]);

        let filters = RosterFilters {
            teachers: vec![RecordId::new("t-1"), RecordId::new("t-2")],
            enrollment_statuses: vec![AdmissionStatus::Late],
            ..RosterFilters::default()
        };
        assert_eq!(ids(&filters.apply(&roster())), ["s-3"]);
    }

    #[test]
    fn rows_without_current_enrollment_fail_enrollment_filters() {
        let filters = RosterFilters {
            enrollment_statuses: vec![AdmissionStatus::Pending],
            ..RosterFilters::default()
        };
        assert!(filters.apply(&roster()).is_empty());
    }

    #[test]
    fn status_filter_parses_all_and_statuses() {
        assert_eq!(StatusFilter::parse("ALL"), Some(StatusFilter::All));
        assert_eq!(
            StatusFilter::parse("graduated"),
            Some(StatusFilter::Only(AdmissionStatus::Graduated))
        );
        assert_eq!(StatusFilter::parse("archived"), None);
        assert_eq!(StatusFilter::Only(AdmissionStatus::Late).to_string(), "late");
    }
}
