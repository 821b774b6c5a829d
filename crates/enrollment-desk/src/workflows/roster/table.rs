use std::cmp::Ordering;

use super::{RosterEntry, StatusFilter};
use crate::workflows::domain::AdmissionStatus;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortColumn {
    #[default]
    Name,
    CreatedAt,
    Status,
}

impl SortColumn {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "name" => Some(Self::Name),
            "created" | "createdat" | "created_at" => Some(Self::CreatedAt),
            "status" => Some(Self::Status),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// Stable sort: rows that compare equal keep the server's order in both
/// directions.
pub fn sort_rows(rows: &mut [RosterEntry], column: SortColumn, direction: SortDirection) {
    rows.sort_by(|a, b| {
        let order = compare(a, b, column);
        match direction {
            SortDirection::Asc => order,
            SortDirection::Desc => order.reverse(),
        }
    });
}

fn compare(a: &RosterEntry, b: &RosterEntry, column: SortColumn) -> Ordering {
    match column {
        SortColumn::Name => a
            .student
            .name
            .to_lowercase()
            .cmp(&b.student.name.to_lowercase()),
        SortColumn::CreatedAt => a.student.created_at.cmp(&b.student.created_at),
        SortColumn::Status => a.student.status.as_str().cmp(b.student.status.as_str()),
    }
}

/// Rows shown on zero-based `page`.
pub fn rows_in_page<T>(rows: &[T], page: usize, rows_per_page: usize) -> &[T] {
    let start = page.saturating_mul(rows_per_page).min(rows.len());
    let end = start.saturating_add(rows_per_page).min(rows.len());
    &rows[start..end]
}

/// Filler rows keeping the last page's height; the first page never pads.
pub fn empty_rows(page: usize, rows_per_page: usize, total: usize) -> usize {
    if page == 0 {
        return 0;
    }
    (page + 1)
        .saturating_mul(rows_per_page)
        .saturating_sub(total)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusTab {
    pub filter: StatusFilter,
    pub count: usize,
}

/// `all` first, then one tab per status in display order.
pub fn status_tabs(rows: &[RosterEntry]) -> Vec<StatusTab> {
    let mut tabs = vec![StatusTab {
        filter: StatusFilter::All,
        count: rows.len(),
    }];
    tabs.extend(AdmissionStatus::ordered().into_iter().map(|status| StatusTab {
        filter: StatusFilter::Only(status),
        count: rows
            .iter()
            .filter(|row| row.student.status == status)
            .count(),
    }));
    tabs
}
