//! Calendar-day due date logic.
//!
//! Due dates are plain calendar days. Comparisons never look at time of day and
//! never shift the due date through a timezone; only "today" depends on the
//! local clock.

use serde::{Deserialize, Serialize};
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Date, OffsetDateTime};

use crate::Task;

/// Format used for due dates on the wire and in forms (`YYYY-MM-DD`).
pub const DAY_FORMAT: &[BorrowedFormatItem<'_>] = format_description!("[year]-[month]-[day]");

time::serde::format_description!(pub day_serde, Date, "[year]-[month]-[day]");

/// Parse a `YYYY-MM-DD` calendar day.
///
/// Only the first ten characters are considered, so values such as
/// `2025-03-01T00:00:00` still resolve to the calendar day they name.
///
/// # Errors
/// Returns an error when the leading day component is not a valid date.
pub fn parse_day(raw: &str) -> Result<Date, time::error::Parse> {
    let trimmed = raw.trim();
    let day = trimmed.get(..10).unwrap_or(trimmed);
    Date::parse(day, DAY_FORMAT)
}

/// Render a calendar day as `YYYY-MM-DD`.
#[must_use]
pub fn format_day(day: Date) -> String {
    day.format(DAY_FORMAT).unwrap_or_else(|_| day.to_string())
}

/// Current calendar day on the local clock.
///
/// Falls back to UTC when the local offset cannot be determined.
#[must_use]
pub fn local_today() -> Date {
    OffsetDateTime::now_local()
        .unwrap_or_else(|err| {
            tracing::debug!("local offset unavailable ({err}), using UTC for today");
            OffsetDateTime::now_utc()
        })
        .date()
}

/// Position of a due date relative to today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DueStatus {
    /// Due strictly before today.
    Overdue,
    /// Due today.
    Today,
    /// Due after today.
    Upcoming,
}

impl DueStatus {
    /// Classify `due` against `today`.
    #[must_use]
    pub fn classify(due: Date, today: Date) -> Self {
        match due.cmp(&today) {
            std::cmp::Ordering::Less => Self::Overdue,
            std::cmp::Ordering::Equal => Self::Today,
            std::cmp::Ordering::Greater => Self::Upcoming,
        }
    }
}

/// An incomplete task whose due day is strictly before `today`.
#[must_use]
pub fn is_overdue(task: &Task, today: Date) -> bool {
    !task.completed && DueStatus::classify(task.due_date, today) == DueStatus::Overdue
}

/// An incomplete task due on `today`.
#[must_use]
pub fn is_due_today(task: &Task, today: Date) -> bool {
    !task.completed && DueStatus::classify(task.due_date, today) == DueStatus::Today
}
