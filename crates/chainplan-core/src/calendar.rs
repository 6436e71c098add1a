//! Effort → calendar-time conversion.
//!
//! Time is continuous calendar time: a working day of `hours_per_day` hours
//! is stretched over 24 calendar hours, so 8 h of effort at 8 h/day is one
//! full calendar day. Weekends and holidays are not modelled.

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};

use crate::error::PlanError;
use crate::model::ProjectSettings;

const MS_PER_HOUR: f64 = 3_600_000.0;

/// Calendar span covered by `effort_hours` of work, or `None` when the span
/// does not fit in a [`TimeDelta`].
///
/// `hours_per_day` is floored to 1 so tiny or zero values cannot blow the
/// span up.
#[must_use]
pub fn calendar_duration(effort_hours: f64, hours_per_day: f64) -> Option<TimeDelta> {
    let hours_per_day = hours_per_day.max(1.0);
    hours_to_delta(effort_hours * (24.0 / hours_per_day))
}

/// The instant the terminal task must finish: the due date at midnight minus
/// the project buffer in calendar days.
///
/// # Errors
///
/// [`PlanError::InvalidSettings`] if the buffer moves the terminal end
/// outside the representable date range.
pub fn terminal_end(settings: &ProjectSettings) -> Result<NaiveDateTime, PlanError> {
    hours_to_delta(settings.project_buffer_days * 24.0)
        .and_then(|buffer| midnight(settings.due_date).checked_sub_signed(buffer))
        .ok_or_else(|| {
            PlanError::InvalidSettings(format!(
                "projectBufferDays {} moves the terminal end out of the supported date range",
                settings.project_buffer_days
            ))
        })
}

/// `date` at 00:00.
#[must_use]
pub fn midnight(date: NaiveDate) -> NaiveDateTime {
    date.and_time(chrono::NaiveTime::MIN)
}

/// Round calendar hours to whole milliseconds.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn hours_to_delta(hours: f64) -> Option<TimeDelta> {
    let ms = (hours * MS_PER_HOUR).round();
    // `as i64` saturates, so out-of-range values must be caught here.
    if !ms.is_finite() || ms.abs() >= i64::MAX as f64 {
        return None;
    }
    TimeDelta::try_milliseconds(ms as i64)
}
