use super::models::CalendarEvent;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;

/// Get the effective start instant of an event.
///
/// The timed start takes precedence; an all-day date counts as midnight in
/// the given timezone. Returns `None` when neither field parses.
pub fn effective_start(event: &CalendarEvent, tz: &Tz) -> Option<DateTime<Utc>> {
    if let Some(date_time) = &event.start_date_time {
        if let Ok(dt) = DateTime::parse_from_rfc3339(date_time) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    if let Some(date) = &event.start_date {
        if let Ok(day) = NaiveDate::parse_from_str(date, "%Y-%m-%d") {
            let midnight = day.and_hms_opt(0, 0, 0)?;
            return tz
                .from_local_datetime(&midnight)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc));
        }
    }

    None
}

/// Calendar day an event lands on, in the given timezone
pub fn effective_start_date(event: &CalendarEvent, tz: &Tz) -> Option<NaiveDate> {
    effective_start(event, tz).map(|dt| dt.with_timezone(tz).date_naive())
}

/// Format the effective start date for display
pub fn format_event_date(event: &CalendarEvent, tz: &Tz) -> Option<String> {
    effective_start(event, tz).map(|dt| dt.with_timezone(tz).format("%-m/%-d/%Y").to_string())
}

/// Format the time of day for display.
///
/// Returns `None` for all-day events and events without a parseable timed
/// start, so callers can substitute their all-day label.
pub fn format_event_time(event: &CalendarEvent, tz: &Tz) -> Option<String> {
    let date_time = event.start_date_time.as_deref()?;
    let dt = DateTime::parse_from_rfc3339(date_time).ok()?;
    Some(dt.with_timezone(tz).format("%-I:%M:%S %p").to_string())
}

/// Sort events newest-first by their effective start instant.
///
/// The comparator is stable; events with no parseable start sort last.
pub fn sort_descending_by_start(events: &mut [CalendarEvent], tz: &Tz) {
    events.sort_by(|a, b| {
        let start_a = effective_start(a, tz);
        let start_b = effective_start(b, tz);
        start_b.cmp(&start_a)
    });
}
