pub mod csv;
pub mod state;

use crate::components::google_calendar::{time, CalendarEvent};
use chrono_tz::Tz;

/// Display fallback for events without a summary
pub const NO_TITLE: &str = "No Title";

/// Display value for events without a time of day
pub const ALL_DAY: &str = "All Day";

/// Display fallback for events without a location
pub const NO_LOCATION: &str = "N/A";

/// Event name as displayed in the table and the CSV export
pub fn event_name(event: &CalendarEvent) -> &str {
    event.summary.as_deref().unwrap_or(NO_TITLE)
}

/// Event date as displayed; empty when the event has no parseable start
pub fn event_date_text(event: &CalendarEvent, tz: &Tz) -> String {
    time::format_event_date(event, tz).unwrap_or_default()
}

/// Event time of day as displayed, with all-day events labelled as such
pub fn event_time_text(event: &CalendarEvent, tz: &Tz) -> String {
    time::format_event_time(event, tz).unwrap_or_else(|| ALL_DAY.to_string())
}

/// Event location as displayed
pub fn event_location_text(event: &CalendarEvent) -> &str {
    event.location.as_deref().unwrap_or(NO_LOCATION)
}
