use super::{event_date_text, event_location_text, event_name, event_time_text};
use crate::components::google_calendar::CalendarEvent;
use chrono_tz::Tz;

/// File name offered for the exported table
pub const CSV_FILE_NAME: &str = "events.csv";

const CSV_HEADER: &str = "Name,Date,Time,Location";

/// Render the full fetched event list as CSV, one row per event.
///
/// The export always covers the unfiltered list, independent of the table's
/// current filters and page.
pub fn export_events(events: &[CalendarEvent], tz: &Tz) -> String {
    let mut out = String::from(CSV_HEADER);
    out.push_str("\r\n");

    for event in events {
        let row = [
            escape_field(event_name(event)),
            escape_field(&event_date_text(event, tz)),
            escape_field(&event_time_text(event, tz)),
            escape_field(event_location_text(event)),
        ];
        out.push_str(&row.join(","));
        out.push_str("\r\n");
    }

    out
}

/// Quote a field when it contains separators, quotes or line breaks
fn escape_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn export_substitutes_fallbacks() {
        let events = vec![
            CalendarEvent {
                id: "e1".to_string(),
                summary: Some("Standup".to_string()),
                location: Some("Room 1".to_string()),
                start_date_time: Some("2024-03-01T09:00:00+00:00".to_string()),
                ..Default::default()
            },
            CalendarEvent {
                id: "e2".to_string(),
                start_date: Some("2024-03-02".to_string()),
                ..Default::default()
            },
        ];

        let csv = export_events(&events, &chrono_tz::UTC);
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines[0], "Name,Date,Time,Location");
        assert_eq!(lines[1], "Standup,3/1/2024,9:00:00 AM,Room 1");
        assert_eq!(lines[2], "No Title,3/2/2024,All Day,N/A");
    }

    #[test]
    fn export_of_no_events_is_just_the_header() {
        let csv = export_events(&[], &chrono_tz::UTC);
        assert_eq!(csv, "Name,Date,Time,Location\r\n");
    }

    #[test]
    fn fields_with_separators_are_quoted() {
        assert_eq!(escape_field("plain"), "plain");
        assert_eq!(escape_field("a,b"), "\"a,b\"");
        assert_eq!(escape_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(escape_field("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn event_with_comma_in_location_round_trips() {
        let events = vec![CalendarEvent {
            summary: Some("Offsite".to_string()),
            location: Some("Helsinki, Finland".to_string()),
            start_date: Some("2024-03-02".to_string()),
            ..Default::default()
        }];

        let csv = export_events(&events, &chrono_tz::UTC);
        assert!(csv.contains("Offsite,3/2/2024,All Day,\"Helsinki, Finland\""));
    }
}
