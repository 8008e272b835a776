use crate::components::google_calendar::{time, CalendarEvent};
use chrono::NaiveDate;
use chrono_tz::Tz;

/// Number of events shown per table page
pub const EVENTS_PER_PAGE: usize = 5;

/// Filter and pager state for the events table.
///
/// Rebuilt from query parameters on every request; the visible rows are a
/// pure function of this plus the fetched event list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    /// Case-insensitive substring matched against event summaries
    pub search_term: String,
    /// Calendar day the table is narrowed to, if any
    pub selected_date: Option<NaiveDate>,
    /// 1-indexed page number
    pub current_page: usize,
}

impl ViewState {
    pub fn new() -> Self {
        Self {
            search_term: String::new(),
            selected_date: None,
            current_page: 1,
        }
    }
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new()
    }
}

/// True when the event lands on the given calendar day.
///
/// Events with no parseable start never match a selected date.
fn matches_date(event: &CalendarEvent, date: NaiveDate, tz: &Tz) -> bool {
    time::effective_start_date(event, tz) == Some(date)
}

/// True when the summary contains the search term, ignoring case.
///
/// A missing summary counts as an empty string, so it matches only the
/// empty search term.
fn matches_name(event: &CalendarEvent, term: &str) -> bool {
    if term.is_empty() {
        return true;
    }
    let summary = event.summary.as_deref().unwrap_or("");
    summary.to_lowercase().contains(&term.to_lowercase())
}

/// Apply both filters; an inactive filter matches everything
pub fn filtered_events<'a>(
    events: &'a [CalendarEvent],
    view: &ViewState,
    tz: &Tz,
) -> Vec<&'a CalendarEvent> {
    events
        .iter()
        .filter(|event| {
            let date_ok = view
                .selected_date
                .map_or(true, |date| matches_date(event, date, tz));
            date_ok && matches_name(event, &view.search_term)
        })
        .collect()
}

/// Number of pager pages for a filtered list of the given length
pub fn page_count(filtered_len: usize) -> usize {
    filtered_len.div_ceil(EVENTS_PER_PAGE)
}

/// Clamp a requested page into the valid range for the filtered list
pub fn clamp_page(requested: usize, filtered_len: usize) -> usize {
    requested.clamp(1, page_count(filtered_len).max(1))
}

/// Rows of the filtered list shown on the given 1-indexed page
pub fn page_slice<'a, 'b>(
    filtered: &'b [&'a CalendarEvent],
    page: usize,
) -> &'b [&'a CalendarEvent] {
    let start = (page.max(1) - 1) * EVENTS_PER_PAGE;
    if start >= filtered.len() {
        return &[];
    }
    let end = (start + EVENTS_PER_PAGE).min(filtered.len());
    &filtered[start..end]
}
