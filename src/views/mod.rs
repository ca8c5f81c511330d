/// Views Module Index
///
/// The portal's list, form and dashboard components. Each component owns its own
/// state, fetches on mount through the shared `PortalApi`, and renders to plain text.
/// Remote failures never leave a component: they are turned into banner strings here.
pub mod announcements;
pub mod course_detail;
pub mod course_form;
pub mod course_list;
pub mod dashboard;
pub mod layout;
pub mod lifecycle;
pub mod login;
pub mod meeting_form;
pub mod schedule_list;
pub mod users;

use chrono::{DateTime, Local, Utc};

pub use lifecycle::{FetchScope, ListResource, LoadState, Mutation};

/// Placeholder shown while a component's fetch is in flight.
pub const LOADING_TEXT: &str = "Loading...";

/// truncate
///
/// Cuts `text` to at most `max` characters, appending "..." when something was cut.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let head: String = text.chars().take(max).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

/// Local date and time, minute precision.
pub fn format_datetime(at: &DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

/// Local date only.
pub fn format_date(at: &DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%Y-%m-%d").to_string()
}

/// render_state
///
/// The shared rendering of a list's load state: the loading placeholder, the error
/// banner, the empty-state text (exactly once), or one block of lines per item.
pub fn render_state<T>(
    state: &LoadState<T>,
    empty_text: &str,
    mut render_item: impl FnMut(&T) -> Vec<String>,
) -> Vec<String> {
    match state {
        LoadState::Loading => vec![LOADING_TEXT.to_string()],
        LoadState::Failed(message) => vec![format!("Error: {}", message)],
        LoadState::Ready(items) if items.is_empty() => vec![empty_text.to_string()],
        LoadState::Ready(items) => items.iter().flat_map(|item| render_item(item)).collect(),
    }
}
