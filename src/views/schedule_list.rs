use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::Arc;

use crate::client::ApiState;
use crate::models::{Role, Schedule, ScheduleFilter, ScheduleStatus, ScheduleStatusUpdate};
use crate::views::{ListResource, LoadState, format_datetime, render_state};

pub const EMPTY_TEXT: &str = "No schedules found for this filter.";
pub const UPDATE_ERROR: &str = "Failed to update status.";

/// Colour class of a status badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusTone {
    Success,
    Warning,
    Error,
    Info,
}

impl StatusTone {
    pub fn for_status(status: ScheduleStatus) -> Self {
        match status {
            ScheduleStatus::Confirmed => StatusTone::Success,
            ScheduleStatus::Pending => StatusTone::Warning,
            ScheduleStatus::Rejected | ScheduleStatus::Cancelled => StatusTone::Error,
            ScheduleStatus::Completed => StatusTone::Info,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StatusTone::Success => "success",
            StatusTone::Warning => "warning",
            StatusTone::Error => "error",
            StatusTone::Info => "info",
        }
    }
}

pub fn heading(filter: ScheduleFilter) -> String {
    let label = filter.as_str();
    let mut chars = label.chars();
    let capitalized = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
        None => String::new(),
    };
    format!("{} Meetings / Requests", capitalized)
}

pub fn load_error(filter: ScheduleFilter) -> String {
    format!("Failed to load schedules ({}).", filter.as_str())
}

/// ScheduleRow
///
/// The lines shown for one meeting, from the point of view of `viewer`.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleRow {
    pub id: String,
    pub counterpart: String,
    pub status: ScheduleStatus,
    pub tone: StatusTone,
    pub time: String,
    pub message: Option<String>,
    pub notes: Option<String>,
    pub actionable: bool,
}

impl ScheduleRow {
    pub fn build(schedule: &Schedule, viewer: Role) -> Self {
        let counterpart = if viewer == Role::Mentor {
            let name = schedule
                .mentee
                .as_ref()
                .map(|m| m.display_name())
                .unwrap_or_default();
            format!("Mentee: {}", name)
        } else {
            let name = schedule
                .mentor
                .as_ref()
                .map(|m| m.display_name())
                .unwrap_or_default();
            format!("Mentor: {}", name)
        };

        let time = match (schedule.status, schedule.confirmed_time) {
            (ScheduleStatus::Confirmed, Some(confirmed)) => format!(
                "Confirmed: {} for {} mins",
                format_datetime(&confirmed),
                schedule.duration_minutes
            ),
            _ => format!(
                "Requested: {} for {} mins",
                format_datetime(&schedule.requested_time),
                schedule.duration_minutes
            ),
        };

        Self {
            id: schedule.id.clone(),
            counterpart,
            status: schedule.status,
            tone: StatusTone::for_status(schedule.status),
            time,
            message: schedule.message.clone().filter(|m| !m.is_empty()),
            notes: schedule.mentor_notes.clone().filter(|n| !n.is_empty()),
            actionable: viewer == Role::Mentor && schedule.status == ScheduleStatus::Pending,
        }
    }

    fn lines(&self, expanded: bool) -> Vec<String> {
        let marker = if expanded { "-" } else { "+" };
        let mut lines = vec![format!(
            "{} [{}] {} ({})",
            marker,
            self.status.as_str(),
            self.counterpart,
            self.tone.as_str()
        )];
        lines.push(format!("    {}", self.time));
        if expanded {
            if let Some(message) = &self.message {
                lines.push(format!("    Mentee Message: \"{}\"", message));
            }
            if let Some(notes) = &self.notes {
                lines.push(format!("    Mentor Notes: \"{}\"", notes));
            }
            if self.actionable {
                lines.push(format!("    Actions: confirm {} | reject {}", self.id, self.id));
            }
        }
        lines
    }
}

/// ScheduleList
///
/// Meetings for one filter. Status changes are not patched locally; a successful
/// change refetches the list.
#[derive(Clone)]
pub struct ScheduleList {
    api: ApiState,
    filter: ScheduleFilter,
    viewer: Role,
    resource: ListResource<Schedule>,
    expanded: Arc<Mutex<Option<String>>>,
}

impl ScheduleList {
    pub fn new(api: ApiState, filter: ScheduleFilter, viewer: Role) -> Self {
        Self {
            api,
            filter,
            viewer,
            resource: ListResource::new(),
            expanded: Arc::new(Mutex::new(None)),
        }
    }

    pub fn filter(&self) -> ScheduleFilter {
        self.filter
    }

    pub async fn refresh(&self) -> LoadState<Schedule> {
        self.resource
            .load(self.api.list_schedules(self.filter), &load_error(self.filter))
            .await
    }

    pub fn teardown(&self) {
        self.resource.teardown();
    }

    pub fn state(&self) -> LoadState<Schedule> {
        self.resource.state()
    }

    pub fn rows(&self) -> Vec<ScheduleRow> {
        self.resource
            .items()
            .iter()
            .map(|s| ScheduleRow::build(s, self.viewer))
            .collect()
    }

    /// toggle_expanded
    ///
    /// At most one row is expanded; expanding another collapses the previous one.
    pub fn toggle_expanded(&self, id: &str) {
        let mut expanded = self.expanded.lock();
        if expanded.as_deref() == Some(id) {
            *expanded = None;
        } else {
            *expanded = Some(id.to_string());
        }
    }

    pub fn expanded(&self) -> Option<String> {
        self.expanded.lock().clone()
    }

    /// The time pre-filled in the confirm dialog: the mentee's requested time.
    pub fn suggested_confirm_time(&self, id: &str) -> Option<DateTime<Utc>> {
        self.resource
            .items()
            .iter()
            .find(|s| s.id == id)
            .map(|s| s.requested_time)
    }

    /// confirm
    ///
    /// Pending → Confirmed at `confirmed_time`. Past times are accepted. Returns the
    /// alert text on failure.
    pub async fn confirm(&self, id: &str, confirmed_time: DateTime<Utc>) -> Result<(), String> {
        let update = ScheduleStatusUpdate {
            status: ScheduleStatus::Confirmed,
            confirmed_time: Some(confirmed_time),
            mentor_notes: None,
        };
        self.update_status(id, update).await
    }

    /// reject
    ///
    /// Pending → Rejected with an optional note for the mentee.
    pub async fn reject(&self, id: &str, notes: Option<String>) -> Result<(), String> {
        let update = ScheduleStatusUpdate {
            status: ScheduleStatus::Rejected,
            confirmed_time: None,
            mentor_notes: notes.filter(|n| !n.trim().is_empty()),
        };
        self.update_status(id, update).await
    }

    async fn update_status(&self, id: &str, update: ScheduleStatusUpdate) -> Result<(), String> {
        match self.api.update_schedule_status(id, &update).await {
            Ok(()) => {
                tracing::info!(schedule_id = %id, status = update.status.as_str(), "Schedule updated");
                self.refresh().await;
                Ok(())
            }
            Err(e) => {
                tracing::warn!(schedule_id = %id, "Schedule update failed: {}", e);
                Err(e.user_message(UPDATE_ERROR))
            }
        }
    }

    pub fn render(&self) -> String {
        let expanded = self.expanded();
        let mut lines = vec![heading(self.filter)];
        lines.extend(render_state(&self.resource.state(), EMPTY_TEXT, |schedule| {
            let row = ScheduleRow::build(schedule, self.viewer);
            let is_open = expanded.as_deref() == Some(row.id.as_str());
            row.lines(is_open)
        }));
        lines.join("\n")
    }
}
