use crate::client::ApiState;
use crate::models::{Announcement, CreateAnnouncementRequest, TargetRole};
use crate::views::dashboard::RefreshKey;
use crate::views::{ListResource, LoadState, Mutation, format_date, render_state};

pub const EMPTY_TEXT: &str = "No recent announcements.";
pub const LOAD_ERROR: &str = "Failed to load announcements.";
pub const DELETE_ERROR: &str = "Failed to delete announcement.";
pub const REQUIRED_FIELDS: &str = "Title, Content, and at least one Target Role are required.";
pub const POSTED: &str = "Announcement posted successfully!";
pub const POST_ERROR: &str = "Failed to post announcement.";

/// "Posted by <first name> on <date>", falling back to "Admin" for an unpopulated author.
pub fn byline(announcement: &Announcement) -> String {
    let author = announcement
        .author
        .as_ref()
        .and_then(|a| a.summary())
        .map(|s| s.first_name.clone())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "Admin".to_string());
    format!(
        "Posted by {} on {}",
        author,
        format_date(&announcement.created_at)
    )
}

/// AnnouncementsDisplay
///
/// The most recent `limit` announcements. In the admin view each entry also lists its
/// audience and can be deleted.
#[derive(Clone)]
pub struct AnnouncementsDisplay {
    api: ApiState,
    limit: usize,
    admin_view: bool,
    resource: ListResource<Announcement>,
}

impl AnnouncementsDisplay {
    pub fn new(api: ApiState, limit: usize, admin_view: bool) -> Self {
        Self {
            api,
            limit,
            admin_view,
            resource: ListResource::new(),
        }
    }

    pub async fn refresh(&self) -> LoadState<Announcement> {
        self.resource
            .load(self.api.list_announcements(self.limit), LOAD_ERROR)
            .await
    }

    pub fn teardown(&self) {
        self.resource.teardown();
    }

    pub fn state(&self) -> LoadState<Announcement> {
        self.resource.state()
    }

    pub fn last_mutation(&self) -> Option<Mutation> {
        self.resource.last_mutation()
    }

    /// delete
    ///
    /// Removes the entry locally first, then asks the server. A failed call puts the
    /// entry back. Outside the admin view nothing happens and `None` is returned.
    pub async fn delete(&self, id: &str) -> Option<Mutation> {
        if !self.admin_view {
            return None;
        }
        let target = id.to_string();
        let outcome = self
            .resource
            .mutate_optimistic(
                move |items| items.retain(|a| a.id != target),
                self.api.delete_announcement(id),
                DELETE_ERROR,
            )
            .await;
        if outcome == Mutation::Applied {
            tracing::info!(announcement_id = %id, "Announcement deleted");
        }
        Some(outcome)
    }

    pub fn render(&self) -> String {
        render_state(&self.resource.state(), EMPTY_TEXT, |announcement| {
            let mut lines = vec![announcement.title.clone()];
            lines.push(format!("  {}", announcement.content));
            let mut meta = byline(announcement);
            if self.admin_view {
                let targets: Vec<&str> =
                    announcement.target_roles.iter().map(TargetRole::as_str).collect();
                meta.push_str(&format!(" (Targets: {})", targets.join(", ")));
            }
            lines.push(format!("  {}", meta));
            if self.admin_view {
                lines.push(format!("  [delete {}]", announcement.id));
            }
            lines
        })
        .join("\n")
    }
}

/// AnnouncementForm
///
/// Admin form for a new announcement. `All` and the specific roles are mutually
/// exclusive in the selection.
pub struct AnnouncementForm {
    api: ApiState,
    pub title: String,
    pub content: String,
    target_roles: Vec<TargetRole>,
    submitting: bool,
    error: Option<String>,
    success: Option<String>,
    refresh: Option<RefreshKey>,
}

impl AnnouncementForm {
    pub fn new(api: ApiState) -> Self {
        Self {
            api,
            title: String::new(),
            content: String::new(),
            target_roles: vec![TargetRole::All],
            submitting: false,
            error: None,
            success: None,
            refresh: None,
        }
    }

    pub fn notify(mut self, key: RefreshKey) -> Self {
        self.refresh = Some(key);
        self
    }

    pub fn target_roles(&self) -> &[TargetRole] {
        &self.target_roles
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn success(&self) -> Option<&str> {
        self.success.as_deref()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    /// toggle_role
    ///
    /// Checking `All` selects only `All`; unchecking it clears the selection. Checking
    /// a specific role drops `All`.
    pub fn toggle_role(&mut self, role: TargetRole, checked: bool) {
        match (role, checked) {
            (TargetRole::All, true) => self.target_roles = vec![TargetRole::All],
            (TargetRole::All, false) => self.target_roles.clear(),
            (specific, true) => {
                self.target_roles.retain(|r| *r != TargetRole::All);
                if !self.target_roles.contains(&specific) {
                    self.target_roles.push(specific);
                }
            }
            (specific, false) => self.target_roles.retain(|r| *r != specific),
        }
    }

    /// Specific roles are greyed out while `All` is selected.
    pub fn is_role_enabled(&self, role: TargetRole) -> bool {
        role == TargetRole::All || !self.target_roles.contains(&TargetRole::All)
    }

    pub async fn submit(&mut self) -> bool {
        self.error = None;
        self.success = None;

        if self.title.trim().is_empty()
            || self.content.trim().is_empty()
            || self.target_roles.is_empty()
        {
            self.error = Some(REQUIRED_FIELDS.to_string());
            return false;
        }

        let request = CreateAnnouncementRequest {
            title: self.title.trim().to_string(),
            content: self.content.trim().to_string(),
            target_roles: self.target_roles.clone(),
        };

        self.submitting = true;
        let result = self.api.create_announcement(&request).await;
        self.submitting = false;

        match result {
            Ok(()) => {
                tracing::info!("Announcement posted");
                self.success = Some(POSTED.to_string());
                self.title.clear();
                self.content.clear();
                self.target_roles = vec![TargetRole::All];
                if let Some(key) = &self.refresh {
                    key.bump();
                }
                true
            }
            Err(e) => {
                tracing::warn!("Announcement post failed: {}", e);
                self.error = Some(e.user_message(POST_ERROR));
                false
            }
        }
    }
}
