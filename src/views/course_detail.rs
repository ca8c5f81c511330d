use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

use crate::client::ApiState;
use crate::error::ApiError;
use crate::models::{ContentBody, ContentItem, Course, Module, Role, User};
use crate::routes::can_access;
use crate::views::{FetchScope, LOADING_TEXT, LoadState, render_state};

pub const NO_MODULES_TEXT: &str = "No modules have been added to this course yet.";
pub const NO_ITEMS_TEXT: &str = "No content items yet.";
pub const UNAVAILABLE_TEXT: &str = "Course data unavailable.";

/// Roles that see the add/edit/delete controls for modules and content items.
const CONTENT_EDITORS: &[Role] = &[Role::Mentor, Role::Admin];

/// Which half of the page a failure belongs to; selects the wording.
#[derive(Debug, Clone, Copy)]
enum Section {
    Course,
    Modules,
}

/// fetch_error_message
///
/// 404 and 403 get section-specific wording; anything else uses the server message or
/// the generic fallback.
fn fetch_error_message(err: &ApiError, section: Section) -> String {
    let (label, noun) = match section {
        Section::Course => ("Course", "course"),
        Section::Modules => ("Modules", "modules"),
    };
    match err {
        ApiError::NotFound { .. } => format!("{} not found.", label),
        ApiError::Forbidden { .. } => format!("You are not authorized to view this {}.", noun),
        other => other.user_message(&format!("Failed to load {}.", noun)),
    }
}

/// content_secondary
///
/// The second line under a content item: a link label for media, a snippet for text.
pub fn content_secondary(item: &ContentItem) -> Option<String> {
    match &item.body {
        ContentBody::Video { video_url } => {
            video_url.as_ref().map(|url| format!("View Video: {}", url))
        }
        ContentBody::Resource { resource_url } => resource_url
            .as_ref()
            .map(|url| format!("Download Resource: {}", url)),
        ContentBody::Lecture { lecture_content } => lecture_content
            .as_ref()
            .map(|text| format!("{}...", text.chars().take(50).collect::<String>())),
        ContentBody::Task { task_description } => task_description
            .as_ref()
            .map(|text| format!("{}...", text.chars().take(50).collect::<String>())),
    }
}

#[derive(Debug, Clone)]
struct DetailState {
    loading_course: bool,
    course: Option<Course>,
    course_error: Option<String>,
    modules: LoadState<Module>,
    items: HashMap<String, LoadState<ContentItem>>,
}

impl Default for DetailState {
    fn default() -> Self {
        Self {
            loading_course: true,
            course: None,
            course_error: None,
            modules: LoadState::Loading,
            items: HashMap::new(),
        }
    }
}

/// CourseDetail
///
/// A single course with its modules and, per module, the content items. The course and
/// its modules load independently; a failed module fetch still shows the course.
#[derive(Clone)]
pub struct CourseDetail {
    api: ApiState,
    course_id: String,
    viewer: Option<User>,
    scope: FetchScope,
    state: Arc<Mutex<DetailState>>,
}

impl CourseDetail {
    pub fn new(api: ApiState, course_id: impl Into<String>, viewer: Option<User>) -> Self {
        Self {
            api,
            course_id: course_id.into(),
            viewer,
            scope: FetchScope::new(),
            state: Arc::new(Mutex::new(DetailState::default())),
        }
    }

    pub fn teardown(&self) {
        self.scope.teardown();
    }

    /// load
    ///
    /// Fetches the course and its modules concurrently, then the content items of every
    /// module. Results arriving after teardown or after a newer `load` are dropped.
    pub async fn load(&self) {
        let ticket = self.scope.begin();
        *self.state.lock() = DetailState::default();

        let (course, modules) = tokio::join!(
            self.api.get_course(&self.course_id),
            self.api.list_modules(&self.course_id)
        );

        if !ticket.is_current() {
            tracing::debug!(course_id = %self.course_id, "Discarding stale course response");
            return;
        }

        let module_ids: Vec<String> = {
            let mut state = self.state.lock();
            state.loading_course = false;
            match course {
                Ok(course) => state.course = Some(course),
                Err(e) => {
                    tracing::warn!("Error fetching course details: {}", e);
                    state.course = None;
                    state.course_error = Some(fetch_error_message(&e, Section::Course));
                }
            }
            match modules {
                Ok(mut modules) => {
                    modules.sort_by_key(|m| m.order);
                    let ids = modules.iter().map(|m| m.id.clone()).collect();
                    state.modules = LoadState::Ready(modules);
                    ids
                }
                Err(e) => {
                    tracing::warn!("Error fetching modules: {}", e);
                    state.modules = LoadState::Failed(fetch_error_message(&e, Section::Modules));
                    Vec::new()
                }
            }
        };

        for module_id in module_ids {
            self.state
                .lock()
                .items
                .insert(module_id.clone(), LoadState::Loading);

            let result = self.api.list_content_items(&module_id).await;
            if !ticket.is_current() {
                return;
            }

            let next = match result {
                Ok(mut items) => {
                    items.sort_by_key(|i| i.order);
                    LoadState::Ready(items)
                }
                Err(e) => {
                    tracing::warn!(module_id = %module_id, "Error fetching content items: {}", e);
                    LoadState::Failed(e.user_message("Failed to load content items."))
                }
            };
            self.state.lock().items.insert(module_id, next);
        }
    }

    pub fn course(&self) -> Option<Course> {
        self.state.lock().course.clone()
    }

    pub fn course_error(&self) -> Option<String> {
        self.state.lock().course_error.clone()
    }

    pub fn modules(&self) -> LoadState<Module> {
        self.state.lock().modules.clone()
    }

    pub fn content_items(&self, module_id: &str) -> LoadState<ContentItem> {
        self.state
            .lock()
            .items
            .get(module_id)
            .cloned()
            .unwrap_or(LoadState::Loading)
    }

    /// can_edit
    ///
    /// The course's own mentor and any Admin may edit it.
    pub fn can_edit(&self) -> bool {
        let Some(viewer) = &self.viewer else {
            return false;
        };
        if viewer.role == Role::Admin {
            return true;
        }
        self.state
            .lock()
            .course
            .as_ref()
            .and_then(|c| c.mentor.as_ref())
            .is_some_and(|mentor| mentor.id() == viewer.id)
    }

    pub fn can_manage_content(&self) -> bool {
        self.viewer
            .as_ref()
            .is_some_and(|v| can_access(v.role, CONTENT_EDITORS))
    }

    pub fn render(&self) -> String {
        let state = self.state.lock().clone();

        if state.loading_course {
            return LOADING_TEXT.to_string();
        }
        let Some(course) = &state.course else {
            return match &state.course_error {
                Some(error) => format!("Error: {}", error),
                None => UNAVAILABLE_TEXT.to_string(),
            };
        };

        let mut lines = Vec::new();
        if self.can_edit() {
            lines.push(format!("{}  [Edit Course]", course.title));
        } else {
            lines.push(course.title.clone());
        }
        lines.push(String::new());
        lines.push("Description".to_string());
        lines.push(course.description.clone());

        if let Some(mentor) = course.mentor.as_ref().and_then(|m| m.summary()) {
            let email = mentor.email.as_deref().unwrap_or("");
            lines.push(format!(
                "Mentor: {} {} ({})",
                mentor.first_name, mentor.last_name, email
            ));
        }
        lines.push(format!("Status: {}", course.status.as_str()));
        lines.push(String::new());
        lines.push("Course Content".to_string());

        let manage = self.can_manage_content();
        match &state.modules {
            LoadState::Failed(error) => lines.push(format!("Could not load modules: {}", error)),
            modules => {
                lines.extend(render_state(modules, NO_MODULES_TEXT, |module| {
                    let mut block = vec![format!("{}. {}", module.order, module.title)];
                    if let Some(description) = &module.description {
                        block.push(format!("   {}", description));
                    }
                    let items = state
                        .items
                        .get(&module.id)
                        .cloned()
                        .unwrap_or(LoadState::Loading);
                    for line in render_state(&items, NO_ITEMS_TEXT, |item| {
                        let mut entry = vec![format!(
                            "{}. {} ({})",
                            item.order,
                            item.title,
                            item.body.kind()
                        )];
                        if let Some(secondary) = content_secondary(item) {
                            entry.push(format!("   {}", secondary));
                        }
                        entry
                    }) {
                        block.push(format!("    {}", line));
                    }
                    if manage {
                        block.push("    + Add Content Item".to_string());
                    }
                    block
                }));
            }
        }

        lines.join("\n")
    }
}
