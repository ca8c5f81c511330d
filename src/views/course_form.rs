use crate::client::ApiState;
use crate::models::{CourseStatus, CreateCourseRequest};
use crate::routes::{Navigation, Route};

pub const REQUIRED_FIELDS: &str = "Title and Description are required.";
pub const CREATE_ERROR: &str = "Failed to create course.";

/// CreateCourseForm
///
/// Mentor/Admin form for a new course. A failed submit keeps every field so the user
/// can correct and retry.
pub struct CreateCourseForm {
    api: ApiState,
    pub title: String,
    pub description: String,
    pub status: CourseStatus,
    submitting: bool,
    error: Option<String>,
    success: Option<String>,
}

impl CreateCourseForm {
    pub fn new(api: ApiState) -> Self {
        Self {
            api,
            title: String::new(),
            description: String::new(),
            status: CourseStatus::default(),
            submitting: false,
            error: None,
            success: None,
        }
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

    /// submit
    ///
    /// Validates locally, then POSTs the course. On success the caller is handed the
    /// push to the new course's page.
    pub async fn submit(&mut self) -> Option<Navigation> {
        self.error = None;
        self.success = None;

        if self.title.trim().is_empty() || self.description.trim().is_empty() {
            self.error = Some(REQUIRED_FIELDS.to_string());
            return None;
        }

        let request = CreateCourseRequest {
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            status: self.status,
        };

        self.submitting = true;
        let result = self.api.create_course(&request).await;
        self.submitting = false;

        match result {
            Ok(course) => {
                tracing::info!(course_id = %course.id, "Course created");
                self.success = Some(format!(
                    "Course \"{}\" created successfully! Redirecting...",
                    course.title
                ));
                Some(Navigation::Push(Route::CourseDetail(course.id)))
            }
            Err(e) => {
                tracing::warn!("Course creation failed: {}", e);
                self.error = Some(e.user_message(CREATE_ERROR));
                None
            }
        }
    }
}
