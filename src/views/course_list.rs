use crate::client::ApiState;
use crate::models::Course;
use crate::routes::Route;
use crate::views::{ListResource, LoadState, render_state, truncate};

pub const EMPTY_TEXT: &str = "No courses found.";
pub const LOAD_ERROR: &str = "Failed to load courses.";

/// CourseCard
///
/// One course as shown in the catalogue.
#[derive(Debug, Clone, PartialEq)]
pub struct CourseCard {
    pub title: String,
    pub summary: String,
    pub mentor: String,
    pub status: String,
    pub link: Route,
}

impl From<&Course> for CourseCard {
    fn from(course: &Course) -> Self {
        Self {
            title: course.title.clone(),
            summary: truncate(&course.description, 100),
            mentor: course
                .mentor
                .as_ref()
                .map(|m| m.display_name())
                .unwrap_or_default(),
            status: course.status.as_str().to_string(),
            link: Route::CourseDetail(course.id.clone()),
        }
    }
}

/// CourseList
///
/// The course catalogue: every course visible to the current user.
#[derive(Clone)]
pub struct CourseList {
    api: ApiState,
    resource: ListResource<Course>,
}

impl CourseList {
    pub fn new(api: ApiState) -> Self {
        Self {
            api,
            resource: ListResource::new(),
        }
    }

    pub async fn refresh(&self) -> LoadState<Course> {
        self.resource.load(self.api.list_courses(), LOAD_ERROR).await
    }

    pub fn teardown(&self) {
        self.resource.teardown();
    }

    pub fn state(&self) -> LoadState<Course> {
        self.resource.state()
    }

    pub fn cards(&self) -> Vec<CourseCard> {
        self.resource.items().iter().map(CourseCard::from).collect()
    }

    pub fn render(&self) -> String {
        render_state(&self.resource.state(), EMPTY_TEXT, |course| {
            let card = CourseCard::from(course);
            vec![
                format!("{}  [{}]", card.title, card.link),
                format!("  {}", card.summary),
                format!("  Mentor: {}", card.mentor),
                format!("  Status: {}", card.status),
            ]
        })
        .join("\n")
    }
}
