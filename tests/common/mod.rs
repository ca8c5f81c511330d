#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use sip_portal::{
    ApiError, ApiResult, PortalApi,
    models::{
        Announcement, AuthResponse, ContentItem, Course, CreateAnnouncementRequest,
        CreateCourseRequest, LoginRequest, MeetingRequest, Module, RegisterRequest, Role, Schedule,
        ScheduleFilter, ScheduleStatus, ScheduleStatusUpdate, TargetRole, User, UserPayload,
        UserRef, UserSummary,
    },
};

/// MockPortalApi
///
/// An in-memory backend. Reads and writes operate on the vectors below; setting
/// `fail_reads` or `fail_writes` makes the corresponding calls fail with that error.
/// Every call is recorded by name in `calls`.
#[derive(Default)]
pub struct MockPortalApi {
    pub auth_response: Mutex<Option<AuthResponse>>,
    pub me: Mutex<Option<User>>,
    pub users: Mutex<Vec<User>>,
    pub courses: Mutex<Vec<Course>>,
    pub modules: Mutex<Vec<Module>>,
    pub content_items: Mutex<Vec<ContentItem>>,
    pub schedules: Mutex<Vec<Schedule>>,
    pub announcements: Mutex<Vec<Announcement>>,
    pub fail_reads: Mutex<Option<ApiError>>,
    pub fail_writes: Mutex<Option<ApiError>>,
    pub calls: Mutex<Vec<String>>,
    pub last_meeting: Mutex<Option<MeetingRequest>>,
    pub last_status_update: Mutex<Option<(String, ScheduleStatusUpdate)>>,
    pub last_user_payload: Mutex<Option<UserPayload>>,
    next_id: Mutex<u32>,
}

impl MockPortalApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn called(&self, name: &str) -> bool {
        self.calls.lock().iter().any(|c| c == name)
    }

    fn record(&self, name: &str) {
        self.calls.lock().push(name.to_string());
    }

    fn read_guard(&self) -> ApiResult<()> {
        match self.fail_reads.lock().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn write_guard(&self) -> ApiResult<()> {
        match self.fail_writes.lock().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn fresh_id(&self, prefix: &str) -> String {
        let mut next = self.next_id.lock();
        *next += 1;
        format!("{}-{}", prefix, next)
    }

    fn authenticate(&self) -> ApiResult<AuthResponse> {
        self.write_guard()?;
        self.auth_response.lock().clone().ok_or(ApiError::Unauthorized {
            message: Some("Invalid credentials".to_string()),
        })
    }
}

#[async_trait]
impl PortalApi for MockPortalApi {
    async fn login(&self, _req: &LoginRequest) -> ApiResult<AuthResponse> {
        self.record("login");
        self.authenticate()
    }

    async fn register(&self, _req: &RegisterRequest) -> ApiResult<AuthResponse> {
        self.record("register");
        self.authenticate()
    }

    async fn me(&self) -> ApiResult<User> {
        self.record("me");
        self.me.lock().clone().ok_or(ApiError::Unauthorized {
            message: Some("Token expired".to_string()),
        })
    }

    async fn list_courses(&self) -> ApiResult<Vec<Course>> {
        self.record("list_courses");
        self.read_guard()?;
        Ok(self.courses.lock().clone())
    }

    async fn get_course(&self, id: &str) -> ApiResult<Course> {
        self.record("get_course");
        self.read_guard()?;
        self.courses
            .lock()
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or(ApiError::NotFound { message: None })
    }

    async fn create_course(&self, req: &CreateCourseRequest) -> ApiResult<Course> {
        self.record("create_course");
        self.write_guard()?;
        let course = Course {
            id: self.fresh_id("course"),
            title: req.title.clone(),
            description: req.description.clone(),
            status: req.status,
            mentor: None,
        };
        self.courses.lock().push(course.clone());
        Ok(course)
    }

    async fn list_modules(&self, course_id: &str) -> ApiResult<Vec<Module>> {
        self.record("list_modules");
        self.read_guard()?;
        Ok(self
            .modules
            .lock()
            .iter()
            .filter(|m| m.course.as_ref().is_some_and(|c| c.id() == course_id))
            .cloned()
            .collect())
    }

    async fn list_content_items(&self, module_id: &str) -> ApiResult<Vec<ContentItem>> {
        self.record("list_content_items");
        self.read_guard()?;
        Ok(self
            .content_items
            .lock()
            .iter()
            .filter(|i| i.module.as_ref().is_some_and(|m| m.id() == module_id))
            .cloned()
            .collect())
    }

    async fn list_schedules(&self, filter: ScheduleFilter) -> ApiResult<Vec<Schedule>> {
        self.record(&format!("list_schedules:{}", filter.as_str()));
        self.read_guard()?;
        let schedules = self.schedules.lock().clone();
        Ok(match filter {
            ScheduleFilter::Pending => schedules
                .into_iter()
                .filter(|s| s.status == ScheduleStatus::Pending)
                .collect(),
            _ => schedules,
        })
    }

    async fn request_meeting(&self, req: &MeetingRequest) -> ApiResult<()> {
        self.record("request_meeting");
        self.write_guard()?;
        *self.last_meeting.lock() = Some(req.clone());
        let schedule = Schedule {
            id: self.fresh_id("schedule"),
            mentor: None,
            mentee: None,
            requested_time: req.requested_time,
            confirmed_time: None,
            duration_minutes: req.duration_minutes,
            status: ScheduleStatus::Pending,
            message: Some(req.message.clone()),
            mentor_notes: None,
        };
        self.schedules.lock().push(schedule);
        Ok(())
    }

    async fn update_schedule_status(
        &self,
        id: &str,
        update: &ScheduleStatusUpdate,
    ) -> ApiResult<()> {
        self.record("update_schedule_status");
        self.write_guard()?;
        *self.last_status_update.lock() = Some((id.to_string(), update.clone()));
        let mut schedules = self.schedules.lock();
        let schedule = schedules
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(ApiError::NotFound { message: None })?;
        schedule.status = update.status;
        schedule.confirmed_time = update.confirmed_time;
        schedule.mentor_notes = update.mentor_notes.clone();
        Ok(())
    }

    async fn list_announcements(&self, limit: usize) -> ApiResult<Vec<Announcement>> {
        self.record("list_announcements");
        self.read_guard()?;
        Ok(self.announcements.lock().iter().take(limit).cloned().collect())
    }

    async fn create_announcement(&self, req: &CreateAnnouncementRequest) -> ApiResult<()> {
        self.record("create_announcement");
        self.write_guard()?;
        let created = announcement(&self.fresh_id("ann"), &req.title, &req.target_roles);
        self.announcements.lock().insert(0, created);
        Ok(())
    }

    async fn delete_announcement(&self, id: &str) -> ApiResult<()> {
        self.record("delete_announcement");
        self.write_guard()?;
        self.announcements.lock().retain(|a| a.id != id);
        Ok(())
    }

    async fn list_users(&self) -> ApiResult<Vec<User>> {
        self.record("list_users");
        self.read_guard()?;
        Ok(self.users.lock().clone())
    }

    async fn create_user(&self, payload: &UserPayload) -> ApiResult<()> {
        self.record("create_user");
        self.write_guard()?;
        *self.last_user_payload.lock() = Some(payload.clone());
        let user = User {
            id: self.fresh_id("user"),
            first_name: payload.first_name.clone(),
            last_name: payload.last_name.clone(),
            email: payload.email.clone(),
            role: payload.role,
            created_at: Some(Utc::now()),
        };
        self.users.lock().push(user);
        Ok(())
    }

    async fn update_user(&self, id: &str, payload: &UserPayload) -> ApiResult<()> {
        self.record("update_user");
        self.write_guard()?;
        *self.last_user_payload.lock() = Some(payload.clone());
        let mut users = self.users.lock();
        let user = users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(ApiError::NotFound { message: None })?;
        user.first_name = payload.first_name.clone();
        user.last_name = payload.last_name.clone();
        user.email = payload.email.clone();
        user.role = payload.role;
        Ok(())
    }

    async fn delete_user(&self, id: &str) -> ApiResult<()> {
        self.record("delete_user");
        self.write_guard()?;
        self.users.lock().retain(|u| u.id != id);
        Ok(())
    }
}

// --- Fixtures ---

pub fn user(id: &str, first_name: &str, role: Role) -> User {
    User {
        id: id.to_string(),
        first_name: first_name.to_string(),
        last_name: "Tester".to_string(),
        email: format!("{}@example.com", first_name.to_lowercase()),
        role,
        created_at: None,
    }
}

pub fn auth_response(user: User, token: &str) -> AuthResponse {
    AuthResponse {
        user,
        token: Some(token.to_string()),
    }
}

pub fn announcement(id: &str, title: &str, targets: &[TargetRole]) -> Announcement {
    Announcement {
        id: id.to_string(),
        title: title.to_string(),
        content: format!("{} body", title),
        target_roles: targets.to_vec(),
        author: Some(UserRef::Populated(UserSummary {
            id: "admin-1".to_string(),
            first_name: "Grace".to_string(),
            last_name: "Hopper".to_string(),
            email: None,
        })),
        created_at: Utc::now(),
    }
}

pub fn schedule(id: &str, status: ScheduleStatus, requested_time: DateTime<Utc>) -> Schedule {
    Schedule {
        id: id.to_string(),
        mentor: Some(UserRef::Populated(UserSummary {
            id: "mentor-1".to_string(),
            first_name: "Mia".to_string(),
            last_name: "Mentor".to_string(),
            email: None,
        })),
        mentee: Some(UserRef::Populated(UserSummary {
            id: "mentee-1".to_string(),
            first_name: "Max".to_string(),
            last_name: "Mentee".to_string(),
            email: None,
        })),
        requested_time,
        confirmed_time: None,
        duration_minutes: 45,
        status,
        message: Some("Can we go over my report?".to_string()),
        mentor_notes: None,
    }
}

pub fn tomorrow() -> DateTime<Utc> {
    Utc::now() + Duration::days(1)
}
