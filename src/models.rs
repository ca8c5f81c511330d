use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// --- Roles ---

/// Role
///
/// The RBAC field carried by every user record. The backend may grow roles this client
/// does not know about; those parse as `Unknown` and route like a Mentee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Admin,
    Mentor,
    #[default]
    Mentee,
    Unknown,
}

impl Role {
    pub const ASSIGNABLE: [Role; 3] = [Role::Admin, Role::Mentor, Role::Mentee];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Mentor => "Mentor",
            Role::Mentee => "Mentee",
            Role::Unknown => "Unknown",
        }
    }

    /// parse
    ///
    /// Case-insensitive, so CLI input like `mentor` is accepted.
    pub fn parse(value: &str) -> Role {
        match value.trim().to_ascii_lowercase().as_str() {
            "admin" => Role::Admin,
            "mentor" => Role::Mentor,
            "mentee" => Role::Mentee,
            _ => Role::Unknown,
        }
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        Role::parse(&value)
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_string()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// TargetRole
///
/// Audience selector for announcements. `All` never coexists with a specific role in a
/// submitted selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetRole {
    All,
    Admin,
    Mentor,
    Mentee,
}

impl TargetRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetRole::All => "All",
            TargetRole::Admin => "Admin",
            TargetRole::Mentor => "Mentor",
            TargetRole::Mentee => "Mentee",
        }
    }

    pub fn parse(value: &str) -> Option<TargetRole> {
        match value.trim().to_ascii_lowercase().as_str() {
            "all" => Some(TargetRole::All),
            "admin" => Some(TargetRole::Admin),
            "mentor" => Some(TargetRole::Mentor),
            "mentee" => Some(TargetRole::Mentee),
            _ => None,
        }
    }
}

// --- References ---

/// UserSummary
///
/// The populated form of a user reference (`mentor`, `mentee`, `author`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// UserRef
///
/// The API returns either the populated user or only its id, depending on the endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserRef {
    Populated(UserSummary),
    Id(String),
}

impl UserRef {
    pub fn id(&self) -> &str {
        match self {
            UserRef::Populated(summary) => &summary.id,
            UserRef::Id(id) => id,
        }
    }

    pub fn summary(&self) -> Option<&UserSummary> {
        match self {
            UserRef::Populated(summary) => Some(summary),
            UserRef::Id(_) => None,
        }
    }

    /// "First Last", trimmed; empty when only the id is known.
    pub fn display_name(&self) -> String {
        self.summary()
            .map(|s| format!("{} {}", s.first_name, s.last_name).trim().to_string())
            .unwrap_or_default()
    }
}

/// EntityRef
///
/// Parent reference of a module or content item: a bare id or an embedded `{ _id }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityRef {
    Id(String),
    Embedded {
        #[serde(rename = "_id", alias = "id")]
        id: String,
    },
}

impl EntityRef {
    pub fn id(&self) -> &str {
        match self {
            EntityRef::Id(id) | EntityRef::Embedded { id } => id,
        }
    }
}

// --- Core Entities ---

/// User
///
/// A portal account as returned by `/users` and `/auth/me`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// AuthResponse
///
/// Body of `/auth/login` and `/auth/register`: the user fields with the bearer token
/// alongside. A response without a token is treated as invalid by the session store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    #[serde(flatten)]
    pub user: User,
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CourseStatus {
    #[default]
    Draft,
    Published,
    Archived,
}

impl CourseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CourseStatus::Draft => "Draft",
            CourseStatus::Published => "Published",
            CourseStatus::Archived => "Archived",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: CourseStatus,
    #[serde(default)]
    pub mentor: Option<UserRef>,
}

/// Module
///
/// A chapter of a course. `order` defines the display sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Module {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(default)]
    pub course: Option<EntityRef>,
    #[serde(default)]
    pub order: i32,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// ContentBody
///
/// Type-specific payload of a content item, discriminated by the `itemType` key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "itemType")]
pub enum ContentBody {
    Video {
        #[serde(rename = "videoUrl", default)]
        video_url: Option<String>,
    },
    Resource {
        #[serde(rename = "resourceUrl", default)]
        resource_url: Option<String>,
    },
    Lecture {
        #[serde(rename = "lectureContent", default)]
        lecture_content: Option<String>,
    },
    Task {
        #[serde(rename = "taskDescription", default)]
        task_description: Option<String>,
    },
}

impl ContentBody {
    pub fn kind(&self) -> &'static str {
        match self {
            ContentBody::Video { .. } => "Video",
            ContentBody::Resource { .. } => "Resource",
            ContentBody::Lecture { .. } => "Lecture",
            ContentBody::Task { .. } => "Task",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(default)]
    pub module: Option<EntityRef>,
    #[serde(default)]
    pub order: i32,
    #[serde(default)]
    pub title: String,
    #[serde(flatten)]
    pub body: ContentBody,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScheduleStatus {
    Pending,
    Confirmed,
    Rejected,
    Cancelled,
    Completed,
}

impl ScheduleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScheduleStatus::Pending => "Pending",
            ScheduleStatus::Confirmed => "Confirmed",
            ScheduleStatus::Rejected => "Rejected",
            ScheduleStatus::Cancelled => "Cancelled",
            ScheduleStatus::Completed => "Completed",
        }
    }
}

/// Schedule
///
/// A meeting request between a mentee and a mentor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(default)]
    pub mentor: Option<UserRef>,
    #[serde(default)]
    pub mentee: Option<UserRef>,
    pub requested_time: DateTime<Utc>,
    #[serde(default)]
    pub confirmed_time: Option<DateTime<Utc>>,
    pub duration_minutes: u32,
    pub status: ScheduleStatus,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub mentor_notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Announcement {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub target_roles: Vec<TargetRole>,
    #[serde(default)]
    pub author: Option<UserRef>,
    pub created_at: DateTime<Utc>,
}

// --- Request Payloads ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// RegisterRequest
///
/// Self-registration payload. The role is optional; the backend defaults it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCourseRequest {
    pub title: String,
    pub description: String,
    pub status: CourseStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingRequest {
    pub requested_time: DateTime<Utc>,
    pub duration_minutes: u32,
    pub message: String,
}

/// ScheduleStatusUpdate
///
/// Body of `PUT /schedules/{id}/status`. `confirmedTime` and `mentorNotes` are sent as
/// `null` when not applicable; the backend ignores them for other statuses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleStatusUpdate {
    pub status: ScheduleStatus,
    pub confirmed_time: Option<DateTime<Utc>>,
    pub mentor_notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAnnouncementRequest {
    pub title: String,
    pub content: String,
    pub target_roles: Vec<TargetRole>,
}

/// UserPayload
///
/// Admin create/update body. On update an empty password is omitted entirely so the
/// current one is kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPayload {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

// --- Query & Preference Types ---

/// ScheduleFilter
///
/// The four schedule views. Each maps onto the query parameters the backend understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScheduleFilter {
    #[default]
    Upcoming,
    Pending,
    Past,
    All,
}

impl ScheduleFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScheduleFilter::Upcoming => "upcoming",
            ScheduleFilter::Pending => "pending",
            ScheduleFilter::Past => "past",
            ScheduleFilter::All => "all",
        }
    }

    pub fn parse(value: &str) -> Option<ScheduleFilter> {
        match value.trim().to_ascii_lowercase().as_str() {
            "upcoming" => Some(ScheduleFilter::Upcoming),
            "pending" => Some(ScheduleFilter::Pending),
            "past" => Some(ScheduleFilter::Past),
            "all" => Some(ScheduleFilter::All),
            _ => None,
        }
    }

    pub fn query_params(&self) -> Vec<(&'static str, &'static str)> {
        match self {
            ScheduleFilter::Upcoming => vec![("upcoming", "true")],
            ScheduleFilter::Pending => vec![("status", "Pending")],
            ScheduleFilter::Past => vec![("past", "true")],
            ScheduleFilter::All => vec![],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn parse(value: &str) -> Option<Theme> {
        match value {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }

    pub fn toggled(&self) -> Theme {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}
