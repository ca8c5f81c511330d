/// Route Module Index
///
/// The portal's page surface. Pages are grouped the same way access is granted:
/// the public login page, pages for any authenticated user, and role-scoped pages under
/// `/admin`, `/mentor` and `/mentee`. The router itself belongs to the embedding UI (the
/// CLI in this crate); this module only names the pages, their paths and who may see
/// them, and describes navigations as values.
pub mod guard;

use std::fmt;

use crate::models::Role;

pub use guard::{GuardOutcome, RouteGuard, can_access, guard_route};

/// Route
///
/// Every page the portal knows about.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    AdminDashboard,
    AdminUsers,
    MentorDashboard,
    CreateCourse,
    MenteeDashboard,
    Courses,
    CourseDetail(String),
}

impl Route {
    /// path
    ///
    /// The URL path of the page, as used by history navigation.
    pub fn path(&self) -> String {
        match self {
            Route::Login => "/login".to_string(),
            Route::AdminDashboard => "/admin/dashboard".to_string(),
            Route::AdminUsers => "/admin/users".to_string(),
            Route::MentorDashboard => "/mentor/dashboard".to_string(),
            Route::CreateCourse => "/mentor/courses/create".to_string(),
            Route::MenteeDashboard => "/mentee/dashboard".to_string(),
            Route::Courses => "/courses".to_string(),
            Route::CourseDetail(id) => format!("/courses/{}", id),
        }
    }

    /// from_path
    ///
    /// Inverse of `path`. Trailing slashes are ignored; unknown paths yield `None`.
    pub fn from_path(path: &str) -> Option<Route> {
        let trimmed = path.trim_end_matches('/');
        let route = match trimmed {
            "/login" => Route::Login,
            "/admin/dashboard" => Route::AdminDashboard,
            "/admin/users" => Route::AdminUsers,
            "/mentor/dashboard" => Route::MentorDashboard,
            "/mentor/courses/create" => Route::CreateCourse,
            "/mentee/dashboard" => Route::MenteeDashboard,
            "/courses" => Route::Courses,
            other => {
                let id = other.strip_prefix("/courses/")?;
                if id.is_empty() || id.contains('/') {
                    return None;
                }
                Route::CourseDetail(id.to_string())
            }
        };
        Some(route)
    }

    /// dashboard_for
    ///
    /// The landing page for a role. Unknown roles land on the mentee dashboard.
    pub fn dashboard_for(role: Role) -> Route {
        match role {
            Role::Admin => Route::AdminDashboard,
            Role::Mentor => Route::MentorDashboard,
            Role::Mentee | Role::Unknown => Route::MenteeDashboard,
        }
    }

    /// is_public
    ///
    /// Public pages are rendered without consulting the guard.
    pub fn is_public(&self) -> bool {
        matches!(self, Route::Login)
    }

    /// allowed_roles
    ///
    /// The page's allow-list. Empty means "any authenticated role".
    pub fn allowed_roles(&self) -> &'static [Role] {
        match self {
            Route::Login => &[],
            Route::AdminDashboard | Route::AdminUsers => &[Role::Admin],
            Route::MentorDashboard | Route::CreateCourse => &[Role::Mentor, Role::Admin],
            Route::MenteeDashboard => &[Role::Mentee],
            Route::Courses | Route::CourseDetail(_) => &[Role::Admin, Role::Mentor, Role::Mentee],
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Navigation
///
/// A request to the router. `Push` adds a history entry; `Replace` overwrites the
/// current one so the back button cannot return to a page the user was bounced from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Push(Route),
    Replace(Route),
}

impl Navigation {
    pub fn route(&self) -> &Route {
        match self {
            Navigation::Push(route) | Navigation::Replace(route) => route,
        }
    }
}
