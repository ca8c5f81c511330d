use crate::auth::AuthStatus;
use crate::models::Role;
use crate::routes::{Navigation, Route};

/// can_access
///
/// The single capability check for the portal. An empty `required` list admits any
/// authenticated role. Used by the route guard and by in-page controls alike.
pub fn can_access(role: Role, required: &[Role]) -> bool {
    required.is_empty() || required.contains(&role)
}

/// GuardOutcome
///
/// What the wrapped page should do for the current session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    /// The session has not resolved yet. Show the neutral placeholder, do not redirect.
    Loading,
    /// Leave the page. The navigation always replaces the history entry.
    Redirect(Navigation),
    /// The user may see the page.
    Render,
    /// The role may not see this page and its own dashboard is this page. Show the
    /// authorization placeholder and stay put.
    Forbidden,
}

/// RouteGuard
///
/// Wraps a page with its allow-list. The role comparison happens only once the session
/// has resolved, so unauthorized content is never produced while `Checking`.
#[derive(Debug, Clone, Copy)]
pub struct RouteGuard<'a> {
    allowed_roles: &'a [Role],
    route: Option<&'a Route>,
}

impl<'a> RouteGuard<'a> {
    pub const LOADING_TEXT: &'static str = "Loading authentication...";
    pub const FORBIDDEN_TEXT: &'static str = "Checking authorization...";

    pub fn new(allowed_roles: &'a [Role]) -> Self {
        Self {
            allowed_roles,
            route: None,
        }
    }

    /// for_route
    ///
    /// Guard configured with the page table's allow-list for `route`. Knowing the page
    /// lets the guard refuse instead of redirecting a user onto the page it guards.
    pub fn for_route(route: &'a Route) -> Self {
        Self {
            allowed_roles: route.allowed_roles(),
            route: Some(route),
        }
    }

    pub fn check(&self, status: &AuthStatus) -> GuardOutcome {
        match status {
            AuthStatus::Unknown | AuthStatus::Checking => GuardOutcome::Loading,
            AuthStatus::Anonymous => GuardOutcome::Redirect(Navigation::Replace(Route::Login)),
            AuthStatus::Authenticated(session) => {
                let role = session.user.role;
                if can_access(role, self.allowed_roles) {
                    GuardOutcome::Render
                } else {
                    tracing::warn!("User role '{}' not authorized for this route.", role);
                    let landing = Route::dashboard_for(role);
                    if self.route == Some(&landing) {
                        GuardOutcome::Forbidden
                    } else {
                        GuardOutcome::Redirect(Navigation::Replace(landing))
                    }
                }
            }
        }
    }
}

/// guard_route
///
/// Convenience for routers: public pages always render, everything else goes through
/// the page's guard.
pub fn guard_route(route: &Route, status: &AuthStatus) -> GuardOutcome {
    if route.is_public() {
        return GuardOutcome::Render;
    }
    RouteGuard::for_route(route).check(status)
}
