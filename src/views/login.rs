use std::sync::Arc;

use crate::auth::{AuthStatus, SessionStore};
use crate::routes::{Navigation, Route};

pub const MISSING_FIELDS: &str = "Please enter both email and password.";

/// LoginForm
///
/// Credentials entry. Validation errors stay on the form; errors from the server are
/// recorded by the session store and read back through `error`. Dropping the form
/// clears the store's error, as leaving the page would.
pub struct LoginForm {
    session: Arc<SessionStore>,
    pub email: String,
    pub password: String,
    local_error: Option<String>,
}

impl LoginForm {
    pub fn new(session: Arc<SessionStore>) -> Self {
        Self {
            session,
            email: String::new(),
            password: String::new(),
            local_error: None,
        }
    }

    /// on_mount
    ///
    /// An already-authenticated user never sees the form and is sent to their
    /// dashboard instead.
    pub fn on_mount(&self) -> Option<Navigation> {
        match self.session.status() {
            AuthStatus::Authenticated(session) => {
                Some(Navigation::Replace(Route::dashboard_for(session.user.role)))
            }
            _ => None,
        }
    }

    pub fn error(&self) -> Option<String> {
        self.local_error
            .clone()
            .or_else(|| self.session.snapshot().error)
    }

    pub fn is_loading(&self) -> bool {
        self.session.snapshot().loading
    }

    pub async fn submit(&mut self) -> Option<Navigation> {
        self.local_error = None;
        if self.email.trim().is_empty() || self.password.is_empty() {
            self.local_error = Some(MISSING_FIELDS.to_string());
            return None;
        }
        self.session.login(self.email.trim(), &self.password).await
    }
}

impl Drop for LoginForm {
    fn drop(&mut self) {
        self.session.clear_error();
    }
}
