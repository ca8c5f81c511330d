use chrono::{Datelike, Local};

use crate::auth::{AuthStatus, SessionSnapshot};
use crate::error::StorageError;
use crate::models::Theme;
use crate::routes::{Route, can_access};
use crate::storage::{StorageState, load_theme, toggle_theme};

/// NavEntry
///
/// One item of the top navigation bar.
#[derive(Debug, Clone, PartialEq)]
pub enum NavEntry {
    Link { label: String, route: Route },
    Text(String),
    Logout,
}

/// nav_entries
///
/// Anonymous visitors see only the login link. Signed-in users get a greeting, their
/// dashboard, every page their role may open, and logout. Nothing is shown while the
/// session is still being resolved.
pub fn nav_entries(snapshot: &SessionSnapshot) -> Vec<NavEntry> {
    match &snapshot.status {
        AuthStatus::Unknown | AuthStatus::Checking => Vec::new(),
        AuthStatus::Anonymous => vec![NavEntry::Link {
            label: "Login".to_string(),
            route: Route::Login,
        }],
        AuthStatus::Authenticated(session) => {
            let role = session.user.role;
            let mut entries = vec![
                NavEntry::Text(format!("Welcome, {}! ({})", session.user.first_name, role)),
                NavEntry::Link {
                    label: "Dashboard".to_string(),
                    route: Route::dashboard_for(role),
                },
            ];
            if can_access(role, Route::Courses.allowed_roles()) {
                entries.push(NavEntry::Link {
                    label: "Courses".to_string(),
                    route: Route::Courses,
                });
            }
            if can_access(role, Route::AdminUsers.allowed_roles()) {
                entries.push(NavEntry::Link {
                    label: "Users".to_string(),
                    route: Route::AdminUsers,
                });
            }
            entries.push(NavEntry::Logout);
            entries
        }
    }
}

pub fn footer(year: i32) -> String {
    format!("© {} SIP Portal", year)
}

/// Layout
///
/// The chrome around every page: navigation, theme switch and footer.
pub struct Layout {
    storage: StorageState,
    theme: Theme,
}

impl Layout {
    pub async fn load(storage: StorageState) -> Self {
        let theme = load_theme(storage.as_ref()).await;
        Self { storage, theme }
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    /// Flips the theme and persists it under the `theme` key.
    pub async fn toggle_theme(&mut self) -> Result<Theme, StorageError> {
        self.theme = toggle_theme(self.storage.as_ref()).await?;
        Ok(self.theme)
    }

    pub fn render(&self, snapshot: &SessionSnapshot, page: &str) -> String {
        let nav: Vec<String> = nav_entries(snapshot)
            .into_iter()
            .map(|entry| match entry {
                NavEntry::Link { label, route } => format!("{} [{}]", label, route),
                NavEntry::Text(text) => text,
                NavEntry::Logout => "Logout".to_string(),
            })
            .collect();

        [
            format!("SIP Portal ({} theme) | {}", self.theme.as_str(), nav.join(" | ")),
            String::new(),
            page.to_string(),
            String::new(),
            footer(Local::now().year()),
        ]
        .join("\n")
    }
}
