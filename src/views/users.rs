use parking_lot::Mutex;
use std::sync::Arc;

use crate::client::ApiState;
use crate::models::{Role, User, UserPayload};
use crate::views::{ListResource, LoadState, format_date, render_state};

pub const EMPTY_TEXT: &str = "No users found.";
pub const LOAD_ERROR: &str = "Failed to load users.";
pub const DELETE_ERROR: &str = "Failed to delete user.";
pub const CREATE_ERROR: &str = "Failed to create user.";
pub const UPDATE_ERROR: &str = "Failed to update user.";
pub const PASSWORD_REQUIRED: &str = "Password is required when creating a new user.";
pub const PASSWORD_TOO_SHORT: &str = "Password must be at least 6 characters.";
pub const MIN_PASSWORD_CHARS: usize = 6;

/// Badge colour of a role in the user table.
pub fn role_tone(role: Role) -> &'static str {
    match role {
        Role::Admin => "secondary",
        Role::Mentor => "primary",
        Role::Mentee => "info",
        Role::Unknown => "default",
    }
}

/// UserRow
///
/// One line of the admin user table.
#[derive(Debug, Clone, PartialEq)]
pub struct UserRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub tone: &'static str,
    pub created: String,
}

impl From<&User> for UserRow {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.full_name(),
            email: user.email.clone(),
            role: user.role,
            tone: role_tone(user.role),
            created: user
                .created_at
                .as_ref()
                .map(format_date)
                .unwrap_or_else(|| "N/A".to_string()),
        }
    }
}

/// Whether the modal adds a new account or edits an existing one.
#[derive(Debug, Clone, PartialEq)]
pub enum FormMode {
    Add,
    Edit(User),
}

/// UserFormModal
///
/// Add/edit dialog. In edit mode every field except the password is pre-filled; an
/// empty password on edit keeps the current one.
#[derive(Debug, Clone)]
pub struct UserFormModal {
    mode: FormMode,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: Role,
    pub password: String,
    error: Option<String>,
}

impl UserFormModal {
    pub fn add() -> Self {
        Self {
            mode: FormMode::Add,
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            role: Role::Mentee,
            password: String::new(),
            error: None,
        }
    }

    pub fn edit(user: User) -> Self {
        Self {
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            role: user.role,
            password: String::new(),
            error: None,
            mode: FormMode::Edit(user),
        }
    }

    pub fn mode(&self) -> &FormMode {
        &self.mode
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn title(&self) -> &'static str {
        match self.mode {
            FormMode::Add => "Add New User",
            FormMode::Edit(_) => "Edit User",
        }
    }

    /// payload
    ///
    /// Validates the password rules and builds the request body. On failure the
    /// message is also stored on the modal.
    pub fn payload(&mut self) -> Result<UserPayload, String> {
        self.error = None;
        // Sent exactly as typed; only the identity fields are trimmed.
        let password = self.password.clone();
        let creating = matches!(self.mode, FormMode::Add);

        let password = match (creating, password.is_empty()) {
            (true, true) => return Err(self.reject(PASSWORD_REQUIRED)),
            (false, true) => None,
            (_, false) if password.chars().count() < MIN_PASSWORD_CHARS => {
                return Err(self.reject(PASSWORD_TOO_SHORT));
            }
            (_, false) => Some(password),
        };

        Ok(UserPayload {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            email: self.email.trim().to_string(),
            role: self.role,
            password,
        })
    }

    fn reject(&mut self, message: &str) -> String {
        self.error = Some(message.to_string());
        message.to_string()
    }
}

/// AdminUsersPage
///
/// User management: the table plus the add/edit modal. Every successful save or
/// delete refetches the whole table.
pub struct AdminUsersPage {
    api: ApiState,
    resource: ListResource<User>,
    modal: Option<UserFormModal>,
    page_error: Arc<Mutex<Option<String>>>,
}

impl AdminUsersPage {
    pub fn new(api: ApiState) -> Self {
        Self {
            api,
            resource: ListResource::new(),
            modal: None,
            page_error: Arc::new(Mutex::new(None)),
        }
    }

    pub async fn refresh(&self) -> LoadState<User> {
        self.resource.load(self.api.list_users(), LOAD_ERROR).await
    }

    pub fn teardown(&self) {
        self.resource.teardown();
    }

    pub fn state(&self) -> LoadState<User> {
        self.resource.state()
    }

    pub fn rows(&self) -> Vec<UserRow> {
        self.resource.items().iter().map(UserRow::from).collect()
    }

    pub fn page_error(&self) -> Option<String> {
        self.page_error.lock().clone()
    }

    pub fn open_add(&mut self) {
        self.modal = Some(UserFormModal::add());
    }

    pub fn open_edit(&mut self, user: User) {
        self.modal = Some(UserFormModal::edit(user));
    }

    pub fn close_modal(&mut self) {
        self.modal = None;
    }

    pub fn modal(&self) -> Option<&UserFormModal> {
        self.modal.as_ref()
    }

    pub fn modal_mut(&mut self) -> Option<&mut UserFormModal> {
        self.modal.as_mut()
    }

    /// save
    ///
    /// Submits the open modal. Success refetches and closes it; failure keeps it open
    /// with the message. Returns true on success.
    pub async fn save(&mut self) -> bool {
        let Some(modal) = self.modal.as_mut() else {
            return false;
        };
        let payload = match modal.payload() {
            Ok(payload) => payload,
            Err(_) => return false,
        };

        let result = match modal.mode() {
            FormMode::Add => self
                .api
                .create_user(&payload)
                .await
                .map_err(|e| e.user_message(CREATE_ERROR)),
            FormMode::Edit(user) => self
                .api
                .update_user(&user.id, &payload)
                .await
                .map_err(|e| e.user_message(UPDATE_ERROR)),
        };

        match result {
            Ok(()) => {
                tracing::info!(email = %payload.email, role = %payload.role, "User saved");
                self.modal = None;
                self.refresh().await;
                true
            }
            Err(message) => {
                tracing::warn!("User save failed: {}", message);
                if let Some(modal) = self.modal.as_mut() {
                    modal.error = Some(message);
                }
                false
            }
        }
    }

    /// delete
    ///
    /// Runs after the caller has confirmed. Success refetches; failure sets the page
    /// error.
    pub async fn delete(&self, id: &str) -> bool {
        *self.page_error.lock() = None;
        match self.api.delete_user(id).await {
            Ok(()) => {
                tracing::info!(user_id = %id, "User deleted");
                self.refresh().await;
                true
            }
            Err(e) => {
                tracing::warn!(user_id = %id, "User delete failed: {}", e);
                *self.page_error.lock() = Some(e.user_message(DELETE_ERROR));
                false
            }
        }
    }

    pub fn render(&self) -> String {
        let mut lines = vec!["User Management".to_string()];
        if let Some(error) = self.page_error() {
            lines.push(format!("Error: {}", error));
        }
        lines.extend(render_state(&self.resource.state(), EMPTY_TEXT, |user| {
            let row = UserRow::from(user);
            vec![format!(
                "{} | {} | {} ({}) | {} | {}",
                row.id, row.name, row.email, row.tone, row.role, row.created
            )]
        }));
        lines.join("\n")
    }
}
