use parking_lot::RwLock;

use crate::client::ApiState;
use crate::models::{AuthResponse, LoginRequest, RegisterRequest, User};
use crate::routes::{Navigation, Route};
use crate::storage::{StorageState, TOKEN_KEY};

/// Session
///
/// A resolved identity: the user record and the bearer token that proved it. Both exist
/// together or not at all, so the pair is only ever carried inside
/// `AuthStatus::Authenticated`.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub user: User,
    pub token: String,
}

/// AuthStatus
///
/// The session state machine.
///
/// `Unknown` → `Checking` (persisted token found on first mount) → `Authenticated` or
/// `Anonymous`. Login/register move `Anonymous` → `Authenticated`; logout moves back.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum AuthStatus {
    #[default]
    Unknown,
    Checking,
    Authenticated(Session),
    Anonymous,
}

impl AuthStatus {
    /// True once the initial check has finished, whatever its outcome.
    pub fn is_resolved(&self) -> bool {
        matches!(self, AuthStatus::Authenticated(_) | AuthStatus::Anonymous)
    }
}

/// SessionSnapshot
///
/// A consistent copy of the store's state, handed to guards and views.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionSnapshot {
    pub status: AuthStatus,
    /// True only while `Checking` or while a login/register call is in flight.
    pub loading: bool,
    /// Set only by a failed login/register.
    pub error: Option<String>,
}

impl SessionSnapshot {
    pub fn user(&self) -> Option<&User> {
        match &self.status {
            AuthStatus::Authenticated(session) => Some(&session.user),
            _ => None,
        }
    }

    pub fn token(&self) -> Option<&str> {
        match &self.status {
            AuthStatus::Authenticated(session) => Some(&session.token),
            _ => None,
        }
    }
}

/// The two ways into an authenticated session; they differ only in the call and the
/// fallback messages.
#[derive(Clone, Copy)]
enum AuthFlow {
    Login,
    Register,
}

impl AuthFlow {
    fn failure_message(self) -> &'static str {
        match self {
            AuthFlow::Login => "Login failed. Please check credentials.",
            AuthFlow::Register => "Registration failed.",
        }
    }

    fn invalid_response_message(self) -> &'static str {
        match self {
            AuthFlow::Login => "Login failed: Invalid response from server.",
            AuthFlow::Register => "Registration failed: Invalid response.",
        }
    }
}

/// SessionStore
///
/// Owns the session. Constructed once at the composition root and shared by `Arc`;
/// nothing else mutates the session. Every transition that changes the authentication
/// status also writes or clears the persisted token, so a restart can re-enter
/// `Checking`.
///
/// The lock is never held across an await: each operation reads or writes the
/// snapshot, releases it, then talks to the network.
pub struct SessionStore {
    api: ApiState,
    storage: StorageState,
    inner: RwLock<SessionSnapshot>,
}

impl SessionStore {
    pub fn new(api: ApiState, storage: StorageState) -> Self {
        Self {
            api,
            storage,
            inner: RwLock::new(SessionSnapshot::default()),
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.read().clone()
    }

    pub fn status(&self) -> AuthStatus {
        self.inner.read().status.clone()
    }

    pub fn user(&self) -> Option<User> {
        self.inner.read().user().cloned()
    }

    pub fn token(&self) -> Option<String> {
        self.inner.read().token().map(str::to_string)
    }

    /// clear_error
    ///
    /// Drops a login/register error. Called when the login form is torn down.
    pub fn clear_error(&self) {
        self.inner.write().error = None;
    }

    /// initialize
    ///
    /// The first-mount check. Without a persisted token the store settles on
    /// `Anonymous`. With one, it moves to `Checking` and verifies the token by fetching
    /// the profile: success authenticates, any failure clears the token and settles on
    /// `Anonymous`. Calls after the first are no-ops.
    pub async fn initialize(&self) -> SessionSnapshot {
        {
            let mut inner = self.inner.write();
            if inner.status != AuthStatus::Unknown {
                return inner.clone();
            }
            inner.error = None;
        }

        let stored = match self.storage.get_item(TOKEN_KEY).await {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                tracing::warn!("Could not read persisted token: {}", e);
                None
            }
        };

        let Some(token) = stored else {
            let mut inner = self.inner.write();
            inner.status = AuthStatus::Anonymous;
            inner.loading = false;
            return inner.clone();
        };

        {
            let mut inner = self.inner.write();
            inner.status = AuthStatus::Checking;
            inner.loading = true;
        }

        match self.api.me().await {
            Ok(user) => {
                tracing::info!(user_id = %user.id, role = %user.role, "Persisted session verified");
                let mut inner = self.inner.write();
                inner.status = AuthStatus::Authenticated(Session { user, token });
                inner.loading = false;
                inner.clone()
            }
            Err(e) => {
                tracing::warn!("Error verifying token: {}", e);
                self.clear_persisted_token().await;
                let mut inner = self.inner.write();
                inner.status = AuthStatus::Anonymous;
                inner.loading = false;
                inner.clone()
            }
        }
    }

    /// login
    ///
    /// Exchanges credentials for a session. On success the token is persisted and the
    /// caller receives the push navigation to the role's dashboard. On failure the
    /// error is recorded for the login form and `None` is returned.
    pub async fn login(&self, email: &str, password: &str) -> Option<Navigation> {
        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        self.begin_attempt();
        let result = self.api.login(&request).await;
        self.finish_attempt(AuthFlow::Login, result).await
    }

    /// register
    ///
    /// Creates an account and signs straight into it, with the same outcome rules as
    /// `login`.
    pub async fn register(&self, request: &RegisterRequest) -> Option<Navigation> {
        self.begin_attempt();
        let result = self.api.register(request).await;
        self.finish_attempt(AuthFlow::Register, result).await
    }

    /// logout
    ///
    /// Ends the session, clears the persisted token and sends the user to the login
    /// page.
    pub async fn logout(&self) -> Navigation {
        {
            let mut inner = self.inner.write();
            if let Some(user) = inner.user() {
                tracing::info!(user_id = %user.id, "Logging out");
            }
            inner.status = AuthStatus::Anonymous;
        }
        self.clear_persisted_token().await;
        Navigation::Push(Route::Login)
    }

    /// expire
    ///
    /// The server answered 401 to a call made with the current token. The session is
    /// dropped exactly as on logout.
    pub async fn expire(&self) -> Navigation {
        tracing::warn!("Session rejected by the server, forcing logout");
        self.logout().await
    }

    fn begin_attempt(&self) {
        let mut inner = self.inner.write();
        inner.loading = true;
        inner.error = None;
    }

    async fn finish_attempt(
        &self,
        flow: AuthFlow,
        result: crate::error::ApiResult<AuthResponse>,
    ) -> Option<Navigation> {
        let response = match result {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("Authentication attempt failed: {}", e);
                return self.fail_attempt(e.user_message(flow.failure_message())).await;
            }
        };

        let Some(token) = response.token.filter(|t| !t.is_empty()) else {
            let mut inner = self.inner.write();
            inner.error = Some(flow.invalid_response_message().to_string());
            inner.loading = false;
            return None;
        };

        if let Err(e) = self.storage.set_item(TOKEN_KEY, &token).await {
            tracing::error!("Could not persist token: {}", e);
            return self.fail_attempt(flow.failure_message().to_string()).await;
        }

        let user = response.user;
        let landing = Route::dashboard_for(user.role);
        tracing::info!(user_id = %user.id, role = %user.role, "Signed in");

        let mut inner = self.inner.write();
        inner.status = AuthStatus::Authenticated(Session { user, token });
        inner.loading = false;
        Some(Navigation::Push(landing))
    }

    async fn fail_attempt(&self, message: String) -> Option<Navigation> {
        self.clear_persisted_token().await;
        let mut inner = self.inner.write();
        inner.status = AuthStatus::Anonymous;
        inner.error = Some(message);
        inner.loading = false;
        None
    }

    async fn clear_persisted_token(&self) {
        if let Err(e) = self.storage.remove_item(TOKEN_KEY).await {
            tracing::error!("Could not clear persisted token: {}", e);
        }
    }
}
