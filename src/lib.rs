use std::sync::Arc;

// --- Module Structure ---

// Core client services and components.
pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod storage;

// Page surface: route table, guard and the view components mounted on it.
pub mod routes;
pub mod views;

// --- Public Re-exports ---

pub use auth::{AuthStatus, SessionSnapshot, SessionStore};
pub use client::{ApiState, FlaggingApi, HttpPortalApi, PortalApi, UnauthorizedFlag};
pub use config::AppConfig;
pub use error::{ApiError, ApiResult, StorageError};
pub use routes::{GuardOutcome, Navigation, Route, guard_route};
pub use storage::{FileStorage, MemoryStorage, StorageService, StorageState};

/// PortalContext
///
/// The composition root. Holds the single session store together with the services it
/// was built from; every page receives its dependencies from here. Cloning shares the
/// same session.
#[derive(Clone)]
pub struct PortalContext {
    /// Configuration: the loaded, immutable environment configuration.
    pub config: AppConfig,
    /// Remote API: the authenticated request client.
    pub api: ApiState,
    /// Durable storage: token and theme preference.
    pub storage: StorageState,
    /// The one session store of the process.
    pub session: Arc<SessionStore>,
    /// Raised by `api` on any 401; consumed by `settle_session`.
    pub unauthorized: UnauthorizedFlag,
}

impl PortalContext {
    /// from_config
    ///
    /// Builds the production wiring: a file-backed store under `state_dir` and the HTTP
    /// client reading its token from that store.
    pub fn from_config(config: AppConfig) -> ApiResult<Self> {
        let storage = Arc::new(FileStorage::new(&config.state_dir)) as StorageState;
        let api = Arc::new(HttpPortalApi::new(&config, storage.clone())?) as ApiState;
        Ok(Self::with_parts(config, api, storage))
    }

    /// with_parts
    ///
    /// Wires arbitrary implementations together; tests pass mocks here. The API is
    /// wrapped so every 401 is noticed, whichever component made the call.
    pub fn with_parts(config: AppConfig, api: ApiState, storage: StorageState) -> Self {
        let unauthorized = UnauthorizedFlag::new();
        let api = Arc::new(FlaggingApi::new(api, unauthorized.clone())) as ApiState;
        let session = Arc::new(SessionStore::new(api.clone(), storage.clone()));
        Self {
            config,
            api,
            storage,
            session,
            unauthorized,
        }
    }

    /// enter
    ///
    /// Resolves the session (first call only) and runs the guard for `route`.
    pub async fn enter(&self, route: &Route) -> GuardOutcome {
        let snapshot = self.session.initialize().await;
        guard_route(route, &snapshot.status)
    }

    /// settle_session
    ///
    /// Called after a page action. If any call since the last check was answered 401
    /// while signed in, the session is expired (token cleared, status `Anonymous`) and
    /// the navigation to the login page is returned.
    pub async fn settle_session(&self) -> Option<Navigation> {
        if !self.unauthorized.take() {
            return None;
        }
        if !matches!(self.session.status(), AuthStatus::Authenticated(_)) {
            return None;
        }
        Some(self.session.expire().await)
    }
}
