use async_trait::async_trait;
use reqwest::{Method, StatusCode, Url, header};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::Instrument;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::error::{ApiError, ApiResult};
use crate::models::{
    Announcement, AuthResponse, ContentItem, Course, CreateAnnouncementRequest,
    CreateCourseRequest, LoginRequest, MeetingRequest, Module, RegisterRequest, Schedule,
    ScheduleFilter, ScheduleStatusUpdate, User, UserPayload,
};
use crate::storage::{StorageState, TOKEN_KEY};

/// PortalApi Trait
///
/// The abstract contract for every remote call the portal makes. Views and the session
/// store only see this trait, so they can be driven by the real HTTP client or by a
/// mock in tests.
#[async_trait]
pub trait PortalApi: Send + Sync {
    // --- Auth ---
    async fn login(&self, req: &LoginRequest) -> ApiResult<AuthResponse>;
    async fn register(&self, req: &RegisterRequest) -> ApiResult<AuthResponse>;
    // Profile of the token holder. Used to verify a persisted token on startup.
    async fn me(&self) -> ApiResult<User>;

    // --- Courses ---
    async fn list_courses(&self) -> ApiResult<Vec<Course>>;
    async fn get_course(&self, id: &str) -> ApiResult<Course>;
    async fn create_course(&self, req: &CreateCourseRequest) -> ApiResult<Course>;
    async fn list_modules(&self, course_id: &str) -> ApiResult<Vec<Module>>;
    async fn list_content_items(&self, module_id: &str) -> ApiResult<Vec<ContentItem>>;

    // --- Schedules ---
    async fn list_schedules(&self, filter: ScheduleFilter) -> ApiResult<Vec<Schedule>>;
    async fn request_meeting(&self, req: &MeetingRequest) -> ApiResult<()>;
    async fn update_schedule_status(&self, id: &str, update: &ScheduleStatusUpdate)
    -> ApiResult<()>;

    // --- Announcements ---
    async fn list_announcements(&self, limit: usize) -> ApiResult<Vec<Announcement>>;
    async fn create_announcement(&self, req: &CreateAnnouncementRequest) -> ApiResult<()>;
    async fn delete_announcement(&self, id: &str) -> ApiResult<()>;

    // --- Users (Admin) ---
    async fn list_users(&self) -> ApiResult<Vec<User>>;
    async fn create_user(&self, payload: &UserPayload) -> ApiResult<()>;
    async fn update_user(&self, id: &str, payload: &UserPayload) -> ApiResult<()>;
    async fn delete_user(&self, id: &str) -> ApiResult<()>;
}

/// ApiState
///
/// The shared handle to the API used across the context and every view.
pub type ApiState = Arc<dyn PortalApi>;

/// HttpPortalApi
///
/// The authenticated request client. Every call reads the token from durable storage
/// and, if one is present, sends it as a bearer credential. There is no retry, no
/// refresh-token rotation and no backoff: failures (401 included) go straight back to
/// the caller.
pub struct HttpPortalApi {
    http: reqwest::Client,
    base_url: Url,
    storage: StorageState,
}

impl HttpPortalApi {
    /// new
    ///
    /// Builds the client from the loaded configuration. Fails only when the configured
    /// base URL cannot be parsed or the TLS backend cannot be initialised.
    pub fn new(config: &AppConfig, storage: StorageState) -> ApiResult<Self> {
        let base_url = Url::parse(&config.api_url)
            .map_err(|e| ApiError::Network(format!("invalid API URL '{}': {}", config.api_url, e)))?;

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            base_url,
            storage,
        })
    }

    /// endpoint
    ///
    /// Appends path segments to the base URL. Segments are percent-encoded, so ids typed
    /// on the command line cannot escape their path position.
    fn endpoint(&self, segments: &[&str]) -> ApiResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::Network(format!("API URL '{}' cannot be a base", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// execute
    ///
    /// Sends one request and returns the status plus raw body of a successful response.
    /// Non-success statuses are converted with `ApiError::from_status`.
    async fn execute(
        &self,
        method: Method,
        segments: &[&str],
        query: &[(&str, String)],
        body: Option<serde_json::Value>,
    ) -> ApiResult<(StatusCode, String)> {
        let url = self.endpoint(segments)?;
        let request_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "api_request",
            method = %method,
            path = %url.path(),
            req_id = %request_id,
        );

        async move {
            let mut request = self
                .http
                .request(method, url)
                .header("x-request-id", request_id.to_string());

            if !query.is_empty() {
                request = request.query(query);
            }

            // The token is re-read on every call so a logout in another component takes
            // effect immediately.
            if let Some(token) = self.storage.get_item(TOKEN_KEY).await? {
                request = request.bearer_auth(token);
            }

            if let Some(body) = body {
                request = request.json(&body);
            }

            let response = request.send().await.map_err(|e| {
                tracing::warn!("transport failure: {}", e);
                ApiError::from(e)
            })?;

            let status = response.status();
            let text = response.text().await?;

            if status.is_success() {
                tracing::debug!(status = status.as_u16(), "request succeeded");
                Ok((status, text))
            } else {
                tracing::warn!(status = status.as_u16(), "request rejected");
                Err(ApiError::from_status(status, &text))
            }
        }
        .instrument(span)
        .await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, String)],
    ) -> ApiResult<T> {
        let (_, text) = self.execute(Method::GET, segments, query, None).await?;
        decode(&text)
    }

    async fn get_list<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, String)],
    ) -> ApiResult<Vec<T>> {
        let (_, text) = self.execute(Method::GET, segments, query, None).await?;
        decode_list(&text)
    }

    /// send_body
    ///
    /// Serialises a payload and sends it, returning the status and raw response body.
    async fn send_body<B: serde::Serialize + ?Sized>(
        &self,
        method: Method,
        segments: &[&str],
        payload: &B,
    ) -> ApiResult<(StatusCode, String)> {
        let body = serde_json::to_value(payload).map_err(|e| ApiError::Decode(e.to_string()))?;
        self.execute(method, segments, &[], Some(body)).await
    }
}

/// decode
///
/// Parses a success body into the expected record. A `null` or empty body is a decode
/// failure: the call succeeded but carried no data.
pub fn decode<T: DeserializeOwned>(text: &str) -> ApiResult<T> {
    if text.trim().is_empty() {
        return Err(ApiError::Decode("empty response body".to_string()));
    }
    serde_json::from_str(text).map_err(|e| ApiError::Decode(e.to_string()))
}

/// decode_list
///
/// Like `decode`, but an empty or `null` body is an empty list.
pub fn decode_list<T: DeserializeOwned>(text: &str) -> ApiResult<Vec<T>> {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Vec::new());
    }
    serde_json::from_str::<Option<Vec<T>>>(trimmed)
        .map(Option::unwrap_or_default)
        .map_err(|e| ApiError::Decode(e.to_string()))
}

/// expect_created
///
/// Creation endpoints answer 201; any other success status means the server did not do
/// what was asked.
fn expect_created(status: StatusCode) -> ApiResult<()> {
    if status == StatusCode::CREATED {
        Ok(())
    } else {
        Err(ApiError::Decode(format!(
            "expected 201 Created, got {}",
            status.as_u16()
        )))
    }
}

#[async_trait]
impl PortalApi for HttpPortalApi {
    async fn login(&self, req: &LoginRequest) -> ApiResult<AuthResponse> {
        let (_, text) = self.send_body(Method::POST, &["auth", "login"], req).await?;
        decode(&text)
    }

    async fn register(&self, req: &RegisterRequest) -> ApiResult<AuthResponse> {
        let (_, text) = self
            .send_body(Method::POST, &["auth", "register"], req)
            .await?;
        decode(&text)
    }

    async fn me(&self) -> ApiResult<User> {
        self.get_json(&["auth", "me"], &[]).await
    }

    async fn list_courses(&self) -> ApiResult<Vec<Course>> {
        self.get_list(&["courses"], &[]).await
    }

    async fn get_course(&self, id: &str) -> ApiResult<Course> {
        self.get_json(&["courses", id], &[]).await
    }

    async fn create_course(&self, req: &CreateCourseRequest) -> ApiResult<Course> {
        let (status, text) = self.send_body(Method::POST, &["courses"], req).await?;
        expect_created(status)?;
        decode(&text)
    }

    async fn list_modules(&self, course_id: &str) -> ApiResult<Vec<Module>> {
        let mut modules: Vec<Module> = self.get_list(&["courses", course_id, "modules"], &[]).await?;
        modules.sort_by_key(|m| m.order);
        Ok(modules)
    }

    async fn list_content_items(&self, module_id: &str) -> ApiResult<Vec<ContentItem>> {
        let mut items: Vec<ContentItem> = self
            .get_list(&["modules", module_id, "content-items"], &[])
            .await?;
        items.sort_by_key(|i| i.order);
        Ok(items)
    }

    async fn list_schedules(&self, filter: ScheduleFilter) -> ApiResult<Vec<Schedule>> {
        let query: Vec<(&str, String)> = filter
            .query_params()
            .into_iter()
            .map(|(k, v)| (k, v.to_string()))
            .collect();
        self.get_list(&["schedules"], &query).await
    }

    async fn request_meeting(&self, req: &MeetingRequest) -> ApiResult<()> {
        let (status, _) = self
            .send_body(Method::POST, &["schedules", "request"], req)
            .await?;
        expect_created(status)
    }

    async fn update_schedule_status(
        &self,
        id: &str,
        update: &ScheduleStatusUpdate,
    ) -> ApiResult<()> {
        self.send_body(Method::PUT, &["schedules", id, "status"], update)
            .await
            .map(|_| ())
    }

    async fn list_announcements(&self, limit: usize) -> ApiResult<Vec<Announcement>> {
        self.get_list(&["announcements"], &[("limit", limit.to_string())])
            .await
    }

    async fn create_announcement(&self, req: &CreateAnnouncementRequest) -> ApiResult<()> {
        self.send_body(Method::POST, &["announcements"], req)
            .await
            .map(|_| ())
    }

    async fn delete_announcement(&self, id: &str) -> ApiResult<()> {
        self.execute(Method::DELETE, &["announcements", id], &[], None)
            .await
            .map(|_| ())
    }

    async fn list_users(&self) -> ApiResult<Vec<User>> {
        self.get_list(&["users"], &[]).await
    }

    async fn create_user(&self, payload: &UserPayload) -> ApiResult<()> {
        self.send_body(Method::POST, &["users"], payload)
            .await
            .map(|_| ())
    }

    async fn update_user(&self, id: &str, payload: &UserPayload) -> ApiResult<()> {
        self.send_body(Method::PUT, &["users", id], payload)
            .await
            .map(|_| ())
    }

    async fn delete_user(&self, id: &str) -> ApiResult<()> {
        self.execute(Method::DELETE, &["users", id], &[], None)
            .await
            .map(|_| ())
    }
}

/// UnauthorizedFlag
///
/// Raised whenever the server answers 401, whichever component made the call. The
/// composition root takes it after each page action and ends the session if it was set.
#[derive(Debug, Clone, Default)]
pub struct UnauthorizedFlag(Arc<AtomicBool>);

impl UnauthorizedFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Clears the flag and reports whether it was set.
    pub fn take(&self) -> bool {
        self.0.swap(false, Ordering::SeqCst)
    }
}

/// FlaggingApi
///
/// Wraps another `PortalApi` and raises the flag on every 401 passing through it.
/// Results are returned unchanged, so views keep showing their banners.
pub struct FlaggingApi {
    inner: ApiState,
    flag: UnauthorizedFlag,
}

impl FlaggingApi {
    pub fn new(inner: ApiState, flag: UnauthorizedFlag) -> Self {
        Self { inner, flag }
    }

    fn observe<T>(&self, result: ApiResult<T>) -> ApiResult<T> {
        if matches!(&result, Err(e) if e.is_unauthorized()) {
            tracing::debug!("Server rejected the session token");
            self.flag.raise();
        }
        result
    }
}

#[async_trait]
impl PortalApi for FlaggingApi {
    async fn login(&self, req: &LoginRequest) -> ApiResult<AuthResponse> {
        self.observe(self.inner.login(req).await)
    }

    async fn register(&self, req: &RegisterRequest) -> ApiResult<AuthResponse> {
        self.observe(self.inner.register(req).await)
    }

    async fn me(&self) -> ApiResult<User> {
        self.observe(self.inner.me().await)
    }

    async fn list_courses(&self) -> ApiResult<Vec<Course>> {
        self.observe(self.inner.list_courses().await)
    }

    async fn get_course(&self, id: &str) -> ApiResult<Course> {
        self.observe(self.inner.get_course(id).await)
    }

    async fn create_course(&self, req: &CreateCourseRequest) -> ApiResult<Course> {
        self.observe(self.inner.create_course(req).await)
    }

    async fn list_modules(&self, course_id: &str) -> ApiResult<Vec<Module>> {
        self.observe(self.inner.list_modules(course_id).await)
    }

    async fn list_content_items(&self, module_id: &str) -> ApiResult<Vec<ContentItem>> {
        self.observe(self.inner.list_content_items(module_id).await)
    }

    async fn list_schedules(&self, filter: ScheduleFilter) -> ApiResult<Vec<Schedule>> {
        self.observe(self.inner.list_schedules(filter).await)
    }

    async fn request_meeting(&self, req: &MeetingRequest) -> ApiResult<()> {
        self.observe(self.inner.request_meeting(req).await)
    }

    async fn update_schedule_status(
        &self,
        id: &str,
        update: &ScheduleStatusUpdate,
    ) -> ApiResult<()> {
        self.observe(self.inner.update_schedule_status(id, update).await)
    }

    async fn list_announcements(&self, limit: usize) -> ApiResult<Vec<Announcement>> {
        self.observe(self.inner.list_announcements(limit).await)
    }

    async fn create_announcement(&self, req: &CreateAnnouncementRequest) -> ApiResult<()> {
        self.observe(self.inner.create_announcement(req).await)
    }

    async fn delete_announcement(&self, id: &str) -> ApiResult<()> {
        self.observe(self.inner.delete_announcement(id).await)
    }

    async fn list_users(&self) -> ApiResult<Vec<User>> {
        self.observe(self.inner.list_users().await)
    }

    async fn create_user(&self, payload: &UserPayload) -> ApiResult<()> {
        self.observe(self.inner.create_user(payload).await)
    }

    async fn update_user(&self, id: &str, payload: &UserPayload) -> ApiResult<()> {
        self.observe(self.inner.update_user(id, payload).await)
    }

    async fn delete_user(&self, id: &str) -> ApiResult<()> {
        self.observe(self.inner.delete_user(id).await)
    }
}
