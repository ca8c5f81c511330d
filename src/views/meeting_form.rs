use chrono::{DateTime, Duration, DurationRound, Utc};

use crate::client::ApiState;
use crate::error::{ApiError, ApiResult};
use crate::models::{MeetingRequest, Role};
use crate::views::dashboard::RefreshKey;

pub const INVALID_INPUT: &str = "Please provide a valid requested time and positive duration.";
pub const PAST_TIME: &str = "Cannot request a meeting in the past.";
pub const SENT: &str = "Meeting request sent successfully!";
pub const SEND_ERROR: &str = "Failed to send meeting request.";
pub const DEFAULT_DURATION_MINUTES: i64 = 30;
pub const MAX_MESSAGE_CHARS: usize = 500;

/// The next whole hour after `now`.
fn default_requested_time(now: DateTime<Utc>) -> DateTime<Utc> {
    let ahead = now + Duration::hours(1);
    ahead.duration_trunc(Duration::hours(1)).unwrap_or(ahead)
}

/// RequestMeetingForm
///
/// A mentee asks for a meeting slot. All validation happens before the request is
/// sent; a rejected form never reaches the network.
pub struct RequestMeetingForm {
    api: ApiState,
    pub requested_time: Option<DateTime<Utc>>,
    pub duration_minutes: i64,
    message: String,
    submitting: bool,
    error: Option<String>,
    success: Option<String>,
    refresh: Option<RefreshKey>,
}

impl RequestMeetingForm {
    /// for_viewer
    ///
    /// The form only exists for mentees; any other role gets `None`.
    pub fn for_viewer(api: ApiState, role: Role) -> Option<Self> {
        (role == Role::Mentee).then(|| Self::new(api))
    }

    fn new(api: ApiState) -> Self {
        Self {
            api,
            requested_time: Some(default_requested_time(Utc::now())),
            duration_minutes: DEFAULT_DURATION_MINUTES,
            message: String::new(),
            submitting: false,
            error: None,
            success: None,
            refresh: None,
        }
    }

    /// Bumps `key` after every successful request so dependent lists refetch.
    pub fn notify(mut self, key: RefreshKey) -> Self {
        self.refresh = Some(key);
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Sets the note for the mentor, cut to the first 500 characters.
    pub fn set_message(&mut self, message: &str) {
        self.message = message.chars().take(MAX_MESSAGE_CHARS).collect();
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn success(&self) -> Option<&str> {
        self.success.as_deref()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub async fn submit(&mut self) -> bool {
        self.submit_at(Utc::now()).await
    }

    /// validate
    ///
    /// Builds the request from the form, or rejects it without touching the network.
    pub fn validate(&self, now: DateTime<Utc>) -> ApiResult<MeetingRequest> {
        let invalid = || ApiError::Validation(INVALID_INPUT.to_string());
        let requested_time = self.requested_time.ok_or_else(invalid)?;
        let duration_minutes = u32::try_from(self.duration_minutes)
            .ok()
            .filter(|minutes| *minutes > 0)
            .ok_or_else(invalid)?;
        if requested_time < now {
            return Err(ApiError::Validation(PAST_TIME.to_string()));
        }
        Ok(MeetingRequest {
            requested_time,
            duration_minutes,
            message: self.message.clone(),
        })
    }

    /// submit_at
    ///
    /// Submits relative to `now`. Returns true when the request was accepted.
    pub async fn submit_at(&mut self, now: DateTime<Utc>) -> bool {
        self.error = None;
        self.success = None;

        let request = match self.validate(now) {
            Ok(request) => request,
            Err(e) => {
                self.error = Some(e.user_message(SEND_ERROR));
                return false;
            }
        };

        self.submitting = true;
        let result = self.api.request_meeting(&request).await;
        self.submitting = false;

        match result {
            Ok(()) => {
                tracing::info!("Meeting request sent");
                self.success = Some(SENT.to_string());
                self.requested_time = Some(default_requested_time(now));
                self.duration_minutes = DEFAULT_DURATION_MINUTES;
                self.message.clear();
                if let Some(key) = &self.refresh {
                    key.bump();
                }
                true
            }
            Err(e) => {
                tracing::warn!("Meeting request failed: {}", e);
                self.error = Some(e.user_message(SEND_ERROR));
                false
            }
        }
    }
}
