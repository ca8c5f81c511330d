use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::client::ApiState;
use crate::models::{Role, ScheduleFilter, User};
use crate::routes::Route;
use crate::views::announcements::{AnnouncementForm, AnnouncementsDisplay};
use crate::views::meeting_form::RequestMeetingForm;
use crate::views::schedule_list::ScheduleList;

pub const ADMIN_ANNOUNCEMENT_LIMIT: usize = 5;
pub const ANNOUNCEMENT_LIMIT: usize = 3;

/// RefreshKey
///
/// A counter shared between a form and the lists that depend on it. The form bumps it
/// after a successful create; the dashboard refetches when it sees a new value.
#[derive(Clone, Default, Debug)]
pub struct RefreshKey(Arc<AtomicU64>);

impl RefreshKey {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bump(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub fn current(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

/// Watches a `RefreshKey` and reports each new value once.
#[derive(Debug)]
struct KeyWatch {
    key: RefreshKey,
    seen: u64,
}

impl KeyWatch {
    fn new(key: RefreshKey) -> Self {
        let seen = key.current();
        Self { key, seen }
    }

    fn changed(&mut self) -> bool {
        let current = self.key.current();
        if current != self.seen {
            self.seen = current;
            true
        } else {
            false
        }
    }
}

pub fn welcome(user: &User) -> String {
    match user.role {
        Role::Admin => format!("Welcome, Administrator {}!", user.first_name),
        _ => format!("Welcome, {}!", user.first_name),
    }
}

/// AdminDashboard
///
/// Posting an announcement refreshes the admin list beside the form.
pub struct AdminDashboard {
    user: User,
    pub form: AnnouncementForm,
    pub announcements: AnnouncementsDisplay,
    watch: KeyWatch,
}

impl AdminDashboard {
    pub fn new(api: ApiState, user: User) -> Self {
        let key = RefreshKey::new();
        Self {
            user,
            form: AnnouncementForm::new(api.clone()).notify(key.clone()),
            announcements: AnnouncementsDisplay::new(api, ADMIN_ANNOUNCEMENT_LIMIT, true),
            watch: KeyWatch::new(key),
        }
    }

    pub async fn mount(&self) {
        self.announcements.refresh().await;
    }

    /// Refetches the announcements if the form posted since the last call.
    pub async fn sync(&mut self) -> bool {
        if self.watch.changed() {
            self.announcements.refresh().await;
            return true;
        }
        false
    }

    pub fn teardown(&self) {
        self.announcements.teardown();
    }

    pub fn render(&self) -> String {
        [
            welcome(&self.user),
            String::new(),
            format!("Quick actions: Manage Users [{}]", Route::AdminUsers),
            String::new(),
            "Recent Announcements".to_string(),
            self.announcements.render(),
        ]
        .join("\n")
    }
}

/// MentorDashboard
///
/// Requests awaiting a decision, confirmed upcoming meetings and the latest notices.
pub struct MentorDashboard {
    user: User,
    pub pending: ScheduleList,
    pub upcoming: ScheduleList,
    pub announcements: AnnouncementsDisplay,
}

impl MentorDashboard {
    pub fn new(api: ApiState, user: User) -> Self {
        Self {
            pending: ScheduleList::new(api.clone(), ScheduleFilter::Pending, user.role),
            upcoming: ScheduleList::new(api.clone(), ScheduleFilter::Upcoming, user.role),
            announcements: AnnouncementsDisplay::new(api, ANNOUNCEMENT_LIMIT, false),
            user,
        }
    }

    pub async fn mount(&self) {
        tokio::join!(
            self.pending.refresh(),
            self.upcoming.refresh(),
            self.announcements.refresh()
        );
    }

    pub fn teardown(&self) {
        self.pending.teardown();
        self.upcoming.teardown();
        self.announcements.teardown();
    }

    pub fn render(&self) -> String {
        [
            welcome(&self.user),
            String::new(),
            self.pending.render(),
            String::new(),
            self.upcoming.render(),
            String::new(),
            "Announcements".to_string(),
            self.announcements.render(),
        ]
        .join("\n")
    }
}

/// MenteeDashboard
///
/// A sent meeting request bumps the key so the upcoming list picks it up.
pub struct MenteeDashboard {
    user: User,
    pub meeting_form: Option<RequestMeetingForm>,
    pub upcoming: ScheduleList,
    pub past: ScheduleList,
    pub announcements: AnnouncementsDisplay,
    watch: KeyWatch,
}

impl MenteeDashboard {
    pub fn new(api: ApiState, user: User) -> Self {
        let key = RefreshKey::new();
        Self {
            meeting_form: RequestMeetingForm::for_viewer(api.clone(), user.role)
                .map(|form| form.notify(key.clone())),
            upcoming: ScheduleList::new(api.clone(), ScheduleFilter::Upcoming, user.role),
            past: ScheduleList::new(api.clone(), ScheduleFilter::Past, user.role),
            announcements: AnnouncementsDisplay::new(api, ANNOUNCEMENT_LIMIT, false),
            watch: KeyWatch::new(key),
            user,
        }
    }

    pub async fn mount(&self) {
        tokio::join!(
            self.upcoming.refresh(),
            self.past.refresh(),
            self.announcements.refresh()
        );
    }

    /// Refetches the schedule lists if a meeting was requested since the last call.
    pub async fn sync(&mut self) -> bool {
        if self.watch.changed() {
            tokio::join!(self.upcoming.refresh(), self.past.refresh());
            return true;
        }
        false
    }

    pub fn teardown(&self) {
        self.upcoming.teardown();
        self.past.teardown();
        self.announcements.teardown();
    }

    pub fn render(&self) -> String {
        [
            welcome(&self.user),
            String::new(),
            self.upcoming.render(),
            String::new(),
            self.past.render(),
            String::new(),
            "Announcements".to_string(),
            self.announcements.render(),
        ]
        .join("\n")
    }
}
