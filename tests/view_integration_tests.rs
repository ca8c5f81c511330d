mod common;

use chrono::{Duration, Utc};
use common::{MockPortalApi, announcement, schedule, tomorrow, user};
use sip_portal::{
    ApiError, ApiState, Route,
    models::{
        ContentBody, ContentItem, Course, CourseStatus, EntityRef, Module, Role, ScheduleFilter,
        ScheduleStatus, TargetRole, UserRef, UserSummary,
    },
    routes::Navigation,
    views::{
        LOADING_TEXT, ListResource, LoadState, Mutation,
        announcements::{self, AnnouncementForm, AnnouncementsDisplay},
        course_detail::{self, CourseDetail},
        course_form::{self, CreateCourseForm},
        course_list::{self, CourseList},
        dashboard::{AdminDashboard, MenteeDashboard},
        meeting_form::{self, RequestMeetingForm},
        schedule_list::{ScheduleList, StatusTone},
        users::{self, AdminUsersPage},
    },
};
use std::collections::BTreeSet;
use std::sync::Arc;

fn api_state(api: &Arc<MockPortalApi>) -> ApiState {
    api.clone()
}

fn course(id: &str, title: &str, description: &str) -> Course {
    Course {
        id: id.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        status: CourseStatus::Published,
        mentor: Some(UserRef::Populated(UserSummary {
            id: "mentor-1".to_string(),
            first_name: "Mia".to_string(),
            last_name: "Mentor".to_string(),
            email: Some("mia@example.com".to_string()),
        })),
    }
}

// --- Course list ---

#[tokio::test]
async fn test_empty_list_shows_empty_text_once() {
    let api = Arc::new(MockPortalApi::new());
    let list = CourseList::new(api_state(&api));

    list.refresh().await;

    assert_eq!(list.render(), course_list::EMPTY_TEXT);
    assert!(list.cards().is_empty());
}

#[tokio::test]
async fn test_course_cards_truncate_description() {
    let api = Arc::new(MockPortalApi::new());
    api.courses.lock().push(course("c1", "Rust", &"d".repeat(150)));
    let list = CourseList::new(api_state(&api));

    list.refresh().await;

    let cards = list.cards();
    assert_eq!(cards.len(), 1);
    assert_eq!(cards[0].summary, format!("{}...", "d".repeat(100)));
    assert_eq!(cards[0].mentor, "Mia Mentor");
    assert_eq!(cards[0].link, Route::CourseDetail("c1".into()));
}

#[tokio::test]
async fn test_failed_fetch_resets_to_error_banner() {
    let api = Arc::new(MockPortalApi::new());
    api.courses.lock().push(course("c1", "Rust", "Ownership"));
    let list = CourseList::new(api_state(&api));
    list.refresh().await;
    assert_eq!(list.cards().len(), 1);

    *api.fail_reads.lock() = Some(ApiError::Server { status: 500, message: None });
    let state = list.refresh().await;

    assert_eq!(state, LoadState::Failed(course_list::LOAD_ERROR.to_string()));
    assert!(list.cards().is_empty());
    assert_eq!(list.render(), format!("Error: {}", course_list::LOAD_ERROR));
}

#[tokio::test]
async fn test_refetch_with_unchanged_backend_yields_same_ids() {
    let api = Arc::new(MockPortalApi::new());
    api.courses.lock().extend([
        course("c1", "Rust", "Ownership"),
        course("c2", "Go", "Goroutines"),
    ]);
    let list = CourseList::new(api_state(&api));

    let ids = |state: LoadState<Course>| -> BTreeSet<String> {
        state.items().iter().map(|c| c.id.clone()).collect()
    };
    let first = ids(list.refresh().await);
    let second = ids(list.refresh().await);

    assert_eq!(first, second);
    assert_eq!(first.len(), 2);
}

// --- Fetch lifecycle ---

#[tokio::test]
async fn test_late_response_after_teardown_is_discarded() {
    let resource: ListResource<u32> = ListResource::new();
    let background = resource.clone();

    let handle = tokio::spawn(async move {
        background
            .load(
                async {
                    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
                    Ok(vec![1, 2, 3])
                },
                "Failed.",
            )
            .await
    });

    tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    resource.teardown();
    handle.await.unwrap();

    assert!(resource.state().is_loading());
    assert!(resource.items().is_empty());
}

#[tokio::test]
async fn test_superseded_fetch_is_discarded() {
    let resource: ListResource<u32> = ListResource::new();
    let slow = resource.clone();

    let handle = tokio::spawn(async move {
        slow.load(
            async {
                tokio::time::sleep(std::time::Duration::from_millis(50)).await;
                Ok(vec![1])
            },
            "Failed.",
        )
        .await
    });

    tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    resource.load(async { Ok(vec![2, 3]) }, "Failed.").await;
    handle.await.unwrap();

    assert_eq!(resource.items(), vec![2, 3]);
}

// --- Course detail ---

#[tokio::test]
async fn test_course_detail_lists_modules_and_items_in_order() {
    let api = Arc::new(MockPortalApi::new());
    api.courses.lock().push(course("c1", "Rust", "Ownership"));
    api.modules.lock().extend([
        Module {
            id: "m2".into(),
            course: Some(EntityRef::Id("c1".into())),
            order: 2,
            title: "Traits".into(),
            description: None,
        },
        Module {
            id: "m1".into(),
            course: Some(EntityRef::Id("c1".into())),
            order: 1,
            title: "Basics".into(),
            description: Some("Start here".into()),
        },
    ]);
    api.content_items.lock().push(ContentItem {
        id: "i1".into(),
        module: Some(EntityRef::Id("m1".into())),
        order: 1,
        title: "Welcome".into(),
        body: ContentBody::Video {
            video_url: Some("https://videos.example.org/1".into()),
        },
    });

    let viewer = user("mentee-1", "Max", Role::Mentee);
    let detail = CourseDetail::new(api_state(&api), "c1", Some(viewer));
    detail.load().await;

    let titles: Vec<String> = detail.modules().items().iter().map(|m| m.title.clone()).collect();
    assert_eq!(titles, vec!["Basics", "Traits"]);
    assert_eq!(detail.content_items("m1").items().len(), 1);
    assert_eq!(detail.content_items("m2"), LoadState::Ready(vec![]));
    assert!(!detail.can_edit());
    assert!(!detail.can_manage_content());

    let page = detail.render();
    assert!(page.contains("Mentor: Mia Mentor (mia@example.com)"));
    assert!(page.contains("Status: Published"));
    assert!(page.contains("1. Welcome (Video)"));
    assert!(page.contains("View Video: https://videos.example.org/1"));
    assert!(page.contains(course_detail::NO_ITEMS_TEXT));
}

#[tokio::test]
async fn test_course_detail_not_found() {
    let api = Arc::new(MockPortalApi::new());
    let detail = CourseDetail::new(api_state(&api), "missing", None);

    detail.load().await;

    assert_eq!(detail.course_error().as_deref(), Some("Course not found."));
    assert_eq!(detail.render(), "Error: Course not found.");
}

#[tokio::test]
async fn test_course_mentor_and_admin_can_edit() {
    let api = Arc::new(MockPortalApi::new());
    api.courses.lock().push(course("c1", "Rust", "Ownership"));

    let owner = CourseDetail::new(
        api_state(&api),
        "c1",
        Some(user("mentor-1", "Mia", Role::Mentor)),
    );
    owner.load().await;
    assert!(owner.can_edit());
    assert!(owner.render().contains(course_detail::NO_MODULES_TEXT));

    let other_mentor = CourseDetail::new(
        api_state(&api),
        "c1",
        Some(user("mentor-2", "Ola", Role::Mentor)),
    );
    other_mentor.load().await;
    assert!(!other_mentor.can_edit());
    assert!(other_mentor.can_manage_content());

    let admin = CourseDetail::new(api_state(&api), "c1", Some(user("a1", "Grace", Role::Admin)));
    admin.load().await;
    assert!(admin.can_edit());
}

// --- Create course ---

#[tokio::test]
async fn test_create_course_validation_and_redirect() {
    let api = Arc::new(MockPortalApi::new());
    let mut form = CreateCourseForm::new(api_state(&api));

    form.title = "Rust".into();
    assert_eq!(form.submit().await, None);
    assert_eq!(form.error(), Some(course_form::REQUIRED_FIELDS));
    assert!(!api.called("create_course"));

    form.description = "Ownership".into();
    let nav = form.submit().await.expect("should navigate");
    let id = match nav {
        Navigation::Push(Route::CourseDetail(id)) => id,
        other => panic!("unexpected navigation {:?}", other),
    };
    assert_eq!(api.courses.lock()[0].id, id);
    assert_eq!(api.courses.lock()[0].status, CourseStatus::Draft);
    assert_eq!(
        form.success(),
        Some("Course \"Rust\" created successfully! Redirecting...")
    );
}

#[tokio::test]
async fn test_create_course_failure_keeps_fields() {
    let api = Arc::new(MockPortalApi::new());
    *api.fail_writes.lock() = Some(ApiError::Forbidden {
        message: Some("Not authorized as a mentor".into()),
    });
    let mut form = CreateCourseForm::new(api_state(&api));
    form.title = "Rust".into();
    form.description = "Ownership".into();

    assert_eq!(form.submit().await, None);
    assert_eq!(form.error(), Some("Not authorized as a mentor"));
    assert_eq!(form.title, "Rust");
    assert_eq!(form.description, "Ownership");
}

// --- Meeting requests ---

#[tokio::test]
async fn test_meeting_in_the_past_never_reaches_network() {
    let api = Arc::new(MockPortalApi::new());
    let mut form = RequestMeetingForm::for_viewer(api_state(&api), Role::Mentee).unwrap();
    let now = Utc::now();
    form.requested_time = Some(now - Duration::hours(2));

    assert!(!form.submit_at(now).await);
    assert_eq!(form.error(), Some(meeting_form::PAST_TIME));
    assert!(!api.called("request_meeting"));
}

#[tokio::test]
async fn test_meeting_requires_positive_duration() {
    let api = Arc::new(MockPortalApi::new());
    let mut form = RequestMeetingForm::for_viewer(api_state(&api), Role::Mentee).unwrap();
    form.duration_minutes = 0;

    assert!(!form.submit().await);
    assert_eq!(form.error(), Some(meeting_form::INVALID_INPUT));

    form.duration_minutes = 30;
    form.requested_time = None;
    assert!(!form.submit().await);
    assert_eq!(form.error(), Some(meeting_form::INVALID_INPUT));
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn test_meeting_validation_is_a_client_side_rejection() {
    let api = Arc::new(MockPortalApi::new());
    let mut form = RequestMeetingForm::for_viewer(api_state(&api), Role::Mentee).unwrap();
    let now = Utc::now();

    form.requested_time = Some(now - Duration::minutes(5));
    let err = form.validate(now).unwrap_err();
    assert!(matches!(&err, ApiError::Validation(msg) if msg == meeting_form::PAST_TIME));
    assert_eq!(err.status(), None);

    form.requested_time = Some(now + Duration::hours(2));
    form.duration_minutes = 45;
    let request = form.validate(now).unwrap();
    assert_eq!(request.duration_minutes, 45);
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn test_meeting_form_is_mentee_only() {
    let api = Arc::new(MockPortalApi::new());
    assert!(RequestMeetingForm::for_viewer(api_state(&api), Role::Mentor).is_none());
    assert!(RequestMeetingForm::for_viewer(api_state(&api), Role::Admin).is_none());
}

#[tokio::test]
async fn test_meeting_message_is_capped() {
    let api = Arc::new(MockPortalApi::new());
    let mut form = RequestMeetingForm::for_viewer(api_state(&api), Role::Mentee).unwrap();
    form.set_message(&"m".repeat(800));
    assert_eq!(form.message().chars().count(), meeting_form::MAX_MESSAGE_CHARS);
}

#[tokio::test]
async fn test_sent_meeting_refreshes_dashboard() {
    let api = Arc::new(MockPortalApi::new());
    let mut dashboard = MenteeDashboard::new(api_state(&api), user("mentee-1", "Max", Role::Mentee));
    dashboard.mount().await;
    assert!(dashboard.upcoming.rows().is_empty());

    let form = dashboard.meeting_form.as_mut().unwrap();
    form.requested_time = Some(tomorrow());
    form.set_message("Career advice");
    assert!(form.submit().await);
    assert_eq!(form.success(), Some(meeting_form::SENT));
    assert_eq!(form.message(), "");
    assert_eq!(form.duration_minutes, meeting_form::DEFAULT_DURATION_MINUTES);

    assert!(dashboard.sync().await);
    assert_eq!(dashboard.upcoming.rows().len(), 1);
    assert!(!dashboard.sync().await);
}

// --- Schedules ---

#[tokio::test]
async fn test_mentor_confirms_pending_meeting() {
    let api = Arc::new(MockPortalApi::new());
    let requested = tomorrow();
    api.schedules.lock().push(schedule("s1", ScheduleStatus::Pending, requested));
    let list = ScheduleList::new(api_state(&api), ScheduleFilter::Pending, Role::Mentor);
    list.refresh().await;

    let rows = list.rows();
    assert_eq!(rows[0].counterpart, "Mentee: Max Mentee");
    assert_eq!(rows[0].tone, StatusTone::Warning);
    assert!(rows[0].actionable);

    let suggested = list.suggested_confirm_time("s1").unwrap();
    assert_eq!(suggested, requested);
    list.confirm("s1", suggested).await.unwrap();

    let (id, update) = api.last_status_update.lock().clone().unwrap();
    assert_eq!(id, "s1");
    assert_eq!(update.status, ScheduleStatus::Confirmed);
    assert_eq!(update.confirmed_time, Some(requested));
    // Refetched: the confirmed meeting left the pending list
    assert!(list.rows().is_empty());
    assert!(api.called("list_schedules:pending"));
}

#[tokio::test]
async fn test_reject_failure_returns_alert() {
    let api = Arc::new(MockPortalApi::new());
    api.schedules.lock().push(schedule("s1", ScheduleStatus::Pending, tomorrow()));
    *api.fail_writes.lock() = Some(ApiError::Server { status: 500, message: None });
    let list = ScheduleList::new(api_state(&api), ScheduleFilter::Pending, Role::Mentor);
    list.refresh().await;

    let alert = list.reject("s1", Some("Busy".into())).await.unwrap_err();

    assert_eq!(alert, "Failed to update status.");
    assert_eq!(list.rows().len(), 1);
}

#[tokio::test]
async fn test_mentee_sees_mentor_and_no_actions() {
    let api = Arc::new(MockPortalApi::new());
    api.schedules.lock().push(schedule("s1", ScheduleStatus::Pending, tomorrow()));
    let list = ScheduleList::new(api_state(&api), ScheduleFilter::Upcoming, Role::Mentee);
    list.refresh().await;

    let rows = list.rows();
    assert_eq!(rows[0].counterpart, "Mentor: Mia Mentor");
    assert!(!rows[0].actionable);
}

#[tokio::test]
async fn test_single_row_expanded_at_a_time() {
    let api = Arc::new(MockPortalApi::new());
    let list = ScheduleList::new(api_state(&api), ScheduleFilter::All, Role::Mentor);

    list.toggle_expanded("s1");
    list.toggle_expanded("s2");
    assert_eq!(list.expanded().as_deref(), Some("s2"));
    list.toggle_expanded("s2");
    assert_eq!(list.expanded(), None);
}

#[tokio::test]
async fn test_schedule_list_loading_and_empty() {
    let api = Arc::new(MockPortalApi::new());
    let list = ScheduleList::new(api_state(&api), ScheduleFilter::Past, Role::Mentee);
    assert!(list.render().ends_with(LOADING_TEXT));

    list.refresh().await;
    assert_eq!(
        list.render(),
        "Past Meetings / Requests\nNo schedules found for this filter."
    );
}

// --- Announcements ---

#[tokio::test]
async fn test_all_and_specific_roles_are_exclusive() {
    let api = Arc::new(MockPortalApi::new());
    let mut form = AnnouncementForm::new(api_state(&api));
    assert_eq!(form.target_roles(), &[TargetRole::All]);
    assert!(!form.is_role_enabled(TargetRole::Mentor));

    form.toggle_role(TargetRole::Mentor, true);
    assert_eq!(form.target_roles(), &[TargetRole::Mentor]);
    form.toggle_role(TargetRole::Mentee, true);
    assert_eq!(form.target_roles(), &[TargetRole::Mentor, TargetRole::Mentee]);

    form.toggle_role(TargetRole::All, true);
    assert_eq!(form.target_roles(), &[TargetRole::All]);

    form.toggle_role(TargetRole::All, false);
    assert!(form.target_roles().is_empty());
}

#[tokio::test]
async fn test_announcement_requires_a_target() {
    let api = Arc::new(MockPortalApi::new());
    let mut form = AnnouncementForm::new(api_state(&api));
    form.title = "Holiday".into();
    form.content = "Office closed".into();
    form.toggle_role(TargetRole::All, false);

    assert!(!form.submit().await);
    assert_eq!(form.error(), Some(announcements::REQUIRED_FIELDS));
    assert!(!api.called("create_announcement"));
}

#[tokio::test]
async fn test_posting_refreshes_admin_dashboard() {
    let api = Arc::new(MockPortalApi::new());
    let mut dashboard = AdminDashboard::new(api_state(&api), user("a1", "Grace", Role::Admin));
    dashboard.mount().await;
    assert!(dashboard.render().contains(announcements::EMPTY_TEXT));

    dashboard.form.title = "Holiday".into();
    dashboard.form.content = "Office closed".into();
    dashboard.form.toggle_role(TargetRole::Mentee, true);
    assert!(dashboard.form.submit().await);
    assert_eq!(dashboard.form.success(), Some(announcements::POSTED));
    assert_eq!(dashboard.form.target_roles(), &[TargetRole::All]);

    assert!(dashboard.sync().await);
    let page = dashboard.render();
    assert!(page.starts_with("Welcome, Administrator Grace!"));
    assert!(page.contains("Holiday"));
    assert!(page.contains("(Targets: Mentee)"));
}

#[tokio::test]
async fn test_optimistic_delete_rolls_back_on_failure() {
    let api = Arc::new(MockPortalApi::new());
    api.announcements.lock().extend([
        announcement("a1", "First", &[TargetRole::All]),
        announcement("a2", "Second", &[TargetRole::Mentor]),
    ]);
    let display = AnnouncementsDisplay::new(api_state(&api), 5, true);
    display.refresh().await;

    *api.fail_writes.lock() = Some(ApiError::Server { status: 500, message: None });
    let outcome = display.delete("a1").await;

    assert_eq!(
        outcome,
        Some(Mutation::RolledBack(announcements::DELETE_ERROR.to_string()))
    );
    let ids: Vec<String> = display.state().items().iter().map(|a| a.id.clone()).collect();
    assert_eq!(ids, vec!["a1", "a2"]);
}

#[tokio::test]
async fn test_optimistic_delete_applies() {
    let api = Arc::new(MockPortalApi::new());
    api.announcements.lock().push(announcement("a1", "First", &[TargetRole::All]));
    let display = AnnouncementsDisplay::new(api_state(&api), 5, true);
    display.refresh().await;

    assert_eq!(display.delete("a1").await, Some(Mutation::Applied));
    assert_eq!(display.last_mutation(), Some(Mutation::Applied));
    assert_eq!(display.render(), announcements::EMPTY_TEXT);
}

#[tokio::test]
async fn test_non_admin_view_cannot_delete() {
    let api = Arc::new(MockPortalApi::new());
    api.announcements.lock().push(announcement("a1", "First", &[TargetRole::All]));
    let display = AnnouncementsDisplay::new(api_state(&api), 3, false);
    display.refresh().await;

    assert_eq!(display.delete("a1").await, None);
    assert!(!api.called("delete_announcement"));
    assert!(display.render().contains("Posted by Grace on"));
    assert!(!display.render().contains("Targets"));
}

// --- User management ---

#[tokio::test]
async fn test_admin_creates_mentor_and_row_appears() {
    let api = Arc::new(MockPortalApi::new());
    let mut page = AdminUsersPage::new(api_state(&api));
    page.refresh().await;
    assert_eq!(page.render(), format!("User Management\n{}", users::EMPTY_TEXT));

    page.open_add();
    let modal = page.modal_mut().unwrap();
    modal.first_name = "Mo".into();
    modal.last_name = "Mentor".into();
    modal.email = "m@x.com".into();
    modal.role = Role::Mentor;
    modal.password = "secret1".into();

    assert!(page.save().await);
    assert!(page.modal().is_none());

    let rows = page.rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].email, "m@x.com");
    assert_eq!(rows[0].role, Role::Mentor);
    assert_eq!(rows[0].tone, "primary");
}

#[tokio::test]
async fn test_failed_save_keeps_modal_open() {
    let api = Arc::new(MockPortalApi::new());
    *api.fail_writes.lock() = Some(ApiError::Server {
        status: 400,
        message: Some("User already exists".into()),
    });
    let mut page = AdminUsersPage::new(api_state(&api));
    page.open_add();
    let modal = page.modal_mut().unwrap();
    modal.email = "m@x.com".into();
    modal.password = "secret1".into();

    assert!(!page.save().await);
    assert_eq!(page.modal().and_then(|m| m.error()), Some("User already exists"));
}

#[tokio::test]
async fn test_created_password_is_sent_as_typed() {
    let api = Arc::new(MockPortalApi::new());
    let mut page = AdminUsersPage::new(api_state(&api));
    page.open_add();
    let modal = page.modal_mut().unwrap();
    modal.first_name = " Mo ".into();
    modal.email = "m@x.com".into();
    modal.password = "  secret  ".into();

    assert!(page.save().await);

    let sent = api.last_user_payload.lock().clone().unwrap();
    assert_eq!(sent.first_name, "Mo");
    assert_eq!(sent.password.as_deref(), Some("  secret  "));
}

#[tokio::test]
async fn test_short_password_blocks_save() {
    let api = Arc::new(MockPortalApi::new());
    let mut page = AdminUsersPage::new(api_state(&api));
    page.open_add();
    page.modal_mut().unwrap().password = "12345".into();

    assert!(!page.save().await);
    assert_eq!(page.modal().and_then(|m| m.error()), Some(users::PASSWORD_TOO_SHORT));
    assert!(!api.called("create_user"));
}

#[tokio::test]
async fn test_edit_without_password_keeps_it() {
    let api = Arc::new(MockPortalApi::new());
    api.users.lock().push(user("u1", "Ada", Role::Mentee));
    let mut page = AdminUsersPage::new(api_state(&api));
    page.refresh().await;

    let existing = page.state().items()[0].clone();
    page.open_edit(existing);
    page.modal_mut().unwrap().role = Role::Mentor;
    assert!(page.save().await);

    let payload = api.last_user_payload.lock().clone().unwrap();
    assert_eq!(payload.password, None);
    assert_eq!(page.rows()[0].role, Role::Mentor);
}

#[tokio::test]
async fn test_delete_failure_sets_page_error() {
    let api = Arc::new(MockPortalApi::new());
    api.users.lock().push(user("u1", "Ada", Role::Mentee));
    let page = AdminUsersPage::new(api_state(&api));
    page.refresh().await;

    *api.fail_writes.lock() = Some(ApiError::Network("reset".into()));
    assert!(!page.delete("u1").await);
    assert_eq!(page.page_error().as_deref(), Some(users::DELETE_ERROR));
    assert_eq!(page.rows().len(), 1);

    *api.fail_writes.lock() = None;
    assert!(page.delete("u1").await);
    assert!(page.rows().is_empty());
    assert_eq!(page.page_error(), None);
}
