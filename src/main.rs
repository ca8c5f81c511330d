use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use sip_portal::{
    GuardOutcome, PortalContext, Route,
    config::{AppConfig, Env},
    models::{CourseStatus, RegisterRequest, Role, ScheduleFilter, TargetRole, User},
    views::{
        announcements::AnnouncementsDisplay,
        course_detail::CourseDetail,
        course_form::CreateCourseForm,
        course_list::CourseList,
        dashboard::{
            ADMIN_ANNOUNCEMENT_LIMIT, ANNOUNCEMENT_LIMIT, AdminDashboard, MenteeDashboard,
            MentorDashboard,
        },
        layout::Layout,
        login::LoginForm,
        schedule_list::ScheduleList,
        users::AdminUsersPage,
    },
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "sip-portal")]
#[command(author, version, about = "Student Internship Programme portal client", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in and persist the session token
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Create an account and sign in
    Register {
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        role: Option<String>,
    },
    /// End the session and forget the token
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Show the dashboard for the signed-in role
    Dashboard,
    /// List courses
    Courses,
    /// Show one course with its modules and content
    Course { id: String },
    /// Create a course (Mentor/Admin)
    CreateCourse {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        /// draft, published or archived
        #[arg(long, default_value = "draft")]
        status: String,
    },
    /// List meetings
    Schedules {
        /// upcoming, pending, past or all
        #[arg(long, default_value = "upcoming")]
        filter: String,
    },
    /// Ask a mentor for a meeting (Mentee)
    RequestMeeting {
        /// RFC 3339 timestamp; defaults to the next whole hour
        #[arg(long)]
        at: Option<DateTime<Utc>>,
        #[arg(long, default_value_t = 30)]
        duration: i64,
        #[arg(long, default_value = "")]
        message: String,
    },
    /// Confirm a pending meeting (Mentor)
    Confirm {
        id: String,
        /// RFC 3339 timestamp; defaults to the requested time
        #[arg(long)]
        time: Option<DateTime<Utc>>,
    },
    /// Reject a pending meeting (Mentor)
    Reject {
        id: String,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Show recent announcements
    Announcements {
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Post an announcement (Admin)
    Announce {
        #[arg(long)]
        title: String,
        #[arg(long)]
        content: String,
        /// Repeatable: all, admin, mentor, mentee
        #[arg(long = "target")]
        targets: Vec<String>,
    },
    /// Delete an announcement (Admin)
    DeleteAnnouncement { id: String },
    /// Manage user accounts (Admin)
    Users {
        #[command(subcommand)]
        action: UsersAction,
    },
    /// Switch between the light and dark theme
    Theme,
}

#[derive(Subcommand, Debug)]
enum UsersAction {
    List,
    Create {
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        email: String,
        #[arg(long, default_value = "mentee")]
        role: String,
        #[arg(long)]
        password: String,
    },
    Update {
        id: String,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        role: Option<String>,
        #[arg(long)]
        password: Option<String>,
    },
    Delete {
        id: String,
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
}

fn parse_role(value: &str) -> Result<Role> {
    let role = Role::parse(value);
    if !Role::ASSIGNABLE.contains(&role) {
        bail!("Unknown role '{}'. Use admin, mentor or mentee.", value);
    }
    Ok(role)
}

fn parse_course_status(value: &str) -> Result<CourseStatus> {
    match value.to_ascii_lowercase().as_str() {
        "draft" => Ok(CourseStatus::Draft),
        "published" => Ok(CourseStatus::Published),
        "archived" => Ok(CourseStatus::Archived),
        other => bail!("Unknown course status '{}'.", other),
    }
}

/// enter
///
/// Resolves the session and runs the guard for `route`. A redirect aborts the command.
async fn enter(ctx: &PortalContext, route: &Route) -> Result<()> {
    match ctx.enter(route).await {
        GuardOutcome::Render => Ok(()),
        GuardOutcome::Redirect(nav) if *nav.route() == Route::Login => {
            bail!("Not signed in. Run `sip-portal login` first.")
        }
        GuardOutcome::Redirect(nav) => {
            bail!("Access denied to {}; redirected to {}.", route, nav.route())
        }
        GuardOutcome::Forbidden => {
            bail!("Your role has no access to {}.", route)
        }
        GuardOutcome::Loading => bail!("Session could not be resolved."),
    }
}

/// The signed-in user; only called after a guard has passed.
fn current_user(ctx: &PortalContext) -> Result<User> {
    ctx.session.user().context("No active session.")
}

async fn show(ctx: &PortalContext, page: String) {
    let layout = Layout::load(ctx.storage.clone()).await;
    println!("{}", layout.render(&ctx.session.snapshot(), &page));
}

async fn run(ctx: &PortalContext, command: Command) -> Result<()> {
    match command {
        Command::Login { email, password } => {
            let mut form = LoginForm::new(ctx.session.clone());
            ctx.session.initialize().await;
            if let Some(nav) = form.on_mount() {
                println!("Already signed in. Go to {}", nav.route());
                return Ok(());
            }
            form.email = email;
            form.password = password;
            match form.submit().await {
                Some(nav) => println!("Signed in. Go to {}", nav.route()),
                None => bail!(form.error().unwrap_or_default()),
            }
        }
        Command::Register {
            first_name,
            last_name,
            email,
            password,
            role,
        } => {
            let request = RegisterRequest {
                first_name,
                last_name,
                email,
                password,
                role: role.as_deref().map(parse_role).transpose()?,
            };
            ctx.session.initialize().await;
            match ctx.session.register(&request).await {
                Some(nav) => println!("Registered. Go to {}", nav.route()),
                None => bail!(ctx.session.snapshot().error.unwrap_or_default()),
            }
        }
        Command::Logout => {
            ctx.session.initialize().await;
            let nav = ctx.session.logout().await;
            println!("Signed out. Go to {}", nav.route());
        }
        Command::Whoami => {
            let snapshot = ctx.session.initialize().await;
            match snapshot.user() {
                Some(user) => println!("{} <{}> ({})", user.full_name(), user.email, user.role),
                None => println!("Not signed in."),
            }
        }
        Command::Dashboard => {
            ctx.session.initialize().await;
            let user = ctx.session.user().context("Not signed in.")?;
            let route = Route::dashboard_for(user.role);
            enter(ctx, &route).await?;
            let page = match route {
                Route::AdminDashboard => {
                    let dashboard = AdminDashboard::new(ctx.api.clone(), user);
                    dashboard.mount().await;
                    dashboard.render()
                }
                Route::MentorDashboard => {
                    let dashboard = MentorDashboard::new(ctx.api.clone(), user);
                    dashboard.mount().await;
                    dashboard.render()
                }
                _ => {
                    let dashboard = MenteeDashboard::new(ctx.api.clone(), user);
                    dashboard.mount().await;
                    dashboard.render()
                }
            };
            show(ctx, page).await;
        }
        Command::Courses => {
            enter(ctx, &Route::Courses).await?;
            let list = CourseList::new(ctx.api.clone());
            list.refresh().await;
            show(ctx, list.render()).await;
        }
        Command::Course { id } => {
            enter(ctx, &Route::CourseDetail(id.clone())).await?;
            let detail = CourseDetail::new(ctx.api.clone(), id, ctx.session.user());
            detail.load().await;
            show(ctx, detail.render()).await;
        }
        Command::CreateCourse {
            title,
            description,
            status,
        } => {
            enter(ctx, &Route::CreateCourse).await?;
            let mut form = CreateCourseForm::new(ctx.api.clone());
            form.title = title;
            form.description = description;
            form.status = parse_course_status(&status)?;
            match form.submit().await {
                Some(nav) => {
                    println!("{}", form.success().unwrap_or_default());
                    println!("Go to {}", nav.route());
                }
                None => bail!(form.error().unwrap_or_default().to_string()),
            }
        }
        Command::Schedules { filter } => {
            let filter = ScheduleFilter::parse(&filter)
                .with_context(|| format!("Unknown filter '{}'.", filter))?;
            ctx.session.initialize().await;
            let user = ctx.session.user().context("Not signed in.")?;
            enter(ctx, &Route::dashboard_for(user.role)).await?;
            let list = ScheduleList::new(ctx.api.clone(), filter, user.role);
            list.refresh().await;
            show(ctx, list.render()).await;
        }
        Command::RequestMeeting {
            at,
            duration,
            message,
        } => {
            enter(ctx, &Route::MenteeDashboard).await?;
            let user = current_user(ctx)?;
            let mut dashboard = MenteeDashboard::new(ctx.api.clone(), user);
            let Some(form) = dashboard.meeting_form.as_mut() else {
                bail!("Only mentees can request meetings.");
            };
            if at.is_some() {
                form.requested_time = at;
            }
            form.duration_minutes = duration;
            form.set_message(&message);
            if !form.submit().await {
                bail!(form.error().unwrap_or_default().to_string());
            }
            println!("{}", form.success().unwrap_or_default());
            dashboard.sync().await;
            show(ctx, dashboard.upcoming.render()).await;
        }
        Command::Confirm { id, time } => {
            enter(ctx, &Route::MentorDashboard).await?;
            let user = current_user(ctx)?;
            let list = ScheduleList::new(ctx.api.clone(), ScheduleFilter::Pending, user.role);
            list.refresh().await;
            let time = time
                .or_else(|| list.suggested_confirm_time(&id))
                .with_context(|| format!("No pending meeting {}; pass --time.", id))?;
            list.confirm(&id, time).await.map_err(anyhow::Error::msg)?;
            println!("Meeting confirmed.");
            show(ctx, list.render()).await;
        }
        Command::Reject { id, notes } => {
            enter(ctx, &Route::MentorDashboard).await?;
            let user = current_user(ctx)?;
            let list = ScheduleList::new(ctx.api.clone(), ScheduleFilter::Pending, user.role);
            list.reject(&id, notes).await.map_err(anyhow::Error::msg)?;
            println!("Meeting rejected.");
            show(ctx, list.render()).await;
        }
        Command::Announcements { limit } => {
            ctx.session.initialize().await;
            let user = ctx.session.user().context("Not signed in.")?;
            enter(ctx, &Route::dashboard_for(user.role)).await?;
            let admin_view = user.role == Role::Admin;
            let default_limit = if admin_view {
                ADMIN_ANNOUNCEMENT_LIMIT
            } else {
                ANNOUNCEMENT_LIMIT
            };
            let display =
                AnnouncementsDisplay::new(ctx.api.clone(), limit.unwrap_or(default_limit), admin_view);
            display.refresh().await;
            show(ctx, display.render()).await;
        }
        Command::Announce {
            title,
            content,
            targets,
        } => {
            enter(ctx, &Route::AdminDashboard).await?;
            let user = current_user(ctx)?;
            let mut dashboard = AdminDashboard::new(ctx.api.clone(), user);
            dashboard.form.title = title;
            dashboard.form.content = content;
            for target in &targets {
                let role = TargetRole::parse(target)
                    .with_context(|| format!("Unknown target role '{}'.", target))?;
                dashboard.form.toggle_role(role, true);
            }
            if !dashboard.form.submit().await {
                bail!(dashboard.form.error().unwrap_or_default().to_string());
            }
            println!("{}", dashboard.form.success().unwrap_or_default());
            dashboard.sync().await;
            show(ctx, dashboard.render()).await;
        }
        Command::DeleteAnnouncement { id } => {
            enter(ctx, &Route::AdminDashboard).await?;
            let display = AnnouncementsDisplay::new(ctx.api.clone(), ADMIN_ANNOUNCEMENT_LIMIT, true);
            display.refresh().await;
            match display.delete(&id).await {
                Some(sip_portal::views::Mutation::RolledBack(message)) => bail!(message),
                _ => println!("Announcement deleted."),
            }
            show(ctx, display.render()).await;
        }
        Command::Users { action } => {
            enter(ctx, &Route::AdminUsers).await?;
            run_users(ctx, action).await?;
        }
        Command::Theme => {
            let mut layout = Layout::load(ctx.storage.clone()).await;
            let theme = layout.toggle_theme().await?;
            println!("Theme set to {}.", theme.as_str());
        }
    }
    Ok(())
}

async fn run_users(ctx: &PortalContext, action: UsersAction) -> Result<()> {
    let mut page = AdminUsersPage::new(ctx.api.clone());
    page.refresh().await;

    match action {
        UsersAction::List => {}
        UsersAction::Create {
            first_name,
            last_name,
            email,
            role,
            password,
        } => {
            page.open_add();
            if let Some(modal) = page.modal_mut() {
                modal.first_name = first_name;
                modal.last_name = last_name;
                modal.email = email;
                modal.role = parse_role(&role)?;
                modal.password = password;
            }
            save_modal(&mut page).await?;
            println!("User created.");
        }
        UsersAction::Update {
            id,
            first_name,
            last_name,
            email,
            role,
            password,
        } => {
            let user = page
                .state()
                .items()
                .iter()
                .find(|u| u.id == id)
                .cloned()
                .with_context(|| format!("No user with id {}.", id))?;
            page.open_edit(user);
            if let Some(modal) = page.modal_mut() {
                if let Some(first_name) = first_name {
                    modal.first_name = first_name;
                }
                if let Some(last_name) = last_name {
                    modal.last_name = last_name;
                }
                if let Some(email) = email {
                    modal.email = email;
                }
                if let Some(role) = role {
                    modal.role = parse_role(&role)?;
                }
                modal.password = password.unwrap_or_default();
            }
            save_modal(&mut page).await?;
            println!("User updated.");
        }
        UsersAction::Delete { id, yes } => {
            if !yes {
                bail!("Deleting a user cannot be undone. Pass --yes to confirm.");
            }
            if !page.delete(&id).await {
                bail!(page.page_error().unwrap_or_default());
            }
            println!("User deleted.");
        }
    }

    show(ctx, page.render()).await;
    Ok(())
}

async fn save_modal(page: &mut AdminUsersPage) -> Result<()> {
    if page.save().await {
        return Ok(());
    }
    let message = page
        .modal()
        .and_then(|m| m.error())
        .unwrap_or_default()
        .to_string();
    bail!(message)
}

/// main
///
/// Loads configuration, installs logging, wires the portal context and runs one
/// command.
#[tokio::main]
async fn main() -> Result<()> {
    // 1. Configuration & Environment Loading (Fail-Fast)
    dotenv::dotenv().ok();
    let config = AppConfig::load();

    // 2. Logging Filter Setup
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "sip_portal=debug,reqwest=info".into());

    // 3. Logging format follows the environment: pretty locally, JSON in production.
    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
    }

    let args = Args::parse();
    tracing::debug!("Client starting in {:?} mode against {}", config.env, config.api_url);

    // 4. Composition root
    let ctx = PortalContext::from_config(config).context("Failed to build the API client")?;

    let outcome = run(&ctx, args.command).await;

    // 5. A 401 anywhere ends the session
    if let Some(nav) = ctx.settle_session().await {
        eprintln!("Session expired. Sign in again at {}.", nav.route());
    }
    outcome
}
