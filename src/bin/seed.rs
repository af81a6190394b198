//! Seed the database with a demo account and sample data
//!
//! Uses the same configuration as the server. Does nothing when the demo
//! user already exists.

use std::sync::Arc;

use anyhow::Context;
use chrono::{Datelike, Duration, TimeZone, Utc};
use tracing::info;

use momentum::config::Config;
use momentum::database::DatabaseManager;
use momentum::logging::init_logging;
use momentum::models::category::CreateCategory;
use momentum::models::emotion::Emotion;
use momentum::models::focus_session::{FocusKind, LogFocusSession};
use momentum::models::goal::CreateGoal;
use momentum::models::project::CreateProject;
use momentum::models::recurrence::{DayOfWeek, RecurrenceRule};
use momentum::models::task::{CreateTask, Priority, TaskStatus};
use momentum::models::template::CreateTemplate;
use momentum::models::user::Credentials;
use momentum::server::AppState;
use momentum::services::SystemTimeProvider;

const DEMO_USERNAME: &str = "demo";
const DEMO_PASSWORD: &str = "demo-password";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("Invalid configuration")?;
    init_logging(&config.log_level, false);

    config.ensure_data_dir()?;
    let db = DatabaseManager::new(&config.resolved_database_url()).await?;
    db.migrate().await?;

    let state = AppState::new(config, db.clone(), Arc::new(SystemTimeProvider), None);

    if state.auth.user_by_username(DEMO_USERNAME).await?.is_some() {
        info!("Demo user already exists, nothing to seed");
        return Ok(());
    }

    seed(&state).await?;
    db.close().await;
    Ok(())
}

async fn seed(state: &AppState) -> anyhow::Result<()> {
    let user = state
        .auth
        .register(Credentials {
            username: DEMO_USERNAME.to_string(),
            password: DEMO_PASSWORD.to_string(),
        })
        .await?;
    let user_id = user.id.as_str();
    info!("Created user {} / {}", DEMO_USERNAME, DEMO_PASSWORD);

    let home = state
        .categories
        .create(user_id, CreateCategory { name: "Home".into(), color: Some("#22c55e".into()) })
        .await?;
    let work = state
        .categories
        .create(user_id, CreateCategory { name: "Work".into(), color: None })
        .await?;
    state
        .categories
        .create(user_id, CreateCategory { name: "Health".into(), color: Some("#ef4444".into()) })
        .await?;

    let project = state
        .projects
        .create(
            user_id,
            CreateProject {
                name: "Website relaunch".into(),
                description: Some("Ship the new portfolio site".into()),
                color: Some("#0ea5e9".into()),
            },
        )
        .await?;

    let today = Utc::now().date_naive();
    let goal = state
        .goals
        .create(
            user_id,
            CreateGoal {
                title: "Keep the flat tidy".into(),
                description: Some("Small daily resets instead of weekend marathons".into()),
                target_date: today.checked_add_days(chrono::Days::new(30)),
            },
        )
        .await?
        .goal;

    let at = |days: i64, hour: u32| {
        let date = today + Duration::days(days);
        Utc.with_ymd_and_hms(date.year(), date.month(), date.day(), hour, 0, 0)
            .single()
    };

    let tasks = [
        CreateTask {
            title: "Draft homepage copy".into(),
            priority: Some(Priority::High),
            category_id: Some(work.id.clone()),
            project_id: Some(project.id.clone()),
            due_date: at(1, 15),
            estimated_minutes: Some(45),
            ..Default::default()
        },
        CreateTask {
            title: "Pick a colour palette".into(),
            status: Some(TaskStatus::InProgress),
            category_id: Some(work.id.clone()),
            project_id: Some(project.id.clone()),
            estimated_minutes: Some(20),
            ..Default::default()
        },
        CreateTask {
            title: "Ten-minute kitchen reset".into(),
            description: Some("Dishes, counters, bin".into()),
            priority: Some(Priority::Medium),
            category_id: Some(home.id.clone()),
            goal_id: Some(goal.id.clone()),
            due_date: at(0, 19),
            estimated_minutes: Some(10),
            recurrence: Some(RecurrenceRule::daily()),
            ..Default::default()
        },
        CreateTask {
            title: "Water the plants".into(),
            priority: Some(Priority::Low),
            category_id: Some(home.id.clone()),
            goal_id: Some(goal.id.clone()),
            due_date: at(2, 8),
            recurrence: Some(RecurrenceRule::weekly_on(&[DayOfWeek::Mon, DayOfWeek::Thu])),
            ..Default::default()
        },
        CreateTask {
            title: "Book dentist appointment".into(),
            priority: Some(Priority::Urgent),
            due_date: at(-1, 12),
            estimated_minutes: Some(5),
            ..Default::default()
        },
    ];

    let mut first_task_id = None;
    for create in tasks {
        let task = state.tasks.create(user_id, create).await?;
        first_task_id.get_or_insert(task.id);
    }

    state
        .templates
        .create(
            user_id,
            CreateTemplate {
                name: "Weekly review".into(),
                title: "Weekly review".into(),
                description: Some("Clear inboxes, check the calendar, pick three priorities".into()),
                priority: Some(Priority::Medium),
                category_id: Some(work.id.clone()),
                estimated_minutes: Some(30),
                recurrence: None,
            },
        )
        .await?;

    let moods = [
        (Emotion::Anxious, Emotion::Calm),
        (Emotion::Tired, Emotion::Focused),
        (Emotion::Overwhelmed, Emotion::Energized),
    ];
    for (days_ago, (before, after)) in (1..=3).rev().zip(moods) {
        let Some(started_at) = at(-days_ago, 9) else {
            continue;
        };
        state
            .focus
            .log(
                user_id,
                LogFocusSession {
                    task_id: first_task_id.clone(),
                    kind: Some(FocusKind::Work),
                    started_at,
                    actual_seconds: 25 * 60,
                    planned_seconds: Some(25 * 60),
                    interruptions: Some(1),
                    emotion_before: Some(before),
                    emotion_after: Some(after),
                    notes: None,
                },
            )
            .await?;
    }

    info!("Seeded sample categories, project, goal, tasks, template and focus sessions");
    Ok(())
}
