//! Focus Service
//!
//! Business logic for focus sessions: starting, completing and abandoning
//! the running session, logging past ones, and daily statistics.

use std::sync::Arc;

use chrono::{Days, NaiveTime, TimeZone};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use sqlx::{Executor, QueryBuilder, Sqlite};

use crate::database::{is_unique_violation, DatabaseManager};
use crate::error::{AppError, AppResult};
use crate::logging::{log_database_operation, log_focus_session_change, log_focus_session_completed};
use crate::models::focus_session::{
    CompleteFocusSession, FocusKind, FocusSession, FocusSessionCompletion, FocusSessionError,
    FocusSessionFilter, FocusStats, FocusStatus, LogFocusSession, StartFocusSession, StatsQuery,
    STREAK_LOOKBACK_DAYS,
};
use crate::services::settings_service::SettingsService;
use crate::services::time_provider::TimeProvider;

/// The running session as seen right now
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FocusSessionState {
    #[serde(flatten)]
    pub session: FocusSession,
    pub elapsed_seconds: i64,
    pub remaining_seconds: i64,
    pub progress_percentage: f64,
}

impl FocusSessionState {
    fn new(session: FocusSession, now: chrono::DateTime<chrono::Utc>) -> Self {
        let elapsed_seconds = session.elapsed_seconds(now);
        let remaining_seconds = session.remaining_seconds(now);
        let progress_percentage = if session.planned_seconds > 0 {
            (elapsed_seconds as f64 / session.planned_seconds as f64 * 100.0).min(100.0)
        } else {
            0.0
        };
        Self {
            session,
            elapsed_seconds,
            remaining_seconds,
            progress_percentage,
        }
    }
}

async fn insert_session<'e, E>(executor: E, session: &FocusSession) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO focus_sessions (
            id, user_id, task_id, kind, planned_seconds, actual_seconds, status,
            interruptions, emotion_before, emotion_after, notes, started_at, ended_at, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&session.id)
    .bind(&session.user_id)
    .bind(&session.task_id)
    .bind(session.kind)
    .bind(session.planned_seconds)
    .bind(session.actual_seconds)
    .bind(session.status)
    .bind(session.interruptions)
    .bind(session.emotion_before)
    .bind(session.emotion_after)
    .bind(&session.notes)
    .bind(session.started_at)
    .bind(session.ended_at)
    .bind(session.created_at)
    .execute(executor)
    .await?;
    Ok(())
}

/// Focus service
#[derive(Debug, Clone)]
pub struct FocusService {
    db: DatabaseManager,
    settings: SettingsService,
    time: Arc<dyn TimeProvider>,
}

impl FocusService {
    pub fn new(db: DatabaseManager, settings: SettingsService, time: Arc<dyn TimeProvider>) -> Self {
        Self { db, settings, time }
    }

    async fn check_task(&self, user_id: &str, task_id: Option<&str>) -> AppResult<()> {
        if let Some(task_id) = task_id {
            let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tasks WHERE id = ? AND user_id = ?")
                .bind(task_id)
                .bind(user_id)
                .fetch_one(&self.db.pool)
                .await?;
            if count == 0 {
                return Err(FocusSessionError::InvalidTask.into());
            }
        }
        Ok(())
    }

    /// Start a session. Only one may run at a time.
    pub async fn start(&self, user_id: &str, request: StartFocusSession) -> AppResult<FocusSession> {
        self.check_task(user_id, request.task_id.as_deref()).await?;

        let settings = self.settings.get(user_id).await?;
        let kind = request.kind.unwrap_or_default();
        let planned = request
            .planned_seconds
            .unwrap_or_else(|| settings.duration_for(kind));
        let session = FocusSession::start(user_id, request, planned, self.time.now_utc())?;

        insert_session(&self.db.pool, &session).await.map_err(|e| {
            if is_unique_violation(&e) {
                AppError::from(FocusSessionError::AlreadyRunning)
            } else {
                e.into()
            }
        })?;

        log_focus_session_change(user_id, &session.id, "start", &session.kind.to_string());
        Ok(session)
    }

    /// The running session, if any
    pub async fn current(&self, user_id: &str) -> AppResult<Option<FocusSessionState>> {
        let session = sqlx::query_as::<_, FocusSession>(
            "SELECT * FROM focus_sessions WHERE user_id = ? AND status = 'running'",
        )
        .bind(user_id)
        .fetch_optional(&self.db.pool)
        .await?;

        let now = self.time.now_utc();
        Ok(session.map(|s| FocusSessionState::new(s, now)))
    }

    pub async fn get(&self, user_id: &str, id: &str) -> AppResult<FocusSession> {
        sqlx::query_as::<_, FocusSession>("SELECT * FROM focus_sessions WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.db.pool)
            .await?
            .ok_or_else(|| AppError::not_found("Focus session"))
    }

    /// Store the end of a session that is still running in the database
    async fn finish(&self, session: &FocusSession) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE focus_sessions SET
                actual_seconds = ?, status = ?, interruptions = ?, emotion_after = ?,
                notes = ?, ended_at = ?
            WHERE id = ? AND user_id = ? AND status = 'running'
            "#,
        )
        .bind(session.actual_seconds)
        .bind(session.status)
        .bind(session.interruptions)
        .bind(session.emotion_after)
        .bind(&session.notes)
        .bind(session.ended_at)
        .bind(&session.id)
        .bind(&session.user_id)
        .execute(&self.db.pool)
        .await?;

        // Lost a race with another complete or abandon.
        if result.rows_affected() == 0 {
            return Err(FocusSessionError::NotRunning.into());
        }
        Ok(())
    }

    /// Complete the running session and suggest what comes next
    pub async fn complete(
        &self,
        user_id: &str,
        id: &str,
        request: CompleteFocusSession,
    ) -> AppResult<FocusSessionCompletion> {
        let mut session = self.get(user_id, id).await?;
        session.complete(request, self.time.now_utc())?;
        self.finish(&session).await?;

        log_focus_session_completed(
            user_id,
            &session.id,
            session.planned_seconds,
            session.actual_seconds.unwrap_or(0),
        );

        let settings = self.settings.get(user_id).await?;
        let completed_today = self.completed_work_today(user_id, settings.tz()).await?;
        let next_kind = session.kind.next(completed_today, settings.long_break_frequency);

        Ok(FocusSessionCompletion { session, next_kind })
    }

    /// Abandon the running session
    pub async fn abandon(&self, user_id: &str, id: &str) -> AppResult<FocusSession> {
        let mut session = self.get(user_id, id).await?;
        session.abandon(self.time.now_utc())?;
        self.finish(&session).await?;

        log_focus_session_change(user_id, &session.id, "abandon", &session.kind.to_string());
        Ok(session)
    }

    /// Record a session that already happened
    pub async fn log(&self, user_id: &str, request: LogFocusSession) -> AppResult<FocusSession> {
        self.check_task(user_id, request.task_id.as_deref()).await?;
        let session = request.into_session(user_id, self.time.now_utc())?;

        insert_session(&self.db.pool, &session).await?;
        log_focus_session_change(user_id, &session.id, "log", &session.kind.to_string());
        Ok(session)
    }

    /// Sessions matching `filter`, newest first
    pub async fn list(&self, user_id: &str, filter: FocusSessionFilter) -> AppResult<Vec<FocusSession>> {
        let mut query = QueryBuilder::<Sqlite>::new("SELECT * FROM focus_sessions WHERE user_id = ");
        query.push_bind(user_id);

        if let Some(from) = filter.from {
            query.push(" AND started_at >= ").push_bind(from);
        }
        if let Some(to) = filter.to {
            query.push(" AND started_at < ").push_bind(to);
        }
        if let Some(task_id) = filter.task_id {
            query.push(" AND task_id = ").push_bind(task_id);
        }
        if let Some(status) = filter.status {
            query.push(" AND status = ").push_bind(status);
        }
        query.push(" ORDER BY started_at DESC");

        Ok(query.build_query_as::<FocusSession>().fetch_all(&self.db.pool).await?)
    }

    pub async fn delete(&self, user_id: &str, id: &str) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM focus_sessions WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(&self.db.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Focus session"));
        }
        log_database_operation("DELETE", "focus_sessions", Some(result.rows_affected()));
        Ok(())
    }

    /// Per-day statistics in the user's timezone
    pub async fn stats(&self, user_id: &str, query: StatsQuery) -> AppResult<FocusStats> {
        let days = query.days()?;
        let settings = self.settings.get(user_id).await?;
        let tz = settings.tz();
        let today = self.time.today_in(tz);

        let lookback = STREAK_LOOKBACK_DAYS.max(u64::from(days));
        let since = today.checked_sub_days(Days::new(lookback)).unwrap_or(today);
        let sessions = self.sessions_since(user_id, tz, since).await?;

        Ok(FocusStats::compute(
            &sessions,
            tz,
            today,
            days,
            settings.daily_focus_goal_minutes,
        ))
    }

    /// Ended sessions that started on or after local midnight of `since`
    async fn sessions_since(
        &self,
        user_id: &str,
        tz: Tz,
        since: chrono::NaiveDate,
    ) -> AppResult<Vec<FocusSession>> {
        let start = tz
            .from_local_datetime(&since.and_time(NaiveTime::MIN))
            .earliest()
            .map(|dt| dt.with_timezone(&chrono::Utc))
            .unwrap_or_else(|| since.and_time(NaiveTime::MIN).and_utc());

        Ok(sqlx::query_as::<_, FocusSession>(
            "SELECT * FROM focus_sessions WHERE user_id = ? AND status != 'running' \
             AND started_at >= ? ORDER BY started_at",
        )
        .bind(user_id)
        .bind(start)
        .fetch_all(&self.db.pool)
        .await?)
    }

    async fn completed_work_today(&self, user_id: &str, tz: Tz) -> AppResult<i64> {
        let today = self.time.today_in(tz);
        let sessions = self.sessions_since(user_id, tz, today).await?;
        Ok(sessions
            .iter()
            .filter(|s| s.kind == FocusKind::Work && s.status == FocusStatus::Completed)
            .count() as i64)
    }
}
