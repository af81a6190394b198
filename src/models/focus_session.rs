//! Focus Session Model
//!
//! Pomodoro-style work and break sessions, optionally tied to a task, with
//! the user's emotion before and after. Includes validation rules and the
//! aggregation behind the focus statistics.

use std::collections::BTreeMap;

use chrono::{DateTime, Days, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use strum::{Display, EnumString, IntoEnumIterator};
use uuid::Uuid;

use super::emotion::Emotion;

/// Planned duration bounds in seconds (1 minute to 2 hours)
pub const MIN_PLANNED_SECONDS: i64 = 60;
pub const MAX_PLANNED_SECONDS: i64 = 7200;

/// Bounds for a logged session's length in seconds (up to 4 hours)
pub const MIN_LOGGED_SECONDS: i64 = 1;
pub const MAX_LOGGED_SECONDS: i64 = 14_400;

pub const MAX_NOTES_LENGTH: usize = 2000;
pub const MAX_INTERRUPTIONS: i64 = 1000;

/// Stats window bounds in days
pub const DEFAULT_STATS_DAYS: u32 = 7;
pub const MAX_STATS_DAYS: u32 = 90;

/// How far back a focus streak is followed
pub const STREAK_LOOKBACK_DAYS: u64 = 365;

/// Focus session types
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, Display, EnumString,
)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FocusKind {
    #[default]
    Work,
    ShortBreak,
    LongBreak,
}

impl FocusKind {
    /// The kind that should follow this one
    pub fn next(self, work_sessions_completed: i64, long_break_frequency: i64) -> FocusKind {
        match self {
            FocusKind::Work => {
                if long_break_frequency > 0
                    && work_sessions_completed > 0
                    && work_sessions_completed % long_break_frequency == 0
                {
                    FocusKind::LongBreak
                } else {
                    FocusKind::ShortBreak
                }
            }
            FocusKind::ShortBreak | FocusKind::LongBreak => FocusKind::Work,
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, Display, EnumString,
)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FocusStatus {
    Running,
    Completed,
    Abandoned,
}

/// A focus session
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FocusSession {
    pub id: String,
    pub user_id: String,
    pub task_id: Option<String>,
    pub kind: FocusKind,

    /// Intended length in seconds
    pub planned_seconds: i64,

    /// Measured length in seconds, set once the session ends
    pub actual_seconds: Option<i64>,

    pub status: FocusStatus,
    pub interruptions: i64,
    pub emotion_before: Option<Emotion>,
    pub emotion_after: Option<Emotion>,
    pub notes: Option<String>,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl FocusSession {
    /// Start a new running session
    pub fn start(
        user_id: &str,
        request: StartFocusSession,
        planned_seconds: i64,
        now: DateTime<Utc>,
    ) -> Result<Self, FocusSessionError> {
        validate_planned(planned_seconds)?;

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            task_id: request.task_id,
            kind: request.kind.unwrap_or_default(),
            planned_seconds,
            actual_seconds: None,
            status: FocusStatus::Running,
            interruptions: 0,
            emotion_before: request.emotion_before,
            emotion_after: None,
            notes: None,
            started_at: now,
            ended_at: None,
            created_at: now,
        })
    }

    pub fn is_running(&self) -> bool {
        self.status == FocusStatus::Running
    }

    /// Wall-clock seconds since the session started, clamped to
    /// `[0, 2 * planned]`
    pub fn elapsed_seconds(&self, now: DateTime<Utc>) -> i64 {
        let elapsed = now.signed_duration_since(self.started_at).num_seconds();
        elapsed.clamp(0, self.planned_seconds.saturating_mul(2))
    }

    /// Seconds left before the planned end, never negative
    pub fn remaining_seconds(&self, now: DateTime<Utc>) -> i64 {
        (self.planned_seconds - self.elapsed_seconds(now)).max(0)
    }

    /// Finish a running session
    pub fn complete(
        &mut self,
        request: CompleteFocusSession,
        now: DateTime<Utc>,
    ) -> Result<(), FocusSessionError> {
        if !self.is_running() {
            return Err(FocusSessionError::NotRunning);
        }
        let notes = validate_notes(request.notes)?;
        let interruptions = validate_interruptions(request.interruptions.unwrap_or(self.interruptions))?;

        self.actual_seconds = Some(self.elapsed_seconds(now));
        self.status = FocusStatus::Completed;
        self.ended_at = Some(now);
        self.emotion_after = request.emotion_after;
        self.notes = notes;
        self.interruptions = interruptions;
        Ok(())
    }

    /// Stop a running session without completing it
    pub fn abandon(&mut self, now: DateTime<Utc>) -> Result<(), FocusSessionError> {
        if !self.is_running() {
            return Err(FocusSessionError::NotRunning);
        }

        self.actual_seconds = Some(self.elapsed_seconds(now));
        self.status = FocusStatus::Abandoned;
        self.ended_at = Some(now);
        Ok(())
    }

    /// Local calendar date the session started on
    pub fn local_date(&self, tz: Tz) -> NaiveDate {
        self.started_at.with_timezone(&tz).date_naive()
    }
}

fn validate_planned(seconds: i64) -> Result<(), FocusSessionError> {
    if !(MIN_PLANNED_SECONDS..=MAX_PLANNED_SECONDS).contains(&seconds) {
        return Err(FocusSessionError::InvalidPlannedDuration(seconds));
    }
    Ok(())
}

fn validate_notes(notes: Option<String>) -> Result<Option<String>, FocusSessionError> {
    match notes {
        Some(text) if text.chars().count() > MAX_NOTES_LENGTH => Err(FocusSessionError::NotesTooLong),
        Some(text) if text.trim().is_empty() => Ok(None),
        other => Ok(other),
    }
}

fn validate_interruptions(count: i64) -> Result<i64, FocusSessionError> {
    if !(0..=MAX_INTERRUPTIONS).contains(&count) {
        return Err(FocusSessionError::InvalidInterruptions(count));
    }
    Ok(count)
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StartFocusSession {
    pub task_id: Option<String>,
    pub kind: Option<FocusKind>,
    pub planned_seconds: Option<i64>,
    pub emotion_before: Option<Emotion>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompleteFocusSession {
    pub emotion_after: Option<Emotion>,
    pub notes: Option<String>,
    pub interruptions: Option<i64>,
}

/// A completed session and the kind of session that should follow it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FocusSessionCompletion {
    pub session: FocusSession,
    pub next_kind: FocusKind,
}

/// A session recorded after the fact
#[derive(Debug, Clone, Deserialize)]
pub struct LogFocusSession {
    pub task_id: Option<String>,
    pub kind: Option<FocusKind>,
    pub started_at: DateTime<Utc>,
    pub actual_seconds: i64,
    pub planned_seconds: Option<i64>,
    pub interruptions: Option<i64>,
    pub emotion_before: Option<Emotion>,
    pub emotion_after: Option<Emotion>,
    pub notes: Option<String>,
}

impl LogFocusSession {
    /// Build a completed session. It must have ended by `now`.
    pub fn into_session(self, user_id: &str, now: DateTime<Utc>) -> Result<FocusSession, FocusSessionError> {
        if !(MIN_LOGGED_SECONDS..=MAX_LOGGED_SECONDS).contains(&self.actual_seconds) {
            return Err(FocusSessionError::InvalidActualDuration(self.actual_seconds));
        }
        let ended_at = self.started_at + chrono::Duration::seconds(self.actual_seconds);
        if ended_at > now {
            return Err(FocusSessionError::EndsInFuture);
        }

        // Without an explicit plan, the session is taken as planned.
        let planned_seconds = self
            .planned_seconds
            .unwrap_or_else(|| self.actual_seconds.clamp(MIN_PLANNED_SECONDS, MAX_PLANNED_SECONDS));
        validate_planned(planned_seconds)?;

        Ok(FocusSession {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            task_id: self.task_id,
            kind: self.kind.unwrap_or_default(),
            planned_seconds,
            actual_seconds: Some(self.actual_seconds),
            status: FocusStatus::Completed,
            interruptions: validate_interruptions(self.interruptions.unwrap_or(0))?,
            emotion_before: self.emotion_before,
            emotion_after: self.emotion_after,
            notes: validate_notes(self.notes)?,
            started_at: self.started_at,
            ended_at: Some(ended_at),
            created_at: now,
        })
    }
}

/// List filters
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FocusSessionFilter {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub task_id: Option<String>,
    pub status: Option<FocusStatus>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatsQuery {
    pub days: Option<u32>,
}

impl StatsQuery {
    pub fn days(&self) -> Result<u32, FocusSessionError> {
        let days = self.days.unwrap_or(DEFAULT_STATS_DAYS);
        if days == 0 || days > MAX_STATS_DAYS {
            return Err(FocusSessionError::InvalidStatsWindow(days));
        }
        Ok(days)
    }
}

/// Completed work for one local day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyFocus {
    pub date: NaiveDate,
    pub work_seconds: i64,
    pub sessions: i64,
    pub goal_met: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmotionCount {
    pub emotion: Emotion,
    pub before: i64,
    pub after: i64,
}

/// Focus statistics over a window of local days ending today
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusStats {
    pub timezone: String,
    pub days: Vec<DailyFocus>,
    pub total_work_seconds: i64,
    pub total_sessions: i64,
    pub abandoned_sessions: i64,
    pub daily_goal_minutes: i64,
    pub current_streak_days: i64,
    pub emotions: Vec<EmotionCount>,
}

impl FocusStats {
    /// Aggregate `sessions` into per-day figures for the `window` days ending
    /// on `today`. The streak follows every session given, so callers pass
    /// enough history for it.
    pub fn compute(
        sessions: &[FocusSession],
        tz: Tz,
        today: NaiveDate,
        window: u32,
        daily_goal_minutes: i64,
    ) -> Self {
        let first_day = today
            .checked_sub_days(Days::new(u64::from(window.saturating_sub(1))))
            .unwrap_or(today);

        let mut per_day: BTreeMap<NaiveDate, (i64, i64)> = BTreeMap::new();
        let mut emotions: BTreeMap<Emotion, (i64, i64)> = BTreeMap::new();
        let mut abandoned_sessions = 0;

        for session in sessions {
            let date = session.local_date(tz);
            let in_window = date >= first_day && date <= today;

            let completed_work =
                session.status == FocusStatus::Completed && session.kind == FocusKind::Work;
            if completed_work {
                let entry = per_day.entry(date).or_default();
                entry.0 += session.actual_seconds.unwrap_or(0);
                entry.1 += 1;
            }

            if !in_window {
                continue;
            }
            if session.status == FocusStatus::Abandoned {
                abandoned_sessions += 1;
            }
            if let Some(emotion) = session.emotion_before {
                emotions.entry(emotion).or_default().0 += 1;
            }
            if let Some(emotion) = session.emotion_after {
                emotions.entry(emotion).or_default().1 += 1;
            }
        }

        let goal_seconds = daily_goal_minutes * 60;
        let days: Vec<DailyFocus> = first_day
            .iter_days()
            .take_while(|date| *date <= today)
            .map(|date| {
                let (work_seconds, sessions) = per_day.get(&date).copied().unwrap_or_default();
                DailyFocus {
                    date,
                    work_seconds,
                    sessions,
                    goal_met: sessions > 0 && work_seconds >= goal_seconds,
                }
            })
            .collect();

        Self {
            timezone: tz.name().to_string(),
            total_work_seconds: days.iter().map(|d| d.work_seconds).sum(),
            total_sessions: days.iter().map(|d| d.sessions).sum(),
            abandoned_sessions,
            daily_goal_minutes,
            current_streak_days: streak(&per_day, today),
            emotions: Emotion::iter()
                .filter_map(|emotion| {
                    emotions.get(&emotion).map(|&(before, after)| EmotionCount {
                        emotion,
                        before,
                        after,
                    })
                })
                .collect(),
            days,
        }
    }
}

/// Consecutive days with completed work, ending today. A day still in
/// progress does not break a streak that ran through yesterday.
fn streak(per_day: &BTreeMap<NaiveDate, (i64, i64)>, today: NaiveDate) -> i64 {
    let has_work = |date: &NaiveDate| per_day.get(date).is_some_and(|&(_, count)| count > 0);

    let mut day = if has_work(&today) {
        today
    } else {
        match today.pred_opt() {
            Some(yesterday) => yesterday,
            None => return 0,
        }
    };

    let mut count = 0;
    while has_work(&day) {
        count += 1;
        match day.pred_opt() {
            Some(previous) => day = previous,
            None => break,
        }
    }
    count
}

/// Focus session validation errors
#[derive(Debug, thiserror::Error)]
pub enum FocusSessionError {
    #[error("Planned duration {0} seconds is invalid (must be 60-7200 seconds)")]
    InvalidPlannedDuration(i64),

    #[error("Session length {0} seconds is invalid (must be 1-14400 seconds)")]
    InvalidActualDuration(i64),

    #[error("Interruption count {0} is invalid (must be 0-1000)")]
    InvalidInterruptions(i64),

    #[error("Notes must be at most 2000 characters")]
    NotesTooLong,

    #[error("A logged session cannot end in the future")]
    EndsInFuture,

    #[error("Stats window of {0} days is invalid (must be 1-90)")]
    InvalidStatsWindow(u32),

    #[error("Referenced task does not exist")]
    InvalidTask,

    #[error("A focus session is already running")]
    AlreadyRunning,

    #[error("Focus session is not running")]
    NotRunning,
}
