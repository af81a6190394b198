//! User Settings Model
//!
//! Per-user preferences: focus timer lengths, daily goal, theme, timezone
//! and assistant opt-in. Includes validation rules and default values.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use strum::{Display, EnumString};

use super::focus_session::FocusKind;

static FOCUS_SOUND_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9_-]{1,40}$").expect("valid focus sound regex"));

/// UI theme options
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, Display, EnumString,
)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

/// User settings
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserSettings {
    pub user_id: String,

    /// Work session length in seconds (default: 25 minutes)
    pub focus_duration: i64,

    /// Short break length in seconds (default: 5 minutes)
    pub short_break_duration: i64,

    /// Long break length in seconds (default: 15 minutes)
    pub long_break_duration: i64,

    /// Work sessions before a long break (default: 4)
    pub long_break_frequency: i64,

    /// Daily focus target in minutes, 0 for none
    pub daily_focus_goal_minutes: i64,

    pub theme: Theme,

    /// IANA timezone identifier used for day boundaries
    pub timezone: String,

    pub notifications_enabled: bool,

    /// Name of the sound played when a session ends
    pub focus_sound: Option<String>,

    /// Whether the AI assistant may be used
    pub ai_assist_enabled: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserSettings {
    /// Settings with default values
    pub fn new(user_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.to_string(),
            focus_duration: 1500,
            short_break_duration: 300,
            long_break_duration: 900,
            long_break_frequency: 4,
            daily_focus_goal_minutes: 120,
            theme: Theme::default(),
            timezone: "UTC".to_string(),
            notifications_enabled: true,
            focus_sound: None,
            ai_assist_enabled: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Parsed timezone. Stored values are validated, UTC is the fallback.
    pub fn tz(&self) -> Tz {
        self.timezone.parse().unwrap_or(Tz::UTC)
    }

    /// Default planned length for a session of `kind`
    pub fn duration_for(&self, kind: FocusKind) -> i64 {
        match kind {
            FocusKind::Work => self.focus_duration,
            FocusKind::ShortBreak => self.short_break_duration,
            FocusKind::LongBreak => self.long_break_duration,
        }
    }

    /// Validate all settings
    pub fn validate(&self) -> Result<(), SettingsError> {
        validate_focus_duration(self.focus_duration)?;
        validate_short_break_duration(self.short_break_duration)?;
        validate_long_break_duration(self.long_break_duration)?;
        validate_long_break_frequency(self.long_break_frequency)?;
        validate_daily_goal(self.daily_focus_goal_minutes)?;
        validate_timezone(&self.timezone)?;
        validate_focus_sound(self.focus_sound.as_deref())?;
        Ok(())
    }
}

fn validate_focus_duration(seconds: i64) -> Result<(), SettingsError> {
    // 5 minutes to 1 hour
    if !(300..=3600).contains(&seconds) {
        return Err(SettingsError::InvalidFocusDuration(seconds));
    }
    Ok(())
}

fn validate_short_break_duration(seconds: i64) -> Result<(), SettingsError> {
    // 1 minute to 15 minutes
    if !(60..=900).contains(&seconds) {
        return Err(SettingsError::InvalidShortBreakDuration(seconds));
    }
    Ok(())
}

fn validate_long_break_duration(seconds: i64) -> Result<(), SettingsError> {
    // 5 minutes to 30 minutes
    if !(300..=1800).contains(&seconds) {
        return Err(SettingsError::InvalidLongBreakDuration(seconds));
    }
    Ok(())
}

fn validate_long_break_frequency(frequency: i64) -> Result<(), SettingsError> {
    if !(2..=10).contains(&frequency) {
        return Err(SettingsError::InvalidLongBreakFrequency(frequency));
    }
    Ok(())
}

fn validate_daily_goal(minutes: i64) -> Result<(), SettingsError> {
    if !(0..=1440).contains(&minutes) {
        return Err(SettingsError::InvalidDailyGoal(minutes));
    }
    Ok(())
}

fn validate_timezone(timezone: &str) -> Result<(), SettingsError> {
    timezone
        .parse::<Tz>()
        .map_err(|_| SettingsError::InvalidTimezone(timezone.to_string()))?;
    Ok(())
}

fn validate_focus_sound(sound: Option<&str>) -> Result<(), SettingsError> {
    if let Some(sound) = sound {
        if !FOCUS_SOUND_RE.is_match(sound) {
            return Err(SettingsError::InvalidFocusSound(sound.to_string()));
        }
    }
    Ok(())
}

/// Partial settings update
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateSettings {
    pub focus_duration: Option<i64>,
    pub short_break_duration: Option<i64>,
    pub long_break_duration: Option<i64>,
    pub long_break_frequency: Option<i64>,
    pub daily_focus_goal_minutes: Option<i64>,
    pub theme: Option<Theme>,
    pub timezone: Option<String>,
    pub notifications_enabled: Option<bool>,
    #[serde(default, deserialize_with = "super::double_option")]
    pub focus_sound: Option<Option<String>>,
    pub ai_assist_enabled: Option<bool>,
}

impl UpdateSettings {
    /// Validate and apply every provided field, returning the names of the
    /// fields that were set. Nothing is applied if any field is invalid.
    pub fn apply_to(
        self,
        settings: &mut UserSettings,
        now: DateTime<Utc>,
    ) -> Result<Vec<&'static str>, SettingsError> {
        let mut updated = settings.clone();
        let mut fields = Vec::new();

        if let Some(value) = self.focus_duration {
            validate_focus_duration(value)?;
            updated.focus_duration = value;
            fields.push("focus_duration");
        }
        if let Some(value) = self.short_break_duration {
            validate_short_break_duration(value)?;
            updated.short_break_duration = value;
            fields.push("short_break_duration");
        }
        if let Some(value) = self.long_break_duration {
            validate_long_break_duration(value)?;
            updated.long_break_duration = value;
            fields.push("long_break_duration");
        }
        if let Some(value) = self.long_break_frequency {
            validate_long_break_frequency(value)?;
            updated.long_break_frequency = value;
            fields.push("long_break_frequency");
        }
        if let Some(value) = self.daily_focus_goal_minutes {
            validate_daily_goal(value)?;
            updated.daily_focus_goal_minutes = value;
            fields.push("daily_focus_goal_minutes");
        }
        if let Some(value) = self.theme {
            updated.theme = value;
            fields.push("theme");
        }
        if let Some(value) = self.timezone {
            validate_timezone(&value)?;
            updated.timezone = value;
            fields.push("timezone");
        }
        if let Some(value) = self.notifications_enabled {
            updated.notifications_enabled = value;
            fields.push("notifications_enabled");
        }
        if let Some(value) = self.focus_sound {
            validate_focus_sound(value.as_deref())?;
            updated.focus_sound = value;
            fields.push("focus_sound");
        }
        if let Some(value) = self.ai_assist_enabled {
            updated.ai_assist_enabled = value;
            fields.push("ai_assist_enabled");
        }

        if !fields.is_empty() {
            updated.updated_at = now;
        }
        *settings = updated;
        Ok(fields)
    }
}

/// Settings validation errors
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Focus duration {0} seconds is invalid (must be 300-3600 seconds)")]
    InvalidFocusDuration(i64),

    #[error("Short break duration {0} seconds is invalid (must be 60-900 seconds)")]
    InvalidShortBreakDuration(i64),

    #[error("Long break duration {0} seconds is invalid (must be 300-1800 seconds)")]
    InvalidLongBreakDuration(i64),

    #[error("Long break frequency {0} is invalid (must be 2-10 work sessions)")]
    InvalidLongBreakFrequency(i64),

    #[error("Daily focus goal {0} minutes is invalid (must be 0-1440 minutes)")]
    InvalidDailyGoal(i64),

    #[error("Invalid timezone '{0}'")]
    InvalidTimezone(String),

    #[error("Focus sound '{0}' is invalid (1-40 of a-z, 0-9, '_' or '-')")]
    InvalidFocusSound(String),
}

impl SettingsError {
    /// The settings field the error is about
    pub fn field(&self) -> &'static str {
        match self {
            SettingsError::InvalidFocusDuration(_) => "focus_duration",
            SettingsError::InvalidShortBreakDuration(_) => "short_break_duration",
            SettingsError::InvalidLongBreakDuration(_) => "long_break_duration",
            SettingsError::InvalidLongBreakFrequency(_) => "long_break_frequency",
            SettingsError::InvalidDailyGoal(_) => "daily_focus_goal_minutes",
            SettingsError::InvalidTimezone(_) => "timezone",
            SettingsError::InvalidFocusSound(_) => "focus_sound",
        }
    }
}
