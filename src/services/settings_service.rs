//! Settings Service
//!
//! Loads, updates and resets per-user settings. Rows are created with
//! defaults the first time they are read.

use std::sync::Arc;

use sqlx::{Executor, Sqlite};
use tracing::debug;

use crate::database::DatabaseManager;
use crate::error::AppResult;
use crate::logging::log_settings_update;
use crate::models::settings::{UpdateSettings, UserSettings};
use crate::services::time_provider::TimeProvider;

/// Insert a settings row, leaving an existing one untouched
pub async fn insert_settings<'e, E>(executor: E, settings: &UserSettings) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO user_settings (
            user_id, focus_duration, short_break_duration, long_break_duration,
            long_break_frequency, daily_focus_goal_minutes, theme, timezone,
            notifications_enabled, focus_sound, ai_assist_enabled, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(user_id) DO NOTHING
        "#,
    )
    .bind(&settings.user_id)
    .bind(settings.focus_duration)
    .bind(settings.short_break_duration)
    .bind(settings.long_break_duration)
    .bind(settings.long_break_frequency)
    .bind(settings.daily_focus_goal_minutes)
    .bind(settings.theme)
    .bind(&settings.timezone)
    .bind(settings.notifications_enabled)
    .bind(&settings.focus_sound)
    .bind(settings.ai_assist_enabled)
    .bind(settings.created_at)
    .bind(settings.updated_at)
    .execute(executor)
    .await?;
    Ok(())
}

/// Settings service
#[derive(Debug, Clone)]
pub struct SettingsService {
    db: DatabaseManager,
    time: Arc<dyn TimeProvider>,
}

impl SettingsService {
    pub fn new(db: DatabaseManager, time: Arc<dyn TimeProvider>) -> Self {
        Self { db, time }
    }

    /// Get the user's settings, creating defaults if missing
    pub async fn get(&self, user_id: &str) -> AppResult<UserSettings> {
        let existing = sqlx::query_as::<_, UserSettings>("SELECT * FROM user_settings WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(&self.db.pool)
            .await?;

        if let Some(settings) = existing {
            return Ok(settings);
        }

        debug!(user_id = %user_id, "Creating default settings");
        insert_settings(&self.db.pool, &UserSettings::new(user_id, self.time.now_utc())).await?;

        Ok(sqlx::query_as::<_, UserSettings>("SELECT * FROM user_settings WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&self.db.pool)
            .await?)
    }

    /// Apply a partial update
    pub async fn update(&self, user_id: &str, update: UpdateSettings) -> AppResult<UserSettings> {
        let mut settings = self.get(user_id).await?;
        let fields = update.apply_to(&mut settings, self.time.now_utc())?;

        if fields.is_empty() {
            return Ok(settings);
        }

        self.save(&settings).await?;
        log_settings_update(user_id, &fields);
        Ok(settings)
    }

    /// Restore every setting to its default
    pub async fn reset(&self, user_id: &str) -> AppResult<UserSettings> {
        let current = self.get(user_id).await?;
        let mut settings = UserSettings::new(user_id, self.time.now_utc());
        settings.created_at = current.created_at;

        self.save(&settings).await?;
        log_settings_update(user_id, &["*"]);
        Ok(settings)
    }

    async fn save(&self, settings: &UserSettings) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE user_settings SET
                focus_duration = ?, short_break_duration = ?, long_break_duration = ?,
                long_break_frequency = ?, daily_focus_goal_minutes = ?, theme = ?,
                timezone = ?, notifications_enabled = ?, focus_sound = ?,
                ai_assist_enabled = ?, updated_at = ?
            WHERE user_id = ?
            "#,
        )
        .bind(settings.focus_duration)
        .bind(settings.short_break_duration)
        .bind(settings.long_break_duration)
        .bind(settings.long_break_frequency)
        .bind(settings.daily_focus_goal_minutes)
        .bind(settings.theme)
        .bind(&settings.timezone)
        .bind(settings.notifications_enabled)
        .bind(&settings.focus_sound)
        .bind(settings.ai_assist_enabled)
        .bind(settings.updated_at)
        .bind(&settings.user_id)
        .execute(&self.db.pool)
        .await?;
        Ok(())
    }
}
