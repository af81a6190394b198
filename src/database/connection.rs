//! Database connection manager
//!
//! Owns the SQLite pool and the schema.

use std::str::FromStr;
use std::time::Duration;

use anyhow::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{query, SqlitePool};
use tracing::{debug, info, Instrument};

/// Schema statements, applied in order. Every statement is idempotent.
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id TEXT PRIMARY KEY,
        username TEXT NOT NULL COLLATE NOCASE UNIQUE,
        password_hash TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS user_settings (
        user_id TEXT PRIMARY KEY REFERENCES users(id) ON DELETE CASCADE,
        focus_duration INTEGER NOT NULL DEFAULT 1500,
        short_break_duration INTEGER NOT NULL DEFAULT 300,
        long_break_duration INTEGER NOT NULL DEFAULT 900,
        long_break_frequency INTEGER NOT NULL DEFAULT 4,
        daily_focus_goal_minutes INTEGER NOT NULL DEFAULT 120,
        theme TEXT NOT NULL DEFAULT 'system' CHECK (theme IN ('light', 'dark', 'system')),
        timezone TEXT NOT NULL DEFAULT 'UTC',
        notifications_enabled BOOLEAN NOT NULL DEFAULT TRUE,
        focus_sound TEXT,
        ai_assist_enabled BOOLEAN NOT NULL DEFAULT TRUE,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS categories (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        name TEXT NOT NULL,
        color TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_categories_user_name ON categories(user_id, name COLLATE NOCASE)",
    r#"
    CREATE TABLE IF NOT EXISTS projects (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        name TEXT NOT NULL,
        description TEXT,
        color TEXT NOT NULL,
        archived BOOLEAN NOT NULL DEFAULT FALSE,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS goals (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        title TEXT NOT NULL,
        description TEXT,
        target_date TEXT,
        status TEXT NOT NULL DEFAULT 'active' CHECK (status IN ('active', 'achieved', 'abandoned')),
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS tasks (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        title TEXT NOT NULL,
        description TEXT,
        status TEXT NOT NULL DEFAULT 'todo' CHECK (status IN ('todo', 'in_progress', 'done')),
        priority TEXT NOT NULL DEFAULT 'medium' CHECK (priority IN ('low', 'medium', 'high', 'urgent')),
        category_id TEXT REFERENCES categories(id) ON DELETE SET NULL,
        project_id TEXT REFERENCES projects(id) ON DELETE SET NULL,
        goal_id TEXT REFERENCES goals(id) ON DELETE SET NULL,
        due_date TEXT,
        estimated_minutes INTEGER,
        emotion TEXT,
        recurrence TEXT,
        recurrence_anchor TEXT,
        recurrence_parent_id TEXT,
        occurrence_index INTEGER NOT NULL DEFAULT 0,
        completed_at TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_tasks_user_status ON tasks(user_id, status)",
    "CREATE INDEX IF NOT EXISTS idx_tasks_user_due ON tasks(user_id, due_date)",
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_tasks_series_occurrence ON tasks(recurrence_parent_id, occurrence_index) WHERE recurrence_parent_id IS NOT NULL",
    r#"
    CREATE TABLE IF NOT EXISTS task_templates (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        name TEXT NOT NULL,
        title TEXT NOT NULL,
        description TEXT,
        priority TEXT NOT NULL DEFAULT 'medium',
        category_id TEXT REFERENCES categories(id) ON DELETE SET NULL,
        estimated_minutes INTEGER,
        recurrence TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_templates_user_name ON task_templates(user_id, name COLLATE NOCASE)",
    r#"
    CREATE TABLE IF NOT EXISTS focus_sessions (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        task_id TEXT REFERENCES tasks(id) ON DELETE SET NULL,
        kind TEXT NOT NULL CHECK (kind IN ('work', 'short_break', 'long_break')),
        planned_seconds INTEGER NOT NULL,
        actual_seconds INTEGER,
        status TEXT NOT NULL CHECK (status IN ('running', 'completed', 'abandoned')),
        interruptions INTEGER NOT NULL DEFAULT 0,
        emotion_before TEXT,
        emotion_after TEXT,
        notes TEXT,
        started_at TEXT NOT NULL,
        ended_at TEXT,
        created_at TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_focus_sessions_user_started ON focus_sessions(user_id, started_at)",
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_focus_sessions_one_running ON focus_sessions(user_id) WHERE status = 'running'",
];

/// Database connection manager
#[derive(Debug, Clone)]
pub struct DatabaseManager {
    pub pool: SqlitePool,
}

impl DatabaseManager {
    /// Create a new database manager with the given connection URL
    pub async fn new(database_url: &str) -> Result<Self> {
        info!("Connecting to database: {}", database_url);

        let in_memory = database_url.contains(":memory:");

        let mut options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| anyhow::anyhow!("Invalid database URL: {}", e))?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5));
        if !in_memory {
            options = options.journal_mode(SqliteJournalMode::Wal);
        }

        // Every connection to `:memory:` is a fresh database, so tests and
        // ephemeral runs share exactly one connection that never expires.
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(8)
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to connect to database: {}", e))?;

        debug!("Successfully connected to SQLite database");

        Ok(Self { pool })
    }

    /// Open a fresh, migrated in-memory database
    pub async fn in_memory() -> Result<Self> {
        let manager = Self::new("sqlite::memory:").await?;
        manager.migrate().await?;
        Ok(manager)
    }

    /// Run database migrations
    pub async fn migrate(&self) -> Result<()> {
        info!("Running database migrations");

        async {
            for statement in SCHEMA {
                query(statement)
                    .execute(&self.pool)
                    .await
                    .map_err(|e| anyhow::anyhow!("Migration failed: {}", e))?;
            }
            Ok::<(), anyhow::Error>(())
        }
        .instrument(crate::db_span!("MIGRATE", "schema"))
        .await?;

        info!("Database migrations completed successfully");
        Ok(())
    }

    /// Test database connection
    pub async fn test_connection(&self) -> Result<()> {
        query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| anyhow::anyhow!("Database connection test failed: {}", e))?;

        debug!("Database connection test successful");
        Ok(())
    }

    /// Close every pooled connection
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Whether a database error is a UNIQUE constraint violation
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

/// Insert a bare user row for service tests
#[cfg(test)]
pub(crate) async fn insert_test_user(pool: &SqlitePool, id: &str) {
    sqlx::query(
        "INSERT INTO users (id, username, password_hash, created_at, updated_at) \
         VALUES (?, ?, 'h', '2025-01-01T00:00:00+00:00', '2025-01-01T00:00:00+00:00')",
    )
    .bind(id)
    .bind(format!("user-{}", id))
    .execute(pool)
    .await
    .expect("insert test user");
}
