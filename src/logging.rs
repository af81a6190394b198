//! Logging configuration for Momentum
//!
//! Structured logging setup with appropriate levels and formatting.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Initialize the application logging system.
///
/// `RUST_LOG` wins over `log_level` when set. JSON output is used in
/// production, a compact console format everywhere else.
pub fn init_logging(log_level: &str, json: bool) {
    let default_filter =
        format!("momentum={log_level},tower_http=info,axum::rejection=trace");

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let fmt_layer = if json {
        fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .boxed()
    } else {
        fmt::layer()
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .compact()
            .boxed()
    };

    // A second initialisation (tests, the seed binary) keeps the first subscriber.
    if tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .is_ok()
    {
        tracing::info!("Logging system initialized");
    }
}

/// Create a span for request logging
#[macro_export]
macro_rules! request_span {
    ($method:expr, $path:expr) => {
        tracing::info_span!(
            "http_request",
            method = %$method,
            path = %$path,
            status_code = tracing::field::Empty,
            duration_ms = tracing::field::Empty,
        )
    };
}

/// Create a span for database operations
#[macro_export]
macro_rules! db_span {
    ($operation:expr, $table:expr) => {
        tracing::debug_span!(
            "database_operation",
            operation = %$operation,
            table = %$table,
        )
    };
}

/// Log application startup
pub fn log_startup() {
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        git_commit = option_env!("GIT_COMMIT").unwrap_or("unknown"),
        "Momentum starting up"
    );
}

/// Log task completion, including a spawned recurring instance
pub fn log_task_completed(user_id: &str, task_id: &str, next_task_id: Option<&str>) {
    tracing::info!(
        user_id = %user_id,
        task_id = %task_id,
        next_task_id = ?next_task_id,
        "Task completed"
    );
}

/// Log a focus session state change
pub fn log_focus_session_change(user_id: &str, session_id: &str, operation: &str, kind: &str) {
    tracing::info!(
        user_id = %user_id,
        session_id = %session_id,
        operation = %operation,
        kind = %kind,
        "Focus session changed"
    );
}

/// Log focus session completion
pub fn log_focus_session_completed(
    user_id: &str,
    session_id: &str,
    planned_seconds: i64,
    actual_seconds: i64,
) {
    tracing::info!(
        user_id = %user_id,
        session_id = %session_id,
        planned_seconds = planned_seconds,
        actual_seconds = actual_seconds,
        "Focus session completed"
    );
}

/// Log settings update
pub fn log_settings_update(user_id: &str, updated_fields: &[&str]) {
    tracing::info!(
        user_id = %user_id,
        updated_fields = ?updated_fields,
        "Settings updated"
    );
}

/// Log an AI completion round trip
pub fn log_ai_completion(user_id: &str, mode: &str, model: &str, output_tokens: u32) {
    tracing::info!(
        user_id = %user_id,
        mode = %mode,
        model = %model,
        output_tokens = output_tokens,
        "AI completion served"
    );
}

/// Log database operation
pub fn log_database_operation(operation: &str, table: &str, rows_affected: Option<u64>) {
    tracing::debug!(
        operation = %operation,
        table = %table,
        rows_affected = ?rows_affected,
        "Database operation completed"
    );
}

/// Log authentication event
pub fn log_authentication_event(event: &str, username: Option<&str>, success: bool) {
    if success {
        tracing::info!(event = %event, username = ?username, "Authentication successful");
    } else {
        tracing::warn!(event = %event, username = ?username, "Authentication failed");
    }
}

/// Log error with context
pub fn log_error(error: &str, context: &str, user_id: Option<&str>) {
    tracing::error!(
        error = %error,
        context = %context,
        user_id = ?user_id,
        "Application error occurred"
    );
}

/// Log warning with context
pub fn log_warning(warning: &str, context: &str, user_id: Option<&str>) {
    tracing::warn!(
        warning = %warning,
        context = %context,
        user_id = ?user_id,
        "Application warning"
    );
}
