//! HTTP server assembly
//!
//! Builds the shared application state and the router with its middleware
//! stack, and serves it until shutdown.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{header, HeaderValue, Method, Request},
    Router,
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::api;
use crate::config::Config;
use crate::database::DatabaseManager;
use crate::services::{
    AiService, AuthService, CategoryService, FocusService, GoalService, ProjectService,
    SessionSigner, SettingsService, TaskService, TemplateService, TextCompletionProvider,
    TimeProvider,
};

/// Everything a request handler needs
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: DatabaseManager,
    pub auth: AuthService,
    pub settings: SettingsService,
    pub categories: CategoryService,
    pub projects: ProjectService,
    pub goals: GoalService,
    pub tasks: TaskService,
    pub templates: TemplateService,
    pub focus: FocusService,
    pub ai: AiService,
}

impl AppState {
    pub fn new(
        config: Config,
        db: DatabaseManager,
        time: Arc<dyn TimeProvider>,
        ai_provider: Option<Arc<dyn TextCompletionProvider>>,
    ) -> Self {
        let signer = SessionSigner::new(&config.session_secret, config.session_ttl_hours);
        let settings = SettingsService::new(db.clone(), time.clone());
        let tasks = TaskService::new(db.clone(), settings.clone(), time.clone());

        Self {
            auth: AuthService::new(db.clone(), signer, time.clone()),
            categories: CategoryService::new(db.clone(), time.clone()),
            projects: ProjectService::new(db.clone(), time.clone()),
            goals: GoalService::new(db.clone(), time.clone()),
            templates: TemplateService::new(db.clone(), tasks.clone(), time.clone()),
            focus: FocusService::new(db.clone(), settings.clone(), time),
            ai: AiService::new(ai_provider, settings.clone()),
            tasks,
            settings,
            db,
            config: Arc::new(config),
        }
    }
}

fn cors_layer(config: &Config) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    if config.cors_origins.is_empty() {
        return cors.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    // Cookies are only sent cross-origin to an explicit allow list.
    cors.allow_origin(origins).allow_credentials(true)
}

/// Build the application router
pub fn create_app(state: AppState) -> Router {
    let frontend = &state.config.frontend_dir;
    let static_files =
        ServeDir::new(frontend).not_found_service(ServeFile::new(frontend.join("index.html")));
    let timeout = Duration::from_secs(state.config.request_timeout);
    let cors = cors_layer(&state.config);

    Router::new()
        .nest("/api", api::create_api_routes())
        .fallback_service(static_files)
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                        crate::request_span!(request.method(), request.uri().path())
                    }),
                )
                .layer(TimeoutLayer::new(timeout))
                .layer(cors),
        )
        .with_state(state)
}

/// Serve until Ctrl-C
pub async fn serve(state: AppState) -> anyhow::Result<()> {
    let addr = state.config.bind_address();
    let db = state.db.clone();
    let app = create_app(state);

    let listener = TcpListener::bind(&addr).await?;
    info!("Momentum listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
