//! Authentication API endpoints
//!
//! Registration, login/logout and the [`AuthUser`] extractor that guards
//! every other endpoint.

use axum::{
    async_trait,
    extract::{FromRequestParts, State},
    http::{request::Parts, StatusCode},
    response::Json,
    routing::{get, post},
    RequestPartsExt, Router,
};
use axum_extra::{
    extract::cookie::{Cookie, CookieJar, SameSite},
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use serde_json::{json, Value};
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::models::user::{Credentials, User};
use crate::server::AppState;
use crate::services::auth_service::Session;

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "momentum_session";

/// The authenticated user of a request
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

impl AuthUser {
    pub fn id(&self) -> &str {
        &self.0.id
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let bearer = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .ok()
            .map(|TypedHeader(Authorization(bearer))| bearer.token().to_string());

        let token = match bearer {
            Some(token) => token,
            None => CookieJar::from_headers(&parts.headers)
                .get(SESSION_COOKIE)
                .map(|cookie| cookie.value().to_string())
                .ok_or(AppError::Unauthorized)?,
        };

        let user = state.auth.authenticate(&token).await?;
        Ok(AuthUser(user))
    }
}

/// Create auth API routes
pub fn create_auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/session", get(session))
}

/// Create an account
pub async fn register(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> AppResult<(StatusCode, Json<User>)> {
    debug!("POST /api/auth/register - Registering {}", credentials.username);
    let user = state.auth.register(credentials).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Log in and set the session cookie
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(credentials): Json<Credentials>,
) -> AppResult<(CookieJar, Json<Session>)> {
    debug!("POST /api/auth/login - Login attempt for {}", credentials.username);
    let session = state.auth.login(credentials).await?;

    let cookie = Cookie::build((SESSION_COOKIE, session.token.clone()))
        .path("/")
        .http_only(true)
        .secure(state.config.secure_cookies())
        .same_site(SameSite::Lax);

    Ok((jar.add(cookie), Json(session)))
}

/// Clear the session cookie
pub async fn logout(user: AuthUser, jar: CookieJar) -> (CookieJar, Json<Value>) {
    debug!("POST /api/auth/logout - Logging out {}", user.0.username);
    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    (jar, Json(json!({ "logged_out": true })))
}

/// The current user
pub async fn session(user: AuthUser) -> Json<User> {
    Json(user.0)
}
