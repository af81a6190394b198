//! Authentication Service
//!
//! Account registration, password verification and signed session tokens.
//!
//! Passwords are stored as Argon2id PHC strings, which carry their own salt.
//! A session token is `base64url(user_id|expires_unix)` followed by `.` and
//! the hex HMAC-SHA256 of that encoded payload under the server secret.

use std::sync::Arc;

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use tracing::debug;

use crate::database::{is_unique_violation, DatabaseManager};
use crate::error::{AppError, AppResult};
use crate::logging::log_authentication_event;
use crate::models::settings::UserSettings;
use crate::models::user::{Credentials, User, UserError};
use crate::services::settings_service::insert_settings;
use crate::services::time_provider::TimeProvider;

type HmacSha256 = Hmac<Sha256>;

const SALT_LENGTH: usize = 16;

/// Hash `password` with a fresh random salt
pub fn hash_password(password: &str) -> AppResult<String> {
    let mut salt = [0u8; SALT_LENGTH];
    rand::thread_rng().fill_bytes(&mut salt);
    let salt = SaltString::encode_b64(&salt)
        .map_err(|e| AppError::internal_error(&format!("Invalid password salt: {}", e)))?;

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::internal_error(&format!("Password hashing failed: {}", e)))
}

/// Check `password` against a stored PHC string
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    PasswordHash::new(stored_hash)
        .map(|hash| Argon2::default().verify_password(password.as_bytes(), &hash).is_ok())
        .unwrap_or(false)
}

/// Issues and verifies session tokens
#[derive(Clone)]
pub struct SessionSigner {
    secret: Vec<u8>,
    ttl: Duration,
}

impl std::fmt::Debug for SessionSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionSigner").field("ttl", &self.ttl).finish_non_exhaustive()
    }
}

impl SessionSigner {
    pub fn new(secret: &str, ttl_hours: u64) -> Self {
        Self {
            secret: secret.as_bytes().to_vec(),
            ttl: Duration::hours(i64::try_from(ttl_hours).unwrap_or(i64::MAX / 3600)),
        }
    }

    fn signature(&self, payload: &str) -> AppResult<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| AppError::internal_error(&format!("Invalid session secret: {}", e)))?;
        mac.update(payload.as_bytes());
        Ok(mac)
    }

    /// Issue a token for `user_id`, valid from `now` for the session lifetime
    pub fn issue(&self, user_id: &str, now: DateTime<Utc>) -> AppResult<(String, DateTime<Utc>)> {
        let expires_at = now + self.ttl;
        let payload = URL_SAFE_NO_PAD.encode(format!("{}|{}", user_id, expires_at.timestamp()));
        let signature = hex::encode(self.signature(&payload)?.finalize().into_bytes());
        Ok((format!("{}.{}", payload, signature), expires_at))
    }

    /// The user id inside a valid, unexpired token
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<String, UserError> {
        let (payload, signature) = token.split_once('.').ok_or(UserError::InvalidSession)?;
        let signature = hex::decode(signature).map_err(|_| UserError::InvalidSession)?;

        let expected = self
            .signature(payload)
            .map_err(|_| UserError::InvalidSession)?
            .finalize()
            .into_bytes();
        if !bool::from(expected.as_slice().ct_eq(&signature)) {
            return Err(UserError::InvalidSession);
        }

        let decoded = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| UserError::InvalidSession)?;
        let decoded = String::from_utf8(decoded).map_err(|_| UserError::InvalidSession)?;
        let (user_id, expires) = decoded.rsplit_once('|').ok_or(UserError::InvalidSession)?;
        let expires: i64 = expires.parse().map_err(|_| UserError::InvalidSession)?;

        if user_id.is_empty() || expires <= now.timestamp() {
            return Err(UserError::InvalidSession);
        }
        Ok(user_id.to_string())
    }
}

/// A logged-in session
#[derive(Debug, Clone, serde::Serialize)]
pub struct Session {
    pub user: User,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Authentication service
#[derive(Debug, Clone)]
pub struct AuthService {
    db: DatabaseManager,
    signer: SessionSigner,
    time: Arc<dyn TimeProvider>,
}

impl AuthService {
    pub fn new(db: DatabaseManager, signer: SessionSigner, time: Arc<dyn TimeProvider>) -> Self {
        Self { db, signer, time }
    }

    /// Create an account and its default settings
    pub async fn register(&self, credentials: Credentials) -> AppResult<User> {
        let username = credentials.username.trim().to_string();
        let credentials = Credentials {
            username,
            password: credentials.password,
        };
        credentials.validate()?;

        let now = self.time.now_utc();
        let password_hash = hash_password(&credentials.password)?;
        let user = User::new(credentials.username.clone(), password_hash, now);

        let mut tx = self.db.pool.begin().await?;
        let inserted = sqlx::query(
            "INSERT INTO users (id, username, password_hash, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&mut *tx)
        .await;

        if let Err(e) = inserted {
            log_authentication_event("register", Some(&user.username), false);
            return Err(if is_unique_violation(&e) {
                UserError::UsernameTaken(user.username).into()
            } else {
                e.into()
            });
        }

        insert_settings(&mut *tx, &UserSettings::new(&user.id, now)).await?;
        tx.commit().await?;

        log_authentication_event("register", Some(&user.username), true);
        Ok(user)
    }

    /// Verify credentials and open a session
    pub async fn login(&self, credentials: Credentials) -> AppResult<Session> {
        let username = credentials.username.trim();
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.db.pool)
            .await?;

        let user = match user {
            Some(user) if verify_password(&credentials.password, &user.password_hash) => user,
            _ => {
                log_authentication_event("login", Some(username), false);
                return Err(UserError::InvalidCredentials.into());
            }
        };

        let (token, expires_at) = self.signer.issue(&user.id, self.time.now_utc())?;
        log_authentication_event("login", Some(&user.username), true);

        Ok(Session {
            user,
            token,
            expires_at,
        })
    }

    /// Resolve a session token to its user
    pub async fn authenticate(&self, token: &str) -> AppResult<User> {
        let user_id = self.signer.verify(token, self.time.now_utc())?;
        let user = self.user_by_id(&user_id).await?;
        debug!(user_id = %user_id, "Session authenticated");
        user.ok_or_else(|| UserError::InvalidSession.into())
    }

    pub async fn user_by_id(&self, user_id: &str) -> AppResult<Option<User>> {
        Ok(sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&self.db.pool)
            .await?)
    }

    pub async fn user_by_username(&self, username: &str) -> AppResult<Option<User>> {
        Ok(sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.db.pool)
            .await?)
    }
}
