//! Accounts, sessions and the bearer-token middleware.
//!
//! Passwords are stored as Argon2id PHC strings (salt and parameters
//! included). Session tokens are 32 random bytes handed to the client as hex;
//! only their BLAKE3 hash is stored, so a leaked database cannot be replayed
//! as live sessions.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
    Extension, Json,
};
use chrono::{Duration, Utc};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use tracing::info;

use pomoloot_store::User;

use crate::api::AppState;
use crate::config::ServerConfig;
use crate::error::ApiError;

const MIN_PASSWORD_LEN: usize = 6;
const TOKEN_LEN: usize = 32;

/// The authenticated caller, inserted into request extensions by
/// [`require_user`].
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

/// Hash `password` under a fresh salt into a PHC string.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = password_hasher()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| ApiError::Internal(format!("password hashing failed: {e}")))?;
    Ok(hash.to_string())
}

/// Check `password` against a stored PHC string. Parameters come from the
/// string itself, so hashes made with other cost settings still verify.
pub fn verify_password(password: &str, phc: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(phc) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(not(test))]
fn password_hasher() -> Argon2<'static> {
    Argon2::default()
}

// Minimum cost so the router tests stay fast.
#[cfg(test)]
fn password_hasher() -> Argon2<'static> {
    use argon2::{Algorithm, Params, Version};
    let params = Params::new(Params::MIN_M_COST, Params::MIN_T_COST, 1, None).unwrap();
    Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
}

/// A new random session token (hex) for the client.
pub fn new_session_token() -> String {
    let mut bytes = [0u8; TOKEN_LEN];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// The form of a session token kept in the database.
pub fn token_hash(token: &str) -> String {
    blake3::hash(token.as_bytes()).to_hex().to_string()
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

// ---------------------------------------------------------------------------
// Middleware
// ---------------------------------------------------------------------------

/// Resolve the bearer token to a user or reject with 401.
pub async fn require_user(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !req.headers().contains_key(header::AUTHORIZATION) {
        return Err(ApiError::Unauthorized(
            "Authorization header required".into(),
        ));
    }
    let token = bearer_token(req.headers()).ok_or_else(|| {
        ApiError::Unauthorized("Invalid authorization header format".into())
    })?;

    let user = {
        let db = state.db.lock().await;
        db.user_for_session(&token_hash(token), Utc::now())?
    };
    let Some(user) = user else {
        return Err(ApiError::Unauthorized("Invalid or expired token".into()));
    };

    req.extensions_mut().insert(AuthUser(user));
    Ok(next.run(req).await)
}

/// Guard for operator endpoints configured through `ADMIN_TOKEN`.
pub fn verify_admin_token(headers: &HeaderMap, config: &ServerConfig) -> Result<(), ApiError> {
    let Some(ref expected) = config.admin_token else {
        return Err(ApiError::Forbidden(
            "Admin API is disabled (no ADMIN_TOKEN configured)".into(),
        ));
    };

    let token = bearer_token(headers).unwrap_or("");

    let token_bytes = token.as_bytes();
    let expected_bytes = expected.as_bytes();
    if token_bytes.len() != expected_bytes.len()
        || token_bytes.ct_eq(expected_bytes).unwrap_u8() != 1
    {
        return Err(ApiError::Forbidden("Invalid admin token".into()));
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

#[derive(Serialize)]
pub struct AuthResponse {
    user: User,
    token: String,
}

#[derive(Serialize)]
pub struct MeResponse {
    user: User,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let name = req.name.trim();
    let email = normalize_email(&req.email);
    let password = req.password.trim();

    if name.is_empty() || email.is_empty() || password.is_empty() {
        return Err(ApiError::BadRequest(
            "Name, email and password are required".into(),
        ));
    }
    if !email.contains('@') {
        return Err(ApiError::BadRequest("Invalid email address".into()));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::BadRequest(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    let hash = hash_password(password)?;
    let token = new_session_token();

    let db = state.db.lock().await;
    let user = db
        .create_user(name, &email, &hash)
        .map_err(|err| match err {
            pomoloot_store::StoreError::Conflict(_) => {
                ApiError::Conflict("Email already registered".into())
            }
            other => other.into(),
        })?;
    db.create_session(&token_hash(&token), user.id, session_expiry(&state.config))?;

    Ok((StatusCode::CREATED, Json(AuthResponse { user, token })))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let email = normalize_email(&req.email);
    let password = req.password.trim();
    if email.is_empty() || password.is_empty() {
        return Err(ApiError::BadRequest("Email and password are required".into()));
    }

    let db = state.db.lock().await;
    let user = db
        .find_user_by_email(&email)?
        .filter(|u| verify_password(password, &u.password_hash))
        .ok_or_else(|| ApiError::Unauthorized("Invalid email or password".into()))?;

    let token = new_session_token();
    db.create_session(&token_hash(&token), user.id, session_expiry(&state.config))?;

    info!(user = %user.id, "user logged in");
    Ok(Json(AuthResponse { user, token }))
}

pub async fn me(Extension(AuthUser(user)): Extension<AuthUser>) -> Json<MeResponse> {
    Json(MeResponse { user })
}

fn session_expiry(config: &ServerConfig) -> chrono::DateTime<Utc> {
    Utc::now() + Duration::hours(config.session_ttl_hours)
}
