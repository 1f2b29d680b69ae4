use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

use crate::{
    auth::{repo::UserStore, repo_types::User},
    error::{AppError, AppResult},
    state::AppState,
};

pub const MIN_PASSWORD_LEN: usize = 8;

/// A freshly authenticated user and the token issued for them.
#[derive(Debug)]
pub struct Session {
    pub token: String,
    pub user: User,
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub(crate) fn looks_like_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub async fn register(state: &AppState, email: &str, password: &str) -> AppResult<Session> {
    let email = normalize_email(email);
    if email.is_empty() || password.is_empty() {
        return Err(AppError::validation("Email and password required"));
    }
    if !looks_like_email(&email) {
        warn!(%email, "registering address without a usual email shape");
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        warn!("password too short");
        return Err(AppError::validation("Password must be at least 8 chars"));
    }

    if state.store.find_user_by_email(&email).await?.is_some() {
        warn!(%email, "email already registered");
        return Err(AppError::Conflict("Email already in use".into()));
    }

    let hash = state.hasher.hash_blocking(password.to_owned()).await?;
    // The unique index still guards against a concurrent signup slipping in here.
    let user = state.store.create_user(&email, &hash).await?;
    let token = state.jwt.issue(&user)?;

    info!(user_id = user.id, email = %user.email, "user registered");
    Ok(Session { token, user })
}

pub async fn authenticate(state: &AppState, email: &str, password: &str) -> AppResult<Session> {
    // Raw values: a blank address falls through to invalid credentials.
    if email.is_empty() || password.is_empty() {
        return Err(AppError::validation("Email and password required"));
    }
    let email = normalize_email(email);

    let user = state.store.find_user_by_email(&email).await?;
    let ok = state
        .hasher
        .verify_blocking(password.to_owned(), user.as_ref().map(|u| u.password_hash.clone()))
        .await?;

    let user = match (user, ok) {
        (Some(u), true) => u,
        (Some(u), false) => {
            warn!(%email, user_id = u.id, "login invalid password");
            return Err(AppError::invalid_credentials());
        }
        (None, _) => {
            warn!(%email, "login unknown email");
            return Err(AppError::invalid_credentials());
        }
    };

    let token = state.jwt.issue(&user)?;
    info!(user_id = user.id, "user logged in");
    Ok(Session { token, user })
}

/// Resolves the token subject to a user. A subject whose account is gone is
/// treated like any other bad token.
pub async fn current_user(state: &AppState, user_id: i64) -> AppResult<User> {
    state.store.find_user_by_id(user_id).await?.ok_or_else(|| {
        warn!(user_id, "token subject has no user");
        AppError::unauthorized()
    })
}
