use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::{
        dto::{AuthResponse, Credentials, MeResponse},
        extractors::AuthUser,
        services,
    },
    error::AppResult,
    extract::ApiJson,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<Credentials>,
) -> AppResult<Json<AuthResponse>> {
    let session = services::register(&state, &payload.email, &payload.password).await?;
    Ok(Json(AuthResponse {
        ok: true,
        token: session.token,
        user: session.user.into(),
    }))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<Credentials>,
) -> AppResult<Json<AuthResponse>> {
    let session = services::authenticate(&state, &payload.email, &payload.password).await?;
    Ok(Json(AuthResponse {
        ok: true,
        token: session.token,
        user: session.user.into(),
    }))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<MeResponse>> {
    let user = services::current_user(&state, user_id).await?;
    Ok(Json(MeResponse {
        ok: true,
        user: user.into(),
    }))
}
