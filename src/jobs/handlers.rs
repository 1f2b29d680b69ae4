use axum::{
    extract::State,
    routing::get,
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{JobInput, JobListResponse, JobResponse, OkResponse},
    services,
};
use crate::{
    auth::extractors::AuthUser,
    error::AppResult,
    extract::{ApiJson, RecordId},
    state::AppState,
};

pub fn job_routes() -> Router<AppState> {
    Router::new()
        .route("/jobs", get(list_jobs).post(create_job))
        .route("/jobs/:id", get(get_job).put(update_job).delete(delete_job))
}

// AuthUser comes first in every handler so a bad token is rejected
// before the path or body are looked at.

#[instrument(skip(state))]
pub async fn list_jobs(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<JobListResponse>> {
    let jobs = services::list(&state, user_id).await?;
    Ok(Json(JobListResponse { ok: true, jobs }))
}

#[instrument(skip(state))]
pub async fn get_job(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    RecordId(id): RecordId,
) -> AppResult<Json<JobResponse>> {
    let job = services::get(&state, user_id, id).await?;
    Ok(Json(JobResponse { ok: true, job }))
}

#[instrument(skip(state, payload))]
pub async fn create_job(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiJson(payload): ApiJson<JobInput>,
) -> AppResult<Json<JobResponse>> {
    let job = services::create(&state, user_id, payload).await?;
    Ok(Json(JobResponse { ok: true, job }))
}

#[instrument(skip(state, payload))]
pub async fn update_job(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    RecordId(id): RecordId,
    ApiJson(payload): ApiJson<JobInput>,
) -> AppResult<Json<JobResponse>> {
    let job = services::update(&state, user_id, id, payload).await?;
    Ok(Json(JobResponse { ok: true, job }))
}

#[instrument(skip(state))]
pub async fn delete_job(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    RecordId(id): RecordId,
) -> AppResult<Json<OkResponse>> {
    services::delete(&state, user_id, id).await?;
    Ok(Json(OkResponse { ok: true }))
}
