use tracing::{info, warn};

use super::{dto::JobInput, repo::JobStore, repo_types::Job};
use crate::{
    error::{AppError, AppResult},
    state::AppState,
};

pub async fn list(state: &AppState, owner_id: i64) -> AppResult<Vec<Job>> {
    state.store.list_jobs(owner_id).await
}

pub async fn get(state: &AppState, owner_id: i64, id: i64) -> AppResult<Job> {
    state
        .store
        .get_job(owner_id, id)
        .await?
        .ok_or_else(AppError::job_not_found)
}

pub async fn create(state: &AppState, owner_id: i64, input: JobInput) -> AppResult<Job> {
    let new_job = input.validate()?;
    let job = state.store.create_job(owner_id, &new_job).await?;
    info!(user_id = owner_id, job_id = job.id, "job created");
    Ok(job)
}

/// Full replace. Concurrent updates to one record are last-write-wins.
pub async fn update(state: &AppState, owner_id: i64, id: i64, input: JobInput) -> AppResult<Job> {
    let new_job = input.validate()?;
    match state.store.update_job(owner_id, id, &new_job).await? {
        Some(job) => {
            info!(user_id = owner_id, job_id = id, "job updated");
            Ok(job)
        }
        None => {
            warn!(user_id = owner_id, job_id = id, "update on missing or foreign job");
            Err(AppError::job_not_found())
        }
    }
}

pub async fn delete(state: &AppState, owner_id: i64, id: i64) -> AppResult<()> {
    if !state.store.delete_job(owner_id, id).await? {
        warn!(user_id = owner_id, job_id = id, "delete on missing or foreign job");
        return Err(AppError::job_not_found());
    }
    info!(user_id = owner_id, job_id = id, "job deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::repo_types::JobStatus;

    fn acme() -> JobInput {
        JobInput {
            company: Some("Acme".into()),
            title: Some("Engineer".into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn create_round_trips_fields() {
        let state = AppState::fake();
        let input = JobInput {
            status: Some("offer".into()),
            location: Some("Remote".into()),
            link: Some("https://acme.test".into()),
            notes: Some("referral".into()),
            applied_date: Some("2024-05-01".into()),
            ..acme()
        };
        let job = create(&state, 1, input).await.unwrap();
        assert_eq!(job.owner_id, 1);
        assert_eq!(job.company, "Acme");
        assert_eq!(job.title, "Engineer");
        assert_eq!(job.status, JobStatus::Offer);
        assert_eq!(job.location.as_deref(), Some("Remote"));
        assert_eq!(job.link.as_deref(), Some("https://acme.test"));
        assert_eq!(job.notes.as_deref(), Some("referral"));
        assert_eq!(job.applied_date.map(|d| d.to_string()).as_deref(), Some("2024-05-01"));
        assert_eq!(job.created_at, job.updated_at);
        assert_eq!(get(&state, 1, job.id).await.unwrap(), job);
    }

    #[tokio::test]
    async fn list_is_newest_first_and_scoped() {
        let state = AppState::fake();
        let first = create(&state, 1, acme()).await.unwrap();
        let second = create(&state, 1, acme()).await.unwrap();
        create(&state, 2, acme()).await.unwrap();

        let ids: Vec<i64> = list(&state, 1).await.unwrap().iter().map(|j| j.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
        assert_eq!(list(&state, 2).await.unwrap().len(), 1);
        assert!(list(&state, 3).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_replaces_every_field() {
        let state = AppState::fake();
        let job = create(
            &state,
            1,
            JobInput {
                notes: Some("old".into()),
                location: Some("Berlin".into()),
                ..acme()
            },
        )
        .await
        .unwrap();

        let updated = update(
            &state,
            1,
            job.id,
            JobInput {
                status: Some("interview".into()),
                ..acme()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.status, JobStatus::Interview);
        assert!(updated.notes.is_none());
        assert!(updated.location.is_none());
        assert_eq!(updated.created_at, job.created_at);
        assert!(updated.updated_at > job.updated_at);
        assert_eq!(get(&state, 1, job.id).await.unwrap(), updated);
    }

    #[tokio::test]
    async fn other_users_records_are_not_found() {
        let state = AppState::fake();
        let job = create(&state, 1, acme()).await.unwrap();

        assert!(matches!(get(&state, 2, job.id).await, Err(AppError::NotFound(_))));
        assert!(matches!(update(&state, 2, job.id, acme()).await, Err(AppError::NotFound(_))));
        assert!(matches!(delete(&state, 2, job.id).await, Err(AppError::NotFound(_))));

        let foreign = update(&state, 2, job.id, acme()).await.unwrap_err().to_string();
        let missing = update(&state, 2, 999, acme()).await.unwrap_err().to_string();
        assert_eq!(foreign, missing);

        // untouched
        assert_eq!(get(&state, 1, job.id).await.unwrap(), job);
    }

    #[tokio::test]
    async fn invalid_input_never_reaches_the_store() {
        let state = AppState::fake();
        let job = create(&state, 1, acme()).await.unwrap();
        let blank = JobInput {
            company: Some(String::new()),
            ..acme()
        };
        assert!(matches!(create(&state, 1, JobInput::default()).await, Err(AppError::Validation(_))));
        assert!(matches!(update(&state, 1, job.id, blank).await, Err(AppError::Validation(_))));
        assert_eq!(list(&state, 1).await.unwrap(), vec![job]);
    }

    #[tokio::test]
    async fn delete_removes_record() {
        let state = AppState::fake();
        let job = create(&state, 1, acme()).await.unwrap();
        delete(&state, 1, job.id).await.unwrap();
        assert!(list(&state, 1).await.unwrap().is_empty());
        assert!(matches!(delete(&state, 1, job.id).await, Err(AppError::NotFound(_))));
    }
}
