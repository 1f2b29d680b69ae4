use async_trait::async_trait;

use super::{
    dto::NewJob,
    repo_types::{Job, JobRow},
};
use crate::{error::AppResult, storage::PgStore};

/// Owner-scoped persistence for job records. Every method filters by
/// `owner_id`; a record belonging to someone else behaves as absent.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Newest first.
    async fn list_jobs(&self, owner_id: i64) -> AppResult<Vec<Job>>;

    async fn get_job(&self, owner_id: i64, id: i64) -> AppResult<Option<Job>>;

    async fn create_job(&self, owner_id: i64, job: &NewJob) -> AppResult<Job>;

    /// Replaces every field and bumps `updated_at`. `None` when nothing matched.
    async fn update_job(&self, owner_id: i64, id: i64, job: &NewJob) -> AppResult<Option<Job>>;

    /// `false` when nothing matched.
    async fn delete_job(&self, owner_id: i64, id: i64) -> AppResult<bool>;
}

const JOB_COLUMNS: &str = "id, user_id, company, title, status, location, link, notes, \
                           applied_date, created_at, updated_at";

fn into_job(row: JobRow) -> AppResult<Job> {
    Ok(Job::try_from(row)?)
}

#[async_trait]
impl JobStore for PgStore {
    async fn list_jobs(&self, owner_id: i64) -> AppResult<Vec<Job>> {
        let rows = sqlx::query_as::<_, JobRow>(&format!(
            r#"
            SELECT {JOB_COLUMNS}
            FROM jobs
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            "#
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(into_job).collect()
    }

    async fn get_job(&self, owner_id: i64, id: i64) -> AppResult<Option<Job>> {
        let row = sqlx::query_as::<_, JobRow>(&format!(
            r#"SELECT {JOB_COLUMNS} FROM jobs WHERE id = $1 AND user_id = $2"#
        ))
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(into_job).transpose()
    }

    async fn create_job(&self, owner_id: i64, job: &NewJob) -> AppResult<Job> {
        let row = sqlx::query_as::<_, JobRow>(&format!(
            r#"
            INSERT INTO jobs (user_id, company, title, status, location, link, notes, applied_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {JOB_COLUMNS}
            "#
        ))
        .bind(owner_id)
        .bind(&job.company)
        .bind(&job.title)
        .bind(job.status.as_str())
        .bind(&job.location)
        .bind(&job.link)
        .bind(&job.notes)
        .bind(job.applied_date)
        .fetch_one(&self.pool)
        .await?;
        into_job(row)
    }

    async fn update_job(&self, owner_id: i64, id: i64, job: &NewJob) -> AppResult<Option<Job>> {
        let row = sqlx::query_as::<_, JobRow>(&format!(
            r#"
            UPDATE jobs
               SET company = $3, title = $4, status = $5, location = $6,
                   link = $7, notes = $8, applied_date = $9, updated_at = NOW()
             WHERE id = $1 AND user_id = $2
            RETURNING {JOB_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(owner_id)
        .bind(&job.company)
        .bind(&job.title)
        .bind(job.status.as_str())
        .bind(&job.location)
        .bind(&job.link)
        .bind(&job.notes)
        .bind(job.applied_date)
        .fetch_optional(&self.pool)
        .await?;
        row.map(into_job).transpose()
    }

    async fn delete_job(&self, owner_id: i64, id: i64) -> AppResult<bool> {
        let result = sqlx::query(r#"DELETE FROM jobs WHERE id = $1 AND user_id = $2"#)
            .bind(id)
            .bind(owner_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
