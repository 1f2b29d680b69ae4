use std::collections::HashMap;

use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use time::{Duration, OffsetDateTime};
use tokio::sync::RwLock;

use crate::{
    auth::{repo::UserStore, repo_types::User},
    error::{AppError, AppResult},
    jobs::{repo::JobStore, repo_types::Job, NewJob},
};

/// Everything the handlers need from persistence.
#[async_trait]
pub trait Store: UserStore + JobStore {
    /// Round-trips to the backing store and returns its clock.
    async fn ping(&self) -> anyhow::Result<OffsetDateTime>;

    /// Releases connections on shutdown.
    async fn close(&self) {}
}

/// Postgres-backed store. Query impls live next to their domain in
/// `auth::repo` and `jobs::repo`.
#[derive(Clone)]
pub struct PgStore {
    pub(crate) pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> anyhow::Result<OffsetDateTime> {
        let (now,): (OffsetDateTime,) = sqlx::query_as("SELECT NOW()")
            .fetch_one(&self.pool)
            .await
            .context("ping database")?;
        Ok(now)
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

/// In-process store for tests and database-less local runs.
///
/// Each operation takes the single lock once, so mutations are atomic.
/// Timestamps are truncated to microseconds like Postgres and never repeat.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    users: Vec<User>,
    jobs: HashMap<i64, Job>,
    next_user_id: i64,
    next_job_id: i64,
    last_ts: Option<OffsetDateTime>,
}

impl MemoryInner {
    fn tick(&mut self) -> OffsetDateTime {
        let now = OffsetDateTime::now_utc();
        let now = now - Duration::nanoseconds(i64::from(now.nanosecond() % 1_000));
        let ts = match self.last_ts {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_ts = Some(ts);
        ts
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_id(&self, id: i64) -> AppResult<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.iter().find(|u| u.id == id).cloned())
    }

    async fn create_user(&self, email: &str, password_hash: &str) -> AppResult<User> {
        let mut inner = self.inner.write().await;
        if inner.users.iter().any(|u| u.email == email) {
            return Err(AppError::Conflict("Email already in use".into()));
        }
        inner.next_user_id += 1;
        let user = User {
            id: inner.next_user_id,
            email: email.to_owned(),
            password_hash: password_hash.to_owned(),
            created_at: inner.tick(),
        };
        inner.users.push(user.clone());
        Ok(user)
    }
}

#[async_trait]
impl JobStore for MemoryStore {
    async fn list_jobs(&self, owner_id: i64) -> AppResult<Vec<Job>> {
        let inner = self.inner.read().await;
        let mut jobs: Vec<Job> = inner
            .jobs
            .values()
            .filter(|j| j.owner_id == owner_id)
            .cloned()
            .collect();
        jobs.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(jobs)
    }

    async fn get_job(&self, owner_id: i64, id: i64) -> AppResult<Option<Job>> {
        let inner = self.inner.read().await;
        Ok(inner.jobs.get(&id).filter(|j| j.owner_id == owner_id).cloned())
    }

    async fn create_job(&self, owner_id: i64, job: &NewJob) -> AppResult<Job> {
        let mut inner = self.inner.write().await;
        inner.next_job_id += 1;
        let now = inner.tick();
        let created = Job {
            id: inner.next_job_id,
            owner_id,
            company: job.company.clone(),
            title: job.title.clone(),
            status: job.status,
            location: job.location.clone(),
            link: job.link.clone(),
            notes: job.notes.clone(),
            applied_date: job.applied_date,
            created_at: now,
            updated_at: now,
        };
        inner.jobs.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_job(&self, owner_id: i64, id: i64, job: &NewJob) -> AppResult<Option<Job>> {
        let mut inner = self.inner.write().await;
        let owned = inner.jobs.get(&id).is_some_and(|j| j.owner_id == owner_id);
        if !owned {
            return Ok(None);
        }
        let now = inner.tick();
        let Some(existing) = inner.jobs.get_mut(&id) else {
            return Ok(None);
        };
        existing.company = job.company.clone();
        existing.title = job.title.clone();
        existing.status = job.status;
        existing.location = job.location.clone();
        existing.link = job.link.clone();
        existing.notes = job.notes.clone();
        existing.applied_date = job.applied_date;
        existing.updated_at = now;
        Ok(Some(existing.clone()))
    }

    async fn delete_job(&self, owner_id: i64, id: i64) -> AppResult<bool> {
        let mut inner = self.inner.write().await;
        let owned = inner.jobs.get(&id).is_some_and(|j| j.owner_id == owner_id);
        if owned {
            inner.jobs.remove(&id);
        }
        Ok(owned)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> anyhow::Result<OffsetDateTime> {
        Ok(OffsetDateTime::now_utc())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::repo_types::JobStatus;

    fn new_job(company: &str) -> NewJob {
        NewJob {
            company: company.into(),
            title: "Engineer".into(),
            status: JobStatus::Applied,
            location: None,
            link: None,
            notes: None,
            applied_date: None,
        }
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() {
        let store = MemoryStore::new();
        let u = store.create_user("a@b.com", "h").await.unwrap();
        assert_eq!(u.id, 1);
        let err = store.create_user("a@b.com", "h2").await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(store.find_user_by_email("a@b.com").await.unwrap().unwrap().password_hash, "h");
    }

    #[tokio::test]
    async fn timestamps_strictly_increase() {
        let store = MemoryStore::new();
        let a = store.create_job(1, &new_job("A")).await.unwrap();
        let b = store.create_job(1, &new_job("B")).await.unwrap();
        assert!(b.created_at > a.created_at);
        assert_eq!(a.created_at.nanosecond() % 1_000, 0);
    }

    #[tokio::test]
    async fn scoped_mutations_leave_foreign_rows_alone() {
        let store = MemoryStore::new();
        let job = store.create_job(1, &new_job("A")).await.unwrap();
        assert!(store.update_job(2, job.id, &new_job("X")).await.unwrap().is_none());
        assert!(!store.delete_job(2, job.id).await.unwrap());
        assert_eq!(store.get_job(1, job.id).await.unwrap().unwrap().company, "A");
        assert!(store.get_job(2, job.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn ping_reports_time() {
        let store = MemoryStore::new();
        assert!(store.ping().await.is_ok());
    }
}
