use std::{fmt, str::FromStr};

use serde::Serialize;
use sqlx::FromRow;
use time::{Date, OffsetDateTime};

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

/// Where an application stands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    #[default]
    Applied,
    Interview,
    Offer,
    Rejected,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Applied => "applied",
            JobStatus::Interview => "interview",
            JobStatus::Offer => "offer",
            JobStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("status must be one of applied, interview, offer, rejected")]
pub struct UnknownStatus;

impl FromStr for JobStatus {
    type Err = UnknownStatus;

    /// Case-insensitive, surrounding whitespace ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "applied" => Ok(JobStatus::Applied),
            "interview" => Ok(JobStatus::Interview),
            "offer" => Ok(JobStatus::Offer),
            "rejected" => Ok(JobStatus::Rejected),
            _ => Err(UnknownStatus),
        }
    }
}

/// Row as stored in `jobs`.
#[derive(Debug, Clone, FromRow)]
pub struct JobRow {
    pub id: i64,
    pub user_id: i64,
    pub company: String,
    pub title: String,
    pub status: String,
    pub location: Option<String>,
    pub link: Option<String>,
    pub notes: Option<String>,
    pub applied_date: Option<Date>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Job record as handed to clients. The owner is implied by the token.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Job {
    pub id: i64,
    #[serde(skip)]
    pub owner_id: i64,
    pub company: String,
    pub title: String,
    pub status: JobStatus,
    pub location: Option<String>,
    pub link: Option<String>,
    pub notes: Option<String>,
    #[serde(with = "iso_date::option")]
    pub applied_date: Option<Date>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl TryFrom<JobRow> for Job {
    type Error = anyhow::Error;

    fn try_from(r: JobRow) -> Result<Self, Self::Error> {
        let status = r
            .status
            .parse()
            .map_err(|_| anyhow::anyhow!("job {} has unknown status {:?}", r.id, r.status))?;
        Ok(Self {
            id: r.id,
            owner_id: r.user_id,
            company: r.company,
            title: r.title,
            status,
            location: r.location,
            link: r.link,
            notes: r.notes,
            applied_date: r.applied_date,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}
