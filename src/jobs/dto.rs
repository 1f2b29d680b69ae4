use serde::{Deserialize, Serialize};
use time::{macros::format_description, Date};

use super::repo_types::{Job, JobStatus};
use crate::error::AppError;

/// Body of `POST /jobs` and `PUT /jobs/:id`.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobInput {
    pub company: Option<String>,
    pub title: Option<String>,
    pub status: Option<String>,
    pub location: Option<String>,
    pub link: Option<String>,
    pub notes: Option<String>,
    pub applied_date: Option<String>,
}

/// Checked job fields, ready to store. Used whole for both create and replace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewJob {
    pub company: String,
    pub title: String,
    pub status: JobStatus,
    pub location: Option<String>,
    pub link: Option<String>,
    pub notes: Option<String>,
    pub applied_date: Option<Date>,
}

impl JobInput {
    pub fn validate(self) -> Result<NewJob, AppError> {
        let company = required(self.company);
        let title = required(self.title);
        let (Some(company), Some(title)) = (company, title) else {
            return Err(AppError::validation("company and title required"));
        };

        let status = match blank_to_none(self.status) {
            Some(s) => s
                .parse::<JobStatus>()
                .map_err(|e| AppError::Validation(e.to_string()))?,
            None => JobStatus::default(),
        };

        let applied_date = blank_to_none(self.applied_date)
            .map(|raw| {
                Date::parse(raw.trim(), format_description!("[year]-[month]-[day]"))
                    .map_err(|_| AppError::validation("applied_date must be YYYY-MM-DD"))
            })
            .transpose()?;

        Ok(NewJob {
            company,
            title,
            status,
            location: blank_to_none(self.location),
            link: blank_to_none(self.link),
            notes: blank_to_none(self.notes),
            applied_date,
        })
    }
}

/// Present and not just whitespace. Kept verbatim otherwise.
fn required(v: Option<String>) -> Option<String> {
    v.filter(|s| !s.trim().is_empty())
}

fn blank_to_none(v: Option<String>) -> Option<String> {
    v.filter(|s| !s.is_empty())
}

#[derive(Debug, Serialize)]
pub struct JobListResponse {
    pub ok: bool,
    pub jobs: Vec<Job>,
}

#[derive(Debug, Serialize)]
pub struct JobResponse {
    pub ok: bool,
    pub job: Job,
}

#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub ok: bool,
}
