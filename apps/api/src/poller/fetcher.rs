use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use crate::models::job::Job;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum PollError {
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Job {0} not found")]
    NotFound(Uuid),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },
}

/// Source of the current job record. One call is one request.
#[async_trait]
pub trait JobFetcher: Send + Sync {
    async fn fetch(&self, id: Uuid) -> Result<Job, PollError>;
}

/// Fetches jobs from a running HireWise API via `GET /api/jobs/:id`.
pub struct HttpJobFetcher {
    client: Client,
    base_url: String,
}

#[derive(Deserialize)]
struct JobEnvelope {
    job: Job,
}

#[derive(Deserialize, Default)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

impl HttpJobFetcher {
    pub fn new(base_url: &str) -> Result<Self, PollError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn job_url(&self, id: Uuid) -> String {
        format!("{}/api/jobs/{id}", self.base_url)
    }
}

#[async_trait]
impl JobFetcher for HttpJobFetcher {
    async fn fetch(&self, id: Uuid) -> Result<Job, PollError> {
        let response = self.client.get(self.job_url(id)).send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Err(PollError::NotFound(id));
        }
        if !status.is_success() {
            let body = response.json::<ErrorBody>().await.unwrap_or_default();
            return Err(PollError::Api {
                status: status.as_u16(),
                message: body.message,
            });
        }

        let envelope: JobEnvelope = response.json().await?;
        Ok(envelope.job)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_url_trims_trailing_slash() {
        let fetcher = HttpJobFetcher::new("http://localhost:8080/").unwrap();
        let id = Uuid::nil();
        assert_eq!(
            fetcher.job_url(id),
            "http://localhost:8080/api/jobs/00000000-0000-0000-0000-000000000000"
        );
    }

    #[test]
    fn test_envelope_parses_api_job() {
        let raw = serde_json::json!({
            "job": {
                "id": "6f1c8a5e-2f5b-4a43-9d47-4f3a3c2b1a10",
                "title": "Full Stack Developer",
                "company": "KPMG",
                "description": "React and Node.js",
                "location": null,
                "experience": null,
                "status": "draft",
                "requiredSkills": ["React", "Node.js"],
                "topSkill": "React",
                "skillsGenerated": true,
                "skillGenerationStatus": "done",
                "skillGenerationError": null,
                "createdAt": "2026-01-05T10:00:00Z",
                "updatedAt": "2026-01-05T10:00:02Z"
            }
        });
        let envelope: JobEnvelope = serde_json::from_value(raw).unwrap();
        assert!(envelope.job.has_generated_skills());
        assert_eq!(envelope.job.top_skill.as_deref(), Some("React"));
    }
}
