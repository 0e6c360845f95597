//! Axum route handlers for the Jobs API.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::jobs::description::generate_job_description;
use crate::jobs::store::not_found;
use crate::jobs::validation::{CreateJobRequest, GenerateJdRequest};
use crate::models::job::{Job, JobQuery, PostingStatus};
use crate::skills::task::SkillGenerationOutcome;
use crate::state::AppState;

const DEFAULT_PAGE_LIMIT: u32 = 10;
const DEFAULT_HOMEPAGE_LIMIT: u32 = 6;
const MAX_PAGE_LIMIT: u32 = 100;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct CreateJobResponse {
    pub message: String,
    pub job: Job,
}

#[derive(Debug, Serialize)]
pub struct JobResponse {
    pub job: Job,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListJobsParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub homepage: Option<bool>,
    pub status: Option<String>,
    pub q: Option<String>,
    pub company: Option<String>,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u64,
}

#[derive(Debug, Serialize)]
pub struct ListJobsResponse {
    pub jobs: Vec<Job>,
    pub meta: PageMeta,
}

#[derive(Debug, Serialize)]
pub struct GenerateJdResponse {
    pub description: String,
}

impl ListJobsParams {
    fn into_query(self) -> Result<JobQuery, AppError> {
        let homepage = self.homepage.unwrap_or(false);
        let default_limit = if homepage {
            DEFAULT_HOMEPAGE_LIMIT
        } else {
            DEFAULT_PAGE_LIMIT
        };
        let status = match non_blank(self.status) {
            Some(raw) => Some(raw.parse::<PostingStatus>().map_err(AppError::Validation)?),
            None => None,
        };

        Ok(JobQuery {
            page: if homepage { 1 } else { self.page.unwrap_or(1).max(1) },
            limit: self.limit.unwrap_or(default_limit).clamp(1, MAX_PAGE_LIMIT),
            status,
            company: non_blank(self.company),
            text: non_blank(self.q),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_job_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::Validation(format!("Invalid job id '{raw}'")))
}

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| AppError::Validation(format!("Invalid request body: {}", rejection.body_text())))
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/jobs/create
///
/// Persists the job with a pending skill status and queues skill generation.
/// The response never waits on generation.
pub async fn handle_create_job(
    State(state): State<AppState>,
    payload: Result<Json<CreateJobRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateJobResponse>), AppError> {
    let new_job = json_body(payload)?.into_new_job()?;
    let job = state.jobs.insert(new_job).await?;

    info!("Job {} created; queueing skill generation", job.id);
    state.skill_queue.enqueue(job.id, job.skill_context());

    Ok((
        StatusCode::CREATED,
        Json(CreateJobResponse {
            message: "Job created".to_string(),
            job,
        }),
    ))
}

/// GET /api/jobs/:id
///
/// Returns the current record, including in-progress generation fields.
pub async fn handle_get_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<JobResponse>, AppError> {
    let id = parse_job_id(&id)?;
    let job = state.jobs.get(id).await?.ok_or_else(|| not_found(id))?;
    Ok(Json(JobResponse { job }))
}

/// GET /api/jobs?page=&limit=&homepage=&status=&q=&company=
pub async fn handle_list_jobs(
    State(state): State<AppState>,
    params: Result<Query<ListJobsParams>, QueryRejection>,
) -> Result<Json<ListJobsResponse>, AppError> {
    let Query(params) = params.map_err(|rejection| {
        AppError::Validation(format!("Invalid query string: {}", rejection.body_text()))
    })?;
    let query = params.into_query()?;
    let page = state.jobs.list(&query).await?;

    let limit = u64::from(query.limit);
    let meta = PageMeta {
        page: query.page,
        limit: query.limit,
        total: page.total,
        total_pages: page.total.div_ceil(limit),
    };

    Ok(Json(ListJobsResponse {
        jobs: page.jobs,
        meta,
    }))
}

/// POST /api/jobs/generate-jd
pub async fn handle_generate_jd(
    State(state): State<AppState>,
    payload: Result<Json<GenerateJdRequest>, JsonRejection>,
) -> Result<Json<GenerateJdResponse>, AppError> {
    let details = json_body(payload)?.into_details()?;
    let description = generate_job_description(state.text_provider.as_deref(), &details).await?;
    Ok(Json(GenerateJdResponse { description }))
}

/// POST /api/jobs/:id/generate-skills
///
/// Runs skill generation inside the request and returns its outcome.
/// Rejected with 409 while another run for the same job is processing.
pub async fn handle_generate_skills(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SkillGenerationOutcome>, AppError> {
    let id = parse_job_id(&id)?;
    let job = state.jobs.get(id).await?.ok_or_else(|| not_found(id))?;

    let outcome = state.skill_task.run(id, &job.skill_context()).await?;
    if !outcome.success {
        return Err(AppError::SkillGeneration(
            outcome.error.unwrap_or_else(|| "unknown error".to_string()),
        ));
    }
    Ok(Json(outcome))
}

/// POST /api/jobs/:id/activate
pub async fn handle_activate_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<JobResponse>, AppError> {
    set_posting_status(&state, &id, PostingStatus::Active).await
}

/// POST /api/jobs/:id/close
pub async fn handle_close_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<JobResponse>, AppError> {
    set_posting_status(&state, &id, PostingStatus::Closed).await
}

async fn set_posting_status(
    state: &AppState,
    raw_id: &str,
    status: PostingStatus,
) -> Result<Json<JobResponse>, AppError> {
    let id = parse_job_id(raw_id)?;
    let job = state
        .jobs
        .set_posting_status(id, status)
        .await?
        .ok_or_else(|| not_found(id))?;
    info!("Job {id} is now {status}");
    Ok(Json(JobResponse { job }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_params_defaults() {
        let query = ListJobsParams::default().into_query().unwrap();
        assert_eq!(query, JobQuery::default());
    }

    #[test]
    fn test_list_params_homepage_ignores_page() {
        let query = ListJobsParams {
            page: Some(4),
            homepage: Some(true),
            ..ListJobsParams::default()
        }
        .into_query()
        .unwrap();
        assert_eq!(query.page, 1);
        assert_eq!(query.limit, DEFAULT_HOMEPAGE_LIMIT);
    }

    #[test]
    fn test_list_params_clamps_limit_and_trims_filters() {
        let query = ListJobsParams {
            limit: Some(1000),
            page: Some(0),
            q: Some("  react ".to_string()),
            company: Some("   ".to_string()),
            status: Some("active".to_string()),
            ..ListJobsParams::default()
        }
        .into_query()
        .unwrap();
        assert_eq!(query.limit, MAX_PAGE_LIMIT);
        assert_eq!(query.page, 1);
        assert_eq!(query.text.as_deref(), Some("react"));
        assert!(query.company.is_none());
        assert_eq!(query.status, Some(PostingStatus::Active));
    }

    #[test]
    fn test_list_params_rejects_unknown_status() {
        let err = ListJobsParams {
            status: Some("archived".to_string()),
            ..ListJobsParams::default()
        }
        .into_query()
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_parse_job_id() {
        assert!(parse_job_id("not-a-uuid").is_err());
        let id = Uuid::new_v4();
        assert_eq!(parse_job_id(&id.to_string()).unwrap(), id);
    }
}
