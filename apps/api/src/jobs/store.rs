//! Job store: persistence seam for job postings.
//!
//! `AppState` holds an `Arc<dyn JobStore>`: `PgJobStore` in production,
//! `MemoryJobStore` when no `DATABASE_URL` is configured and in tests.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::job::{Job, JobPage, JobQuery, NewJob, PostingStatus, SkillGenerationStatus};

#[async_trait]
pub trait JobStore: Send + Sync {
    async fn insert(&self, new_job: NewJob) -> Result<Job, AppError>;

    async fn get(&self, id: Uuid) -> Result<Option<Job>, AppError>;

    /// Newest first.
    async fn list(&self, query: &JobQuery) -> Result<JobPage, AppError>;

    async fn set_posting_status(
        &self,
        id: Uuid,
        status: PostingStatus,
    ) -> Result<Option<Job>, AppError>;

    /// Moves the job to `processing` and clears any previous error.
    ///
    /// Fails with `NotFound` for unknown ids and `Conflict` when the job is
    /// already processing; this is the only guard against concurrent runs.
    /// A run left `processing` for longer than `PROCESSING_LEASE_SECS` is
    /// considered abandoned and gets taken over.
    async fn begin_skill_generation(&self, id: Uuid) -> Result<Job, AppError>;

    /// Overwrites the generated fields and moves a processing job to `done`.
    async fn complete_skill_generation(
        &self,
        id: Uuid,
        skills: &[String],
        top_skill: Option<&str>,
    ) -> Result<Job, AppError>;

    /// Moves a processing job to `failed` and records the message.
    async fn fail_skill_generation(&self, id: Uuid, error: &str) -> Result<Job, AppError>;
}

/// Upper bound on one generation run, above the provider's timeout and
/// retry budget. Runs older than this were lost to a restart or to a failure
/// that could not be recorded.
pub const PROCESSING_LEASE_SECS: i64 = 600;

/// Runs last touched before this instant no longer hold the processing guard.
pub(crate) fn lease_cutoff(now: DateTime<Utc>) -> DateTime<Utc> {
    now - Duration::seconds(PROCESSING_LEASE_SECS)
}

pub(crate) fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Job {id} not found"))
}

pub(crate) fn already_processing(id: Uuid) -> AppError {
    AppError::Conflict(format!("Skill generation for job {id} is already in progress"))
}

pub(crate) fn not_processing(id: Uuid) -> AppError {
    AppError::Conflict(format!("Skill generation for job {id} is not in progress"))
}

const LIKE_ESCAPE: &str = " ESCAPE '\\'";

/// PostgreSQL-backed store. Every state change is a single-row UPDATE.
pub struct PgJobStore {
    pool: PgPool,
}

impl PgJobStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Distinguishes "no such job" from "job in the wrong state" after a
    /// conditional UPDATE matched nothing.
    async fn missing_or(&self, id: Uuid, conflict: AppError) -> AppError {
        let exists: Result<bool, sqlx::Error> =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM jobs WHERE id = $1)")
                .bind(id)
                .fetch_one(&self.pool)
                .await;
        match exists {
            Ok(true) => conflict,
            Ok(false) => not_found(id),
            Err(e) => AppError::Database(e),
        }
    }
}

/// `%text%` for `ILIKE ... ESCAPE '\'`, with the text's own wildcards
/// escaped so it matches literally, like `JobQuery::matches`.
fn contains_pattern(text: &str) -> String {
    let mut pattern = String::with_capacity(text.len() + 2);
    pattern.push('%');
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &JobQuery) {
    builder.push(" WHERE TRUE");
    if let Some(status) = query.status {
        builder.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(company) = &query.company {
        builder
            .push(" AND company ILIKE ")
            .push_bind(contains_pattern(company))
            .push(LIKE_ESCAPE);
    }
    if let Some(text) = &query.text {
        let pattern = contains_pattern(text);
        builder
            .push(" AND (title ILIKE ")
            .push_bind(pattern.clone())
            .push(LIKE_ESCAPE)
            .push(" OR company ILIKE ")
            .push_bind(pattern.clone())
            .push(LIKE_ESCAPE)
            .push(" OR description ILIKE ")
            .push_bind(pattern)
            .push(LIKE_ESCAPE)
            .push(")");
    }
}

#[async_trait]
impl JobStore for PgJobStore {
    async fn insert(&self, new_job: NewJob) -> Result<Job, AppError> {
        let job = sqlx::query_as::<_, Job>(
            r#"
            INSERT INTO jobs
                (id, title, company, description, location, experience, status,
                 required_skills, skill_generation_status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new_job.title)
        .bind(&new_job.company)
        .bind(&new_job.description)
        .bind(&new_job.location)
        .bind(&new_job.experience)
        .bind(new_job.status)
        .bind(&new_job.required_skills)
        .bind(SkillGenerationStatus::Pending)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        info!("Inserted job {} ({} @ {})", job.id, job.title, job.company);
        Ok(job)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Job>, AppError> {
        Ok(sqlx::query_as::<_, Job>("SELECT * FROM jobs WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list(&self, query: &JobQuery) -> Result<JobPage, AppError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM jobs");
        push_filters(&mut count, query);
        let total: i64 = count.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Postgres>::new("SELECT * FROM jobs");
        push_filters(&mut select, query);
        select
            .push(" ORDER BY created_at DESC, id LIMIT ")
            .push_bind(i64::from(query.limit))
            .push(" OFFSET ")
            .push_bind(query.offset() as i64);
        let jobs = select.build_query_as::<Job>().fetch_all(&self.pool).await?;

        Ok(JobPage {
            jobs,
            total: total.max(0) as u64,
        })
    }

    async fn set_posting_status(
        &self,
        id: Uuid,
        status: PostingStatus,
    ) -> Result<Option<Job>, AppError> {
        Ok(sqlx::query_as::<_, Job>(
            "UPDATE jobs SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn begin_skill_generation(&self, id: Uuid) -> Result<Job, AppError> {
        let job = sqlx::query_as::<_, Job>(
            r#"
            UPDATE jobs
            SET skill_generation_status = 'processing',
                skill_generation_error = NULL,
                updated_at = NOW()
            WHERE id = $1
              AND (skill_generation_status <> 'processing' OR updated_at < $2)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(lease_cutoff(Utc::now()))
        .fetch_optional(&self.pool)
        .await?;

        match job {
            Some(job) => Ok(job),
            None => Err(self.missing_or(id, already_processing(id)).await),
        }
    }

    async fn complete_skill_generation(
        &self,
        id: Uuid,
        skills: &[String],
        top_skill: Option<&str>,
    ) -> Result<Job, AppError> {
        let job = sqlx::query_as::<_, Job>(
            r#"
            UPDATE jobs
            SET required_skills = $2,
                top_skill = $3,
                skills_generated = TRUE,
                skill_generation_status = 'done',
                skill_generation_error = NULL,
                updated_at = NOW()
            WHERE id = $1 AND skill_generation_status = 'processing'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(skills)
        .bind(top_skill)
        .fetch_optional(&self.pool)
        .await?;

        match job {
            Some(job) => Ok(job),
            None => Err(self.missing_or(id, not_processing(id)).await),
        }
    }

    async fn fail_skill_generation(&self, id: Uuid, error: &str) -> Result<Job, AppError> {
        let job = sqlx::query_as::<_, Job>(
            r#"
            UPDATE jobs
            SET skill_generation_status = 'failed',
                skill_generation_error = $2,
                updated_at = NOW()
            WHERE id = $1 AND skill_generation_status = 'processing'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(error)
        .fetch_optional(&self.pool)
        .await?;

        match job {
            Some(job) => Ok(job),
            None => Err(self.missing_or(id, not_processing(id)).await),
        }
    }
}
