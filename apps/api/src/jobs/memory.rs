use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::warn;
use uuid::Uuid;

use crate::errors::AppError;
use crate::jobs::store::{already_processing, lease_cutoff, not_found, not_processing, JobStore};
use crate::models::job::{Job, JobPage, JobQuery, NewJob, PostingStatus, SkillGenerationStatus};

/// In-process job store used when no database is configured, and by tests.
/// Jobs are kept in creation order; each update happens under one write lock.
#[derive(Default)]
pub struct MemoryJobStore {
    jobs: RwLock<Vec<Job>>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves the job's `updated_at` into the past.
    #[cfg(test)]
    pub(crate) async fn backdate(&self, id: Uuid, by: chrono::Duration) {
        if let Some(job) = self.jobs.write().await.iter_mut().find(|j| j.id == id) {
            job.updated_at -= by;
        }
    }

    async fn update_where<F>(
        &self,
        id: Uuid,
        precondition: SkillGenerationGuard,
        apply: F,
    ) -> Result<Job, AppError>
    where
        F: FnOnce(&mut Job) + Send,
    {
        let mut jobs = self.jobs.write().await;
        let job = jobs
            .iter_mut()
            .find(|j| j.id == id)
            .ok_or_else(|| not_found(id))?;

        let processing = job.skill_generation_status == SkillGenerationStatus::Processing;
        match precondition {
            SkillGenerationGuard::NotProcessing if processing => {
                if job.updated_at >= lease_cutoff(Utc::now()) {
                    return Err(already_processing(id));
                }
                warn!("Taking over abandoned skill generation for job {id}");
            }
            SkillGenerationGuard::Processing if !processing => return Err(not_processing(id)),
            _ => {}
        }

        apply(job);
        job.updated_at = Utc::now();
        Ok(job.clone())
    }
}

enum SkillGenerationGuard {
    NotProcessing,
    Processing,
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn insert(&self, new_job: NewJob) -> Result<Job, AppError> {
        let job = new_job.into_job(Uuid::new_v4(), Utc::now());
        self.jobs.write().await.push(job.clone());
        Ok(job)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Job>, AppError> {
        Ok(self.jobs.read().await.iter().find(|j| j.id == id).cloned())
    }

    async fn list(&self, query: &JobQuery) -> Result<JobPage, AppError> {
        let jobs = self.jobs.read().await;
        let matching: Vec<&Job> = jobs.iter().rev().filter(|j| query.matches(j)).collect();
        let total = matching.len() as u64;
        let page = matching
            .into_iter()
            .skip(query.offset() as usize)
            .take(query.limit as usize)
            .cloned()
            .collect();
        Ok(JobPage { jobs: page, total })
    }

    async fn set_posting_status(
        &self,
        id: Uuid,
        status: PostingStatus,
    ) -> Result<Option<Job>, AppError> {
        let mut jobs = self.jobs.write().await;
        Ok(jobs.iter_mut().find(|j| j.id == id).map(|job| {
            job.status = status;
            job.updated_at = Utc::now();
            job.clone()
        }))
    }

    async fn begin_skill_generation(&self, id: Uuid) -> Result<Job, AppError> {
        self.update_where(id, SkillGenerationGuard::NotProcessing, |job| {
            job.skill_generation_status = SkillGenerationStatus::Processing;
            job.skill_generation_error = None;
        })
        .await
    }

    async fn complete_skill_generation(
        &self,
        id: Uuid,
        skills: &[String],
        top_skill: Option<&str>,
    ) -> Result<Job, AppError> {
        let skills = skills.to_vec();
        let top_skill = top_skill.map(String::from);
        self.update_where(id, SkillGenerationGuard::Processing, move |job| {
            job.required_skills = skills;
            job.top_skill = top_skill;
            job.skills_generated = true;
            job.skill_generation_status = SkillGenerationStatus::Done;
            job.skill_generation_error = None;
        })
        .await
    }

    async fn fail_skill_generation(&self, id: Uuid, error: &str) -> Result<Job, AppError> {
        let error = error.to_string();
        self.update_where(id, SkillGenerationGuard::Processing, move |job| {
            job.skill_generation_status = SkillGenerationStatus::Failed;
            job.skill_generation_error = Some(error);
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::store::PROCESSING_LEASE_SECS;

    fn new_job(title: &str, company: &str) -> NewJob {
        NewJob {
            title: title.to_string(),
            company: company.to_string(),
            description: format!("{title} at {company}"),
            location: None,
            experience: None,
            status: PostingStatus::Draft,
            required_skills: vec![],
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let store = MemoryJobStore::new();
        let job = store.insert(new_job("Backend Engineer", "Acme")).await.unwrap();
        let fetched = store.get(job.id).await.unwrap().unwrap();
        assert_eq!(fetched, job);
        assert!(store.get(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_newest_first_with_pagination() {
        let store = MemoryJobStore::new();
        for i in 0..5 {
            store
                .insert(new_job(&format!("Job {i}"), "Acme"))
                .await
                .unwrap();
        }
        let page = store
            .list(&JobQuery {
                page: 1,
                limit: 2,
                ..JobQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(page.total, 5);
        let titles: Vec<_> = page.jobs.iter().map(|j| j.title.as_str()).collect();
        assert_eq!(titles, vec!["Job 4", "Job 3"]);

        let last = store
            .list(&JobQuery {
                page: 3,
                limit: 2,
                ..JobQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(last.jobs.len(), 1);
        assert_eq!(last.jobs[0].title, "Job 0");
    }

    #[tokio::test]
    async fn test_generation_lifecycle() {
        let store = MemoryJobStore::new();
        let job = store.insert(new_job("Dev", "Acme")).await.unwrap();

        let processing = store.begin_skill_generation(job.id).await.unwrap();
        assert_eq!(processing.skill_generation_status, SkillGenerationStatus::Processing);

        let skills = vec!["Rust".to_string(), "Tokio".to_string()];
        let done = store
            .complete_skill_generation(job.id, &skills, Some("Rust"))
            .await
            .unwrap();
        assert_eq!(done.skill_generation_status, SkillGenerationStatus::Done);
        assert_eq!(done.required_skills, skills);
        assert_eq!(done.top_skill.as_deref(), Some("Rust"));
        assert!(done.skills_generated);
    }

    #[tokio::test]
    async fn test_begin_rejects_job_already_processing() {
        let store = MemoryJobStore::new();
        let job = store.insert(new_job("Dev", "Acme")).await.unwrap();
        store.begin_skill_generation(job.id).await.unwrap();

        let err = store.begin_skill_generation(job.id).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_terminal_state_cannot_be_completed_again() {
        let store = MemoryJobStore::new();
        let job = store.insert(new_job("Dev", "Acme")).await.unwrap();
        store.begin_skill_generation(job.id).await.unwrap();
        store.fail_skill_generation(job.id, "boom").await.unwrap();

        let err = store
            .complete_skill_generation(job.id, &[], None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        // A re-trigger restarts from processing and clears the error.
        let restarted = store.begin_skill_generation(job.id).await.unwrap();
        assert_eq!(restarted.skill_generation_status, SkillGenerationStatus::Processing);
        assert!(restarted.skill_generation_error.is_none());
    }

    #[tokio::test]
    async fn test_unknown_job_is_not_found() {
        let store = MemoryJobStore::new();
        let err = store.begin_skill_generation(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert!(store
            .set_posting_status(Uuid::new_v4(), PostingStatus::Active)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_abandoned_processing_run_is_taken_over() {
        let store = MemoryJobStore::new();
        let job = store.insert(new_job("Dev", "Acme")).await.unwrap();
        store.begin_skill_generation(job.id).await.unwrap();

        // Inside the lease the guard still holds.
        store
            .backdate(job.id, chrono::Duration::seconds(PROCESSING_LEASE_SECS - 60))
            .await;
        assert!(matches!(
            store.begin_skill_generation(job.id).await.unwrap_err(),
            AppError::Conflict(_)
        ));

        store
            .backdate(job.id, chrono::Duration::seconds(PROCESSING_LEASE_SECS))
            .await;
        let resumed = store.begin_skill_generation(job.id).await.unwrap();
        assert_eq!(resumed.skill_generation_status, SkillGenerationStatus::Processing);

        // The takeover refreshes the lease.
        assert!(store.begin_skill_generation(job.id).await.is_err());
    }
}
