//! Background skill-generation task: extraction + ranking for one job,
//! with every state change written to the job store.

use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info};
use uuid::Uuid;

use crate::config::SkillBounds;
use crate::errors::AppError;
use crate::jobs::store::JobStore;
use crate::skills::extraction::SkillExtractor;
use crate::skills::ranking::top_skill;
use crate::skills::SkillContext;

/// Result of one run, as returned by the manual trigger endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillGenerationOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skills: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_skill: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SkillGenerationOutcome {
    fn succeeded(skills: Vec<String>, top_skill: Option<String>) -> Self {
        Self {
            success: true,
            skills: Some(skills),
            top_skill,
            error: None,
        }
    }

    fn failed(error: String) -> Self {
        Self {
            success: false,
            skills: None,
            top_skill: None,
            error: Some(error),
        }
    }
}

pub struct SkillGenerationTask {
    store: Arc<dyn JobStore>,
    extractor: Arc<dyn SkillExtractor>,
    bounds: SkillBounds,
}

impl SkillGenerationTask {
    pub fn new(
        store: Arc<dyn JobStore>,
        extractor: Arc<dyn SkillExtractor>,
        bounds: SkillBounds,
    ) -> Self {
        Self {
            store,
            extractor,
            bounds,
        }
    }

    /// Runs generation for `job_id`.
    ///
    /// `Err` only when the run could not start (unknown job, or a run already
    /// processing). Once started, failures are recorded on the job and reported
    /// as an unsuccessful outcome; nothing is retried.
    pub async fn run(
        &self,
        job_id: Uuid,
        context: &SkillContext,
    ) -> Result<SkillGenerationOutcome, AppError> {
        self.store.begin_skill_generation(job_id).await?;
        info!("Skill generation started for job {job_id}");

        match self.generate(job_id, context).await {
            Ok((skills, top_skill)) => {
                info!(
                    "Skill generation done for job {job_id}: {} skills, top skill {:?}",
                    skills.len(),
                    top_skill
                );
                Ok(SkillGenerationOutcome::succeeded(skills, top_skill))
            }
            Err(e) => {
                let message = e.to_string();
                error!("Skill generation failed for job {job_id}: {message}");
                if let Err(store_err) = self.store.fail_skill_generation(job_id, &message).await {
                    error!("Could not record skill generation failure for job {job_id}: {store_err}");
                }
                Ok(SkillGenerationOutcome::failed(message))
            }
        }
    }

    async fn generate(
        &self,
        job_id: Uuid,
        context: &SkillContext,
    ) -> Result<(Vec<String>, Option<String>), AppError> {
        let skills = self
            .extractor
            .extract(&context.extraction_text(), self.bounds)
            .await?;
        let top_skill = top_skill(&skills, context);

        self.store
            .complete_skill_generation(job_id, &skills, top_skill.as_deref())
            .await?;

        Ok((skills, top_skill))
    }
}
