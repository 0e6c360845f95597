use std::sync::Arc;

use crate::config::Config;
use crate::jobs::store::JobStore;
use crate::llm_client::TextProvider;
use crate::skills::extraction::SkillExtractor;
use crate::skills::task::SkillGenerationTask;
use crate::skills::worker::{SkillQueue, SkillWorker};

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Pluggable job store. Postgres when DATABASE_URL is set, otherwise in-memory.
    pub jobs: Arc<dyn JobStore>,
    /// `None` when no LLM_API_KEY is configured.
    pub text_provider: Option<Arc<dyn TextProvider>>,
    /// Used directly by the manual generate-skills endpoint.
    pub skill_task: Arc<SkillGenerationTask>,
    /// Feeds the background worker after job creation.
    pub skill_queue: SkillQueue,
    pub config: Config,
}

impl AppState {
    /// Wires the skill pipeline. The returned worker must be spawned for
    /// queued generations to run.
    pub fn build(
        jobs: Arc<dyn JobStore>,
        text_provider: Option<Arc<dyn TextProvider>>,
        extractor: Arc<dyn SkillExtractor>,
        config: Config,
    ) -> (Self, SkillWorker) {
        let skill_task = Arc::new(SkillGenerationTask::new(
            jobs.clone(),
            extractor,
            config.skills,
        ));
        let (skill_queue, receiver) = SkillQueue::channel();
        let worker = SkillWorker::new(
            skill_task.clone(),
            receiver,
            config.skill_worker_concurrency,
        );

        let state = AppState {
            jobs,
            text_provider,
            skill_task,
            skill_queue,
            config,
        };
        (state, worker)
    }
}
