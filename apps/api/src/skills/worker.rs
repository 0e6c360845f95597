use std::sync::Arc;

use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::skills::task::SkillGenerationTask;
use crate::skills::SkillContext;

/// One queued skill-generation run.
#[derive(Debug, Clone)]
pub struct SkillGenerationRequest {
    pub job_id: Uuid,
    pub context: SkillContext,
}

/// Sending half of the skill-generation queue, held by request handlers.
/// Enqueueing never blocks or awaits.
#[derive(Clone)]
pub struct SkillQueue {
    sender: mpsc::UnboundedSender<SkillGenerationRequest>,
}

impl SkillQueue {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<SkillGenerationRequest>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    /// Returns false when the worker is gone; the job then stays pending
    /// until someone triggers generation manually.
    pub fn enqueue(&self, job_id: Uuid, context: SkillContext) -> bool {
        match self.sender.send(SkillGenerationRequest { job_id, context }) {
            Ok(()) => true,
            Err(_) => {
                error!("Skill queue is closed; job {job_id} was not scheduled");
                false
            }
        }
    }
}

/// Background worker draining the skill queue.
///
/// Each request runs in its own spawned task once a semaphore permit is
/// available, so at most `concurrency` generations are in flight.
pub struct SkillWorker {
    task: Arc<SkillGenerationTask>,
    receiver: mpsc::UnboundedReceiver<SkillGenerationRequest>,
    semaphore: Arc<Semaphore>,
}

impl SkillWorker {
    pub fn new(
        task: Arc<SkillGenerationTask>,
        receiver: mpsc::UnboundedReceiver<SkillGenerationRequest>,
        concurrency: usize,
    ) -> Self {
        Self {
            task,
            receiver,
            semaphore: Arc::new(Semaphore::new(concurrency.max(1))),
        }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Runs until every `SkillQueue` handle has been dropped.
    pub async fn run(mut self) {
        info!("Skill worker started");

        while let Some(request) = self.receiver.recv().await {
            let permit = match self.semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    error!("Skill worker failed to acquire semaphore: {e}");
                    break;
                }
            };

            let task = self.task.clone();
            tokio::spawn(async move {
                let job_id = request.job_id;
                match task.run(job_id, &request.context).await {
                    Ok(outcome) if outcome.success => {
                        info!("Background skill generation finished for job {job_id}")
                    }
                    Ok(outcome) => warn!(
                        "Background skill generation failed for job {job_id}: {}",
                        outcome.error.unwrap_or_default()
                    ),
                    Err(AppError::Conflict(msg)) => info!("Skipping queued run: {msg}"),
                    Err(e) => error!("Background skill generation for job {job_id} did not start: {e}"),
                }
                drop(permit);
            });
        }

        info!("Skill queue closed; worker stopped");
    }
}
