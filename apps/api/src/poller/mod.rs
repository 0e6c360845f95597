//! Client-side poller that waits for a job's skills to be generated.
//!
//! The API answers job creation before skill generation has run, so clients
//! re-fetch the job until skill data shows up, the run fails, or the poll
//! times out. Progress is published on a `watch` channel.

pub mod cache;
pub mod fetcher;

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, timeout, MissedTickBehavior};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::PollConfig;
use crate::models::job::{Job, SkillGenerationStatus};

pub use cache::PopulatedJobs;
pub use fetcher::{HttpJobFetcher, JobFetcher, PollError};

/// Floor for the poll period; `tokio::time::interval` rejects zero.
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// What observers of a poller see.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PollState {
    /// Latest job record received.
    pub job: Option<Job>,
    pub loading: bool,
    /// Last fetch or generation error; cleared by the next successful fetch.
    pub error: Option<String>,
}

pub struct JobPoller {
    fetcher: Arc<dyn JobFetcher>,
    populated: PopulatedJobs,
    config: PollConfig,
    state: Arc<watch::Sender<PollState>>,
    active: Mutex<Option<JoinHandle<()>>>,
}

impl JobPoller {
    pub fn new(fetcher: Arc<dyn JobFetcher>, populated: PopulatedJobs, config: PollConfig) -> Self {
        let (state, _) = watch::channel(PollState::default());
        Self {
            fetcher,
            populated,
            config,
            state: Arc::new(state),
            active: Mutex::new(None),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<PollState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> PollState {
        self.state.borrow().clone()
    }

    pub fn is_active(&self) -> bool {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Starts watching `job_id`. Returns false, doing nothing, while a
    /// previous start is still running.
    ///
    /// A `known` job that already carries skills, or an id in the populated
    /// cache, gets a single refresh instead of a polling loop.
    pub fn start(&self, job_id: Uuid, known: Option<&Job>) -> bool {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        if active.as_ref().is_some_and(|handle| !handle.is_finished()) {
            debug!("Poller already active; ignoring start for job {job_id}");
            return false;
        }

        let known_populated = known.is_some_and(Job::has_generated_skills);
        if known_populated {
            self.populated.insert(job_id);
        }
        let single_fetch = known_populated || self.populated.contains(job_id);

        self.state.send_modify(|state| {
            state.loading = true;
            state.error = None;
            state.job = match known {
                Some(job) => Some(job.clone()),
                None => state.job.take().filter(|job| job.id == job_id),
            };
        });

        let run = PollRun {
            job_id,
            fetcher: self.fetcher.clone(),
            populated: self.populated.clone(),
            state: self.state.clone(),
        };
        let config = self.config;
        *active = Some(tokio::spawn(async move {
            if single_fetch {
                run.fetch_once().await;
            } else {
                run.poll_until_ready(config).await;
            }
            run.state.send_modify(|state| state.loading = false);
        }));
        true
    }

    /// Aborts the running loop along with any in-flight request.
    pub fn stop(&self) {
        let handle = self
            .active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            handle.abort();
            self.state.send_modify(|state| state.loading = false);
        }
    }
}

impl Drop for JobPoller {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Everything one spawned poll needs, detached from the poller itself.
struct PollRun {
    job_id: Uuid,
    fetcher: Arc<dyn JobFetcher>,
    populated: PopulatedJobs,
    state: Arc<watch::Sender<PollState>>,
}

impl PollRun {
    async fn fetch_once(&self) {
        self.fetch_and_publish().await;
    }

    async fn poll_until_ready(&self, config: PollConfig) {
        let ticks = async {
            let mut ticker = interval(config.interval.max(MIN_POLL_INTERVAL));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if self.fetch_and_publish().await {
                    break;
                }
            }
        };

        if timeout(config.timeout, ticks).await.is_err() {
            warn!(
                "Gave up polling job {} after {:?}",
                self.job_id, config.timeout
            );
        }
    }

    /// Fetches once and publishes the result. Returns true when polling
    /// should stop.
    async fn fetch_and_publish(&self) -> bool {
        match self.fetcher.fetch(self.job_id).await {
            Ok(job) => {
                let populated = job.has_generated_skills();
                let failure = (job.skill_generation_status == SkillGenerationStatus::Failed)
                    .then(|| {
                        let reason = job.skill_generation_error.as_deref().unwrap_or("unknown error");
                        format!("Skill generation failed: {reason}")
                    });

                if populated {
                    self.populated.insert(self.job_id);
                    info!("Job {} has skills", self.job_id);
                }
                let stop = populated || failure.is_some();
                self.state.send_modify(|state| {
                    state.job = Some(job);
                    state.error = failure;
                });
                stop
            }
            Err(e) => {
                warn!("Fetching job {} failed: {e}", self.job_id);
                self.state.send_modify(|state| state.error = Some(e.to_string()));
                false
            }
        }
    }
}
