//! Watches one job on a running API until its skills are generated.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

use hirewise::config::PollConfig;
use hirewise::poller::{HttpJobFetcher, JobPoller, PopulatedJobs};

#[derive(Parser, Debug)]
#[command(name = "hirewise-watch", version)]
#[command(about = "Poll a HireWise job until its skills are ready")]
struct Cli {
    /// Id of the job to watch.
    job_id: Uuid,

    #[arg(long, env = "HIREWISE_API_URL", default_value = "http://localhost:8080")]
    base_url: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("hirewise=warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = PollConfig::from_env()?;
    let fetcher = HttpJobFetcher::new(&cli.base_url).context("Failed to build HTTP client")?;
    let poller = JobPoller::new(Arc::new(fetcher), PopulatedJobs::new(), config);
    let mut updates = poller.subscribe();

    poller.start(cli.job_id, None);
    loop {
        let state = updates.borrow_and_update().clone();
        if let Some(job) = &state.job {
            eprintln!(
                "job {}: skill generation {}",
                job.id,
                job.skill_generation_status.as_str()
            );
        }
        if !state.loading {
            break;
        }
        updates
            .changed()
            .await
            .context("Poller stopped unexpectedly")?;
    }

    let state = poller.state();
    match state.job {
        Some(job) if job.has_generated_skills() => {
            println!("{}", serde_json::to_string_pretty(&job)?);
            Ok(())
        }
        Some(job) => bail!(
            "Job {} has no skills yet ({}): {}",
            job.id,
            job.skill_generation_status.as_str(),
            state.error.unwrap_or_else(|| "timed out".to_string())
        ),
        None => bail!(
            "Could not fetch job {}: {}",
            cli.job_id,
            state.error.unwrap_or_else(|| "timed out".to_string())
        ),
    }
}
