//! Background job scheduling.
//!
//! Each registered job runs on its own interval task. A watch channel fans
//! the shutdown signal out to every runner; `wait_for_shutdown` then joins
//! them with a deadline so a wedged job cannot stall process exit.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

/// How often a job runs.
#[derive(Debug, Clone, Copy)]
pub enum JobFrequency {
    /// Every N seconds.
    Seconds(u64),
    /// Every N minutes.
    Minutes(u64),
    /// Every hour.
    Hourly,
}

impl JobFrequency {
    /// Interval between runs.
    pub fn period(&self) -> Duration {
        match self {
            JobFrequency::Seconds(secs) => Duration::from_secs(*secs),
            JobFrequency::Minutes(mins) => Duration::from_secs(*mins * 60),
            JobFrequency::Hourly => Duration::from_secs(3600),
        }
    }
}

/// A background job the scheduler can run.
#[async_trait::async_trait]
pub trait Job: Send + Sync {
    /// Job name used in logs and metrics.
    fn name(&self) -> &'static str;

    /// How often the job runs.
    fn frequency(&self) -> JobFrequency;

    /// One run of the job. A failed run is logged and counted; the schedule
    /// keeps going.
    async fn execute(&self) -> anyhow::Result<()>;
}

/// Runs registered jobs until shutdown.
pub struct JobScheduler {
    jobs: Vec<Arc<dyn Job>>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl JobScheduler {
    pub fn new() -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            jobs: Vec::new(),
            shutdown_tx,
            shutdown_rx,
            handles: Vec::new(),
        }
    }

    /// Registers a job. Takes effect on the next `start`.
    pub fn register<J: Job + 'static>(&mut self, job: J) {
        self.jobs.push(Arc::new(job));
    }

    /// Spawns one runner task per registered job.
    pub fn start(&mut self) {
        info!("Starting job scheduler with {} jobs", self.jobs.len());

        for job in &self.jobs {
            let handle = tokio::spawn(run_job(Arc::clone(job), self.shutdown_rx.clone()));
            self.handles.push(handle);
        }
    }

    /// Signals every runner to stop. Returns immediately.
    pub fn shutdown(&self) {
        info!("Initiating job scheduler shutdown");
        let _ = self.shutdown_tx.send(true);
    }

    /// Waits for all runners to finish, up to `timeout`.
    pub async fn wait_for_shutdown(self, timeout: Duration) {
        info!("Waiting for jobs to complete (timeout: {:?})", timeout);

        let drain = async {
            for handle in self.handles {
                if let Err(e) = handle.await {
                    warn!("Job task panicked: {}", e);
                }
            }
        };

        match tokio::time::timeout(timeout, drain).await {
            Ok(()) => info!("All jobs completed gracefully"),
            Err(_) => warn!("Job shutdown timed out after {:?}", timeout),
        }
    }
}

impl Default for JobScheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// Interval loop for a single job. The immediate first tick is consumed so
/// jobs start one full period after boot; missed ticks are skipped rather
/// than bursted.
async fn run_job(job: Arc<dyn Job>, mut shutdown_rx: watch::Receiver<bool>) {
    let frequency = job.frequency();
    let mut ticker = tokio::time::interval(frequency.period());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker.tick().await;

    info!(job = job.name(), frequency = ?frequency, "Job scheduled");

    loop {
        tokio::select! {
            _ = ticker.tick() => execute_once(job.as_ref()).await,
            _ = shutdown_rx.changed() => {
                if *shutdown_rx.borrow() {
                    info!(job = job.name(), "Job stopping");
                    break;
                }
            }
        }
    }
}

async fn execute_once(job: &dyn Job) {
    let name = job.name();
    let started = Instant::now();

    match job.execute().await {
        Ok(()) => {
            info!(
                job = name,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Job run completed"
            );
            metrics::counter!("jobs_executed_total", "job" => name, "outcome" => "ok")
                .increment(1);
        }
        Err(e) => {
            error!(
                job = name,
                elapsed_ms = started.elapsed().as_millis() as u64,
                error = %e,
                "Job run failed"
            );
            metrics::counter!("jobs_executed_total", "job" => name, "outcome" => "error")
                .increment(1);
        }
    }
}
