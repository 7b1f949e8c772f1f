use crate::geo::{self, GeoCache};
use crate::models::ClickContext;
use crate::registry::Registry;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Background job types
#[derive(Debug)]
pub enum Job {
    /// Record a click event for a shortcode
    RecordClick {
        short_code: String,
        context: ClickContext,
    },
}

/// Background worker configuration
#[derive(Clone)]
pub struct WorkerConfig {
    /// Maximum retries for failed jobs
    pub max_retries: u32,
    /// Backoff duration between retries
    pub retry_delay_ms: u64,
    /// Whether to resolve client IPs to locations
    pub geo_lookup_enabled: bool,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay_ms: 1000,
            geo_lookup_enabled: false,
        }
    }
}

/// Background job worker.
///
/// Click recording is best-effort: a job that still fails after its retries
/// is logged and dropped, it never feeds back into the redirect path.
pub struct Worker {
    registry: Arc<dyn Registry>,
    geo_cache: GeoCache,
    receiver: mpsc::UnboundedReceiver<Job>,
    config: WorkerConfig,
}

impl Worker {
    /// Create a new worker
    pub fn new(registry: Arc<dyn Registry>, receiver: mpsc::UnboundedReceiver<Job>) -> Self {
        Self {
            registry,
            geo_cache: GeoCache::new(),
            receiver,
            config: WorkerConfig::default(),
        }
    }

    /// Set worker configuration
    pub fn with_config(mut self, config: WorkerConfig) -> Self {
        self.config = config;
        self
    }

    /// Run the worker - processes jobs until channel closes
    pub async fn run(mut self) {
        info!("Click worker started");

        while let Some(job) = self.receiver.recv().await {
            self.process_job(job).await;
        }

        info!("Click worker stopped");
    }

    /// Process a single job with retries
    async fn process_job(&self, job: Job) {
        let mut retries = 0;

        loop {
            match self.execute_job(&job).await {
                Ok(_) => {
                    break;
                }
                Err(e) if retries < self.config.max_retries => {
                    retries += 1;
                    let delay = std::time::Duration::from_millis(self.config.retry_delay_ms);
                    warn!(
                        "Job failed (attempt {}/{}), retrying in {:?}: {} - {:?}",
                        retries, self.config.max_retries, delay, e, job
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(_e) => {
                    error!(
                        "Job dropped after {} retries: {:?}",
                        self.config.max_retries, job
                    );
                    break;
                }
            }
        }
    }

    /// Execute a job without retries
    async fn execute_job(&self, job: &Job) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        match job {
            Job::RecordClick {
                short_code,
                context,
            } => {
                let location = geo::resolve_location(
                    context.client_ip.as_deref(),
                    &self.geo_cache,
                    self.config.geo_lookup_enabled,
                )
                .await;

                let event = context.clone().into_event(location);

                // The code may have been swept between redirect and append;
                // a missing entry is a silent no-op, not a retryable failure
                let appended = self.registry.append_click(short_code, event).await?;
                if !appended {
                    debug!("Click for swept shortcode '{}' discarded", short_code);
                }
                Ok(())
            }
        }
    }
}

/// Job sender - used to submit jobs to the worker
#[derive(Clone)]
pub struct JobSender {
    sender: mpsc::UnboundedSender<Job>,
}

impl JobSender {
    /// Create a new job sender
    pub fn new(sender: mpsc::UnboundedSender<Job>) -> Self {
        Self { sender }
    }

    /// Submit a job to be processed asynchronously
    pub fn send(&self, job: Job) {
        if self.sender.send(job).is_err() {
            error!("Failed to send job to worker - channel may be closed");
        }
    }

    /// Submit a click-recording job
    pub fn record_click(&self, short_code: String, context: ClickContext) {
        self.send(Job::RecordClick {
            short_code,
            context,
        });
    }
}

/// Create a new job sender and receiver pair
pub fn create_job_channel() -> (JobSender, mpsc::UnboundedReceiver<Job>) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (JobSender::new(sender), receiver)
}
