use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// What the scheduler reported back for an accepted job.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionReceipt {
    pub job_id: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

/// One pending batch submission.
///
/// Arguments and commands accumulate until `sbatch` dispatches the script.
#[async_trait]
pub trait SchedulerClient: Send {
    /// Set a scheduler option, replacing any earlier value for the same key.
    fn add_argument(&mut self, key: &str, value: &str);
    /// Queue a script line to run before the main command.
    fn add_cmd(&mut self, cmd: &str);
    /// The script `sbatch` would receive for `command`.
    fn render(&self, command: &str) -> anyhow::Result<String>;
    async fn sbatch(&mut self, command: &str) -> anyhow::Result<SubmissionReceipt>;
}

pub trait SchedulerFactory: Send + Sync {
    fn name(&self) -> &str;
    /// Build a client from the configuration's `slurm` options.
    fn create(&self, options: &serde_yaml::Mapping) -> Box<dyn SchedulerClient>;
}
