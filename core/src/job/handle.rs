use std::sync::Arc;

use serde::Serialize;

use super::command::CommandBuilder;
use super::spec::JobSpec;
use crate::config::AppConfig;
use crate::error::JobError;
use crate::scheduler::{SchedulerClient, SchedulerFactory, SubmissionReceipt};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Created,
    Configured,
    Submitted,
}

impl JobState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Configured => "configured",
            Self::Submitted => "submitted",
        }
    }
}

/// A single subject's scheduler submission.
///
/// Lifecycle: `Created` → `prepare` → `Configured` → `submit` → `Submitted`.
/// A submitted handle cannot be prepared or submitted again.
pub struct JobHandle {
    spec: JobSpec,
    cfg: Arc<AppConfig>,
    scheduler: Arc<dyn SchedulerFactory>,
    client: Option<Box<dyn SchedulerClient>>,
    command: Option<String>,
    state: JobState,
    receipt: Option<SubmissionReceipt>,
    message: Option<String>,
}

impl JobHandle {
    pub fn new(spec: JobSpec, cfg: Arc<AppConfig>, scheduler: Arc<dyn SchedulerFactory>) -> Self {
        Self {
            spec,
            cfg,
            scheduler,
            client: None,
            command: None,
            state: JobState::Created,
            receipt: None,
            message: None,
        }
    }

    pub fn spec(&self) -> &JobSpec {
        &self.spec
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    pub fn command(&self) -> Option<&str> {
        self.command.as_deref()
    }

    pub fn receipt(&self) -> Option<&SubmissionReceipt> {
        self.receipt.as_ref()
    }

    /// Build the command line and a fresh scheduler client carrying the
    /// log paths, the configured pre-commands and the activation command.
    ///
    /// Calling it again before submission replaces the previous build.
    pub fn prepare(
        &mut self,
        extra_flags: &[String],
        output_spaces: &[String],
    ) -> Result<(), JobError> {
        self.ensure_not_submitted()?;

        let cfg = Arc::clone(&self.cfg);
        let builder = CommandBuilder::new(&cfg, &self.spec);
        let command = builder.build(extra_flags, output_spaces)?;
        let activation = builder.activation_command()?;

        self.client = Some(self.new_client());
        self.configure(&cfg.cmds.slurm_pre_commands, &activation)?;

        self.command = Some(command);
        self.state = JobState::Configured;
        Ok(())
    }

    /// Append `pre_commands`, then `activation_command`, to the script.
    pub fn configure(
        &mut self,
        pre_commands: &[String],
        activation_command: &str,
    ) -> Result<(), JobError> {
        self.ensure_not_submitted()?;
        if self.client.is_none() {
            self.client = Some(self.new_client());
        }
        if let Some(client) = self.client.as_mut() {
            for cmd in pre_commands {
                client.add_cmd(cmd);
            }
            client.add_cmd(activation_command);
        }
        Ok(())
    }

    /// The batch script that `submit` would dispatch.
    pub fn script(&self) -> Result<String, JobError> {
        let (client, command) = self.configured_parts()?;
        client.render(command).map_err(|e| self.rejected(e))
    }

    pub async fn submit(&mut self) -> Result<(), JobError> {
        if self.state != JobState::Configured {
            return Err(self.state_error(JobState::Configured));
        }
        let (Some(client), Some(command)) = (self.client.as_mut(), self.command.as_deref()) else {
            return Err(self.state_error(JobState::Configured));
        };

        let receipt = match client.sbatch(command).await {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(job = %self.spec.job_name, error = %e, "submission rejected");
                return Err(self.rejected(e));
            }
        };

        let message = self.make_message(receipt.job_id.as_deref());
        tracing::info!(
            job = %self.spec.job_name,
            job_id = receipt.job_id.as_deref().unwrap_or("unknown"),
            "job submitted"
        );
        self.receipt = Some(receipt);
        self.message = Some(message);
        self.state = JobState::Submitted;
        Ok(())
    }

    /// Status message recorded by a successful `submit`.
    pub fn describe(&self) -> Result<&str, JobError> {
        self.message
            .as_deref()
            .ok_or_else(|| self.state_error(JobState::Submitted))
    }

    fn make_message(&self, job_id: Option<&str>) -> String {
        let id = job_id.map(|id| format!(" (id {id})")).unwrap_or_default();
        format!(
            "fMRIPrep job {}{id} submitted!\n  Outputs will be found at {}\n  Progress updated in {}\n  Errors will be reported at {}",
            self.spec.job_name,
            self.spec.out_path.display(),
            self.spec.stdout_path.display(),
            self.spec.stderr_path.display(),
        )
    }

    fn new_client(&self) -> Box<dyn SchedulerClient> {
        let mut client = self.scheduler.create(&self.cfg.slurm);
        client.add_argument("job-name", &self.spec.job_name);
        client.add_argument("output", &self.spec.stdout_path.to_string_lossy());
        client.add_argument("error", &self.spec.stderr_path.to_string_lossy());
        client
    }

    fn configured_parts(&self) -> Result<(&dyn SchedulerClient, &str), JobError> {
        match (self.state, self.client.as_deref(), self.command.as_deref()) {
            (JobState::Configured, Some(client), Some(command)) => Ok((client, command)),
            _ => Err(self.state_error(JobState::Configured)),
        }
    }

    fn ensure_not_submitted(&self) -> Result<(), JobError> {
        if self.state == JobState::Submitted {
            return Err(self.state_error(JobState::Configured));
        }
        Ok(())
    }

    fn state_error(&self, expected: JobState) -> JobError {
        JobError::State {
            job_name: self.spec.job_name.clone(),
            expected: expected.as_str(),
            actual: self.state.as_str(),
        }
    }

    fn rejected(&self, e: anyhow::Error) -> JobError {
        JobError::Submission {
            subject: self.spec.subject_id.clone(),
            detail: format!("{e:#}"),
        }
    }
}
