use std::process::Stdio;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::script::BatchScript;
use super::traits::{SchedulerClient, SchedulerFactory, SubmissionReceipt};
use crate::config::SchedulerConfig;

lazy_static! {
    static ref JOB_ID_RE: Regex = Regex::new(r"Submitted batch job (\d+)").unwrap();
}

/// Extract the numeric job id from `sbatch` stdout.
pub fn parse_job_id(stdout: &str) -> Option<String> {
    JOB_ID_RE
        .captures(stdout)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Creates `sbatch`-backed clients.
pub struct SlurmFactory {
    cfg: SchedulerConfig,
}

impl SlurmFactory {
    pub fn new(cfg: SchedulerConfig) -> Self {
        Self { cfg }
    }
}

impl Default for SlurmFactory {
    fn default() -> Self {
        Self::new(SchedulerConfig::default())
    }
}

impl SchedulerFactory for SlurmFactory {
    fn name(&self) -> &str {
        "slurm"
    }

    fn create(&self, options: &serde_yaml::Mapping) -> Box<dyn SchedulerClient> {
        Box::new(SlurmClient::new(&self.cfg, options.clone()))
    }
}

/// Accumulates options and script lines, then pipes the script to `sbatch`.
///
/// Options are validated when the script is rendered, so a malformed
/// `slurm` section surfaces as a rejected submission.
pub struct SlurmClient {
    sbatch_bin: String,
    sbatch_args: Vec<String>,
    shell: String,
    options: serde_yaml::Mapping,
    arguments: Vec<(String, String)>,
    commands: Vec<String>,
}

impl SlurmClient {
    pub fn new(cfg: &SchedulerConfig, options: serde_yaml::Mapping) -> Self {
        Self {
            sbatch_bin: cfg.sbatch_bin.clone(),
            sbatch_args: cfg.sbatch_args.clone(),
            shell: cfg.shell.clone(),
            options,
            arguments: Vec::new(),
            commands: Vec::new(),
        }
    }

    fn script(&self) -> Result<BatchScript> {
        let mut script = BatchScript::new(self.shell.clone()).with_options(&self.options)?;
        for (key, value) in &self.arguments {
            script.set(key, Some(value.clone()))?;
        }
        for cmd in &self.commands {
            script.push_command(cmd.clone());
        }
        Ok(script)
    }
}

#[async_trait]
impl SchedulerClient for SlurmClient {
    fn add_argument(&mut self, key: &str, value: &str) {
        self.arguments.push((key.to_string(), value.to_string()));
    }

    fn add_cmd(&mut self, cmd: &str) {
        self.commands.push(cmd.to_string());
    }

    fn render(&self, command: &str) -> Result<String> {
        Ok(self.script()?.render(command))
    }

    async fn sbatch(&mut self, command: &str) -> Result<SubmissionReceipt> {
        let script = self.render(command)?;

        let mut child = Command::new(&self.sbatch_bin)
            .args(&self.sbatch_args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("failed to spawn '{}'", self.sbatch_bin))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| anyhow!("sbatch stdin unavailable"))?;
        stdin.write_all(script.as_bytes()).await?;
        stdin.shutdown().await?;
        drop(stdin);

        let output = child.wait_with_output().await?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        if !output.status.success() {
            let detail = if !stderr.trim().is_empty() {
                stderr.trim().to_string()
            } else if !stdout.trim().is_empty() {
                stdout.trim().to_string()
            } else {
                "no error output from sbatch".to_string()
            };
            bail!(
                "{} exited with {}: {detail}",
                self.sbatch_bin,
                output
                    .status
                    .code()
                    .map_or_else(|| "signal".to_string(), |c| c.to_string())
            );
        }

        let job_id = parse_job_id(&stdout);
        if job_id.is_none() {
            tracing::warn!(stdout = %stdout.trim(), "could not parse job id from sbatch output");
        }
        Ok(SubmissionReceipt {
            job_id,
            submitted_at: chrono::Utc::now(),
        })
    }
}
