#![allow(dead_code)]

use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use fmriprep_core::api::{
    AppConfig, BatchPaths, SchedulerClient, SchedulerFactory, SubmissionReceipt,
};

pub const CONFIG: &str = r#"
paths:
  fs_license: /opt/fs/license.txt
  tf_path: /opt/envs/fmriprep
cmds:
  activate_cmd: export PATH=/opt/envs/fmriprep/bin:$PATH
  tf_wcard: source {tf_path}/bin/activate
  cmd_wcard: fmriprep {bidspath} {outpath} participant --participant-label {subject} --fs-license-file {fs_license} -w {workpath} --output-spaces {output_spaces}
  slurm_pre_commands:
    - module purge
    - module load singularity
slurm:
  partition: general
  cpus_per_task: 8
"#;

pub fn config() -> Arc<AppConfig> {
    Arc::new(serde_yaml::from_str(CONFIG).unwrap())
}

pub fn config_with_template(cmd_wcard: &str) -> Arc<AppConfig> {
    let mut cfg: AppConfig = serde_yaml::from_str(CONFIG).unwrap();
    cfg.cmds.cmd_wcard = cmd_wcard.to_string();
    Arc::new(cfg)
}

pub fn batch_paths(root: &Path) -> BatchPaths {
    let log_dir = root.join("slurm_logs");
    std::fs::create_dir_all(&log_dir).unwrap();
    BatchPaths {
        bids_path: root.join("bids"),
        out_root: root.join("derivatives"),
        work_root: root.join("work"),
        log_dir,
    }
}

/// What a mock client saw when `sbatch` was called.
#[derive(Debug, Clone)]
pub struct SbatchCall {
    pub job_name: String,
    pub arguments: Vec<(String, String)>,
    pub commands: Vec<String>,
    pub command: String,
}

/// Scheduler that records submissions and rejects chosen job names.
#[derive(Clone, Default)]
pub struct MockScheduler {
    calls: Arc<Mutex<Vec<SbatchCall>>>,
    reject: HashSet<String>,
}

impl MockScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rejecting(job_names: &[&str]) -> Self {
        Self {
            calls: Arc::default(),
            reject: job_names.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn calls(&self) -> Vec<SbatchCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn submitted_jobs(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.job_name).collect()
    }
}

impl SchedulerFactory for MockScheduler {
    fn name(&self) -> &str {
        "mock"
    }

    fn create(&self, _options: &serde_yaml::Mapping) -> Box<dyn SchedulerClient> {
        Box::new(MockClient {
            calls: Arc::clone(&self.calls),
            reject: self.reject.clone(),
            arguments: Vec::new(),
            commands: Vec::new(),
        })
    }
}

struct MockClient {
    calls: Arc<Mutex<Vec<SbatchCall>>>,
    reject: HashSet<String>,
    arguments: Vec<(String, String)>,
    commands: Vec<String>,
}

impl MockClient {
    fn job_name(&self) -> String {
        self.arguments
            .iter()
            .rev()
            .find(|(k, _)| k == "job-name")
            .map(|(_, v)| v.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl SchedulerClient for MockClient {
    fn add_argument(&mut self, key: &str, value: &str) {
        self.arguments.push((key.to_string(), value.to_string()));
    }

    fn add_cmd(&mut self, cmd: &str) {
        self.commands.push(cmd.to_string());
    }

    fn render(&self, command: &str) -> anyhow::Result<String> {
        let mut out = String::new();
        for (k, v) in &self.arguments {
            out.push_str(&format!("#MOCK --{k}={v}\n"));
        }
        for c in &self.commands {
            out.push_str(c);
            out.push('\n');
        }
        out.push_str(command);
        Ok(out)
    }

    async fn sbatch(&mut self, command: &str) -> anyhow::Result<SubmissionReceipt> {
        let job_name = self.job_name();
        let mut calls = self.calls.lock().unwrap();
        calls.push(SbatchCall {
            job_name: job_name.clone(),
            arguments: self.arguments.clone(),
            commands: self.commands.clone(),
            command: command.to_string(),
        });
        if self.reject.contains(&job_name) {
            anyhow::bail!("sbatch: error: invalid partition specified");
        }
        Ok(SubmissionReceipt {
            job_id: Some(format!("{}", 1000 + calls.len())),
            submitted_at: chrono::Utc::now(),
        })
    }
}
