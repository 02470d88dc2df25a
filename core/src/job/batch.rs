use std::sync::Arc;

use serde::Serialize;

use super::handle::{JobHandle, JobState};
use super::spec::{BatchPaths, JobSpec};
use crate::config::AppConfig;
use crate::error::JobError;
use crate::scheduler::SchedulerFactory;

/// How `submit_all` reacts to a rejected submission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SubmitMode {
    /// Stop at the first failure.
    #[default]
    FailFast,
    /// Record the failure and move on to the next subject.
    BestEffort,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmittedJob {
    pub subject: String,
    pub job_name: String,
    pub job_id: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailedJob {
    pub subject: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub submitted: Vec<SubmittedJob>,
    pub failed: Vec<FailedJob>,
}

impl BatchReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// One `JobHandle` per subject, processed in the order subjects were added.
pub struct BatchCoordinator {
    cfg: Arc<AppConfig>,
    paths: BatchPaths,
    scheduler: Arc<dyn SchedulerFactory>,
    handles: Vec<JobHandle>,
}

impl BatchCoordinator {
    pub fn new(
        cfg: Arc<AppConfig>,
        paths: BatchPaths,
        scheduler: Arc<dyn SchedulerFactory>,
    ) -> Self {
        Self {
            cfg,
            paths,
            scheduler,
            handles: Vec::new(),
        }
    }

    pub fn handles(&self) -> &[JobHandle] {
        &self.handles
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Resolve a `JobSpec` (creating its directories) and a handle for each
    /// subject. Subjects already in the batch are skipped.
    pub fn add_subjects<I, S>(&mut self, subjects: I) -> Result<(), JobError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for subject in subjects {
            let subject = subject.as_ref();
            if self.handles.iter().any(|h| h.spec().subject_id == subject) {
                tracing::warn!(subject, "duplicate subject ignored");
                continue;
            }
            let spec = JobSpec::new(subject, &self.paths)?;
            self.handles.push(JobHandle::new(
                spec,
                Arc::clone(&self.cfg),
                Arc::clone(&self.scheduler),
            ));
        }
        Ok(())
    }

    pub fn build_all(
        &mut self,
        extra_flags: &[String],
        output_spaces: &[String],
    ) -> Result<(), JobError> {
        for handle in &mut self.handles {
            handle.prepare(extra_flags, output_spaces)?;
        }
        tracing::debug!(jobs = self.handles.len(), "batch built");
        Ok(())
    }

    /// `(job_name, script)` for every handle, without submitting anything.
    pub fn scripts(&self) -> Result<Vec<(String, String)>, JobError> {
        self.handles
            .iter()
            .map(|h| Ok((h.spec().job_name.clone(), h.script()?)))
            .collect()
    }

    /// Submit every handle in order.
    ///
    /// Handles already submitted by an earlier call are reported but not
    /// dispatched again. In `FailFast` mode the first error stops the batch
    /// and is returned as `BatchAborted`, naming the subjects that did go out.
    pub async fn submit_all(&mut self, mode: SubmitMode) -> Result<BatchReport, JobError> {
        if self.handles.is_empty() {
            tracing::warn!("no subjects to submit");
        }

        let mut report = BatchReport::default();
        for handle in &mut self.handles {
            if handle.state() != JobState::Submitted {
                if let Err(e) = handle.submit().await {
                    let subject = handle.spec().subject_id.clone();
                    match mode {
                        SubmitMode::FailFast => {
                            return Err(JobError::BatchAborted {
                                subject,
                                submitted: report
                                    .submitted
                                    .into_iter()
                                    .map(|j| j.subject)
                                    .collect(),
                                source: Box::new(e),
                            });
                        }
                        SubmitMode::BestEffort => {
                            tracing::warn!(subject = %subject, error = %e, "continuing past failed submission");
                            report.failed.push(FailedJob {
                                subject,
                                error: e.to_string(),
                            });
                            continue;
                        }
                    }
                }
            }

            report.submitted.push(SubmittedJob {
                subject: handle.spec().subject_id.clone(),
                job_name: handle.spec().job_name.clone(),
                job_id: handle.receipt().and_then(|r| r.job_id.clone()),
                message: handle.describe()?.to_string(),
            });
        }

        tracing::info!(
            submitted = report.submitted.len(),
            failed = report.failed.len(),
            "batch submission finished"
        );
        Ok(report)
    }

    /// Status messages of submitted handles, in batch order.
    pub fn messages(&self) -> Vec<&str> {
        self.handles
            .iter()
            .filter_map(|h| h.describe().ok())
            .collect()
    }
}
