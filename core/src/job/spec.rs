use std::path::{Component, Path, PathBuf};

use serde::Serialize;

use crate::error::JobError;

/// Subject id meaning "every participant in the dataset".
pub const ALL_SUBJECTS: &str = "allsubs";

/// Base locations shared by every subject in a batch.
#[derive(Debug, Clone, Serialize)]
pub struct BatchPaths {
    pub bids_path: PathBuf,
    pub out_root: PathBuf,
    pub work_root: PathBuf,
    pub log_dir: PathBuf,
}

/// Resolved paths and derived names for one subject.
#[derive(Debug, Clone, Serialize)]
pub struct JobSpec {
    pub subject_id: String,
    pub bids_path: PathBuf,
    pub out_path: PathBuf,
    pub work_path: PathBuf,
    pub log_dir: PathBuf,
    pub job_name: String,
    pub stdout_path: PathBuf,
    pub stderr_path: PathBuf,
}

impl JobSpec {
    /// Resolve paths for `subject_id` and create its output and work
    /// directories. Existing directories are left as they are.
    pub fn new(subject_id: &str, paths: &BatchPaths) -> Result<Self, JobError> {
        validate_subject(subject_id)?;

        let job_name = format!("fmriprep_{subject_id}");
        let spec = Self {
            subject_id: subject_id.to_string(),
            bids_path: paths.bids_path.clone(),
            out_path: paths.out_root.join(subject_id),
            work_path: paths.work_root.join(subject_id),
            log_dir: paths.log_dir.clone(),
            stdout_path: paths.log_dir.join(format!("{job_name}.out")),
            stderr_path: paths.log_dir.join(format!("{job_name}.err")),
            job_name,
        };

        spec.make_dirs()?;
        if !spec.log_dir.is_dir() {
            tracing::warn!(
                log_dir = %spec.log_dir.display(),
                "scheduler log directory does not exist; job output will be lost"
            );
        }
        Ok(spec)
    }

    pub fn selects_all_subjects(&self) -> bool {
        self.subject_id == ALL_SUBJECTS
    }

    fn make_dirs(&self) -> Result<(), JobError> {
        for dir in [&self.out_path, &self.work_path] {
            std::fs::create_dir_all(dir).map_err(|e| JobError::filesystem(dir.clone(), e))?;
        }
        Ok(())
    }
}

fn validate_subject(subject_id: &str) -> Result<(), JobError> {
    let mut components = Path::new(subject_id).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(seg)), None) if seg == subject_id => Ok(()),
        _ => Err(JobError::InvalidSubject(subject_id.to_string())),
    }
}
