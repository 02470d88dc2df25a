use std::path::PathBuf;

use thiserror::Error;

use super::template::TemplateError;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("job error: {0}")]
    Job(#[from] JobError),
    #[error("command failed: {0}")]
    Command(String),
    #[error("config error: {0}")]
    Config(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

#[derive(Error, Debug)]
pub enum JobError {
    #[error("config error: {0}")]
    Config(String),

    #[error("missing config section '{0}'")]
    MissingSection(String),

    #[error("cannot create {}: {source}", .path.display())]
    Filesystem {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid subject id '{0}': must be a single non-empty path segment")]
    InvalidSubject(String),

    #[error("template error: {0}")]
    Template(#[from] TemplateError),

    #[error("submission of subject '{subject}' rejected: {detail}")]
    Submission { subject: String, detail: String },

    #[error("job '{job_name}' is {actual}, expected {expected}")]
    State {
        job_name: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error(
        "batch aborted at subject '{subject}' after submitting [{}]: {source}",
        .submitted.join(", ")
    )]
    BatchAborted {
        subject: String,
        submitted: Vec<String>,
        source: Box<JobError>,
    },
}

impl JobError {
    pub fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            source,
        }
    }

    /// The innermost error, looking through `BatchAborted`.
    pub fn root(&self) -> &JobError {
        match self {
            Self::BatchAborted { source, .. } => source.root(),
            other => other,
        }
    }
}
