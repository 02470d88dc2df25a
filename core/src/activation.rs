//! Shell-profile activation.
//!
//! Appends the environment activation line to a profile file (normally
//! `~/.bashrc`) unless an identical line is already there, then optionally
//! re-sources the profile. The target file is injectable so tests never
//! touch a real user environment.

use std::io::Write;
use std::path::{Path, PathBuf};

use tokio::process::Command;

use crate::error::JobError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationOutcome {
    Added,
    AlreadyPresent,
}

pub struct EnvActivator {
    profile: PathBuf,
    source_shell: Option<String>,
}

impl EnvActivator {
    pub fn new(profile: impl Into<PathBuf>) -> Self {
        Self {
            profile: profile.into(),
            source_shell: None,
        }
    }

    /// `~/.bashrc` of the current user.
    pub fn default_profile() -> Result<PathBuf, JobError> {
        dirs::home_dir()
            .map(|home| home.join(".bashrc"))
            .ok_or_else(|| JobError::Config("Cannot determine home directory".into()))
    }

    /// Re-source the profile with `shell -c '. "$1"' <shell> <profile>` after
    /// writing. The path travels as an argument, never as script text.
    pub fn with_source_shell(mut self, shell: impl Into<String>) -> Self {
        self.source_shell = Some(shell.into());
        self
    }

    pub fn profile(&self) -> &Path {
        &self.profile
    }

    pub async fn activate(&self, line: &str) -> Result<ActivationOutcome, JobError> {
        let line = line.trim();
        if line.is_empty() {
            return Err(JobError::Config("activation command is empty".into()));
        }

        let outcome = self.ensure_line(line)?;
        match outcome {
            ActivationOutcome::Added => {
                tracing::info!(profile = %self.profile.display(), "activation line added")
            }
            ActivationOutcome::AlreadyPresent => {
                tracing::info!(profile = %self.profile.display(), "already activated")
            }
        }

        if let Some(shell) = self.source_shell.as_deref() {
            self.source(shell).await;
        }
        Ok(outcome)
    }

    fn ensure_line(&self, line: &str) -> Result<ActivationOutcome, JobError> {
        let fs_err = |e| JobError::filesystem(self.profile.clone(), e);

        let existing = match std::fs::read_to_string(&self.profile) {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(profile = %self.profile.display(), "profile missing, creating it");
                String::new()
            }
            Err(e) => return Err(fs_err(e)),
        };

        if existing.lines().any(|l| l.trim() == line) {
            return Ok(ActivationOutcome::AlreadyPresent);
        }

        let mut f = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.profile)
            .map_err(fs_err)?;
        if !existing.is_empty() && !existing.ends_with('\n') {
            f.write_all(b"\n").map_err(fs_err)?;
        }
        writeln!(f, "{line}").map_err(fs_err)?;
        Ok(ActivationOutcome::Added)
    }

    // A child shell cannot change the caller's environment; this only
    // surfaces profile errors early.
    async fn source(&self, shell: &str) {
        let status = Command::new(shell)
            .args(["-c", ". \"$1\"", shell])
            .arg(&self.profile)
            .status()
            .await;
        match status {
            Ok(s) if s.success() => {}
            Ok(s) => tracing::warn!(profile = %self.profile.display(), status = %s, "sourcing profile failed"),
            Err(e) => tracing::warn!(shell, error = %e, "could not spawn shell to source profile"),
        }
    }
}
