//! Per-subject fMRIPrep job generation and SLURM submission.
//!
//! The pieces, leaves first: [`config`] loads the YAML configuration,
//! [`job`] resolves per-subject paths, builds command lines and tracks
//! submissions, [`scheduler`] renders and dispatches batch scripts, and
//! [`activation`] manages the shell-profile line.

pub mod activation;
pub mod api;
pub mod config;
pub mod error;
pub mod job;
pub mod scheduler;
