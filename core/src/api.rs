//! Stable re-exports for consumers (`cli` and external crates).
//!
//! Prefer importing from `fmriprep_core::api` instead of reaching into internal modules.

pub use crate::activation::{ActivationOutcome, EnvActivator};
pub use crate::config::{
    default_config_template, get_fmriprep_data_dir, load_default, resolve_default_path,
    AppConfig, CmdsConfig, ConfigStore, LoggingConfig, PathsConfig, SchedulerConfig,
    CONFIG_ENV_VAR,
};
pub use crate::error::{CliError, JobError, TemplateError};
pub use crate::job::{
    BatchCoordinator, BatchPaths, BatchReport, CommandBuilder, FailedJob, JobHandle, JobSpec,
    JobState, SubmitMode, SubmittedJob, ALL_SUBJECTS, DEFAULT_OUTPUT_SPACE,
};
pub use crate::scheduler::{
    SchedulerClient, SchedulerFactory, SlurmClient, SlurmFactory, SubmissionReceipt,
};
