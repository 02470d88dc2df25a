mod script;
mod slurm;
mod traits;

pub use script::{normalize_key, BatchScript, Directive};
pub use slurm::{parse_job_id, SlurmClient, SlurmFactory};
pub use traits::{SchedulerClient, SchedulerFactory, SubmissionReceipt};
