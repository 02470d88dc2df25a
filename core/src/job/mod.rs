mod batch;
mod command;
mod handle;
mod spec;

pub use batch::{BatchCoordinator, BatchReport, FailedJob, SubmitMode, SubmittedJob};
pub use command::{render_template, strip_all_subjects_flag, CommandBuilder, DEFAULT_OUTPUT_SPACE};
pub use handle::{JobHandle, JobState};
pub use spec::{BatchPaths, JobSpec, ALL_SUBJECTS};
