#[allow(clippy::module_inception)]
pub mod error;
pub mod template;

pub use error::{CliError, JobError};
pub use template::TemplateError;
