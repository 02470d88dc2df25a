use std::path::PathBuf;

use fmriprep_core::api::CliError;

/// Expand `~` and `$VAR` in a path given on the command line.
pub fn expand_path(raw: &str) -> Result<PathBuf, CliError> {
    let expanded = shellexpand::full(raw)
        .map_err(|e| CliError::Config(format!("cannot expand path '{raw}': {e}")))?;
    Ok(PathBuf::from(expanded.as_ref()))
}
