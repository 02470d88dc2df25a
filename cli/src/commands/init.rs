//! Starter configuration
use std::path::Path;

use fmriprep_core::api as core_api;

use crate::commands::cli::InitArgs;
use crate::utils::expand_path;

/// Handle init command
pub fn handle_init(args: &InitArgs) -> Result<i32, core_api::CliError> {
    let config_path = match args.path.as_deref() {
        Some(p) => expand_path(p)?,
        None => core_api::get_fmriprep_data_dir()?.join("config.yml"),
    };

    if config_path.exists() && !args.force {
        println!(
            "Configuration file already exists at: {}",
            config_path.display()
        );
        println!("To reconfigure, edit the file directly or run init again with --force.");
        return Ok(0);
    }

    write_config(&config_path)?;

    println!("Configuration written to: {}", config_path.display());
    println!("Edit paths.fs_license, paths.tf_path and the slurm section for your cluster.");
    Ok(0)
}

fn write_config(path: &Path) -> Result<(), core_api::CliError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            core_api::CliError::Command(format!("Failed to create {}: {}", parent.display(), e))
        })?;
    }
    std::fs::write(path, core_api::default_config_template()).map_err(|e| {
        core_api::CliError::Command(format!("Failed to write configuration: {}", e))
    })
}
