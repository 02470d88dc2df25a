use fmriprep_core::api::{ActivationOutcome, AppConfig, CliError, EnvActivator};

use crate::commands::cli::ActivateArgs;
use crate::utils::expand_path;

/// Handle activate command
pub async fn handle_activate(args: ActivateArgs, cfg: &AppConfig) -> Result<i32, CliError> {
    let profile = match args.profile.as_deref() {
        Some(p) => expand_path(p)?,
        None => EnvActivator::default_profile()?,
    };

    let mut activator = EnvActivator::new(&profile);
    if !args.no_source {
        activator = activator.with_source_shell(args.shell);
    }

    match activator.activate(&cfg.cmds.activate_cmd).await? {
        ActivationOutcome::Added => println!("fmriprep activated in {}", profile.display()),
        ActivationOutcome::AlreadyPresent => {
            println!("fmriprep already activated in {}", profile.display())
        }
    }
    Ok(0)
}
