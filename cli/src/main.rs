use std::sync::Arc;

use clap::Parser;
use fmriprep_cli::app;
use fmriprep_cli::commands::{activate, cli, init, submit};
use fmriprep_core::api::{AppConfig, CliError, ConfigStore, LoggingConfig};

#[tokio::main]
async fn main() {
    let exit = match real_main().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{e}");
            app::exit_code_for_error(&e)
        }
    };

    std::process::exit(exit);
}

async fn real_main() -> Result<i32, CliError> {
    let args = cli::Args::parse();

    // init runs before any configuration exists
    if let cli::Commands::Init(init_args) = &args.command {
        app::init_tracing(&LoggingConfig::default())?;
        return init::handle_init(init_args);
    }

    let store = match args.config.as_deref() {
        Some(p) => ConfigStore::new(fmriprep_cli::utils::expand_path(p)?),
        None => ConfigStore::new(fmriprep_core::config::resolve_default_path()?),
    };
    let cfg = store.load()?;
    app::init_tracing(&cfg.logging)?;
    tracing::debug!(config = %store.path().display(), "using configuration");

    dispatch(args.command, Arc::new(cfg)).await
}

async fn dispatch(cmd: cli::Commands, cfg: Arc<AppConfig>) -> Result<i32, CliError> {
    match cmd {
        cli::Commands::Submit(submit_args) => submit::handle_submit(submit_args, cfg).await,
        cli::Commands::Render(render_args) => submit::handle_render(render_args, cfg),
        cli::Commands::Activate(activate_args) => {
            activate::handle_activate(activate_args, &cfg).await
        }
        cli::Commands::Init(init_args) => init::handle_init(&init_args),
    }
}
