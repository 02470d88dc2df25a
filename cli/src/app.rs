use std::sync::Arc;

use fmriprep_core::api::{
    AppConfig, BatchCoordinator, BatchPaths, CliError, JobError, LoggingConfig, SchedulerFactory,
    SlurmFactory, ALL_SUBJECTS,
};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::commands::cli::BatchArgs;
use crate::utils::expand_path;

/// Resolve paths, create per-subject directories and build every job.
pub fn build_batch(
    cfg: Arc<AppConfig>,
    args: &BatchArgs,
    scheduler: Arc<dyn SchedulerFactory>,
) -> Result<BatchCoordinator, CliError> {
    let paths = BatchPaths {
        bids_path: expand_path(&args.bids)?,
        out_root: expand_path(&args.out)?,
        work_root: expand_path(&args.work)?,
        log_dir: expand_path(&args.logs)?,
    };

    let subjects: Vec<&str> = if args.subjects.is_empty() {
        vec![ALL_SUBJECTS]
    } else {
        args.subjects.iter().map(String::as_str).collect()
    };

    let mut batch = BatchCoordinator::new(cfg, paths, scheduler);
    batch.add_subjects(subjects)?;
    batch.build_all(&args.extra, &args.output_spaces)?;
    Ok(batch)
}

pub fn slurm_factory(cfg: &AppConfig) -> Arc<dyn SchedulerFactory> {
    Arc::new(SlurmFactory::new(cfg.scheduler.clone()))
}

static LOG_GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
    std::sync::OnceLock::new();

/// Install the global subscriber described by the `logging` section.
///
/// A section that cannot produce any output is a configuration error; a log
/// directory that cannot be created is an I/O error.
pub fn init_tracing(logging: &LoggingConfig) -> Result<(), CliError> {
    if !logging.enabled {
        return Ok(());
    }
    if !logging.console && !logging.file {
        return Err(CliError::Config(
            "logging enabled but both console and file output are off".to_string(),
        ));
    }

    let filter = match std::env::var("RUST_LOG") {
        Ok(v) if !v.trim().is_empty() => EnvFilter::from_default_env(),
        _ => EnvFilter::try_new(&logging.level).map_err(|e| {
            CliError::Config(format!("invalid logging.level '{}': {e}", logging.level))
        })?,
    };

    let mut maybe_writer = None;

    if logging.file {
        let dir = match logging
            .directory
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            Some(d) => std::path::PathBuf::from(d),
            None => std::env::temp_dir().join("fmriprep-slurm"),
        };

        std::fs::create_dir_all(&dir)?;
        let file_name = format!("fmriprep-slurm.{}.log", std::process::id());
        let appender = tracing_appender::rolling::never(dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);
        let _ = LOG_GUARD.set(guard);
        maybe_writer = Some(non_blocking);
    }

    let console_layer = logging.console.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(atty::is(atty::Stream::Stderr))
    });

    let file_layer = maybe_writer.map(|w| {
        tracing_subscriber::fmt::layer()
            .with_writer(w)
            .with_ansi(false)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    Ok(())
}

pub fn exit_code_for_error(e: &CliError) -> i32 {
    // 0: success
    // 11: config error / bad arguments
    // 20: filesystem / IO error
    // 30: template error
    // 40: submission rejected
    // 50: internal/uncategorized
    match e {
        CliError::Config(_) => 11,
        CliError::Job(je) => match je.root() {
            JobError::Config(_) | JobError::MissingSection(_) | JobError::InvalidSubject(_) => 11,
            JobError::Filesystem { .. } => 20,
            JobError::Template(_) => 30,
            JobError::Submission { .. } => 40,
            JobError::State { .. } | JobError::BatchAborted { .. } => 50,
        },
        CliError::Io(_) => 20,
        CliError::Command(_) => 20,
        CliError::Anyhow(_) => 50,
    }
}
