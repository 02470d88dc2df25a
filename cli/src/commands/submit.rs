use std::io::Write;
use std::sync::Arc;

use fmriprep_core::api::{AppConfig, CliError, SubmitMode};

use crate::app;
use crate::commands::cli::{OutputFormat, RenderArgs, SubmitArgs};

/// Handle submit command. Returns the process exit code.
pub async fn handle_submit(args: SubmitArgs, cfg: Arc<AppConfig>) -> Result<i32, CliError> {
    submit_to(args, cfg, &mut std::io::stdout()).await
}

pub async fn submit_to<W: Write>(
    args: SubmitArgs,
    cfg: Arc<AppConfig>,
    out: &mut W,
) -> Result<i32, CliError> {
    let scheduler = app::slurm_factory(&cfg);
    let mut batch = app::build_batch(cfg, &args.batch, scheduler)?;

    let mode = if args.best_effort {
        SubmitMode::BestEffort
    } else {
        SubmitMode::FailFast
    };
    tracing::info!(jobs = batch.len(), ?mode, "submitting batch");

    let report = match batch.submit_all(mode).await {
        Ok(report) => report,
        Err(e) => {
            // Show what did go out before surfacing the failure.
            for message in batch.messages() {
                writeln!(out, "{message}\n")?;
            }
            return Err(e.into());
        }
    };

    match args.format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&report)
                .map_err(|e| CliError::Command(format!("failed to encode report: {e}")))?;
            writeln!(out, "{json}")?;
        }
        OutputFormat::Text => {
            for job in &report.submitted {
                writeln!(out, "{}\n", job.message)?;
            }
            for failed in &report.failed {
                eprintln!("subject {} failed: {}", failed.subject, failed.error);
            }
        }
    }

    Ok(if report.is_complete() { 0 } else { 40 })
}

/// Handle render command: print every batch script, submit nothing.
pub fn handle_render(args: RenderArgs, cfg: Arc<AppConfig>) -> Result<i32, CliError> {
    render_to(args, cfg, &mut std::io::stdout())
}

pub fn render_to<W: Write>(
    args: RenderArgs,
    cfg: Arc<AppConfig>,
    out: &mut W,
) -> Result<i32, CliError> {
    let scheduler = app::slurm_factory(&cfg);
    let batch = app::build_batch(cfg, &args.batch, scheduler)?;

    for (job_name, script) in batch.scripts()? {
        writeln!(out, "# ---- {job_name} ----")?;
        writeln!(out, "{script}")?;
    }
    Ok(0)
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use fmriprep_core::api::ConfigStore;

    use super::*;
    use crate::commands::cli::BatchArgs;

    const CONFIG: &str = r#"
paths:
  fs_license: /opt/fs/license.txt
  tf_path: /opt/envs/fmriprep
cmds:
  activate_cmd: export PATH=/opt/envs/fmriprep/bin:$PATH
  tf_wcard: source {tf_path}/bin/activate
  cmd_wcard: fmriprep {bidspath} {outpath} participant --participant-label {subject} --fs-license-file {fs_license} -w {workpath} --output-spaces {output_spaces}
slurm:
  partition: general
logging:
  enabled: false
"#;

    // sbatch stand-in: rejects fmriprep_02, accepts everything else as job 7.
    const FAKE_SBATCH: &str = "script=$(cat)\n\
        case \"$script\" in\n\
        *job-name=fmriprep_02*) echo 'sbatch: error: QOSMaxSubmitJobPerUserLimit' >&2; exit 1 ;;\n\
        esac\n\
        echo 'Submitted batch job 7'\n";

    fn config(root: &Path) -> Arc<AppConfig> {
        let path = root.join("config.yml");
        std::fs::write(&path, CONFIG).unwrap();
        let mut cfg = ConfigStore::new(&path).load().unwrap();

        let fake = root.join("fake-sbatch");
        std::fs::write(&fake, FAKE_SBATCH).unwrap();
        // Run the fake through sh so the test never execs a freshly written file.
        cfg.scheduler.sbatch_bin = "/bin/sh".into();
        cfg.scheduler.sbatch_args = vec![fake.to_string_lossy().to_string()];
        Arc::new(cfg)
    }

    fn batch_args(root: &Path, subjects: &[&str]) -> BatchArgs {
        let logs = root.join("logs");
        std::fs::create_dir_all(&logs).unwrap();
        BatchArgs {
            bids: root.join("bids").to_string_lossy().to_string(),
            out: root.join("out").to_string_lossy().to_string(),
            work: root.join("work").to_string_lossy().to_string(),
            logs: logs.to_string_lossy().to_string(),
            subjects: subjects.iter().map(|s| s.to_string()).collect(),
            output_spaces: Vec::new(),
            extra: Vec::new(),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn best_effort_json_report_exits_40_when_incomplete() {
        let tmp = tempfile::tempdir().unwrap();
        let args = SubmitArgs {
            batch: batch_args(tmp.path(), &["01", "02", "03"]),
            best_effort: true,
            format: OutputFormat::Json,
        };

        let mut out = Vec::new();
        let code = submit_to(args, config(tmp.path()), &mut out).await.unwrap();
        assert_eq!(code, 40);

        let report: serde_json::Value = serde_json::from_slice(&out).unwrap();
        let submitted: Vec<&str> = report["submitted"]
            .as_array()
            .unwrap()
            .iter()
            .map(|j| j["subject"].as_str().unwrap())
            .collect();
        assert_eq!(submitted, ["01", "03"]);
        assert_eq!(report["submitted"][0]["job_id"], "7");
        assert_eq!(report["submitted"][1]["job_name"], "fmriprep_03");
        assert_eq!(report["failed"][0]["subject"], "02");
        assert!(report["failed"][0]["error"]
            .as_str()
            .unwrap()
            .contains("QOSMaxSubmitJobPerUserLimit"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn complete_text_submission_exits_zero() {
        let tmp = tempfile::tempdir().unwrap();
        let args = SubmitArgs {
            batch: batch_args(tmp.path(), &["01"]),
            best_effort: false,
            format: OutputFormat::Text,
        };

        let mut out = Vec::new();
        let code = submit_to(args, config(tmp.path()), &mut out).await.unwrap();
        assert_eq!(code, 0);
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("fmriprep_01"), "{text}");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn fail_fast_prints_submitted_then_errors() {
        let tmp = tempfile::tempdir().unwrap();
        let args = SubmitArgs {
            batch: batch_args(tmp.path(), &["01", "02", "03"]),
            best_effort: false,
            format: OutputFormat::Text,
        };

        let mut out = Vec::new();
        let err = submit_to(args, config(tmp.path()), &mut out)
            .await
            .unwrap_err();
        assert_eq!(app::exit_code_for_error(&err), 40);

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("fmriprep_01"), "{text}");
        assert!(!text.contains("fmriprep_03"), "{text}");
    }

    #[test]
    fn render_prints_scripts_and_creates_subject_dirs() {
        let tmp = tempfile::tempdir().unwrap();
        let args = RenderArgs {
            batch: batch_args(tmp.path(), &["01", "02"]),
        };

        let mut out = Vec::new();
        assert_eq!(render_to(args, config(tmp.path()), &mut out).unwrap(), 0);

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("# ---- fmriprep_01 ----"), "{text}");
        assert!(text.contains("#SBATCH --job-name=fmriprep_02"), "{text}");
        assert!(tmp.path().join("out/01").is_dir());
        assert!(tmp.path().join("work/02").is_dir());
    }
}
