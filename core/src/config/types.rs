use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level sections every configuration file must carry.
pub const REQUIRED_SECTIONS: [&str; 3] = ["paths", "cmds", "slurm"];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    pub paths: PathsConfig,

    pub cmds: CmdsConfig,

    /// Options forwarded verbatim to the scheduler as `#SBATCH` directives.
    /// Kept as a YAML mapping so file order is preserved.
    pub slurm: serde_yaml::Mapping,

    #[serde(default)]
    pub scheduler: SchedulerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PathsConfig {
    /// FreeSurfer license file handed to fMRIPrep.
    pub fs_license: PathBuf,

    /// Environment root substituted into `cmds.tf_wcard`.
    pub tf_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CmdsConfig {
    /// Line appended to the shell profile by `activate`.
    pub activate_cmd: String,

    /// Environment activation template, e.g. `source {tf_path}/bin/activate`.
    pub tf_wcard: String,

    /// fMRIPrep command template.
    pub cmd_wcard: String,

    /// Script lines emitted before the activation command.
    #[serde(default)]
    pub slurm_pre_commands: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchedulerConfig {
    #[serde(default = "default_sbatch_bin")]
    pub sbatch_bin: String,

    /// Extra arguments placed before the script on the `sbatch` command line.
    #[serde(default)]
    pub sbatch_args: Vec<String>,

    /// Interpreter written to the script's shebang line.
    #[serde(default = "default_shell")]
    pub shell: String,
}

fn default_sbatch_bin() -> String {
    "sbatch".to_string()
}

fn default_shell() -> String {
    "/bin/bash".to_string()
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            sbatch_bin: default_sbatch_bin(),
            sbatch_args: Vec::new(),
            shell: default_shell(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_enabled")]
    pub enabled: bool,

    /// If true, log to stderr.
    #[serde(default = "default_logging_console")]
    pub console: bool,

    /// If true, log to a file under `directory` (or OS temp dir if unset).
    #[serde(default)]
    pub file: bool,

    /// EnvFilter string, e.g. "info" or "fmriprep_core=debug".
    #[serde(default = "default_logging_level")]
    pub level: String,

    #[serde(default)]
    pub directory: Option<String>,
}

fn default_logging_enabled() -> bool {
    true
}

fn default_logging_console() -> bool {
    true
}

fn default_logging_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_logging_enabled(),
            console: default_logging_console(),
            file: false,
            level: default_logging_level(),
            directory: None,
        }
    }
}
