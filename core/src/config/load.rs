use std::path::{Path, PathBuf};

use super::types::{AppConfig, REQUIRED_SECTIONS};
use crate::error::JobError;

/// Environment variable that points at a configuration file.
pub const CONFIG_ENV_VAR: &str = "FMRIPREP_SLURM_CONFIG";

const DEFAULT_CONFIG: &str = include_str!("../../config/config.yml");

/// Starter configuration written by `fmriprep-slurm init`.
pub fn default_config_template() -> &'static str {
    DEFAULT_CONFIG
}

/// Get the default data directory: ~/.fmriprep-slurm
pub fn get_fmriprep_data_dir() -> Result<PathBuf, JobError> {
    let home = dirs::home_dir()
        .ok_or_else(|| JobError::Config("Cannot determine home directory".into()))?;
    Ok(home.join(".fmriprep-slurm"))
}

/// Pick the configuration file the CLI uses when `--config` is not given.
pub fn resolve_default_path() -> Result<PathBuf, JobError> {
    // Priority 1: $FMRIPREP_SLURM_CONFIG
    if let Ok(v) = std::env::var(CONFIG_ENV_VAR) {
        if !v.trim().is_empty() {
            return Ok(PathBuf::from(v));
        }
    }

    // Priority 2: ~/.fmriprep-slurm/config.yml
    let user_config = get_fmriprep_data_dir()?.join("config.yml");
    if user_config.exists() {
        return Ok(user_config);
    }

    // Priority 3: ./config.yml
    let local_config = Path::new("config.yml");
    if local_config.exists() {
        return Ok(local_config.to_path_buf());
    }

    Err(JobError::Config(format!(
        "no configuration found: set {CONFIG_ENV_VAR}, create {} or ./config.yml",
        user_config.display()
    )))
}

pub fn load_default() -> Result<AppConfig, JobError> {
    ConfigStore::new(resolve_default_path()?).load()
}

/// Reads the YAML configuration from disk.
///
/// Nothing is cached: every `load` and `get_section` call re-reads the file,
/// so edits made between calls are picked up.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<AppConfig, JobError> {
        let root = self.read_document()?;
        for section in REQUIRED_SECTIONS {
            if !root.contains_key(section) {
                return Err(JobError::MissingSection(section.to_string()));
            }
        }

        let cfg: AppConfig = serde_yaml::from_value(serde_yaml::Value::Mapping(root))
            .map_err(|e| JobError::Config(format!("{}: {e}", self.path.display())))?;
        tracing::debug!(path = %self.path.display(), "configuration loaded");
        Ok(cfg)
    }

    /// Raw access to one top-level section.
    pub fn get_section(&self, name: &str) -> Result<serde_yaml::Mapping, JobError> {
        let mut root = self.read_document()?;
        match root.remove(name) {
            Some(serde_yaml::Value::Mapping(section)) => Ok(section),
            _ => Err(JobError::MissingSection(name.to_string())),
        }
    }

    fn read_document(&self) -> Result<serde_yaml::Mapping, JobError> {
        let s = std::fs::read_to_string(&self.path).map_err(|e| {
            JobError::Config(format!("failed to read {}: {e}", self.path.display()))
        })?;
        let value: serde_yaml::Value = serde_yaml::from_str(&s)
            .map_err(|e| JobError::Config(format!("{}: {e}", self.path.display())))?;
        match value {
            serde_yaml::Value::Mapping(root) => Ok(root),
            _ => Err(JobError::Config(format!(
                "{}: top level must be a mapping",
                self.path.display()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(body: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(body.as_bytes()).unwrap();
        f
    }

    const MINIMAL: &str = r#"
paths:
  fs_license: /lic.txt
  tf_path: /env
cmds:
  activate_cmd: echo hi
  tf_wcard: source {tf_path}/activate
  cmd_wcard: fmriprep {bidspath} {outpath}
slurm:
  partition: short
"#;

    #[test]
    fn bundled_template_loads() {
        let f = write_config(default_config_template());
        let cfg = ConfigStore::new(f.path()).load().unwrap();
        assert_eq!(cfg.scheduler.sbatch_bin, "sbatch");
        assert_eq!(cfg.cmds.slurm_pre_commands.len(), 2);
        assert!(cfg.cmds.cmd_wcard.contains("{output_spaces}"));
    }

    #[test]
    fn minimal_config_uses_defaults() {
        let f = write_config(MINIMAL);
        let cfg = ConfigStore::new(f.path()).load().unwrap();
        assert_eq!(cfg.paths.fs_license, PathBuf::from("/lic.txt"));
        assert!(cfg.cmds.slurm_pre_commands.is_empty());
        assert_eq!(cfg.scheduler.shell, "/bin/bash");
        assert_eq!(cfg.logging.level, "info");
    }

    #[test]
    fn missing_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ConfigStore::new(dir.path().join("nope.yml"))
            .load()
            .unwrap_err();
        assert!(matches!(err, JobError::Config(_)), "{err:?}");
    }

    #[test]
    fn malformed_yaml_is_config_error() {
        let f = write_config("paths: [unterminated\n");
        let err = ConfigStore::new(f.path()).load().unwrap_err();
        assert!(matches!(err, JobError::Config(_)), "{err:?}");
    }

    #[test]
    fn missing_section_is_reported_by_name() {
        let f = write_config(&MINIMAL.replace("slurm:\n  partition: short\n", ""));
        let err = ConfigStore::new(f.path()).load().unwrap_err();
        match err {
            JobError::MissingSection(name) => assert_eq!(name, "slurm"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn unknown_cmds_key_is_rejected() {
        let f = write_config(&MINIMAL.replace("cmds:\n", "cmds:\n  typo_cmd: oops\n"));
        let err = ConfigStore::new(f.path()).load().unwrap_err();
        assert!(matches!(err, JobError::Config(_)), "{err:?}");
    }

    #[test]
    fn missing_paths_key_is_rejected() {
        let f = write_config(&MINIMAL.replace("  tf_path: /env\n", ""));
        let err = ConfigStore::new(f.path()).load().unwrap_err();
        assert!(matches!(err, JobError::Config(_)), "{err:?}");
    }

    #[test]
    fn get_section_returns_mapping() {
        let f = write_config(MINIMAL);
        let store = ConfigStore::new(f.path());
        let slurm = store.get_section("slurm").unwrap();
        assert_eq!(
            slurm.get("partition").and_then(|v| v.as_str()),
            Some("short")
        );
        assert!(matches!(
            store.get_section("absent"),
            Err(JobError::MissingSection(_))
        ));
    }

    #[test]
    fn load_rereads_file() {
        let f = write_config(MINIMAL);
        let store = ConfigStore::new(f.path());
        assert_eq!(store.load().unwrap().paths.tf_path, PathBuf::from("/env"));

        std::fs::write(f.path(), MINIMAL.replace("/env", "/env2")).unwrap();
        assert_eq!(store.load().unwrap().paths.tf_path, PathBuf::from("/env2"));
    }
}
