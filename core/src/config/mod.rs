mod load;
mod types;

pub use load::{
    default_config_template, get_fmriprep_data_dir, load_default, resolve_default_path,
    ConfigStore, CONFIG_ENV_VAR,
};
pub use types::{
    AppConfig, CmdsConfig, LoggingConfig, PathsConfig, SchedulerConfig, REQUIRED_SECTIONS,
};
