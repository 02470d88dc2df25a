use clap::{Args as ClapArgs, Parser, Subcommand};

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(
    name = "fmriprep-slurm",
    version,
    about = "Generate and submit per-subject fMRIPrep jobs to SLURM"
)]
pub struct Args {
    /// YAML configuration file. Falls back to ~/.fmriprep-slurm/config.yml,
    /// then ./config.yml.
    #[arg(long, global = true, env = "FMRIPREP_SLURM_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct BatchArgs {
    /// BIDS dataset root.
    #[arg(long)]
    pub bids: String,

    /// Derivatives root; one subdirectory per subject is created.
    #[arg(long)]
    pub out: String,

    /// Working-directory root; one subdirectory per subject is created.
    #[arg(long)]
    pub work: String,

    /// Existing directory for scheduler stdout/stderr logs.
    #[arg(long)]
    pub logs: String,

    /// Subject label. Repeat for several subjects; omit to process all
    /// participants in a single job.
    #[arg(long = "subject", action = clap::ArgAction::Append)]
    pub subjects: Vec<String>,

    /// fMRIPrep output space. Repeatable.
    #[arg(long = "output-space", action = clap::ArgAction::Append)]
    pub output_spaces: Vec<String>,

    /// Extra fMRIPrep flags, given after `--`.
    #[arg(last = true)]
    pub extra: Vec<String>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct SubmitArgs {
    #[command(flatten)]
    pub batch: BatchArgs,

    /// Keep submitting after a rejected job instead of stopping.
    #[arg(long, default_value_t = false)]
    pub best_effort: bool,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct RenderArgs {
    #[command(flatten)]
    pub batch: BatchArgs,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ActivateArgs {
    /// Profile to modify (default: ~/.bashrc).
    #[arg(long)]
    pub profile: Option<String>,

    /// Do not re-source the profile afterwards.
    #[arg(long, default_value_t = false)]
    pub no_source: bool,

    #[arg(long, default_value = "bash")]
    pub shell: String,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct InitArgs {
    /// Where to write the config (default: ~/.fmriprep-slurm/config.yml).
    #[arg(long)]
    pub path: Option<String>,

    /// Overwrite an existing file.
    #[arg(long, default_value_t = false)]
    pub force: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create directories, build scripts and submit them with sbatch.
    Submit(SubmitArgs),
    /// Print the batch scripts without submitting. Per-subject output and
    /// work directories are still created.
    Render(RenderArgs),
    /// Add the activation command to a shell profile.
    Activate(ActivateArgs),
    /// Write a starter configuration file.
    Init(InitArgs),
}
