//! All the CLI arguments for Embers

/// A rising-flame particle background for your terminal.
#[derive(clap::Parser, Debug, Clone)]
#[command(version, about)]
#[non_exhaustive]
pub struct CliArgs {
    /// Name of the effect(s) to run.
    #[arg(short, long("use"), default_value = "flame")]
    pub enabled_effects: Vec<String>,

    /// Use a custom config directory.
    #[arg(long)]
    pub config_dir: Option<std::path::PathBuf>,

    /// Override the configured log level.
    #[arg(long)]
    pub log_level: Option<crate::config::LogLevel>,

    /// Override the configured log file path.
    #[arg(long)]
    pub log_path: Option<std::path::PathBuf>,

    /// Seed the particle field's random source, for reproducible runs.
    #[arg(long)]
    pub seed: Option<u64>,
}
