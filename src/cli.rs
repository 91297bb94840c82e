use std::path::PathBuf;

use clap::Parser;

pub const DEFAULT_CONFIG_FILE: &str = "config.json";

/// Command line surface. Help and version exit 0; anything malformed is
/// an argument error.
#[derive(Debug, Parser)]
#[command(
    name = "nova-chat-server",
    version,
    about = "Secure HTTPS chat backend",
    disable_version_flag = true
)]
pub struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short = 'c', long = "config", value_name = "PATH")]
    config: Option<PathBuf>,

    /// Positional alternative to --config.
    #[arg(value_name = "CONFIG_FILE")]
    config_file: Option<PathBuf>,

    /// Print version information.
    #[arg(short = 'v', long = "version", action = clap::ArgAction::Version)]
    version: Option<bool>,
}

impl Cli {
    /// `--config` wins over the positional; both default to config.json.
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .or_else(|| self.config_file.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
    }
}
