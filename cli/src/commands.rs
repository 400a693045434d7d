pub mod scan;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use scanmap_common::config::Config;
use scanmap_common::network::target::TargetSpec;

/// Read when `--config` is not given.
pub const CONFIG_ENV: &str = "SCANMAP_CONFIG";

#[derive(Parser, Debug)]
#[command(name = "scanmap", version)]
#[command(about = "Scan a network with nmap and map the hosts it finds.")]
pub struct CommandLine {
    /// Host, address range, CIDR block or hostname [default: taken from the config]
    pub target: Option<TargetSpec>,

    /// TOML configuration file (falls back to $SCANMAP_CONFIG)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Where to write the HTML visualization
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

impl CommandLine {
    pub fn try_parse_args() -> Result<Self, clap::Error> {
        Self::try_parse()
    }

    fn config_path(&self) -> Option<PathBuf> {
        self.config
            .clone()
            .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from))
    }

    /// Defaults, overlaid by the config file, overlaid by flags.
    pub fn load_config(&self) -> anyhow::Result<Config> {
        let mut config = match self.config_path() {
            Some(path) => read_config(&path)?,
            None => Config::default(),
        };

        if let Some(output) = &self.output {
            config.output.path = output.clone();
        }
        if let Some(target) = &self.target {
            config.target = target.clone();
        }

        Ok(config)
    }
}

fn read_config(path: &Path) -> anyhow::Result<Config> {
    Config::from_file(path)
        .with_context(|| format!("could not load configuration from {}", path.display()))
}
