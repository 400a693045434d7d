//! # Runtime Configuration
//!
//! Everything here has a default, so an empty (or absent) TOML file is a valid
//! configuration. Install command lines are policy, not protocol: they live here
//! instead of being baked into the installers.
//!
//! ```toml
//! target = "10.0.0.0/24"
//!
//! [install]
//! bootstrap_package_manager = true
//!
//! [scan]
//! timeout_secs = 300
//! extra_args = ["-T4"]
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::network::target::TargetSpec;

const PACKAGE_PLACEHOLDER: &str = "{package}";

const CHOCOLATEY_BOOTSTRAP: &str = "Set-ExecutionPolicy Bypass -Scope Process -Force; \
[System.Net.ServicePointManager]::SecurityProtocol = \
[System.Net.ServicePointManager]::SecurityProtocol -bor 3072; \
iex ((New-Object System.Net.WebClient).\
DownloadString('https://community.chocolatey.org/install.ps1'))";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Scanned when no target is given on the command line.
    pub target: TargetSpec,
    /// Name of the scanner executable.
    pub tool: String,
    pub install: InstallConfig,
    pub locator: LocatorConfig,
    pub scan: ScanConfig,
    pub report: ReportConfig,
    pub output: OutputConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target: TargetSpec::default(),
            tool: "nmap".to_string(),
            install: InstallConfig::default(),
            locator: LocatorConfig::default(),
            scan: ScanConfig::default(),
            report: ReportConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl Config {
    /// Reads and validates a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse_named(&content, &path.display().to_string())
    }

    /// Parses and validates a TOML string.
    pub fn parse(toml_str: &str) -> Result<Self, ConfigError> {
        Self::parse_named(toml_str, "<inline>")
    }

    fn parse_named(toml_str: &str, origin: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(toml_str).map_err(|source| ConfigError::Parse {
            origin: origin.to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tool.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "tool",
                reason: "must not be empty".into(),
            });
        }

        let commands = [
            ("install.windows", &self.install.windows),
            ("install.homebrew", &self.install.homebrew),
            ("install.apt", &self.install.apt),
            ("install.package_manager_bootstrap", &self.install.package_manager_bootstrap),
        ];
        for (field, command) in commands {
            if command.first().is_none_or(|program| program.trim().is_empty()) {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "command line needs at least a program".into(),
                });
            }
        }

        if self.scan.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "scan.timeout_secs",
                reason: "must be greater than zero".into(),
            });
        }

        if self.scan.extra_args.iter().any(|arg| arg == "-oX") {
            return Err(ConfigError::Invalid {
                field: "scan.extra_args",
                reason: "the XML output option is managed by scanmap".into(),
            });
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InstallConfig {
    /// Package to install. Defaults to the tool name.
    pub package: Option<String>,
    /// Allows one attempt at installing the Windows package manager itself.
    pub bootstrap_package_manager: bool,
    /// Package manager the Windows installer depends on.
    pub package_manager: String,
    pub windows: Vec<String>,
    pub homebrew: Vec<String>,
    pub apt: Vec<String>,
    pub package_manager_bootstrap: Vec<String>,
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            package: None,
            bootstrap_package_manager: false,
            package_manager: "choco".to_string(),
            windows: argv(&["choco", "install", PACKAGE_PLACEHOLDER, "-y"]),
            homebrew: argv(&["brew", "install", PACKAGE_PLACEHOLDER]),
            apt: argv(&["sudo", "apt-get", "install", "-y", PACKAGE_PLACEHOLDER]),
            package_manager_bootstrap: argv(&[
                "powershell",
                "-NoProfile",
                "-ExecutionPolicy",
                "Bypass",
                "-Command",
                CHOCOLATEY_BOOTSTRAP,
            ]),
        }
    }
}

impl InstallConfig {
    pub fn package_for<'a>(&'a self, tool: &'a str) -> &'a str {
        self.package.as_deref().unwrap_or(tool)
    }
}

/// A program and its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandLine {
    /// Splits a configured argv, substituting `{package}` in every element.
    ///
    /// Returns `None` for an empty argv; [`Config::validate`] rules those out.
    pub fn from_template(template: &[String], package: &str) -> Option<Self> {
        let mut parts = template
            .iter()
            .map(|part| part.replace(PACKAGE_PLACEHOLDER, package));
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
        })
    }

    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LocatorConfig {
    /// Checked after the platform's well-known locations, before PATH.
    pub extra_paths: Vec<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScanConfig {
    pub timeout_secs: u64,
    /// Passed to the scanner before the output option and the target.
    pub extra_args: Vec<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 900,
            extra_args: Vec::new(),
        }
    }
}

impl ScanConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportConfig {
    pub dir: PathBuf,
    /// Leave the XML report on disk after parsing.
    pub keep: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            keep: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub path: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("network_visualization.html"),
        }
    }
}

fn argv(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|part| part.to_string()).collect()
}
