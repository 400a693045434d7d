//! The **abstraction** over platform package managers.
//!
//! One [`Installer`] is picked at startup by [`select_installer`]; the pipeline
//! only ever talks to the trait. Each variant owns its platform's policy:
//!
//! * [`WindowsInstaller`]: Chocolatey, which must already be installed unless
//!   bootstrapping was explicitly enabled.
//! * [`HomebrewInstaller`]: `brew` on macOS.
//! * [`AptInstaller`]: `apt-get` (through `sudo` unless already root) elsewhere.
//!
//! Install commands are never retried. A failed install usually means missing
//! privileges or no network, neither of which a retry fixes.

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use scanmap_common::config::{CommandLine, Config};
use scanmap_common::error::StageError;
use scanmap_common::platform::Platform;
use scanmap_common::reporter::Reporter;

use crate::process::{CommandRunner, Environment, Invocation};

mod apt;
mod homebrew;
mod windows;

pub use apt::AptInstaller;
pub use homebrew::HomebrewInstaller;
pub use windows::WindowsInstaller;

#[async_trait]
pub trait Installer: Send + Sync + Debug {
    /// Short name of the package manager, for messages.
    fn name(&self) -> &'static str;

    /// Installs `package`, failing with `InstallFailed` or `PrerequisiteMissing`.
    async fn install(&self, package: &str, reporter: &dyn Reporter) -> Result<(), StageError>;

    /// Makes a freshly installed tool resolvable by later stages.
    ///
    /// Failure here is `RefreshFailed`, which callers treat as a warning.
    async fn refresh(&self, _reporter: &dyn Reporter) -> Result<Environment, StageError> {
        Ok(Environment::inherited())
    }
}

pub fn select_installer(
    platform: Platform,
    config: &Config,
    runner: Arc<dyn CommandRunner>,
) -> Box<dyn Installer> {
    match platform {
        Platform::Windows => Box::new(WindowsInstaller::new(&config.install, runner)),
        Platform::MacOs => Box::new(HomebrewInstaller::new(&config.install, runner)),
        Platform::Unix => Box::new(AptInstaller::new(&config.install, runner)),
    }
}

/// Runs one install command line, mapping every failure to `InstallFailed`.
pub(crate) async fn run_install_command(
    runner: &dyn CommandRunner,
    command: &CommandLine,
    package: &str,
    reporter: &dyn Reporter,
) -> Result<(), StageError> {
    reporter.info(&format!("Running `{}`", command.display()));

    let invocation = Invocation::new(&command.program).args(&command.args);
    let output = runner
        .run(&invocation)
        .await
        .map_err(|e| StageError::InstallFailed {
            package: package.to_string(),
            reason: format!("could not start `{}`: {e}", command.program),
        })?;

    if !output.success {
        return Err(StageError::InstallFailed {
            package: package.to_string(),
            reason: format!(
                "`{}` exited with {}: {}",
                command.display(),
                output.describe_exit(),
                output.stderr.trim()
            ),
        });
    }

    if !output.stderr.trim().is_empty() {
        reporter.warn(&format!("{} reported: {}", command.program, output.stderr.trim()));
    }

    Ok(())
}

/// Expands a configured argv. Validation guarantees it is non-empty.
pub(crate) fn command_from(template: &[String], package: &str) -> Result<CommandLine, StageError> {
    CommandLine::from_template(template, package).ok_or_else(|| StageError::InstallFailed {
        package: package.to_string(),
        reason: "no install command configured".to_string(),
    })
}
