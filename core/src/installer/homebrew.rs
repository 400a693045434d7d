use std::sync::Arc;

use async_trait::async_trait;
use scanmap_common::config::InstallConfig;
use scanmap_common::error::StageError;
use scanmap_common::reporter::Reporter;

use super::{Installer, command_from, run_install_command};
use crate::process::CommandRunner;

/// macOS. A new process inherits Homebrew's PATH, so there is nothing to refresh.
#[derive(Debug)]
pub struct HomebrewInstaller {
    runner: Arc<dyn CommandRunner>,
    install_template: Vec<String>,
}

impl HomebrewInstaller {
    pub fn new(config: &InstallConfig, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner,
            install_template: config.homebrew.clone(),
        }
    }
}

#[async_trait]
impl Installer for HomebrewInstaller {
    fn name(&self) -> &'static str {
        "homebrew"
    }

    async fn install(&self, package: &str, reporter: &dyn Reporter) -> Result<(), StageError> {
        let command = command_from(&self.install_template, package)?;
        run_install_command(self.runner.as_ref(), &command, package, reporter).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{CommandOutput, Environment};
    use crate::testing::{FakeRunner, RecordingReporter, Reply};

    #[tokio::test]
    async fn installs_with_brew() {
        let runner =
            Arc::new(FakeRunner::new().on("brew", |_| Reply::Output(CommandOutput::ok(""))));
        let installer = HomebrewInstaller::new(&InstallConfig::default(), runner.clone());
        let reporter = RecordingReporter::default();

        installer.install("nmap", &reporter).await.unwrap();
        assert_eq!(runner.calls()[0].display(), "brew install nmap");
        assert_eq!(installer.refresh(&reporter).await.unwrap(), Environment::inherited());
    }
}
