use std::sync::Arc;

use async_trait::async_trait;
use scanmap_common::config::InstallConfig;
use scanmap_common::error::StageError;
use scanmap_common::reporter::Reporter;

use super::{Installer, command_from, run_install_command};
use crate::process::CommandRunner;

const SUDO: &str = "sudo";

/// Debian-style systems, and the fallback for every other Unix.
#[derive(Debug)]
pub struct AptInstaller {
    runner: Arc<dyn CommandRunner>,
    install_template: Vec<String>,
    elevated: bool,
}

impl AptInstaller {
    pub fn new(config: &InstallConfig, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner,
            install_template: config.apt.clone(),
            elevated: is_root::is_root(),
        }
    }

    /// Overrides privilege detection.
    pub fn with_elevated(mut self, elevated: bool) -> Self {
        self.elevated = elevated;
        self
    }
}

#[async_trait]
impl Installer for AptInstaller {
    fn name(&self) -> &'static str {
        "apt"
    }

    async fn install(&self, package: &str, reporter: &dyn Reporter) -> Result<(), StageError> {
        let mut command = command_from(&self.install_template, package)?;

        // Already root: sudo is at best redundant and may not even be installed.
        if self.elevated && command.program == SUDO && !command.args.is_empty() {
            command.program = command.args.remove(0);
        } else if !self.elevated && command.program == SUDO {
            reporter.warn("Installing requires elevated privileges; sudo may ask for a password");
        }

        run_install_command(self.runner.as_ref(), &command, package, reporter).await
    }
}
