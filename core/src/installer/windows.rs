use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use scanmap_common::config::InstallConfig;
use scanmap_common::error::StageError;
use scanmap_common::reporter::Reporter;

use super::{Installer, command_from, run_install_command};
use crate::probe::Prober;
use crate::process::{CommandRunner, Environment, Invocation};

const CHOCOLATEY_ROOT_VAR: &str = "ChocolateyInstall";
const DEFAULT_CHOCOLATEY_ROOT: &str = r"C:\ProgramData\chocolatey";

/// Windows, through Chocolatey.
///
/// Chocolatey itself is a prerequisite. It is only installed when
/// `bootstrap_package_manager` is set, and then at most once per run.
#[derive(Debug)]
pub struct WindowsInstaller {
    runner: Arc<dyn CommandRunner>,
    prober: Prober,
    package_manager: String,
    install_template: Vec<String>,
    bootstrap_template: Vec<String>,
    bootstrap: bool,
    chocolatey_root: Option<PathBuf>,
}

impl WindowsInstaller {
    pub fn new(config: &InstallConfig, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            prober: Prober::new(runner.clone()),
            runner,
            package_manager: config.package_manager.clone(),
            install_template: config.windows.clone(),
            bootstrap_template: config.package_manager_bootstrap.clone(),
            bootstrap: config.bootstrap_package_manager,
            chocolatey_root: std::env::var_os(CHOCOLATEY_ROOT_VAR).map(PathBuf::from),
        }
    }

    /// Overrides the `ChocolateyInstall` lookup.
    pub fn with_chocolatey_root(mut self, root: Option<PathBuf>) -> Self {
        self.chocolatey_root = root;
        self
    }

    /// Where a freshly bootstrapped `choco.exe` lands; not yet on this process's PATH.
    fn bootstrapped_program(&self) -> PathBuf {
        self.chocolatey_root
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CHOCOLATEY_ROOT))
            .join("bin")
            .join(format!("{}.exe", self.package_manager))
    }

    /// Makes sure the package manager runs, returning the program to invoke it by.
    async fn ensure_package_manager(&self, reporter: &dyn Reporter) -> Result<String, StageError> {
        let env = Environment::inherited();
        if self.prober.probe(&self.package_manager, &env).await.is_present() {
            return Ok(self.package_manager.clone());
        }

        if !self.bootstrap {
            return Err(StageError::PrerequisiteMissing {
                tool: self.package_manager.clone(),
                hint: "install Chocolatey first, or set install.bootstrap_package_manager = true"
                    .to_string(),
            });
        }

        reporter.warn(&format!(
            "{} is not installed; bootstrapping it once",
            self.package_manager
        ));
        let bootstrap = command_from(&self.bootstrap_template, &self.package_manager)?;
        run_install_command(
            self.runner.as_ref(),
            &bootstrap,
            &self.package_manager,
            reporter,
        )
        .await?;

        let program = self.bootstrapped_program();
        let program_str = program.to_string_lossy().into_owned();
        if self.prober.probe(&program_str, &env).await.is_present() {
            Ok(program_str)
        } else {
            Err(StageError::PrerequisiteMissing {
                tool: self.package_manager.clone(),
                hint: format!("bootstrap finished but {} does not run", program.display()),
            })
        }
    }
}

#[async_trait]
impl Installer for WindowsInstaller {
    fn name(&self) -> &'static str {
        "chocolatey"
    }

    async fn install(&self, package: &str, reporter: &dyn Reporter) -> Result<(), StageError> {
        let program = self.ensure_package_manager(reporter).await?;

        let mut command = command_from(&self.install_template, package)?;
        if command.program == self.package_manager {
            command.program = program;
        }

        run_install_command(self.runner.as_ref(), &command, package, reporter).await
    }

    /// Re-imports Chocolatey's profile and reads back the refreshed `PATH`.
    async fn refresh(&self, _reporter: &dyn Reporter) -> Result<Environment, StageError> {
        let Some(root) = &self.chocolatey_root else {
            return Err(StageError::RefreshFailed {
                reason: format!("{CHOCOLATEY_ROOT_VAR} is not set"),
            });
        };

        let profile = root.join("helpers").join("chocolateyProfile.psm1");
        let script = format!(
            "Import-Module '{}'; refreshenv | Out-Null; Write-Output $env:Path",
            profile.display()
        );
        let invocation = Invocation::new("powershell").args([
            "-NoProfile",
            "-ExecutionPolicy",
            "Bypass",
            "-Command",
            script.as_str(),
        ]);

        let output = self
            .runner
            .run(&invocation)
            .await
            .map_err(|e| StageError::RefreshFailed {
                reason: format!("could not start powershell: {e}"),
            })?;

        let path = output.stdout.lines().last().unwrap_or_default().trim();
        if !output.success || path.is_empty() {
            return Err(StageError::RefreshFailed {
                reason: format!(
                    "refreshenv exited with {}: {}",
                    output.describe_exit(),
                    output.stderr.trim()
                ),
            });
        }

        Ok(Environment::with_path(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::CommandOutput;
    use crate::testing::{FakeRunner, RecordingReporter, Reply};

    fn config(bootstrap: bool) -> InstallConfig {
        InstallConfig {
            bootstrap_package_manager: bootstrap,
            ..InstallConfig::default()
        }
    }

    #[tokio::test]
    async fn missing_chocolatey_is_refused_without_bootstrap() {
        let runner = Arc::new(FakeRunner::new());
        let installer = WindowsInstaller::new(&config(false), runner.clone());

        let err = installer
            .install("nmap", &RecordingReporter::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StageError::PrerequisiteMissing { ref tool, .. } if tool == "choco"));
        // Only the probe ran.
        assert_eq!(runner.calls().len(), 1);
        assert_eq!(runner.calls_to("powershell"), 0);
    }

    #[tokio::test]
    async fn present_chocolatey_installs_package() {
        let runner =
            Arc::new(FakeRunner::new().on("choco", |_| Reply::Output(CommandOutput::ok(""))));
        let installer = WindowsInstaller::new(&config(false), runner.clone());

        installer.install("nmap", &RecordingReporter::default()).await.unwrap();
        let calls = runner.calls();
        assert_eq!(calls[0].display(), "choco --version");
        assert_eq!(calls[1].display(), "choco install nmap -y");
    }

    #[tokio::test]
    async fn bootstrap_runs_once_then_uses_installed_binary() {
        let root = PathBuf::from(r"C:\choco");
        let runner = Arc::new(
            FakeRunner::new()
                .on("choco", |inv| {
                    // The bare name is not on PATH yet; the absolute path works.
                    if inv.program == "choco" {
                        Reply::SpawnError(std::io::ErrorKind::NotFound)
                    } else {
                        Reply::Output(CommandOutput::ok(""))
                    }
                })
                .on("powershell", |_| Reply::Output(CommandOutput::ok(""))),
        );
        let installer = WindowsInstaller::new(&config(true), runner.clone())
            .with_chocolatey_root(Some(root.clone()));

        installer.install("nmap", &RecordingReporter::default()).await.unwrap();

        assert_eq!(runner.calls_to("powershell"), 1);
        let last = runner.calls().last().cloned().unwrap();
        assert_eq!(PathBuf::from(&last.program), root.join("bin").join("choco.exe"));
        assert_eq!(last.args, ["install", "nmap", "-y"]);
    }

    #[tokio::test]
    async fn failed_bootstrap_is_terminal() {
        let runner = Arc::new(FakeRunner::new().on("powershell", |_| {
            Reply::Output(CommandOutput::failed(1, "blocked"))
        }));
        let installer = WindowsInstaller::new(&config(true), runner.clone());

        let err = installer
            .install("nmap", &RecordingReporter::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StageError::InstallFailed { ref package, .. } if package == "choco"));
        assert_eq!(runner.calls_to("powershell"), 1);
    }

    #[tokio::test]
    async fn refresh_reads_back_path() {
        let runner = Arc::new(FakeRunner::new().on("powershell", |_| {
            Reply::Output(CommandOutput::ok(
                "Refreshing...\r\nC:\\Windows;C:\\Program Files (x86)\\Nmap\r\n",
            ))
        }));
        let installer = WindowsInstaller::new(&config(false), runner)
            .with_chocolatey_root(Some(PathBuf::from(r"C:\ProgramData\chocolatey")));

        let env = installer.refresh(&RecordingReporter::default()).await.unwrap();
        assert_eq!(
            env.path_override().and_then(|p| p.to_str()),
            Some("C:\\Windows;C:\\Program Files (x86)\\Nmap")
        );
    }

    #[tokio::test]
    async fn refresh_without_chocolatey_root_fails() {
        let installer = WindowsInstaller::new(&config(false), Arc::new(FakeRunner::new()))
            .with_chocolatey_root(None);
        let err = installer.refresh(&RecordingReporter::default()).await.unwrap_err();
        assert!(matches!(err, StageError::RefreshFailed { .. }));
    }
}
