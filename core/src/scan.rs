use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use scanmap_common::config::Config;
use scanmap_common::error::{ScanFailure, StageError};
use scanmap_common::network::target::TargetSpec;
use scanmap_common::reporter::Reporter;
use scanmap_common::run::RunId;
use tracing::debug;

use crate::process::{CommandRunner, Environment, Invocation};

/// The XML report written by one scan. Owned by the run that created it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanReport {
    pub run_id: RunId,
    pub path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct ScanRunner {
    runner: Arc<dyn CommandRunner>,
    timeout: Duration,
    extra_args: Vec<String>,
    report_dir: PathBuf,
}

impl ScanRunner {
    pub fn new(runner: Arc<dyn CommandRunner>, config: &Config) -> Self {
        Self {
            runner,
            timeout: config.scan.timeout(),
            extra_args: config.scan.extra_args.clone(),
            report_dir: config.report.dir.clone(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Runs `<exe> [extra args] -oX <report> <target>` and waits at most the
    /// configured timeout for it.
    ///
    /// Diagnostics on stderr only produce a warning when the scanner exits
    /// cleanly; a non-zero exit is always a failure.
    pub async fn scan(
        &self,
        executable: &Path,
        target: &TargetSpec,
        run_id: RunId,
        env: &Environment,
        reporter: &dyn Reporter,
    ) -> Result<ScanReport, StageError> {
        tokio::fs::create_dir_all(&self.report_dir)
            .await
            .map_err(|source| ScanFailure::Io {
                path: self.report_dir.clone(),
                source,
            })?;
        let path = run_id.report_path(&self.report_dir);

        let invocation = Invocation::new(executable)
            .args(&self.extra_args)
            .arg("-oX")
            .arg(&path)
            .arg(target.as_str())
            .env(env);
        reporter.info(&format!("Running `{}`", invocation.display()));

        let output = match tokio::time::timeout(self.timeout, self.runner.run(&invocation)).await {
            Err(_elapsed) => return Err(ScanFailure::Timeout(self.timeout).into()),
            Ok(Err(source)) => {
                return Err(ScanFailure::Spawn {
                    program: executable.to_path_buf(),
                    source,
                }
                .into());
            }
            Ok(Ok(output)) => output,
        };

        if !output.success {
            return Err(ScanFailure::Exit {
                code: output.code,
                stderr: output.stderr,
            }
            .into());
        }

        let diagnostics = output.stderr.trim();
        if !diagnostics.is_empty() {
            reporter.warn(&format!("Scanner diagnostics: {diagnostics}"));
        }

        debug!(report = %path.display(), "scan finished");
        Ok(ScanReport { run_id, path })
    }
}
