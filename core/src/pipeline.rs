//! # Pipeline Controller
//!
//! Drives one scan run through its stages, strictly in order:
//!
//! ```text
//! Idle -> Probing -> (Installing -> Refreshing)? -> Locating -> Scanning
//!      -> Parsing -> BuildingGraph -> Rendering -> Done
//! ```
//!
//! Any stage may end the run in `Failed`; nothing after it runs and nothing is
//! retried. The one exception is `Refreshing`, whose failure is only a warning:
//! the locator still gets a chance to find the freshly installed tool.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use scanmap_common::config::Config;
use scanmap_common::error::{PipelineError, StageError};
use scanmap_common::graph::GraphModel;
use scanmap_common::network::target::TargetSpec;
use scanmap_common::platform::Platform;
use scanmap_common::reporter::{Reporter, TracingReporter};
use scanmap_common::run::RunId;
use scanmap_common::stage::{PipelineState, Stage};
use tracing::debug;

use crate::installer::{Installer, select_installer};
use crate::locator::Locator;
use crate::probe::Prober;
use crate::process::{CommandRunner, Environment, SystemRunner};
use crate::render::{HtmlRenderer, Renderer};
use crate::scan::{ScanReport, ScanRunner};
use crate::{graph, report};

/// Everything a successful run produced.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub run_id: RunId,
    pub target: TargetSpec,
    pub report: ScanReport,
    pub graph: GraphModel,
    pub artifact: PathBuf,
    /// Whether the scanner had to be installed first.
    pub installed: bool,
    history: Vec<PipelineState>,
}

impl RunSummary {
    pub fn history(&self) -> &[PipelineState] {
        &self.history
    }
}

/// Collaborators default to the real thing for the current platform; tests swap
/// in fakes.
pub struct PipelineBuilder {
    config: Config,
    platform: Option<Platform>,
    runner: Option<Arc<dyn CommandRunner>>,
    installer: Option<Box<dyn Installer>>,
    locator: Option<Locator>,
    renderer: Option<Box<dyn Renderer>>,
    reporter: Option<Arc<dyn Reporter>>,
}

impl PipelineBuilder {
    pub fn platform(mut self, platform: Platform) -> Self {
        self.platform = Some(platform);
        self
    }

    pub fn runner(mut self, runner: Arc<dyn CommandRunner>) -> Self {
        self.runner = Some(runner);
        self
    }

    pub fn installer(mut self, installer: Box<dyn Installer>) -> Self {
        self.installer = Some(installer);
        self
    }

    pub fn locator(mut self, locator: Locator) -> Self {
        self.locator = Some(locator);
        self
    }

    pub fn renderer(mut self, renderer: Box<dyn Renderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    pub fn build(self) -> PipelineController {
        let platform = self.platform.unwrap_or_else(Platform::current);
        let runner = self
            .runner
            .unwrap_or_else(|| Arc::new(SystemRunner) as Arc<dyn CommandRunner>);
        let installer = self
            .installer
            .unwrap_or_else(|| select_installer(platform, &self.config, runner.clone()));
        let locator = self.locator.unwrap_or_else(|| {
            Locator::for_platform(platform, &self.config.tool, &self.config.locator)
        });

        debug!(%platform, installer = installer.name(), "pipeline assembled");

        PipelineController {
            prober: Prober::new(runner.clone()),
            scanner: ScanRunner::new(runner, &self.config),
            installer,
            locator,
            renderer: self.renderer.unwrap_or_else(|| Box::new(HtmlRenderer)),
            reporter: self.reporter.unwrap_or_else(|| Arc::new(TracingReporter)),
            config: self.config,
            history: vec![PipelineState::Idle],
        }
    }
}

pub struct PipelineController {
    config: Config,
    prober: Prober,
    installer: Box<dyn Installer>,
    locator: Locator,
    scanner: ScanRunner,
    renderer: Box<dyn Renderer>,
    reporter: Arc<dyn Reporter>,
    history: Vec<PipelineState>,
}

impl PipelineController {
    pub fn builder(config: Config) -> PipelineBuilder {
        PipelineBuilder {
            config,
            platform: None,
            runner: None,
            installer: None,
            locator: None,
            renderer: None,
            reporter: None,
        }
    }

    /// States visited by the last (or current) run, starting at `Idle`.
    pub fn history(&self) -> &[PipelineState] {
        &self.history
    }

    pub fn state(&self) -> PipelineState {
        self.history.last().cloned().unwrap_or(PipelineState::Idle)
    }

    pub async fn run(&mut self, target: TargetSpec) -> Result<RunSummary, PipelineError> {
        self.history = vec![PipelineState::Idle];

        match self.execute(target).await {
            Ok(mut summary) => {
                self.history.push(PipelineState::Done);
                summary.history = self.history.clone();
                Ok(summary)
            }
            Err(err) => {
                self.history.push(PipelineState::Failed {
                    stage: err.stage,
                    reason: err.source.to_string(),
                });
                self.reporter.error(&err.to_string());
                Err(err)
            }
        }
    }

    fn enter(&mut self, stage: Stage) {
        self.history.push(PipelineState::Running(stage));
        self.reporter.stage(stage);
    }

    async fn execute(&mut self, target: TargetSpec) -> Result<RunSummary, PipelineError> {
        let tool = self.config.tool.clone();
        let mut env = Environment::inherited();
        let mut installed = false;

        self.enter(Stage::Probing);
        if self.prober.probe(&tool, &env).await.is_present() {
            self.reporter.success(&format!("{tool} is installed"));
        } else {
            self.reporter.warn(&format!(
                "{tool} is not installed; installing it with {}",
                self.installer.name()
            ));

            self.enter(Stage::Installing);
            let package = self.config.install.package_for(&tool).to_string();
            self.installer
                .install(&package, self.reporter.as_ref())
                .await
                .map_err(failed_at(Stage::Installing))?;
            installed = true;
            self.reporter.success(&format!("{package} installed"));

            self.enter(Stage::Refreshing);
            match self.installer.refresh(self.reporter.as_ref()).await {
                Ok(refreshed) => env = refreshed,
                Err(err) => self
                    .reporter
                    .warn(&format!("{err}; continuing with the current PATH")),
            }
        }

        self.enter(Stage::Locating);
        let executable = self
            .locator
            .locate(&tool, &env)
            .map_err(failed_at(Stage::Locating))?;
        self.reporter
            .info(&format!("Using {}", executable.display()));

        self.enter(Stage::Scanning);
        let run_id = RunId::random();
        let scan_report = self
            .scanner
            .scan(&executable, &target, run_id, &env, self.reporter.as_ref())
            .await
            .map_err(failed_at(Stage::Scanning))?;

        self.enter(Stage::Parsing);
        let parsed = report::parse(&scan_report.path).await;
        if !self.config.report.keep {
            self.discard_report(&scan_report.path).await;
        }
        let inventory = parsed.map_err(failed_at(Stage::Parsing))?;

        self.enter(Stage::BuildingGraph);
        let graph = graph::build(&inventory);

        self.enter(Stage::Rendering);
        let artifact = self.config.output.path.clone();
        self.renderer
            .render(&graph, &artifact)
            .await
            .map_err(failed_at(Stage::Rendering))?;

        Ok(RunSummary {
            run_id,
            target,
            report: scan_report,
            graph,
            artifact,
            installed,
            history: Vec::new(),
        })
    }

    async fn discard_report(&self, path: &Path) {
        match tokio::fs::remove_file(path).await {
            Ok(()) => debug!(report = %path.display(), "report removed"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => self
                .reporter
                .warn(&format!("could not remove {}: {e}", path.display())),
        }
    }
}

fn failed_at(stage: Stage) -> impl FnOnce(StageError) -> PipelineError {
    move |source| PipelineError::new(stage, source)
}
