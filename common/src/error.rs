//! # Error Taxonomy
//!
//! Every pipeline stage fails with a [`StageError`]. The controller wraps it in a
//! [`PipelineError`] that names the [`Stage`] that broke, so a user can tell from
//! the message alone whether the install, the scan or the report was at fault.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::stage::Stage;

#[derive(Debug, Error)]
pub enum StageError {
    /// The platform installer needs a package manager that is not present.
    #[error("prerequisite '{tool}' is missing: {hint}")]
    PrerequisiteMissing { tool: String, hint: String },

    #[error("installing '{package}' failed: {reason}")]
    InstallFailed { package: String, reason: String },

    /// Non-fatal. The controller logs it and keeps going.
    #[error("environment refresh failed: {reason}")]
    RefreshFailed { reason: String },

    #[error("'{tool}' not found (tried {} locations and PATH)", tried.len())]
    NotFound { tool: String, tried: Vec<PathBuf> },

    #[error("scan failed: {0}")]
    ScanFailed(#[from] ScanFailure),

    #[error("cannot read report {}: {source}", path.display())]
    ReportUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed report {}: {reason}", path.display())]
    ReportMalformed { path: PathBuf, reason: String },

    #[error("cannot write {}: {source}", path.display())]
    ArtifactWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Ways the scanner invocation can go wrong.
#[derive(Debug, Error)]
pub enum ScanFailure {
    #[error("could not start {}: {source}", program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("scanner exited with {}: {}", exit_status(*code), stderr.trim())]
    Exit { code: Option<i32>, stderr: String },

    #[error("scanner did not finish within {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("preparing report location {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn exit_status(code: Option<i32>) -> String {
    code.map_or_else(|| "a signal".to_string(), |c| format!("status {c}"))
}

/// A fatal stage failure, tagged with the stage it happened in.
#[derive(Debug, Error)]
#[error("{stage} stage failed: {source}")]
pub struct PipelineError {
    pub stage: Stage,
    #[source]
    pub source: StageError,
}

impl PipelineError {
    pub fn new(stage: Stage, source: StageError) -> Self {
        Self { stage, source }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {origin}: {source}")]
    Parse {
        origin: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid config value for '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}
