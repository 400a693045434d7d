//! # Progress Reporting
//!
//! Pipeline stages never print. They talk to a [`Reporter`] handed to them by
//! whoever drives the pipeline, which decides how (or whether) to show it.

use std::fmt::Debug;

use tracing::{error, info, warn};

use crate::stage::Stage;

/// `tracing` target of success messages, so a formatter can mark them apart.
pub const SUCCESS_TARGET: &str = "scanmap::success";

pub trait Reporter: Send + Sync + Debug {
    /// Called when the pipeline enters `stage`.
    fn stage(&self, stage: Stage);
    fn info(&self, msg: &str);
    fn success(&self, msg: &str);
    fn warn(&self, msg: &str);
    fn error(&self, msg: &str);
}

/// Forwards everything to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn stage(&self, stage: Stage) {
        info!(target: "scanmap::stage", %stage, "entering {stage} stage");
    }

    fn info(&self, msg: &str) {
        info!("{msg}");
    }

    fn success(&self, msg: &str) {
        info!(target: SUCCESS_TARGET, "{msg}");
    }

    fn warn(&self, msg: &str) {
        warn!("{msg}");
    }

    fn error(&self, msg: &str) {
        error!("{msg}");
    }
}
