use colored::*;
use scanmap_common::reporter::{Reporter, SUCCESS_TARGET};
use scanmap_common::stage::Stage;
use tracing::{Span, debug, info, warn};
use tracing_indicatif::span_ext::IndicatifSpanExt;

use crate::terminal::colors;

/// Shows the current stage on the spinner; messages become log lines above it.
#[derive(Debug)]
pub struct TerminalReporter {
    span: Span,
}

impl TerminalReporter {
    pub fn new(span: Span) -> Self {
        Self { span }
    }
}

fn stage_message(stage: Stage) -> &'static str {
    match stage {
        Stage::Probing => "Checking for the scanner...",
        Stage::Installing => "Installing the scanner...",
        Stage::Refreshing => "Refreshing the environment...",
        Stage::Locating => "Locating the scanner...",
        Stage::Scanning => "Scanning the network...",
        Stage::Parsing => "Reading the scan report...",
        Stage::BuildingGraph => "Building the network map...",
        Stage::Rendering => "Writing the visualization...",
    }
}

impl Reporter for TerminalReporter {
    fn stage(&self, stage: Stage) {
        debug!(%stage, "stage entered");
        let message = stage_message(stage).color(colors::TEXT_DEFAULT).to_string();
        self.span.pb_set_message(&message);
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

    /// The failure itself is printed once, with its causes, when the run ends.
    fn error(&self, msg: &str) {
        debug!("{msg}");
        self.span.pb_set_message(&"Aborting...".red().to_string());
    }
}
