//! # Pipeline Stages
//!
//! The states a single run moves through. A run only ever moves forward:
//!
//! ```text
//! Idle -> Probing -> (Installing -> Refreshing)? -> Locating -> Scanning
//!      -> Parsing -> BuildingGraph -> Rendering -> Done
//! ```
//!
//! Any non-terminal state may instead end in [`PipelineState::Failed`].

use std::fmt;

/// One discrete unit of work in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Probing,
    Installing,
    Refreshing,
    Locating,
    Scanning,
    Parsing,
    BuildingGraph,
    Rendering,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Probing => "probing",
            Stage::Installing => "installing",
            Stage::Refreshing => "refreshing",
            Stage::Locating => "locating",
            Stage::Scanning => "scanning",
            Stage::Parsing => "parsing",
            Stage::BuildingGraph => "building graph",
            Stage::Rendering => "rendering",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Running(Stage),
    Done,
    Failed { stage: Stage, reason: String },
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineState::Idle => f.write_str("idle"),
            PipelineState::Running(stage) => write!(f, "{stage}"),
            PipelineState::Done => f.write_str("done"),
            PipelineState::Failed { stage, reason } => write!(f, "failed({stage}): {reason}"),
        }
    }
}
