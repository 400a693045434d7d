//! Shared models for `scanmap`: targets, host records, the graph handed to the
//! renderer, stage bookkeeping, errors and configuration.

pub mod config;
pub mod error;
pub mod graph;
pub mod network;
pub mod platform;
pub mod reporter;
pub mod run;
pub mod stage;
