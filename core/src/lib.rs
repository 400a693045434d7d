//! # Scanmap Core
//!
//! The pipeline stages and the controller that sequences them.
//!
//! ## Layout
//! * **[`pipeline`]**: The controller. Owns the state machine and the run history.
//! * **Stages**: [`probe`], [`installer`], [`locator`], [`scan`], [`report`],
//!   [`graph`], [`render`]. Each is an `async` (or plain) function over typed
//!   inputs returning `Result<_, StageError>`.
//! * **Seams**: every outside effect sits behind a trait.
//!     * [`process::CommandRunner`] spawns processes.
//!     * [`installer::Installer`] wraps a platform package manager.
//!     * [`locator::PathLookup`] searches `PATH`.
//!     * [`render::Renderer`] writes the artifact.

pub mod graph;
pub mod installer;
pub mod locator;
pub mod pipeline;
pub mod probe;
pub mod process;
pub mod render;
pub mod report;
pub mod scan;

#[cfg(test)]
mod testing;
