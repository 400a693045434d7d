//! End-to-end scenarios for the scan pipeline, driven by a scripted process
//! runner so no real scanner or package manager is needed.

#[cfg(test)]
mod pipeline;
#[cfg(test)]
mod support;
