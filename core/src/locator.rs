//! Resolves the scanner executable.
//!
//! Well-known install locations are checked first, in order; the first existing
//! file wins. Only when all of them miss is the PATH consulted.

use std::fmt::Debug;
use std::path::{Path, PathBuf};

use scanmap_common::config::LocatorConfig;
use scanmap_common::error::StageError;
use scanmap_common::platform::Platform;
use tracing::debug;

use crate::process::Environment;

/// PATH-based lookup, the last resort.
pub trait PathLookup: Send + Sync + Debug {
    fn lookup(&self, tool: &str, env: &Environment) -> Option<PathBuf>;
}

/// `which`/`where` semantics via the `which` crate, honoring a refreshed PATH.
#[derive(Debug, Default, Clone, Copy)]
pub struct WhichLookup;

impl PathLookup for WhichLookup {
    fn lookup(&self, tool: &str, env: &Environment) -> Option<PathBuf> {
        match env.path_override() {
            Some(path) => {
                let cwd = std::env::current_dir().ok()?;
                which::which_in(tool, Some(path), cwd).ok()
            }
            None => which::which(tool).ok(),
        }
    }
}

#[derive(Debug)]
pub struct Locator {
    candidates: Vec<PathBuf>,
    lookup: Box<dyn PathLookup>,
}

impl Locator {
    pub fn new(candidates: Vec<PathBuf>, lookup: Box<dyn PathLookup>) -> Self {
        Self { candidates, lookup }
    }

    /// Platform defaults followed by the configured extra paths.
    pub fn for_platform(platform: Platform, tool: &str, config: &LocatorConfig) -> Self {
        let mut candidates = well_known_locations(platform, tool);
        candidates.extend(config.extra_paths.iter().cloned());
        Self::new(candidates, Box::new(WhichLookup))
    }

    pub fn candidates(&self) -> &[PathBuf] {
        &self.candidates
    }

    pub fn locate(&self, tool: &str, env: &Environment) -> Result<PathBuf, StageError> {
        if let Some(found) = self.candidates.iter().find(|path| path.is_file()) {
            debug!(path = %found.display(), "found at well-known location");
            return Ok(found.clone());
        }

        if let Some(found) = self.lookup.lookup(tool, env) {
            debug!(path = %found.display(), "found on PATH");
            return Ok(found);
        }

        Err(StageError::NotFound {
            tool: tool.to_string(),
            tried: self.candidates.clone(),
        })
    }
}

pub fn well_known_locations(platform: Platform, tool: &str) -> Vec<PathBuf> {
    match platform {
        Platform::Windows => {
            let exe = format!("{tool}.exe");
            [r"C:\Program Files (x86)\Nmap", r"C:\Program Files\Nmap"]
                .iter()
                .map(|dir| Path::new(dir).join(&exe))
                .collect()
        }
        Platform::MacOs => ["/opt/homebrew/bin", "/usr/local/bin"]
            .iter()
            .map(|dir| Path::new(dir).join(tool))
            .collect(),
        Platform::Unix => ["/usr/bin", "/usr/local/bin", "/snap/bin"]
            .iter()
            .map(|dir| Path::new(dir).join(tool))
            .collect(),
    }
}
