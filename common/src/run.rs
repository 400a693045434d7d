use std::fmt;
use std::path::{Path, PathBuf};

/// Identifies one pipeline run. Scopes the report file so concurrent runs never
/// read each other's output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunId(u32);

impl RunId {
    pub fn random() -> Self {
        Self(rand::random::<u32>())
    }

    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// `<dir>/scan-<id>.xml`
    pub fn report_path(&self, dir: &Path) -> PathBuf {
        dir.join(format!("scan-{self}.xml"))
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}", self.0)
    }
}
