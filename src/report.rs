use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

pub const COMMON_PAIRS: &str = "pairs.common.txt";
pub const WRONG_PAIRS: &str = "pairs.wrong.txt";
pub const BRIDGE_MATCH: &str = "bridge.match.txt";
pub const BRIDGE_MISMATCH: &str = "bridge.mismatch.txt";

/// Directory receiving the plain-text evaluation reports.
#[derive(Debug, Clone)]
pub struct ReportDir {
    dir: PathBuf,
}

impl ReportDir {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Create (truncating) one report file, creating the directory first.
    pub fn create(&self, name: &str) -> Result<BufWriter<File>> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed to create report directory {}", self.dir.display()))?;
        let path = self.path(name);
        let file = File::create(&path)
            .with_context(|| format!("failed to create report {}", path.display()))?;
        Ok(BufWriter::new(file))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// `numerator / denominator`, or `None` when the denominator is zero.
pub fn ratio(numerator: u64, denominator: u64) -> Option<f64> {
    if denominator == 0 {
        None
    } else {
        Some(numerator as f64 / denominator as f64)
    }
}

pub fn format_ratio(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.4}"),
        None => "N/A".to_string(),
    }
}
