use std::path::{Path, PathBuf};

use glob::glob;

use crate::{ConcertError, Result};

/// A named list of bands processed into one report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    pub name: String,
    pub bands: Vec<String>,
}

impl Batch {
    pub fn new(name: impl Into<String>, bands: Vec<String>) -> Self {
        Self {
            name: name.into(),
            bands,
        }
    }

    /// Reads a bands file: one name per line, blank lines ignored. The batch
    /// takes the file stem as its name. Bytes that are not UTF-8 are replaced
    /// rather than rejected.
    pub fn from_file(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let contents = String::from_utf8_lossy(&bytes);
        Ok(Self::new(batch_name(path)?, parse_bands(&contents)))
    }
}

fn batch_name(path: &Path) -> Result<String> {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .ok_or_else(|| ConcertError::msg(format!("`{}` has no file name", path.display())))
}

pub fn parse_bands(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

/// A batch that is either already in memory or still sitting in a file.
/// Files are only read by [`BatchEntry::load`], so a bad file fails its own
/// batch and nothing else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchEntry {
    Loaded(Batch),
    File(PathBuf),
}

impl BatchEntry {
    /// Name used in logs and the run summary, available before loading.
    pub fn name(&self) -> String {
        match self {
            BatchEntry::Loaded(batch) => batch.name.clone(),
            BatchEntry::File(path) => {
                batch_name(path).unwrap_or_else(|_| path.display().to_string())
            }
        }
    }

    pub fn load(self) -> Result<Batch> {
        match self {
            BatchEntry::Loaded(batch) => Ok(batch),
            BatchEntry::File(path) => Batch::from_file(&path),
        }
    }
}

/// Enumerates the batches of one run.
pub trait BatchSource {
    fn entries(&self) -> Result<Vec<BatchEntry>>;
}

/// One batch per file matching a glob pattern, in path order.
#[derive(Debug, Clone)]
pub struct GlobBatchSource {
    pattern: String,
}

impl GlobBatchSource {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
        }
    }

    fn matching_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in glob(&self.pattern)? {
            match entry {
                Ok(path) if path.is_file() => files.push(path),
                Ok(_) => {}
                Err(err) => tracing::warn!(error = %err, "unreadable batch path"),
            }
        }
        files.sort();
        Ok(files)
    }
}

impl BatchSource for GlobBatchSource {
    fn entries(&self) -> Result<Vec<BatchEntry>> {
        let files = self.matching_files()?;
        if files.is_empty() {
            tracing::warn!(pattern = %self.pattern, "no batch files matched");
        }
        Ok(files.into_iter().map(BatchEntry::File).collect())
    }
}

/// A fixed list of batches, e.g. a single file named on the command line.
#[derive(Debug, Clone, Default)]
pub struct StaticBatchSource {
    entries: Vec<BatchEntry>,
}

impl StaticBatchSource {
    pub fn new(batches: Vec<Batch>) -> Self {
        Self {
            entries: batches.into_iter().map(BatchEntry::Loaded).collect(),
        }
    }

    pub fn from_files(paths: Vec<PathBuf>) -> Self {
        Self {
            entries: paths.into_iter().map(BatchEntry::File).collect(),
        }
    }
}

impl BatchSource for StaticBatchSource {
    fn entries(&self) -> Result<Vec<BatchEntry>> {
        Ok(self.entries.clone())
    }
}
