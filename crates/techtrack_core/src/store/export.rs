//! Export serialization and file naming.

use crate::model::record::TechnologyRecord;
use crate::store::stats::{compute_stats, TechnologyStats};
use chrono::NaiveDate;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Failure producing or writing an export.
#[derive(Debug)]
pub enum ExportError {
    Serialize(serde_json::Error),
    Io { path: PathBuf, source: std::io::Error },
}

impl Display for ExportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Serialize(err) => write!(f, "failed to serialize export: {err}"),
            Self::Io { path, source } => {
                write!(f, "failed to write export `{}`: {source}", path.display())
            }
        }
    }
}

impl Error for ExportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Serialize(err) => Some(err),
            Self::Io { source, .. } => Some(source),
        }
    }
}

impl From<serde_json::Error> for ExportError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialize(value)
    }
}

/// Export envelope: the records plus metadata and aggregate counters.
///
/// Re-importable: the import path reads its `technologies` field.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument<'a> {
    pub technologies: &'a [TechnologyRecord],
    pub exported_at: String,
    pub total: usize,
    pub planned: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub paused: usize,
    /// Completion rate in percent.
    pub progress: u8,
    pub average_progress: u8,
}

impl<'a> ExportDocument<'a> {
    pub fn new(technologies: &'a [TechnologyRecord], exported_at: impl Into<String>) -> Self {
        let TechnologyStats {
            total,
            planned,
            in_progress,
            completed,
            paused,
            average_progress,
            completion_rate,
        } = compute_stats(technologies);
        Self {
            technologies,
            exported_at: exported_at.into(),
            total,
            planned,
            in_progress,
            completed,
            paused,
            progress: completion_rate,
            average_progress,
        }
    }
}

/// `technologies_<YYYY-MM-DD>.json`
pub fn export_file_name(date: NaiveDate) -> String {
    format!("technologies_{}.json", date.format("%Y-%m-%d"))
}

/// Writes `contents` to `dir/export_file_name(date)` and returns the path.
pub fn write_export_file(dir: &Path, date: NaiveDate, contents: &str) -> Result<PathBuf, ExportError> {
    let path = dir.join(export_file_name(date));
    std::fs::write(&path, contents).map_err(|source| ExportError::Io {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}
