use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{ImportExportError, Result};
use crate::models::WeightEntry;
use crate::store::Backup;

pub mod csv;
pub mod json;

/// Export format types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            _ => Err(ImportExportError::UnsupportedFormat {
                format: s.to_string(),
            }
            .into()),
        }
    }

    /// Guess the format from a file extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();
        Self::from_str(ext)
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}

/// Date range filter for exports
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        DateRange { start, end }
    }

    /// Check if a date falls within this range
    pub fn contains(&self, date: &NaiveDate) -> bool {
        let after_start = self.start.map_or(true, |start| date >= &start);
        let before_end = self.end.map_or(true, |end| date <= &end);
        after_start && before_end
    }

    /// Entries inside the range, oldest first
    pub fn filter_entries(&self, entries: &[WeightEntry]) -> Vec<WeightEntry> {
        let mut selected: Vec<WeightEntry> = entries
            .iter()
            .filter(|e| self.contains(&e.date))
            .cloned()
            .collect();
        selected.sort_by(|a, b| a.date.cmp(&b.date).then(a.created_at.cmp(&b.created_at)));
        selected
    }
}

/// Write `backup` to `output_path` in the requested format.
///
/// CSV carries entries only; JSON carries the whole backup and needs a profile.
pub fn export_to_file(
    backup: &Backup,
    format: ExportFormat,
    range: DateRange,
    output_path: &Path,
) -> Result<usize> {
    let entries = range.filter_entries(&backup.entries);
    let count = entries.len();
    let content = match format {
        ExportFormat::Csv => csv::entries_to_csv(&entries)?,
        ExportFormat::Json => {
            let scoped = Backup {
                entries,
                ..backup.clone()
            };
            json::backup_to_json(&scoped)?
        }
    };

    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(output_path, content).map_err(|e| ImportExportError::ExportFailed {
        path: output_path.to_path_buf(),
        reason: e.to_string(),
    })?;

    tracing::info!(
        path = %output_path.display(),
        format = format.extension(),
        entries = count,
        "Exported weight data"
    );
    Ok(count)
}
