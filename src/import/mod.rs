use std::fmt;
use std::fs;
use std::path::Path;

use crate::error::{ImportExportError, Result};
use crate::models::WeightEntry;
use crate::store::{Backup, WeightStore};

pub mod csv;
pub mod json;

/// A row or record that was skipped without aborting the import
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportWarning {
    /// 1-based line (CSV) or record index (JSON)
    pub line: usize,
    pub message: String,
}

impl fmt::Display for ImportWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Line {}: {}", self.line, self.message)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ImportedData {
    /// Entries only; the profile is left untouched
    Entries(Vec<WeightEntry>),
    /// Full backup replacing profile, entries and evaluation
    Backup(Backup),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportReport {
    pub data: ImportedData,
    pub warnings: Vec<ImportWarning>,
}

impl ImportReport {
    pub fn entry_count(&self) -> usize {
        match &self.data {
            ImportedData::Entries(entries) => entries.len(),
            ImportedData::Backup(backup) => backup.entries.len(),
        }
    }

    /// Replace the store's data with what was imported
    pub fn apply_to(self, store: &mut WeightStore) {
        match self.data {
            ImportedData::Entries(entries) => store.import_entries(entries),
            ImportedData::Backup(backup) => store.restore(backup),
        }
    }
}

/// Trait for importing weight data from different file formats
pub trait ImportFormat {
    /// Check if this importer can handle the given file
    fn can_import(&self, file_path: &Path) -> bool;

    /// Parse file content
    fn import_str(&self, content: &str) -> Result<ImportReport>;

    /// Get the format name for this importer
    fn format_name(&self) -> &'static str;
}

/// Manager for coordinating different import formats
pub struct ImportManager {
    importers: Vec<Box<dyn ImportFormat>>,
}

impl ImportManager {
    /// Create a new import manager with all available importers
    pub fn new() -> Self {
        let importers: Vec<Box<dyn ImportFormat>> = vec![
            Box::new(csv::CsvImporter::new()),
            Box::new(json::JsonImporter::new()),
        ];

        Self { importers }
    }

    /// Import a single file, auto-detecting the format from its extension
    pub fn import_file(&self, file_path: &Path) -> Result<ImportReport> {
        let importer = self
            .importers
            .iter()
            .find(|importer| importer.can_import(file_path))
            .ok_or_else(|| ImportExportError::UnsupportedFormat {
                format: file_path
                    .extension()
                    .map(|ext| ext.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "<none>".to_string()),
            })?;

        tracing::info!(
            path = %file_path.display(),
            format = importer.format_name(),
            "Importing file"
        );

        let content = fs::read_to_string(file_path)?;
        let report = importer.import_str(strip_bom(&content))?;

        for warning in &report.warnings {
            tracing::warn!(path = %file_path.display(), "{}", warning);
        }
        tracing::info!(
            entries = report.entry_count(),
            warnings = report.warnings.len(),
            "Import finished"
        );

        Ok(report)
    }

    /// Check if this manager can import a given file
    pub fn can_import_file(&self, file_path: &Path) -> bool {
        self.importers
            .iter()
            .any(|importer| importer.can_import(file_path))
    }
}

impl Default for ImportManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Spreadsheet exports often prepend a UTF-8 byte order mark
fn strip_bom(content: &str) -> &str {
    content.strip_prefix('\u{feff}').unwrap_or(content)
}

fn has_extension(file_path: &Path, wanted: &str) -> bool {
    file_path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(wanted))
        .unwrap_or(false)
}
