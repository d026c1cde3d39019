use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, Trim};
use std::path::Path;

use super::{has_extension, ImportFormat, ImportReport, ImportWarning, ImportedData};
use crate::error::{ImportExportError, Result};
use crate::models::{is_plausible_weight, WeightEntry, MAX_WEIGHT_KG};

/// Column order written by the exporter
pub const CSV_HEADER: [&str; 5] = ["Fecha", "Peso (kg)", "Cheat Meal", "Retención", "Notas"];

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%d/%m/%Y"];
const TRUE_VALUES: [&str; 5] = ["sí", "si", "yes", "true", "1"];

/// CSV importer for the date/weight/flags/notes layout.
///
/// Rows that cannot be read are reported as warnings; the import only fails
/// when no row at all survives.
pub struct CsvImporter;

impl CsvImporter {
    pub fn new() -> Self {
        CsvImporter
    }

    /// `;` wins whenever the content contains one
    fn detect_delimiter(content: &str) -> u8 {
        if content.contains(';') {
            b';'
        } else {
            b','
        }
    }

    fn parse_date(value: &str) -> Option<NaiveDate> {
        DATE_FORMATS
            .iter()
            .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
    }

    /// Accepts both `80.5` and `80,5`
    fn parse_weight(value: &str) -> Option<f64> {
        value
            .replace(',', ".")
            .parse::<f64>()
            .ok()
            .filter(|w| is_plausible_weight(*w))
    }

    fn parse_flag(value: Option<&str>) -> bool {
        value
            .map(|v| TRUE_VALUES.contains(&v.to_lowercase().as_str()))
            .unwrap_or(false)
    }

    fn parse_record(record: &StringRecord) -> std::result::Result<WeightEntry, String> {
        if record.len() < 2 {
            return Err("Invalid format".to_string());
        }
        let date_str = record.get(0).unwrap_or_default();
        let weight_str = record.get(1).unwrap_or_default();

        let date = Self::parse_date(date_str)
            .ok_or_else(|| format!("Invalid date \"{}\"", date_str))?;
        let weight = Self::parse_weight(weight_str).ok_or_else(|| {
            format!(
                "Invalid weight \"{}\" (expected 0-{} kg)",
                weight_str, MAX_WEIGHT_KG
            )
        })?;

        let mut entry = WeightEntry::new(date, weight);
        entry.is_cheat_meal = Self::parse_flag(record.get(2));
        entry.is_retention = Self::parse_flag(record.get(3));
        entry.notes = record
            .get(4)
            .filter(|notes| !notes.is_empty())
            .map(str::to_string);

        Ok(entry)
    }

    /// Parse CSV text into entries plus per-row warnings
    pub fn parse(content: &str) -> Result<(Vec<WeightEntry>, Vec<ImportWarning>)> {
        let mut reader = ReaderBuilder::new()
            .delimiter(Self::detect_delimiter(content))
            .has_headers(true)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(content.trim().as_bytes());

        let mut entries = Vec::new();
        let mut warnings = Vec::new();
        let mut rows = 0usize;

        for (index, result) in reader.records().enumerate() {
            // Header is line 1
            let fallback_line = index + 2;
            let record = match result {
                Ok(record) => record,
                Err(e) => {
                    rows += 1;
                    warnings.push(ImportWarning {
                        line: fallback_line,
                        message: format!("Could not read row: {}", e),
                    });
                    continue;
                }
            };
            if record.iter().all(|field| field.is_empty()) {
                continue;
            }
            rows += 1;

            let line = record
                .position()
                .map(|p| p.line() as usize)
                .unwrap_or(fallback_line);

            match Self::parse_record(&record) {
                Ok(entry) => entries.push(entry),
                Err(message) => warnings.push(ImportWarning { line, message }),
            }
        }

        if rows == 0 {
            return Err(ImportExportError::InvalidStructure {
                reason: "CSV file is empty or has no data rows".to_string(),
            }
            .into());
        }
        if entries.is_empty() {
            return Err(ImportExportError::NoValidRows {
                rejected: warnings.len(),
            }
            .into());
        }

        Ok((entries, warnings))
    }
}

impl Default for CsvImporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ImportFormat for CsvImporter {
    fn can_import(&self, file_path: &Path) -> bool {
        has_extension(file_path, "csv")
    }

    fn import_str(&self, content: &str) -> Result<ImportReport> {
        let (entries, warnings) = Self::parse(content)?;
        Ok(ImportReport {
            data: ImportedData::Entries(entries),
            warnings,
        })
    }

    fn format_name(&self) -> &'static str {
        "CSV"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WeightrsError;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_exported_layout() {
        let content = "Fecha,Peso (kg),Cheat Meal,Retención,Notas\n\
                       2025-01-01,80.5,No,No,\n\
                       2025-01-02,81.4,Sí,No,\"pizza, \"\"large\"\"\"\n\
                       2025-01-03,80.9,no,yes,\n";
        let (entries, warnings) = CsvImporter::parse(content).unwrap();

        assert!(warnings.is_empty());
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].date, date(2025, 1, 1));
        assert_eq!(entries[0].weight, 80.5);
        assert_eq!(entries[0].notes, None);
        assert!(entries[1].is_cheat_meal);
        assert_eq!(entries[1].notes.as_deref(), Some("pizza, \"large\""));
        assert!(entries[2].is_retention);
        assert!(!entries[2].is_cheat_meal);
    }

    #[test]
    fn test_semicolon_and_comma_decimals() {
        let content = "Fecha;Peso (kg);Cheat Meal;Retención;Notas\n\
                       05/02/2025;79,8;Si;1;\n\
                       06/02/2025;79,6;No;0;ayuno";
        let (entries, _) = CsvImporter::parse(content).unwrap();

        assert_eq!(entries[0].date, date(2025, 2, 5));
        assert_eq!(entries[0].weight, 79.8);
        assert!(entries[0].is_cheat_meal);
        assert!(entries[0].is_retention);
        assert_eq!(entries[1].notes.as_deref(), Some("ayuno"));
    }

    #[test]
    fn test_bad_rows_become_warnings() {
        let content = "Fecha,Peso (kg)\n\
                       2025-01-01,80.5\n\
                       not-a-date,80\n\
                       2025-01-03,0\n\
                       2025-01-04,501\n\
                       \n\
                       2025-01-05\n\
                       2025-01-06,abc\n\
                       2025-01-07,79.9\n";
        let (entries, warnings) = CsvImporter::parse(content).unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(warnings.len(), 5);
        assert_eq!(warnings[0].line, 3);
        assert!(warnings[0].message.contains("Invalid date"));
        assert!(warnings[1].message.contains("Invalid weight"));
        assert!(warnings[3].message.contains("Invalid format"));
    }

    #[test]
    fn test_no_valid_rows_is_an_error() {
        let content = "Fecha,Peso (kg)\nfoo,bar\n";
        assert!(matches!(
            CsvImporter::parse(content),
            Err(WeightrsError::ImportExport(ImportExportError::NoValidRows { rejected: 1 }))
        ));
    }

    #[test]
    fn test_header_only_is_an_error() {
        assert!(matches!(
            CsvImporter::parse("Fecha,Peso (kg),Cheat Meal,Retención,Notas\n"),
            Err(WeightrsError::ImportExport(ImportExportError::InvalidStructure { .. }))
        ));
        assert!(CsvImporter::parse("").is_err());
    }
}
