use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::path::Path;

use super::{has_extension, ImportFormat, ImportReport, ImportWarning, ImportedData};
use crate::error::{ImportExportError, Result};
use crate::evaluation::NutritionEvaluation;
use crate::models::{is_plausible_weight, UserProfile, WeightEntry};
use crate::store::Backup;

/// Importer for JSON backups written by the exporter or by older app versions.
///
/// Older backups store calendar days as full ISO datetimes and may omit ids
/// and timestamps; both are normalised before deserialising.
pub struct JsonImporter;

impl JsonImporter {
    pub fn new() -> Self {
        JsonImporter
    }

    pub fn parse(content: &str) -> Result<(Backup, Vec<ImportWarning>)> {
        let root: Value =
            serde_json::from_str(content).map_err(|e| ImportExportError::ParseError {
                format: "JSON".to_string(),
                reason: e.to_string(),
            })?;
        let mut root = match root {
            Value::Object(map) => map,
            _ => {
                return Err(ImportExportError::InvalidStructure {
                    reason: "backup must be a JSON object".to_string(),
                }
                .into())
            }
        };

        let mut profile = match root.remove("profile") {
            Some(Value::Object(profile)) => profile,
            _ => {
                return Err(ImportExportError::MissingData {
                    field: "profile".to_string(),
                }
                .into())
            }
        };
        let raw_entries = match root.remove("entries") {
            Some(Value::Array(entries)) => entries,
            _ => {
                return Err(ImportExportError::MissingData {
                    field: "entries".to_string(),
                }
                .into())
            }
        };

        normalize_record(&mut profile);
        let profile: UserProfile = serde_json::from_value(Value::Object(profile)).map_err(|e| {
            ImportExportError::InvalidStructure {
                reason: format!("invalid profile: {}", e),
            }
        })?;

        let mut warnings = Vec::new();
        let mut entries = Vec::with_capacity(raw_entries.len());
        for (index, raw) in raw_entries.into_iter().enumerate() {
            match parse_entry(raw) {
                Ok(entry) => entries.push(entry),
                Err(message) => warnings.push(ImportWarning {
                    line: index + 1,
                    message,
                }),
            }
        }

        let evaluation = match root.remove("evaluation") {
            Some(Value::Object(mut evaluation)) => {
                normalize_record(&mut evaluation);
                match serde_json::from_value::<NutritionEvaluation>(Value::Object(evaluation)) {
                    Ok(evaluation) => Some(evaluation),
                    Err(e) => {
                        warnings.push(ImportWarning {
                            line: 0,
                            message: format!("Skipped nutrition evaluation: {}", e),
                        });
                        None
                    }
                }
            }
            _ => None,
        };

        let export_date = root
            .get("exportDate")
            .and_then(Value::as_str)
            .and_then(|s| s.parse().ok());

        Ok((
            Backup {
                profile: Some(profile),
                entries,
                evaluation,
                export_date,
            },
            warnings,
        ))
    }
}

impl Default for JsonImporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ImportFormat for JsonImporter {
    fn can_import(&self, file_path: &Path) -> bool {
        has_extension(file_path, "json")
    }

    fn import_str(&self, content: &str) -> Result<ImportReport> {
        let (backup, warnings) = Self::parse(content)?;
        Ok(ImportReport {
            data: ImportedData::Backup(backup),
            warnings,
        })
    }

    fn format_name(&self) -> &'static str {
        "JSON"
    }
}

fn parse_entry(raw: Value) -> std::result::Result<WeightEntry, String> {
    let mut record = match raw {
        Value::Object(record) => record,
        other => return Err(format!("Expected an object, found {}", other)),
    };
    normalize_record(&mut record);
    let entry: WeightEntry =
        serde_json::from_value(Value::Object(record)).map_err(|e| e.to_string())?;
    if !is_plausible_weight(entry.weight) {
        return Err(format!("Invalid weight {}", entry.weight));
    }
    Ok(entry)
}

/// Calendar-day fields: `date`, `startDate`, `gymStartDate`, ...
fn is_day_field(key: &str) -> bool {
    key == "date" || (key.ends_with("Date") && key != "exportDate")
}

/// Reduce datetimes in day fields to `yyyy-MM-dd` and fill missing ids and timestamps
fn normalize_record(record: &mut Map<String, Value>) {
    normalize_days(record);
    if record.get("id").map_or(true, Value::is_null) {
        record.insert(
            "id".to_string(),
            Value::String(uuid::Uuid::new_v4().to_string()),
        );
    }
    let now = Value::String(Utc::now().to_rfc3339());
    for key in ["createdAt", "updatedAt"] {
        if record.get(key).map_or(true, Value::is_null) {
            record.insert(key.to_string(), now.clone());
        }
    }
}

/// Calendar day (UTC) of an RFC 3339 timestamp; `None` when there is no offset
fn utc_day(value: &str) -> Option<String> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc).date_naive().format("%Y-%m-%d").to_string())
}

fn normalize_days(record: &mut Map<String, Value>) {
    for (key, value) in record.iter_mut() {
        match value {
            Value::String(s) if is_day_field(key) && s.contains('T') => {
                if let Some(day) = utc_day(s) {
                    *s = day;
                } else if s.is_char_boundary(10) {
                    s.truncate(10);
                }
            }
            Value::Object(nested) => normalize_days(nested),
            Value::Array(items) => {
                for item in items {
                    if let Value::Object(nested) = item {
                        normalize_days(nested);
                    }
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WeightrsError;
    use crate::models::GoalType;
    use chrono::NaiveDate;

    const PROFILE: &str = r#"{
        "id": "p1",
        "name": "Ana",
        "goalType": "bulk",
        "targetWeight": 70,
        "startWeight": 62.5,
        "startDate": "2025-01-01T00:00:00.000Z",
        "currentWeight": 63.1
    }"#;

    fn backup_with(entries: &str) -> String {
        format!(r#"{{"profile": {}, "entries": {}}}"#, PROFILE, entries)
    }

    #[test]
    fn test_parse_backup_with_iso_datetimes() {
        let content = backup_with(
            r#"[
                {"id": "a", "date": "2025-01-02T08:30:00.000Z", "weight": 62.8,
                 "isCheatMeal": false, "isRetention": false,
                 "createdAt": "2025-01-02T08:30:00Z", "updatedAt": "2025-01-02T08:30:00Z"},
                {"date": "2025-01-09", "weight": 63.1, "isCheatMeal": true, "notes": "boda"}
            ]"#,
        );
        let (backup, warnings) = JsonImporter::parse(&content).unwrap();

        assert!(warnings.is_empty());
        let profile = backup.profile.unwrap();
        assert_eq!(profile.goal_type, GoalType::Bulk);
        assert_eq!(profile.start_date, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        assert_eq!(backup.entries.len(), 2);
        assert_eq!(backup.entries[0].date, NaiveDate::from_ymd_opt(2025, 1, 2).unwrap());
        assert!(backup.entries[1].is_cheat_meal);
        assert!(!backup.entries[1].id.is_empty());
        assert!(backup.evaluation.is_none());
    }

    #[test]
    fn test_bad_entries_become_warnings() {
        let content = backup_with(
            r#"[
                {"date": "2025-01-02", "weight": 62.8},
                {"date": "yesterday", "weight": 62.8},
                {"date": "2025-01-04", "weight": -3},
                "garbage"
            ]"#,
        );
        let (backup, warnings) = JsonImporter::parse(&content).unwrap();

        assert_eq!(backup.entries.len(), 1);
        assert_eq!(warnings.len(), 3);
        assert_eq!(warnings[0].line, 2);
        assert!(warnings[1].message.contains("Invalid weight"));
    }

    #[test]
    fn test_missing_profile_or_entries() {
        assert!(matches!(
            JsonImporter::parse(r#"{"entries": []}"#),
            Err(WeightrsError::ImportExport(ImportExportError::MissingData { ref field }))
                if field == "profile"
        ));
        assert!(matches!(
            JsonImporter::parse(&format!(r#"{{"profile": {}}}"#, PROFILE)),
            Err(WeightrsError::ImportExport(ImportExportError::MissingData { ref field }))
                if field == "entries"
        ));
        assert!(matches!(
            JsonImporter::parse(r#"{"profile": null, "entries": []}"#),
            Err(WeightrsError::ImportExport(ImportExportError::MissingData { .. }))
        ));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            JsonImporter::parse("{not json"),
            Err(WeightrsError::ImportExport(ImportExportError::ParseError { .. }))
        ));
        assert!(matches!(
            JsonImporter::parse("[]"),
            Err(WeightrsError::ImportExport(ImportExportError::InvalidStructure { .. }))
        ));
    }

    #[test]
    fn test_invalid_profile_is_an_error() {
        let content = r#"{"profile": {"name": "x"}, "entries": []}"#;
        assert!(matches!(
            JsonImporter::parse(content),
            Err(WeightrsError::ImportExport(ImportExportError::InvalidStructure { .. }))
        ));
    }

    #[test]
    fn test_broken_evaluation_is_skipped() {
        let content = format!(
            r#"{{"profile": {}, "entries": [], "evaluation": {{"age": "old"}}}}"#,
            PROFILE
        );
        let (backup, warnings) = JsonImporter::parse(&content).unwrap();
        assert!(backup.evaluation.is_none());
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].message.contains("evaluation"));
    }

    #[test]
    fn test_offset_datetimes_resolve_to_utc_day() {
        let content = backup_with(
            r#"[
                {"date": "2025-01-01T23:30:00-05:00", "weight": 62.8},
                {"date": "2025-01-05T00:30:00+02:00", "weight": 62.9},
                {"date": "2025-01-07T10:00:00", "weight": 63.0}
            ]"#,
        );
        let (backup, warnings) = JsonImporter::parse(&content).unwrap();
        assert!(warnings.is_empty());

        let mut dates: Vec<NaiveDate> = backup.entries.iter().map(|e| e.date).collect();
        dates.sort();
        assert_eq!(
            dates,
            vec![
                NaiveDate::from_ymd_opt(2025, 1, 2).unwrap(),
                NaiveDate::from_ymd_opt(2025, 1, 4).unwrap(),
                NaiveDate::from_ymd_opt(2025, 1, 7).unwrap(),
            ]
        );
    }

    #[test]
    fn test_utc_day() {
        assert_eq!(utc_day("2025-03-01T00:15:00+01:00").as_deref(), Some("2025-02-28"));
        assert_eq!(utc_day("2025-03-01T08:00:00.000Z").as_deref(), Some("2025-03-01"));
        assert_eq!(utc_day("2025-03-01T08:00:00"), None);
    }

    #[test]
    fn test_day_field_detection() {
        assert!(is_day_field("date"));
        assert!(is_day_field("gymStartDate"));
        assert!(!is_day_field("exportDate"));
        assert!(!is_day_field("createdAt"));
    }
}
