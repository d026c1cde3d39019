use csv::WriterBuilder;

use crate::error::{ImportExportError, Result};
use crate::import::csv::CSV_HEADER;
use crate::models::WeightEntry;

const BOM: &str = "\u{feff}";

fn flag(value: bool) -> &'static str {
    if value {
        "Sí"
    } else {
        "No"
    }
}

fn csv_error(e: impl ToString) -> ImportExportError {
    ImportExportError::ParseError {
        format: "CSV".to_string(),
        reason: e.to_string(),
    }
}

/// Render entries in the order given, prefixed with a UTF-8 BOM so
/// spreadsheet apps detect the encoding
pub fn entries_to_csv(entries: &[WeightEntry]) -> Result<String> {
    let mut writer = WriterBuilder::new().from_writer(Vec::new());
    writer.write_record(CSV_HEADER).map_err(csv_error)?;

    for entry in entries {
        writer
            .write_record([
                entry.date.format("%Y-%m-%d").to_string().as_str(),
                entry.weight.to_string().as_str(),
                flag(entry.is_cheat_meal),
                flag(entry.is_retention),
                entry.notes.as_deref().unwrap_or(""),
            ])
            .map_err(csv_error)?;
    }

    let bytes = writer.into_inner().map_err(csv_error)?;
    let body = String::from_utf8(bytes).map_err(csv_error)?;
    Ok(format!("{}{}", BOM, body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::csv::CsvImporter;
    use chrono::NaiveDate;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, day).unwrap()
    }

    #[test]
    fn test_csv_layout() {
        let entries = vec![
            WeightEntry::new(date(1), 80.5),
            WeightEntry::new(date(2), 81.2)
                .cheat_meal()
                .with_notes("cumple, tarta"),
        ];
        let csv = entries_to_csv(&entries).unwrap();
        let lines: Vec<&str> = csv.trim_start_matches(BOM).lines().collect();

        assert_eq!(lines[0], "Fecha,Peso (kg),Cheat Meal,Retención,Notas");
        assert_eq!(lines[1], "2025-06-01,80.5,No,No,");
        assert_eq!(lines[2], "2025-06-02,81.2,Sí,No,\"cumple, tarta\"");
    }

    #[test]
    fn test_exported_csv_reimports() {
        let entries = vec![
            WeightEntry::new(date(3), 79.9).retention(),
            WeightEntry::new(date(4), 79.4).with_notes("dijo \"ok\""),
        ];
        let csv = entries_to_csv(&entries).unwrap();
        let (back, warnings) = CsvImporter::parse(csv.trim_start_matches(BOM)).unwrap();

        assert!(warnings.is_empty());
        assert_eq!(back.len(), 2);
        assert!(back[0].is_retention);
        assert_eq!(back[1].notes.as_deref(), Some("dijo \"ok\""));
        assert_eq!(back[1].weight, 79.4);
    }
}
