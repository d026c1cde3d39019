use chrono::Utc;

use crate::error::{ImportExportError, Result};
use crate::store::Backup;

/// Pretty-printed backup with entries oldest first and a fresh export date
pub fn backup_to_json(backup: &Backup) -> Result<String> {
    if backup.profile.is_none() {
        return Err(ImportExportError::MissingData {
            field: "profile".to_string(),
        }
        .into());
    }

    let mut out = backup.clone();
    out.entries
        .sort_by(|a, b| a.date.cmp(&b.date).then(a.created_at.cmp(&b.created_at)));
    out.export_date = Some(Utc::now());

    serde_json::to_string_pretty(&out).map_err(|e| {
        ImportExportError::ParseError {
            format: "JSON".to_string(),
            reason: e.to_string(),
        }
        .into()
    })
}
