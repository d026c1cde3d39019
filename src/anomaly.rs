//! Advisory detection of unflagged cheat-meal and retention days
//!
//! Works on day-to-day weight deltas. The report only lists candidate ids;
//! entries are never modified here.

use serde::{Deserialize, Serialize};

use crate::models::WeightEntry;

/// Rise from the previous entry (kg) that marks a possible cheat meal
pub const CHEAT_MEAL_RISE_KG: f64 = 0.8;
/// Drop into the next entry (kg) that confirms a cheat-meal spike
pub const CHEAT_MEAL_DROP_KG: f64 = 0.5;
/// Rise from the previous entry (kg) that marks possible fluid retention
pub const RETENTION_RISE_KG: f64 = 1.0;

/// Candidate entry ids, in date order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnomalyReport {
    pub possible_cheat_meals: Vec<String>,
    pub possible_retentions: Vec<String>,
}

impl AnomalyReport {
    pub fn is_empty(&self) -> bool {
        self.possible_cheat_meals.is_empty() && self.possible_retentions.is_empty()
    }
}

/// Scan interior entries for spikes that were not flagged by hand
pub fn detect_anomalies(entries: &[WeightEntry]) -> AnomalyReport {
    let mut report = AnomalyReport::default();
    if entries.len() < 3 {
        return report;
    }

    let mut sorted: Vec<&WeightEntry> = entries.iter().collect();
    sorted.sort_by_key(|e| e.date);

    for window in sorted.windows(3) {
        let (prev, current, next) = (window[0], window[1], window[2]);

        if current.is_cheat_meal || current.is_retention {
            continue;
        }

        let rise = current.weight - prev.weight;
        let change_to_next = next.weight - current.weight;

        if rise > CHEAT_MEAL_RISE_KG && change_to_next < -CHEAT_MEAL_DROP_KG {
            report.possible_cheat_meals.push(current.id.clone());
        }
        if rise > RETENTION_RISE_KG {
            report.possible_retentions.push(current.id.clone());
        }
    }

    tracing::debug!(
        cheat_meals = report.possible_cheat_meals.len(),
        retentions = report.possible_retentions.len(),
        "Anomaly scan complete"
    );

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn series(weights: &[f64]) -> Vec<WeightEntry> {
        let start = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        weights
            .iter()
            .enumerate()
            .map(|(i, w)| {
                WeightEntry::new(start + chrono::Days::new(i as u64), *w).with_id(format!("e{}", i))
            })
            .collect()
    }

    #[test]
    fn test_spike_flags_cheat_meal_but_not_retention_at_boundary() {
        let report = detect_anomalies(&series(&[70.0, 71.0, 70.2]));
        assert_eq!(report.possible_cheat_meals, vec!["e1".to_string()]);
        assert!(report.possible_retentions.is_empty());
    }

    #[test]
    fn test_large_rise_flags_retention() {
        let report = detect_anomalies(&series(&[70.0, 71.5, 71.4]));
        assert!(report.possible_cheat_meals.is_empty());
        assert_eq!(report.possible_retentions, vec!["e1".to_string()]);
    }

    #[test]
    fn test_both_flags_on_same_entry() {
        let report = detect_anomalies(&series(&[70.0, 71.5, 70.5]));
        assert_eq!(report.possible_cheat_meals, vec!["e1".to_string()]);
        assert_eq!(report.possible_retentions, vec!["e1".to_string()]);
    }

    #[test]
    fn test_too_few_entries() {
        assert!(detect_anomalies(&series(&[70.0, 75.0])).is_empty());
        assert!(detect_anomalies(&[]).is_empty());
    }

    #[test]
    fn test_manually_flagged_entries_are_skipped() {
        let mut entries = series(&[70.0, 72.0, 70.0]);
        entries[1] = entries[1].clone().cheat_meal();
        assert!(detect_anomalies(&entries).is_empty());
    }

    #[test]
    fn test_endpoints_never_flagged_and_order_independent() {
        let mut entries = series(&[70.0, 70.1, 72.0]);
        entries.reverse();
        assert!(detect_anomalies(&entries).is_empty());
    }

    #[test]
    fn test_entries_are_not_mutated() {
        let entries = series(&[70.0, 71.5, 70.5]);
        let before = entries.clone();
        let _ = detect_anomalies(&entries);
        assert_eq!(entries, before);
    }
}
