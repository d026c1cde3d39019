//! Bulk planning: recommended gain ranges and end-weight projections

use serde::{Deserialize, Serialize};

use crate::models::{ExperienceLevel, UserProfile, WeightEntry};

/// Average weeks in a month used for projections
pub const WEEKS_PER_MONTH: f64 = 4.33;

pub const DEFAULT_BULK_MONTHS: u32 = 3;

/// Recommended weekly gain band (kg/week)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GainRange {
    pub min: f64,
    pub max: f64,
}

impl GainRange {
    pub fn for_level(level: ExperienceLevel) -> Self {
        match level {
            ExperienceLevel::Beginner => GainRange { min: 0.25, max: 0.5 },
            ExperienceLevel::Intermediate => GainRange { min: 0.15, max: 0.35 },
            ExperienceLevel::Advanced => GainRange { min: 0.1, max: 0.25 },
        }
    }

    pub fn midpoint(&self) -> f64 {
        (self.min + self.max) / 2.0
    }

    pub fn assess(&self, weekly_rate: f64) -> RateAssessment {
        if weekly_rate < self.min {
            RateAssessment::BelowRange
        } else if weekly_rate > self.max {
            RateAssessment::AboveRange
        } else {
            RateAssessment::WithinRange
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RateAssessment {
    BelowRange,
    WithinRange,
    AboveRange,
}

/// One gain scenario over the planned bulk
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Projection {
    pub weekly_gain: f64,
    pub monthly_gain: f64,
    pub total_gain: f64,
    pub final_weight: f64,
}

impl Projection {
    fn at_rate(weekly_gain: f64, months: u32, current_weight: f64) -> Self {
        let monthly_gain = weekly_gain * WEEKS_PER_MONTH;
        let total_gain = monthly_gain * f64::from(months);
        Projection {
            weekly_gain,
            monthly_gain,
            total_gain,
            final_weight: current_weight + total_gain,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Projections {
    pub conservative: Projection,
    pub optimal: Projection,
    pub aggressive: Projection,
}

/// Observed progress between the first and last valid entries
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkProgress {
    pub days_elapsed: i64,
    pub weeks_elapsed: f64,
    pub months_elapsed: f64,
    pub weight_gained: f64,
    pub weekly_rate: f64,
    pub monthly_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkPlan {
    pub experience_level: ExperienceLevel,
    pub duration_months: u32,
    pub range: GainRange,
    pub projections: Projections,
    pub progress: Option<BulkProgress>,
    pub assessment: Option<RateAssessment>,
}

pub fn projections(range: GainRange, months: u32, current_weight: f64) -> Projections {
    Projections {
        conservative: Projection::at_rate(range.min, months, current_weight),
        optimal: Projection::at_rate(range.midpoint(), months, current_weight),
        aggressive: Projection::at_rate(range.max, months, current_weight),
    }
}

/// Progress over valid entries; None with fewer than two
pub fn current_progress(entries: &[WeightEntry]) -> Option<BulkProgress> {
    let mut valid: Vec<&WeightEntry> = entries.iter().filter(|e| e.is_valid()).collect();
    if valid.len() < 2 {
        return None;
    }
    valid.sort_by_key(|e| e.date);

    let (first, last) = (valid[0], valid[valid.len() - 1]);
    let days_elapsed = (last.date - first.date).num_days();
    let weeks_elapsed = days_elapsed as f64 / 7.0;
    let months_elapsed = days_elapsed as f64 / 30.0;
    let weight_gained = last.weight - first.weight;

    Some(BulkProgress {
        days_elapsed,
        weeks_elapsed,
        months_elapsed,
        weight_gained,
        weekly_rate: if weeks_elapsed > 0.0 {
            weight_gained / weeks_elapsed
        } else {
            0.0
        },
        monthly_rate: if months_elapsed > 0.0 {
            weight_gained / months_elapsed
        } else {
            0.0
        },
    })
}

/// Plan from the profile's settings, falling back to intermediate over three months
pub fn plan_bulk(profile: &UserProfile, entries: &[WeightEntry]) -> BulkPlan {
    let level = profile
        .experience_level
        .unwrap_or(ExperienceLevel::Intermediate);
    let months = profile
        .bulk_duration_months
        .filter(|m| *m > 0)
        .unwrap_or(DEFAULT_BULK_MONTHS);
    let range = GainRange::for_level(level);
    let progress = current_progress(entries);

    BulkPlan {
        experience_level: level,
        duration_months: months,
        range,
        projections: projections(range, months, profile.current_weight),
        assessment: progress.map(|p| range.assess(p.weekly_rate)),
        progress,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, day).unwrap()
    }

    #[test]
    fn test_projection_arithmetic() {
        let p = projections(GainRange::for_level(ExperienceLevel::Intermediate), 4, 75.0);
        assert!((p.conservative.monthly_gain - 0.6495).abs() < 1e-9);
        assert!((p.optimal.weekly_gain - 0.25).abs() < 1e-12);
        assert!((p.optimal.total_gain - 0.25 * 4.33 * 4.0).abs() < 1e-9);
        assert!((p.aggressive.final_weight - (75.0 + 0.35 * 4.33 * 4.0)).abs() < 1e-9);
    }

    #[test]
    fn test_progress_requires_two_valid_entries() {
        let entries = vec![
            WeightEntry::new(date(1), 70.0),
            WeightEntry::new(date(8), 72.0).cheat_meal(),
        ];
        assert!(current_progress(&entries).is_none());
    }

    #[test]
    fn test_progress_rates() {
        let entries = vec![
            WeightEntry::new(date(29), 70.6),
            WeightEntry::new(date(1), 70.0),
            WeightEntry::new(date(15), 75.0).retention(),
        ];
        let progress = current_progress(&entries).unwrap();
        assert_eq!(progress.days_elapsed, 28);
        assert!((progress.weeks_elapsed - 4.0).abs() < 1e-12);
        assert!((progress.weekly_rate - 0.15).abs() < 1e-9);
        assert!((progress.monthly_rate - 0.6 / (28.0 / 30.0)).abs() < 1e-9);
    }

    #[test]
    fn test_same_day_progress_has_zero_rate() {
        let entries = vec![WeightEntry::new(date(3), 70.0), WeightEntry::new(date(3), 70.4)];
        let progress = current_progress(&entries).unwrap();
        assert_eq!(progress.weekly_rate, 0.0);
        assert_eq!(progress.monthly_rate, 0.0);
    }

    #[test]
    fn test_range_assessment() {
        let range = GainRange::for_level(ExperienceLevel::Advanced);
        assert_eq!(range.assess(0.05), RateAssessment::BelowRange);
        assert_eq!(range.assess(0.1), RateAssessment::WithinRange);
        assert_eq!(range.assess(0.25), RateAssessment::WithinRange);
        assert_eq!(range.assess(0.3), RateAssessment::AboveRange);
    }
}
