//! Weight statistics engine
//!
//! [`calculate_statistics`] derives the full [`Statistics`] value object from a
//! raw entry history. It never fails: an empty history produces zeroed
//! statistics. Results are recomputed on every call and never cached.
//!
//! Two figures intentionally mix populations:
//! - `weight_change` and `days_tracked` use every entry, flagged ones included,
//!   because they describe observed scale readings and tracking effort.
//! - weekly/monthly rates, averages and projections use valid entries only.

use chrono::{Datelike, Days, NaiveDate};

use crate::models::{GoalType, Statistics, WeeklyAnalysis, WeightEntry};
use crate::moving_average::{moving_average, LONG_WINDOW, MEDIUM_WINDOW, SHORT_WINDOW};

/// Valid day span required before a weekly rate is reported
pub const MIN_DAYS_FOR_WEEKLY_RATE: i64 = 7;

/// Valid day span required before a monthly rate is reported
pub const MIN_DAYS_FOR_MONTHLY_RATE: i64 = 30;

/// Valid entries required before projecting forward
pub const MIN_ENTRIES_FOR_PROJECTION: usize = 7;

/// Horizon of `projected_weight_30_days`
pub const PROJECTION_HORIZON_DAYS: f64 = 30.0;

/// Inclusive number of calendar days from `first` to `last`
pub fn inclusive_day_span(first: NaiveDate, last: NaiveDate) -> i64 {
    (last - first).num_days() + 1
}

fn sorted_by_date(entries: &[WeightEntry]) -> Vec<WeightEntry> {
    let mut sorted = entries.to_vec();
    sorted.sort_by_key(|e| e.date);
    sorted
}

/// Compute aggregate statistics for a weight history.
///
/// `goal_type` is accepted for symmetry with the insight engine; no figure
/// depends on it today.
pub fn calculate_statistics(
    entries: &[WeightEntry],
    goal_type: GoalType,
    target_weight: Option<f64>,
) -> Statistics {
    let sorted = sorted_by_date(entries);
    let (first, last) = match (sorted.first(), sorted.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return Statistics::default(),
    };

    let valid: Vec<WeightEntry> = sorted.iter().filter(|e| e.is_valid()).cloned().collect();

    let days_tracked = inclusive_day_span(first.date, last.date);

    let average_weight = if valid.is_empty() {
        0.0
    } else {
        valid.iter().map(|e| e.weight).sum::<f64>() / valid.len() as f64
    };
    let weight_change = last.weight - first.weight;
    let cheat_meal_count = entries.iter().filter(|e| e.is_cheat_meal).count();
    let retention_count = entries.iter().filter(|e| e.is_retention).count();

    let (weekly_average_change, monthly_average_change) = valid_rates(&valid);

    let consistency_score = (entries.len() as f64 / days_tracked as f64 * 100.0).min(100.0);

    let mut stats = Statistics {
        average_weight,
        weight_change,
        weekly_average_change,
        monthly_average_change,
        moving_average_7: moving_average(&valid, SHORT_WINDOW),
        moving_average_14: moving_average(&valid, MEDIUM_WINDOW),
        moving_average_30: moving_average(&valid, LONG_WINDOW),
        total_entries: entries.len(),
        cheat_meal_count,
        retention_count,
        days_tracked,
        consistency_score,
        projected_weight_30_days: None,
        projected_weight_goal: None,
        estimated_days_to_goal: None,
    };

    // The rate guard also keeps the goal estimate from dividing by zero
    if weekly_average_change != 0.0 && valid.len() >= MIN_ENTRIES_FOR_PROJECTION {
        let daily_change = weekly_average_change / 7.0;
        stats.projected_weight_30_days = Some(last.weight + daily_change * PROJECTION_HORIZON_DAYS);

        if let Some(target) = target_weight {
            stats.estimated_days_to_goal = Some(((target - last.weight) / daily_change).abs());
            stats.projected_weight_goal = Some(target);
        }
    }

    tracing::debug!(
        %goal_type,
        total = stats.total_entries,
        valid = valid.len(),
        weekly = stats.weekly_average_change,
        "Calculated weight statistics"
    );

    stats
}

/// Weekly and monthly change from the first to the last valid entry
fn valid_rates(valid: &[WeightEntry]) -> (f64, f64) {
    let (first, last) = match (valid.first(), valid.last()) {
        (Some(first), Some(last)) if valid.len() >= 2 => (first, last),
        _ => return (0.0, 0.0),
    };

    let change = last.weight - first.weight;
    let span = inclusive_day_span(first.date, last.date);
    let per_day = change / span as f64;

    let weekly = if span >= MIN_DAYS_FOR_WEEKLY_RATE {
        per_day * 7.0
    } else {
        0.0
    };
    let monthly = if span >= MIN_DAYS_FOR_MONTHLY_RATE {
        per_day * 30.0
    } else {
        0.0
    };

    (weekly, monthly)
}

/// Monday of the week containing `date`
fn week_start(date: NaiveDate) -> NaiveDate {
    date - Days::new(date.weekday().num_days_from_monday() as u64)
}

/// Per-week breakdown from the week of the first entry to the week of the last.
///
/// Each week's change is measured against the mean of all valid entries before
/// it. Weeks without valid entries report an average and change of zero.
pub fn weekly_analysis(entries: &[WeightEntry]) -> Vec<WeeklyAnalysis> {
    let sorted = sorted_by_date(entries);
    let (first, last) = match (sorted.first(), sorted.last()) {
        (Some(first), Some(last)) => (first.date, last.date),
        _ => return Vec::new(),
    };

    let mut weeks = Vec::new();
    let mut start = week_start(first);
    let final_start = week_start(last);

    while start <= final_start {
        let end = start + Days::new(6);
        let in_week: Vec<&WeightEntry> = sorted
            .iter()
            .filter(|e| e.date >= start && e.date <= end)
            .collect();
        let valid_weights: Vec<f64> = in_week
            .iter()
            .filter(|e| e.is_valid())
            .map(|e| e.weight)
            .collect();
        let previous: Vec<f64> = sorted
            .iter()
            .filter(|e| e.date < start && e.is_valid())
            .map(|e| e.weight)
            .collect();

        let (average_weight, weight_change) = if valid_weights.is_empty() {
            (0.0, 0.0)
        } else {
            let average = valid_weights.iter().sum::<f64>() / valid_weights.len() as f64;
            let previous_average = if previous.is_empty() {
                average
            } else {
                previous.iter().sum::<f64>() / previous.len() as f64
            };
            (average, average - previous_average)
        };

        weeks.push(WeeklyAnalysis {
            week_start: start,
            week_end: end,
            average_weight,
            weight_change,
            entries: in_week.len(),
            cheat_meals: in_week.iter().filter(|e| e.is_cheat_meal).count(),
            retentions: in_week.iter().filter(|e| e.is_retention).count(),
        });

        start = start + Days::new(7);
    }

    weeks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn daily(start: NaiveDate, weights: &[f64]) -> Vec<WeightEntry> {
        weights
            .iter()
            .enumerate()
            .map(|(i, &w)| WeightEntry::new(start + Days::new(i as u64), w).with_id(format!("e{}", i)))
            .collect()
    }

    #[test]
    fn test_empty_history() {
        let stats = calculate_statistics(&[], GoalType::Bulk, Some(90.0));
        assert_eq!(stats, Statistics::default());
        assert_eq!(stats.total_entries, 0);
    }

    #[test]
    fn test_two_entries_a_week_apart() {
        let entries = vec![
            WeightEntry::new(date(2025, 1, 1), 80.0),
            WeightEntry::new(date(2025, 1, 8), 79.0),
        ];
        let stats = calculate_statistics(&entries, GoalType::Cut, None);

        assert_eq!(stats.days_tracked, 8);
        assert!((stats.weight_change + 1.0).abs() < 1e-9);
        // -1 kg over an inclusive span of 8 days
        assert!((stats.weekly_average_change - (-1.0 / 8.0 * 7.0)).abs() < 1e-9);
        assert_eq!(stats.monthly_average_change, 0.0);
        assert!((stats.consistency_score - 25.0).abs() < 1e-9);
        assert!(stats.projected_weight_30_days.is_none());
    }

    #[test]
    fn test_short_span_has_no_weekly_rate() {
        let entries = daily(date(2025, 1, 1), &[80.0, 80.5, 81.0]);
        let stats = calculate_statistics(&entries, GoalType::Bulk, None);
        assert_eq!(stats.weekly_average_change, 0.0);
        assert_eq!(stats.consistency_score, 100.0);
    }

    #[test]
    fn test_flagged_entries_excluded_from_trend_but_counted() {
        let mut entries = daily(date(2025, 1, 1), &[80.0, 80.0, 83.0, 80.0]);
        entries[2].is_cheat_meal = true;
        entries[3].is_retention = true;
        entries[3].weight = 82.0;

        let stats = calculate_statistics(&entries, GoalType::Maintenance, None);

        assert_eq!(stats.total_entries, 4);
        assert_eq!(stats.cheat_meal_count, 1);
        assert_eq!(stats.retention_count, 1);
        assert!((stats.average_weight - 80.0).abs() < 1e-9);
        assert!((stats.moving_average_7 - 80.0).abs() < 1e-9);
        // Observed scale change includes flagged days
        assert!((stats.weight_change - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_projection_and_goal_estimate() {
        // 0.1 kg per day over 15 days
        let weights: Vec<f64> = (0..15).map(|i| 70.0 + 0.1 * i as f64).collect();
        let entries = daily(date(2025, 2, 1), &weights);

        let stats = calculate_statistics(&entries, GoalType::Bulk, Some(75.0));

        let daily_change = 1.4 / 15.0;
        assert!((stats.weekly_average_change - daily_change * 7.0).abs() < 1e-9);
        let projected = stats.projected_weight_30_days.unwrap();
        assert!((projected - (71.4 + daily_change * 30.0)).abs() < 1e-9);
        assert_eq!(stats.projected_weight_goal, Some(75.0));
        let days = stats.estimated_days_to_goal.unwrap();
        assert!((days - 3.6 / daily_change).abs() < 1e-6);
    }

    #[test]
    fn test_no_projection_with_too_few_valid_entries() {
        let entries = vec![
            WeightEntry::new(date(2025, 1, 1), 80.0),
            WeightEntry::new(date(2025, 1, 20), 82.0),
        ];
        let stats = calculate_statistics(&entries, GoalType::Bulk, Some(85.0));
        assert!(stats.weekly_average_change > 0.0);
        assert!(stats.projected_weight_30_days.is_none());
        assert!(stats.estimated_days_to_goal.is_none());
    }

    #[test]
    fn test_unsorted_input() {
        let entries = vec![
            WeightEntry::new(date(2025, 1, 8), 79.0),
            WeightEntry::new(date(2025, 1, 1), 80.0),
        ];
        let stats = calculate_statistics(&entries, GoalType::Cut, None);
        assert!((stats.weight_change + 1.0).abs() < 1e-9);
        assert_eq!(stats.days_tracked, 8);
    }

    #[test]
    fn test_weekly_analysis_buckets() {
        // 2025-01-06 is a Monday
        let mut entries = daily(date(2025, 1, 6), &[80.0; 10]);
        entries[8].weight = 81.0;
        entries[9].weight = 81.0;
        entries[9].is_cheat_meal = true;

        let weeks = weekly_analysis(&entries);
        assert_eq!(weeks.len(), 2);
        assert_eq!(weeks[0].week_start, date(2025, 1, 6));
        assert_eq!(weeks[0].week_end, date(2025, 1, 12));
        assert_eq!(weeks[0].entries, 7);
        assert_eq!(weeks[0].weight_change, 0.0);

        assert_eq!(weeks[1].entries, 3);
        assert_eq!(weeks[1].cheat_meals, 1);
        // (80 + 81) / 2 against the first week's 80
        assert!((weeks[1].average_weight - 80.5).abs() < 1e-9);
        assert!((weeks[1].weight_change - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_weekly_analysis_fully_flagged_week() {
        // 2025-01-06 is a Monday
        let entries = vec![
            WeightEntry::new(date(2025, 1, 6), 80.0),
            WeightEntry::new(date(2025, 1, 7), 90.0).cheat_meal(),
            WeightEntry::new(date(2025, 1, 13), 85.0).cheat_meal(),
            WeightEntry::new(date(2025, 1, 14), 86.0).retention(),
            WeightEntry::new(date(2025, 1, 20), 81.0),
        ];
        let weeks = weekly_analysis(&entries);
        assert_eq!(weeks.len(), 3);

        assert_eq!(weeks[0].average_weight, 80.0);
        assert_eq!(weeks[0].weight_change, 0.0);

        let flagged = &weeks[1];
        assert_eq!(flagged.week_start, date(2025, 1, 13));
        assert_eq!(flagged.average_weight, 0.0);
        assert_eq!(flagged.weight_change, 0.0);
        assert_eq!(flagged.entries, 2);
        assert_eq!(flagged.cheat_meals, 1);
        assert_eq!(flagged.retentions, 1);

        // Baseline is the valid 80.0 only; flagged 90/85/86 are ignored
        assert_eq!(weeks[2].average_weight, 81.0);
        assert!((weeks[2].weight_change - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_weekly_analysis_empty() {
        assert!(weekly_analysis(&[]).is_empty());
    }
}
