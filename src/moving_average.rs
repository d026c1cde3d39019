//! Windowed averages over a weight history
//!
//! All functions expect entries in ascending date order. An empty input yields
//! the `0.0` sentinel rather than an error so that callers can render a fresh
//! installation without special-casing it.

use statrs::statistics::Statistics;

use crate::models::{ChartDataPoint, WeightEntry};

/// Standard windows shown on the dashboard and chart
pub const SHORT_WINDOW: usize = 7;
pub const MEDIUM_WINDOW: usize = 14;
pub const LONG_WINDOW: usize = 30;

/// Entries further than this many population standard deviations from the
/// window mean are discarded by [`robust_moving_average`]
pub const OUTLIER_STD_DEVS: f64 = 2.0;

/// Trailing slice of at most `window` entries. A zero window keeps everything.
fn trailing(entries: &[WeightEntry], window: usize) -> &[WeightEntry] {
    if window == 0 {
        return entries;
    }
    &entries[entries.len().saturating_sub(window)..]
}

/// Arithmetic mean of the last `window` entries.
///
/// The caller is responsible for passing only valid entries. With fewer than
/// `window` entries the mean covers whatever is present.
pub fn moving_average(entries: &[WeightEntry], window: usize) -> f64 {
    let recent = trailing(entries, window);
    if recent.is_empty() {
        return 0.0;
    }

    recent.iter().map(|e| e.weight).sum::<f64>() / recent.len() as f64
}

/// Outlier-resistant moving average.
///
/// Flagged entries are dropped first, then the trailing window is taken and
/// weights beyond [`OUTLIER_STD_DEVS`] population standard deviations from the
/// window mean are discarded. Falls back to the unfiltered mean if nothing
/// survives the filter.
pub fn robust_moving_average(entries: &[WeightEntry], window: usize) -> f64 {
    let valid: Vec<WeightEntry> = entries.iter().filter(|e| e.is_valid()).cloned().collect();
    let recent = trailing(&valid, window);
    if recent.is_empty() {
        return 0.0;
    }

    let weights: Vec<f64> = recent.iter().map(|e| e.weight).collect();
    let mean = weights.iter().mean();
    let std_dev = if weights.len() > 1 {
        weights.iter().population_std_dev()
    } else {
        0.0
    };

    let kept: Vec<f64> = weights
        .iter()
        .copied()
        .filter(|w| (w - mean).abs() <= OUTLIER_STD_DEVS * std_dev)
        .collect();

    if kept.is_empty() {
        return mean;
    }

    kept.iter().sum::<f64>() / kept.len() as f64
}

/// Chart series: every entry in date order with the 7/14/30 trailing averages
/// of the valid entries recorded up to and including it.
pub fn chart_series(entries: &[WeightEntry]) -> Vec<ChartDataPoint> {
    let mut sorted: Vec<&WeightEntry> = entries.iter().collect();
    sorted.sort_by_key(|e| e.date);

    let mut valid_so_far: Vec<WeightEntry> = Vec::with_capacity(sorted.len());
    sorted
        .into_iter()
        .map(|entry| {
            if entry.is_valid() {
                valid_so_far.push(entry.clone());
            }

            ChartDataPoint {
                date: entry.date,
                weight: entry.weight,
                moving_average_7: moving_average(&valid_so_far, SHORT_WINDOW),
                moving_average_14: moving_average(&valid_so_far, MEDIUM_WINDOW),
                moving_average_30: moving_average(&valid_so_far, LONG_WINDOW),
                is_cheat_meal: entry.is_cheat_meal,
                is_retention: entry.is_retention,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Days, NaiveDate};
    use proptest::prelude::*;

    fn series(weights: &[f64]) -> Vec<WeightEntry> {
        let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        weights
            .iter()
            .enumerate()
            .map(|(i, &w)| {
                WeightEntry::new(start + Days::new(i as u64), w).with_id(format!("e{}", i))
            })
            .collect()
    }

    #[test]
    fn test_empty_input_returns_zero() {
        assert_eq!(moving_average(&[], 7), 0.0);
        assert_eq!(robust_moving_average(&[], 7), 0.0);
    }

    #[test]
    fn test_window_takes_trailing_entries() {
        let entries = series(&[70.0, 80.0, 81.0, 82.0]);
        assert!((moving_average(&entries, 3) - 81.0).abs() < 1e-9);
    }

    #[test]
    fn test_short_history_averages_what_is_present() {
        let entries = series(&[80.0, 82.0]);
        assert!((moving_average(&entries, 30) - 81.0).abs() < 1e-9);
    }

    #[test]
    fn test_robust_average_discards_outlier() {
        let mut weights = vec![80.0; 10];
        weights.push(95.0);
        let entries = series(&weights);

        let plain = moving_average(&entries, 30);
        let robust = robust_moving_average(&entries, 30);

        assert!(plain > 81.0);
        assert!((robust - 80.0).abs() < 1e-9);
    }

    #[test]
    fn test_robust_average_single_entry() {
        let entries = series(&[77.7]);
        assert!((robust_moving_average(&entries, 7) - 77.7).abs() < 1e-9);
    }

    #[test]
    fn test_robust_average_skips_flagged_entries() {
        let mut entries = series(&[80.0, 80.0, 90.0]);
        entries[2].is_cheat_meal = true;
        assert!((robust_moving_average(&entries, 7) - 80.0).abs() < 1e-9);

        let all_flagged: Vec<WeightEntry> =
            series(&[80.0, 81.0]).into_iter().map(|e| e.retention()).collect();
        assert_eq!(robust_moving_average(&all_flagged, 7), 0.0);
    }

    #[test]
    fn test_chart_series_excludes_flagged_from_averages() {
        let mut entries = series(&[80.0, 84.0, 82.0]);
        entries[1].is_cheat_meal = true;

        let points = chart_series(&entries);
        assert_eq!(points.len(), 3);
        assert!((points[0].moving_average_7 - 80.0).abs() < 1e-9);
        assert!((points[1].moving_average_7 - 80.0).abs() < 1e-9);
        assert!(points[1].is_cheat_meal);
        assert!((points[2].moving_average_7 - 81.0).abs() < 1e-9);
    }

    proptest! {
        #[test]
        fn test_constant_weights_average_to_the_constant(
            weight in 30.0f64..250.0,
            count in 1usize..60,
            window in 1usize..40
        ) {
            let entries = series(&vec![weight; count]);
            prop_assert!((moving_average(&entries, window) - weight).abs() < 1e-9);
            prop_assert!((robust_moving_average(&entries, window) - weight).abs() < 1e-9);
        }

        #[test]
        fn test_empty_is_zero_for_any_window(window in 0usize..500) {
            prop_assert_eq!(moving_average(&[], window), 0.0);
        }
    }
}
