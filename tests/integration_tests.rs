use chrono::NaiveDate;
use rust_decimal_macros::dec;
use weightrs::{
    calculate_statistics, detect_anomalies, get_smart_insights, smart_insights, GoalType, Insight,
    WeightEntry,
};

/// Integration tests that exercise complete workflows across modules

#[cfg(test)]
mod integration_tests {
    use super::*;
    use weightrs::body_composition::SkinFolds;
    use weightrs::energy::{calculate_real_tdee, ActivityLevel};
    use weightrs::evaluation::{ActiveBulkStatus, EvaluationDraft};
    use weightrs::export::{export_to_file, DateRange, ExportFormat};
    use weightrs::import::{ImportManager, ImportedData};
    use weightrs::insights::{BulkPace, CutPace};
    use weightrs::nutrition_log::{FoodItem, MealType, NutritionGoals, NutritionLogStore};
    use weightrs::{BiologicalSex, NewProfile, WeightStore};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn bulk_profile() -> NewProfile {
        NewProfile {
            name: "Test Lifter".to_string(),
            goal_type: GoalType::Bulk,
            target_weight: Some(75.0),
            start_weight: 70.0,
            start_date: date(2025, 1, 1),
            height: Some(178.0),
            age: Some(28),
            gender: Some(BiologicalSex::Male),
            bulk_duration_months: Some(4),
            experience_level: None,
        }
    }

    /// 35 consecutive days gaining 0.2 kg per 7 days
    fn steady_bulk_entries() -> Vec<WeightEntry> {
        (0..35u64)
            .map(|i| {
                WeightEntry::new(
                    date(2025, 1, 1) + chrono::Days::new(i),
                    70.0 + 0.2 / 7.0 * i as f64,
                )
            })
            .collect()
    }

    #[test]
    fn test_cut_week_lands_in_ideal_band() {
        let entries = vec![
            WeightEntry::new(date(2025, 1, 1), 80.0),
            WeightEntry::new(date(2025, 1, 8), 79.0),
        ];
        let stats = calculate_statistics(&entries, GoalType::Cut, None);

        // Inclusive span of 8 days
        assert!((stats.weekly_average_change - (-0.875)).abs() < 1e-9);
        assert_eq!(stats.monthly_average_change, 0.0);
        assert_eq!(stats.days_tracked, 8);

        let insights = smart_insights(&stats, GoalType::Cut);
        assert!(insights.iter().any(|i| matches!(
            i,
            Insight::CutPace {
                pace: CutPace::Ideal,
                ..
            }
        )));
    }

    #[test]
    fn test_optimal_bulk_produces_single_pace_and_projection() {
        let entries = steady_bulk_entries();
        let stats = calculate_statistics(&entries, GoalType::Bulk, None);
        assert!(stats.weekly_average_change > 0.15 && stats.weekly_average_change <= 0.25);
        assert!(stats.monthly_average_change > 0.0);

        let insights = smart_insights(&stats, GoalType::Bulk);
        let paces: Vec<&Insight> = insights
            .iter()
            .filter(|i| matches!(i, Insight::BulkPace { .. }))
            .collect();
        assert_eq!(paces.len(), 1);
        assert!(matches!(
            paces[0],
            Insight::BulkPace {
                pace: BulkPace::Optimal,
                ..
            }
        ));

        let projections: Vec<&Insight> = insights
            .iter()
            .filter(|i| matches!(i, Insight::BulkProjection { .. }))
            .collect();
        assert_eq!(projections.len(), 1);
        assert!(matches!(
            projections[0],
            Insight::BulkProjection {
                muscle_percentage: 72,
                ..
            }
        ));

        let rendered = get_smart_insights(&stats, GoalType::Bulk);
        assert_eq!(rendered.len(), insights.len());
        assert!(rendered.iter().any(|s| s.contains("72%")));
    }

    #[test]
    fn test_real_tdee_scenario() {
        assert!((calculate_real_tdee(3000.0, 0.3) - 2670.0).abs() < 1e-9);
    }

    #[test]
    fn test_single_food_sets_meal_and_day_totals() {
        let log = NutritionLogStore::default();
        let day = date(2025, 2, 3);
        let food = FoodItem::new("Reference", dec!(200), dec!(10), dec!(20), dec!(5));

        log.add_food_to_meal(day, MealType::Breakfast, &food, dec!(100))
            .unwrap();

        let daily = log.log_for(day).unwrap();
        let breakfast = daily.meal(MealType::Breakfast).unwrap();
        assert_eq!(breakfast.totals.calories, dec!(200));
        assert_eq!(breakfast.totals.protein, dec!(10.0));
        assert_eq!(breakfast.totals.carbs, dec!(20.0));
        assert_eq!(breakfast.totals.fat, dec!(5.0));
        assert_eq!(daily.totals, breakfast.totals);
    }

    #[test]
    fn test_anomaly_boundary_on_exact_threshold() {
        let entries = vec![
            WeightEntry::new(date(2025, 3, 1), 70.0),
            WeightEntry::new(date(2025, 3, 2), 71.0),
            WeightEntry::new(date(2025, 3, 3), 70.2),
        ];
        let report = detect_anomalies(&entries);

        assert_eq!(report.possible_cheat_meals, vec![entries[1].id.clone()]);
        // A rise of exactly 1.0 kg is not above the retention threshold
        assert!(report.possible_retentions.is_empty());
    }

    #[test]
    fn test_store_workflow_tracks_current_weight_and_insights() {
        let mut store = WeightStore::new();
        store.create_profile(bulk_profile()).unwrap();
        for entry in steady_bulk_entries() {
            store.add_entry(entry).unwrap();
        }

        let latest = store.entries()[0].clone();
        assert_eq!(latest.date, date(2025, 2, 4));
        assert_eq!(store.profile().unwrap().current_weight, latest.weight);

        let insights = store.insights();
        assert!(insights.iter().any(|s| s.starts_with("Excellent consistency")));
        assert!(insights.iter().any(|s| s.starts_with("OPTIMAL")));

        let plan = store.bulk_plan().unwrap();
        assert_eq!(plan.duration_months, 4);
        assert!(plan.progress.is_some());

        store.delete_entry(&latest.id).unwrap();
        assert_eq!(
            store.profile().unwrap().current_weight,
            store.entries()[0].weight
        );
    }

    #[test]
    fn test_csv_export_then_import_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weights.csv");

        let mut store = WeightStore::new();
        store.create_profile(bulk_profile()).unwrap();
        store
            .add_entry(WeightEntry::new(date(2025, 1, 2), 70.3).with_notes("post; travel"))
            .unwrap();
        store
            .add_entry(WeightEntry::new(date(2025, 1, 3), 71.4).cheat_meal())
            .unwrap();
        store
            .add_entry(WeightEntry::new(date(2025, 1, 9), 70.6).retention())
            .unwrap();

        let count = export_to_file(
            &store.to_backup(),
            ExportFormat::Csv,
            DateRange::new(Some(date(2025, 1, 3)), None),
            &path,
        )
        .unwrap();
        assert_eq!(count, 2);

        let report = ImportManager::new().import_file(&path).unwrap();
        assert!(report.warnings.is_empty());
        let entries = match &report.data {
            ImportedData::Entries(entries) => entries.clone(),
            other => panic!("expected entries, got {:?}", other),
        };
        assert_eq!(entries.len(), 2);
        assert!(entries[0].is_cheat_meal);
        assert!(entries[1].is_retention);

        report.apply_to(&mut store);
        assert_eq!(store.entries().len(), 2);
        assert_eq!(store.profile().unwrap().current_weight, 70.6);
    }

    #[test]
    fn test_json_backup_round_trip_keeps_evaluation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backup.json");

        let mut store = WeightStore::new();
        store.create_profile(bulk_profile()).unwrap();
        store
            .add_entry(WeightEntry::new(date(2025, 1, 5), 70.8))
            .unwrap();
        let evaluation = EvaluationDraft::new()
            .age(28)
            .gender(BiologicalSex::Male)
            .height(178.0)
            .weight(70.8)
            .skin_folds(SkinFolds {
                triceps: 9.0,
                subscapular: 11.0,
                chest: 7.0,
                axillary: 9.0,
                abdominal: 14.0,
                suprailiac: 10.0,
                thigh: 12.0,
            })
            .training(4.0, 1.0)
            .daily_activity(ActivityLevel::Moderate)
            .commit()
            .unwrap();
        store.set_evaluation(evaluation.clone());

        export_to_file(&store.to_backup(), ExportFormat::Json, DateRange::default(), &path)
            .unwrap();

        let report = ImportManager::new().import_file(&path).unwrap();
        let mut restored = WeightStore::new();
        report.apply_to(&mut restored);

        assert_eq!(restored.profile(), store.profile());
        assert_eq!(restored.entries().len(), 1);
        let restored_eval = restored.evaluation().unwrap();
        assert_eq!(restored_eval.id, evaluation.id);
        assert_eq!(restored_eval.skin_folds, evaluation.skin_folds);
        assert!(
            (restored_eval.calculated.body_fat_percentage
                - evaluation.calculated.body_fat_percentage)
                .abs()
                < 1e-9
        );
    }

    #[test]
    fn test_evaluation_goals_flow_into_new_days() {
        let evaluation = EvaluationDraft::new()
            .age(25)
            .gender(BiologicalSex::Male)
            .height(180.0)
            .weight(80.0)
            .skin_folds(SkinFolds {
                triceps: 10.0,
                subscapular: 12.0,
                chest: 8.0,
                axillary: 10.0,
                abdominal: 15.0,
                suprailiac: 12.0,
                thigh: 14.0,
            })
            .training(4.0, 1.5)
            .active_bulk(ActiveBulkStatus {
                is_currently_doing: true,
                current_calories: Some(3000.0),
                weekly_gain: Some(0.3),
                weeks_in_bulk: Some(6),
            })
            .commit()
            .unwrap();

        let log = NutritionLogStore::default();
        let bulk = evaluation.calculated.macros.for_goal(GoalType::Bulk);
        log.set_goals(NutritionGoals::from_macros(bulk, 9));

        let day = log.get_or_create(date(2025, 4, 1));
        assert_eq!(day.targets.calories, dec!(2970));
        assert_eq!(day.water_target, 9);
    }

    #[test]
    fn test_import_rejects_file_without_valid_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        std::fs::write(&path, "Fecha;Peso (kg)\n31/02/2025;80\n2025-01-01;0\n").unwrap();

        let err = ImportManager::new().import_file(&path).unwrap_err();
        assert!(err.to_string().contains("No valid rows"));
    }
}
