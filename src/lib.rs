//! Weigh-in tracking, trend analytics and nutrition planning
//!
//! Calculators are pure functions over entries and evaluations; `store` and
//! `nutrition_log` own the mutable state, and `import`/`export` move it in
//! and out of CSV and JSON files.

pub mod anomaly;
pub mod body_composition;
pub mod bulk_planner;
pub mod config;
pub mod energy;
pub mod error;
pub mod evaluation;
pub mod export;
pub mod import;
pub mod insights;
pub mod logging;
pub mod macros;
pub mod models;
pub mod moving_average;
pub mod nutrition_log;
pub mod statistics;
pub mod store;

// Re-export commonly used types for convenience
pub use models::*;
pub use anomaly::{detect_anomalies, AnomalyReport};
pub use evaluation::{calculate, CalculatedData, EvaluationDraft, NutritionEvaluation};
pub use insights::{get_smart_insights, smart_insights, Insight};
pub use macros::{calculate_macros, MacroPlan, MacroTargets};
pub use moving_average::{moving_average, robust_moving_average};
pub use nutrition_log::{FoodItem, MealType, NutritionGoals, NutritionLogStore};
pub use statistics::calculate_statistics;
pub use store::{Backup, WeightStore};
pub use error::{Result, WeightrsError};
pub use logging::{LogConfig, LogFormat, LogLevel};
