//! Calorie and macronutrient targets per goal

use serde::{Deserialize, Serialize};

use crate::models::GoalType;

pub const BULK_SURPLUS_KCAL: f64 = 300.0;
pub const CUT_DEFICIT_KCAL: f64 = 400.0;

/// Share of calories assigned to fat
pub const FAT_CALORIE_SHARE: f64 = 0.25;

/// Carbohydrate floor regardless of the calorie arithmetic (g)
pub const MIN_CARBS_G: f64 = 50.0;

pub const KCAL_PER_G_PROTEIN: f64 = 4.0;
pub const KCAL_PER_G_CARBS: f64 = 4.0;
pub const KCAL_PER_G_FAT: f64 = 9.0;

/// Daily calorie target with protein/carb/fat grams, all whole numbers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacroTargets {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

/// Targets for every goal from one effective TDEE
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacroPlan {
    pub bulk: MacroTargets,
    pub cut: MacroTargets,
    pub maintenance: MacroTargets,
}

impl MacroPlan {
    pub fn for_goal(&self, goal: GoalType) -> &MacroTargets {
        match goal {
            GoalType::Bulk => &self.bulk,
            GoalType::Cut => &self.cut,
            GoalType::Maintenance => &self.maintenance,
        }
    }
}

/// Calorie adjustment and protein g/kg for a goal
fn goal_parameters(goal: GoalType) -> (f64, f64) {
    match goal {
        GoalType::Bulk => (BULK_SURPLUS_KCAL, 2.0),
        // Higher protein preserves lean mass in a deficit
        GoalType::Cut => (-CUT_DEFICIT_KCAL, 2.4),
        GoalType::Maintenance => (0.0, 2.0),
    }
}

/// Macro targets for `goal` given an effective TDEE and body weight (kg).
///
/// Protein is rounded before its calories are taken out of the budget; fat
/// calories use the unrounded 25% share. Carbs never drop below
/// [`MIN_CARBS_G`].
pub fn calculate_macros(tdee: f64, weight_kg: f64, goal: GoalType) -> MacroTargets {
    let (adjustment, protein_per_kg) = goal_parameters(goal);
    let calories = tdee + adjustment;

    let protein = (weight_kg * protein_per_kg).round();
    let protein_calories = protein * KCAL_PER_G_PROTEIN;

    let fat_calories = calories * FAT_CALORIE_SHARE;
    let fat = (fat_calories / KCAL_PER_G_FAT).round();

    let carb_calories = calories - protein_calories - fat_calories;
    let carbs = (carb_calories / KCAL_PER_G_CARBS).round().max(MIN_CARBS_G);

    MacroTargets {
        calories: calories.round(),
        protein,
        carbs,
        fat,
    }
}

pub fn calculate_macro_plan(tdee: f64, weight_kg: f64) -> MacroPlan {
    MacroPlan {
        bulk: calculate_macros(tdee, weight_kg, GoalType::Bulk),
        cut: calculate_macros(tdee, weight_kg, GoalType::Cut),
        maintenance: calculate_macros(tdee, weight_kg, GoalType::Maintenance),
    }
}
