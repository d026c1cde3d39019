//! Nutrition evaluation: form data in, body composition, TDEE and macros out
//!
//! The form is collected through an [`EvaluationDraft`] that accepts fields in
//! any order and is validated only when committed. Committing always runs the
//! whole calculation pipeline; there is no incremental patching of results.

use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::body_composition::{calculate_body_fat, composition_from_body_fat, SkinFolds};
use crate::energy::{
    calculate_real_tdee, calculate_tdee, experience_level, muscular_potential, training_years,
    ActivityLevel, CardioDetail, MuscularPotential, TdeeBreakdown, TdeeInput,
};
use crate::error::{CalculationError, Result};
use crate::macros::{calculate_macro_plan, MacroPlan};
use crate::models::{BiologicalSex, ExperienceLevel};

/// A past weight-loss phase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DietPhase {
    pub phase_number: u32,
    pub start_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    pub start_weight: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_weight: Option<f64>,
    #[serde(default)]
    pub went_to_gym: bool,
    #[serde(default)]
    pub did_cardio: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cardio_details: Option<CardioDetail>,
    #[serde(default)]
    pub had_relapses: bool,
    #[serde(default)]
    pub relapse_count: u32,
    /// Weight regained across all relapses (kg)
    #[serde(default)]
    pub total_weight_gained_from_relapses: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relapse_description: Option<String>,
}

impl DietPhase {
    /// Net loss over the phase, if it has ended
    pub fn weight_lost(&self) -> Option<f64> {
        self.end_weight.map(|end| self.start_weight - end)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReverseDietStatus {
    pub is_currently_doing: bool,
    pub start_date: Option<NaiveDate>,
    pub weeks_elapsed: Option<u32>,
    pub start_calories: Option<f64>,
    pub current_calories: Option<f64>,
    pub weekly_increment: Option<f64>,
    pub target_calories: Option<f64>,
    pub start_weight: Option<f64>,
    pub current_weight: Option<f64>,
    pub notes: Option<String>,
}

impl ReverseDietStatus {
    /// Weeks left at the current increment to reach the target intake
    pub fn weeks_remaining(&self) -> Option<f64> {
        let (current, target, step) = (
            self.current_calories?,
            self.target_calories?,
            self.weekly_increment?,
        );
        if !self.is_currently_doing || step <= 0.0 {
            return None;
        }
        Some(((target - current) / step).max(0.0).ceil())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActiveBulkStatus {
    pub is_currently_doing: bool,
    pub current_calories: Option<f64>,
    /// Observed gain (kg/week)
    pub weekly_gain: Option<f64>,
    pub weeks_in_bulk: Option<u32>,
}

impl ActiveBulkStatus {
    /// Observed TDEE, only for an active bulk with non-zero intake and gain
    pub fn real_tdee(&self) -> Option<f64> {
        if !self.is_currently_doing {
            return None;
        }
        match (self.current_calories, self.weekly_gain) {
            (Some(calories), Some(gain)) if calories != 0.0 && gain != 0.0 => {
                Some(calculate_real_tdee(calories, gain))
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CurrentPhase {
    Bulk,
    Cut,
    #[default]
    Maintenance,
    Reverse,
}

/// Everything derived from an evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculatedData {
    pub body_fat_percentage: f64,
    pub lean_mass: f64,
    pub fat_mass: f64,
    pub bmr: f64,
    /// Formula estimate
    pub tdee: f64,
    pub tdee_breakdown: TdeeBreakdown,
    /// Observed estimate during an active bulk
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub real_tdee: Option<f64>,
    pub macros: MacroPlan,
}

impl CalculatedData {
    /// TDEE used for macro allocation: observed when available, else formula
    pub fn effective_tdee(&self) -> f64 {
        self.real_tdee.filter(|t| *t != 0.0).unwrap_or(self.tdee)
    }
}

/// Training history summary derived from the gym start date
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingProfile {
    pub years: f64,
    pub level: ExperienceLevel,
    pub potential: MuscularPotential,
}

/// A committed evaluation with its derived block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NutritionEvaluation {
    pub id: String,
    pub age: u32,
    pub gender: BiologicalSex,
    /// Height in cm
    pub height: f64,
    /// Weight in kg
    pub weight: f64,
    pub gym_start_date: NaiveDate,
    pub skin_folds: SkinFolds,
    #[serde(default)]
    pub has_lost_weight_recently: bool,
    #[serde(default)]
    pub diet_phases: Vec<DietPhase>,
    #[serde(default)]
    pub reverse_diet: ReverseDietStatus,
    #[serde(default)]
    pub active_bulk: ActiveBulkStatus,
    pub training_days_per_week: f64,
    pub hours_per_session: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_cardio: Option<CardioDetail>,
    pub daily_activity: ActivityLevel,
    pub current_phase: CurrentPhase,
    pub calculated: CalculatedData,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NutritionEvaluation {
    pub fn does_cardio(&self) -> bool {
        self.current_cardio.is_some()
    }

    /// Reopen as a draft; committing it keeps this evaluation's id
    pub fn amend(&self) -> EvaluationDraft {
        EvaluationDraft {
            id: Some(self.id.clone()),
            created_at: Some(self.created_at),
            age: Some(self.age),
            gender: Some(self.gender),
            height: Some(self.height),
            weight: Some(self.weight),
            gym_start_date: Some(self.gym_start_date),
            skin_folds: Some(self.skin_folds),
            has_lost_weight_recently: self.has_lost_weight_recently,
            diet_phases: self.diet_phases.clone(),
            reverse_diet: self.reverse_diet.clone(),
            active_bulk: self.active_bulk.clone(),
            training_days_per_week: self.training_days_per_week,
            hours_per_session: self.hours_per_session,
            current_cardio: self.current_cardio.clone(),
            daily_activity: self.daily_activity,
            current_phase: self.current_phase,
        }
    }

    /// Replace the skin folds and recompute everything
    pub fn update_skin_folds(&self, skin_folds: SkinFolds) -> Result<NutritionEvaluation> {
        self.amend().skin_folds(skin_folds).commit()
    }

    pub fn training_profile(&self, today: NaiveDate) -> TrainingProfile {
        let years = training_years(self.gym_start_date, today);
        TrainingProfile {
            years,
            level: experience_level(years),
            potential: muscular_potential(self.height, years),
        }
    }
}

/// Evaluation form under construction
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationDraft {
    #[serde(skip)]
    id: Option<String>,
    #[serde(skip)]
    created_at: Option<DateTime<Utc>>,
    pub age: Option<u32>,
    pub gender: Option<BiologicalSex>,
    pub height: Option<f64>,
    pub weight: Option<f64>,
    pub gym_start_date: Option<NaiveDate>,
    pub skin_folds: Option<SkinFolds>,
    pub has_lost_weight_recently: bool,
    pub diet_phases: Vec<DietPhase>,
    pub reverse_diet: ReverseDietStatus,
    pub active_bulk: ActiveBulkStatus,
    pub training_days_per_week: f64,
    pub hours_per_session: f64,
    pub current_cardio: Option<CardioDetail>,
    pub daily_activity: ActivityLevel,
    pub current_phase: CurrentPhase,
}

impl EvaluationDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn age(mut self, age: u32) -> Self {
        self.age = Some(age);
        self
    }

    pub fn gender(mut self, gender: BiologicalSex) -> Self {
        self.gender = Some(gender);
        self
    }

    pub fn height(mut self, height_cm: f64) -> Self {
        self.height = Some(height_cm);
        self
    }

    pub fn weight(mut self, weight_kg: f64) -> Self {
        self.weight = Some(weight_kg);
        self
    }

    pub fn gym_start_date(mut self, date: NaiveDate) -> Self {
        self.gym_start_date = Some(date);
        self
    }

    pub fn skin_folds(mut self, skin_folds: SkinFolds) -> Self {
        self.skin_folds = Some(skin_folds);
        self
    }

    pub fn diet_phase(mut self, phase: DietPhase) -> Self {
        self.has_lost_weight_recently = true;
        self.diet_phases.push(phase);
        self
    }

    pub fn reverse_diet(mut self, status: ReverseDietStatus) -> Self {
        self.reverse_diet = status;
        self
    }

    pub fn active_bulk(mut self, status: ActiveBulkStatus) -> Self {
        self.active_bulk = status;
        self
    }

    pub fn training(mut self, days_per_week: f64, hours_per_session: f64) -> Self {
        self.training_days_per_week = days_per_week;
        self.hours_per_session = hours_per_session;
        self
    }

    pub fn cardio(mut self, cardio: Option<CardioDetail>) -> Self {
        self.current_cardio = cardio;
        self
    }

    pub fn daily_activity(mut self, activity: ActivityLevel) -> Self {
        self.daily_activity = activity;
        self
    }

    pub fn current_phase(mut self, phase: CurrentPhase) -> Self {
        self.current_phase = phase;
        self
    }

    /// Validate the form and run the full calculation
    pub fn commit(self) -> Result<NutritionEvaluation> {
        let age = required(self.age, "age")?;
        let gender = required(self.gender, "gender")?;
        let height = required(self.height, "height")?;
        let weight = required(self.weight, "weight")?;
        let skin_folds = required(self.skin_folds, "skin_folds")?;

        positive("height", height)?;
        positive("weight", weight)?;
        if age == 0 {
            return Err(invalid("age", age).into());
        }
        if self.training_days_per_week < 0.0 || self.training_days_per_week > 7.0 {
            return Err(invalid("training_days_per_week", self.training_days_per_week).into());
        }
        if self.hours_per_session < 0.0 {
            return Err(invalid("hours_per_session", self.hours_per_session).into());
        }

        let now = Utc::now();
        let mut evaluation = NutritionEvaluation {
            id: self.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            age,
            gender,
            height,
            weight,
            gym_start_date: self
                .gym_start_date
                .unwrap_or_else(|| Local::now().date_naive()),
            skin_folds,
            has_lost_weight_recently: self.has_lost_weight_recently,
            diet_phases: self.diet_phases,
            reverse_diet: self.reverse_diet,
            active_bulk: self.active_bulk,
            training_days_per_week: self.training_days_per_week,
            hours_per_session: self.hours_per_session,
            current_cardio: self.current_cardio,
            daily_activity: self.daily_activity,
            current_phase: self.current_phase,
            calculated: empty_calculation(),
            created_at: self.created_at.unwrap_or(now),
            updated_at: now,
        };
        evaluation.calculated = calculate(&evaluation);

        tracing::info!(
            evaluation_id = %evaluation.id,
            body_fat = evaluation.calculated.body_fat_percentage,
            tdee = evaluation.calculated.tdee,
            real_tdee = ?evaluation.calculated.real_tdee,
            "Committed nutrition evaluation"
        );

        Ok(evaluation)
    }
}

fn required<T>(value: Option<T>, field: &str) -> Result<T> {
    value.ok_or_else(|| {
        CalculationError::MissingField {
            field: field.to_string(),
        }
        .into()
    })
}

fn positive(parameter: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(parameter, value).into())
    }
}

fn invalid(parameter: &str, value: impl ToString) -> CalculationError {
    CalculationError::InvalidParameter {
        calculation: "nutrition evaluation".to_string(),
        parameter: parameter.to_string(),
        value: value.to_string(),
    }
}

fn empty_calculation() -> CalculatedData {
    CalculatedData {
        body_fat_percentage: 0.0,
        lean_mass: 0.0,
        fat_mass: 0.0,
        bmr: 0.0,
        tdee: 0.0,
        tdee_breakdown: TdeeBreakdown {
            bmr: 0.0,
            neat: 0.0,
            weights: 0.0,
            cardio: 0.0,
        },
        real_tdee: None,
        macros: calculate_macro_plan(0.0, 0.0),
    }
}

/// Skin folds -> composition -> TDEE -> macros for one evaluation
pub fn calculate(evaluation: &NutritionEvaluation) -> CalculatedData {
    let body_fat = calculate_body_fat(
        &evaluation.skin_folds,
        f64::from(evaluation.age),
        evaluation.gender,
    );
    let composition = composition_from_body_fat(evaluation.weight, body_fat);

    let tdee = calculate_tdee(&TdeeInput {
        weight: evaluation.weight,
        height: evaluation.height,
        age: f64::from(evaluation.age),
        sex: evaluation.gender,
        daily_activity: evaluation.daily_activity,
        training_days_per_week: evaluation.training_days_per_week,
        hours_per_session: evaluation.hours_per_session,
        cardio: evaluation.current_cardio.clone(),
        lean_mass: Some(composition.lean_mass),
    });

    let real_tdee = evaluation.active_bulk.real_tdee();
    let effective = real_tdee.filter(|t| *t != 0.0).unwrap_or(tdee.tdee);

    CalculatedData {
        body_fat_percentage: composition.body_fat_percentage,
        lean_mass: composition.lean_mass,
        fat_mass: composition.fat_mass,
        bmr: tdee.bmr,
        tdee: tdee.tdee,
        tdee_breakdown: tdee.breakdown,
        real_tdee,
        macros: calculate_macro_plan(effective, evaluation.weight),
    }
}
