//! Energy expenditure estimation
//!
//! Computes basal metabolic rate with either Mifflin-St Jeor or Katch-McArdle,
//! adds non-exercise activity, resistance training and cardio, and exposes the
//! resulting total daily energy expenditure together with its breakdown.
//!
//! When a user is in an active bulk, [`calculate_real_tdee`] back-solves the
//! expenditure from what they eat and how fast they gain. That observed value
//! supersedes the formula estimate wherever both exist.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{BiologicalSex, ExperienceLevel};

/// Energy stored in one kilogram of mixed body tissue (kcal)
pub const KCAL_PER_KG_TISSUE: f64 = 7700.0;

/// Average METs for moderate-to-hard resistance training
pub const RESISTANCE_TRAINING_METS: f64 = 5.5;

/// Cardio intensity used when none is given
pub const DEFAULT_CARDIO_INTENSITY: f64 = 5.0;

/// Daily activity outside structured exercise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ActivityLevel {
    #[default]
    Sedentary,
    Light,
    Moderate,
    Active,
}

impl ActivityLevel {
    /// Multiplier applied to BMR
    pub fn multiplier(&self) -> f64 {
        match self {
            ActivityLevel::Sedentary => 1.2,
            ActivityLevel::Light => 1.375,
            ActivityLevel::Moderate => 1.55,
            ActivityLevel::Active => 1.725,
        }
    }
}

impl std::str::FromStr for ActivityLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sedentary" => Ok(ActivityLevel::Sedentary),
            "light" => Ok(ActivityLevel::Light),
            "moderate" => Ok(ActivityLevel::Moderate),
            "active" => Ok(ActivityLevel::Active),
            _ => Err(format!("Invalid activity level: {}", s)),
        }
    }
}

/// Cardio modality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardioType {
    Walking,
    FastWalking,
    Jogging,
    Running,
    Hiit,
    Cycling,
    Elliptical,
    Mixed,
}

impl CardioType {
    /// Base METs at intensity factor 1.0
    pub fn base_mets(&self) -> f64 {
        match self {
            CardioType::Walking => 3.5,
            CardioType::FastWalking => 4.5,
            CardioType::Jogging => 7.0,
            CardioType::Running => 9.0,
            CardioType::Hiit => 8.0,
            CardioType::Cycling => 6.0,
            CardioType::Elliptical => 5.0,
            CardioType::Mixed => 6.0,
        }
    }
}

/// A recurring cardio routine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardioDetail {
    #[serde(rename = "type")]
    pub cardio_type: CardioType,
    pub days_per_week: f64,
    pub minutes_per_session: f64,
    /// Perceived intensity on a 1-10 scale
    #[serde(default = "default_intensity")]
    pub intensity: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

fn default_intensity() -> f64 {
    DEFAULT_CARDIO_INTENSITY
}

/// Which BMR estimator produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BmrFormula {
    /// Needs weight, height, age and sex
    MifflinStJeor,
    /// Needs lean mass only; preferred when body composition is known
    KatchMcArdle,
}

/// Mifflin-St Jeor BMR (kcal/day). Weight in kg, height in cm.
pub fn mifflin_st_jeor(weight_kg: f64, height_cm: f64, age: f64, sex: BiologicalSex) -> f64 {
    let base = 10.0 * weight_kg + 6.25 * height_cm - 5.0 * age;
    match sex {
        BiologicalSex::Male => base + 5.0,
        BiologicalSex::Female => base - 161.0,
    }
}

/// Katch-McArdle BMR (kcal/day) from lean mass in kg
pub fn katch_mcardle(lean_mass_kg: f64) -> f64 {
    370.0 + 21.6 * lean_mass_kg
}

/// Non-exercise activity thermogenesis on top of BMR
pub fn neat(bmr: f64, activity: ActivityLevel) -> f64 {
    bmr * (activity.multiplier() - 1.0)
}

/// Resistance training energy averaged over the week (kcal/day)
pub fn resistance_training_calories(weight_kg: f64, hours_per_session: f64, days_per_week: f64) -> f64 {
    let per_session = RESISTANCE_TRAINING_METS * weight_kg * hours_per_session;
    per_session * days_per_week / 7.0
}

/// Intensity scaling applied to the base METs of a cardio modality
pub fn cardio_intensity_factor(intensity: f64) -> f64 {
    0.7 + intensity * 0.06
}

/// Cardio energy averaged over the week (kcal/day)
pub fn cardio_calories(weight_kg: f64, cardio: &CardioDetail) -> f64 {
    let intensity = if cardio.intensity > 0.0 {
        cardio.intensity.clamp(1.0, 10.0)
    } else {
        DEFAULT_CARDIO_INTENSITY
    };

    let mets = cardio.cardio_type.base_mets() * cardio_intensity_factor(intensity);
    let per_session = mets * weight_kg * (cardio.minutes_per_session / 60.0);
    per_session * cardio.days_per_week / 7.0
}

/// Everything needed for a TDEE estimate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TdeeInput {
    pub weight: f64,
    pub height: f64,
    pub age: f64,
    pub sex: BiologicalSex,
    pub daily_activity: ActivityLevel,
    pub training_days_per_week: f64,
    pub hours_per_session: f64,
    /// Cardio routine, if the user does any
    pub cardio: Option<CardioDetail>,
    /// Switches BMR to Katch-McArdle when known
    pub lean_mass: Option<f64>,
}

/// Named components of the daily expenditure, rounded to whole kcal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TdeeBreakdown {
    pub bmr: f64,
    pub neat: f64,
    pub weights: f64,
    pub cardio: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TdeeResult {
    pub bmr: f64,
    pub tdee: f64,
    pub breakdown: TdeeBreakdown,
    pub formula: BmrFormula,
}

/// Total daily energy expenditure = BMR + NEAT + resistance + cardio
pub fn calculate_tdee(input: &TdeeInput) -> TdeeResult {
    let (bmr, formula) = match input.lean_mass {
        Some(lean) if lean > 0.0 => (katch_mcardle(lean), BmrFormula::KatchMcArdle),
        _ => (
            mifflin_st_jeor(input.weight, input.height, input.age, input.sex),
            BmrFormula::MifflinStJeor,
        ),
    };

    let neat = neat(bmr, input.daily_activity);
    let weights = resistance_training_calories(
        input.weight,
        input.hours_per_session,
        input.training_days_per_week,
    );
    let cardio = input
        .cardio
        .as_ref()
        .map(|c| cardio_calories(input.weight, c))
        .unwrap_or(0.0);

    let tdee = bmr + neat + weights + cardio;

    tracing::debug!(?formula, bmr, neat, weights, cardio, tdee, "Calculated TDEE");

    TdeeResult {
        bmr: bmr.round(),
        tdee: tdee.round(),
        breakdown: TdeeBreakdown {
            bmr: bmr.round(),
            neat: neat.round(),
            weights: weights.round(),
            cardio: cardio.round(),
        },
        formula,
    }
}

/// Observed TDEE during a bulk from intake and weekly gain (kg/week).
///
/// Energy balance: one kilogram of gained tissue costs [`KCAL_PER_KG_TISSUE`].
pub fn calculate_real_tdee(current_calories: f64, weekly_gain_kg: f64) -> f64 {
    let daily_surplus = weekly_gain_kg * KCAL_PER_KG_TISSUE / 7.0;
    (current_calories - daily_surplus).round()
}

/// Years of training between `gym_start` and `today`
pub fn training_years(gym_start: NaiveDate, today: NaiveDate) -> f64 {
    (today - gym_start).num_days().abs() as f64 / 365.0
}

pub fn experience_level(years: f64) -> ExperienceLevel {
    if years < 1.0 {
        ExperienceLevel::Beginner
    } else if years < 4.0 {
        ExperienceLevel::Intermediate
    } else {
        ExperienceLevel::Advanced
    }
}

/// Natural muscular potential estimate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MuscularPotential {
    /// Approximate natural lean mass ceiling (kg)
    pub max_lean_mass: f64,
    /// Expected lean gain for the current training year (kg/year)
    pub yearly_gain: f64,
}

/// Expected yearly lean gain by training year (1st, 2nd, 3rd, 4th+)
const YEARLY_MUSCLE_GAIN_KG: [f64; 4] = [10.0, 5.0, 2.5, 1.25];

pub fn muscular_potential(height_cm: f64, years: f64) -> MuscularPotential {
    let height_inches = height_cm / 2.54;
    let index = (years.max(0.0).floor() as usize).min(YEARLY_MUSCLE_GAIN_KG.len() - 1);

    MuscularPotential {
        max_lean_mass: (height_inches - 100.0) * 1.1,
        yearly_gain: YEARLY_MUSCLE_GAIN_KG[index],
    }
}
