use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Phase the user is currently training for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalType {
    Bulk,
    Cut,
    Maintenance,
}

impl GoalType {
    pub const ALL: [GoalType; 3] = [GoalType::Bulk, GoalType::Cut, GoalType::Maintenance];
}

impl fmt::Display for GoalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GoalType::Bulk => write!(f, "bulk"),
            GoalType::Cut => write!(f, "cut"),
            GoalType::Maintenance => write!(f, "maintenance"),
        }
    }
}

impl FromStr for GoalType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bulk" | "volumen" => Ok(GoalType::Bulk),
            "cut" | "definicion" | "definición" => Ok(GoalType::Cut),
            "maintenance" | "mantenimiento" => Ok(GoalType::Maintenance),
            _ => Err(format!("Invalid goal type: {}", s)),
        }
    }
}

/// Biological sex, used only by the physiological formulas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BiologicalSex {
    Male,
    Female,
}

impl FromStr for BiologicalSex {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "male" | "m" | "hombre" => Ok(BiologicalSex::Male),
            "female" | "f" | "mujer" => Ok(BiologicalSex::Female),
            _ => Err(format!("Invalid sex: {}", s)),
        }
    }
}

/// Resistance-training experience
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExperienceLevel {
    /// Less than one year of consistent training
    Beginner,
    /// One to four years
    Intermediate,
    /// Four years or more
    Advanced,
}

impl fmt::Display for ExperienceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExperienceLevel::Beginner => write!(f, "beginner"),
            ExperienceLevel::Intermediate => write!(f, "intermediate"),
            ExperienceLevel::Advanced => write!(f, "advanced"),
        }
    }
}

impl FromStr for ExperienceLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "beginner" => Ok(ExperienceLevel::Beginner),
            "intermediate" => Ok(ExperienceLevel::Intermediate),
            "advanced" => Ok(ExperienceLevel::Advanced),
            _ => Err(format!("Invalid experience level: {}", s)),
        }
    }
}

/// A single body-weight measurement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightEntry {
    /// Unique identifier for the entry
    pub id: String,

    /// Calendar day of the measurement
    pub date: NaiveDate,

    /// Body weight in kilograms
    pub weight: f64,

    /// Measurement taken the day after a cheat meal
    #[serde(default)]
    pub is_cheat_meal: bool,

    /// Measurement inflated by fluid retention
    #[serde(default)]
    pub is_retention: bool,

    /// Free-form notes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WeightEntry {
    /// Create an unflagged entry with a fresh id
    pub fn new(date: NaiveDate, weight: f64) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            date,
            weight,
            is_cheat_meal: false,
            is_retention: false,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn cheat_meal(mut self) -> Self {
        self.is_cheat_meal = true;
        self
    }

    pub fn retention(mut self) -> Self {
        self.is_retention = true;
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Valid entries feed every mean and trend computation.
    /// Flagged entries are still displayed and counted.
    pub fn is_valid(&self) -> bool {
        !self.is_cheat_meal && !self.is_retention
    }
}

/// Heaviest weight accepted from user input or imports (kg)
pub const MAX_WEIGHT_KG: f64 = 500.0;

/// Accepts weights in `(0, MAX_WEIGHT_KG]`
pub fn is_plausible_weight(weight: f64) -> bool {
    weight.is_finite() && weight > 0.0 && weight <= MAX_WEIGHT_KG
}

/// Partial update applied to an existing entry
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeightEntryUpdate {
    pub date: Option<NaiveDate>,
    pub weight: Option<f64>,
    pub is_cheat_meal: Option<bool>,
    pub is_retention: Option<bool>,
    pub notes: Option<Option<String>>,
}

/// The single user profile of an installation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub goal_type: GoalType,

    /// Target weight in kilograms
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_weight: Option<f64>,

    pub start_weight: f64,
    pub start_date: NaiveDate,

    /// Always the weight of the most recent entry once entries exist
    pub current_weight: f64,

    /// Height in centimeters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<BiologicalSex>,

    /// Planned bulk duration in months
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bulk_duration_months: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experience_level: Option<ExperienceLevel>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to create a profile
#[derive(Debug, Clone, PartialEq)]
pub struct NewProfile {
    pub name: String,
    pub goal_type: GoalType,
    pub target_weight: Option<f64>,
    pub start_weight: f64,
    pub start_date: NaiveDate,
    pub height: Option<f64>,
    pub age: Option<u32>,
    pub gender: Option<BiologicalSex>,
    pub bulk_duration_months: Option<u32>,
    pub experience_level: Option<ExperienceLevel>,
}

/// Partial profile update
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub goal_type: Option<GoalType>,
    pub target_weight: Option<Option<f64>>,
    pub height: Option<f64>,
    pub age: Option<u32>,
    pub gender: Option<BiologicalSex>,
    pub bulk_duration_months: Option<u32>,
    pub experience_level: Option<ExperienceLevel>,
}

/// Aggregate statistics over a weight history.
///
/// Derived on every read and never persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    /// Mean weight of valid entries
    pub average_weight: f64,

    /// Last minus first weight over all entries, flagged ones included
    pub weight_change: f64,

    /// kg/week from valid entries, 0 below a 7-day valid span
    pub weekly_average_change: f64,

    /// kg/month from valid entries, 0 below a 30-day valid span
    pub monthly_average_change: f64,

    pub moving_average_7: f64,
    pub moving_average_14: f64,
    pub moving_average_30: f64,

    pub total_entries: usize,
    pub cheat_meal_count: usize,
    pub retention_count: usize,

    /// Inclusive day span between first and last entry
    pub days_tracked: i64,

    /// Percentage of tracked days with an entry, capped at 100
    pub consistency_score: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projected_weight_30_days: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projected_weight_goal: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_days_to_goal: Option<f64>,
}

/// Summary of one Monday-based calendar week
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyAnalysis {
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub average_weight: f64,
    pub weight_change: f64,
    pub entries: usize,
    pub cheat_meals: usize,
    pub retentions: usize,
}

/// One point of the weight chart with trailing averages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartDataPoint {
    pub date: NaiveDate,
    pub weight: f64,
    pub moving_average_7: f64,
    pub moving_average_14: f64,
    pub moving_average_30: f64,
    pub is_cheat_meal: bool,
    pub is_retention: bool,
}
