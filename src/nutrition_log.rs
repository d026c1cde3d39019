//! Daily food log with meal and day totals
//!
//! Every food-list mutation rebuilds the affected meal's totals and then the
//! day's totals from scratch, under a per-date lock so concurrent edits to
//! different meals of the same day do not lose updates.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use uuid::Uuid;

use crate::error::{Result, StorageError, WeightrsError};
use crate::macros::MacroTargets;

/// Most recently used foods kept for quick re-selection
pub const MAX_RECENT_FOODS: usize = 20;

/// Largest quantity accepted for a single food entry (g)
pub const MAX_FOOD_GRAMS: Decimal = Decimal::from_parts(100_000, 0, 0, false, 0);

/// Largest per-100 g nutrient value accepted on a logged food
pub const MAX_NUTRIENT_PER_100G: Decimal = Decimal::from_parts(10_000, 0, 0, false, 0);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FoodCategory {
    Protein,
    Carbs,
    Vegetables,
    Fruits,
    Dairy,
    Fats,
    Beverages,
    Snacks,
    Supplements,
    #[default]
    Other,
}

/// Nutrition reference per 100 g. Never mutated by logging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodItem {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default)]
    pub category: FoodCategory,
    pub calories: Decimal,
    pub protein: Decimal,
    pub carbs: Decimal,
    pub fat: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fiber: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sugar: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sodium: Option<Decimal>,
    #[serde(default)]
    pub is_custom: bool,
}

impl FoodItem {
    pub fn new(
        name: impl Into<String>,
        calories: Decimal,
        protein: Decimal,
        carbs: Decimal,
        fat: Decimal,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            brand: None,
            category: FoodCategory::Other,
            calories,
            protein,
            carbs,
            fat,
            fiber: None,
            sugar: None,
            sodium: None,
            is_custom: false,
        }
    }

    pub fn with_category(mut self, category: FoodCategory) -> Self {
        self.category = category;
        self
    }

    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self
    }
}

/// Calories/protein/carbs/fat for a food entry, meal or day
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NutritionTotals {
    pub calories: Decimal,
    pub protein: Decimal,
    pub carbs: Decimal,
    pub fat: Decimal,
}

impl NutritionTotals {
    /// Calories to whole numbers, macros to one decimal
    pub fn rounded(self) -> Self {
        Self {
            calories: round_calories(self.calories),
            protein: round_macro(self.protein),
            carbs: round_macro(self.carbs),
            fat: round_macro(self.fat),
        }
    }

    fn sum<'a>(items: impl Iterator<Item = &'a NutritionTotals>) -> Self {
        items.fold(NutritionTotals::default(), |acc, t| NutritionTotals {
            calories: acc.calories + t.calories,
            protein: acc.protein + t.protein,
            carbs: acc.carbs + t.carbs,
            fat: acc.fat + t.fat,
        })
    }
}

fn round_calories(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

fn round_macro(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
}

/// Nutrients of `grams` of a food, scaled from its per-100 g values
pub fn food_nutrients(food: &FoodItem, grams: Decimal) -> NutritionTotals {
    let hundred = Decimal::ONE_HUNDRED;
    NutritionTotals {
        calories: round_calories(food.calories * grams / hundred),
        protein: round_macro(food.protein * grams / hundred),
        carbs: round_macro(food.carbs * grams / hundred),
        fat: round_macro(food.fat * grams / hundred),
    }
}

/// A logged quantity of a food with its nutrients captured at log time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodEntry {
    pub id: String,
    pub food_item: FoodItem,
    pub grams: Decimal,
    #[serde(flatten)]
    pub nutrients: NutritionTotals,
}

impl FoodEntry {
    pub fn new(food: &FoodItem, grams: Decimal) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            food_item: food.clone(),
            grams,
            nutrients: food_nutrients(food, grams),
        }
    }

    /// Re-derive the snapshot from the referenced food at a new quantity
    pub fn resize(&mut self, grams: Decimal) {
        self.grams = grams;
        self.nutrients = food_nutrients(&self.food_item, grams);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snacks,
    PreWorkout,
    PostWorkout,
}

impl MealType {
    pub const ALL: [MealType; 6] = [
        MealType::Breakfast,
        MealType::Lunch,
        MealType::Dinner,
        MealType::Snacks,
        MealType::PreWorkout,
        MealType::PostWorkout,
    ];

    /// Meals present on every day
    pub const STANDARD: [MealType; 4] = [
        MealType::Breakfast,
        MealType::Lunch,
        MealType::Dinner,
        MealType::Snacks,
    ];

    pub fn default_name(&self) -> &'static str {
        match self {
            MealType::Breakfast => "Breakfast",
            MealType::Lunch => "Lunch",
            MealType::Dinner => "Dinner",
            MealType::Snacks => "Snacks",
            MealType::PreWorkout => "Pre-workout",
            MealType::PostWorkout => "Post-workout",
        }
    }
}

impl std::fmt::Display for MealType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MealType::Breakfast => "breakfast",
            MealType::Lunch => "lunch",
            MealType::Dinner => "dinner",
            MealType::Snacks => "snacks",
            MealType::PreWorkout => "pre_workout",
            MealType::PostWorkout => "post_workout",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for MealType {
    type Err = WeightrsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "breakfast" => Ok(MealType::Breakfast),
            "lunch" => Ok(MealType::Lunch),
            "dinner" => Ok(MealType::Dinner),
            "snacks" | "snack" => Ok(MealType::Snacks),
            "pre_workout" | "preworkout" => Ok(MealType::PreWorkout),
            "post_workout" | "postworkout" => Ok(MealType::PostWorkout),
            other => Err(WeightrsError::Validation(format!(
                "Unknown meal type: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meal {
    pub id: String,
    #[serde(rename = "type")]
    pub meal_type: MealType,
    pub name: String,
    pub foods: Vec<FoodEntry>,
    pub totals: NutritionTotals,
}

impl Meal {
    pub fn empty(meal_type: MealType) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            meal_type,
            name: meal_type.default_name().to_string(),
            foods: Vec::new(),
            totals: NutritionTotals::default(),
        }
    }

    /// Rebuild totals from the food snapshots
    pub fn recalculate(&mut self) {
        self.totals = NutritionTotals::sum(self.foods.iter().map(|f| &f.nutrients)).rounded();
    }
}

/// Where the current nutrition goals came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalSource {
    Manual,
    Evaluation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutritionGoals {
    pub calories: Decimal,
    pub protein: Decimal,
    pub carbs: Decimal,
    pub fat: Decimal,
    /// Glasses of water per day
    pub water: u32,
    pub source: GoalSource,
}

impl Default for NutritionGoals {
    fn default() -> Self {
        Self {
            calories: Decimal::from(2500),
            protein: Decimal::from(150),
            carbs: Decimal::from(300),
            fat: Decimal::from(80),
            water: 8,
            source: GoalSource::Manual,
        }
    }
}

impl NutritionGoals {
    /// Goals taken from an evaluation's macro targets, keeping the water target
    pub fn from_macros(targets: &MacroTargets, water: u32) -> Self {
        let to_decimal = |v: f64| Decimal::from_f64(v).unwrap_or_default();
        Self {
            calories: round_calories(to_decimal(targets.calories)),
            protein: round_macro(to_decimal(targets.protein)),
            carbs: round_macro(to_decimal(targets.carbs)),
            fat: round_macro(to_decimal(targets.fat)),
            water,
            source: GoalSource::Evaluation,
        }
    }
}

/// One calendar day of meals and water
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyLog {
    pub id: String,
    pub date: NaiveDate,
    pub meals: Vec<Meal>,
    pub targets: NutritionTotals,
    pub totals: NutritionTotals,
    pub water_glasses: u32,
    pub water_target: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DailyLog {
    pub fn new(date: NaiveDate, goals: &NutritionGoals) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            date,
            meals: MealType::STANDARD.iter().map(|t| Meal::empty(*t)).collect(),
            targets: NutritionTotals {
                calories: goals.calories,
                protein: goals.protein,
                carbs: goals.carbs,
                fat: goals.fat,
            },
            totals: NutritionTotals::default(),
            water_glasses: 0,
            water_target: goals.water,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn meal(&self, meal_type: MealType) -> Option<&Meal> {
        self.meals.iter().find(|m| m.meal_type == meal_type)
    }

    /// Meal of the given type, appended if the day does not have one yet
    pub fn meal_mut_or_insert(&mut self, meal_type: MealType) -> &mut Meal {
        let index = match self.meals.iter().position(|m| m.meal_type == meal_type) {
            Some(index) => index,
            None => {
                self.meals.push(Meal::empty(meal_type));
                self.meals.len() - 1
            }
        };
        &mut self.meals[index]
    }

    /// Rebuild the day totals from the meal totals
    pub fn recalculate_day_totals(&mut self) {
        self.totals = NutritionTotals::sum(self.meals.iter().map(|m| &m.totals)).rounded();
        self.updated_at = Utc::now();
    }

    /// Rebuild every meal and then the day
    pub fn recalculate_all(&mut self) {
        for meal in &mut self.meals {
            meal.recalculate();
        }
        self.recalculate_day_totals();
    }
}

/// Serializable state of a [`NutritionLogStore`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NutritionLogSnapshot {
    pub logs: Vec<DailyLog>,
    #[serde(default)]
    pub custom_foods: Vec<FoodItem>,
    #[serde(default)]
    pub recent_foods: Vec<FoodItem>,
    #[serde(default)]
    pub goals: NutritionGoals,
    #[serde(default)]
    pub meal_names: HashMap<MealType, String>,
}

type DaySlot = Arc<Mutex<DailyLog>>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Thread-safe owner of all daily logs and food lists
#[derive(Debug, Default)]
pub struct NutritionLogStore {
    days: RwLock<HashMap<NaiveDate, DaySlot>>,
    custom_foods: Mutex<Vec<FoodItem>>,
    recent_foods: Mutex<Vec<FoodItem>>,
    goals: RwLock<NutritionGoals>,
    meal_names: RwLock<HashMap<MealType, String>>,
}

impl NutritionLogStore {
    pub fn new(goals: NutritionGoals) -> Self {
        Self {
            goals: RwLock::new(goals),
            ..Self::default()
        }
    }

    pub fn from_snapshot(snapshot: NutritionLogSnapshot) -> Self {
        let days = snapshot
            .logs
            .into_iter()
            .map(|log| (log.date, Arc::new(Mutex::new(log))))
            .collect();
        Self {
            days: RwLock::new(days),
            custom_foods: Mutex::new(snapshot.custom_foods),
            recent_foods: Mutex::new(snapshot.recent_foods),
            goals: RwLock::new(snapshot.goals),
            meal_names: RwLock::new(snapshot.meal_names),
        }
    }

    /// Copy of the whole store, logs newest first
    pub fn snapshot(&self) -> NutritionLogSnapshot {
        let mut logs: Vec<DailyLog> = self
            .days
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .map(|slot| lock(slot).clone())
            .collect();
        logs.sort_by(|a, b| b.date.cmp(&a.date));

        NutritionLogSnapshot {
            logs,
            custom_foods: self.custom_foods(),
            recent_foods: self.recent_foods(),
            goals: self.goals(),
            meal_names: self
                .meal_names
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .clone(),
        }
    }

    /// Load a store from a JSON snapshot, or an empty store if the file is absent
    pub fn load(path: &Path, default_goals: NutritionGoals) -> Result<Self> {
        if !path.exists() {
            tracing::info!(path = %path.display(), "No nutrition log found, starting empty");
            return Ok(Self::new(default_goals));
        }
        let content = fs::read_to_string(path)?;
        let snapshot: NutritionLogSnapshot =
            serde_json::from_str(&content).map_err(|e| StorageError::Corrupted {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        tracing::info!(path = %path.display(), days = snapshot.logs.len(), "Loaded nutrition log");
        Ok(Self::from_snapshot(snapshot))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.snapshot()).map_err(|e| {
            StorageError::Serialization {
                reason: e.to_string(),
            }
        })?;
        fs::write(path, json)?;
        tracing::info!(path = %path.display(), "Saved nutrition log");
        Ok(())
    }

    fn existing_slot(&self, date: NaiveDate) -> Option<DaySlot> {
        self.days
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&date)
            .cloned()
    }

    fn slot_or_create(&self, date: NaiveDate) -> DaySlot {
        if let Some(slot) = self.existing_slot(date) {
            return slot;
        }
        let goals = self.goals();
        let mut days = self.days.write().unwrap_or_else(PoisonError::into_inner);
        days.entry(date)
            .or_insert_with(|| {
                tracing::debug!(%date, "Creating daily log");
                Arc::new(Mutex::new(DailyLog::new(date, &goals)))
            })
            .clone()
    }

    /// Run `f` on the day's log inside that day's critical section
    fn with_day<R>(&self, date: NaiveDate, f: impl FnOnce(&mut DailyLog) -> R) -> Option<R> {
        let slot = self.existing_slot(date)?;
        let mut log = lock(&slot);
        Some(f(&mut log))
    }

    fn with_day_or_create<R>(&self, date: NaiveDate, f: impl FnOnce(&mut DailyLog) -> R) -> R {
        let slot = self.slot_or_create(date);
        let mut log = lock(&slot);
        f(&mut log)
    }

    pub fn log_for(&self, date: NaiveDate) -> Option<DailyLog> {
        self.with_day(date, |log| log.clone())
    }

    pub fn get_or_create(&self, date: NaiveDate) -> DailyLog {
        self.with_day_or_create(date, |log| log.clone())
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        let mut dates: Vec<NaiveDate> = self
            .days
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .copied()
            .collect();
        dates.sort();
        dates
    }

    /// Log `grams` of `food` to a meal, creating the day and meal as needed
    pub fn add_food_to_meal(
        &self,
        date: NaiveDate,
        meal_type: MealType,
        food: &FoodItem,
        grams: Decimal,
    ) -> Result<FoodEntry> {
        validate_grams(grams)?;
        validate_food(food)?;
        let entry = FoodEntry::new(food, grams);

        self.with_day_or_create(date, |log| {
            let meal = log.meal_mut_or_insert(meal_type);
            meal.foods.push(entry.clone());
            meal.recalculate();
            log.recalculate_day_totals();
        });
        self.add_to_recent_foods(food);

        tracing::debug!(%date, %meal_type, food = %food.name, %grams, "Added food to meal");
        Ok(entry)
    }

    /// Remove an entry; returns false if the day, meal or entry does not exist
    pub fn remove_food_from_meal(&self, date: NaiveDate, meal_type: MealType, entry_id: &str) -> bool {
        self.with_day(date, |log| {
            let Some(meal) = log.meals.iter_mut().find(|m| m.meal_type == meal_type) else {
                return false;
            };
            let before = meal.foods.len();
            meal.foods.retain(|f| f.id != entry_id);
            let removed = meal.foods.len() != before;
            meal.recalculate();
            log.recalculate_day_totals();
            removed
        })
        .unwrap_or(false)
    }

    /// Change an entry's quantity, re-deriving nutrients from its food item
    pub fn update_food_in_meal(
        &self,
        date: NaiveDate,
        meal_type: MealType,
        entry_id: &str,
        grams: Decimal,
    ) -> Result<bool> {
        validate_grams(grams)?;
        Ok(self
            .with_day(date, |log| {
                let Some(meal) = log.meals.iter_mut().find(|m| m.meal_type == meal_type) else {
                    return false;
                };
                let updated = match meal.foods.iter_mut().find(|f| f.id == entry_id) {
                    Some(entry) => {
                        entry.resize(grams);
                        true
                    }
                    None => false,
                };
                meal.recalculate();
                log.recalculate_day_totals();
                updated
            })
            .unwrap_or(false))
    }

    /// Returns the new glass count
    pub fn add_water(&self, date: NaiveDate) -> u32 {
        self.with_day_or_create(date, |log| {
            log.water_glasses += 1;
            log.updated_at = Utc::now();
            log.water_glasses
        })
    }

    pub fn remove_water(&self, date: NaiveDate) -> Option<u32> {
        self.with_day(date, |log| {
            log.water_glasses = log.water_glasses.saturating_sub(1);
            log.updated_at = Utc::now();
            log.water_glasses
        })
    }

    /// Negative counts floor at zero
    pub fn set_water_glasses(&self, date: NaiveDate, glasses: i64) -> Option<u32> {
        let glasses = u32::try_from(glasses.max(0)).unwrap_or(u32::MAX);
        self.with_day(date, |log| {
            log.water_glasses = glasses;
            log.updated_at = Utc::now();
            log.water_glasses
        })
    }

    pub fn set_day_notes(&self, date: NaiveDate, notes: impl Into<String>) -> bool {
        let notes = notes.into();
        self.with_day(date, |log| {
            log.notes = if notes.is_empty() { None } else { Some(notes) };
            log.updated_at = Utc::now();
        })
        .is_some()
    }

    /// Full recompute of every meal and the day totals
    pub fn recalculate_totals(&self, date: NaiveDate) -> bool {
        self.with_day(date, DailyLog::recalculate_all).is_some()
    }

    pub fn goals(&self) -> NutritionGoals {
        self.goals
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Applies to days created from now on
    pub fn set_goals(&self, goals: NutritionGoals) {
        *self.goals.write().unwrap_or_else(PoisonError::into_inner) = goals;
    }

    /// Register a user-defined food under a fresh id
    pub fn add_custom_food(&self, mut food: FoodItem) -> FoodItem {
        food.id = Uuid::new_v4().to_string();
        food.is_custom = true;
        lock(&self.custom_foods).push(food.clone());
        food
    }

    pub fn remove_custom_food(&self, food_id: &str) -> bool {
        let mut foods = lock(&self.custom_foods);
        let before = foods.len();
        foods.retain(|f| f.id != food_id);
        foods.len() != before
    }

    pub fn custom_foods(&self) -> Vec<FoodItem> {
        lock(&self.custom_foods).clone()
    }

    /// Most recent first, unique by id, capped at [`MAX_RECENT_FOODS`]
    pub fn add_to_recent_foods(&self, food: &FoodItem) {
        let mut recent = lock(&self.recent_foods);
        recent.retain(|f| f.id != food.id);
        recent.insert(0, food.clone());
        recent.truncate(MAX_RECENT_FOODS);
    }

    pub fn recent_foods(&self) -> Vec<FoodItem> {
        lock(&self.recent_foods).clone()
    }

    pub fn set_meal_name(&self, meal_type: MealType, name: impl Into<String>) {
        self.meal_names
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(meal_type, name.into());
    }

    /// Display name, falling back to the built-in name
    pub fn meal_name(&self, meal_type: MealType) -> String {
        self.meal_names
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&meal_type)
            .filter(|name| !name.is_empty())
            .cloned()
            .unwrap_or_else(|| meal_type.default_name().to_string())
    }
}

fn validate_grams(grams: Decimal) -> Result<()> {
    if grams <= Decimal::ZERO {
        return Err(WeightrsError::Validation(format!(
            "Food quantity must be positive, got {} g",
            grams
        )));
    }
    if grams > MAX_FOOD_GRAMS {
        return Err(WeightrsError::Validation(format!(
            "Food quantity must be at most {} g, got {} g",
            MAX_FOOD_GRAMS, grams
        )));
    }
    Ok(())
}

// Keeps per-entry scaling and day sums far from the Decimal range
fn validate_food(food: &FoodItem) -> Result<()> {
    let nutrients = [
        ("calories", food.calories),
        ("protein", food.protein),
        ("carbs", food.carbs),
        ("fat", food.fat),
    ];
    for (name, value) in nutrients {
        if value < Decimal::ZERO || value > MAX_NUTRIENT_PER_100G {
            return Err(WeightrsError::Validation(format!(
                "{} per 100 g must be between 0 and {}, got {}",
                name, MAX_NUTRIENT_PER_100G, value
            )));
        }
    }
    Ok(())
}
