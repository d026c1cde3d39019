//! Weight history repository
//!
//! Owns the profile, the entries and the latest nutrition evaluation. Derived
//! values (statistics, insights, anomalies) are recomputed on every read and
//! never cached. Entries are kept newest first.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::anomaly::{detect_anomalies, AnomalyReport};
use crate::bulk_planner::{plan_bulk, BulkPlan};
use crate::error::{Result, StorageError, WeightrsError};
use crate::evaluation::NutritionEvaluation;
use crate::insights::get_smart_insights;
use crate::models::{
    is_plausible_weight, ChartDataPoint, GoalType, NewProfile, ProfileUpdate, Statistics,
    UserProfile, WeeklyAnalysis, WeightEntry, WeightEntryUpdate, MAX_WEIGHT_KG,
};
use crate::moving_average::chart_series;
use crate::statistics::{calculate_statistics, weekly_analysis};

/// Persisted form of the store; also the JSON backup layout
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Backup {
    pub profile: Option<UserProfile>,
    pub entries: Vec<WeightEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaluation: Option<NutritionEvaluation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_date: Option<chrono::DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
pub struct WeightStore {
    profile: Option<UserProfile>,
    entries: Vec<WeightEntry>,
    evaluation: Option<NutritionEvaluation>,
    dirty: bool,
}

fn validate_weight(weight: f64) -> Result<()> {
    if is_plausible_weight(weight) {
        Ok(())
    } else {
        Err(WeightrsError::Validation(format!(
            "Weight must be in (0, {}] kg, got {}",
            MAX_WEIGHT_KG, weight
        )))
    }
}

fn entry_not_found(id: &str) -> WeightrsError {
    StorageError::NotFound {
        kind: "entry".to_string(),
        id: id.to_string(),
    }
    .into()
}

impl WeightStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_backup(backup: Backup) -> Self {
        let mut store = Self {
            profile: backup.profile,
            entries: backup.entries,
            evaluation: backup.evaluation,
            dirty: false,
        };
        store.sort_entries();
        store
    }

    pub fn to_backup(&self) -> Backup {
        Backup {
            profile: self.profile.clone(),
            entries: self.entries.clone(),
            evaluation: self.evaluation.clone(),
            export_date: Some(Utc::now()),
        }
    }

    /// Load from a JSON file, or an empty store if it does not exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!(path = %path.display(), "No weight data found, starting empty");
            return Ok(Self::new());
        }
        let content = fs::read_to_string(path)?;
        let backup: Backup = serde_json::from_str(&content).map_err(|e| StorageError::Corrupted {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        tracing::info!(
            path = %path.display(),
            entries = backup.entries.len(),
            has_profile = backup.profile.is_some(),
            "Loaded weight data"
        );
        Ok(Self::from_backup(backup))
    }

    /// Write to `path` if anything changed since the last load or save
    pub fn save(&mut self, path: &Path) -> Result<bool> {
        if !self.dirty && path.exists() {
            tracing::debug!(path = %path.display(), "Weight data unchanged, skipping save");
            return Ok(false);
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.to_backup()).map_err(|e| {
            StorageError::Serialization {
                reason: e.to_string(),
            }
        })?;
        fs::write(path, json)?;
        self.dirty = false;
        tracing::info!(path = %path.display(), entries = self.entries.len(), "Saved weight data");
        Ok(true)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }

    /// Newest first
    pub fn entries(&self) -> &[WeightEntry] {
        &self.entries
    }

    pub fn entry(&self, id: &str) -> Option<&WeightEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn evaluation(&self) -> Option<&NutritionEvaluation> {
        self.evaluation.as_ref()
    }

    pub fn set_evaluation(&mut self, evaluation: NutritionEvaluation) {
        self.evaluation = Some(evaluation);
        self.dirty = true;
    }

    pub fn clear_evaluation(&mut self) {
        if self.evaluation.take().is_some() {
            self.dirty = true;
        }
    }

    /// Replace any existing profile
    pub fn create_profile(&mut self, data: NewProfile) -> Result<&UserProfile> {
        validate_weight(data.start_weight)?;
        if let Some(target) = data.target_weight {
            validate_weight(target)?;
        }

        let now = Utc::now();
        self.profile = Some(UserProfile {
            id: uuid::Uuid::new_v4().to_string(),
            name: data.name,
            goal_type: data.goal_type,
            target_weight: data.target_weight,
            start_weight: data.start_weight,
            start_date: data.start_date,
            current_weight: data.start_weight,
            height: data.height,
            age: data.age,
            gender: data.gender,
            bulk_duration_months: data.bulk_duration_months,
            experience_level: data.experience_level,
            created_at: now,
            updated_at: now,
        });
        self.sync_current_weight();
        self.dirty = true;

        self.profile
            .as_ref()
            .ok_or_else(|| WeightrsError::Internal("profile vanished after creation".to_string()))
    }

    pub fn update_profile(&mut self, update: ProfileUpdate) -> Result<&UserProfile> {
        if let Some(Some(target)) = update.target_weight {
            validate_weight(target)?;
        }
        let profile = self.profile.as_mut().ok_or(StorageError::NoProfile)?;

        if let Some(name) = update.name {
            profile.name = name;
        }
        if let Some(goal_type) = update.goal_type {
            profile.goal_type = goal_type;
        }
        if let Some(target_weight) = update.target_weight {
            profile.target_weight = target_weight;
        }
        if let Some(height) = update.height {
            profile.height = Some(height);
        }
        if let Some(age) = update.age {
            profile.age = Some(age);
        }
        if let Some(gender) = update.gender {
            profile.gender = Some(gender);
        }
        if let Some(months) = update.bulk_duration_months {
            profile.bulk_duration_months = Some(months);
        }
        if let Some(level) = update.experience_level {
            profile.experience_level = Some(level);
        }
        profile.updated_at = Utc::now();
        self.dirty = true;

        Ok(profile)
    }

    /// Insert an entry and return its id
    pub fn add_entry(&mut self, entry: WeightEntry) -> Result<String> {
        validate_weight(entry.weight)?;
        let id = entry.id.clone();
        tracing::debug!(%id, date = %entry.date, weight = entry.weight, "Adding weight entry");

        self.entries.push(entry);
        self.after_entry_mutation();
        Ok(id)
    }

    pub fn update_entry(&mut self, id: &str, update: WeightEntryUpdate) -> Result<()> {
        if let Some(weight) = update.weight {
            validate_weight(weight)?;
        }
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| entry_not_found(id))?;

        if let Some(date) = update.date {
            entry.date = date;
        }
        if let Some(weight) = update.weight {
            entry.weight = weight;
        }
        if let Some(flag) = update.is_cheat_meal {
            entry.is_cheat_meal = flag;
        }
        if let Some(flag) = update.is_retention {
            entry.is_retention = flag;
        }
        if let Some(notes) = update.notes {
            entry.notes = notes;
        }
        entry.updated_at = Utc::now();

        self.after_entry_mutation();
        Ok(())
    }

    pub fn delete_entry(&mut self, id: &str) -> Result<WeightEntry> {
        let index = self
            .entries
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| entry_not_found(id))?;
        let removed = self.entries.remove(index);
        self.after_entry_mutation();
        Ok(removed)
    }

    /// Replace all entries with an imported set
    pub fn import_entries(&mut self, entries: Vec<WeightEntry>) {
        tracing::info!(count = entries.len(), "Replacing entries with imported data");
        self.entries = entries;
        self.after_entry_mutation();
    }

    /// Replace profile, entries and evaluation from a backup
    pub fn restore(&mut self, backup: Backup) {
        *self = Self::from_backup(backup);
        self.sync_current_weight();
        self.dirty = true;
    }

    pub fn clear_all(&mut self) {
        self.entries.clear();
        self.profile = None;
        self.evaluation = None;
        self.dirty = true;
    }

    fn sort_entries(&mut self) {
        self.entries.sort_by(|a, b| {
            b.date
                .cmp(&a.date)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
    }

    fn sync_current_weight(&mut self) {
        if let (Some(profile), Some(latest)) = (self.profile.as_mut(), self.entries.first()) {
            if profile.current_weight != latest.weight {
                profile.current_weight = latest.weight;
                profile.updated_at = Utc::now();
            }
        }
    }

    fn after_entry_mutation(&mut self) {
        self.sort_entries();
        self.sync_current_weight();
        self.dirty = true;
    }

    fn goal(&self) -> (GoalType, Option<f64>) {
        self.profile
            .as_ref()
            .map(|p| (p.goal_type, p.target_weight))
            .unwrap_or((GoalType::Maintenance, None))
    }

    pub fn statistics(&self) -> Statistics {
        let (goal_type, target) = self.goal();
        calculate_statistics(&self.entries, goal_type, target)
    }

    pub fn insights(&self) -> Vec<String> {
        let (goal_type, _) = self.goal();
        get_smart_insights(&self.statistics(), goal_type)
    }

    pub fn anomalies(&self) -> AnomalyReport {
        detect_anomalies(&self.entries)
    }

    pub fn weekly_analysis(&self) -> Vec<WeeklyAnalysis> {
        weekly_analysis(&self.entries)
    }

    pub fn chart_series(&self) -> Vec<ChartDataPoint> {
        chart_series(&self.entries)
    }

    pub fn bulk_plan(&self) -> Result<BulkPlan> {
        let profile = self.profile.as_ref().ok_or(StorageError::NoProfile)?;
        Ok(plan_bulk(profile, &self.entries))
    }
}
