use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::logging::LogConfig;
use crate::nutrition_log::NutritionGoals;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application metadata
    pub metadata: ConfigMetadata,

    /// Data file locations
    pub settings: AppSettings,

    /// Goals used for days logged before any evaluation
    #[serde(default)]
    pub nutrition: NutritionGoals,

    #[serde(default)]
    pub logging: LogConfig,
}

/// Configuration metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigMetadata {
    /// Configuration format version
    pub version: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSettings {
    /// Directory holding the data files
    pub data_dir: PathBuf,

    /// Profile, entries and evaluation (JSON, relative to `data_dir`)
    pub weight_file: PathBuf,

    /// Daily food logs (JSON, relative to `data_dir`)
    pub nutrition_file: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        let now = Utc::now();

        AppConfig {
            metadata: ConfigMetadata {
                version: "1.0".to_string(),
                created_at: now,
                updated_at: now,
            },
            settings: AppSettings::default(),
            nutrition: NutritionGoals::default(),
            logging: LogConfig::default(),
        }
    }
}

impl Default for AppSettings {
    fn default() -> Self {
        AppSettings {
            data_dir: dirs::data_local_dir()
                .map(|dir| dir.join("weightrs"))
                .unwrap_or_else(|| PathBuf::from("./data")),
            weight_file: PathBuf::from("weight-tracker.json"),
            nutrition_file: PathBuf::from("nutrition-log.json"),
        }
    }
}

impl AppSettings {
    pub fn weight_path(&self) -> PathBuf {
        self.data_dir.join(&self.weight_file)
    }

    pub fn nutrition_path(&self) -> PathBuf {
        self.data_dir.join(&self.nutrition_file)
    }
}

/// Configuration management implementation
impl AppConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: AppConfig = toml::from_str(&content)
            .with_context(|| "Failed to parse TOML configuration")?;

        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.metadata.updated_at = Utc::now();

        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        let toml_content = toml::to_string_pretty(self)
            .with_context(|| "Failed to serialize configuration to TOML")?;

        fs::write(&path, toml_content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }

    /// Get default configuration file path
    pub fn default_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".weightrs")
            .join("config.toml")
    }

    /// Load `path` (or the default location), falling back to defaults when
    /// the file is missing. A file that exists but does not parse is an error.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        let config_path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(Self::default_config_path);

        if !config_path.exists() {
            return Ok(Self::default());
        }
        Self::load_from_file(&config_path)
    }

    /// Save configuration to default location
    pub fn save_default(&mut self) -> Result<()> {
        let config_path = Self::default_config_path();
        self.save_to_file(config_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::{LogFormat, LogLevel};
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        let deserialized: AppConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(config.metadata.version, deserialized.metadata.version);
        assert_eq!(config.settings, deserialized.settings);
        assert_eq!(deserialized.nutrition, NutritionGoals::default());
    }

    #[test]
    fn test_config_file_io() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.toml");

        let mut original = AppConfig::default();
        original.settings.data_dir = temp_dir.path().to_path_buf();
        original.nutrition.calories = dec!(2800);
        original.logging.level = LogLevel::Debug;
        original.logging.format = LogFormat::Json;

        original.save_to_file(&config_path).unwrap();
        let loaded = AppConfig::load_from_file(&config_path).unwrap();

        assert_eq!(loaded.nutrition.calories, dec!(2800));
        assert_eq!(loaded.logging.level, LogLevel::Debug);
        assert_eq!(loaded.logging.format, LogFormat::Json);
        assert_eq!(
            loaded.settings.weight_path(),
            temp_dir.path().join("weight-tracker.json")
        );
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let content = r#"
            [metadata]
            version = "1.0"
            created_at = "2025-01-01T00:00:00Z"
            updated_at = "2025-01-01T00:00:00Z"

            [settings]
            data_dir = "/tmp/weightrs"
            weight_file = "w.json"
            nutrition_file = "n.json"
        "#;
        let config: AppConfig = toml::from_str(content).unwrap();
        assert_eq!(config.nutrition.water, 8);
        assert_eq!(config.logging.level, LogLevel::Warn);
        assert_eq!(config.settings.nutrition_path(), PathBuf::from("/tmp/weightrs/n.json"));
    }

    #[test]
    fn test_load_or_default() {
        let temp_dir = tempdir().unwrap();
        let missing = temp_dir.path().join("absent.toml");
        let config = AppConfig::load_or_default(Some(&missing)).unwrap();
        assert_eq!(config.metadata.version, "1.0");

        let broken = temp_dir.path().join("broken.toml");
        fs::write(&broken, "not = [valid").unwrap();
        assert!(AppConfig::load_or_default(Some(&broken)).is_err());
    }
}
