//! Configuration for lector

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::claude::ClaudeModel;
use crate::quiz::{DifficultyRecommender, DifficultyTier, SkillPrioritizer};

/// Application configuration, stored as JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Claude model used for all three collaborators
    pub model: ClaudeModel,

    /// Tier of the first generated passage, before any history exists
    pub default_difficulty: DifficultyTier,

    /// Tested skills below this first-attempt ratio are prioritized
    pub weakness_threshold: f64,

    /// Percentage at or above which Advanced is recommended
    pub advanced_at: u8,

    /// Percentage at or above which Intermediate is recommended
    pub intermediate_at: u8,

    /// Pause between the final correct answer and the completion screen
    pub completion_delay_ms: u64,

    /// Column width for wrapped output
    pub wrap_width: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: ClaudeModel::Haiku45,
            default_difficulty: DifficultyTier::Intermediate,
            weakness_threshold: SkillPrioritizer::WEAKNESS_THRESHOLD,
            advanced_at: DifficultyRecommender::ADVANCED_AT,
            intermediate_at: DifficultyRecommender::INTERMEDIATE_AT,
            completion_delay_ms: 800,
            wrap_width: 80,
        }
    }
}

impl Config {
    /// Load configuration from the default location, creating it if missing
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from `path`, writing defaults there if missing
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {:?}", path))?;
            let config: Self = serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse {:?}", path))?;
            config.validate()?;
            Ok(config)
        } else {
            let config = Self::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    /// Save configuration to `path`
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory {:?}", parent))?;
        }

        let contents =
            serde_json::to_string_pretty(self).with_context(|| "Failed to serialize config")?;

        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write config to {:?}", path))?;

        Ok(())
    }

    /// Get the path to the config file
    pub fn config_path() -> Result<PathBuf> {
        let proj_dirs =
            ProjectDirs::from("", "", "lector").context("Failed to determine config directory")?;
        Ok(proj_dirs.config_dir().join("config.json"))
    }

    /// Reject thresholds the recommender and prioritizer cannot use
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.weakness_threshold) {
            anyhow::bail!("weakness_threshold must be between 0 and 1");
        }
        if self.advanced_at > 100 || self.intermediate_at > self.advanced_at {
            anyhow::bail!("expected intermediate_at <= advanced_at <= 100");
        }
        Ok(())
    }

    pub fn prioritizer(&self) -> SkillPrioritizer {
        SkillPrioritizer::new(self.weakness_threshold)
    }

    pub fn recommender(&self) -> DifficultyRecommender {
        DifficultyRecommender { advanced_at: self.advanced_at, intermediate_at: self.intermediate_at }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn default_config_matches_engine_defaults() {
        let config = Config::default();
        assert_eq!(config.model, ClaudeModel::Haiku45);
        assert_eq!(config.default_difficulty, DifficultyTier::Intermediate);
        assert_eq!(config.prioritizer(), SkillPrioritizer::default());
        assert_eq!(config.recommender(), DifficultyRecommender::default());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let json = r#"{"default_difficulty":"advanced","completion_delay_ms":0}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.default_difficulty, DifficultyTier::Advanced);
        assert_eq!(config.completion_delay_ms, 0);
        assert_eq!(config.wrap_width, 80);
    }

    #[test]
    fn missing_file_is_created_with_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config, Config::default());
        assert!(path.exists());
    }

    #[test]
    fn saved_config_loads_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        let config = Config { model: ClaudeModel::Sonnet45, advanced_at: 95, ..Config::default() };

        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn invalid_thresholds_are_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"advanced_at":60,"intermediate_at":70}"#).unwrap();

        assert!(Config::load_from(&path).is_err());
        assert!(Config { weakness_threshold: 1.5, ..Config::default() }.validate().is_err());
    }

    #[test]
    fn malformed_json_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}
