//! Core functionality for agro-esg
//!
//! This crate contains the guard-and-answer chat pipeline that backs the
//! agricultural ESG assistant, the conversation layer that runs it off the UI
//! thread, and the sustainability-index predictors.

pub mod chat;
pub mod llm;
pub mod predict;

use llm::{ChatError, ChatResult, ModelConfig, PromptsConfig};
use predict::{DatasetConfig, TrainingConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Configuration structure for agro-esg
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Verbosity level
    pub verbosity: String,

    /// Local model files and generation defaults
    pub model: ModelConfig,

    /// Prompt catalog location
    pub prompts: PromptsConfig,

    /// Farm dataset used by the predictors
    pub dataset: DatasetConfig,

    pub training: TrainingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            verbosity: "info".to_string(),
            model: ModelConfig::default(),
            prompts: PromptsConfig::default(),
            dataset: DatasetConfig::default(),
            training: TrainingConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load from a TOML file; sections left out keep their defaults
    pub fn from_file(path: &Path) -> ChatResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ChatError::config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        let config: Self = toml::from_str(&content)?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load `path` when given and present, defaults otherwise
    pub fn load_or_default(path: Option<&Path>) -> ChatResult<Self> {
        match path {
            Some(path) if path.exists() => Self::from_file(path),
            Some(path) => {
                debug!("Config file {} not found, using defaults", path.display());
                Ok(Self::default())
            }
            None => Ok(Self::default()),
        }
    }

    pub fn save(&self, path: &Path) -> ChatResult<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ChatError::config(format!("Failed to serialize config: {}", e)))?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_default() {
        let config = AppConfig::default();
        assert_eq!(config.verbosity, "info");
        assert_eq!(config.model.max_new_tokens, 500);
        assert_eq!(config.dataset.test_fraction, 0.2);
    }

    #[test]
    fn test_config_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("agro-esg.toml");

        let mut config = AppConfig::default();
        config.model.temperature = 0.7;
        config.training.boosting.rounds = 25;
        config.save(&path).unwrap();

        assert_eq!(AppConfig::from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_config_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("agro-esg.toml");
        std::fs::write(&path, "[model]\nseed = 7\n\n[dataset]\npath = \"farms.csv\"\n").unwrap();

        let config = AppConfig::from_file(&path).unwrap();
        assert_eq!(config.model.seed, 7);
        assert_eq!(config.model.max_new_tokens, 500);
        assert_eq!(config.dataset.path, Path::new("farms.csv"));
        assert_eq!(config.prompts, PromptsConfig::default());
    }

    #[test]
    fn test_bad_config_is_configuration_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("agro-esg.toml");
        std::fs::write(&path, "[model\nseed = ").unwrap();
        assert!(matches!(AppConfig::from_file(&path), Err(ChatError::Configuration { .. })));

        let missing = dir.path().join("missing.toml");
        assert!(AppConfig::from_file(&missing).is_err());
        assert_eq!(AppConfig::load_or_default(Some(&missing)).unwrap(), AppConfig::default());
    }
}
