use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::ChatModel;
use crate::error::DiscoError;

pub const DEFAULT_CONFIG_FILE: &str = "discopath.json";
pub const DEFAULT_WORKERS: usize = 10;
pub const DEFAULT_ORGANISM: &str = "Homo sapiens";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub model: Option<ChatModel>,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub filtering: Option<bool>,
    #[serde(default)]
    pub detailed_annotations: Option<bool>,
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub workers: Option<usize>,
    #[serde(default)]
    pub organism: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchConfig {
    pub model: ChatModel,
    pub temperature: f32,
    pub filtering_enabled: bool,
    pub detailed_annotations_enabled: bool,
    pub relevance_query: String,
    pub workers: usize,
    pub organism: String,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            model: ChatModel::default(),
            temperature: 0.0,
            filtering_enabled: true,
            detailed_annotations_enabled: false,
            relevance_query: String::new(),
            workers: DEFAULT_WORKERS,
            organism: DEFAULT_ORGANISM.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub model: Option<ChatModel>,
    pub temperature: Option<f32>,
    pub filtering: Option<bool>,
    pub detailed_annotations: Option<bool>,
    pub query: Option<String>,
    pub workers: Option<usize>,
    pub organism: Option<String>,
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn load(path: Option<&str>) -> Result<Config, DiscoError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        if path.is_none() && !config_path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| DiscoError::ConfigRead(config_path.clone()))?;
        serde_json::from_str(&content).map_err(|err| DiscoError::ConfigParse(err.to_string()))
    }

    pub fn resolve(
        path: Option<&str>,
        overrides: ConfigOverrides,
    ) -> Result<BatchConfig, DiscoError> {
        let config = Self::load(path)?;
        Self::resolve_config(config, overrides)
    }

    pub fn resolve_config(
        config: Config,
        overrides: ConfigOverrides,
    ) -> Result<BatchConfig, DiscoError> {
        let defaults = BatchConfig::default();
        let resolved = BatchConfig {
            model: overrides.model.or(config.model).unwrap_or(defaults.model),
            temperature: overrides
                .temperature
                .or(config.temperature)
                .unwrap_or(defaults.temperature),
            filtering_enabled: overrides
                .filtering
                .or(config.filtering)
                .unwrap_or(defaults.filtering_enabled),
            detailed_annotations_enabled: overrides
                .detailed_annotations
                .or(config.detailed_annotations)
                .unwrap_or(defaults.detailed_annotations_enabled),
            relevance_query: overrides
                .query
                .or(config.query)
                .map(|query| query.trim().to_string())
                .unwrap_or(defaults.relevance_query),
            workers: overrides
                .workers
                .or(config.workers)
                .unwrap_or(defaults.workers),
            organism: overrides
                .organism
                .or(config.organism)
                .unwrap_or(defaults.organism),
        };
        Self::validate(&resolved)?;
        Ok(resolved)
    }

    pub fn validate(config: &BatchConfig) -> Result<(), DiscoError> {
        if config.workers == 0 {
            return Err(DiscoError::InvalidConfig(
                "workers must be at least 1".to_string(),
            ));
        }
        if !config.temperature.is_finite() || config.temperature < 0.0 {
            return Err(DiscoError::InvalidConfig(format!(
                "temperature must be a non-negative number, got {}",
                config.temperature
            )));
        }
        if config.filtering_enabled && config.relevance_query.trim().is_empty() {
            return Err(DiscoError::InvalidConfig(
                "pathway filtering requires a relevance query".to_string(),
            ));
        }
        if config.organism.trim().is_empty() {
            return Err(DiscoError::InvalidConfig("organism is empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_win_over_file_values() {
        let config = Config {
            model: Some(ChatModel::Gpt4),
            workers: Some(4),
            query: Some("lipid metabolism".to_string()),
            ..Config::default()
        };
        let overrides = ConfigOverrides {
            workers: Some(2),
            ..ConfigOverrides::default()
        };

        let resolved = ConfigLoader::resolve_config(config, overrides).unwrap();
        assert_eq!(resolved.model, ChatModel::Gpt4);
        assert_eq!(resolved.workers, 2);
        assert_eq!(resolved.temperature, 0.0);
        assert!(resolved.filtering_enabled);
    }
}
