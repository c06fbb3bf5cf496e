//! Dataset configuration management.
//!
//! A single serializable struct describes where the grid tensor lives, how it
//! is normalized and which windowing representation to build, so experiments
//! can be reproduced from a checked-in file.
//!
//! # Example TOML
//!
//! ```toml
//! path = "data/bike_nyc.npy"
//! lead_time = 48
//! normalize = true
//!
//! [representation]
//! mode = "periodical"
//! len_closeness = 3
//! len_period = 4
//! len_trend = 4
//! t_closeness = 1
//! t_period = 24
//! t_trend = 168
//! skip_policy = "prioritized"
//! ```
//!
//! # Example
//!
//! ```ignore
//! use grid_window_dataset::config::DatasetConfig;
//!
//! let config = DatasetConfig::load_toml("experiments/bike_periodical.toml")?;
//! let dataset = config.build()?;
//! ```

use crate::dataset::{GridDataset, DEFAULT_LEAD_TIME};
use crate::error::{DatasetError, Result};
use crate::sequence_builder::{PeriodicalConfig, SequenceConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Which windowing representation to build after loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RepresentationConfig {
    /// Frame `i` paired with frame `i + lead_time`
    #[default]
    LeadTime,

    /// History/prediction blocks
    Sequential(SequenceConfig),

    /// Closeness/period/trend features
    Periodical(PeriodicalConfig),
}

impl RepresentationConfig {
    /// Validate the representation parameters.
    pub fn validate(&self) -> std::result::Result<(), String> {
        match self {
            RepresentationConfig::LeadTime => Ok(()),
            RepresentationConfig::Sequential(config) => config.validate(),
            RepresentationConfig::Periodical(config) => config.validate(),
        }
    }
}

/// Complete dataset configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// `.npy` file holding the `T × C × H × W` tensor
    pub path: PathBuf,

    /// Offset between input and target in lead-time mode
    #[serde(default = "default_lead_time")]
    pub lead_time: usize,

    /// Map values to `[-1, 1]` with the global min-max range
    #[serde(default = "default_normalize")]
    pub normalize: bool,

    /// Representation built after loading
    #[serde(default)]
    pub representation: RepresentationConfig,
}

fn default_lead_time() -> usize {
    DEFAULT_LEAD_TIME
}

fn default_normalize() -> bool {
    true
}

impl DatasetConfig {
    /// Create a configuration with default lead time, normalization on, and
    /// the lead-time representation.
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            lead_time: DEFAULT_LEAD_TIME,
            normalize: true,
            representation: RepresentationConfig::default(),
        }
    }

    /// Set the lead time.
    pub fn with_lead_time(mut self, lead_time: usize) -> Self {
        self.lead_time = lead_time;
        self
    }

    /// Enable or disable normalization.
    pub fn with_normalize(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }

    /// Set the representation.
    pub fn with_representation(mut self, representation: RepresentationConfig) -> Self {
        self.representation = representation;
        self
    }

    /// Validate configuration.
    ///
    /// Returns Ok(()) if valid, Err(msg) otherwise.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.path.as_os_str().is_empty() {
            return Err("path must not be empty".to_string());
        }

        self.representation.validate()
    }

    /// Load the tensor and build the configured representation.
    pub fn build(&self) -> Result<GridDataset> {
        GridDataset::from_config(self)
    }

    /// Load configuration from TOML file.
    pub fn load_toml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: DatasetConfig =
            toml::from_str(&contents).map_err(|e| DatasetError::Serialization(e.to_string()))?;
        config.validate().map_err(DatasetError::Configuration)?;
        Ok(config)
    }

    /// Save configuration to TOML file.
    pub fn save_toml<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_string =
            toml::to_string_pretty(self).map_err(|e| DatasetError::Serialization(e.to_string()))?;
        fs::write(path, toml_string)?;
        Ok(())
    }

    /// Load configuration from JSON file.
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: DatasetConfig = serde_json::from_str(&contents)
            .map_err(|e| DatasetError::Serialization(e.to_string()))?;
        config.validate().map_err(DatasetError::Configuration)?;
        Ok(config)
    }

    /// Save configuration to JSON file.
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json_string = serde_json::to_string_pretty(self)
            .map_err(|e| DatasetError::Serialization(e.to_string()))?;
        fs::write(path, json_string)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence_builder::SkipPolicy;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_from_minimal_toml() {
        let config: DatasetConfig = toml::from_str(r#"path = "grid.npy""#).unwrap();

        assert_eq!(config.path, PathBuf::from("grid.npy"));
        assert_eq!(config.lead_time, 48);
        assert!(config.normalize);
        assert_eq!(config.representation, RepresentationConfig::LeadTime);
    }

    #[test]
    fn test_periodical_toml() {
        let toml_str = r#"
            path = "bike.npy"
            normalize = false

            [representation]
            mode = "periodical"
            len_trend = 0
            skip_policy = "strict"
        "#;
        let config: DatasetConfig = toml::from_str(toml_str).unwrap();

        match config.representation {
            RepresentationConfig::Periodical(periodical) => {
                assert_eq!(periodical.len_closeness, 3);
                assert_eq!(periodical.len_period, 4);
                assert_eq!(periodical.len_trend, 0);
                assert_eq!(periodical.t_period, 24);
                assert_eq!(periodical.skip_policy, SkipPolicy::Strict);
            }
            other => panic!("expected periodical, got {:?}", other),
        }
        assert!(!config.normalize);
    }

    #[test]
    fn test_sequential_json() {
        let json = r#"{
            "path": "grid.npy",
            "lead_time": 6,
            "representation": { "mode": "sequential", "history_length": 12, "predict_length": 3 }
        }"#;
        let config: DatasetConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.lead_time, 6);
        assert_eq!(
            config.representation,
            RepresentationConfig::Sequential(SequenceConfig::new(12, 3))
        );
    }

    #[test]
    fn test_validate() {
        assert!(DatasetConfig::new("grid.npy").validate().is_ok());
        assert!(DatasetConfig::new("").validate().is_err());

        let bad_seq = DatasetConfig::new("grid.npy")
            .with_representation(RepresentationConfig::Sequential(SequenceConfig::new(0, 1)));
        assert!(bad_seq.validate().is_err());

        let bad_periodical = DatasetConfig::new("grid.npy").with_representation(
            RepresentationConfig::Periodical(PeriodicalConfig::new(0, 0, 0, 1, 24, 168)),
        );
        assert!(bad_periodical.validate().is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dataset.toml");

        let config = DatasetConfig::new("data/taxi.npy")
            .with_lead_time(12)
            .with_normalize(false)
            .with_representation(RepresentationConfig::Periodical(
                PeriodicalConfig::default().with_skip_policy(SkipPolicy::Strict),
            ));

        config.save_toml(&path).unwrap();
        let loaded = DatasetConfig::load_toml(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_json_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dataset.json");

        let config = DatasetConfig::new("data/taxi.npy")
            .with_representation(RepresentationConfig::Sequential(SequenceConfig::new(4, 2)));

        config.save_json(&path).unwrap();
        assert_eq!(DatasetConfig::load_json(&path).unwrap(), config);
    }

    #[test]
    fn test_load_rejects_invalid() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(
            &path,
            "path = \"x.npy\"\n[representation]\nmode = \"periodical\"\nt_period = 48\n",
        )
        .unwrap();

        let err = DatasetConfig::load_toml(&path).unwrap_err();
        assert!(err.is_configuration());

        fs::write(&path, "path = 3").unwrap();
        assert!(matches!(DatasetConfig::load_toml(&path), Err(DatasetError::Serialization(_))));
    }
}
