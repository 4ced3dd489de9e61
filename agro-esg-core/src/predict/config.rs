//! Dataset and training settings

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// CSV file read for training and appended to by the record store
    pub path: PathBuf,
    pub test_fraction: f64,
    pub seed: u64,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self { path: PathBuf::from("data/datasetEsgTRAIN.csv"), test_fraction: 0.2, seed: 42 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// None grows until leaves are pure or too small to split
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self { max_depth: None, min_samples_split: 2 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoostingConfig {
    pub rounds: usize,
    pub max_depth: usize,
    pub learning_rate: f64,
}

impl Default for BoostingConfig {
    fn default() -> Self {
        Self { rounds: 100, max_depth: 6, learning_rate: 0.1 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MlpConfig {
    pub hidden_layers: Vec<usize>,
    pub epochs: usize,
    pub learning_rate: f64,
    pub batch_size: usize,
    pub seed: u64,
}

impl Default for MlpConfig {
    fn default() -> Self {
        Self { hidden_layers: vec![64, 64], epochs: 200, learning_rate: 1e-3, batch_size: 200, seed: 42 }
    }
}

/// Hyperparameters for the three predictors
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub tree: TreeConfig,
    pub boosting: BoostingConfig,
    pub mlp: MlpConfig,
}
