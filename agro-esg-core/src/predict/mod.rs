//! Sustainability-index predictors
//!
//! Three independent regressors trained on the farm dataset, plus the CSV
//! store new records are appended to. The chat pipeline does not use them.

pub mod boosting;
pub mod config;
pub mod dataset;
pub mod mlp;
pub mod record;
pub mod store;
pub mod tree;

pub use boosting::GradientBoostedTrees;
pub use config::{BoostingConfig, DatasetConfig, MlpConfig, TrainingConfig, TreeConfig};
pub use dataset::{Dataset, RegressionMetrics, SectorEncoder, Split, StandardScaler};
pub use mlp::NeuralNetwork;
pub use record::{CSV_COLUMNS, FarmRecord, NUMERIC_FEATURES};
pub use store::{RecordStore, SaveChoice};
pub use tree::{DecisionTree, RegressionTree};

use serde::{Deserialize, Serialize};
use std::time::Instant;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum PredictError {
    #[error("Dataset error: {message}")]
    Dataset { message: String },

    #[error("Unknown sector '{sector}'")]
    UnknownSector { sector: String },

    #[error("Invalid record: {message}")]
    InvalidRecord { message: String },

    #[error("Model error: {0}")]
    Model(#[from] candle_core::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PredictError {
    pub fn dataset(message: impl Into<String>) -> Self {
        Self::Dataset { message: message.into() }
    }

    pub fn invalid_record(message: impl Into<String>) -> Self {
        Self::InvalidRecord { message: message.into() }
    }
}

pub type PredictResult<T> = Result<T, PredictError>;

/// A trained model mapping a farm record to a sustainability index
pub trait Regressor: Send + Sync {
    fn name(&self) -> &str;

    fn predict(&self, record: &FarmRecord) -> PredictResult<f64>;
}

/// One index per model for the same record
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Predictions {
    pub tree: f64,
    pub mlp: f64,
    pub boosting: f64,
}

/// Held-out metrics for each model after training
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    pub train_size: usize,
    pub test_size: usize,
    pub models: Vec<(String, RegressionMetrics)>,
}

/// The three trained predictors
pub struct Predictors {
    pub tree: RegressionTree,
    pub mlp: NeuralNetwork,
    pub boosting: GradientBoostedTrees,
}

impl Predictors {
    /// Split `dataset`, train every model on the train part and score it on the rest
    pub fn train(
        dataset: &Dataset,
        split_config: &DatasetConfig,
        training: &TrainingConfig,
    ) -> PredictResult<(Self, TrainingReport)> {
        let split = dataset.split(split_config.test_fraction, split_config.seed)?;
        info!("Training on {} records, testing on {}", split.train.len(), split.test.len());

        let started = Instant::now();
        let predictors = Self {
            tree: RegressionTree::train(&split.train, &training.tree)?,
            mlp: NeuralNetwork::train(&split.train, &training.mlp)?,
            boosting: GradientBoostedTrees::train(&split.train, &training.boosting)?,
        };
        info!("Trained predictors in {:?}", started.elapsed());

        let mut models = Vec::new();
        for model in predictors.regressors() {
            models.push((model.name().to_string(), score(model, &split.test)?));
        }

        let report = TrainingReport { train_size: split.train.len(), test_size: split.test.len(), models };
        Ok((predictors, report))
    }

    pub fn regressors(&self) -> [&dyn Regressor; 3] {
        [&self.tree, &self.mlp, &self.boosting]
    }

    pub fn predict_all(&self, record: &FarmRecord) -> PredictResult<Predictions> {
        Ok(Predictions {
            tree: self.tree.predict(record)?,
            mlp: self.mlp.predict(record)?,
            boosting: self.boosting.predict(record)?,
        })
    }
}

/// Metrics of `model` over `records`; a sector unseen in training scores as a miss
fn score(model: &dyn Regressor, records: &[FarmRecord]) -> PredictResult<RegressionMetrics> {
    let mut predictions = Vec::with_capacity(records.len());
    let mut targets = Vec::with_capacity(records.len());
    for record in records {
        match model.predict(record) {
            Ok(value) => predictions.push(value),
            Err(PredictError::UnknownSector { .. }) => predictions.push(0.0),
            Err(e) => return Err(e),
        }
        targets.push(record.sustainability_index);
    }
    Ok(RegressionMetrics::evaluate(&predictions, &targets))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset() -> Dataset {
        let sectors = ["SOJA", "TRIGO", "MILHO"];
        let records = (0..60)
            .map(|i| {
                let energy = (i % 20) as f64 * 5.0;
                FarmRecord {
                    id: i as f64,
                    sector: sectors[i % 3].to_string(),
                    renewable_energy: energy,
                    sustainability_index: 0.2 + energy / 200.0,
                    ..FarmRecord::sample()
                }
            })
            .collect();
        Dataset::from_records(records).unwrap()
    }

    fn fast_training() -> TrainingConfig {
        TrainingConfig {
            tree: TreeConfig::default(),
            boosting: BoostingConfig { rounds: 30, max_depth: 4, learning_rate: 0.3 },
            mlp: MlpConfig { hidden_layers: vec![8], epochs: 100, learning_rate: 1e-2, batch_size: 16, seed: 1 },
        }
    }

    #[test]
    fn test_train_reports_every_model() {
        let (predictors, report) =
            Predictors::train(&dataset(), &DatasetConfig::default(), &fast_training()).unwrap();

        assert_eq!(report.test_size, 12);
        assert_eq!(report.train_size, 48);
        let names: Vec<&str> = report.models.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["decision_tree", "mlp", "gradient_boosting"]);
        assert!(report.models[0].1.r2 > 0.9);

        let record = FarmRecord { renewable_energy: 50.0, ..FarmRecord::sample() };
        let predictions = predictors.predict_all(&record).unwrap();
        assert!((predictions.tree - 0.45).abs() < 0.05);
        assert!((predictions.boosting - 0.45).abs() < 0.05);
        assert!(predictions.mlp.is_finite());
    }

    #[test]
    fn test_predict_all_rejects_invalid_record() {
        let (predictors, _) = Predictors::train(&dataset(), &DatasetConfig::default(), &fast_training()).unwrap();
        let record = FarmRecord { water_use: f64::NAN, ..FarmRecord::sample() };
        assert!(matches!(predictors.predict_all(&record), Err(PredictError::InvalidRecord { .. })));
    }

    #[test]
    fn test_error_display() {
        let err = PredictError::UnknownSector { sector: "CAFE".to_string() };
        assert_eq!(err.to_string(), "Unknown sector 'CAFE'");
        assert_eq!(PredictError::dataset("empty").to_string(), "Dataset error: empty");

        let err: PredictError = candle_core::Error::Msg("shape mismatch".to_string()).into();
        assert!(matches!(err, PredictError::Model(_)));
        assert!(err.to_string().starts_with("Model error:"));
    }
}
