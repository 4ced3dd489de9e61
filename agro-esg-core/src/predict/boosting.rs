//! Gradient-boosted regression trees with squared-error loss

use super::config::BoostingConfig;
use super::dataset::SectorEncoder;
use super::record::FarmRecord;
use super::tree::DecisionTree;
use super::{PredictError, PredictResult, Regressor};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientBoostedTrees {
    encoder: SectorEncoder,
    base: f64,
    learning_rate: f64,
    trees: Vec<DecisionTree>,
}

impl GradientBoostedTrees {
    pub fn train(records: &[FarmRecord], config: &BoostingConfig) -> PredictResult<Self> {
        if records.is_empty() {
            return Err(PredictError::dataset("cannot train on an empty dataset"));
        }
        if !(config.learning_rate > 0.0 && config.learning_rate <= 1.0) {
            return Err(PredictError::dataset(format!(
                "learning rate must be in (0, 1], got {}",
                config.learning_rate
            )));
        }

        let encoder = SectorEncoder::fit(records);
        let rows = records.iter().map(|r| encoder.label_features(r)).collect::<PredictResult<Vec<_>>>()?;
        let targets: Vec<f64> = records.iter().map(|r| r.sustainability_index).collect();

        let base = targets.iter().sum::<f64>() / targets.len() as f64;
        let mut current = vec![base; targets.len()];
        let mut trees = Vec::with_capacity(config.rounds);

        for round in 0..config.rounds {
            let residuals: Vec<f64> = targets.iter().zip(&current).map(|(t, c)| t - c).collect();
            let tree = DecisionTree::fit(&rows, &residuals, Some(config.max_depth), 2);
            for (c, row) in current.iter_mut().zip(&rows) {
                *c += config.learning_rate * tree.predict_row(row);
            }
            trees.push(tree);

            if round % 10 == 0 {
                let loss = residuals.iter().map(|r| r * r).sum::<f64>() / residuals.len() as f64;
                trace!("Boosting round {}: training mse {:.6}", round, loss);
            }
        }

        debug!("Gradient boosting trained with {} trees", trees.len());
        Ok(Self { encoder, base, learning_rate: config.learning_rate, trees })
    }

    pub fn rounds(&self) -> usize {
        self.trees.len()
    }
}

impl Regressor for GradientBoostedTrees {
    fn name(&self) -> &str {
        "gradient_boosting"
    }

    fn predict(&self, record: &FarmRecord) -> PredictResult<f64> {
        record.validate()?;
        let row = self.encoder.label_features(record)?;
        Ok(self.base + self.trees.iter().map(|t| self.learning_rate * t.predict_row(&row)).sum::<f64>())
    }
}
