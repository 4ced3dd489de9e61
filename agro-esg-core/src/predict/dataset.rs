//! Dataset loading, splitting and feature preparation

use super::record::{FarmRecord, NUMERIC_FEATURES};
use super::{PredictError, PredictResult};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// In-memory set of validated records
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<FarmRecord>,
}

/// Train/test partition of a dataset
#[derive(Debug, Clone)]
pub struct Split {
    pub train: Vec<FarmRecord>,
    pub test: Vec<FarmRecord>,
}

impl Dataset {
    pub fn from_records(records: Vec<FarmRecord>) -> PredictResult<Self> {
        for (row, record) in records.iter().enumerate() {
            record.validate().map_err(|e| PredictError::dataset(format!("row {}: {}", row + 1, e)))?;
        }
        Ok(Self { records })
    }

    /// Read a CSV file with the standard header
    pub fn from_csv(path: &Path) -> PredictResult<Self> {
        let mut reader = csv::Reader::from_path(path)?;
        let records = reader.deserialize().collect::<Result<Vec<FarmRecord>, _>>()?;
        debug!("Read {} records from {}", records.len(), path.display());
        Self::from_records(records)
    }

    pub fn records(&self) -> &[FarmRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Seeded shuffle split; the test part gets `ceil(len * test_fraction)` rows
    pub fn split(&self, test_fraction: f64, seed: u64) -> PredictResult<Split> {
        if !(0.0..1.0).contains(&test_fraction) || test_fraction == 0.0 {
            return Err(PredictError::dataset(format!(
                "test fraction must be in (0, 1), got {}",
                test_fraction
            )));
        }
        if self.records.len() < 2 {
            return Err(PredictError::dataset("need at least two records to split"));
        }

        let mut indices: Vec<usize> = (0..self.records.len()).collect();
        let mut rng = StdRng::seed_from_u64(seed);
        indices.shuffle(&mut rng);

        let test_len =
            ((self.records.len() as f64 * test_fraction).ceil() as usize).clamp(1, self.records.len() - 1);
        let (test_idx, train_idx) = indices.split_at(test_len);

        Ok(Split {
            train: train_idx.iter().map(|&i| self.records[i].clone()).collect(),
            test: test_idx.iter().map(|&i| self.records[i].clone()).collect(),
        })
    }
}

/// Maps sector names to integer codes, classes sorted alphabetically
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorEncoder {
    classes: Vec<String>,
}

impl SectorEncoder {
    pub fn fit(records: &[FarmRecord]) -> Self {
        let mut classes: Vec<String> = records.iter().map(|r| r.sector.clone()).collect();
        classes.sort();
        classes.dedup();
        Self { classes }
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Integer code of a known sector
    pub fn encode(&self, sector: &str) -> PredictResult<usize> {
        self.classes
            .binary_search_by(|c| c.as_str().cmp(sector))
            .map_err(|_| PredictError::UnknownSector { sector: sector.to_string() })
    }

    /// One-hot vector; an unknown sector yields all zeros
    pub fn one_hot(&self, sector: &str) -> Vec<f64> {
        let mut out = vec![0.0; self.classes.len()];
        if let Ok(code) = self.encode(sector) {
            out[code] = 1.0;
        }
        out
    }

    /// Label-encoded sector followed by the numeric features
    pub fn label_features(&self, record: &FarmRecord) -> PredictResult<Vec<f64>> {
        let mut row = Vec::with_capacity(NUMERIC_FEATURES + 1);
        row.push(self.encode(&record.sector)? as f64);
        row.extend_from_slice(&record.numeric_features());
        Ok(row)
    }
}

/// Per-column standardization to zero mean and unit variance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    means: Vec<f64>,
    scales: Vec<f64>,
}

impl StandardScaler {
    pub fn fit(rows: &[Vec<f64>]) -> Self {
        let width = rows.first().map_or(0, Vec::len);
        let n = rows.len().max(1) as f64;

        let mut means = vec![0.0; width];
        for row in rows {
            for (m, v) in means.iter_mut().zip(row) {
                *m += v / n;
            }
        }

        let mut scales = vec![0.0; width];
        for row in rows {
            for ((s, v), m) in scales.iter_mut().zip(row).zip(&means) {
                *s += (v - m).powi(2) / n;
            }
        }
        for s in &mut scales {
            // constant columns pass through unscaled
            *s = if *s > 0.0 { s.sqrt() } else { 1.0 };
        }

        Self { means, scales }
    }

    pub fn transform(&self, row: &[f64]) -> Vec<f64> {
        row.iter().zip(&self.means).zip(&self.scales).map(|((v, m), s)| (v - m) / s).collect()
    }
}

/// Held-out error measures
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionMetrics {
    pub mae: f64,
    pub mse: f64,
    pub r2: f64,
}

impl RegressionMetrics {
    pub fn evaluate(predictions: &[f64], targets: &[f64]) -> Self {
        let n = targets.len().max(1) as f64;
        let mean = targets.iter().sum::<f64>() / n;

        let mut abs = 0.0;
        let mut sq = 0.0;
        let mut total = 0.0;
        for (p, t) in predictions.iter().zip(targets) {
            abs += (p - t).abs();
            sq += (p - t).powi(2);
            total += (t - mean).powi(2);
        }

        let r2 = if total > 0.0 {
            1.0 - sq / total
        } else if sq == 0.0 {
            1.0
        } else {
            0.0
        };

        Self { mae: abs / n, mse: sq / n, r2 }
    }
}
