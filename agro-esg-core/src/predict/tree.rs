//! CART regression tree

use super::config::TreeConfig;
use super::dataset::SectorEncoder;
use super::record::FarmRecord;
use super::{PredictResult, Regressor};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum Node {
    Leaf(f64),
    Split { feature: usize, threshold: f64, left: Box<Node>, right: Box<Node> },
}

/// Binary tree over dense feature rows, splits chosen by variance reduction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    root: Node,
}

impl DecisionTree {
    /// Fit to `rows` and `targets`; both must be non-empty and equally long
    pub fn fit(rows: &[Vec<f64>], targets: &[f64], max_depth: Option<usize>, min_samples_split: usize) -> Self {
        let indices: Vec<usize> = (0..rows.len()).collect();
        let root = grow(rows, targets, indices, 0, max_depth, min_samples_split.max(2));
        Self { root }
    }

    pub fn predict_row(&self, row: &[f64]) -> f64 {
        let mut node = &self.root;
        loop {
            match node {
                Node::Leaf(value) => return *value,
                Node::Split { feature, threshold, left, right } => {
                    node = if row[*feature] <= *threshold { left } else { right };
                }
            }
        }
    }

    pub fn depth(&self) -> usize {
        fn walk(node: &Node) -> usize {
            match node {
                Node::Leaf(_) => 0,
                Node::Split { left, right, .. } => 1 + walk(left).max(walk(right)),
            }
        }
        walk(&self.root)
    }
}

fn mean(targets: &[f64], indices: &[usize]) -> f64 {
    if indices.is_empty() {
        return 0.0;
    }
    indices.iter().map(|&i| targets[i]).sum::<f64>() / indices.len() as f64
}

fn grow(
    rows: &[Vec<f64>],
    targets: &[f64],
    indices: Vec<usize>,
    depth: usize,
    max_depth: Option<usize>,
    min_samples_split: usize,
) -> Node {
    let value = mean(targets, &indices);
    if indices.len() < min_samples_split || max_depth.is_some_and(|d| depth >= d) {
        return Node::Leaf(value);
    }

    let Some((feature, threshold)) = best_split(rows, targets, &indices) else {
        return Node::Leaf(value);
    };

    let (left, right): (Vec<usize>, Vec<usize>) =
        indices.into_iter().partition(|&i| rows[i][feature] <= threshold);

    Node::Split {
        feature,
        threshold,
        left: Box::new(grow(rows, targets, left, depth + 1, max_depth, min_samples_split)),
        right: Box::new(grow(rows, targets, right, depth + 1, max_depth, min_samples_split)),
    }
}

/// Split minimizing summed squared error of the children, if any improves on the parent
fn best_split(rows: &[Vec<f64>], targets: &[f64], indices: &[usize]) -> Option<(usize, f64)> {
    let n = indices.len() as f64;
    let total_sum: f64 = indices.iter().map(|&i| targets[i]).sum();
    let total_sq: f64 = indices.iter().map(|&i| targets[i] * targets[i]).sum();
    let parent_sse = total_sq - total_sum * total_sum / n;
    if parent_sse <= f64::EPSILON {
        return None;
    }

    let width = rows[indices[0]].len();
    let mut best: Option<(usize, f64, f64)> = None;
    let mut order = indices.to_vec();

    for feature in 0..width {
        order.sort_by(|&a, &b| rows[a][feature].total_cmp(&rows[b][feature]));

        let mut left_sum = 0.0;
        let mut left_sq = 0.0;
        for k in 0..order.len() - 1 {
            let y = targets[order[k]];
            left_sum += y;
            left_sq += y * y;

            let here = rows[order[k]][feature];
            let next = rows[order[k + 1]][feature];
            if here == next {
                continue;
            }

            let left_n = (k + 1) as f64;
            let right_n = n - left_n;
            let right_sum = total_sum - left_sum;
            let right_sq = total_sq - left_sq;
            let sse = (left_sq - left_sum * left_sum / left_n) + (right_sq - right_sum * right_sum / right_n);

            if best.is_none_or(|(_, _, b)| sse < b) {
                best = Some((feature, (here + next) / 2.0, sse));
            }
        }
    }

    best.filter(|(_, _, sse)| *sse < parent_sse).map(|(f, t, _)| (f, t))
}

/// Decision-tree predictor over the label-encoded sector and the numeric features
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionTree {
    encoder: SectorEncoder,
    tree: DecisionTree,
}

impl RegressionTree {
    pub fn train(records: &[FarmRecord], config: &TreeConfig) -> PredictResult<Self> {
        let encoder = SectorEncoder::fit(records);
        let rows = records.iter().map(|r| encoder.label_features(r)).collect::<PredictResult<Vec<_>>>()?;
        let targets: Vec<f64> = records.iter().map(|r| r.sustainability_index).collect();

        let tree = DecisionTree::fit(&rows, &targets, config.max_depth, config.min_samples_split);
        debug!("Regression tree trained, depth {}", tree.depth());
        Ok(Self { encoder, tree })
    }
}

impl Regressor for RegressionTree {
    fn name(&self) -> &str {
        "decision_tree"
    }

    fn predict(&self, record: &FarmRecord) -> PredictResult<f64> {
        record.validate()?;
        let row = self.encoder.label_features(record)?;
        Ok(self.tree.predict_row(&row))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predict::PredictError;

    #[test]
    fn test_fits_step_function() {
        let rows: Vec<Vec<f64>> = (0..10).map(|i| vec![i as f64]).collect();
        let targets: Vec<f64> = (0..10).map(|i| if i < 5 { 1.0 } else { 3.0 }).collect();

        let tree = DecisionTree::fit(&rows, &targets, None, 2);
        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.predict_row(&[2.0]), 1.0);
        assert_eq!(tree.predict_row(&[5.0]), 3.0);
        assert_eq!(tree.predict_row(&[8.0]), 3.0);
    }

    #[test]
    fn test_respects_max_depth() {
        let rows: Vec<Vec<f64>> = (0..32).map(|i| vec![i as f64]).collect();
        let targets: Vec<f64> = (0..32).map(|i| (i * i) as f64).collect();

        let shallow = DecisionTree::fit(&rows, &targets, Some(2), 2);
        assert!(shallow.depth() <= 2);

        let full = DecisionTree::fit(&rows, &targets, None, 2);
        assert!(full.depth() > 2);
        assert_eq!(full.predict_row(&[7.0]), 49.0);
    }

    #[test]
    fn test_constant_target_is_leaf() {
        let rows = vec![vec![1.0], vec![2.0], vec![3.0]];
        let tree = DecisionTree::fit(&rows, &[0.5, 0.5, 0.5], None, 2);
        assert_eq!(tree.depth(), 0);
        assert_eq!(tree.predict_row(&[100.0]), 0.5);
    }

    #[test]
    fn test_regression_tree_uses_sector() {
        let records: Vec<FarmRecord> = (0..8)
            .map(|i| {
                let soy = i % 2 == 0;
                FarmRecord {
                    sector: if soy { "SOJA" } else { "TRIGO" }.to_string(),
                    sustainability_index: if soy { 0.8 } else { 0.3 },
                    ..FarmRecord::sample()
                }
            })
            .collect();

        let model = RegressionTree::train(&records, &TreeConfig::default()).unwrap();
        let soy = FarmRecord { sector: "SOJA".to_string(), ..FarmRecord::sample() };
        assert!((model.predict(&soy).unwrap() - 0.8).abs() < 1e-9);
        assert!((model.predict(&FarmRecord::sample()).unwrap() - 0.3).abs() < 1e-9);

        let unknown = FarmRecord { sector: "CAFE".to_string(), ..FarmRecord::sample() };
        assert!(matches!(model.predict(&unknown), Err(PredictError::UnknownSector { .. })));
    }
}
