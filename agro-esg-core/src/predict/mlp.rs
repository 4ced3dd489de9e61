//! Multi-layer perceptron regressor
//!
//! ReLU hidden layers and a single linear output built from `candle_nn`
//! linear layers, trained with AdamW over shuffled mini-batches. Inputs are
//! the standardized numeric features followed by the one-hot sector.

use super::config::MlpConfig;
use super::dataset::{SectorEncoder, StandardScaler};
use super::record::FarmRecord;
use super::{PredictError, PredictResult, Regressor};
use candle_core::{DType, Device, Module, Tensor};
use candle_nn::{AdamW, Linear, Optimizer, ParamsAdamW, VarBuilder, VarMap};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::{debug, trace};

const WEIGHT_DECAY: f64 = 1e-4;

#[derive(Debug, Clone)]
pub struct NeuralNetwork {
    encoder: SectorEncoder,
    scaler: StandardScaler,
    layers: Vec<Linear>,
    device: Device,
}

impl NeuralNetwork {
    pub fn train(records: &[FarmRecord], config: &MlpConfig) -> PredictResult<Self> {
        if records.is_empty() {
            return Err(PredictError::dataset("cannot train on an empty dataset"));
        }
        if config.batch_size == 0 || config.learning_rate <= 0.0 {
            return Err(PredictError::dataset("batch size and learning rate must be positive"));
        }

        let device = Device::Cpu;
        let encoder = SectorEncoder::fit(records);
        let numeric: Vec<Vec<f64>> = records.iter().map(|r| r.numeric_features().to_vec()).collect();
        let scaler = StandardScaler::fit(&numeric);

        let width = numeric[0].len() + encoder.classes().len();
        let features: Vec<f32> = records
            .iter()
            .flat_map(|record| encode(&scaler, &encoder, record))
            .collect();
        let inputs = Tensor::from_vec(features, (records.len(), width), &device)?;
        let targets: Vec<f32> = records.iter().map(|r| r.sustainability_index as f32).collect();
        let targets = Tensor::from_vec(targets, (records.len(), 1), &device)?;

        let mut rng = StdRng::seed_from_u64(config.seed);
        let mut varmap = VarMap::new();
        let layers = build_layers(&mut varmap, width, &config.hidden_layers, &device, &mut rng)?;

        let network = Self { encoder, scaler, layers, device };
        network.fit(&varmap, &inputs, &targets, config, &mut rng)?;
        Ok(network)
    }

    fn fit(
        &self,
        varmap: &VarMap,
        inputs: &Tensor,
        targets: &Tensor,
        config: &MlpConfig,
        rng: &mut StdRng,
    ) -> PredictResult<()> {
        let params = ParamsAdamW { lr: config.learning_rate, weight_decay: WEIGHT_DECAY, ..Default::default() };
        let mut optimizer = AdamW::new(varmap.all_vars(), params)?;
        let mut order: Vec<u32> = (0..inputs.dim(0)? as u32).collect();

        for epoch in 0..config.epochs {
            order.shuffle(rng);
            let mut epoch_loss = 0.0;

            for batch in order.chunks(config.batch_size) {
                let index = Tensor::new(batch, &self.device)?;
                let xs = inputs.index_select(&index, 0)?;
                let ys = targets.index_select(&index, 0)?;

                let loss = candle_nn::loss::mse(&self.forward(&xs)?, &ys)?;
                optimizer.backward_step(&loss)?;
                epoch_loss += loss.to_scalar::<f32>()? as f64 * batch.len() as f64;
            }

            if epoch % 20 == 0 {
                trace!("MLP epoch {}: training mse {:.6}", epoch, epoch_loss / order.len() as f64);
            }
        }

        debug!("MLP trained for {} epochs over {} samples", config.epochs, order.len());
        Ok(())
    }

    fn forward(&self, xs: &Tensor) -> candle_core::Result<Tensor> {
        let last = self.layers.len() - 1;
        let mut xs = xs.clone();
        for (idx, layer) in self.layers.iter().enumerate() {
            xs = layer.forward(&xs)?;
            if idx < last {
                xs = xs.relu()?;
            }
        }
        Ok(xs)
    }
}

/// Scaled numeric features followed by the one-hot sector
fn encode(scaler: &StandardScaler, encoder: &SectorEncoder, record: &FarmRecord) -> Vec<f32> {
    let mut x = scaler.transform(&record.numeric_features());
    x.extend(encoder.one_hot(&record.sector));
    x.into_iter().map(|v| v as f32).collect()
}

/// Linear layers registered in `varmap`, weights Glorot-uniform from the seeded rng
fn build_layers(
    varmap: &mut VarMap,
    inputs: usize,
    hidden: &[usize],
    device: &Device,
    rng: &mut StdRng,
) -> PredictResult<Vec<Linear>> {
    let vb = VarBuilder::from_varmap(varmap, DType::F32, device);

    let mut widths = vec![inputs];
    widths.extend(hidden);
    widths.push(1);

    let mut layers = Vec::with_capacity(widths.len() - 1);
    for (idx, pair) in widths.windows(2).enumerate() {
        let (fan_in, fan_out) = (pair[0], pair[1]);
        let name = format!("layer{}", idx);
        let layer = candle_nn::linear(fan_in, fan_out, vb.pp(&name))?;

        // the default initializer draws from candle's unseeded rng
        let bound = (6.0 / (fan_in + fan_out) as f64).sqrt() as f32;
        let weights: Vec<f32> = (0..fan_in * fan_out).map(|_| rng.gen_range(-bound..bound)).collect();
        varmap.set_one(format!("{}.weight", name), Tensor::from_vec(weights, (fan_out, fan_in), device)?)?;
        varmap.set_one(format!("{}.bias", name), Tensor::zeros(fan_out, DType::F32, device)?)?;

        layers.push(layer);
    }
    Ok(layers)
}

impl Regressor for NeuralNetwork {
    fn name(&self) -> &str {
        "mlp"
    }

    fn predict(&self, record: &FarmRecord) -> PredictResult<f64> {
        record.validate()?;
        let x = encode(&self.scaler, &self.encoder, record);
        let width = x.len();
        let input = Tensor::from_vec(x, (1, width), &self.device)?;
        let output = self.forward(&input)?.flatten_all()?.to_vec1::<f32>()?;
        Ok(output[0] as f64)
    }
}
