//! Direct model loading using Candle (no external APIs needed)

use super::config::ModelConfig;
use super::errors::{ChatError, ChatResult};
use super::traits::CompletionEngine;
use super::types::GenerationConfig;
use candle_core::quantized::gguf_file;
use candle_core::{DType, Device, Tensor};
use candle_transformers::generation::{LogitsProcessor, Sampling};
use candle_transformers::models::{quantized_gemma3, quantized_llama};
use std::path::Path;
use std::sync::Mutex;
use std::time::Instant;
use tokenizers::Tokenizer;
use tracing::{debug, info};

/// Quantized weights for the architectures the engine can run
enum ModelWeights {
    Llama(quantized_llama::ModelWeights),
    Gemma3(quantized_gemma3::ModelWeights),
}

impl ModelWeights {
    fn forward(&mut self, input: &Tensor, position: usize) -> candle_core::Result<Tensor> {
        match self {
            Self::Llama(model) => model.forward(input, position),
            Self::Gemma3(model) => model.forward(input, position),
        }
    }
}

/// Architecture declared by the GGUF `general.architecture` key
fn model_architecture(content: &gguf_file::Content) -> ChatResult<String> {
    let value = content
        .metadata
        .get("general.architecture")
        .ok_or_else(|| ChatError::config("GGUF metadata has no general.architecture"))?;
    value
        .to_string()
        .cloned()
        .map_err(|e| ChatError::config(format!("Invalid general.architecture: {}", e)))
}

/// Sampler for a generation call; a zero temperature always decodes greedily
fn sampling_for(config: &GenerationConfig) -> Sampling {
    if config.is_greedy() {
        Sampling::ArgMax
    } else {
        Sampling::All { temperature: config.temperature }
    }
}

/// Input constraints checked before any tokenization
fn check_request(prompt: &str, config: &GenerationConfig) -> ChatResult<()> {
    if prompt.is_empty() {
        return Err(ChatError::invalid_request("prompt must not be empty"));
    }
    config.validate()
}

/// Candle-based completion engine that runs entirely in Rust
///
/// The engine is only constructed once weights and tokenizer are both
/// loaded. The weights carry a KV cache and need `&mut` access, so calls
/// from several threads are serialized on the mutex.
pub struct CandleEngine {
    model: Mutex<ModelWeights>,
    tokenizer: Tokenizer,
    device: Device,
    eos_ids: Vec<u32>,
    seed: u64,
    defaults: GenerationConfig,
}

impl CandleEngine {
    /// Load model and tokenizer described by `config`
    pub fn load(config: &ModelConfig) -> ChatResult<Self> {
        // Use CPU device for maximum compatibility
        let device = Device::Cpu;

        let started = Instant::now();
        let model = Self::load_model_weights(&config.weights, &device)?;

        let tokenizer = Self::load_tokenizer(&config.tokenizer)?;

        let eos_ids: Vec<u32> =
            config.eos_tokens.iter().filter_map(|t| tokenizer.token_to_id(t)).collect();
        if eos_ids.is_empty() {
            return Err(ChatError::config(format!(
                "None of the end-of-sequence tokens {:?} exist in the tokenizer",
                config.eos_tokens
            )));
        }

        let defaults = config.default_generation();
        defaults.validate().map_err(|e| ChatError::config(e.to_string()))?;

        info!(
            "Loaded model {} in {:.1}s",
            config.weights.display(),
            started.elapsed().as_secs_f32()
        );

        Ok(Self { model: Mutex::new(model), tokenizer, device, eos_ids, seed: config.seed, defaults })
    }

    /// Load model weights from GGUF file
    fn load_model_weights(path: &Path, device: &Device) -> ChatResult<ModelWeights> {
        let mut file = std::fs::File::open(path).map_err(|e| {
            ChatError::config(format!("Failed to open model {}: {}", path.display(), e))
        })?;
        let content = gguf_file::Content::read(&mut file).map_err(|e| {
            ChatError::config(format!("Failed to read GGUF header {}: {}", path.display(), e))
        })?;
        let architecture = model_architecture(&content)?;
        debug!(
            "GGUF {} holds {} tensors for architecture {}",
            path.display(),
            content.tensor_infos.len(),
            architecture
        );

        let weights = match architecture.as_str() {
            "llama" => quantized_llama::ModelWeights::from_gguf(content, &mut file, device).map(ModelWeights::Llama),
            "gemma3" => {
                quantized_gemma3::ModelWeights::from_gguf(content, &mut file, device).map(ModelWeights::Gemma3)
            }
            other => {
                return Err(ChatError::config(format!(
                    "Unsupported model architecture '{}' in {}, expected llama or gemma3",
                    other,
                    path.display()
                )));
            }
        };
        weights.map_err(|e| ChatError::config(format!("Failed to load weights {}: {}", path.display(), e)))
    }

    fn load_tokenizer(path: &Path) -> ChatResult<Tokenizer> {
        Tokenizer::from_file(path).map_err(|e| {
            ChatError::config(format!("Failed to load tokenizer {}: {}", path.display(), e))
        })
    }

    fn logits_processor(&self, config: &GenerationConfig) -> LogitsProcessor {
        LogitsProcessor::from_sampling(self.seed, sampling_for(config))
    }

    /// Run the decoding loop and return the newly generated token ids
    fn decode_loop(&self, prompt_ids: &[u32], config: &GenerationConfig) -> ChatResult<Vec<u32>> {
        let mut model =
            self.model.lock().map_err(|_| ChatError::generation("Model lock poisoned"))?;
        let mut sampler = self.logits_processor(config);
        let mut generated: Vec<u32> = Vec::with_capacity(config.max_new_tokens);

        let mut input = Tensor::new(prompt_ids, &self.device)?.unsqueeze(0)?;
        let mut position = 0;

        for _ in 0..config.max_new_tokens {
            let step_len = input.dim(1)?;
            let logits = model.forward(&input, position)?;
            let logits = logits.squeeze(0)?.to_dtype(DType::F32)?;
            let next = sampler.sample(&logits)?;
            position += step_len;

            if self.eos_ids.contains(&next) {
                break;
            }
            generated.push(next);
            input = Tensor::new(&[next], &self.device)?.unsqueeze(0)?;
        }

        Ok(generated)
    }
}

impl CompletionEngine for CandleEngine {
    fn name(&self) -> &str {
        "candle-gguf"
    }

    fn default_config(&self) -> GenerationConfig {
        self.defaults
    }

    fn generate(&self, prompt: &str, config: &GenerationConfig) -> ChatResult<String> {
        check_request(prompt, config)?;

        let encoding = self
            .tokenizer
            .encode(prompt, true)
            .map_err(|e| ChatError::generation(format!("Tokenization failed: {}", e)))?;
        let prompt_ids = encoding.get_ids();
        if prompt_ids.is_empty() {
            return Err(ChatError::invalid_request("prompt produced no tokens"));
        }

        let started = Instant::now();
        let generated = self.decode_loop(prompt_ids, config)?;
        debug!(
            "Generated {} tokens from a {}-token prompt in {:?} (greedy: {})",
            generated.len(),
            prompt_ids.len(),
            started.elapsed(),
            config.is_greedy()
        );

        let text = self
            .tokenizer
            .decode(&generated, true)
            .map_err(|e| ChatError::generation(format!("Detokenization failed: {}", e)))?;

        Ok(text.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::quantized::gguf_file::Value;
    use std::path::PathBuf;

    fn write_header(path: &Path, architecture: Option<&str>) {
        let mut file = std::fs::File::create(path).unwrap();
        let arch = architecture.map(|a| Value::String(a.to_string()));
        let name = Value::String("tiny".to_string());
        let mut metadata = vec![("general.name", &name)];
        if let Some(arch) = &arch {
            metadata.push(("general.architecture", arch));
        }
        gguf_file::write(&mut file, &metadata, &[]).unwrap();
    }

    #[test]
    fn test_missing_weights_is_configuration_error() {
        let config = ModelConfig {
            weights: PathBuf::from("/nonexistent/model.gguf"),
            tokenizer: PathBuf::from("/nonexistent/tokenizer.json"),
            ..ModelConfig::default()
        };

        let result = CandleEngine::load(&config);
        assert!(matches!(result, Err(ChatError::Configuration { .. })));
    }

    #[test]
    fn test_garbage_weights_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let weights = dir.path().join("model.gguf");
        std::fs::write(&weights, b"not a gguf file").unwrap();

        let config = ModelConfig { weights, ..ModelConfig::default() };
        let err = CandleEngine::load(&config).err().unwrap();
        assert!(err.to_string().contains("GGUF"));
    }

    #[test]
    fn test_unsupported_architecture_is_named() {
        let dir = tempfile::tempdir().unwrap();
        let weights = dir.path().join("gemma-2b.gguf");
        write_header(&weights, Some("gemma"));

        let config = ModelConfig { weights, ..ModelConfig::default() };
        let err = CandleEngine::load(&config).err().unwrap();
        assert!(matches!(err, ChatError::Configuration { .. }));
        assert!(err.to_string().contains("Unsupported model architecture 'gemma'"), "{}", err);
    }

    #[test]
    fn test_missing_architecture_key() {
        let dir = tempfile::tempdir().unwrap();
        let weights = dir.path().join("anonymous.gguf");
        write_header(&weights, None);

        let config = ModelConfig { weights, ..ModelConfig::default() };
        let err = CandleEngine::load(&config).err().unwrap();
        assert!(err.to_string().contains("general.architecture"), "{}", err);
    }

    #[test]
    fn test_sampling_choice() {
        assert!(matches!(sampling_for(&GenerationConfig::guard()), Sampling::ArgMax));

        let zero_temperature = GenerationConfig::new(10, 0.0).with_sampling(true);
        assert!(matches!(sampling_for(&zero_temperature), Sampling::ArgMax));

        let sampled = GenerationConfig::new(10, 0.7);
        assert!(matches!(sampling_for(&sampled), Sampling::All { temperature } if temperature == 0.7));

        let forced_greedy = GenerationConfig::new(10, 0.7).with_sampling(false);
        assert!(matches!(sampling_for(&forced_greedy), Sampling::ArgMax));
    }

    #[test]
    fn test_request_checks() {
        let config = GenerationConfig::default();
        assert!(check_request("What is soil erosion?", &config).is_ok());
        assert!(matches!(check_request("", &config), Err(ChatError::InvalidRequest { .. })));

        let no_budget = GenerationConfig::new(0, 0.2);
        assert!(matches!(check_request("q", &no_budget), Err(ChatError::InvalidRequest { .. })));

        let negative = GenerationConfig::new(10, -1.0);
        assert!(matches!(check_request("q", &negative), Err(ChatError::InvalidRequest { .. })));
    }
}
