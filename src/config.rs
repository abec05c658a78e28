//! Configuration structures for training and generation
//!
//! This module provides the flat hyperparameter surface for a PixelCNN run,
//! parsed once from a JSON file at startup and never mutated afterwards.

use crate::generate::Binarization;
use serde::Deserialize;
use std::error::Error;
use std::fs;
use std::io;

/// Configuration for one PixelCNN training/generation run.
///
/// All fields are optional in the JSON file; missing fields take the
/// reference defaults. Different knobs:
///
/// - **Architecture**: `model` (only "pixel_cnn"), `hidden_dims`,
///   `recurrent_length`, `out_hidden_dims`, `out_recurrent_length`,
///   `use_residual` (accepted for compatibility, must stay false: the
///   pixel_cnn variant has no residual path)
/// - **Training**: `batch_size`, `max_step`, `test_step`, `save_step`,
///   `learning_rate`, `grad_clip`, `is_train`
/// - **Data**: `data` (only "mnist"), `data_dir`, `binarization`
///   ("threshold" or "bernoulli")
/// - **Output**: `sample_dir`, `log_dir`, `display`
/// - **Misc**: `random_seed`, `use_gpu` (accepted and ignored on this
///   CPU-only build)
///
/// # Example
///
/// ```json
/// {
///   "model": "pixel_cnn",
///   "batch_size": 100,
///   "hidden_dims": 16,
///   "recurrent_length": 7,
///   "out_hidden_dims": 32,
///   "out_recurrent_length": 2,
///   "learning_rate": 1e-3,
///   "grad_clip": 1.0
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PixelCnnConfig {
    /// Model variant; only "pixel_cnn" is implemented.
    pub model: String,

    /// Images per mini-batch.
    pub batch_size: usize,

    /// Output channels of the first 7x7 "A"-masked convolution.
    pub hidden_dims: usize,

    /// Number of 1x1 "B"-masked convolutions in the middle stack.
    pub recurrent_length: usize,

    /// Output channels of each 1x1 convolution in the output stack.
    pub out_hidden_dims: usize,

    /// Number of ReLU-activated 1x1 convolutions in the output stack.
    pub out_recurrent_length: usize,

    /// Residual connections flag; must be false for pixel_cnn.
    pub use_residual: bool,

    /// Total number of training steps.
    pub max_step: usize,

    /// Evaluate test loss (and log a CSV row) every this many steps.
    pub test_step: usize,

    /// Save a checkpoint every this many steps.
    pub save_step: usize,

    /// RMSProp learning rate.
    pub learning_rate: f32,

    /// Symmetric elementwise gradient clip bound.
    pub grad_clip: f32,

    /// GPU layout flag; accepted and ignored (CPU-only).
    pub use_gpu: bool,

    /// Dataset name; only "mnist" is implemented.
    pub data: String,

    /// Directory holding the MNIST IDX files.
    pub data_dir: String,

    /// Directory for generated sample grids.
    pub sample_dir: String,

    /// Directory for checkpoints and the CSV training log.
    pub log_dir: String,

    /// Train before generating (false: generate from a checkpoint only).
    pub is_train: bool,

    /// Print per-step progress lines.
    pub display: bool,

    /// Seed for weight init, shuffling and stochastic binarization.
    /// Zero reseeds from the clock for a nondeterministic run.
    pub random_seed: u64,

    /// Pixel binarization policy: "threshold" or "bernoulli".
    pub binarization: String,
}

impl Default for PixelCnnConfig {
    fn default() -> Self {
        Self {
            model: "pixel_cnn".to_string(),
            batch_size: 100,
            hidden_dims: 16,
            recurrent_length: 7,
            out_hidden_dims: 32,
            out_recurrent_length: 2,
            use_residual: false,
            max_step: 1000,
            test_step: 100,
            save_step: 1000,
            learning_rate: 1e-3,
            grad_clip: 1.0,
            use_gpu: false,
            data: "mnist".to_string(),
            data_dir: "data".to_string(),
            sample_dir: "samples".to_string(),
            log_dir: "logs".to_string(),
            is_train: true,
            display: false,
            random_seed: 123,
            binarization: "threshold".to_string(),
        }
    }
}

impl PixelCnnConfig {
    /// The parsed binarization policy.
    ///
    /// `validate_config` guarantees the string is one of the two accepted
    /// values; anything else falls back to the threshold policy.
    pub fn binarization_policy(&self) -> Binarization {
        match self.binarization.as_str() {
            "bernoulli" => Binarization::Bernoulli,
            _ => Binarization::Threshold,
        }
    }
}

/// Loads a run configuration from a JSON file.
///
/// Reads the file at `path` and deserializes its JSON contents into a
/// [`PixelCnnConfig`], filling missing fields with the reference defaults.
///
/// # Returns
///
/// `Ok(PixelCnnConfig)` on success, or an error if the file cannot be read,
/// the JSON is invalid, or a field fails validation.
///
/// # Examples
///
/// ```no_run
/// use pixelcnn_mnist::config::load_config;
///
/// let cfg = load_config("config/pixelcnn_mnist.json").unwrap();
/// assert_eq!(cfg.model, "pixel_cnn");
/// ```
pub fn load_config(path: &str) -> Result<PixelCnnConfig, Box<dyn Error>> {
    let contents = fs::read_to_string(path)?;
    let config: PixelCnnConfig = serde_json::from_str(&contents)?;
    validate_config(&config)?;
    Ok(config)
}

fn invalid(message: String) -> Box<dyn Error> {
    Box::new(io::Error::new(io::ErrorKind::InvalidData, message))
}

/// Validate a configuration, whether loaded from JSON or built in code.
pub fn validate_config(config: &PixelCnnConfig) -> Result<(), Box<dyn Error>> {
    if config.model != "pixel_cnn" {
        return Err(invalid(format!(
            "Unknown model variant '{}'. Only 'pixel_cnn' is implemented",
            config.model
        )));
    }

    if config.data != "mnist" {
        return Err(invalid(format!(
            "Unknown dataset '{}'. Only 'mnist' is implemented",
            config.data
        )));
    }

    if config.use_residual {
        return Err(invalid(
            "use_residual is not supported by the pixel_cnn variant".to_string(),
        ));
    }

    if config.batch_size == 0 {
        return Err(invalid("batch_size must be non-zero".to_string()));
    }

    if config.hidden_dims == 0 || config.out_hidden_dims == 0 {
        return Err(invalid(
            "hidden_dims and out_hidden_dims must be non-zero".to_string(),
        ));
    }

    if config.test_step == 0 || config.save_step == 0 {
        return Err(invalid(
            "test_step and save_step must be non-zero".to_string(),
        ));
    }

    if config.learning_rate <= 0.0 {
        return Err(invalid("learning_rate must be positive".to_string()));
    }

    if config.grad_clip < 0.0 {
        return Err(invalid("grad_clip must be non-negative".to_string()));
    }

    let valid_policies = ["threshold", "bernoulli"];
    if !valid_policies.contains(&config.binarization.as_str()) {
        return Err(invalid(format!(
            "Invalid binarization policy '{}'. Must be one of: {}",
            config.binarization,
            valid_policies.join(", ")
        )));
    }

    Ok(())
}
