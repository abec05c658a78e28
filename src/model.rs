//! PixelCNN model composition
//!
//! The model is a fixed feed-forward stack of masked convolutions over a
//! single-channel image:
//!
//! 1. one "A"-masked 7x7 convolution -> `hidden_dims` channels;
//! 2. `recurrent_length` "B"-masked 1x1 convolutions -> 3 channels each, no
//!    activation between them;
//! 3. `out_recurrent_length` "B"-masked 1x1 convolutions ->
//!    `out_hidden_dims` channels, each followed by ReLU;
//! 4. a final "B"-masked 1x1 convolution -> 1 logit per pixel;
//! 5. elementwise sigmoid of the logits gives the probability that each
//!    pixel is 1.
//!
//! All causal structure comes from the first 7x7 layer; everything after it
//! is a per-pixel 1x1 transform, so the receptive field never grows past the
//! first kernel.

use crate::checkpoint::LayerState;
use crate::config::PixelCnnConfig;
use crate::generate::PixelPredictor;
use crate::layers::{Layer, MaskedConv2DLayer};
use crate::mask::MaskType;
use crate::optimizers::RmsProp;
use crate::utils::activations::sigmoid_into;
use crate::utils::{relu_inplace, SimpleRng};
use std::error::Error;
use std::io;

/// Kernel size of the first, receptive-field-establishing convolution.
const INPUT_KERNEL: usize = 7;

/// Channel width of the middle 1x1 "B" stack. Fixed at 3: the narrow
/// bottleneck is part of the architecture, not a tunable.
const RECURRENT_CHANNELS: usize = 3;

/// RMSProp hyperparameters used for every parameter tensor.
const RMSPROP_DECAY: f32 = 0.95;
const RMSPROP_MOMENTUM: f32 = 0.9;
const RMSPROP_EPSILON: f32 = 1e-8;

/// One forward pass's results, retained for the backward pass.
pub struct ModelOutput {
    /// Per-pixel probability of intensity 1 (sigmoid of the logits).
    pub probs: Vec<f32>,
    /// Pre-activation logits, one per pixel.
    pub logits: Vec<f32>,
    /// Post-activation output of every layer, in layer order (the last entry
    /// equals `logits`).
    activations: Vec<Vec<f32>>,
}

/// The PixelCNN: an ordered stack of masked convolutions.
///
/// The model owns its layers and their parameters; parameters are mutated
/// only through [`PixelCnn::apply_gradients`]. Generation and evaluation are
/// read-only (`&self`).
pub struct PixelCnn {
    layers: Vec<MaskedConv2DLayer>,
    /// Index of the first layer whose output gets a ReLU.
    relu_start: usize,
    /// One past the last ReLU-activated layer.
    relu_end: usize,
    height: usize,
    width: usize,
    channels: usize,
}

impl PixelCnn {
    /// Build the model for the given input shape and hyperparameters.
    ///
    /// # Arguments
    ///
    /// * `config` - Architecture hyperparameters (`hidden_dims`,
    ///   `recurrent_length`, `out_hidden_dims`, `out_recurrent_length`)
    /// * `height`/`width`/`channels` - Input image shape (channels must be 1)
    /// * `rng` - Random number generator for weight initialization
    pub fn new(
        config: &PixelCnnConfig,
        height: usize,
        width: usize,
        channels: usize,
        rng: &mut SimpleRng,
    ) -> Self {
        assert_eq!(channels, 1, "only single-channel images are supported");

        let mut layers = Vec::new();

        // Stage 1: the only layer with a spatial receptive field.
        layers.push(MaskedConv2DLayer::new(
            channels,
            config.hidden_dims,
            INPUT_KERNEL,
            channels,
            MaskType::A,
            height,
            width,
            rng,
        ));

        // Stage 2: narrow 1x1 stack, no activations.
        let mut in_ch = config.hidden_dims;
        for _ in 0..config.recurrent_length {
            layers.push(MaskedConv2DLayer::new(
                in_ch,
                RECURRENT_CHANNELS,
                1,
                channels,
                MaskType::B,
                height,
                width,
                rng,
            ));
            in_ch = RECURRENT_CHANNELS;
        }

        // Stage 3: ReLU-activated 1x1 stack.
        let relu_start = layers.len();
        for _ in 0..config.out_recurrent_length {
            layers.push(MaskedConv2DLayer::new(
                in_ch,
                config.out_hidden_dims,
                1,
                channels,
                MaskType::B,
                height,
                width,
                rng,
            ));
            in_ch = config.out_hidden_dims;
        }
        let relu_end = layers.len();

        // Stage 4: per-pixel logit.
        layers.push(MaskedConv2DLayer::new(
            in_ch,
            1,
            1,
            channels,
            MaskType::B,
            height,
            width,
            rng,
        ));

        Self {
            layers,
            relu_start,
            relu_end,
            height,
            width,
            channels,
        }
    }

    /// Input image height.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Input image width.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Input image channel count (always 1).
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Number of layers in the stack.
    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }

    /// Total trainable parameter count across all layers.
    pub fn parameter_count(&self) -> usize {
        self.layers.iter().map(|l| l.parameter_count()).sum()
    }

    fn relu_after(&self, layer_idx: usize) -> bool {
        layer_idx >= self.relu_start && layer_idx < self.relu_end
    }

    /// Run the full stack forward on a batch of images.
    ///
    /// `input` is a flat `[batch][channel][row][col]` tensor of binarized
    /// pixels. The returned [`ModelOutput`] carries per-pixel probabilities,
    /// logits, and the intermediate activations needed by
    /// [`PixelCnn::backward`].
    pub fn forward(&self, input: &[f32], batch_size: usize) -> ModelOutput {
        assert_eq!(
            input.len(),
            batch_size * self.channels * self.height * self.width,
            "input shape mismatch"
        );

        let mut activations: Vec<Vec<f32>> = Vec::with_capacity(self.layers.len());

        for (i, layer) in self.layers.iter().enumerate() {
            let mut out = vec![0.0f32; batch_size * layer.output_size()];
            {
                let layer_input: &[f32] = if i == 0 { input } else { &activations[i - 1] };
                layer.forward(layer_input, &mut out, batch_size);
            }
            if self.relu_after(i) {
                relu_inplace(&mut out);
            }
            activations.push(out);
        }

        let logits = activations
            .last()
            .expect("model has at least one layer")
            .clone();
        let mut probs = vec![0.0f32; logits.len()];
        sigmoid_into(&logits, &mut probs);

        ModelOutput {
            probs,
            logits,
            activations,
        }
    }

    /// Run the backward pass, accumulating gradients inside each layer.
    ///
    /// `grad_logits` is the gradient of the loss with respect to the logits
    /// (already carrying the full mean scaling, see
    /// [`crate::loss::sigmoid_cross_entropy_grad`]); `output` must come from
    /// a `forward` call on the same `input` and `batch_size`.
    pub fn backward(
        &self,
        input: &[f32],
        output: &ModelOutput,
        grad_logits: &[f32],
        batch_size: usize,
    ) {
        assert_eq!(output.activations.len(), self.layers.len());
        assert_eq!(grad_logits.len(), output.logits.len());

        let mut grad = grad_logits.to_vec();

        for i in (0..self.layers.len()).rev() {
            let layer = &self.layers[i];

            // ReLU backward: zero gradients where the activation was clipped.
            if self.relu_after(i) {
                for (g, &a) in grad.iter_mut().zip(output.activations[i].iter()) {
                    if a <= 0.0 {
                        *g = 0.0;
                    }
                }
            }

            let layer_input: &[f32] = if i == 0 { input } else { &output.activations[i - 1] };
            let mut grad_input = vec![0.0f32; batch_size * layer.input_size()];
            layer.backward(layer_input, &grad, &mut grad_input, batch_size);
            grad = grad_input;
        }
    }

    /// Create one weight/bias optimizer pair per layer.
    ///
    /// Stateful optimizers size their buffers to a single tensor, so every
    /// tensor needs its own instance; the returned vector is parallel to the
    /// layer stack.
    pub fn make_optimizers(&self, learning_rate: f32) -> Vec<(RmsProp, RmsProp)> {
        self.layers
            .iter()
            .map(|_| {
                (
                    RmsProp::new(learning_rate, RMSPROP_DECAY, RMSPROP_MOMENTUM, RMSPROP_EPSILON),
                    RmsProp::new(learning_rate, RMSPROP_DECAY, RMSPROP_MOMENTUM, RMSPROP_EPSILON),
                )
            })
            .collect()
    }

    /// Clip and apply every layer's accumulated gradients.
    ///
    /// # Panics
    ///
    /// Panics if `optimizers` is not parallel to the layer stack.
    pub fn apply_gradients(&mut self, optimizers: &mut [(RmsProp, RmsProp)], grad_clip: f32) {
        assert_eq!(optimizers.len(), self.layers.len());
        for (layer, (opt_w, opt_b)) in self.layers.iter_mut().zip(optimizers.iter_mut()) {
            layer.apply_gradients(opt_w, opt_b, grad_clip);
        }
    }

    /// Snapshot all layer parameters, in layer order.
    pub fn export_state(&self) -> Vec<LayerState> {
        self.layers.iter().map(|l| l.export_state()).collect()
    }

    /// Snapshot every layer's accumulated gradients, in layer order.
    ///
    /// The accumulators are left untouched; intended for numerical gradient
    /// checking.
    pub fn export_gradients(&self) -> Vec<LayerState> {
        self.layers.iter().map(|l| l.export_gradients()).collect()
    }

    /// Restore all layer parameters from a snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot has the wrong number of layers or any
    /// layer's tensor sizes do not match.
    pub fn import_state(&mut self, states: &[LayerState]) -> Result<(), Box<dyn Error>> {
        if states.len() != self.layers.len() {
            return Err(Box::new(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "checkpoint has {} layers, model has {}",
                    states.len(),
                    self.layers.len()
                ),
            )));
        }
        for (layer, state) in self.layers.iter_mut().zip(states.iter()) {
            layer.import_state(state)?;
        }
        Ok(())
    }
}

impl PixelPredictor for PixelCnn {
    fn predict(&self, canvas: &[f32], batch_size: usize) -> Vec<f32> {
        self.forward(canvas, batch_size).probs
    }
}
