//! Masked 2D convolutional layer
//!
//! This module provides a Conv2D layer whose weights are multiplied
//! elementwise by a fixed binary causal mask before the convolution sum,
//! enforcing raster-scan pixel dependency for autoregressive image models.

use crate::checkpoint::LayerState;
use crate::layers::Layer;
use crate::mask::{kernel_mask, MaskType};
use crate::optimizers::{clip_gradients, Optimizer};
use crate::utils::SimpleRng;
use std::cell::RefCell;
use std::error::Error;
use std::io;

/// Masked 2D convolutional layer with learnable filters.
///
/// Performs a stride-1, same-padding convolution with the kernel weights
/// multiplied by a precomputed causal mask (see [`crate::mask::kernel_mask`]).
/// Output spatial dimensions always equal input spatial dimensions. No
/// activation is applied inside the layer.
///
/// # Fields
///
/// * `in_channels` - Number of input channels
/// * `out_channels` - Number of output feature maps (filters)
/// * `kernel_size` - Size of the square kernel
/// * `mask_type` - Causal mask type ("A" excludes the center, "B" keeps it)
/// * `input_height`/`input_width` - Spatial dimensions of the input
/// * `weights` - Filters (out_channels × in_channels × kernel_size × kernel_size)
/// * `biases` - Bias per output channel
/// * `mask` - Binary mask with the same layout as `weights`
///
/// # Example
///
/// ```ignore
/// use pixelcnn_mnist::layers::MaskedConv2DLayer;
/// use pixelcnn_mnist::mask::MaskType;
/// use pixelcnn_mnist::utils::SimpleRng;
///
/// let mut rng = SimpleRng::new(42);
/// // 1 input channel, 16 filters, 7x7 "A"-masked kernel over 28x28 inputs
/// let layer = MaskedConv2DLayer::new(1, 16, 7, 1, MaskType::A, 28, 28, &mut rng);
/// assert_eq!(layer.out_channels(), 16);
/// ```
pub struct MaskedConv2DLayer {
    in_channels: usize,
    out_channels: usize,
    kernel_size: usize,
    mask_type: MaskType,
    padding: usize,
    input_height: usize,
    input_width: usize,
    weights: Vec<f32>,
    biases: Vec<f32>,
    mask: Vec<f32>,
    // Gradient accumulators (interior mutability so backward takes &self)
    grad_weights: RefCell<Vec<f32>>,
    grad_biases: RefCell<Vec<f32>>,
}

impl MaskedConv2DLayer {
    /// Create a new masked convolution layer with Xavier initialization.
    ///
    /// Weights are sampled uniformly from [-limit, limit] with
    /// limit = sqrt(6 / (fan_in + fan_out)), biases start at zero, and the
    /// causal mask is built once for this kernel shape and mask type.
    /// Padding is fixed at `kernel_size / 2` so output spatial size equals
    /// input spatial size (stride is always 1).
    ///
    /// # Arguments
    ///
    /// * `in_channels` - Number of input channels
    /// * `out_channels` - Number of output filters
    /// * `kernel_size` - Size of the square kernel (odd for symmetric padding)
    /// * `image_channels` - Channel count of the modeled image (1 for grayscale)
    /// * `mask_type` - Causal mask type
    /// * `input_height` - Input feature-map height
    /// * `input_width` - Input feature-map width
    /// * `rng` - Random number generator for weight initialization
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        in_channels: usize,
        out_channels: usize,
        kernel_size: usize,
        image_channels: usize,
        mask_type: MaskType,
        input_height: usize,
        input_width: usize,
        rng: &mut SimpleRng,
    ) -> Self {
        let fan_in = (in_channels * kernel_size * kernel_size) as f32;
        let fan_out = (out_channels * kernel_size * kernel_size) as f32;
        let limit = (6.0f32 / (fan_in + fan_out)).sqrt();

        let weight_count = out_channels * in_channels * kernel_size * kernel_size;
        let mut weights = vec![0.0f32; weight_count];

        for value in &mut weights {
            *value = rng.gen_range_f32(-limit, limit);
        }

        let mask = kernel_mask(
            kernel_size,
            kernel_size,
            in_channels,
            out_channels,
            image_channels,
            mask_type,
        );

        Self {
            in_channels,
            out_channels,
            kernel_size,
            mask_type,
            padding: kernel_size / 2,
            input_height,
            input_width,
            weights,
            biases: vec![0.0f32; out_channels],
            mask,
            grad_weights: RefCell::new(vec![0.0f32; weight_count]),
            grad_biases: RefCell::new(vec![0.0f32; out_channels]),
        }
    }

    /// Get the number of input channels.
    pub fn in_channels(&self) -> usize {
        self.in_channels
    }

    /// Get the number of output channels (filters).
    pub fn out_channels(&self) -> usize {
        self.out_channels
    }

    /// Get the kernel size.
    pub fn kernel_size(&self) -> usize {
        self.kernel_size
    }

    /// Get the mask type.
    pub fn mask_type(&self) -> MaskType {
        self.mask_type
    }

    /// Get the output height (equal to input height: same padding, stride 1).
    pub fn output_height(&self) -> usize {
        self.input_height
    }

    /// Get the output width (equal to input width: same padding, stride 1).
    pub fn output_width(&self) -> usize {
        self.input_width
    }

    /// Borrow the layer's causal mask (weights layout, {0,1} values).
    pub fn mask(&self) -> &[f32] {
        &self.mask
    }

    /// Snapshot the layer's parameters for checkpointing.
    pub fn export_state(&self) -> LayerState {
        LayerState {
            weights: self.weights.clone(),
            biases: self.biases.clone(),
        }
    }

    /// Snapshot the currently accumulated gradients.
    ///
    /// Useful for numerically checking the backward pass; the accumulators
    /// are left untouched.
    pub fn export_gradients(&self) -> LayerState {
        LayerState {
            weights: self.grad_weights.borrow().clone(),
            biases: self.grad_biases.borrow().clone(),
        }
    }

    /// Restore parameters from a checkpoint snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot's tensor sizes do not match this
    /// layer's configuration.
    pub fn import_state(&mut self, state: &LayerState) -> Result<(), Box<dyn Error>> {
        if state.weights.len() != self.weights.len() || state.biases.len() != self.biases.len() {
            return Err(Box::new(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "layer state shape mismatch: got {}/{} parameters, expected {}/{}",
                    state.weights.len(),
                    state.biases.len(),
                    self.weights.len(),
                    self.biases.len()
                ),
            )));
        }
        self.weights.copy_from_slice(&state.weights);
        self.biases.copy_from_slice(&state.biases);
        Ok(())
    }
}

impl Layer for MaskedConv2DLayer {
    fn forward(&self, input: &[f32], output: &mut [f32], batch_size: usize) {
        let spatial = self.input_height * self.input_width;
        let k = self.kernel_size;
        let pad = self.padding as isize;

        for b in 0..batch_size {
            let in_base = b * (self.in_channels * spatial);
            let out_base_b = b * (self.out_channels * spatial);

            for oc in 0..self.out_channels {
                let bias = self.biases[oc];
                let out_base = out_base_b + oc * spatial;

                for oy in 0..self.input_height {
                    for ox in 0..self.input_width {
                        let mut sum = bias;

                        for ic in 0..self.in_channels {
                            let w_base = (oc * self.in_channels + ic) * k * k;
                            let in_base_c = in_base + ic * spatial;

                            for ky in 0..k {
                                let iy = oy as isize + ky as isize - pad;
                                if iy < 0 || iy >= self.input_height as isize {
                                    continue;
                                }
                                for kx in 0..k {
                                    let ix = ox as isize + kx as isize - pad;
                                    if ix < 0 || ix >= self.input_width as isize {
                                        continue;
                                    }

                                    let w_idx = w_base + ky * k + kx;
                                    let in_idx =
                                        in_base_c + iy as usize * self.input_width + ix as usize;
                                    sum += input[in_idx]
                                        * self.weights[w_idx]
                                        * self.mask[w_idx];
                                }
                            }
                        }

                        output[out_base + oy * self.input_width + ox] = sum;
                    }
                }
            }
        }
    }

    fn backward(
        &self,
        input: &[f32],
        grad_output: &[f32],
        grad_input: &mut [f32],
        batch_size: usize,
    ) {
        let spatial = self.input_height * self.input_width;
        let k = self.kernel_size;
        let pad = self.padding as isize;

        let mut grad_w = self.grad_weights.borrow_mut();
        let mut grad_b = self.grad_biases.borrow_mut();

        // Zero grad_input so we can scatter-add into it.
        for v in grad_input.iter_mut() {
            *v = 0.0;
        }

        for b in 0..batch_size {
            let in_base = b * (self.in_channels * spatial);
            let g_base_b = b * (self.out_channels * spatial);

            for oc in 0..self.out_channels {
                let g_base = g_base_b + oc * spatial;

                for oy in 0..self.input_height {
                    for ox in 0..self.input_width {
                        let g = grad_output[g_base + oy * self.input_width + ox];
                        grad_b[oc] += g;
                        if g == 0.0 {
                            continue;
                        }

                        for ic in 0..self.in_channels {
                            let w_base = (oc * self.in_channels + ic) * k * k;
                            let in_base_c = in_base + ic * spatial;

                            for ky in 0..k {
                                let iy = oy as isize + ky as isize - pad;
                                if iy < 0 || iy >= self.input_height as isize {
                                    continue;
                                }
                                for kx in 0..k {
                                    let ix = ox as isize + kx as isize - pad;
                                    if ix < 0 || ix >= self.input_width as isize {
                                        continue;
                                    }

                                    let w_idx = w_base + ky * k + kx;
                                    let m = self.mask[w_idx];
                                    if m == 0.0 {
                                        continue;
                                    }
                                    let in_idx =
                                        in_base_c + iy as usize * self.input_width + ix as usize;

                                    // Masked-out weights keep zero gradient.
                                    grad_w[w_idx] += g * input[in_idx];
                                    grad_input[in_idx] += g * self.weights[w_idx];
                                }
                            }
                        }
                    }
                }
            }
        }
    }

    fn apply_gradients(
        &mut self,
        opt_weights: &mut dyn Optimizer,
        opt_biases: &mut dyn Optimizer,
        grad_clip: f32,
    ) {
        let mut grad_w = self.grad_weights.borrow_mut();
        let mut grad_b = self.grad_biases.borrow_mut();

        clip_gradients(&mut grad_w, grad_clip);
        clip_gradients(&mut grad_b, grad_clip);

        opt_weights.update(&mut self.weights, &grad_w);
        opt_biases.update(&mut self.biases, &grad_b);

        for g in grad_w.iter_mut() {
            *g = 0.0;
        }
        for g in grad_b.iter_mut() {
            *g = 0.0;
        }
    }

    fn input_size(&self) -> usize {
        self.in_channels * self.input_height * self.input_width
    }

    fn output_size(&self) -> usize {
        self.out_channels * self.input_height * self.input_width
    }

    fn parameter_count(&self) -> usize {
        self.weights.len() + self.biases.len()
    }
}
