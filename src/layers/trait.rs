//! Layer trait definition for neural network layers
//!
//! This module defines the core Layer trait that all layer types must implement.
//! The trait provides a common interface for forward propagation, backward
//! propagation, and optimizer-driven parameter updates.

use crate::optimizers::Optimizer;

/// Core trait for neural network layers.
///
/// Layers work with f32 data laid out as flat row-major arrays. The forward
/// and backward passes take immutable `&self` receivers; gradient
/// accumulators use interior mutability so that a shared model reference can
/// run backward passes, with the actual parameter mutation confined to
/// [`Layer::apply_gradients`].
///
/// # Example
///
/// ```ignore
/// // Forward pass through a layer
/// let mut output = vec![0.0f32; batch_size * layer.output_size()];
/// layer.forward(&input, &mut output, batch_size);
///
/// // Backward pass to accumulate gradients
/// let mut grad_input = vec![0.0f32; batch_size * layer.input_size()];
/// layer.backward(&input, &grad_output, &mut grad_input, batch_size);
///
/// // Clip and apply the accumulated gradients
/// layer.apply_gradients(&mut opt_w, &mut opt_b, grad_clip);
/// ```
pub trait Layer {
    /// Forward propagation through the layer.
    ///
    /// Computes the layer output given input data. No activation function is
    /// applied inside the layer; activations are the caller's responsibility.
    ///
    /// # Arguments
    ///
    /// * `input` - Input data flattened as a 1D array (batch_size × input_size)
    /// * `output` - Output buffer to store results (batch_size × output_size)
    /// * `batch_size` - Number of samples in the batch
    ///
    /// # Panics
    ///
    /// Implementations may panic if input/output dimensions don't match
    /// expected sizes.
    fn forward(&self, input: &[f32], output: &mut [f32], batch_size: usize);

    /// Backward propagation through the layer.
    ///
    /// Computes `grad_input` (gradient with respect to the layer's input) and
    /// accumulates weight/bias gradients internally. Gradients are not scaled
    /// here; whatever scaling the loss gradient carries flows through
    /// unchanged.
    ///
    /// # Arguments
    ///
    /// * `input` - Input data from the corresponding forward pass
    /// * `grad_output` - Gradient of loss w.r.t. layer output
    /// * `grad_input` - Buffer for the gradient w.r.t. the input
    /// * `batch_size` - Number of samples in the batch
    fn backward(
        &self,
        input: &[f32],
        grad_output: &[f32],
        grad_input: &mut [f32],
        batch_size: usize,
    );

    /// Clip accumulated gradients and apply them through the optimizers.
    ///
    /// Gradients are clipped elementwise to `[-grad_clip, +grad_clip]`
    /// before the optimizer update (clip-then-apply ordering), then the
    /// accumulators are cleared. Weight and bias tensors get separate
    /// optimizer instances because stateful optimizers size their moment
    /// buffers per parameter tensor.
    ///
    /// # Arguments
    ///
    /// * `opt_weights` - Optimizer holding state for this layer's weights
    /// * `opt_biases` - Optimizer holding state for this layer's biases
    /// * `grad_clip` - Symmetric elementwise clip bound (zero disables clipping)
    fn apply_gradients(
        &mut self,
        opt_weights: &mut dyn Optimizer,
        opt_biases: &mut dyn Optimizer,
        grad_clip: f32,
    );

    /// Get the input size of the layer.
    ///
    /// Returns the expected number of input features per sample.
    fn input_size(&self) -> usize;

    /// Get the output size of the layer.
    ///
    /// Returns the number of output features per sample.
    fn output_size(&self) -> usize;

    /// Get the number of trainable parameters in the layer.
    ///
    /// Returns the total count of weights and biases.
    fn parameter_count(&self) -> usize;
}
