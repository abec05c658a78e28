//! Optimizer abstractions for neural network parameter updates
//!
//! This module provides the Optimizer trait and the RMSProp implementation
//! used to update PixelCNN parameters during training, plus the elementwise
//! gradient clipping applied before every update.
//!
//! # Overview
//!
//! Optimizers define how to use gradients to update model parameters. The
//! basic gradient descent update is `weight = weight - learning_rate *
//! gradient`; RMSProp divides the step by a moving average of squared
//! gradients so that each parameter gets an adaptive effective rate.
//!
//! # Example
//!
//! ```ignore
//! use pixelcnn_mnist::optimizers::{clip_gradients, Optimizer, RmsProp};
//!
//! let mut optimizer = RmsProp::new(1e-3, 0.95, 0.9, 1e-8);
//!
//! // Clip then apply after computing gradients
//! clip_gradients(&mut gradients, 1.0);
//! optimizer.update(&mut weights, &gradients);
//! ```

pub mod rmsprop;

pub use rmsprop::RmsProp;

/// Core trait for neural network optimizers.
///
/// All optimizer types implement this trait to provide a uniform interface
/// for parameter updates during training.
///
/// # State Management
///
/// Stateful optimizers (like RMSProp) maintain internal state across updates:
/// moving averages of squared gradients, momentum buffers, and so on. The
/// state is sized to one parameter tensor, so each tensor (e.g. one layer's
/// weights, one layer's biases) needs its own optimizer instance.
pub trait Optimizer {
    /// Update parameters using gradients.
    ///
    /// Applies the optimizer's update rule to modify parameters in-place.
    ///
    /// # Arguments
    ///
    /// * `parameters` - Mutable slice of parameters to update (weights or biases)
    /// * `gradients` - Gradient of loss with respect to each parameter
    ///
    /// # Panics
    ///
    /// Implementations may panic if parameters and gradients have different
    /// lengths.
    fn update(&mut self, parameters: &mut [f32], gradients: &[f32]);

    /// Reset optimizer state.
    ///
    /// Clears any accumulated moving averages or momentum. Useful when
    /// starting a new training run.
    fn reset(&mut self);

    /// Get the learning rate for this optimizer.
    fn learning_rate(&self) -> f32;

    /// Set the learning rate for this optimizer.
    ///
    /// # Arguments
    ///
    /// * `lr` - New learning rate value (must be positive)
    fn set_learning_rate(&mut self, lr: f32);
}

/// Clip gradients elementwise to the symmetric range `[-bound, +bound]`.
///
/// Training always clips before handing gradients to the optimizer
/// (clip-then-apply ordering). A non-positive bound disables clipping.
///
/// # Examples
///
/// ```
/// use pixelcnn_mnist::optimizers::clip_gradients;
///
/// let mut grads = vec![-3.0, -0.5, 0.5, 3.0];
/// clip_gradients(&mut grads, 1.0);
/// assert_eq!(grads, vec![-1.0, -0.5, 0.5, 1.0]);
/// ```
pub fn clip_gradients(gradients: &mut [f32], bound: f32) {
    if bound <= 0.0 {
        return;
    }
    for g in gradients.iter_mut() {
        if *g > bound {
            *g = bound;
        } else if *g < -bound {
            *g = -bound;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clip_gradients_bounds() {
        let mut grads = vec![-10.0, -1.0, 0.0, 1.0, 10.0];
        clip_gradients(&mut grads, 2.5);
        assert_eq!(grads, vec![-2.5, -1.0, 0.0, 1.0, 2.5]);
    }

    #[test]
    fn test_clip_gradients_disabled_for_zero_bound() {
        let mut grads = vec![-10.0, 10.0];
        clip_gradients(&mut grads, 0.0);
        assert_eq!(grads, vec![-10.0, 10.0]);
    }
}
