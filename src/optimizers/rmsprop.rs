//! RMSProp optimizer implementation
//!
//! This module provides the RMSProp optimizer with momentum, the update rule
//! used to train the PixelCNN.

use crate::optimizers::Optimizer;

/// RMSProp optimizer with momentum.
///
/// RMSProp keeps a decaying moving average of squared gradients and divides
/// each step by its square root, giving every parameter an adaptive
/// effective learning rate. A momentum buffer smooths the resulting steps:
///
/// ```text
/// ms_t = decay * ms_{t-1} + (1 - decay) * gradient²
/// mom_t = momentum * mom_{t-1} + α * gradient / √(ms_t + ε)
/// parameter = parameter - mom_t
/// ```
///
/// where:
/// - α is the learning rate
/// - decay is the moving-average rate for squared gradients (typically 0.95)
/// - momentum smooths updates across steps (typically 0.9)
/// - ε is a small constant for numerical stability
///
/// # Fields
///
/// * `learning_rate` - The step size α
/// * `decay` - Decay rate for the squared-gradient average
/// * `momentum` - Momentum coefficient
/// * `epsilon` - Numerical stability constant
/// * `mean_square` - Moving average of squared gradients per parameter
/// * `momentum_buf` - Momentum buffer per parameter
///
/// # Example
///
/// ```
/// use pixelcnn_mnist::optimizers::{Optimizer, RmsProp};
///
/// let mut optimizer = RmsProp::new(1e-3, 0.95, 0.9, 1e-8);
/// let mut weights = vec![1.0f32, 2.0, 3.0];
/// let gradients = vec![0.1f32, 0.2, 0.3];
///
/// optimizer.update(&mut weights, &gradients);
/// assert!(weights[0] < 1.0);
/// ```
///
/// # Reference
///
/// Tieleman, T., & Hinton, G. (2012). Lecture 6.5 - RMSProp. COURSERA:
/// Neural Networks for Machine Learning.
pub struct RmsProp {
    learning_rate: f32,
    decay: f32,
    momentum: f32,
    epsilon: f32,
    /// Moving average of squared gradients
    mean_square: Vec<f32>,
    /// Momentum buffer
    momentum_buf: Vec<f32>,
}

impl RmsProp {
    /// Creates a new RMSProp optimizer with the specified hyperparameters.
    ///
    /// State buffers are sized lazily on the first `update` call, so one
    /// instance serves exactly one parameter tensor.
    ///
    /// # Arguments
    ///
    /// * `learning_rate` - The step size (must be positive)
    /// * `decay` - Decay rate for the squared-gradient average (0 < decay < 1)
    /// * `momentum` - Momentum coefficient (0 disables momentum)
    /// * `epsilon` - Small constant for numerical stability (must be positive)
    ///
    /// # Examples
    ///
    /// ```
    /// use pixelcnn_mnist::optimizers::{Optimizer, RmsProp};
    ///
    /// let optimizer = RmsProp::new(1e-3, 0.95, 0.9, 1e-8);
    /// assert_eq!(optimizer.learning_rate(), 1e-3);
    /// ```
    pub fn new(learning_rate: f32, decay: f32, momentum: f32, epsilon: f32) -> Self {
        Self {
            learning_rate,
            decay,
            momentum,
            epsilon,
            mean_square: Vec::new(),
            momentum_buf: Vec::new(),
        }
    }
}

impl Optimizer for RmsProp {
    /// Update parameters using the RMSProp rule.
    ///
    /// # Panics
    ///
    /// Panics if `parameters` and `gradients` have different lengths.
    fn update(&mut self, parameters: &mut [f32], gradients: &[f32]) {
        assert_eq!(
            parameters.len(),
            gradients.len(),
            "Parameters and gradients must have the same length"
        );

        // Lazy state sizing on first use.
        if self.mean_square.len() != parameters.len() {
            self.mean_square = vec![0.0f32; parameters.len()];
            self.momentum_buf = vec![0.0f32; parameters.len()];
        }

        for i in 0..parameters.len() {
            let g = gradients[i];
            let ms = self.decay * self.mean_square[i] + (1.0 - self.decay) * g * g;
            self.mean_square[i] = ms;

            let step = self.learning_rate * g / (ms + self.epsilon).sqrt();
            let mom = self.momentum * self.momentum_buf[i] + step;
            self.momentum_buf[i] = mom;

            parameters[i] -= mom;
        }
    }

    /// Reset optimizer state.
    ///
    /// Clears the squared-gradient average and the momentum buffer; the next
    /// `update` call resizes them again.
    fn reset(&mut self) {
        self.mean_square.clear();
        self.momentum_buf.clear();
    }

    fn learning_rate(&self) -> f32 {
        self.learning_rate
    }

    fn set_learning_rate(&mut self, lr: f32) {
        self.learning_rate = lr;
    }
}
