//! Activation functions for neural networks
//!
//! This module provides the activations the PixelCNN uses:
//! - Sigmoid (per-pixel intensity probability from logits)
//! - ReLU (between the output-stack 1x1 convolutions)

/// Sigmoid activation function.
///
/// Returns 1 / (1 + exp(-x)). Computed through exp of the negated magnitude
/// so large inputs of either sign cannot overflow.
pub fn sigmoid(x: f32) -> f32 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// Elementwise sigmoid writing into an output buffer.
pub fn sigmoid_into(logits: &[f32], probs: &mut [f32]) {
    assert_eq!(logits.len(), probs.len(), "length mismatch in sigmoid_into");
    for (p, &x) in probs.iter_mut().zip(logits.iter()) {
        *p = sigmoid(x);
    }
}

/// ReLU activation function applied in-place.
///
/// Sets all negative values to 0.0, keeps positive values unchanged.
pub fn relu_inplace(data: &mut [f32]) {
    for value in data.iter_mut() {
        if *value < 0.0 {
            *value = 0.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON_F32: f32 = 1e-6;

    #[test]
    fn test_sigmoid_zero() {
        assert!((sigmoid(0.0) - 0.5).abs() < EPSILON_F32);
    }

    #[test]
    fn test_sigmoid_symmetry() {
        let p = sigmoid(2.0);
        let q = sigmoid(-2.0);
        assert!((p + q - 1.0).abs() < EPSILON_F32);
    }

    #[test]
    fn test_sigmoid_extreme_inputs_finite() {
        assert!((sigmoid(100.0) - 1.0).abs() < EPSILON_F32);
        assert!(sigmoid(-100.0).abs() < EPSILON_F32);
        assert!(sigmoid(1000.0).is_finite());
        assert!(sigmoid(-1000.0).is_finite());
    }

    #[test]
    fn test_relu_mixed() {
        let mut data = vec![-2.0, -1.0, 0.0, 1.0, 2.0];
        relu_inplace(&mut data);
        assert_eq!(data, vec![0.0, 0.0, 0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_sigmoid_into() {
        let logits = vec![0.0f32, 100.0, -100.0];
        let mut probs = vec![0.0f32; 3];
        sigmoid_into(&logits, &mut probs);
        assert!((probs[0] - 0.5).abs() < EPSILON_F32);
        assert!((probs[1] - 1.0).abs() < EPSILON_F32);
        assert!(probs[2].abs() < EPSILON_F32);
    }
}
