//! Per-pixel binary cross-entropy on logits
//!
//! The model emits one logit per pixel; the training target is the binarized
//! image. Loss and gradient use the numerically stable sigmoid cross-entropy
//! identity so large logits of either sign cannot overflow.

use crate::utils::sigmoid;

/// Mean sigmoid cross-entropy between logits and binary targets.
///
/// For each element the stable closed form is
/// `max(x, 0) - x*z + ln(1 + exp(-|x|))`, equal to
/// `-z*ln(sigma(x)) - (1-z)*ln(1-sigma(x))`; the result is averaged over every
/// element (all pixels of all batch images).
///
/// # Panics
///
/// Panics if `logits` and `targets` have different lengths or are empty.
///
/// # Examples
///
/// ```
/// use pixelcnn_mnist::loss::sigmoid_cross_entropy_with_logits;
///
/// // sigma(0) = 0.5, so the loss against any target is ln(2)
/// let loss = sigmoid_cross_entropy_with_logits(&[0.0], &[1.0]);
/// assert!((loss - 2.0f32.ln()).abs() < 1e-6);
/// ```
pub fn sigmoid_cross_entropy_with_logits(logits: &[f32], targets: &[f32]) -> f32 {
    assert_eq!(
        logits.len(),
        targets.len(),
        "logits and targets must have the same length"
    );
    assert!(!logits.is_empty(), "loss over an empty tensor");

    let mut total = 0.0f32;
    for (&x, &z) in logits.iter().zip(targets.iter()) {
        total += x.max(0.0) - x * z + (-x.abs()).exp().ln_1p();
    }
    total / logits.len() as f32
}

/// Gradient of the mean sigmoid cross-entropy with respect to the logits.
///
/// Writes `(sigma(x) - z) / N` into `grad`, where `N = logits.len()`. This is
/// the full mean scaling; layer backward passes do not rescale further.
///
/// # Panics
///
/// Panics if the three slices have different lengths.
pub fn sigmoid_cross_entropy_grad(logits: &[f32], targets: &[f32], grad: &mut [f32]) {
    assert_eq!(logits.len(), targets.len());
    assert_eq!(logits.len(), grad.len());

    let scale = 1.0f32 / logits.len() as f32;
    for i in 0..logits.len() {
        grad[i] = (sigmoid(logits[i]) - targets[i]) * scale;
    }
}
