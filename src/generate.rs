//! Pixel-by-pixel sequential generation
//!
//! A trained PixelCNN only emits per-pixel probabilities, so sampling an
//! image is an explicit raster scan: run the model on the whole partially
//! filled canvas, binarize, keep exactly the one newly revealed pixel, and
//! repeat. The causal kernel masks guarantee the model never reads a pixel
//! that has not been finalized yet, which is what makes recomputing the whole
//! canvas at every step correct (if wasteful: one full forward pass per
//! pixel).

use crate::utils::SimpleRng;

/// Policy for turning a probability into a {0, 1} pixel.
///
/// The same policy that binarizes training images must be used when
/// generating, so the canvas the model sees matches its training
/// distribution. `Threshold` is the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binarization {
    /// `p > 0.5` maps to 1, everything else (ties included) to 0.
    Threshold,
    /// Bernoulli draw: 1 with probability `p`.
    Bernoulli,
}

impl Binarization {
    /// Binarize one probability (or normalized intensity).
    pub fn binarize(self, p: f32, rng: &mut SimpleRng) -> f32 {
        match self {
            Binarization::Threshold => {
                if p > 0.5 {
                    1.0
                } else {
                    0.0
                }
            }
            Binarization::Bernoulli => {
                if rng.gen_bool(p) {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }
}

/// A model usable by the sequential generator: anything that maps a canvas
/// to per-pixel probabilities of the same shape.
pub trait PixelPredictor {
    /// Probability of intensity 1 for every canvas position.
    ///
    /// `canvas` is a flat `[batch][row][col]` single-channel tensor; the
    /// returned vector has the same length and layout.
    fn predict(&self, canvas: &[f32], batch_size: usize) -> Vec<f32>;
}

/// Sample a batch of images from scratch.
///
/// Starts from an all-zero canvas and fills it in raster order: for each
/// position (i, j), the model runs on the entire current canvas, the output
/// is binarized, and only `canvas[:, i, j]` is overwritten; every other
/// position keeps its value even though the forward pass recomputed it.
/// Returns the fully determined canvas, flat `[batch][row][col]`.
pub fn generate<M: PixelPredictor>(
    model: &M,
    batch_size: usize,
    height: usize,
    width: usize,
    policy: Binarization,
    rng: &mut SimpleRng,
) -> Vec<f32> {
    let mut canvas = vec![0.0f32; batch_size * height * width];
    fill_raster(model, &mut canvas, batch_size, height, width, 0, policy, rng);
    canvas
}

/// Complete the bottom half of occluded images.
///
/// The canvas starts as a copy of `seed_images`; rows `0..height/2` are taken
/// verbatim from the seed and never overwritten, rows `height/2..height` are
/// regenerated in raster order exactly as in [`generate`]. The stale seed
/// content below the occlusion line is invisible to the regeneration of any
/// pixel at or above it thanks to the causal masks.
///
/// # Panics
///
/// Panics if `seed_images` does not hold `batch_size` images of
/// `height * width` pixels.
pub fn generate_occlusions<M: PixelPredictor>(
    model: &M,
    seed_images: &[f32],
    batch_size: usize,
    height: usize,
    width: usize,
    policy: Binarization,
    rng: &mut SimpleRng,
) -> Vec<f32> {
    assert_eq!(
        seed_images.len(),
        batch_size * height * width,
        "seed image shape mismatch"
    );

    let mut canvas = seed_images.to_vec();
    let start_row = height / 2;
    fill_raster(
        model, &mut canvas, batch_size, height, width, start_row, policy, rng,
    );
    canvas
}

/// Raster-order fill of `canvas` from `start_row` downwards.
///
/// Position (i, j) is finalized against a canvas in which every
/// raster-earlier position already holds its final (or seed) value and every
/// later position still holds its initial value.
#[allow(clippy::too_many_arguments)]
fn fill_raster<M: PixelPredictor>(
    model: &M,
    canvas: &mut [f32],
    batch_size: usize,
    height: usize,
    width: usize,
    start_row: usize,
    policy: Binarization,
    rng: &mut SimpleRng,
) {
    let spatial = height * width;

    for i in start_row..height {
        for j in 0..width {
            let probs = model.predict(canvas, batch_size);
            for b in 0..batch_size {
                let idx = b * spatial + i * width + j;
                canvas[idx] = policy.binarize(probs[idx], rng);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Model that reports the same probability everywhere.
    struct ConstantModel(f32);

    impl PixelPredictor for ConstantModel {
        fn predict(&self, canvas: &[f32], _batch_size: usize) -> Vec<f32> {
            vec![self.0; canvas.len()]
        }
    }

    #[test]
    fn test_generate_constant_high_probability() {
        let model = ConstantModel(0.9);
        let mut rng = SimpleRng::new(1);
        let out = generate(&model, 2, 3, 3, Binarization::Threshold, &mut rng);
        assert!(out.iter().all(|&v| v == 1.0));
    }

    #[test]
    fn test_generate_constant_low_probability() {
        let model = ConstantModel(0.1);
        let mut rng = SimpleRng::new(1);
        let out = generate(&model, 2, 3, 3, Binarization::Threshold, &mut rng);
        assert!(out.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_threshold_tie_resolves_to_zero() {
        let mut rng = SimpleRng::new(1);
        assert_eq!(Binarization::Threshold.binarize(0.5, &mut rng), 0.0);
    }

    #[test]
    fn test_occlusions_preserve_top_half() {
        // Top two rows all ones, bottom two all zeros; model ties everywhere.
        let model = ConstantModel(0.5);
        let mut seed = vec![0.0f32; 16];
        for v in seed.iter_mut().take(8) {
            *v = 1.0;
        }

        let mut rng = SimpleRng::new(1);
        let out = generate_occlusions(&model, &seed, 1, 4, 4, Binarization::Threshold, &mut rng);

        assert!(out[..8].iter().all(|&v| v == 1.0));
        assert!(out[8..].iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_bernoulli_extremes_deterministic() {
        let model = ConstantModel(1.0);
        let mut rng = SimpleRng::new(9);
        let out = generate(&model, 1, 4, 4, Binarization::Bernoulli, &mut rng);
        assert!(out.iter().all(|&v| v == 1.0));

        let model = ConstantModel(0.0);
        let out = generate(&model, 1, 4, 4, Binarization::Bernoulli, &mut rng);
        assert!(out.iter().all(|&v| v == 0.0));
    }
}
