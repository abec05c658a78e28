//! Shared utilities for the PixelCNN implementation
//!
//! This module provides common utilities like random number generation,
//! activation functions, and sample-grid image output.

pub mod activations;
pub mod image_grid;
pub mod rng;

pub use activations::{relu_inplace, sigmoid};
pub use image_grid::save_image_grid;
pub use rng::SimpleRng;
