//! PixelCNN on binarized MNIST
//!
//! This library implements a PixelCNN-style autoregressive image model with
//! masked convolutions, trained on CPU with hand-derived gradients, plus the
//! raster-scan sequential generation procedure that samples images one pixel
//! at a time.
//!
//! # Modules
//!
//! - `mask`: binary causal masks for convolution kernels (types "A" and "B")
//! - `layers`: Layer trait and the masked convolution layer
//! - `model`: the PixelCNN layer stack (forward, backward, parameter state)
//! - `loss`: sigmoid cross-entropy with logits
//! - `optimizers`: Optimizer trait, RMSProp, gradient clipping
//! - `generate`: pixel-by-pixel sequential generation and occlusion completion
//! - `dataset`: MNIST IDX loader with binarization and mini-batching
//! - `checkpoint`: parameter/statistics snapshots for resumable training
//! - `config`: training configuration structures
//! - `utils`: shared utilities (RNG, activation functions, image grids)

pub mod checkpoint;
pub mod config;
pub mod dataset;
pub mod generate;
pub mod layers;
pub mod loss;
pub mod mask;
pub mod model;
pub mod optimizers;
pub mod utils;
