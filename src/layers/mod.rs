//! Layer abstractions for neural networks
//!
//! This module provides the Layer trait and the masked convolution layer used
//! by the PixelCNN model.

mod r#trait;
pub mod masked_conv2d;

// Re-export the Layer trait for convenience
pub use masked_conv2d::MaskedConv2DLayer;
pub use r#trait::Layer;
