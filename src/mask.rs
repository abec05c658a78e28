//! Causal kernel masks for masked convolutions
//!
//! A masked convolution multiplies its weights elementwise by a fixed binary
//! mask before the sliding-window sum, so that the output at pixel (i, j)
//! depends only on input pixels at or before (i, j) in raster order
//! (left-to-right within a row, top-to-bottom across rows).
//!
//! Two mask types exist:
//!
//! - **Type "A"** excludes the center position itself. Used for the first
//!   layer, which must not see the true value of the pixel it predicts.
//! - **Type "B"** includes the center position. Used for every later layer,
//!   which may see the previous layer's transformed output at that pixel.

/// Mask type for a masked convolution kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaskType {
    /// Center position excluded (first layer).
    A,
    /// Center position included (all subsequent layers).
    B,
}

/// Build the binary mask for a convolution kernel.
///
/// The returned vector has the same layout as the convolution weights:
/// `[out_channels][in_channels][kernel_h][kernel_w]`, row-major, valued in
/// {0.0, 1.0}. Positions strictly before the kernel center in raster order
/// are kept, positions strictly after it are zeroed, and the center itself
/// is resolved per mask type and channel group.
///
/// `image_channels` is the number of channels in the modeled image (1 for
/// grayscale, 3 for RGB). Input and output channels are assigned to
/// `image_channels` groups by floor division; at the center position a
/// weight survives only if its input group precedes (type "A") or
/// precedes-or-equals (type "B") its output group, so e.g. the green channel
/// never sees the not-yet-predicted blue channel of the same pixel. For
/// single-channel images this reduces to: "A" zeroes the center, "B" keeps
/// it.
///
/// Masks are deterministic: the same arguments always produce bit-identical
/// output. For a 1x1 kernel, type "B" yields all ones (single-channel) and
/// type "A" all zeros, which is why "A" is only ever applied to a kernel
/// larger than 1x1.
pub fn kernel_mask(
    kernel_h: usize,
    kernel_w: usize,
    in_channels: usize,
    out_channels: usize,
    image_channels: usize,
    mask_type: MaskType,
) -> Vec<f32> {
    assert!(kernel_h > 0 && kernel_w > 0, "kernel dims must be non-zero");
    assert!(image_channels > 0, "image_channels must be non-zero");

    let center_y = kernel_h / 2;
    let center_x = kernel_w / 2;

    let mut mask = vec![0.0f32; out_channels * in_channels * kernel_h * kernel_w];

    for oc in 0..out_channels {
        let out_group = oc * image_channels / out_channels;
        for ic in 0..in_channels {
            let in_group = ic * image_channels / in_channels;
            let base = (oc * in_channels + ic) * kernel_h * kernel_w;

            for ky in 0..kernel_h {
                for kx in 0..kernel_w {
                    let keep = if ky < center_y || (ky == center_y && kx < center_x) {
                        true
                    } else if ky == center_y && kx == center_x {
                        match mask_type {
                            MaskType::A => in_group < out_group,
                            MaskType::B => in_group <= out_group,
                        }
                    } else {
                        false
                    };

                    if keep {
                        mask[base + ky * kernel_w + kx] = 1.0;
                    }
                }
            }
        }
    }

    mask
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_b_3x3_single_channel() {
        let mask = kernel_mask(3, 3, 1, 1, 1, MaskType::B);
        // Raster order: positions before and including center (1,1) are kept.
        #[rustfmt::skip]
        let expected = vec![
            1.0, 1.0, 1.0,
            1.0, 1.0, 0.0,
            0.0, 0.0, 0.0,
        ];
        assert_eq!(mask, expected);
    }

    #[test]
    fn test_mask_a_is_b_with_center_zeroed() {
        let mut b = kernel_mask(7, 7, 1, 4, 1, MaskType::B);
        let a = kernel_mask(7, 7, 1, 4, 1, MaskType::A);
        // Zero the center of each output channel's mask.
        for oc in 0..4 {
            b[oc * 49 + 3 * 7 + 3] = 0.0;
        }
        assert_eq!(a, b);
    }

    #[test]
    fn test_mask_b_1x1_all_ones() {
        let mask = kernel_mask(1, 1, 8, 8, 1, MaskType::B);
        assert!(mask.iter().all(|&v| v == 1.0));
    }

    #[test]
    fn test_mask_a_1x1_all_zeros() {
        let mask = kernel_mask(1, 1, 8, 8, 1, MaskType::A);
        assert!(mask.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_mask_deterministic() {
        let m1 = kernel_mask(5, 5, 3, 6, 1, MaskType::B);
        let m2 = kernel_mask(5, 5, 3, 6, 1, MaskType::B);
        assert_eq!(m1, m2);
    }

    #[test]
    fn test_mask_channel_groups_rgb_center() {
        // 3 input channels, 3 output channels, RGB grouping: at the center of
        // a 1x1 kernel, type "B" lets group g see groups 0..=g.
        let mask = kernel_mask(1, 1, 3, 3, 3, MaskType::B);
        for oc in 0..3 {
            for ic in 0..3 {
                let expected = if ic <= oc { 1.0 } else { 0.0 };
                assert_eq!(mask[oc * 3 + ic], expected, "oc={} ic={}", oc, ic);
            }
        }
        // Type "A" is strict: group g sees only groups 0..g.
        let mask_a = kernel_mask(1, 1, 3, 3, 3, MaskType::A);
        for oc in 0..3 {
            for ic in 0..3 {
                let expected = if ic < oc { 1.0 } else { 0.0 };
                assert_eq!(mask_a[oc * 3 + ic], expected, "oc={} ic={}", oc, ic);
            }
        }
    }
}
