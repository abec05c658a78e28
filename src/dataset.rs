//! MNIST dataset loading and mini-batching
//!
//! Reads the raw IDX-format MNIST image files (big-endian header, one byte
//! per pixel), normalizes intensities to [0, 1], binarizes them with the
//! configured policy, and hands out shuffled mini-batches. Labels are never
//! read: the model is generative and only consumes images.
//!
//! Expected files under the data directory:
//!   train-images.idx3-ubyte
//!   t10k-images.idx3-ubyte

use crate::generate::Binarization;
use crate::utils::SimpleRng;
use std::error::Error;
use std::fs;
use std::io;
use std::path::Path;

/// MNIST image height.
pub const MNIST_H: usize = 28;
/// MNIST image width.
pub const MNIST_W: usize = 28;

const TRAIN_IMAGES: &str = "train-images.idx3-ubyte";
const TEST_IMAGES: &str = "t10k-images.idx3-ubyte";

/// Which MNIST split to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Split {
    Train,
    Test,
}

/// One split of binarized MNIST with shuffled mini-batch iteration.
///
/// Images are stored flat, `count * MNIST_H * MNIST_W` values in {0.0, 1.0}.
/// `next_batch` walks a shuffled index permutation and reshuffles at each
/// epoch boundary.
pub struct MnistData {
    images: Vec<f32>,
    count: usize,
    indices: Vec<usize>,
    cursor: usize,
}

impl MnistData {
    /// Load and binarize one split from `data_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, truncated, or not 28x28.
    pub fn load(
        data_dir: &Path,
        split: Split,
        policy: Binarization,
        rng: &mut SimpleRng,
    ) -> Result<Self, Box<dyn Error>> {
        let file = match split {
            Split::Train => TRAIN_IMAGES,
            Split::Test => TEST_IMAGES,
        };
        let mut images = read_idx_images(&data_dir.join(file))?;

        // Binarize once at load time with the same policy generation uses.
        for v in images.iter_mut() {
            *v = policy.binarize(*v, rng);
        }

        let count = images.len() / (MNIST_H * MNIST_W);
        Ok(Self {
            images,
            count,
            indices: (0..count).collect(),
            cursor: 0,
        })
    }

    /// Build a dataset from an already-binarized flat image buffer.
    ///
    /// # Panics
    ///
    /// Panics if `images` is not a whole number of 28x28 images.
    pub fn from_images(images: Vec<f32>) -> Self {
        assert_eq!(images.len() % (MNIST_H * MNIST_W), 0);
        let count = images.len() / (MNIST_H * MNIST_W);
        Self {
            images,
            count,
            indices: (0..count).collect(),
            cursor: 0,
        }
    }

    /// Number of images in this split.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Borrow the first `n` images (e.g. as occlusion seeds).
    ///
    /// # Panics
    ///
    /// Panics if fewer than `n` images are loaded.
    pub fn first_images(&self, n: usize) -> &[f32] {
        assert!(n <= self.count, "requested {} of {} images", n, self.count);
        &self.images[..n * MNIST_H * MNIST_W]
    }

    /// Copy the next `n` images into `out` as a flat `(n, 1, 28, 28)` batch.
    ///
    /// Walks a shuffled permutation; when fewer than `n` images remain in the
    /// current epoch, the permutation is reshuffled and the batch restarts
    /// from the top of the new epoch.
    ///
    /// # Panics
    ///
    /// Panics if `out` is shorter than `n * 784` or `n` exceeds the split
    /// size.
    pub fn next_batch(&mut self, n: usize, rng: &mut SimpleRng, out: &mut [f32]) {
        let image_size = MNIST_H * MNIST_W;
        assert!(n <= self.count, "batch larger than dataset");
        assert!(out.len() >= n * image_size, "batch buffer too small");

        if self.cursor + n > self.count {
            rng.shuffle_usize(&mut self.indices);
            self.cursor = 0;
        }

        for i in 0..n {
            let src = self.indices[self.cursor + i] * image_size;
            let dst = i * image_size;
            out[dst..dst + image_size].copy_from_slice(&self.images[src..src + image_size]);
        }
        self.cursor += n;
    }
}

// Read a big-endian u32 and advance the byte offset (IDX format uses BE).
fn read_be_u32(data: &[u8], offset: &mut usize) -> u32 {
    let b0 = (data[*offset] as u32) << 24;
    let b1 = (data[*offset + 1] as u32) << 16;
    let b2 = (data[*offset + 2] as u32) << 8;
    let b3 = data[*offset + 3] as u32;
    *offset += 4;
    b0 | b1 | b2 | b3
}

// Read IDX images and normalize to [0,1] floats.
fn read_idx_images(path: &Path) -> Result<Vec<f32>, Box<dyn Error>> {
    let data = fs::read(path)
        .map_err(|e| format!("could not open {}: {}", path.display(), e))?;

    if data.len() < 16 {
        return Err(Box::new(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("{} is not an IDX image file", path.display()),
        )));
    }

    let mut offset = 0usize;
    // IDX header: magic, count, rows, cols.
    let _magic = read_be_u32(&data, &mut offset);
    let total_images = read_be_u32(&data, &mut offset) as usize;
    let rows = read_be_u32(&data, &mut offset) as usize;
    let cols = read_be_u32(&data, &mut offset) as usize;

    if rows != MNIST_H || cols != MNIST_W {
        return Err(Box::new(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("unexpected MNIST image shape: {}x{}", rows, cols),
        )));
    }

    let total_bytes = total_images * rows * cols;
    if data.len() < offset + total_bytes {
        return Err(Box::new(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("{} is truncated", path.display()),
        )));
    }

    // Flatten images as [N * 784] in row-major order.
    let mut images = vec![0.0f32; total_bytes];
    for i in 0..total_bytes {
        images[i] = data[offset + i] as f32 / 255.0;
    }
    Ok(images)
}
