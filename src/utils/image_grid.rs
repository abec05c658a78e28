//! Composite thumbnail-grid image output
//!
//! Generated sample batches are written as a single grayscale PNG laid out
//! as a grid of thumbnails, one image per cell.

use image::{ImageBuffer, Luma};
use std::error::Error;
use std::io;
use std::path::{Path, PathBuf};

/// Write a batch of single-channel images as one composite grid PNG.
///
/// `images` holds `count` images of `height * width` pixels each, flat and
/// row-major, with intensities in [0, 1]. The composite is
/// `grid_rows * height` pixels tall and `grid_cols * width` wide; images fill
/// the grid in row-major order and unfilled cells stay black. Returns the
/// path written.
///
/// # Errors
///
/// Returns an error if `images` is shorter than `count` images, if the grid
/// has fewer cells than `count`, or if the file cannot be written.
pub fn save_image_grid(
    images: &[f32],
    count: usize,
    height: usize,
    width: usize,
    grid_rows: usize,
    grid_cols: usize,
    path: &Path,
) -> Result<PathBuf, Box<dyn Error>> {
    let image_size = height * width;
    if images.len() < count * image_size {
        return Err(Box::new(io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "image buffer holds {} values, need {} for {} images of {}x{}",
                images.len(),
                count * image_size,
                count,
                height,
                width
            ),
        )));
    }
    if grid_rows * grid_cols < count {
        return Err(Box::new(io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "{}x{} grid cannot hold {} images",
                grid_rows, grid_cols, count
            ),
        )));
    }

    let mut grid: ImageBuffer<Luma<u8>, Vec<u8>> =
        ImageBuffer::new((grid_cols * width) as u32, (grid_rows * height) as u32);

    for n in 0..count {
        let cell_y = (n / grid_cols) * height;
        let cell_x = (n % grid_cols) * width;
        let base = n * image_size;

        for y in 0..height {
            for x in 0..width {
                let v = images[base + y * width + x].clamp(0.0, 1.0);
                let pixel = Luma([(v * 255.0).round() as u8]);
                grid.put_pixel((cell_x + x) as u32, (cell_y + y) as u32, pixel);
            }
        }
    }

    grid.save(path)?;
    Ok(path.to_path_buf())
}
