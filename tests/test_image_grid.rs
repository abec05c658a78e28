//! Tests for the sample-grid PNG writer.

use pixelcnn_mnist::utils::save_image_grid;
use tempfile::TempDir;

#[test]
fn test_grid_file_has_expected_dimensions() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("grid.png");

    // Six 4x5 images on a 2x3 grid.
    let images = vec![0.5f32; 6 * 4 * 5];
    let written = save_image_grid(&images, 6, 4, 5, 2, 3, &path).expect("write grid");

    let img = image::open(&written).expect("read back");
    let gray = img.to_luma8();
    assert_eq!(gray.height(), 2 * 4);
    assert_eq!(gray.width(), 3 * 5);
}

#[test]
fn test_grid_pixel_values_scaled() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("grid.png");

    // One all-ones image and one all-zeros image side by side.
    let mut images = vec![1.0f32; 2 * 2 * 2];
    for v in images.iter_mut().skip(4) {
        *v = 0.0;
    }
    save_image_grid(&images, 2, 2, 2, 1, 2, &path).expect("write grid");

    let gray = image::open(&path).expect("read back").to_luma8();
    assert_eq!(gray.get_pixel(0, 0).0[0], 255);
    assert_eq!(gray.get_pixel(2, 0).0[0], 0);
}

#[test]
fn test_partial_grid_leaves_empty_cells_black() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("grid.png");

    // Three white images on a 2x2 grid: the fourth cell stays black.
    let images = vec![1.0f32; 3 * 2 * 2];
    save_image_grid(&images, 3, 2, 2, 2, 2, &path).expect("write grid");

    let gray = image::open(&path).expect("read back").to_luma8();
    assert_eq!(gray.get_pixel(0, 0).0[0], 255);
    assert_eq!(gray.get_pixel(2, 2).0[0], 0); // bottom-right cell
}
