//! Turns raw RGBA pixel buffers into binary grids.

use log::debug;

use crate::error::{Error, Result};
use crate::grid::BinaryGrid;

/// Default luminance threshold, a pixel is set when its channel mean is strictly above it
pub const DEFAULT_THRESHOLD: u8 = 127;

pub type Pixel = [u8; 4];

/// Rows of (R, G, B, A) tuples
pub type PixelGrid = Vec<Vec<Pixel>>;

/// Reinterpret a flat row-major RGBA buffer as rows of pixels
pub fn reshape(buffer: &[u8], width: usize, height: usize) -> Result<PixelGrid> {
    // a size that does not fit in memory can never match the buffer
    let expected = width
        .checked_mul(height)
        .and_then(|n| n.checked_mul(4))
        .unwrap_or(usize::MAX);
    if buffer.len() != expected {
        return Err(Error::Shape {
            expected,
            actual: buffer.len(),
        });
    }

    if width == 0 {
        return Ok(vec![Vec::new(); height]);
    }

    Ok(buffer
        .chunks_exact(width * 4)
        .map(|row| {
            row.chunks_exact(4)
                .map(|p| [p[0], p[1], p[2], p[3]])
                .collect()
        })
        .collect())
}

pub fn to_binary(image: &PixelGrid) -> BinaryGrid {
    to_binary_with_threshold(image, DEFAULT_THRESHOLD)
}

/// Average all four channels (alpha included) and compare against `threshold`
pub fn to_binary_with_threshold(image: &PixelGrid, threshold: u8) -> BinaryGrid {
    let rows = image.len();
    let columns = image.first().map_or(0, Vec::len);
    debug!("binarizing {}x{} pixels at threshold {}", columns, rows, threshold);

    let mut grid = BinaryGrid::new(rows, columns);
    for (y, row) in image.iter().enumerate() {
        for (x, pixel) in row.iter().take(columns).enumerate() {
            let sum: u32 = pixel.iter().map(|&c| u32::from(c)).sum();
            // mean > threshold, kept exact by comparing the sum against 4 * threshold
            if sum > 4 * u32::from(threshold) {
                grid.set_unchecked(x, y);
            }
        }
    }

    grid
}

/// Logical NOT of every cell
pub fn invert(grid: &BinaryGrid) -> BinaryGrid {
    grid.invert()
}
