use image::{DynamicImage, GrayImage, Luma};

use crate::{
    error::Result, find_nearest_foreground, BinaryGrid, JunctionClassifier, PipelineConfig, Point,
    TokenSequence,
};

/// Flat RGBA buffer of a decoded image together with its width and height
pub fn rgba_buffer(img: &DynamicImage) -> (Vec<u8>, usize, usize) {
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    (rgba.into_raw(), width as usize, height as usize)
}

/// Run the pipeline on a decoded image
pub fn skeletonize_image(img: &DynamicImage, config: &PipelineConfig) -> Result<BinaryGrid> {
    let (buffer, width, height) = rgba_buffer(img);
    crate::skeletonize_with(&buffer, width, height, config, None)
}

/// Render a grid as a grayscale image, set cells become black on white
pub fn grid_to_image(grid: &BinaryGrid) -> GrayImage {
    GrayImage::from_fn(grid.columns() as u32, grid.rows() as u32, |x, y| {
        if grid.get(x as i64, y as i64) == 1 {
            Luma([0])
        } else {
            Luma([255])
        }
    })
}

/// Snap every point of a planned path onto the skeleton, then classify it.
///
/// A path shorter than a classification window gives an empty sequence.
pub fn classify_snapped(
    classifier: &JunctionClassifier,
    skeleton: &BinaryGrid,
    points: &[Point],
) -> Result<TokenSequence> {
    let path = points
        .iter()
        .map(|&p| find_nearest_foreground(skeleton, p))
        .collect::<Result<Vec<_>>>()?;

    Ok(classifier.classify(skeleton, &path))
}
