//! Reduces a scanned maze or line track to a one pixel wide skeleton and annotates paths
//! through that skeleton with junction and turn tokens.
//!
//! ```text
//! RGBA pixels -> binarize -> invert -> thin -> skeleton
//! (skeleton, path) -> JunctionClassifier -> TokenSequence
//! ```

use std::sync::atomic::AtomicBool;

use log::debug;

pub mod binarize;
pub mod config;
pub mod error;
pub mod grid;
pub mod junction;
pub mod locate;
pub mod thinning;
pub mod util;

pub use binarize::{invert, reshape, to_binary, to_binary_with_threshold, PixelGrid};
pub use config::PipelineConfig;
pub use error::{Error, Result};
pub use grid::{BinaryGrid, Point};
pub use junction::{
    turn_angle, JunctionClassifier, JunctionRegistry, JunctionSignature, SensorReading, Token,
    TokenSequence, Turn,
};
pub use locate::{find_nearest, find_nearest_background, find_nearest_foreground};
pub use thinning::{fix_corners, thin, thin_with, zhang_suen_pass, Thinned, ThinningOptions};

/// Skeleton of the dark strokes in an RGBA buffer, using the default configuration.
///
/// In the returned grid 1 marks the track. Use [`invert`] to get the display polarity
/// where the track is 0.
pub fn skeletonize(buffer: &[u8], width: usize, height: usize) -> Result<BinaryGrid> {
    skeletonize_with(buffer, width, height, &PipelineConfig::default(), None)
}

pub fn skeletonize_with(
    buffer: &[u8],
    width: usize,
    height: usize,
    config: &PipelineConfig,
    cancel: Option<&AtomicBool>,
) -> Result<BinaryGrid> {
    let image = reshape(buffer, width, height)?;
    let ink = invert(&to_binary_with_threshold(&image, config.threshold));
    let thinned = thin_with(&ink, &config.thinning, cancel)?;

    debug!(
        "skeletonized {}x{} image in {} passes, {} of {} pixels left",
        width,
        height,
        thinned.passes,
        thinned.grid.count_foreground(),
        ink.count_foreground()
    );

    Ok(thinned.grid)
}
