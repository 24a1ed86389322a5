//! Zhang–Suen thinning followed by a corner fixing pass.
//!
//! Zhang, T. Y. and Suen, C. Y., "A fast parallel algorithm for thinning digital patterns",
//! Communications of the ACM 27(3), 1984.

use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::grid::BinaryGrid;

// positions in the neighbour array, clockwise starting north
const N: usize = 0;
const NE: usize = 1;
const E: usize = 2;
const SE: usize = 3;
const S: usize = 4;
const SW: usize = 5;
const W: usize = 6;
const NW: usize = 7;

/// Corner structuring elements: `(set, set, clear, clear, clear)`.
/// The two set cells are orthogonal 4-neighbours, the cleared ones are the opposite
/// 4-neighbours and the diagonal between them.
const CORNERS: [(usize, usize, usize, usize, usize); 4] = [
    (N, E, S, W, SW),
    (E, S, W, N, NW),
    (S, W, N, E, NE),
    (W, N, E, S, SE),
];

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThinningOptions {
    /// Run the corner fixing pass after Zhang–Suen has converged
    pub corner_fixing: bool,
}

impl Default for ThinningOptions {
    fn default() -> Self {
        Self {
            corner_fixing: true,
        }
    }
}

/// The result of a thinning run
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Thinned {
    pub grid: BinaryGrid,
    /// Number of full passes, including the last one that removed nothing
    pub passes: usize,
    /// Pixels removed by Zhang–Suen
    pub removed: usize,
    /// Pixels removed by corner fixing
    pub corners_removed: usize,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum SubStep {
    One,
    Two,
}

fn neighbours(grid: &BinaryGrid, x: usize, y: usize) -> [u8; 8] {
    let (x, y) = (x as i64, y as i64);
    [
        grid.get(x, y - 1),
        grid.get(x + 1, y - 1),
        grid.get(x + 1, y),
        grid.get(x + 1, y + 1),
        grid.get(x, y + 1),
        grid.get(x - 1, y + 1),
        grid.get(x - 1, y),
        grid.get(x - 1, y - 1),
    ]
}

/// Number of 0 -> 1 transitions going once around the neighbours (wrapping back to north)
fn transitions(n: &[u8; 8]) -> usize {
    (0..8).filter(|&i| n[i] == 0 && n[(i + 1) % 8] == 1).count()
}

fn is_deletable(n: &[u8; 8], step: SubStep) -> bool {
    let sum: u8 = n.iter().sum();
    if transitions(n) != 1 || !(2..=6).contains(&sum) {
        return false;
    }

    match step {
        SubStep::One => n[N] * n[E] * n[S] == 0 && n[N] * n[E] * n[W] == 0,
        SubStep::Two => n[E] * n[S] * n[W] == 0 && n[N] * n[S] * n[W] == 0,
    }
}

/// Marks against the grid as it is when the sub-step starts, then deletes all marks at once
fn sub_step(grid: &mut BinaryGrid, step: SubStep) -> usize {
    let mut marked = Vec::new();

    for y in 0..grid.rows() {
        for x in 0..grid.columns() {
            if grid.cell(x, y) == 1 && is_deletable(&neighbours(grid, x, y), step) {
                marked.push((x, y));
            }
        }
    }

    for &(x, y) in &marked {
        grid.clear(x, y);
    }

    trace!("sub-step {:?} removed {} pixels", step, marked.len());
    marked.len()
}

/// Run one full pass (step one then step two) in place, returning the number of removed pixels
pub fn zhang_suen_pass(grid: &mut BinaryGrid) -> usize {
    sub_step(grid, SubStep::One) + sub_step(grid, SubStep::Two)
}

/// Passes until one removes nothing. `cancelled` is polled once before every pass.
fn converge(grid: &mut BinaryGrid, cancelled: impl Fn() -> bool) -> Option<(usize, usize)> {
    let mut passes = 0;
    let mut removed = 0;

    loop {
        if cancelled() {
            debug!("thinning cancelled after {} passes", passes);
            return None;
        }

        let count = zhang_suen_pass(grid);
        passes += 1;
        removed += count;
        debug!("pass {} removed {} pixels", passes, count);

        if count == 0 {
            return Some((passes, removed));
        }
    }
}

/// Delete corner pixels whose neighbours stay 8-connected without them.
///
/// Works in place and in raster order so every decision sees earlier deletions,
/// which keeps two touching corners (e.g. a 2x2 block) from vanishing together.
pub fn fix_corners(grid: &mut BinaryGrid) -> usize {
    let mut removed = 0;

    loop {
        let before = removed;

        for y in 0..grid.rows() {
            for x in 0..grid.columns() {
                if grid.cell(x, y) == 0 {
                    continue;
                }

                let n = neighbours(grid, x, y);
                let is_corner = CORNERS.iter().any(|&(a, b, c, d, e)| {
                    n[a] == 1 && n[b] == 1 && n[c] == 0 && n[d] == 0 && n[e] == 0
                });

                if is_corner {
                    grid.clear(x, y);
                    removed += 1;
                }
            }
        }

        if removed == before {
            break;
        }
    }

    debug!("corner fixing removed {} pixels", removed);
    removed
}

/// Thin a grid to a one pixel wide skeleton with the default options
pub fn thin(grid: &BinaryGrid) -> BinaryGrid {
    let mut out = grid.clone();
    converge(&mut out, || false);
    fix_corners(&mut out);
    out
}

/// Thin a grid, stopping early with [`Error::Cancelled`] when `cancel` gets set
pub fn thin_with(
    grid: &BinaryGrid,
    options: &ThinningOptions,
    cancel: Option<&AtomicBool>,
) -> Result<Thinned> {
    let mut out = grid.clone();

    let (passes, removed) = converge(&mut out, || {
        cancel.is_some_and(|flag| flag.load(Ordering::Relaxed))
    })
    .ok_or(Error::Cancelled)?;

    let corners_removed = if options.corner_fixing {
        fix_corners(&mut out)
    } else {
        0
    };

    Ok(Thinned {
        grid: out,
        passes,
        removed,
        corners_removed,
    })
}
