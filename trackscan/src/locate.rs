use log::trace;

use crate::error::{Error, Result};
use crate::grid::{BinaryGrid, Point};

/// Quadrant order in which each ring offset is tried
const QUADRANTS: [(i64, i64); 4] = [(1, 1), (-1, 1), (1, -1), (-1, -1)];

/// Distance from `v` to the range `0..len` and to the farthest end of that range
fn span(v: i64, len: usize) -> (i64, i64) {
    let last = len as i64 - 1;
    ((v.clamp(0, last) - v).abs(), v.abs().max((last - v).abs()))
}

/// Find the cell closest to `origin` (in Manhattan rings) whose value equals `target`.
///
/// Rings are walked outwards. Within a ring the horizontal offset grows from 0 and every
/// offset is tried in the quadrant order `(+,+), (-,+), (+,-), (-,-)`.
/// Rings and offsets that cannot reach the grid are skipped, so an origin far outside of
/// the grid costs no more than one next to it.
/// Returns [`Error::OutOfBounds`] once the rings have left the grid without a match.
pub fn find_nearest(grid: &BinaryGrid, origin: Point, target: u8) -> Result<Point> {
    let (x, y) = (origin.x as i64, origin.y as i64);
    if grid.is_empty() {
        return Err(Error::OutOfBounds { x, y });
    }

    // nearest and farthest reachable offsets along each axis
    let (min_x, max_x) = span(x, grid.columns());
    let (min_y, max_y) = span(y, grid.rows());

    for distance in (min_x + min_y)..=(max_x + max_y) {
        let first = min_x.max(distance - max_y);
        let last = max_x.min(distance - min_y);

        for dx in first..=last {
            let dy = distance - dx;
            for (sx, sy) in QUADRANTS {
                let (cx, cy) = (x + dx * sx, y + dy * sy);
                if grid.contains(cx, cy) && grid.get(cx, cy) == target {
                    trace!("nearest {} to {} found at distance {}", target, origin, distance);
                    return Ok(Point::new(cx as i32, cy as i32));
                }
            }
        }
    }

    Err(Error::OutOfBounds { x, y })
}

/// Closest cell set to 1
pub fn find_nearest_foreground(grid: &BinaryGrid, origin: Point) -> Result<Point> {
    find_nearest(grid, origin, 1)
}

/// Closest cell set to 0, i.e. the closest black pixel of a skeleton in display polarity
pub fn find_nearest_background(grid: &BinaryGrid, origin: Point) -> Result<Point> {
    find_nearest(grid, origin, 0)
}
