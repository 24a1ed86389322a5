use std::{
    fmt::Display,
    ops::{Add, Mul, Sub},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A grid coordinate, x grows to the east and y to the south
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<i32> for Point {
    type Output = Point;

    fn mul(self, rhs: i32) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

impl Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A rectangular grid of bits (a vec in a vec), every cell is either 0 or 1.
///
/// Reads outside of the grid through [`BinaryGrid::get`] return 0 so that
/// neighbourhood and sensor lookups can treat the border as background.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<u8>>", into = "Vec<Vec<u8>>")]
pub struct BinaryGrid {
    rows: usize,
    columns: usize,
    cells: Vec<Vec<u8>>,
}

impl BinaryGrid {
    /// Create a grid where every cell is background
    pub fn new(rows: usize, columns: usize) -> Self {
        Self::filled(rows, columns, false)
    }

    pub fn filled(rows: usize, columns: usize, value: bool) -> Self {
        Self {
            rows,
            columns,
            cells: vec![vec![value as u8; columns]; rows],
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Width in pixels (same as `columns`)
    pub fn width(&self) -> usize {
        self.columns
    }

    /// Height in pixels (same as `rows`)
    pub fn height(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.columns == 0
    }

    pub fn contains(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && (x as u64) < self.columns as u64 && (y as u64) < self.rows as u64
    }

    /// Value at (x, y), 0 when the position is outside of the grid
    pub fn get(&self, x: i64, y: i64) -> u8 {
        if self.contains(x, y) {
            self.cells[y as usize][x as usize]
        } else {
            0
        }
    }

    pub fn at(&self, p: Point) -> u8 {
        self.get(p.x as i64, p.y as i64)
    }

    /// Bounds checked read
    pub fn try_get(&self, x: i64, y: i64) -> Result<u8> {
        if self.contains(x, y) {
            Ok(self.cells[y as usize][x as usize])
        } else {
            Err(Error::OutOfBounds { x, y })
        }
    }

    pub fn set(&mut self, p: Point, value: bool) -> Result<()> {
        let (x, y) = (p.x as i64, p.y as i64);
        if !self.contains(x, y) {
            return Err(Error::OutOfBounds { x, y });
        }
        self.cells[p.y as usize][p.x as usize] = value as u8;
        Ok(())
    }

    /// In-bounds read without the signed conversion, for the hot loops
    pub(crate) fn cell(&self, col: usize, row: usize) -> u8 {
        self.cells[row][col]
    }

    pub(crate) fn clear(&mut self, col: usize, row: usize) {
        self.cells[row][col] = 0;
    }

    pub(crate) fn set_unchecked(&mut self, col: usize, row: usize) {
        self.cells[row][col] = 1;
    }

    pub fn cells(&self) -> &[Vec<u8>] {
        &self.cells
    }

    pub fn count_foreground(&self) -> usize {
        self.cells
            .iter()
            .map(|row| row.iter().filter(|&&c| c == 1).count())
            .sum()
    }

    /// Iterate over the positions of all cells set to 1, row by row
    pub fn foreground(&self) -> impl Iterator<Item = Point> + '_ {
        self.cells.iter().enumerate().flat_map(|(y, row)| {
            row.iter()
                .enumerate()
                .filter(|(_, c)| **c == 1)
                .map(move |(x, _)| Point::new(x as i32, y as i32))
        })
    }

    /// Logical NOT of every cell
    pub fn invert(&self) -> BinaryGrid {
        BinaryGrid {
            rows: self.rows,
            columns: self.columns,
            cells: self
                .cells
                .iter()
                .map(|row| row.iter().map(|&c| 1 - c).collect())
                .collect(),
        }
    }
}

impl TryFrom<Vec<Vec<u8>>> for BinaryGrid {
    type Error = Error;

    fn try_from(cells: Vec<Vec<u8>>) -> Result<Self> {
        let rows = cells.len();
        let columns = cells.first().map_or(0, Vec::len);

        for (y, row) in cells.iter().enumerate() {
            if row.len() != columns {
                return Err(Error::InvalidGrid(format!(
                    "row {} has {} cells, expected {}",
                    y,
                    row.len(),
                    columns
                )));
            }
            if let Some(x) = row.iter().position(|&c| c > 1) {
                return Err(Error::InvalidGrid(format!(
                    "cell ({}, {}) has value {}, expected 0 or 1",
                    x, y, row[x]
                )));
            }
        }

        Ok(Self {
            rows,
            columns,
            cells,
        })
    }
}

impl From<BinaryGrid> for Vec<Vec<u8>> {
    fn from(grid: BinaryGrid) -> Self {
        grid.cells
    }
}

impl Display for BinaryGrid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for row in &self.cells {
            for cell in row {
                write!(f, "{}", if *cell == 1 { '#' } else { '.' })?;
            }
            writeln!(f)?;
        }

        Ok(())
    }
}

/// Parses the `Display` format back: one line per row, `#` for 1 and `.` for 0.
/// Leading and trailing whitespace of every line is ignored, blank lines are skipped.
impl FromStr for BinaryGrid {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let cells = s
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| {
                line.chars()
                    .map(|c| match c {
                        '#' | '1' => Ok(1),
                        '.' | '0' => Ok(0),
                        other => Err(Error::InvalidGrid(format!(
                            "unexpected character {:?}",
                            other
                        ))),
                    })
                    .collect::<Result<Vec<u8>>>()
            })
            .collect::<Result<Vec<_>>>()?;

        BinaryGrid::try_from(cells)
    }
}

#[cfg(test)]
mod test {

    use super::*;

    fn create_basic_grid() -> BinaryGrid {
        "
        .....
        .###.
        ...#.
        "
        .parse()
        .unwrap()
    }

    #[test]
    fn test_parse_and_display() {
        let grid = create_basic_grid();
        assert_eq!(grid.rows(), 3);
        assert_eq!(grid.columns(), 5);
        assert_eq!(grid.count_foreground(), 4);
        assert_eq!(grid.to_string(), ".....\n.###.\n...#.\n");
    }

    #[test]
    fn test_off_grid_reads_are_background() {
        let grid = BinaryGrid::filled(2, 2, true);
        assert_eq!(grid.get(0, 0), 1);
        assert_eq!(grid.get(-1, 0), 0);
        assert_eq!(grid.get(0, 2), 0);
        assert!(matches!(
            grid.try_get(2, 0),
            Err(Error::OutOfBounds { x: 2, y: 0 })
        ));
    }

    #[test]
    fn test_rejects_invalid_cells() {
        assert!(BinaryGrid::try_from(vec![vec![0, 2]]).is_err());
        assert!(BinaryGrid::try_from(vec![vec![0, 1], vec![1]]).is_err());
        assert!("#x#".parse::<BinaryGrid>().is_err());
    }

    #[test]
    fn test_invert() {
        let grid = create_basic_grid();
        let inverted = grid.invert();
        assert_eq!(inverted.count_foreground(), 15 - 4);
        assert_eq!(inverted.invert(), grid);
    }

    #[test]
    fn test_set_and_foreground() {
        let mut grid = BinaryGrid::new(3, 3);
        grid.set(Point::new(2, 1), true).unwrap();
        assert!(grid.set(Point::new(3, 1), true).is_err());
        assert_eq!(
            grid.foreground().collect::<Vec<_>>(),
            vec![Point::new(2, 1)]
        );
    }

    #[test]
    fn test_serde_round_trip() {
        let grid = create_basic_grid();
        let json = serde_json::to_string(&grid).unwrap();
        assert_eq!(json, "[[0,0,0,0,0],[0,1,1,1,0],[0,0,0,1,0]]");
        let back: BinaryGrid = serde_json::from_str(&json).unwrap();
        assert_eq!(back, grid);
        assert!(serde_json::from_str::<BinaryGrid>("[[0,3]]").is_err());
    }

    #[test]
    fn test_point_ops() {
        let p = Point::new(1, 2);
        assert_eq!(p + Point::new(1, 1), Point::new(2, 3));
        assert_eq!(p - Point::new(1, 1), Point::new(0, 1));
        assert_eq!(p * 2, Point::new(2, 4));
        assert_eq!(Point::from((3, -1)).to_string(), "(3, -1)");
    }
}
