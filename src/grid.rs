use std::fmt;

use crate::error::{BacteriaError, Result};

pub const ALIVE: u8 = 1;
pub const DEAD: u8 = 0;

/// Number of cells in a `rows x cols` grid, rejecting empty and oversized shapes.
pub fn cell_count(rows: usize, cols: usize) -> Result<usize> {
    if rows == 0 || cols == 0 {
        return Err(BacteriaError::InvalidDimensions {
            rows: rows as i64,
            cols: cols as i64,
        });
    }
    match rows.checked_mul(cols) {
        Some(n) if n <= isize::MAX as usize => Ok(n),
        _ => Err(BacteriaError::SizeOverflow { rows, cols }),
    }
}

/// Allocates `len` dead cells, reporting allocation failure instead of aborting.
pub(crate) fn alloc_cells(len: usize) -> Result<Vec<u8>> {
    let mut cells = Vec::new();
    cells
        .try_reserve_exact(len)
        .map_err(|_| BacteriaError::AllocationFailure { bytes: len })?;
    cells.resize(len, DEAD);
    Ok(cells)
}

/// Row-major grid of bacteria; cell (i, j) lives at `i * cols + j`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    rows: usize,
    cols: usize,
    data: Vec<u8>,
}

impl Grid {
    /// An all-dead grid.
    pub fn dead(rows: usize, cols: usize) -> Result<Self> {
        let len = cell_count(rows, cols)?;
        Ok(Grid {
            rows,
            cols,
            data: alloc_cells(len)?,
        })
    }

    /// Wraps an existing buffer. Every cell must be `ALIVE` or `DEAD`.
    pub fn from_cells(rows: usize, cols: usize, data: Vec<u8>) -> Result<Self> {
        let len = cell_count(rows, cols)?;
        if data.len() != len {
            return Err(BacteriaError::MalformedInput(format!(
                "expected {len} cells for a {rows}x{cols} grid, got {}",
                data.len()
            )));
        }
        if let Some(idx) = data.iter().position(|&c| c > ALIVE) {
            return Err(BacteriaError::MalformedInput(format!(
                "cell ({}, {}) has state {}",
                idx / cols,
                idx % cols,
                data[idx]
            )));
        }
        Ok(Grid { rows, cols, data })
    }

    /// Builds a grid from one string per row, `X`/`x` alive and `.` dead.
    pub fn from_rows<S: AsRef<str>>(lines: &[S]) -> Result<Self> {
        let rows = lines.len();
        let cols = lines.first().map_or(0, |l| l.as_ref().chars().count());
        let mut grid = Grid::dead(rows, cols)?;
        for (i, line) in lines.iter().enumerate() {
            let line = line.as_ref();
            if line.chars().count() != cols {
                return Err(BacteriaError::MalformedInput(format!(
                    "row {i} has {} cells, expected {cols}",
                    line.chars().count()
                )));
            }
            for (j, ch) in line.chars().enumerate() {
                match ch {
                    'X' | 'x' => grid.set(i, j, true),
                    '.' => {}
                    other => {
                        return Err(BacteriaError::MalformedInput(format!(
                            "unexpected character {other:?} at ({i}, {j})"
                        )));
                    }
                }
            }
        }
        Ok(grid)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn dims(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn cells(&self) -> &[u8] {
        &self.data
    }

    pub fn cells_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn row(&self, i: usize) -> &[u8] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    pub fn is_alive(&self, i: usize, j: usize) -> bool {
        self.data[i * self.cols + j] == ALIVE
    }

    pub fn set(&mut self, i: usize, j: usize, alive: bool) {
        self.data[i * self.cols + j] = if alive { ALIVE } else { DEAD };
    }

    /// Number of live cells.
    pub fn population(&self) -> usize {
        self.data.iter().filter(|&&c| c == ALIVE).count()
    }

    /// Cell-by-cell equality, including dimensions.
    pub fn matches(&self, other: &Grid) -> bool {
        self.dims() == other.dims() && self.data == other.data
    }

    /// Coordinates of every cell that differs from `other`.
    pub fn diff(&self, other: &Grid) -> Result<Vec<(usize, usize)>> {
        if self.dims() != other.dims() {
            return Err(BacteriaError::DimensionMismatch {
                expected: self.dims(),
                found: other.dims(),
            });
        }
        Ok(self
            .data
            .iter()
            .zip(&other.data)
            .enumerate()
            .filter(|(_, (a, b))| a != b)
            .map(|(idx, _)| (idx / self.cols, idx % self.cols))
            .collect())
    }

    pub(crate) fn into_parts(self) -> (usize, usize, Vec<u8>) {
        (self.rows, self.cols, self.data)
    }

    /// Reassembles a grid whose shape was validated when it was taken apart.
    pub(crate) fn from_parts(rows: usize, cols: usize, data: Vec<u8>) -> Self {
        debug_assert_eq!(data.len(), rows * cols);
        Grid { rows, cols, data }
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in 0..self.rows {
            for &cell in self.row(i) {
                f.write_str(if cell == ALIVE { "X" } else { "." })?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Two equally sized buffers with a role tag selecting which one is current.
///
/// The next generation is written into the scratch buffer and `swap` flips
/// the tag; cells are never copied between the two.
#[derive(Debug)]
pub struct DoubleBuffer {
    rows: usize,
    cols: usize,
    buffers: [Vec<u8>; 2],
    current: usize,
}

impl DoubleBuffer {
    pub fn new(grid: Grid) -> Result<Self> {
        let (rows, cols, data) = grid.into_parts();
        let scratch = alloc_cells(data.len())?;
        Ok(DoubleBuffer {
            rows,
            cols,
            buffers: [data, scratch],
            current: 0,
        })
    }

    /// Both buffers start dead.
    pub fn dead(rows: usize, cols: usize) -> Result<Self> {
        Self::new(Grid::dead(rows, cols)?)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn current(&self) -> &[u8] {
        &self.buffers[self.current]
    }

    pub fn current_mut(&mut self) -> &mut [u8] {
        &mut self.buffers[self.current]
    }

    /// `(current, next)`: read the authoritative state, write the scratch one.
    pub fn split(&mut self) -> (&[u8], &mut [u8]) {
        let [a, b] = &mut self.buffers;
        if self.current == 0 {
            (a.as_slice(), b.as_mut_slice())
        } else {
            (b.as_slice(), a.as_mut_slice())
        }
    }

    pub fn swap(&mut self) {
        self.current ^= 1;
    }

    pub fn snapshot(&self) -> Grid {
        Grid::from_parts(self.rows, self.cols, self.current().to_vec())
    }

    pub fn into_grid(self) -> Grid {
        let [a, b] = self.buffers;
        let data = if self.current == 0 { a } else { b };
        Grid::from_parts(self.rows, self.cols, data)
    }
}
