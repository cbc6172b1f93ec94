//! The colony rule: a cell with exactly two live neighbours keeps its state,
//! exactly three is alive next generation, anything else is dead.

use std::ops::Range;
use std::sync::atomic::{AtomicU8, Ordering};

use crate::grid::{ALIVE, DEAD};

/// Read access to a row-major cell buffer.
pub trait CellSource {
    fn state(&self, idx: usize) -> u8;
}

impl CellSource for [u8] {
    #[inline(always)]
    fn state(&self, idx: usize) -> u8 {
        self[idx]
    }
}

// Writers are separated from readers by barriers, so relaxed loads suffice.
impl CellSource for [AtomicU8] {
    #[inline(always)]
    fn state(&self, idx: usize) -> u8 {
        self[idx].load(Ordering::Relaxed)
    }
}

#[inline(always)]
pub fn next_state(neighbors: u8, current: u8) -> u8 {
    match neighbors {
        2 => current,
        3 => ALIVE,
        _ => DEAD,
    }
}

/// Live cells among the 8 Moore neighbours of (i, j). Cells outside
/// `[0, max_rows) x [0, max_cols)` count as dead; there is no wraparound.
#[inline]
pub fn count_neighbors<G: CellSource + ?Sized>(
    grid: &G,
    i: usize,
    j: usize,
    max_rows: usize,
    max_cols: usize,
) -> u8 {
    let mut count = 0;
    for ni in i.saturating_sub(1)..=(i + 1).min(max_rows - 1) {
        for nj in j.saturating_sub(1)..=(j + 1).min(max_cols - 1) {
            if ni == i && nj == j {
                continue;
            }
            count += grid.state(ni * max_cols + nj);
        }
    }
    count
}

#[inline(always)]
pub fn evolve_cell<G: CellSource + ?Sized>(
    src: &G,
    i: usize,
    j: usize,
    rows: usize,
    cols: usize,
) -> u8 {
    next_state(count_neighbors(src, i, j, rows, cols), src.state(i * cols + j))
}

/// Writes the next generation of row `i` into `out`.
pub fn evolve_row<G: CellSource + ?Sized>(
    src: &G,
    out: &mut [u8],
    i: usize,
    rows: usize,
    cols: usize,
) {
    for (j, cell) in out.iter_mut().enumerate() {
        *cell = evolve_cell(src, i, j, rows, cols);
    }
}

/// Writes the next generation of `range` into the same rows of `dst`.
pub fn step_rows(src: &[u8], dst: &mut [u8], rows: usize, cols: usize, range: Range<usize>) {
    for i in range {
        evolve_row(src, &mut dst[i * cols..(i + 1) * cols], i, rows, cols);
    }
}
