//! Static row decomposition shared by the parallel engines.
//!
//! Worker `p` of `n` owns rows `[p*R/n, (p+1)*R/n)`. Ranges are contiguous,
//! disjoint, cover `[0, R)` and differ in size by at most one row. With more
//! workers than rows some ranges are empty.

use std::ops::Range;

use crate::error::{BacteriaError, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RowRange {
    pub start: usize,
    pub end: usize,
}

impl RowRange {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn rows(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// Row range owned by `worker`. `num_workers` must be non-zero; `plan` and
/// `Partitioning::new` are the public entry points.
pub(crate) fn row_range(worker: usize, total_rows: usize, num_workers: usize) -> RowRange {
    // Widen so p * R cannot overflow.
    let bound = |p: usize| (p as u128 * total_rows as u128 / num_workers as u128) as usize;
    RowRange {
        start: bound(worker),
        end: bound(worker + 1),
    }
}

pub fn plan(total_rows: usize, num_workers: usize) -> Vec<RowRange> {
    (0..num_workers)
        .map(|p| row_range(p, total_rows, num_workers))
        .collect()
}

/// A plan plus the halo links between neighbouring non-empty partitions.
#[derive(Clone, Debug)]
pub struct Partitioning {
    total_rows: usize,
    ranges: Vec<RowRange>,
}

impl Partitioning {
    pub fn new(total_rows: usize, num_workers: usize) -> Result<Self> {
        if num_workers == 0 {
            return Err(BacteriaError::InvalidConfig(
                "worker count must be positive".into(),
            ));
        }
        let ranges = plan(total_rows, num_workers);
        tracing::debug!(total_rows, num_workers, ?ranges, "row partition planned");
        Ok(Partitioning { total_rows, ranges })
    }

    pub fn total_rows(&self) -> usize {
        self.total_rows
    }

    pub fn num_workers(&self) -> usize {
        self.ranges.len()
    }

    pub fn ranges(&self) -> &[RowRange] {
        &self.ranges
    }

    pub fn range(&self, worker: usize) -> RowRange {
        self.ranges[worker]
    }

    /// Nearest worker above `worker` that owns rows. Empty workers have no links.
    pub fn upper_neighbor(&self, worker: usize) -> Option<usize> {
        if self.ranges[worker].is_empty() {
            return None;
        }
        (0..worker).rev().find(|&p| !self.ranges[p].is_empty())
    }

    /// Nearest worker below `worker` that owns rows. Empty workers have no links.
    pub fn lower_neighbor(&self, worker: usize) -> Option<usize> {
        if self.ranges[worker].is_empty() {
            return None;
        }
        (worker + 1..self.ranges.len()).find(|&p| !self.ranges[p].is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ten_rows_four_workers() {
        let ranges: Vec<_> = plan(10, 4).iter().map(|r| (r.start, r.end)).collect();
        assert_eq!(ranges, vec![(0, 2), (2, 5), (5, 7), (7, 10)]);
    }

    #[test]
    fn ranges_cover_rows_exactly() {
        for rows in 1..=40 {
            for workers in 1..=48 {
                let ranges = plan(rows, workers);
                assert_eq!(ranges.len(), workers);
                assert_eq!(ranges[0].start, 0);
                assert_eq!(ranges[workers - 1].end, rows);
                for pair in ranges.windows(2) {
                    assert_eq!(pair[0].end, pair[1].start, "rows={rows} workers={workers}");
                }
                let min = ranges.iter().map(RowRange::len).min().unwrap();
                let max = ranges.iter().map(RowRange::len).max().unwrap();
                assert!(max - min <= 1, "rows={rows} workers={workers}");
                assert_eq!(ranges.iter().map(RowRange::len).sum::<usize>(), rows);
            }
        }
    }

    #[test]
    fn more_workers_than_rows_yields_empty_ranges() {
        let ranges = plan(3, 5);
        assert_eq!(ranges.iter().filter(|r| r.is_empty()).count(), 2);
        assert_eq!(ranges.iter().map(RowRange::len).sum::<usize>(), 3);
    }

    #[test]
    fn zero_workers_plan_is_empty() {
        assert!(plan(5, 0).is_empty());
    }

    #[test]
    fn large_counts_do_not_overflow() {
        let r = row_range(3, usize::MAX / 2, 4);
        assert!(r.start < r.end);
    }

    #[test]
    fn neighbours_skip_empty_partitions() {
        // 3 rows over 5 workers: [0,0) [0,1) [1,1) [1,2) [2,3)
        let parts = Partitioning::new(3, 5).unwrap();
        assert!(parts.range(0).is_empty());
        assert_eq!(parts.upper_neighbor(1), None);
        assert_eq!(parts.lower_neighbor(1), Some(3));
        assert_eq!(parts.upper_neighbor(3), Some(1));
        assert_eq!(parts.lower_neighbor(3), Some(4));
        assert_eq!(parts.lower_neighbor(4), None);
        assert_eq!(parts.upper_neighbor(2), None);
        assert_eq!(parts.lower_neighbor(2), None);
    }

    #[test]
    fn zero_workers_rejected() {
        assert!(matches!(
            Partitioning::new(4, 0),
            Err(BacteriaError::InvalidConfig(_))
        ));
    }
}
