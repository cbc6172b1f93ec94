use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::{Barrier, mpsc};
use std::thread;

use crate::error::{BacteriaError, Result};
use crate::grid::{alloc_cells, Grid};
use crate::implementations::engine::Engine;
use crate::partition::plan;
use crate::rules::evolve_cell;

/*
  Shared-memory engine: T worker threads plus the calling thread as coordinator,
  all working on one grid pair.

  Per generation:
  - each worker writes the next state of its own row range into the scratch
    grid (write sets are disjoint, so no locks)
  - barrier A: every worker has finished writing
  - the coordinator alone flips the current/next role tag
  - barrier B: every worker observes the flipped tag before reading again

  Cells are AtomicU8 so the shared grid stays in safe code; the barriers give
  the happens-before edges, so every access is Relaxed.
*/

struct SharedGrids {
    cells: [Vec<AtomicU8>; 2],
    current: AtomicUsize,
}

impl SharedGrids {
    fn new(data: Vec<u8>) -> Result<Self> {
        let len = data.len();
        let scratch = alloc_cells(len)?;
        Ok(SharedGrids {
            cells: [atomic_cells(data), atomic_cells(scratch)],
            current: AtomicUsize::new(0),
        })
    }

    fn current(&self) -> usize {
        self.current.load(Ordering::Acquire)
    }

    /// `(current, next)` for the given role tag.
    fn pair(&self, current: usize) -> (&[AtomicU8], &[AtomicU8]) {
        (&self.cells[current], &self.cells[current ^ 1])
    }

    fn swap(&self) {
        let current = self.current.load(Ordering::Relaxed);
        self.current.store(current ^ 1, Ordering::Release);
    }

    fn to_vec(&self) -> Vec<u8> {
        self.cells[self.current()]
            .iter()
            .map(|c| c.load(Ordering::Relaxed))
            .collect()
    }
}

fn atomic_cells(data: Vec<u8>) -> Vec<AtomicU8> {
    data.into_iter().map(AtomicU8::new).collect()
}

pub struct BarrierEngine {
    rows: usize,
    cols: usize,
    threads: usize,
    stack_size: Option<usize>,
    grids: SharedGrids,
    generation: usize,
}

impl BarrierEngine {
    pub fn new(grid: Grid, threads: usize) -> Result<Self> {
        if threads == 0 {
            return Err(BacteriaError::InvalidConfig(
                "thread count must be positive".into(),
            ));
        }
        let (rows, cols, data) = grid.into_parts();
        Ok(BarrierEngine {
            rows,
            cols,
            threads,
            stack_size: None,
            grids: SharedGrids::new(data)?,
            generation: 0,
        })
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Stack size for the worker threads, in bytes. Defaults to the std
    /// default.
    pub fn stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = Some(bytes);
        self
    }
}

impl Engine for BarrierEngine {
    fn name(&self) -> &'static str {
        "shared-memory"
    }

    fn run(&mut self, generations: usize) -> Result<()> {
        let (rows, cols, threads) = (self.rows, self.cols, self.threads);
        let _span = tracing::info_span!("barrier", rows, cols, threads, generations).entered();

        let ranges = plan(rows, threads);
        let compute_done = Barrier::new(threads + 1);
        let swapped = Barrier::new(threads + 1);
        let stack_size = self.stack_size;
        let grids = &self.grids;

        thread::scope(|scope| {
            // Workers wait at a start gate until all of them exist. If any
            // spawn fails the gates are dropped and nobody enters a barrier.
            let mut gates = Vec::with_capacity(threads);
            let mut handles = Vec::with_capacity(threads);
            for (index, &range) in ranges.iter().enumerate() {
                let (open, gate) = mpsc::sync_channel::<()>(1);
                let compute_done = &compute_done;
                let swapped = &swapped;
                let mut builder = thread::Builder::new().name(format!("barrier-worker-{index}"));
                if let Some(bytes) = stack_size {
                    builder = builder.stack_size(bytes);
                }
                let spawned = builder.spawn_scoped(scope, move || {
                    if gate.recv().is_err() {
                        return;
                    }
                    for _generation in 0..generations {
                        let (src, dst) = grids.pair(grids.current());
                        for i in range.rows() {
                            for j in 0..cols {
                                let next = evolve_cell(src, i, j, rows, cols);
                                dst[i * cols + j].store(next, Ordering::Relaxed);
                            }
                        }
                        compute_done.wait();
                        swapped.wait();
                    }
                });
                match spawned {
                    Ok(handle) => {
                        gates.push(open);
                        handles.push(handle);
                    }
                    Err(source) => {
                        drop(gates);
                        for handle in handles {
                            let _ = handle.join();
                        }
                        return Err(BacteriaError::Spawn {
                            worker: index,
                            source,
                        });
                    }
                }
            }

            // Every worker is parked in `recv`, so its receiver is alive and
            // the buffered send cannot fail.
            for open in gates {
                let _ = open.send(());
            }

            for generation in 0..generations {
                compute_done.wait();
                grids.swap();
                swapped.wait();
                tracing::trace!(generation = generation + 1, "swapped");
            }

            for handle in handles {
                handle
                    .join()
                    .map_err(|_| BacteriaError::WorkerPanicked("barrier worker".into()))?;
            }
            Ok::<(), BacteriaError>(())
        })?;

        self.generation += generations;
        Ok(())
    }

    fn generation(&self) -> usize {
        self.generation
    }

    fn snapshot(&self) -> Grid {
        Grid::from_parts(self.rows, self.cols, self.grids.to_vec())
    }

    fn into_grid(self) -> Grid {
        self.snapshot()
    }
}

pub fn barrier_parallel(grid: Grid, generations: usize, threads: usize) -> Result<Grid> {
    let mut engine = BarrierEngine::new(grid, threads)?;
    engine.run(generations)?;
    Ok(engine.into_grid())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::implementations::single::sequential;

    #[test]
    fn rejects_zero_threads() {
        let grid = Grid::dead(2, 2).unwrap();
        assert!(matches!(
            BarrierEngine::new(grid, 0),
            Err(BacteriaError::InvalidConfig(_))
        ));
    }

    #[test]
    fn matches_sequential_on_blinker() {
        let blinker = Grid::from_rows(&[".....", "..X..", "..X..", "..X..", "....."]).unwrap();
        for threads in 1..=5 {
            let expected = sequential(blinker.clone(), 3).unwrap();
            let result = barrier_parallel(blinker.clone(), 3, threads).unwrap();
            assert_eq!(result, expected, "threads={threads}");
        }
    }

    #[test]
    fn runs_accumulate_generations() {
        let glider = Grid::from_rows(&[
            ".X....", "..X...", "XXX...", "......", "......", "......",
        ])
        .unwrap();
        let mut engine = BarrierEngine::new(glider.clone(), 3).unwrap();
        engine.run(2).unwrap();
        engine.run(3).unwrap();
        assert_eq!(engine.generation(), 5);
        assert_eq!(engine.into_grid(), sequential(glider, 5).unwrap());
    }

    #[test]
    fn failed_spawn_is_reported_not_hung() {
        // No address space can hold a stack this large, so every spawn fails.
        let grid = Grid::from_rows(&["X.X", ".X.", "X.X"]).unwrap();
        let mut engine = BarrierEngine::new(grid.clone(), 4)
            .unwrap()
            .stack_size(usize::MAX / 4);
        assert!(matches!(
            engine.run(2),
            Err(BacteriaError::Spawn { worker: 0, .. })
        ));
        assert_eq!(engine.generation(), 0);
        assert_eq!(engine.into_grid(), grid);
    }

    #[test]
    fn idle_threads_still_reach_barriers() {
        let grid = Grid::from_rows(&["XX", "X."]).unwrap();
        let result = barrier_parallel(grid.clone(), 4, 6).unwrap();
        assert_eq!(result, sequential(grid, 4).unwrap());
    }
}
