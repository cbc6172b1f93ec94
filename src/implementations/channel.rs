use std::thread;

use crate::error::{BacteriaError, Result};
use crate::grid::{DoubleBuffer, Grid};
use crate::implementations::comm::{ChannelComm, Comm};
use crate::implementations::engine::Engine;
use crate::partition::{Partitioning, RowRange};
use crate::rules::step_rows;

/*
  Distributed engine: every rank holds only its own rows plus two halo rows.

  Local layout (local_rows + 2 rows):
    row 0                 halo, copy of the upper neighbour's last row
    rows 1..=local_rows   owned rows
    row local_rows + 1    halo, copy of the lower neighbour's first row

  Halos facing the global top/bottom edge are never written and stay dead.
  Per generation each rank exchanges boundary rows with its neighbours and
  then steps and swaps its own buffers; there is no global barrier.
*/

/// One rank's partition with halo rows, double buffered.
pub struct LocalGrid {
    owned: RowRange,
    cols: usize,
    buffers: DoubleBuffer,
}

impl LocalGrid {
    pub fn new(owned: RowRange, cols: usize) -> Result<Self> {
        let total_rows = owned
            .len()
            .checked_add(2)
            .ok_or(BacteriaError::SizeOverflow {
                rows: owned.len(),
                cols,
            })?;
        Ok(LocalGrid {
            owned,
            cols,
            buffers: DoubleBuffer::dead(total_rows, cols)?,
        })
    }

    pub fn owned(&self) -> RowRange {
        self.owned
    }

    pub fn local_rows(&self) -> usize {
        self.owned.len()
    }

    /// Owned rows of the current buffer, halos excluded.
    pub fn owned_cells(&self) -> &[u8] {
        let cols = self.cols;
        &self.buffers.current()[cols..(self.local_rows() + 1) * cols]
    }

    pub fn owned_cells_mut(&mut self) -> &mut [u8] {
        let (cols, local_rows) = (self.cols, self.local_rows());
        &mut self.buffers.current_mut()[cols..(local_rows + 1) * cols]
    }

    pub fn row(&self, local: usize) -> &[u8] {
        &self.buffers.current()[local * self.cols..(local + 1) * self.cols]
    }

    fn row_mut(&mut self, local: usize) -> &mut [u8] {
        let cols = self.cols;
        &mut self.buffers.current_mut()[local * cols..(local + 1) * cols]
    }

    /// Refreshes both halo rows from the neighbouring ranks.
    ///
    /// Upward link: send first, then receive. Downward link: receive first,
    /// then send. With blocking sends this ordering lets the chain of ranks
    /// drain from the top instead of every rank waiting on a receive.
    pub fn exchange_halos<C: Comm>(
        &mut self,
        comm: &C,
        upper: Option<usize>,
        lower: Option<usize>,
    ) -> Result<()> {
        let last = self.local_rows();
        if let Some(peer) = upper {
            comm.send(peer, self.row(1))?;
            comm.receive_into(peer, self.row_mut(0))?;
        }
        if let Some(peer) = lower {
            comm.receive_into(peer, self.row_mut(last + 1))?;
            comm.send(peer, self.row(last))?;
        }
        Ok(())
    }

    /// Computes the next generation of the owned rows and swaps buffers.
    pub fn step(&mut self) {
        let (rows, cols) = (self.buffers.rows(), self.cols);
        let (src, dst) = self.buffers.split();
        step_rows(src, dst, rows, cols, 1..rows - 1);
        self.buffers.swap();
    }
}

/// The per-rank routine: scatter, `generations` exchange/step rounds, gather.
///
/// Rank 0 is the coordinator and must pass the full grid; it receives the
/// gathered result in place. Other ranks pass `None`.
pub fn run_rank<C: Comm>(
    comm: &C,
    partitioning: &Partitioning,
    cols: usize,
    generations: usize,
    grid: Option<&mut Grid>,
) -> Result<()> {
    let rank = comm.rank();
    let owned = partitioning.range(rank);
    let _span = tracing::debug_span!("rank", rank, start = owned.start, end = owned.end).entered();

    let mut local = LocalGrid::new(owned, cols)?;
    let upper = partitioning.upper_neighbor(rank);
    let lower = partitioning.lower_neighbor(rank);

    let mut grid = match (rank, grid) {
        (0, Some(grid)) => Some(grid),
        (0, None) => {
            return Err(BacteriaError::InvalidConfig(
                "coordinator rank requires the full grid".into(),
            ));
        }
        (_, Some(_)) => {
            return Err(BacteriaError::InvalidConfig(format!(
                "rank {rank} is not the coordinator and must not hold the grid"
            )));
        }
        (_, None) => None,
    };

    // Scatter.
    if let Some(grid) = grid.as_deref() {
        if grid.dims() != (partitioning.total_rows(), cols) {
            return Err(BacteriaError::DimensionMismatch {
                expected: (partitioning.total_rows(), cols),
                found: grid.dims(),
            });
        }
        local
            .owned_cells_mut()
            .copy_from_slice(&grid.cells()[owned.start * cols..owned.end * cols]);
        for (peer, range) in partitioning.ranges().iter().enumerate().skip(1) {
            if !range.is_empty() {
                comm.send(peer, &grid.cells()[range.start * cols..range.end * cols])?;
            }
        }
    } else if !owned.is_empty() {
        comm.receive_into(0, local.owned_cells_mut())?;
    }

    if !owned.is_empty() {
        for generation in 0..generations {
            local.exchange_halos(comm, upper, lower)?;
            local.step();
            tracing::trace!(rank, generation = generation + 1, "generation done");
        }
    }

    // Gather.
    if let Some(grid) = grid.as_deref_mut() {
        grid.cells_mut()[owned.start * cols..owned.end * cols].copy_from_slice(local.owned_cells());
        for (peer, range) in partitioning.ranges().iter().enumerate().skip(1) {
            if !range.is_empty() {
                let slot = &mut grid.cells_mut()[range.start * cols..range.end * cols];
                comm.receive_into(peer, slot)?;
            }
        }
    } else if !owned.is_empty() {
        comm.send(0, local.owned_cells())?;
    }

    tracing::debug!(rank, "rank finished");
    Ok(())
}

/// Distributed engine with one thread per rank, linked by `ChannelComm`.
/// The calling thread runs rank 0.
pub struct DistributedEngine {
    grid: Grid,
    workers: usize,
    generation: usize,
}

impl DistributedEngine {
    pub fn new(grid: Grid, workers: usize) -> Result<Self> {
        if workers == 0 {
            return Err(BacteriaError::InvalidConfig(
                "worker count must be positive".into(),
            ));
        }
        Ok(DistributedEngine {
            grid,
            workers,
            generation: 0,
        })
    }

    pub fn workers(&self) -> usize {
        self.workers
    }
}

impl Engine for DistributedEngine {
    fn name(&self) -> &'static str {
        "distributed"
    }

    fn run(&mut self, generations: usize) -> Result<()> {
        let (rows, cols) = self.grid.dims();
        let workers = self.workers;
        let _span = tracing::info_span!("distributed", rows, cols, workers, generations).entered();

        let partitioning = Partitioning::new(rows, workers)?;
        let mut comms = ChannelComm::for_partitioning(&partitioning).into_iter();
        let coordinator = comms.next().ok_or_else(|| {
            BacteriaError::InvalidConfig("worker count must be positive".into())
        })?;
        // Ranks without rows have no links and nothing to do.
        let comms: Vec<_> = comms
            .filter(|comm| !partitioning.range(comm.rank()).is_empty())
            .collect();
        let grid = &mut self.grid;
        let partitioning = &partitioning;

        let results = thread::scope(|scope| {
            let mut handles = Vec::with_capacity(comms.len());
            let mut spawn_error = None;
            for comm in comms {
                let rank = comm.rank();
                let spawned = thread::Builder::new()
                    .name(format!("rank-{rank}"))
                    .spawn_scoped(scope, move || {
                        run_rank(&comm, partitioning, cols, generations, None)
                    });
                match spawned {
                    Ok(handle) => handles.push(handle),
                    Err(source) => {
                        spawn_error = Some(BacteriaError::Spawn {
                            worker: rank,
                            source,
                        });
                        break;
                    }
                }
            }

            // The coordinator's links must close before joining, so that a
            // failure here unblocks every other rank.
            let mut results = Vec::with_capacity(handles.len() + 1);
            match spawn_error {
                Some(err) => {
                    drop(coordinator);
                    results.push(Err(err));
                }
                None => {
                    let comm = coordinator;
                    results.push(run_rank(&comm, partitioning, cols, generations, Some(grid)));
                }
            }
            for handle in handles {
                results.push(handle.join().unwrap_or_else(|_| {
                    Err(BacteriaError::WorkerPanicked("distributed rank".into()))
                }));
            }
            results
        });

        first_failure(results)?;
        self.generation += generations;
        Ok(())
    }

    fn generation(&self) -> usize {
        self.generation
    }

    fn snapshot(&self) -> Grid {
        self.grid.clone()
    }

    fn into_grid(self) -> Grid {
        self.grid
    }
}

/// Reports the root cause of a failed run: disconnections are only the
/// other ranks noticing that some rank aborted.
fn first_failure(results: Vec<Result<()>>) -> Result<()> {
    let mut disconnected = None;
    for result in results {
        match result {
            Ok(()) => {}
            Err(err @ BacteriaError::PeerDisconnected { .. }) => {
                disconnected.get_or_insert(err);
            }
            Err(err) => return Err(err),
        }
    }
    match disconnected {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

pub fn channel_parallel(grid: Grid, generations: usize, workers: usize) -> Result<Grid> {
    let mut engine = DistributedEngine::new(grid, workers)?;
    engine.run(generations)?;
    Ok(engine.into_grid())
}
