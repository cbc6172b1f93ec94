use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::error::{BacteriaError, Result};
use crate::grid::{DoubleBuffer, Grid};
use crate::implementations::engine::Engine;
use crate::rules::evolve_row;

// Each row of the scratch buffer is a separate chunk, so rayon can hand rows
// to any thread without locking; the swap happens after the parallel loop.
pub struct RayonEngine {
    buffers: DoubleBuffer,
    pool: ThreadPool,
    generation: usize,
}

impl RayonEngine {
    pub fn new(grid: Grid, threads: usize) -> Result<Self> {
        if threads == 0 {
            return Err(BacteriaError::InvalidConfig(
                "thread count must be positive".into(),
            ));
        }
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("bacteria-rayon-{i}"))
            .build()
            .map_err(|e| BacteriaError::InvalidConfig(format!("rayon pool: {e}")))?;
        Ok(RayonEngine {
            buffers: DoubleBuffer::new(grid)?,
            pool,
            generation: 0,
        })
    }
}

impl Engine for RayonEngine {
    fn name(&self) -> &'static str {
        "rayon"
    }

    fn run(&mut self, generations: usize) -> Result<()> {
        let (rows, cols) = (self.buffers.rows(), self.buffers.cols());
        let _span = tracing::info_span!(
            "rayon",
            rows,
            cols,
            threads = self.pool.current_num_threads(),
            generations
        )
        .entered();

        let buffers = &mut self.buffers;
        self.pool.install(|| {
            for _ in 0..generations {
                let (src, dst) = buffers.split();
                dst.par_chunks_mut(cols)
                    .enumerate()
                    .for_each(|(i, row)| evolve_row(src, row, i, rows, cols));
                buffers.swap();
            }
        });
        self.generation += generations;
        Ok(())
    }

    fn generation(&self) -> usize {
        self.generation
    }

    fn snapshot(&self) -> Grid {
        self.buffers.snapshot()
    }

    fn into_grid(self) -> Grid {
        self.buffers.into_grid()
    }
}

pub fn rayon_parallel(grid: Grid, generations: usize, threads: usize) -> Result<Grid> {
    let mut engine = RayonEngine::new(grid, threads)?;
    engine.run(generations)?;
    Ok(engine.into_grid())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::implementations::single::sequential;

    #[test]
    fn matches_sequential_on_glider() {
        let glider = Grid::from_rows(&[
            ".X....", "..X...", "XXX...", "......", "......", "......",
        ])
        .unwrap();
        for threads in [1, 2, 4] {
            let result = rayon_parallel(glider.clone(), 6, threads).unwrap();
            assert_eq!(result, sequential(glider.clone(), 6).unwrap(), "threads={threads}");
        }
    }
}
