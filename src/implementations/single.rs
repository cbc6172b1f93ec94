use crate::error::Result;
use crate::grid::{DoubleBuffer, Grid};
use crate::implementations::engine::Engine;
use crate::rules::step_rows;

/// Single-threaded reference engine; its output is the ground truth.
pub struct SequentialEngine {
    buffers: DoubleBuffer,
    generation: usize,
}

impl SequentialEngine {
    pub fn new(grid: Grid) -> Result<Self> {
        Ok(SequentialEngine {
            buffers: DoubleBuffer::new(grid)?,
            generation: 0,
        })
    }

    pub fn step(&mut self) {
        let (rows, cols) = (self.buffers.rows(), self.buffers.cols());
        let (src, dst) = self.buffers.split();
        step_rows(src, dst, rows, cols, 0..rows);
        self.buffers.swap();
        self.generation += 1;
    }
}

impl Engine for SequentialEngine {
    fn name(&self) -> &'static str {
        "sequential"
    }

    fn run(&mut self, generations: usize) -> Result<()> {
        let _span = tracing::info_span!(
            "sequential",
            rows = self.buffers.rows(),
            cols = self.buffers.cols(),
            generations
        )
        .entered();

        for _ in 0..generations {
            self.step();
            tracing::trace!(generation = self.generation, "generation done");
        }
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

pub fn sequential(grid: Grid, generations: usize) -> Result<Grid> {
    let mut engine = SequentialEngine::new(grid)?;
    engine.run(generations)?;
    Ok(engine.into_grid())
}
