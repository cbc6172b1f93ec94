use crate::error::Result;
use crate::grid::Grid;

/// A simulation engine owns its grid for the whole run:
/// construct, `run` any number of generations, then read the result back.
pub trait Engine {
    fn name(&self) -> &'static str;

    /// Advances exactly `generations` generations.
    fn run(&mut self, generations: usize) -> Result<()>;

    /// Generations completed so far.
    fn generation(&self) -> usize;

    /// Copy of the current authoritative grid.
    fn snapshot(&self) -> Grid;

    fn into_grid(self) -> Grid
    where
        Self: Sized;
}
