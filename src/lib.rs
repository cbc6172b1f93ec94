//! Bacteria colony simulation (B3/S23 on a bounded grid) with a sequential
//! reference engine and parallel engines to benchmark against it.

pub mod config;
pub mod error;
pub mod grid;
pub mod implementations;
pub mod io;
pub mod partition;
pub mod rules;

pub use config::SimulationConfig;
pub use error::{BacteriaError, Result};
pub use grid::Grid;
