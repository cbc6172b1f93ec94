pub mod barrier;
pub mod channel;
pub mod comm;
#[cfg(feature = "mpi")]
pub mod comm_mpi;
pub mod engine;
pub mod rayon_parallel;
pub mod single;

pub use barrier::{BarrierEngine, barrier_parallel};
pub use channel::{DistributedEngine, channel_parallel};
pub use engine::Engine;
pub use rayon_parallel::{RayonEngine, rayon_parallel};
pub use single::{SequentialEngine, sequential};
