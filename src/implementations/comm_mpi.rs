//! MPI communication backend for the distributed engine.
//!
//! Requires the `mpi` feature flag and an MPI installation. Each rank is a
//! separate process; `run_rank` drives it exactly as it drives the in-process
//! threads.
//!
//! # Usage
//!
//! ```ignore
//! let universe = mpi::initialize().expect("MPI init failed");
//! let comm = MpiComm::new(universe.world());
//! ```
//!
//! Sends are blocking standard-mode sends; the halo ordering in
//! `LocalGrid::exchange_halos` keeps them deadlock free even when the MPI
//! library does not buffer.

use mpi::topology::SimpleCommunicator;
use mpi::traits::*;

use super::comm::Comm;
use crate::error::Result;

pub struct MpiComm {
    world: SimpleCommunicator,
}

impl MpiComm {
    pub fn new(world: SimpleCommunicator) -> Self {
        MpiComm { world }
    }

    pub fn world(&self) -> &SimpleCommunicator {
        &self.world
    }

    /// Terminates every rank. A failed rank cannot be recovered from, and the
    /// others would otherwise wait forever on its boundary rows.
    pub fn abort(&self, code: i32) -> ! {
        self.world.abort(code)
    }
}

impl Comm for MpiComm {
    fn rank(&self) -> usize {
        self.world.rank() as usize
    }

    fn num_ranks(&self) -> usize {
        self.world.size() as usize
    }

    fn send(&self, peer: usize, data: &[u8]) -> Result<()> {
        self.world.process_at_rank(peer as i32).send(data);
        Ok(())
    }

    fn receive_into(&self, peer: usize, data: &mut [u8]) -> Result<()> {
        self.world.process_at_rank(peer as i32).receive_into(data);
        Ok(())
    }
}
