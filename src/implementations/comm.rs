//! Point-to-point communication for the distributed engine.
//!
//! Provides a trait for blocking, per-link FIFO message passing between ranks
//! and an in-process implementation over rendezvous channels.

use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, SyncSender};

use crate::error::{BacteriaError, Result};
use crate::partition::Partitioning;

/// Blocking point-to-point messaging between ranks.
///
/// Implementations: `ChannelComm` (threads in one process), `MpiComm` (via the
/// mpi crate, `mpi` feature).
pub trait Comm {
    /// This worker's rank.
    fn rank(&self) -> usize;

    /// Total number of ranks.
    fn num_ranks(&self) -> usize;

    /// Send `data` to `peer`, blocking until the peer has taken it.
    fn send(&self, peer: usize, data: &[u8]) -> Result<()>;

    /// Receive the next message from `peer` into `data`, blocking until one
    /// arrives. The message must be exactly `data.len()` bytes.
    fn receive_into(&self, peer: usize, data: &mut [u8]) -> Result<()>;
}

/// In-process backend: one zero-capacity channel per directed link.
///
/// A send completes only when the matching receive runs, the same blocking
/// behaviour as an unbuffered MPI send. Dropping a `ChannelComm` disconnects
/// all of its links, so peers blocked on it fail instead of hanging.
pub struct ChannelComm {
    rank: usize,
    size: usize,
    outbox: HashMap<usize, SyncSender<Vec<u8>>>,
    inbox: HashMap<usize, Receiver<Vec<u8>>>,
}

impl ChannelComm {
    fn endpoints(size: usize) -> Vec<ChannelComm> {
        (0..size)
            .map(|rank| ChannelComm {
                rank,
                size,
                outbox: HashMap::new(),
                inbox: HashMap::new(),
            })
            .collect()
    }

    /// Opens both directions between `a` and `b`.
    fn connect(comms: &mut [ChannelComm], a: usize, b: usize) {
        for (from, to) in [(a, b), (b, a)] {
            let (tx, rx) = mpsc::sync_channel(0);
            comms[from].outbox.insert(to, tx);
            comms[to].inbox.insert(from, rx);
        }
    }

    /// Fully connected set of `size` endpoints, indexed by rank.
    pub fn mesh(size: usize) -> Vec<ChannelComm> {
        let mut comms = Self::endpoints(size);
        for a in 0..size {
            for b in a + 1..size {
                Self::connect(&mut comms, a, b);
            }
        }
        comms
    }

    /// Endpoints with only the links `run_rank` uses: coordinator to every
    /// non-empty rank, and each non-empty rank to its lower neighbour.
    /// Link count is linear in the number of ranks.
    pub fn for_partitioning(partitioning: &Partitioning) -> Vec<ChannelComm> {
        let mut comms = Self::endpoints(partitioning.num_workers());
        for (rank, range) in partitioning.ranges().iter().enumerate().skip(1) {
            if !range.is_empty() {
                Self::connect(&mut comms, 0, rank);
            }
        }
        // Rank 0 already reaches its lower neighbour through the links above.
        for rank in 1..partitioning.num_workers() {
            if let Some(lower) = partitioning.lower_neighbor(rank) {
                Self::connect(&mut comms, rank, lower);
            }
        }
        comms
    }

    fn disconnected(&self, peer: usize) -> BacteriaError {
        BacteriaError::PeerDisconnected {
            rank: self.rank,
            peer,
        }
    }
}

impl Comm for ChannelComm {
    fn rank(&self) -> usize {
        self.rank
    }

    fn num_ranks(&self) -> usize {
        self.size
    }

    fn send(&self, peer: usize, data: &[u8]) -> Result<()> {
        let link = self
            .outbox
            .get(&peer)
            .ok_or_else(|| self.disconnected(peer))?;
        link.send(data.to_vec()).map_err(|_| self.disconnected(peer))
    }

    fn receive_into(&self, peer: usize, data: &mut [u8]) -> Result<()> {
        let link = self
            .inbox
            .get(&peer)
            .ok_or_else(|| self.disconnected(peer))?;
        let message = link.recv().map_err(|_| self.disconnected(peer))?;
        if message.len() != data.len() {
            return Err(BacteriaError::MalformedInput(format!(
                "rank {} expected {} bytes from rank {peer}, got {}",
                self.rank,
                data.len(),
                message.len()
            )));
        }
        data.copy_from_slice(&message);
        Ok(())
    }
}
