use thiserror::Error;

#[derive(Debug, Error)]
pub enum BacteriaError {
    #[error("invalid dimensions: rows={rows}, cols={cols} (both must be positive)")]
    InvalidDimensions { rows: i64, cols: i64 },

    #[error("grid size too large: {rows}x{cols} overflows addressable memory")]
    SizeOverflow { rows: usize, cols: usize },

    #[error("memory allocation failed for {bytes} bytes")]
    AllocationFailure { bytes: usize },

    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("dimension mismatch: expected {expected:?}, found {found:?}")]
    DimensionMismatch {
        expected: (usize, usize),
        found: (usize, usize),
    },

    #[error("rank {rank}: peer {peer} disconnected")]
    PeerDisconnected { rank: usize, peer: usize },

    #[error("failed to spawn worker {worker}: {source}")]
    Spawn {
        worker: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("worker panicked: {0}")]
    WorkerPanicked(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BacteriaError>;
