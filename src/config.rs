use crate::error::{BacteriaError, Result};

pub const DEFAULT_WORKERS: usize = 2;

/// Validated run parameters: generation count (MAXITER) and worker count.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SimulationConfig {
    pub generations: usize,
    pub workers: usize,
}

impl SimulationConfig {
    /// Accepts signed values so that negative command-line input is rejected
    /// here rather than wrapping.
    pub fn new(generations: i64, workers: i64) -> Result<Self> {
        Ok(SimulationConfig {
            generations: positive("generations", generations)?,
            workers: positive("workers", workers)?,
        })
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            generations: 1,
            workers: DEFAULT_WORKERS,
        }
    }
}

fn positive(name: &str, value: i64) -> Result<usize> {
    if value <= 0 {
        return Err(BacteriaError::InvalidConfig(format!(
            "{name} must be a positive integer, got {value}"
        )));
    }
    usize::try_from(value)
        .map_err(|_| BacteriaError::InvalidConfig(format!("{name} is too large: {value}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_positive_values() {
        let config = SimulationConfig::new(250, 3).unwrap();
        assert_eq!(config.generations, 250);
        assert_eq!(config.workers, 3);
    }

    #[test]
    fn rejects_non_positive_values() {
        for (generations, workers) in [(0, 2), (-5, 2), (10, 0), (10, -1)] {
            assert!(
                matches!(
                    SimulationConfig::new(generations, workers),
                    Err(BacteriaError::InvalidConfig(_))
                ),
                "generations={generations} workers={workers}"
            );
        }
    }
}
