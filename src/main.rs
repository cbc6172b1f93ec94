use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use bacteria_rust::config::{DEFAULT_WORKERS, SimulationConfig};
use bacteria_rust::implementations::{
    BarrierEngine, DistributedEngine, Engine, RayonEngine, SequentialEngine,
};
use bacteria_rust::io::{self, PARALLEL_SUFFIX, SERIAL_SUFFIX};
use bacteria_rust::{Grid, Result};
use clap::{Parser, ValueEnum};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum EngineKind {
    /// Threads on one shared grid pair, barrier synchronised
    Shared,
    /// Private partitions exchanging halo rows over channels
    Distributed,
    /// Rayon row-parallel loop
    Rayon,
    /// Every parallel engine in turn
    All,
}

impl EngineKind {
    fn expand(self) -> Vec<EngineKind> {
        match self {
            EngineKind::All => vec![EngineKind::Shared, EngineKind::Distributed, EngineKind::Rayon],
            kind => vec![kind],
        }
    }

    fn label(self) -> &'static str {
        match self {
            EngineKind::Shared => "shared",
            EngineKind::Distributed => "distributed",
            EngineKind::Rayon => "rayon",
            EngineKind::All => "all",
        }
    }
}

/// Bacteria colony simulation: sequential ground truth against a parallel engine
#[derive(Parser)]
#[command(name = "bacteria", version)]
struct Cli {
    /// Initial grid file (`rows cols` header, then X/. cells)
    input: PathBuf,

    /// Number of generations to simulate
    #[arg(allow_negative_numbers = true)]
    generations: i64,

    /// Worker threads (shared, rayon) or ranks (distributed)
    #[arg(short, long, default_value_t = DEFAULT_WORKERS as i64, allow_negative_numbers = true)]
    workers: i64,

    /// Parallel engine to compare with the sequential one
    #[arg(short, long, value_enum, default_value_t = EngineKind::Shared)]
    engine: EngineKind,

    /// Timed repetitions of each parallel run
    #[arg(long, default_value_t = 1)]
    runs: usize,

    /// Do not write the output grids
    #[arg(long)]
    no_output: bool,
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match run(&cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(2),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Returns whether every parallel result matched the ground truth.
fn run(cli: &Cli) -> Result<bool> {
    let config = SimulationConfig::new(cli.generations, cli.workers)?;
    let runs = cli.runs.max(1);

    let grid = io::read_grid(&cli.input)?;
    println!("Initialize grid size Rows={}, Cols={}", grid.rows(), grid.cols());

    println!("Start Serial with MAXITER={}", config.generations);
    let (ground_truth, serial) = timed(SequentialEngine::new(grid)?, config.generations)?;
    println!("Serial Time {:.6}", serial.as_secs_f64());
    if !cli.no_output {
        save(&ground_truth, &cli.input, SERIAL_SUFFIX)?;
    }

    let kinds = cli.engine.expand();
    let mut all_match = true;
    for &kind in &kinds {
        println!("Start Parallel ({}) with NPROCS={}", kind.label(), config.workers);

        let mut times = Vec::with_capacity(runs);
        let mut result = None;
        for _ in 0..runs {
            // Start every run from the file, never from a previous run's buffers.
            let grid = io::read_grid(&cli.input)?;
            let (out, elapsed) = run_parallel(kind, grid, &config)?;
            times.push(elapsed);
            result = Some(out);
        }
        let Some(result) = result else { continue };

        let stats = Stats::new(times);
        println!(
            "Parallel Time {:.6}  Speedup {:.6}",
            stats.median.as_secs_f64(),
            serial.as_secs_f64() / stats.median.as_secs_f64()
        );
        if runs > 1 {
            stats.print();
        }

        if !cli.no_output {
            let suffix = if kinds.len() > 1 {
                format!("_{}{}", kind.label(), PARALLEL_SUFFIX)
            } else {
                PARALLEL_SUFFIX.to_string()
            };
            save(&result, &cli.input, &suffix)?;
        }

        let mismatches = ground_truth.diff(&result)?;
        if mismatches.is_empty() {
            println!("Parallel version produced the same result");
        } else {
            all_match = false;
            println!(
                "!!! Parallel version produces a different result! \
                 ({} cells differ, first at {:?})",
                mismatches.len(),
                mismatches[0]
            );
        }
    }
    Ok(all_match)
}

fn run_parallel(
    kind: EngineKind,
    grid: Grid,
    config: &SimulationConfig,
) -> Result<(Grid, Duration)> {
    match kind {
        EngineKind::Shared => timed(BarrierEngine::new(grid, config.workers)?, config.generations),
        EngineKind::Distributed => {
            timed(DistributedEngine::new(grid, config.workers)?, config.generations)
        }
        EngineKind::Rayon => timed(RayonEngine::new(grid, config.workers)?, config.generations),
        EngineKind::All => unreachable!("expanded before dispatch"),
    }
}

fn timed<E: Engine>(mut engine: E, generations: usize) -> Result<(Grid, Duration)> {
    let start = Instant::now();
    engine.run(generations)?;
    let elapsed = start.elapsed();
    tracing::info!(engine = engine.name(), ?elapsed, "run finished");
    Ok((engine.into_grid(), elapsed))
}

fn save(grid: &Grid, input: &Path, suffix: &str) -> Result<()> {
    let path = io::output_path(input, suffix);
    io::save_grid(grid, &path)?;
    println!("Grid saved to {}", path.display());
    Ok(())
}

struct Stats {
    min: Duration,
    median: Duration,
    avg: Duration,
    max: Duration,
}

impl Stats {
    fn new(mut times: Vec<Duration>) -> Self {
        times.sort();
        let n = times.len();
        Stats {
            min: times[0],
            median: times[n / 2],
            avg: times.iter().sum::<Duration>() / n as u32,
            max: times[n - 1],
        }
    }

    fn print(&self) {
        println!("  min:    {:?}", self.min);
        println!("  median: {:?}", self.median);
        println!("  avg:    {:?}", self.avg);
        println!("  max:    {:?}", self.max);
    }
}
