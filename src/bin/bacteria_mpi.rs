//! Multi-process run of the distributed engine.
//!
//! Run with: mpirun -np <num_processes> bacteria_mpi <input_file> <num_generations>

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use bacteria_rust::config::SimulationConfig;
use bacteria_rust::implementations::channel::run_rank;
use bacteria_rust::implementations::comm::Comm;
use bacteria_rust::implementations::comm_mpi::MpiComm;
use bacteria_rust::implementations::sequential;
use bacteria_rust::io::{self, PARALLEL_SUFFIX, SERIAL_SUFFIX};
use bacteria_rust::partition::Partitioning;
use bacteria_rust::{Grid, Result};
use clap::Parser;
use mpi::traits::*;

/// Bacteria colony simulation across MPI ranks
#[derive(Parser)]
#[command(name = "bacteria_mpi", version)]
struct Cli {
    /// Initial grid file
    input: PathBuf,

    /// Number of generations to simulate
    #[arg(allow_negative_numbers = true)]
    generations: i64,
}

/// State only the coordinator holds.
struct Coordinator {
    grid: Grid,
    ground_truth: Grid,
    serial: Duration,
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let Some(universe) = mpi::initialize() else {
        eprintln!("Error: MPI initialisation failed");
        std::process::exit(1);
    };
    let comm = MpiComm::new(universe.world());

    let config = match SimulationConfig::new(cli.generations, comm.num_ranks() as i64) {
        Ok(config) => config,
        Err(e) => {
            if comm.rank() == 0 {
                eprintln!("Error: {}", e);
            }
            return;
        }
    };

    if let Err(e) = run(&cli, &comm, &config) {
        eprintln!("Rank {}: {}", comm.rank(), e);
        comm.abort(1);
    }
}

fn run(cli: &Cli, comm: &MpiComm, config: &SimulationConfig) -> Result<()> {
    let mut coordinator = if comm.rank() == 0 {
        Some(run_serial(cli, config)?)
    } else {
        None
    };

    let mut dims = [0u64; 2];
    if let Some(c) = &coordinator {
        dims = [c.grid.rows() as u64, c.grid.cols() as u64];
        println!("Start Parallel with NPROCS={}", comm.num_ranks());
    }
    let start = Instant::now();

    comm.world().process_at_rank(0).broadcast_into(&mut dims[..]);
    let (rows, cols) = (dims[0] as usize, dims[1] as usize);
    let partitioning = Partitioning::new(rows, comm.num_ranks())?;

    comm.world().barrier();
    run_rank(
        comm,
        &partitioning,
        cols,
        config.generations,
        coordinator.as_mut().map(|c| &mut c.grid),
    )?;
    comm.world().barrier();

    if let Some(c) = &coordinator {
        let parallel = start.elapsed();
        println!(
            "Parallel Time {:.6}  Speedup {:.6}",
            parallel.as_secs_f64(),
            c.serial.as_secs_f64() / parallel.as_secs_f64()
        );
        save(&c.grid, &cli.input, PARALLEL_SUFFIX)?;
        if c.grid.matches(&c.ground_truth) {
            println!("Parallel version produced the same result");
        } else {
            println!("!!! Parallel version produces a different result!");
        }
    }
    Ok(())
}

fn run_serial(cli: &Cli, config: &SimulationConfig) -> Result<Coordinator> {
    let grid = io::read_grid(&cli.input)?;
    println!("Initialize grid size Rows={}, Cols={}", grid.rows(), grid.cols());

    println!("Start Serial with MAXITER={}", config.generations);
    let start = Instant::now();
    let ground_truth = sequential(grid, config.generations)?;
    let serial = start.elapsed();
    println!("Serial Time {:.6}", serial.as_secs_f64());
    save(&ground_truth, &cli.input, SERIAL_SUFFIX)?;

    let grid = io::read_grid(&cli.input)?;
    Ok(Coordinator {
        grid,
        ground_truth,
        serial,
    })
}

fn save(grid: &Grid, input: &Path, suffix: &str) -> Result<()> {
    let path = io::output_path(input, suffix);
    io::save_grid(grid, &path)?;
    println!("Grid saved to {}", path.display());
    Ok(())
}
