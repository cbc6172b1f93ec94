use std::path::PathBuf;

use bacteria_rust::io;
use bacteria_rust::{Grid, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Write a random initial colony in the text grid format
#[derive(Parser)]
#[command(name = "generate", version)]
struct Cli {
    rows: usize,
    cols: usize,

    /// Output file
    output: PathBuf,

    /// Probability that a cell starts alive
    #[arg(short, long, default_value_t = 0.3)]
    density: f64,

    /// RNG seed, for reproducible inputs
    #[arg(short, long, default_value_t = 42)]
    seed: u64,
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if !(0.0..=1.0).contains(&cli.density) {
        eprintln!("Error: density must be within [0, 1], got {}", cli.density);
        std::process::exit(1);
    }

    let grid = random_grid(cli.rows, cli.cols, cli.density, cli.seed).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });
    io::save_grid(&grid, &cli.output).unwrap_or_else(|e| {
        eprintln!("Error writing {}: {}", cli.output.display(), e);
        std::process::exit(1);
    });
    println!(
        "Wrote {}x{} grid ({} alive) to {}",
        grid.rows(),
        grid.cols(),
        grid.population(),
        cli.output.display()
    );
}

fn random_grid(rows: usize, cols: usize, density: f64, seed: u64) -> Result<Grid> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut grid = Grid::dead(rows, cols)?;
    for cell in grid.cells_mut() {
        *cell = rng.gen_bool(density) as u8;
    }
    Ok(grid)
}
