use std::path::PathBuf;

use bacteria_rust::io;
use clap::Parser;

/// Compare two grid files cell by cell
#[derive(Parser)]
#[command(name = "grid_diff", version)]
struct Cli {
    /// Ground-truth grid
    expected: PathBuf,

    /// Grid to check
    actual: PathBuf,

    /// Maximum number of differing cells to list
    #[arg(short, long, default_value_t = 10)]
    limit: usize,
}

fn main() {
    let cli = Cli::parse();

    let expected = io::read_grid(&cli.expected).unwrap_or_else(|e| {
        eprintln!("Error reading {}: {}", cli.expected.display(), e);
        std::process::exit(1);
    });
    let actual = io::read_grid(&cli.actual).unwrap_or_else(|e| {
        eprintln!("Error reading {}: {}", cli.actual.display(), e);
        std::process::exit(1);
    });

    let mismatches = expected.diff(&actual).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });

    if mismatches.is_empty() {
        println!("Grids are identical ({}x{})", expected.rows(), expected.cols());
        return;
    }

    println!("{} cells differ", mismatches.len());
    for &(i, j) in mismatches.iter().take(cli.limit) {
        println!(
            "  ({}, {}): expected {}, got {}",
            i,
            j,
            state(expected.is_alive(i, j)),
            state(actual.is_alive(i, j))
        );
    }
    std::process::exit(2);
}

fn state(alive: bool) -> &'static str {
    if alive { "X" } else { "." }
}
