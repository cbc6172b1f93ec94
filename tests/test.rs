use bacteria_rust::implementations::{
    BarrierEngine, DistributedEngine, Engine, RayonEngine, SequentialEngine,
};
use bacteria_rust::{BacteriaError, Grid, io};

const GLIDER: [&str; 5] = [".X...", "..X..", "XXX..", ".....", "....."];

/// Runs every engine on the same input and returns the results, sequential first.
fn run_all(initial: &Grid, generations: usize, workers: usize) -> Vec<(&'static str, Grid)> {
    let mut engines: Vec<Box<dyn FnOnce() -> (&'static str, Grid)>> = Vec::new();
    let g = initial.clone();
    engines.push(Box::new(move || finish(SequentialEngine::new(g).unwrap(), generations)));
    let g = initial.clone();
    engines.push(Box::new(move || finish(BarrierEngine::new(g, workers).unwrap(), generations)));
    let g = initial.clone();
    engines.push(Box::new(move || {
        finish(DistributedEngine::new(g, workers).unwrap(), generations)
    }));
    let g = initial.clone();
    engines.push(Box::new(move || finish(RayonEngine::new(g, workers).unwrap(), generations)));
    engines.into_iter().map(|run| run()).collect()
}

fn finish<E: Engine>(mut engine: E, generations: usize) -> (&'static str, Grid) {
    engine.run(generations).unwrap();
    assert_eq!(engine.generation(), generations);
    (engine.name(), engine.into_grid())
}

#[test]
fn test_glider_two_workers() {
    let initial = Grid::from_rows(&GLIDER).unwrap();
    let expected = Grid::from_rows(&[".....", "..X..", "...X.", ".XXX.", "....."]).unwrap();

    for (name, result) in run_all(&initial, 4, 2) {
        assert_eq!(result, expected, "{name} engine moved the glider wrongly");
    }
}

#[test]
fn test_all_dead_stays_dead() {
    let initial = Grid::dead(3, 3).unwrap();
    for generations in [1, 5, 20] {
        for workers in [1, 2, 3, 7] {
            for (name, result) in run_all(&initial, generations, workers) {
                assert_eq!(result.population(), 0, "{name}: spontaneous birth");
            }
        }
    }
}

#[test]
fn test_lonely_cell_dies() {
    let initial = Grid::from_rows(&["...", ".X.", "..."]).unwrap();
    for workers in [1, 2, 3] {
        for (name, result) in run_all(&initial, 1, workers) {
            assert_eq!(result.population(), 0, "{name} kept a cell with no neighbours");
        }
    }
}

#[test]
fn test_more_workers_than_rows() {
    let initial = Grid::from_rows(&["XX.X", ".XX.", "X..X"]).unwrap();
    let results = run_all(&initial, 6, 8);
    let (_, expected) = &results[0];
    for (name, result) in &results[1..] {
        assert_eq!(result, expected, "{name} with 8 workers on 3 rows");
    }
}

#[test]
fn test_restart_from_same_input() {
    let initial = Grid::from_rows(&GLIDER).unwrap();

    let first = run_all(&initial, 9, 3);
    let second = run_all(&initial, 9, 3);
    for ((name, a), (_, b)) in first.iter().zip(&second) {
        assert_eq!(a, b, "{name} is not reproducible");
    }
}

#[test]
fn test_edge_cells_do_not_wrap() {
    // A blinker pressed against the left edge would be fed by the right edge
    // if the grid wrapped around.
    let initial = Grid::from_rows(&["....", "X...", "X...", "X...", "...."]).unwrap();
    let expected = Grid::from_rows(&["....", "....", "XX..", "....", "...."]).unwrap();
    for (name, result) in run_all(&initial, 1, 2) {
        assert_eq!(result, expected, "{name}");
    }
}

#[test]
fn test_engines_reject_zero_workers() {
    let grid = Grid::dead(2, 2).unwrap();
    assert!(matches!(
        BarrierEngine::new(grid.clone(), 0),
        Err(BacteriaError::InvalidConfig(_))
    ));
    assert!(matches!(
        DistributedEngine::new(grid.clone(), 0),
        Err(BacteriaError::InvalidConfig(_))
    ));
    assert!(matches!(
        RayonEngine::new(grid, 0),
        Err(BacteriaError::InvalidConfig(_))
    ));
}

#[test]
fn test_file_round_trip_and_reload() {
    let dir = std::env::temp_dir().join(format!("bacteria_rust_test_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let input = dir.join("glider.txt");
    std::fs::write(&input, "5 5\n.X...\n..X..\nXXX..\n.....\n.....\n").unwrap();

    let loaded = io::read_grid(&input).unwrap();
    assert_eq!(loaded, Grid::from_rows(&GLIDER).unwrap());

    let serial = SequentialEngine::new(loaded).unwrap();
    let (_, ground_truth) = finish(serial, 4);
    let out = io::output_path(&input, io::SERIAL_SUFFIX);
    io::save_grid(&ground_truth, &out).unwrap();
    assert_eq!(out.file_name().unwrap(), "glider_serial_out.txt");
    assert_eq!(io::read_grid(&out).unwrap(), ground_truth);

    std::fs::remove_dir_all(&dir).unwrap();
}
