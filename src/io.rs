//! Text grid format.
//!
//! ```text
//! 3 4
//! .X..
//! ..X.
//! XXX.
//! ```
//!
//! The header holds `rows cols`; cells follow row by row, `X`/`x` alive and
//! `.` dead. Line breaks between cells are ignored, so rows may be wrapped
//! arbitrarily.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{BacteriaError, Result};
use crate::grid::{ALIVE, Grid, cell_count};

pub const SERIAL_SUFFIX: &str = "_serial_out.txt";
pub const PARALLEL_SUFFIX: &str = "_parallel_out.txt";

pub fn parse_grid(input: &str) -> Result<Grid> {
    let (header, body) = input.split_once('\n').unwrap_or((input, ""));
    let mut fields = header.split_whitespace();
    let rows = parse_dimension(fields.next(), "rows")?;
    let cols = parse_dimension(fields.next(), "cols")?;
    if rows <= 0 || cols <= 0 {
        return Err(BacteriaError::InvalidDimensions { rows, cols });
    }
    let (rows, cols) = (to_usize(rows)?, to_usize(cols)?);
    let len = cell_count(rows, cols)?;

    let mut grid = Grid::dead(rows, cols)?;
    let mut filled = 0;
    for ch in body.chars().filter(|&c| c != '\n' && c != '\r') {
        if filled == len {
            break;
        }
        match ch {
            'X' | 'x' => grid.cells_mut()[filled] = ALIVE,
            '.' => {}
            other => {
                return Err(BacteriaError::MalformedInput(format!(
                    "unexpected character {other:?} at cell ({}, {})",
                    filled / cols,
                    filled % cols
                )));
            }
        }
        filled += 1;
    }
    if filled < len {
        return Err(BacteriaError::MalformedInput(format!(
            "unexpected end of data after {filled} of {len} cells"
        )));
    }
    Ok(grid)
}

fn parse_dimension(field: Option<&str>, name: &str) -> Result<i64> {
    let field = field.ok_or_else(|| {
        BacteriaError::MalformedInput(format!("missing {name} in dimension header"))
    })?;
    field
        .parse()
        .map_err(|_| BacteriaError::MalformedInput(format!("invalid {name}: {field:?}")))
}

fn to_usize(value: i64) -> Result<usize> {
    usize::try_from(value).map_err(|_| BacteriaError::SizeOverflow {
        rows: usize::MAX,
        cols: usize::MAX,
    })
}

pub fn read_grid(path: impl AsRef<Path>) -> Result<Grid> {
    let input = fs::read_to_string(path)?;
    parse_grid(&input)
}

pub fn write_grid<W: Write>(grid: &Grid, out: &mut W) -> Result<()> {
    writeln!(out, "{} {}", grid.rows(), grid.cols())?;
    write!(out, "{grid}")?;
    Ok(())
}

pub fn save_grid(grid: &Grid, path: impl AsRef<Path>) -> Result<()> {
    let mut out = BufWriter::new(fs::File::create(path)?);
    write_grid(grid, &mut out)?;
    out.flush()?;
    Ok(())
}

/// `dir/name.txt` + `_serial_out.txt` -> `dir/name_serial_out.txt`.
/// Everything after the first `.` of the file name is dropped.
pub fn output_path(input: &Path, suffix: &str) -> PathBuf {
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = name.split('.').next().unwrap_or_default();
    input.with_file_name(format!("{stem}{suffix}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_wrapped_rows() {
        let grid = parse_grid("2 3\nX.\r\n.x\n.X\n").unwrap();
        assert_eq!(grid.dims(), (2, 3));
        assert_eq!(grid.cells(), &[1, 0, 0, 1, 0, 1]);
    }

    #[test]
    fn ignores_trailing_data() {
        let grid = parse_grid("1 2\nX.\nthis is ignored").unwrap();
        assert_eq!(grid.cells(), &[1, 0]);
    }

    #[test]
    fn rejects_short_body() {
        assert!(matches!(
            parse_grid("2 2\nX.\n."),
            Err(BacteriaError::MalformedInput(_))
        ));
    }

    #[test]
    fn rejects_bad_header() {
        assert!(matches!(
            parse_grid("2\nXX\n"),
            Err(BacteriaError::MalformedInput(_))
        ));
        assert!(matches!(
            parse_grid("two 2\nXX\n"),
            Err(BacteriaError::MalformedInput(_))
        ));
        assert!(matches!(
            parse_grid("0 2\n"),
            Err(BacteriaError::InvalidDimensions { rows: 0, cols: 2 })
        ));
        assert!(matches!(
            parse_grid("-3 2\n"),
            Err(BacteriaError::InvalidDimensions { rows: -3, .. })
        ));
    }

    #[test]
    fn rejects_unknown_cell_characters() {
        assert!(matches!(
            parse_grid("1 3\nX?.\n"),
            Err(BacteriaError::MalformedInput(_))
        ));
    }

    #[test]
    fn written_grid_parses_back() {
        let grid = Grid::from_rows(&[".X.", "XXX"]).unwrap();
        let mut out = Vec::new();
        write_grid(&grid, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "2 3\n.X.\nXXX\n");
        assert_eq!(parse_grid(&text).unwrap(), grid);
    }

    #[test]
    fn output_names_follow_input_stem() {
        assert_eq!(
            output_path(Path::new("data/bacteria1000.txt"), SERIAL_SUFFIX),
            PathBuf::from("data/bacteria1000_serial_out.txt")
        );
        assert_eq!(
            output_path(Path::new("colony.v2.txt"), PARALLEL_SUFFIX),
            PathBuf::from("colony_parallel_out.txt")
        );
        assert_eq!(
            output_path(Path::new("plain"), SERIAL_SUFFIX),
            PathBuf::from("plain_serial_out.txt")
        );
    }
}
