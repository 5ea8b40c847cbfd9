use super::traits::{Frame, TrajectoryFile};
use crate::core::geometry::pbc::PeriodicCell;
use nalgebra::{Matrix3, Point3};
use std::io::{self, BufRead, Write};
use thiserror::Error;

/// Upper bound on the positions reserved from a frame's declared atom count.
const MAX_PREALLOCATED_ATOMS: usize = 4096;

#[derive(Debug, Error)]
pub enum XyzError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse { line: usize, kind: XyzParseErrorKind },
}

#[derive(Debug, Error, PartialEq)]
pub enum XyzParseErrorKind {
    #[error("Invalid atom count '{0}'")]
    InvalidAtomCount(String),
    #[error("Invalid float '{0}'")]
    InvalidFloat(String),
    #[error("Atom line needs a label and three coordinates")]
    MissingCoordinates,
    #[error("Frame ended after {found} of {expected} atoms")]
    TruncatedFrame { expected: usize, found: usize },
    #[error("Cell needs 3 box lengths or 9 lattice components, found {0} numbers")]
    InvalidCellLength(usize),
    #[error("Cell is singular")]
    SingularCell,
}

/// Plain multi-frame XYZ: an atom count line, a comment line, then one
/// `label x y z` line per atom.
///
/// A comment of the form `cell = a b c` (box lengths) or `cell = ax ay az bx by bz cx cy cz`
/// (lattice vectors, row by row) attaches a periodic cell to the frame.
pub struct XyzFile;

fn parse_error(line: usize, kind: XyzParseErrorKind) -> XyzError {
    XyzError::Parse { line, kind }
}

fn parse_float(token: &str, line: usize) -> Result<f64, XyzError> {
    token
        .parse()
        .map_err(|_| parse_error(line, XyzParseErrorKind::InvalidFloat(token.to_string())))
}

fn parse_cell(comment: &str, line: usize) -> Result<Option<PeriodicCell>, XyzError> {
    let lower = comment.to_ascii_lowercase();
    let Some(start) = lower.find("cell") else {
        return Ok(None);
    };
    let Some(rest) = comment[start + 4..].trim_start().strip_prefix('=') else {
        return Ok(None);
    };

    let values: Vec<f64> = rest
        .split_whitespace()
        .map_while(|token| token.parse().ok())
        .collect();
    let cell = match values.as_slice() {
        [a, b, c] => PeriodicCell::orthorhombic(*a, *b, *c),
        [_, _, _, _, _, _, _, _, _] => PeriodicCell::new(Matrix3::from_row_slice(&values)),
        other => {
            return Err(parse_error(
                line,
                XyzParseErrorKind::InvalidCellLength(other.len()),
            ));
        }
    };
    cell.map(Some)
        .map_err(|_| parse_error(line, XyzParseErrorKind::SingularCell))
}

impl TrajectoryFile for XyzFile {
    type Error = XyzError;

    fn read_from(reader: &mut impl BufRead) -> Result<Vec<Frame>, Self::Error> {
        let mut frames = Vec::new();
        let mut lines = reader.lines().enumerate().map(|(i, l)| (i + 1, l));

        while let Some((line_num, line)) = lines.next() {
            let line = line?;
            let count_str = line.trim();
            if count_str.is_empty() {
                continue;
            }
            let count: usize = count_str.parse().map_err(|_| {
                parse_error(
                    line_num,
                    XyzParseErrorKind::InvalidAtomCount(count_str.to_string()),
                )
            })?;

            let truncated = |found| {
                parse_error(
                    line_num,
                    XyzParseErrorKind::TruncatedFrame {
                        expected: count,
                        found,
                    },
                )
            };

            let (comment_num, comment) = match lines.next() {
                Some((n, l)) => (n, l?),
                None => return Err(truncated(0)),
            };
            let cell = parse_cell(&comment, comment_num)?;

            let mut positions = Vec::with_capacity(count.min(MAX_PREALLOCATED_ATOMS));
            for found in 0..count {
                let (atom_num, atom_line) = match lines.next() {
                    Some((n, l)) => (n, l?),
                    None => return Err(truncated(found)),
                };
                let fields: Vec<&str> = atom_line.split_whitespace().collect();
                if fields.len() < 4 {
                    return Err(parse_error(atom_num, XyzParseErrorKind::MissingCoordinates));
                }
                positions.push(Point3::new(
                    parse_float(fields[1], atom_num)?,
                    parse_float(fields[2], atom_num)?,
                    parse_float(fields[3], atom_num)?,
                ));
            }

            frames.push(Frame {
                positions,
                cell,
                comment: comment.trim().to_string(),
            });
        }

        Ok(frames)
    }

    fn write_to(frames: &[Frame], writer: &mut impl Write) -> Result<(), Self::Error> {
        for frame in frames {
            writeln!(writer, "{}", frame.positions.len())?;
            match &frame.cell {
                Some(cell) => {
                    let values: Vec<String> = cell
                        .lattice()
                        .transpose()
                        .iter()
                        .map(|v| format!("{v:.6}"))
                        .collect();
                    writeln!(writer, "cell = {}", values.join(" "))?;
                }
                None => writeln!(writer, "{}", frame.comment)?,
            }
            for p in &frame.positions {
                writeln!(writer, "X {:>14.6} {:>14.6} {:>14.6}", p.x, p.y, p.z)?;
            }
        }
        Ok(())
    }
}
