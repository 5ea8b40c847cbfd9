use crate::core::geometry::pbc::PeriodicCell;
use nalgebra::Point3;
use std::error::Error;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// One snapshot of a trajectory.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub positions: Vec<Point3<f64>>,
    pub cell: Option<PeriodicCell>,
    pub comment: String,
}

/// Common interface for multi-frame coordinate formats.
pub trait TrajectoryFile {
    type Error: Error + From<io::Error>;

    /// Reads every frame from a buffered reader.
    fn read_from(reader: &mut impl BufRead) -> Result<Vec<Frame>, Self::Error>;

    fn write_to(frames: &[Frame], writer: &mut impl Write) -> Result<(), Self::Error>;

    fn read_from_path<P: AsRef<Path>>(path: P) -> Result<Vec<Frame>, Self::Error> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        Self::read_from(&mut reader)
    }

    fn write_to_path<P: AsRef<Path>>(frames: &[Frame], path: P) -> Result<(), Self::Error> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        Self::write_to(frames, &mut writer)?;
        writer.flush()?;
        Ok(())
    }
}
