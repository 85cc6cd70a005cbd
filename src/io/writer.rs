use super::*;
use crate::error::TrajectoryResult;
use crate::pose::Trajectory;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::debug;

/// Text formatting of output rows.
#[derive(Clone, Debug, PartialEq)]
pub struct OutputFormat {
    /// Written between values
    pub delimiter: String,
    /// Fixed number of digits after the decimal point
    pub decimal_places: usize,
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self {
            delimiter: " ".to_string(),
            decimal_places: 6,
        }
    }
}

impl OutputFormat {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delimiter(mut self, delimiter: Delimiter) -> Self {
        self.delimiter = delimiter.as_output();
        self
    }

    pub fn with_decimal_places(mut self, decimal_places: usize) -> Self {
        self.decimal_places = decimal_places;
        self
    }
}

/// Fixed-precision trajectory file writer
pub struct TrajectoryWriter;

impl TrajectoryWriter {
    /// Write rows to `path`, one per line, replacing any existing file.
    pub fn write<P: AsRef<Path>>(
        path: P,
        rows: &[Vec<f64>],
        delimiter: Delimiter,
        decimal_places: usize,
    ) -> TrajectoryResult<()> {
        let format = OutputFormat::new()
            .with_delimiter(delimiter)
            .with_decimal_places(decimal_places);
        Self::write_with_format(path, rows, &format)
    }

    /// Write a trajectory, each pose in its own orientation encoding.
    pub fn write_trajectory<P: AsRef<Path>>(
        path: P,
        trajectory: &Trajectory,
        format: &OutputFormat,
    ) -> TrajectoryResult<()> {
        Self::write_with_format(path, &trajectory.rows(), format)
    }

    pub fn write_with_format<P: AsRef<Path>>(
        path: P,
        rows: &[Vec<f64>],
        format: &OutputFormat,
    ) -> TrajectoryResult<()> {
        let path = path.as_ref();
        let mut writer = BufWriter::new(File::create(path)?);
        Self::write_to(&mut writer, rows, format)?;
        writer.flush()?;
        debug!("Wrote {} rows to {}", rows.len(), path.display());
        Ok(())
    }

    /// Write rows to any sink.
    pub fn write_to<W: Write>(
        writer: &mut W,
        rows: &[Vec<f64>],
        format: &OutputFormat,
    ) -> TrajectoryResult<()> {
        for row in rows {
            writeln!(writer, "{}", Self::format_row(row, format))?;
        }
        Ok(())
    }

    /// Format one row, e.g. `0.000000 1.000000 ...` with the defaults.
    pub fn format_row(row: &[f64], format: &OutputFormat) -> String {
        row.iter()
            .map(|value| format!("{:.*}", format.decimal_places, value))
            .collect::<Vec<_>>()
            .join(&format.delimiter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::TrajectoryReader;
    use crate::parser::ColumnLayout;
    use tempfile::NamedTempFile;

    #[test]
    fn test_format_row_defaults() {
        let row = vec![0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0];
        assert_eq!(
            "0.000000 1.000000 0.000000 0.000000 0.000000 0.000000 0.000000 1.000000",
            TrajectoryWriter::format_row(&row, &OutputFormat::default())
        );
    }

    #[test]
    fn test_format_row_custom() {
        let format = OutputFormat::new()
            .with_delimiter(Delimiter::Char(','))
            .with_decimal_places(2);
        assert_eq!(
            "1.50,-0.13,2.00",
            TrajectoryWriter::format_row(&[1.5, -0.125001, 2.0], &format)
        );
        let format = OutputFormat::new().with_decimal_places(0);
        assert_eq!("2 -3", TrajectoryWriter::format_row(&[2.0, -3.0], &format));
    }

    #[test]
    fn test_write_to_buffer() -> TrajectoryResult<()> {
        let mut buffer = Vec::new();
        let rows = vec![vec![0.0, 1.0], vec![2.0, 3.0]];
        let format = OutputFormat::new().with_decimal_places(1);
        TrajectoryWriter::write_to(&mut buffer, &rows, &format)?;
        assert_eq!("0.0 1.0\n2.0 3.0\n", String::from_utf8(buffer).unwrap());
        Ok(())
    }

    #[test]
    fn test_write_then_load() -> Result<(), Box<dyn std::error::Error>> {
        let temp_file = NamedTempFile::new()?;
        let rows = vec![
            vec![0.0, 1.0, 2.0, 3.0, 0.0, 0.0, 0.0, 1.0],
            vec![0.5, -1.0, 0.25, 3.0, 0.0, 0.0, 0.0, 1.0],
        ];
        TrajectoryWriter::write(temp_file.path(), &rows, Delimiter::Char('\t'), 6)?;

        let contents = std::fs::read_to_string(temp_file.path())?;
        assert!(contents.starts_with("0.000000\t1.000000\t2.000000"));

        let trajectory = TrajectoryReader::load(
            temp_file.path(),
            &ColumnLayout::default(),
            Delimiter::Char('\t'),
        )?;
        assert_eq!(rows, trajectory.rows());
        Ok(())
    }
}
