use super::*;
use crate::error::TrajectoryResult;
use crate::parser::ColumnLayout;
use crate::pose::Trajectory;
use crate::trajectory::PARALLEL_THRESHOLD;
use memmap2::Mmap;
use rayon::prelude::*;
use std::fs::File;
use std::path::Path;
use tracing::{debug, warn};

/// Memory-mapped trajectory file reader
pub struct TrajectoryReader;

impl TrajectoryReader {
    /// Load a trajectory file.
    ///
    /// Every data line is decoded with `layout`. The first failing line aborts
    /// the load; nothing is returned for the lines before it.
    pub fn load<P: AsRef<Path>>(
        path: P,
        layout: &ColumnLayout,
        delimiter: Delimiter,
    ) -> TrajectoryResult<Trajectory> {
        let path = path.as_ref();
        let file = File::open(path)?;
        if file.metadata()?.len() == 0 {
            debug!("{} is empty", path.display());
            return Ok(Trajectory::new());
        }

        let mmap = unsafe { Mmap::map(&file)? };
        let content = std::str::from_utf8(&mmap).map_err(|e| {
            TrajectoryError::InvalidInput(format!("{} is not valid UTF-8: {e}", path.display()))
        })?;

        let trajectory = Self::parse_content(content, layout, delimiter)?;
        debug!("Loaded {} poses from {}", trajectory.len(), path.display());
        Ok(trajectory)
    }

    /// Parse in-memory file content.
    pub fn parse_content(
        content: &str,
        layout: &ColumnLayout,
        delimiter: Delimiter,
    ) -> TrajectoryResult<Trajectory> {
        let lines: Vec<(usize, &str)> = data_lines(content).collect();

        let trajectory = if lines.len() > PARALLEL_THRESHOLD {
            debug!("Parsing {} lines in parallel", lines.len());
            Self::parse_parallel(&lines, layout, delimiter)?
        } else {
            Self::parse_sequential(&lines, layout, delimiter)?
        };

        if let Some(index) = trajectory.first_non_monotonic() {
            warn!(
                "Timestamps are not monotonic: pose {} (t={}) follows t={}",
                index,
                trajectory.poses()[index].time,
                trajectory.poses()[index - 1].time
            );
        }

        Ok(trajectory)
    }

    fn parse_sequential(
        lines: &[(usize, &str)],
        layout: &ColumnLayout,
        delimiter: Delimiter,
    ) -> TrajectoryResult<Trajectory> {
        let mut trajectory = Trajectory::with_capacity(lines.len());
        for &(line_num, line) in lines {
            trajectory.push(layout.parse_row(&delimiter.split(line), line_num)?);
        }
        Ok(trajectory)
    }

    fn parse_parallel(
        lines: &[(usize, &str)],
        layout: &ColumnLayout,
        delimiter: Delimiter,
    ) -> TrajectoryResult<Trajectory> {
        lines
            .par_iter()
            .map(|&(line_num, line)| layout.parse_row(&delimiter.split(line), line_num))
            .collect::<TrajectoryResult<Vec<_>>>()
            .map(Trajectory::from)
    }
}
