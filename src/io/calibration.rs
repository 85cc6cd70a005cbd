use super::*;
use crate::error::TrajectoryResult;
use crate::manifold::se3::SE3;
use std::path::Path;
use tracing::debug;

/// Load a `C_T_B` extrinsic calibration file.
///
/// The file holds 12 numbers separated by whitespace or commas, across any
/// number of lines: `tx ty tz` followed by the 3x3 rotation in row-major
/// order. `#` comment lines and blank lines are ignored.
pub fn load_extrinsic<P: AsRef<Path>>(path: P) -> TrajectoryResult<SE3> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;
    let c_t_b = parse_extrinsic(&content)?;
    debug!("Loaded extrinsic from {}: {}", path.display(), c_t_b);
    Ok(c_t_b)
}

/// Parse extrinsic calibration text, see [`load_extrinsic`].
pub fn parse_extrinsic(content: &str) -> TrajectoryResult<SE3> {
    let mut values = Vec::with_capacity(12);
    for (line_num, line) in data_lines(content) {
        for (column, token) in line
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|token| !token.is_empty())
            .enumerate()
        {
            let value = token
                .parse::<f64>()
                .map_err(|_| TrajectoryError::InvalidNumber {
                    line: line_num,
                    column,
                    value: token.to_string(),
                })?;
            values.push(value);
        }
    }

    SE3::from_row_major(&values)
}

/// Parse 12 inline values, `tx ty tz r00 r01 ... r22`.
pub fn extrinsic_from_values(values: &[f64]) -> TrajectoryResult<SE3> {
    SE3::from_row_major(values)
}
