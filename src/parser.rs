//! Pose parser: decodes one row of tokens into a [`Pose`].
//!
//! The column layout is validated once when the [`ColumnLayout`] is built,
//! then every row is decoded against it. Parsing is a pure function of the
//! tokens and the layout.

use crate::error::{TrajectoryError, TrajectoryResult};
use crate::manifold::so3::SO3;
use crate::pose::{Orientation, OrientationEncoding, Pose};
use nalgebra::Vector3;
use tracing::warn;

/// Norm drift above which a renormalized quaternion is reported.
const QUATERNION_DRIFT_WARN: f64 = 1e-3;

/// Column indices and orientation encoding of a pose row.
#[derive(Clone, Debug, PartialEq)]
pub struct ColumnLayout {
    time: usize,
    translation: [usize; 3],
    orientation: Vec<usize>,
    encoding: OrientationEncoding,
    normalize_quaternions: bool,
}

impl Default for ColumnLayout {
    /// TUM layout: `timestamp x y z qx qy qz qw`
    fn default() -> Self {
        Self {
            time: 0,
            translation: [1, 2, 3],
            orientation: vec![4, 5, 6, 7],
            encoding: OrientationEncoding::Quaternion,
            normalize_quaternions: true,
        }
    }
}

impl ColumnLayout {
    /// Create a layout, checking the orientation index count against the encoding.
    ///
    /// # Arguments
    /// * `time` - Timestamp column
    /// * `translation` - `[x, y, z]` columns
    /// * `orientation` - `[qx, qy, qz, qw]` or `[roll, pitch, yaw]` columns
    /// * `encoding` - How the orientation columns are encoded
    pub fn new(
        time: usize,
        translation: [usize; 3],
        orientation: &[usize],
        encoding: OrientationEncoding,
    ) -> TrajectoryResult<Self> {
        if orientation.len() != encoding.dimension() {
            return Err(TrajectoryError::DimensionMismatch {
                what: format!("orientation columns ({encoding})"),
                expected: encoding.dimension(),
                actual: orientation.len(),
            });
        }

        Ok(Self {
            time,
            translation,
            orientation: orientation.to_vec(),
            encoding,
            normalize_quaternions: true,
        })
    }

    /// Layout with Euler angles right after the translation:
    /// `time x y z roll pitch yaw`.
    pub fn euler(encoding: OrientationEncoding) -> TrajectoryResult<Self> {
        Self::new(0, [1, 2, 3], &[4, 5, 6], encoding)
    }

    /// Whether quaternions are normalized as they are read (default `true`).
    pub fn with_normalize_quaternions(mut self, normalize: bool) -> Self {
        self.normalize_quaternions = normalize;
        self
    }

    pub fn encoding(&self) -> OrientationEncoding {
        self.encoding
    }

    pub fn normalize_quaternions(&self) -> bool {
        self.normalize_quaternions
    }

    /// Smallest number of tokens a row needs to satisfy every index.
    pub fn min_columns(&self) -> usize {
        std::iter::once(self.time)
            .chain(self.translation)
            .chain(self.orientation.iter().copied())
            .max()
            .map_or(0, |max| max + 1)
    }

    /// Decode one row.
    ///
    /// # Arguments
    /// * `tokens` - The row, already split into tokens
    /// * `line` - 1-based source line for error reporting (0 if unknown)
    pub fn parse_row(&self, tokens: &[&str], line: usize) -> TrajectoryResult<Pose> {
        let time = parse_column(tokens, self.time, line)?;
        let translation = Vector3::new(
            parse_column(tokens, self.translation[0], line)?,
            parse_column(tokens, self.translation[1], line)?,
            parse_column(tokens, self.translation[2], line)?,
        );

        let mut values = [0.0; 4];
        for (slot, &index) in values.iter_mut().zip(&self.orientation) {
            *slot = parse_column(tokens, index, line)?;
        }

        let orientation = match self.encoding {
            OrientationEncoding::Quaternion => {
                let [x, y, z, w] = values;
                if self.normalize_quaternions {
                    normalized_quaternion(x, y, z, w, line)?
                } else {
                    Orientation::Quaternion { x, y, z, w }
                }
            }
            OrientationEncoding::Euler { unit, sequence } => Orientation::Euler {
                roll: values[0],
                pitch: values[1],
                yaw: values[2],
                unit,
                sequence,
            },
        };

        Ok(Pose::new(time, translation, orientation))
    }
}

/// Decode one row from explicit column indices.
///
/// Convenience over [`ColumnLayout::new`] + [`ColumnLayout::parse_row`] for a
/// single row. Quaternions are normalized.
pub fn parse_pose(
    tokens: &[&str],
    time_index: usize,
    translation_indices: [usize; 3],
    orientation_indices: &[usize],
    encoding: OrientationEncoding,
) -> TrajectoryResult<Pose> {
    ColumnLayout::new(time_index, translation_indices, orientation_indices, encoding)?
        .parse_row(tokens, 0)
}

fn parse_column(tokens: &[&str], index: usize, line: usize) -> TrajectoryResult<f64> {
    let token = tokens
        .get(index)
        .ok_or(TrajectoryError::ColumnOutOfRange {
            line,
            index,
            len: tokens.len(),
        })?;

    token
        .trim()
        .parse::<f64>()
        .map_err(|_| TrajectoryError::InvalidNumber {
            line,
            column: index,
            value: token.to_string(),
        })
}

fn normalized_quaternion(
    x: f64,
    y: f64,
    z: f64,
    w: f64,
    line: usize,
) -> TrajectoryResult<Orientation> {
    let norm = (x * x + y * y + z * z + w * w).sqrt();
    let rotation =
        SO3::from_quaternion_coeffs(x, y, z, w).map_err(|err| err.at_line(line))?;

    if (norm - 1.0).abs() > QUATERNION_DRIFT_WARN {
        warn!(
            "Quaternion at line {} has norm {:.6}, renormalized",
            line, norm
        );
    }

    let [x, y, z, w] = rotation.coeffs();
    Ok(Orientation::Quaternion { x, y, z, w })
}
