//! Error types for the apex-trajectory library
//!
//! Every fallible operation in the crate returns [`TrajectoryResult`]. Parse
//! failures carry the 1-based source line (0 when the row did not come from a
//! file) so the caller can point at the offending input.

use thiserror::Error;

/// Main result type used throughout the apex-trajectory library
pub type TrajectoryResult<T> = Result<T, TrajectoryError>;

/// Main error type for the apex-trajectory library
#[derive(Error, Debug)]
pub enum TrajectoryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A layout index points past the end of the row
    #[error("Column {index} out of range at line {line} (row has {len} tokens)")]
    ColumnOutOfRange {
        line: usize,
        index: usize,
        len: usize,
    },

    #[error("Invalid number format at line {line}, column {column}: {value}")]
    InvalidNumber {
        line: usize,
        column: usize,
        value: String,
    },

    #[error("Unsupported orientation encoding: {0}")]
    UnsupportedEncoding(String),

    /// Quaternion with (near) zero norm, cannot be normalized
    #[error("Degenerate quaternion at line {line}")]
    DegenerateQuaternion { line: usize },

    #[error("Dimension mismatch for {what}: expected {expected}, got {actual}")]
    DimensionMismatch {
        what: String,
        expected: usize,
        actual: usize,
    },

    /// Rotation failed the orthonormality check. `row` is the 1-based row
    /// position in the trajectory, 0 for a standalone transform or a
    /// caller-supplied reference pose.
    #[error("Invalid rotation at row {row}: orthonormality deviation {deviation:.3e}")]
    InvalidRotation { row: usize, deviation: f64 },

    #[error("Invalid transform: {0}")]
    InvalidTransform(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl TrajectoryError {
    /// True for the malformed-token class of errors (bad column, bad number,
    /// bad encoding tag).
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            TrajectoryError::ColumnOutOfRange { .. }
                | TrajectoryError::InvalidNumber { .. }
                | TrajectoryError::UnsupportedEncoding(_)
                | TrajectoryError::DegenerateQuaternion { .. }
        )
    }

    /// Re-attach a source line number to a parse error raised without one.
    pub fn at_line(self, line: usize) -> Self {
        match self {
            TrajectoryError::ColumnOutOfRange { index, len, .. } => {
                TrajectoryError::ColumnOutOfRange { line, index, len }
            }
            TrajectoryError::InvalidNumber { column, value, .. } => {
                TrajectoryError::InvalidNumber {
                    line,
                    column,
                    value,
                }
            }
            TrajectoryError::DegenerateQuaternion { .. } => {
                TrajectoryError::DegenerateQuaternion { line }
            }
            other => other,
        }
    }
}
