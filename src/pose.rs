//! Timestamped poses and trajectories.
//!
//! A [`Pose`] keeps its orientation in whatever encoding it was read or
//! produced in; conversion to the rotation algebra happens through
//! [`Orientation::to_so3`] and back through [`Orientation::from_so3`].

use crate::error::TrajectoryError;
use crate::manifold::se3::SE3;
use crate::manifold::so3::{AngleUnit, EulerSequence, SO3};
use nalgebra::Vector3;
use std::fmt;
use std::str::FromStr;

/// Orientation representation selected for input columns or output rows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum OrientationEncoding {
    /// `[x, y, z, w]`
    #[default]
    Quaternion,
    /// `[roll, pitch, yaw]`
    Euler {
        unit: AngleUnit,
        sequence: EulerSequence,
    },
}

impl OrientationEncoding {
    /// Euler angles in radians, intrinsic XYZ.
    pub fn euler_radians() -> Self {
        OrientationEncoding::Euler {
            unit: AngleUnit::Radians,
            sequence: EulerSequence::IntrinsicXyz,
        }
    }

    /// Euler angles in degrees, intrinsic XYZ.
    pub fn euler_degrees() -> Self {
        OrientationEncoding::Euler {
            unit: AngleUnit::Degrees,
            sequence: EulerSequence::IntrinsicXyz,
        }
    }

    /// Number of columns the orientation occupies.
    pub fn dimension(&self) -> usize {
        match self {
            OrientationEncoding::Quaternion => 4,
            OrientationEncoding::Euler { .. } => 3,
        }
    }

    /// Same encoding with a different Euler sequence (no-op for quaternions).
    pub fn with_sequence(self, sequence: EulerSequence) -> Self {
        match self {
            OrientationEncoding::Quaternion => self,
            OrientationEncoding::Euler { unit, .. } => {
                OrientationEncoding::Euler { unit, sequence }
            }
        }
    }
}

impl FromStr for OrientationEncoding {
    type Err = TrajectoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "quat" | "quaternion" => Ok(OrientationEncoding::Quaternion),
            "euler" | "euler_rad" => Ok(OrientationEncoding::euler_radians()),
            "euler_deg" => Ok(OrientationEncoding::euler_degrees()),
            _ => Err(TrajectoryError::UnsupportedEncoding(s.to_string())),
        }
    }
}

impl fmt::Display for OrientationEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrientationEncoding::Quaternion => write!(f, "quaternion"),
            OrientationEncoding::Euler { unit, sequence } => {
                write!(f, "euler({unit:?}, {sequence:?})")
            }
        }
    }
}

/// Orientation of a pose, tagged with its encoding.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Orientation {
    Quaternion {
        x: f64,
        y: f64,
        z: f64,
        w: f64,
    },
    Euler {
        roll: f64,
        pitch: f64,
        yaw: f64,
        unit: AngleUnit,
        sequence: EulerSequence,
    },
}

impl Orientation {
    pub fn identity() -> Self {
        Orientation::Quaternion {
            x: 0.0,
            y: 0.0,
            z: 0.0,
            w: 1.0,
        }
    }

    /// Convert to the rotation algebra.
    ///
    /// Quaternion coefficients are taken as stored, without renormalizing.
    pub fn to_so3(&self) -> SO3 {
        match *self {
            Orientation::Quaternion { x, y, z, w } => {
                SO3::from_quaternion_coeffs_unchecked(x, y, z, w)
            }
            Orientation::Euler {
                roll,
                pitch,
                yaw,
                unit,
                sequence,
            } => SO3::from_euler(Vector3::new(roll, pitch, yaw), unit, sequence),
        }
    }

    /// Express a rotation in the requested encoding.
    pub fn from_so3(rotation: &SO3, encoding: OrientationEncoding) -> Self {
        match encoding {
            OrientationEncoding::Quaternion => {
                let [x, y, z, w] = rotation.coeffs();
                Orientation::Quaternion { x, y, z, w }
            }
            OrientationEncoding::Euler { unit, sequence } => {
                let angles = rotation.to_euler(unit, sequence);
                Orientation::Euler {
                    roll: angles.x,
                    pitch: angles.y,
                    yaw: angles.z,
                    unit,
                    sequence,
                }
            }
        }
    }

    pub fn encoding(&self) -> OrientationEncoding {
        match *self {
            Orientation::Quaternion { .. } => OrientationEncoding::Quaternion,
            Orientation::Euler { unit, sequence, .. } => {
                OrientationEncoding::Euler { unit, sequence }
            }
        }
    }

    /// Re-encode, passing through the rotation algebra only when the encoding changes.
    pub fn to_encoding(&self, encoding: OrientationEncoding) -> Self {
        if self.encoding() == encoding {
            *self
        } else {
            Orientation::from_so3(&self.to_so3(), encoding)
        }
    }

    /// Output components in canonical order: `[x, y, z, w]` or `[roll, pitch, yaw]`.
    pub fn components(&self) -> Vec<f64> {
        match *self {
            Orientation::Quaternion { x, y, z, w } => vec![x, y, z, w],
            Orientation::Euler {
                roll, pitch, yaw, ..
            } => vec![roll, pitch, yaw],
        }
    }
}

/// A timestamped position and orientation.
#[derive(Clone, Debug, PartialEq)]
pub struct Pose {
    pub time: f64,
    pub translation: Vector3<f64>,
    pub orientation: Orientation,
}

impl Pose {
    pub fn new(time: f64, translation: Vector3<f64>, orientation: Orientation) -> Self {
        Self {
            time,
            translation,
            orientation,
        }
    }

    /// Build a pose from a rigid transform, encoding the rotation as requested.
    pub fn from_se3(time: f64, transform: &SE3, encoding: OrientationEncoding) -> Self {
        Self {
            time,
            translation: transform.translation(),
            orientation: Orientation::from_so3(&transform.rotation_so3(), encoding),
        }
    }

    /// Rigid transform view of this pose (`world_T_pose`).
    pub fn to_se3(&self) -> SE3 {
        SE3::from_translation_so3(self.translation, self.orientation.to_so3())
    }

    /// Canonical output row: `[time, x, y, z, orientation...]`.
    pub fn to_row(&self) -> Vec<f64> {
        let mut row = Vec::with_capacity(8);
        row.push(self.time);
        row.extend_from_slice(self.translation.as_slice());
        row.extend(self.orientation.components());
        row
    }
}

impl fmt::Display for Pose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Pose [ time: {}, translation: [{:.4}, {:.4}, {:.4}], orientation: {:?} ]",
            self.time, self.translation.x, self.translation.y, self.translation.z, self.orientation
        )
    }
}

/// Ordered sequence of poses; order is input order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Trajectory {
    poses: Vec<Pose>,
}

impl Trajectory {
    pub fn new() -> Self {
        Self { poses: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            poses: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, pose: Pose) {
        self.poses.push(pose);
    }

    pub fn len(&self) -> usize {
        self.poses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.poses.is_empty()
    }

    pub fn first(&self) -> Option<&Pose> {
        self.poses.first()
    }

    pub fn get(&self, index: usize) -> Option<&Pose> {
        self.poses.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Pose> {
        self.poses.iter()
    }

    pub fn poses(&self) -> &[Pose] {
        &self.poses
    }

    /// Output rows in each pose's own encoding.
    pub fn rows(&self) -> Vec<Vec<f64>> {
        self.poses.iter().map(Pose::to_row).collect()
    }

    /// Same poses with every orientation re-expressed in `encoding`.
    pub fn to_encoding(&self, encoding: OrientationEncoding) -> Trajectory {
        self.poses
            .iter()
            .map(|pose| Pose {
                orientation: pose.orientation.to_encoding(encoding),
                ..pose.clone()
            })
            .collect()
    }

    /// Index of the first pose whose timestamp is earlier than its predecessor's.
    pub fn first_non_monotonic(&self) -> Option<usize> {
        self.poses
            .windows(2)
            .position(|pair| pair[1].time < pair[0].time)
            .map(|i| i + 1)
    }
}

impl From<Vec<Pose>> for Trajectory {
    fn from(poses: Vec<Pose>) -> Self {
        Self { poses }
    }
}

impl FromIterator<Pose> for Trajectory {
    fn from_iter<I: IntoIterator<Item = Pose>>(iter: I) -> Self {
        Self {
            poses: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Trajectory {
    type Item = Pose;
    type IntoIter = std::vec::IntoIter<Pose>;

    fn into_iter(self) -> Self::IntoIter {
        self.poses.into_iter()
    }
}

impl<'a> IntoIterator for &'a Trajectory {
    type Item = &'a Pose;
    type IntoIter = std::slice::Iter<'a, Pose>;

    fn into_iter(self) -> Self::IntoIter {
        self.poses.iter()
    }
}
