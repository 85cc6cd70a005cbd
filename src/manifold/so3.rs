//! SO(3) - Special Orthogonal Group in 3D
//!
//! This module implements the rotation algebra used by every pose conversion:
//! quaternion ↔ matrix ↔ Euler conversions, composition and inversion.
//!
//! SO(3) elements are represented using nalgebra's UnitQuaternion internally.
//! Quaternion coefficients are exchanged in `[x, y, z, w]` order at the public
//! boundary, matching the column order of pose files.
//!
//! # Euler angles
//!
//! Euler angles are always `(roll, pitch, yaw)` about `(X, Y, Z)` and always
//! carry an explicit [`AngleUnit`] and [`EulerSequence`]:
//!
//! - [`EulerSequence::IntrinsicXyz`] (default): roll about X, then pitch about
//!   the rotated Y, then yaw about the twice-rotated Z.
//!   `R = Rx(roll) · Ry(pitch) · Rz(yaw)`
//! - [`EulerSequence::ExtrinsicXyz`]: roll, pitch, yaw about the fixed axes.
//!   `R = Rz(yaw) · Ry(pitch) · Rx(roll)`

use crate::error::{TrajectoryError, TrajectoryResult};
use crate::manifold::LieGroup;
use nalgebra::{Matrix3, Quaternion, Rotation3, UnitQuaternion, Vector3};
use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

/// Below this `|cos(pitch)|` the Euler decomposition is treated as gimbal-locked.
const GIMBAL_LOCK_EPSILON: f64 = 1e-9;

/// Unit of an angle triple.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AngleUnit {
    #[default]
    Radians,
    Degrees,
}

impl AngleUnit {
    /// Convert a value in this unit to radians.
    pub fn to_radians(self, value: f64) -> f64 {
        match self {
            AngleUnit::Radians => value,
            AngleUnit::Degrees => value.to_radians(),
        }
    }

    /// Convert a value in radians to this unit.
    pub fn radians_to_unit(self, value: f64) -> f64 {
        match self {
            AngleUnit::Radians => value,
            AngleUnit::Degrees => value.to_degrees(),
        }
    }
}

impl FromStr for AngleUnit {
    type Err = TrajectoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "rad" | "radians" => Ok(AngleUnit::Radians),
            "deg" | "degrees" => Ok(AngleUnit::Degrees),
            other => Err(TrajectoryError::InvalidInput(format!(
                "Unknown angle unit: {other}"
            ))),
        }
    }
}

/// Axis order and frame of an Euler angle triple.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum EulerSequence {
    /// Body-frame rotations: `R = Rx(roll) · Ry(pitch) · Rz(yaw)`
    #[default]
    IntrinsicXyz,
    /// Fixed-frame rotations: `R = Rz(yaw) · Ry(pitch) · Rx(roll)`
    ExtrinsicXyz,
}

impl FromStr for EulerSequence {
    type Err = TrajectoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "XYZ" | "intrinsic" => Ok(EulerSequence::IntrinsicXyz),
            "xyz" | "extrinsic" => Ok(EulerSequence::ExtrinsicXyz),
            other => Err(TrajectoryError::InvalidInput(format!(
                "Unknown Euler sequence: {other}"
            ))),
        }
    }
}

/// SO(3) group element representing rotations in 3D.
#[derive(Clone, Debug, PartialEq)]
pub struct SO3 {
    /// Internal representation as a unit quaternion
    quaternion: UnitQuaternion<f64>,
}

impl fmt::Display for SO3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let q = self.quaternion.quaternion();
        write!(
            f,
            "SO3(quaternion: [x: {:.4}, y: {:.4}, z: {:.4}, w: {:.4}])",
            q.i, q.j, q.k, q.w
        )
    }
}

impl SO3 {
    /// Create a new SO(3) element from a unit quaternion.
    pub fn new(quaternion: UnitQuaternion<f64>) -> Self {
        SO3 { quaternion }
    }

    /// Create SO(3) from quaternion coefficients [x, y, z, w], normalizing them.
    ///
    /// Fails when the coefficients have (near) zero norm.
    pub fn from_quaternion_coeffs(x: f64, y: f64, z: f64, w: f64) -> TrajectoryResult<Self> {
        let q = Quaternion::new(w, x, y, z);
        UnitQuaternion::try_new(q, f64::EPSILON)
            .map(SO3::new)
            .ok_or(TrajectoryError::DegenerateQuaternion { line: 0 })
    }

    /// Create SO(3) from quaternion coefficients [x, y, z, w] without normalizing.
    ///
    /// The caller is responsible for supplying a unit quaternion.
    pub fn from_quaternion_coeffs_unchecked(x: f64, y: f64, z: f64, w: f64) -> Self {
        SO3::new(UnitQuaternion::new_unchecked(Quaternion::new(w, x, y, z)))
    }

    /// Create SO(3) from a 3x3 rotation matrix (matrix → quaternion).
    ///
    /// The matrix is assumed orthonormal; it is not re-projected onto SO(3).
    pub fn from_rotation_matrix(matrix: &Matrix3<f64>) -> Self {
        let rotation = Rotation3::from_matrix_unchecked(*matrix);
        SO3::new(UnitQuaternion::from_rotation_matrix(&rotation))
    }

    /// Create SO(3) from a roll-pitch-yaw triple (Euler → quaternion).
    pub fn from_euler(angles: Vector3<f64>, unit: AngleUnit, sequence: EulerSequence) -> Self {
        let roll = unit.to_radians(angles.x);
        let pitch = unit.to_radians(angles.y);
        let yaw = unit.to_radians(angles.z);

        let quaternion = match sequence {
            EulerSequence::IntrinsicXyz => {
                let qx = UnitQuaternion::from_axis_angle(&Vector3::x_axis(), roll);
                let qy = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), pitch);
                let qz = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), yaw);
                qx * qy * qz
            }
            EulerSequence::ExtrinsicXyz => UnitQuaternion::from_euler_angles(roll, pitch, yaw),
        };
        SO3::new(quaternion)
    }

    /// Decompose into a roll-pitch-yaw triple (quaternion → Euler).
    ///
    /// Pitch lies in `[-π/2, π/2]`, roll and yaw in `(-π, π]`. At gimbal lock
    /// yaw is fixed to zero and the remaining rotation is reported as roll.
    pub fn to_euler(&self, unit: AngleUnit, sequence: EulerSequence) -> Vector3<f64> {
        let r = self.rotation_matrix();

        let (roll, pitch, yaw) = match sequence {
            EulerSequence::IntrinsicXyz => {
                // R = Rx Ry Rz: r02 = sin(pitch), first row / last column carry cos(pitch)
                let cos_pitch = r[(0, 0)].hypot(r[(0, 1)]);
                let pitch = r[(0, 2)].atan2(cos_pitch);
                if cos_pitch > GIMBAL_LOCK_EPSILON {
                    let roll = (-r[(1, 2)]).atan2(r[(2, 2)]);
                    let yaw = (-r[(0, 1)]).atan2(r[(0, 0)]);
                    (roll, pitch, yaw)
                } else {
                    (r[(2, 1)].atan2(r[(1, 1)]), pitch, 0.0)
                }
            }
            EulerSequence::ExtrinsicXyz => {
                // R = Rz Ry Rx: r20 = -sin(pitch)
                let cos_pitch = r[(0, 0)].hypot(r[(1, 0)]);
                let pitch = (-r[(2, 0)]).atan2(cos_pitch);
                if cos_pitch > GIMBAL_LOCK_EPSILON {
                    let roll = r[(2, 1)].atan2(r[(2, 2)]);
                    let yaw = r[(1, 0)].atan2(r[(0, 0)]);
                    (roll, pitch, yaw)
                } else {
                    ((-r[(1, 2)]).atan2(r[(1, 1)]), pitch, 0.0)
                }
            }
        };

        Vector3::new(
            unit.radians_to_unit(roll),
            unit.radians_to_unit(pitch),
            unit.radians_to_unit(yaw),
        )
    }

    /// Get the quaternion representation.
    pub fn quaternion(&self) -> UnitQuaternion<f64> {
        self.quaternion
    }

    /// Get the x component of the quaternion.
    pub fn x(&self) -> f64 {
        self.quaternion.i
    }

    /// Get the y component of the quaternion.
    pub fn y(&self) -> f64 {
        self.quaternion.j
    }

    /// Get the z component of the quaternion.
    pub fn z(&self) -> f64 {
        self.quaternion.k
    }

    /// Get the w component of the quaternion.
    pub fn w(&self) -> f64 {
        self.quaternion.w
    }

    /// Get coefficients as array [x, y, z, w].
    pub fn coeffs(&self) -> [f64; 4] {
        let q = self.quaternion.quaternion();
        [q.i, q.j, q.k, q.w]
    }

    /// Get the rotation matrix (quaternion → matrix).
    pub fn rotation_matrix(&self) -> Matrix3<f64> {
        self.quaternion.to_rotation_matrix().into_inner()
    }
}

impl LieGroup for SO3 {
    fn identity() -> Self {
        SO3 {
            quaternion: UnitQuaternion::identity(),
        }
    }

    /// For unit quaternions the inverse is the conjugate: q⁻¹ = q*
    fn inverse(&self) -> Self {
        SO3 {
            quaternion: self.quaternion.inverse(),
        }
    }

    /// Hamilton product `q_self * q_other`, i.e. `R_self · R_other`.
    fn compose(&self, other: &Self) -> Self {
        SO3 {
            quaternion: self.quaternion * other.quaternion,
        }
    }

    fn act(&self, vector: &Vector3<f64>) -> Vector3<f64> {
        self.quaternion.transform_vector(vector)
    }

    fn random() -> Self {
        use rand::Rng;
        let mut rng = rand::rng();
        SO3 {
            quaternion: UnitQuaternion::from_scaled_axis(Vector3::new(
                rng.random_range(-PI..PI),
                rng.random_range(-PI..PI),
                rng.random_range(-PI..PI),
            )),
        }
    }

    fn is_valid(&self, tolerance: f64) -> bool {
        (self.quaternion.quaternion().norm() - 1.0).abs() < tolerance
    }

    /// `q` and `-q` are the same rotation, so compare against both.
    fn is_approx(&self, other: &Self, tolerance: f64) -> bool {
        let a = self.quaternion.coords;
        let b = other.quaternion.coords;
        (a - b).norm() < tolerance || (a + b).norm() < tolerance
    }
}
