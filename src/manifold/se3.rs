//! SE(3) - Special Euclidean Group in 3D
//!
//! Rigid body transformations `T = [R t; 0 1]` built from a translation and a
//! rotation matrix. The rotation is stored as given: building an SE3 never
//! re-orthonormalizes it, and [`SE3::check_rotation`] is the only place that
//! inspects it.
//!
//! Naming follows the `A_T_B` convention: the pose of frame B expressed in
//! frame A, mapping points from B into A. With that convention
//! `A_T_C = A_T_B.compose(&B_T_C)`.

use crate::error::{TrajectoryError, TrajectoryResult};
use crate::manifold::LieGroup;
use crate::manifold::so3::SO3;
use nalgebra::{Matrix3, Matrix4, Vector3};
use std::fmt;

/// SE(3) group element representing rigid body transformations in 3D.
#[derive(Clone, Debug, PartialEq)]
pub struct SE3 {
    /// Rotation part, orthonormal by contract
    rotation: Matrix3<f64>,
    /// Translation part
    translation: Vector3<f64>,
}

impl fmt::Display for SE3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let t = self.translation;
        let q = self.rotation_so3();
        write!(
            f,
            "SE3(translation: [{:.4}, {:.4}, {:.4}], rotation: [x: {:.4}, y: {:.4}, z: {:.4}, w: {:.4}])",
            t.x,
            t.y,
            t.z,
            q.x(),
            q.y(),
            q.z(),
            q.w()
        )
    }
}

impl SE3 {
    /// Assemble a transform from a translation and a rotation matrix.
    ///
    /// # Arguments
    /// * `translation` - Translation vector [x, y, z]
    /// * `rotation` - 3x3 rotation matrix, assumed orthonormal
    pub fn new(translation: Vector3<f64>, rotation: Matrix3<f64>) -> Self {
        SE3 {
            rotation,
            translation,
        }
    }

    /// Create SE3 from a translation and an SO3 rotation.
    pub fn from_translation_so3(translation: Vector3<f64>, rotation: SO3) -> Self {
        SE3 {
            rotation: rotation.rotation_matrix(),
            translation,
        }
    }

    /// Create SE3 from a 4x4 homogeneous matrix.
    ///
    /// Fails when the bottom row is not `[0, 0, 0, 1]`.
    pub fn from_homogeneous(matrix: &Matrix4<f64>) -> TrajectoryResult<Self> {
        let bottom = matrix.fixed_view::<1, 4>(3, 0);
        if bottom[(0, 0)] != 0.0
            || bottom[(0, 1)] != 0.0
            || bottom[(0, 2)] != 0.0
            || bottom[(0, 3)] != 1.0
        {
            return Err(TrajectoryError::InvalidTransform(format!(
                "bottom row must be [0, 0, 0, 1], got [{}, {}, {}, {}]",
                bottom[(0, 0)],
                bottom[(0, 1)],
                bottom[(0, 2)],
                bottom[(0, 3)]
            )));
        }

        Ok(SE3 {
            rotation: matrix.fixed_view::<3, 3>(0, 0).into_owned(),
            translation: matrix.fixed_view::<3, 1>(0, 3).into_owned(),
        })
    }

    /// Create SE3 from `[tx, ty, tz, r00, r01, ..., r22]` (rotation row-major).
    pub fn from_row_major(values: &[f64]) -> TrajectoryResult<Self> {
        if values.len() != 12 {
            return Err(TrajectoryError::DimensionMismatch {
                what: "extrinsic (3 translation + 9 rotation values)".to_string(),
                expected: 12,
                actual: values.len(),
            });
        }
        let translation = Vector3::new(values[0], values[1], values[2]);
        let rotation = Matrix3::from_row_slice(&values[3..12]);
        Ok(SE3::new(translation, rotation))
    }

    /// Get the translation part.
    pub fn translation(&self) -> Vector3<f64> {
        self.translation
    }

    /// Get the rotation part as a 3x3 matrix.
    pub fn rotation_matrix(&self) -> Matrix3<f64> {
        self.rotation
    }

    /// Get the rotation part as SO3 (matrix → quaternion).
    pub fn rotation_so3(&self) -> SO3 {
        SO3::from_rotation_matrix(&self.rotation)
    }

    /// Get the 4x4 homogeneous matrix.
    pub fn matrix(&self) -> Matrix4<f64> {
        let mut matrix = Matrix4::identity();
        matrix.fixed_view_mut::<3, 3>(0, 0).copy_from(&self.rotation);
        matrix.fixed_view_mut::<3, 1>(0, 3).copy_from(&self.translation);
        matrix
    }

    /// Largest deviation of `RᵀR` from the identity and of `det R` from one.
    pub fn orthonormality_error(&self) -> f64 {
        let gram = self.rotation.transpose() * self.rotation - Matrix3::identity();
        let gram_error = gram.abs().max();
        let det_error = (self.rotation.determinant() - 1.0).abs();
        gram_error.max(det_error)
    }

    /// Verify the rotation is orthonormal with `det = +1` within `tolerance`.
    pub fn check_rotation(&self, tolerance: f64) -> TrajectoryResult<()> {
        let deviation = self.orthonormality_error();
        if deviation.is_finite() && deviation <= tolerance {
            Ok(())
        } else {
            Err(TrajectoryError::InvalidRotation { row: 0, deviation })
        }
    }
}

impl LieGroup for SE3 {
    fn identity() -> Self {
        SE3 {
            rotation: Matrix3::identity(),
            translation: Vector3::zeros(),
        }
    }

    /// Closed-form inverse of a rigid transform
    ///
    /// M⁻¹ = [ Rᵀ -Rᵀt ]
    ///       [ 0    1   ]
    fn inverse(&self) -> Self {
        let rot_inv = self.rotation.transpose();
        let trans_inv = -(rot_inv * self.translation);
        SE3::new(trans_inv, rot_inv)
    }

    /// Composition of this and another SE3 element.
    ///
    /// M_a M_b = [ R_a*R_b   R_a*t_b + t_a ]
    ///           [ 0             1         ]
    fn compose(&self, other: &Self) -> Self {
        let rotation = self.rotation * other.rotation;
        let translation = self.rotation * other.translation + self.translation;
        SE3::new(translation, rotation)
    }

    /// R * v + t
    fn act(&self, vector: &Vector3<f64>) -> Vector3<f64> {
        self.rotation * vector + self.translation
    }

    fn random() -> Self {
        use rand::Rng;
        let mut rng = rand::rng();

        let translation = Vector3::new(
            rng.random_range(-10.0..10.0),
            rng.random_range(-10.0..10.0),
            rng.random_range(-10.0..10.0),
        );
        SE3::from_translation_so3(translation, SO3::random())
    }

    fn is_valid(&self, tolerance: f64) -> bool {
        self.check_rotation(tolerance).is_ok()
    }

    fn is_approx(&self, other: &Self, tolerance: f64) -> bool {
        (self.rotation - other.rotation).abs().max() < tolerance
            && (self.translation - other.translation).abs().max() < tolerance
    }
}
