//! Extrinsic composition.
//!
//! Input rows are `A_T_B[i]`, the pose of frame B in frame A. With a fixed
//! calibration `C_T_B` every row becomes
//!
//! ```text
//! A_T_C[i] = A_T_B[i] · (C_T_B)⁻¹ = A_T_B[i] · B_T_C
//! ```
//!
//! `B_T_C` is inverted once at construction and shared by every row.

use crate::error::{TrajectoryError, TrajectoryResult};
use crate::manifold::LieGroup;
use crate::manifold::se3::SE3;
use crate::manifold::so3::SO3;
use crate::pose::{Orientation, OrientationEncoding, Pose, Trajectory};
use crate::trajectory::map_rows;
use tracing::debug;

/// Configuration for [`ExtrinsicCompositor`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExtrinsicConfig {
    pub output_encoding: OrientationEncoding,
    /// Reject the extrinsic or any row whose rotation deviates from
    /// orthonormal by more than this
    pub rotation_tolerance: Option<f64>,
}

impl ExtrinsicConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_output_encoding(mut self, encoding: OrientationEncoding) -> Self {
        self.output_encoding = encoding;
        self
    }

    pub fn with_rotation_tolerance(mut self, tolerance: f64) -> Self {
        self.rotation_tolerance = Some(tolerance);
        self
    }
}

/// Re-expresses a trajectory of `A_T_B` poses as `A_T_C` through a fixed `C_T_B`.
#[derive(Clone, Debug)]
pub struct ExtrinsicCompositor {
    c_t_b: SE3,
    b_t_c: SE3,
    /// Rotation of `b_t_c` as a quaternion, composed directly with row quaternions
    b_r_c: SO3,
    config: ExtrinsicConfig,
}

impl ExtrinsicCompositor {
    /// Create a compositor for the calibration `c_t_b`.
    ///
    /// # Arguments
    /// * `c_t_b` - Pose of frame B as seen from frame C
    /// * `config` - Output encoding and optional rotation validation
    ///
    /// # Errors
    /// `InvalidRotation` when validation is enabled and `c_t_b` fails it.
    pub fn new(c_t_b: SE3, config: ExtrinsicConfig) -> TrajectoryResult<Self> {
        if let Some(tolerance) = config.rotation_tolerance {
            c_t_b.check_rotation(tolerance)?;
        }

        let b_t_c = c_t_b.inverse();
        let b_r_c = b_t_c.rotation_so3();
        debug!("Extrinsic C_T_B: {}", c_t_b);
        debug!("Inverted extrinsic B_T_C: {}", b_t_c);

        Ok(Self {
            c_t_b,
            b_t_c,
            b_r_c,
            config,
        })
    }

    /// The calibration as supplied, `C_T_B`.
    pub fn extrinsic(&self) -> &SE3 {
        &self.c_t_b
    }

    /// The precomputed inverse, `B_T_C`.
    pub fn extrinsic_inverse(&self) -> &SE3 {
        &self.b_t_c
    }

    pub fn config(&self) -> &ExtrinsicConfig {
        &self.config
    }

    /// `A_T_B · B_T_C` on rigid transforms.
    pub fn compose_transform(&self, a_t_b: &SE3) -> SE3 {
        a_t_b.compose(&self.b_t_c)
    }

    /// Map one `A_T_B` pose to `A_T_C`, keeping its timestamp.
    ///
    /// The rotation is composed on quaternions, so an identity extrinsic
    /// returns the input quaternion unchanged.
    pub fn compose_pose(&self, pose: &Pose) -> Pose {
        let a_r_b = pose.orientation.to_so3();
        let translation = a_r_b.rotation_matrix() * self.b_t_c.translation() + pose.translation;
        let rotation = a_r_b.compose(&self.b_r_c);

        Pose::new(
            pose.time,
            translation,
            Orientation::from_so3(&rotation, self.config.output_encoding),
        )
    }

    /// Map every row of an `A_T_B` trajectory, preserving order and length.
    pub fn apply(&self, trajectory: &Trajectory) -> TrajectoryResult<Trajectory> {
        debug!("Composing extrinsic onto {} poses", trajectory.len());

        map_rows(trajectory, |index, pose| {
            if let Some(tolerance) = self.config.rotation_tolerance {
                pose.to_se3().check_rotation(tolerance).map_err(|err| match err {
                    TrajectoryError::InvalidRotation { deviation, .. } => {
                        TrajectoryError::InvalidRotation {
                            row: index + 1,
                            deviation,
                        }
                    }
                    other => other,
                })?;
            }
            Ok(self.compose_pose(pose))
        })
    }
}

/// Compose `c_t_b` onto every row with default settings.
pub fn compose_extrinsic(trajectory: &Trajectory, c_t_b: &SE3) -> TrajectoryResult<Trajectory> {
    ExtrinsicCompositor::new(c_t_b.clone(), ExtrinsicConfig::default())?.apply(trajectory)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Matrix3, Vector3};

    const TOLERANCE: f64 = 1e-9;

    /// Camera-from-body calibration of a handheld rig
    fn calibration() -> SE3 {
        SE3::from_row_major(&[
            -0.019978, -0.075000, -0.036192, //
            0.999168, -0.040781, 0.000593, //
            -0.040781, -0.999168, 0.0, //
            0.000592, -0.000024, -1.0,
        ])
        .unwrap()
    }

    fn random_trajectory(len: usize) -> Trajectory {
        (0..len)
            .map(|i| {
                Pose::from_se3(i as f64 * 0.1, &SE3::random(), OrientationEncoding::Quaternion)
            })
            .collect()
    }

    #[test]
    fn test_composition_consistency() {
        for _ in 0..20 {
            let c_t_b = SE3::random();
            let compositor = ExtrinsicCompositor::new(c_t_b.clone(), ExtrinsicConfig::default())
                .unwrap();
            let a_t_b = SE3::random();

            let a_t_c = compositor.compose_transform(&a_t_b);
            assert!(a_t_c.compose(&c_t_b).is_approx(&a_t_b, TOLERANCE));

            let pose = Pose::from_se3(1.0, &a_t_b, OrientationEncoding::Quaternion);
            let a_t_c = compositor.compose_pose(&pose).to_se3();
            assert!(a_t_c.compose(&c_t_b).is_approx(&a_t_b, TOLERANCE));
        }
    }

    #[test]
    fn test_identity_extrinsic_is_exact() {
        let compositor =
            ExtrinsicCompositor::new(SE3::identity(), ExtrinsicConfig::default()).unwrap();
        let trajectory = random_trajectory(50);
        let output = compositor.apply(&trajectory).unwrap();

        assert_eq!(trajectory.len(), output.len());
        for (input, output) in trajectory.iter().zip(output.iter()) {
            assert_eq!(input.to_row(), output.to_row());

            let transform = input.to_se3();
            assert_eq!(transform, compositor.compose_transform(&transform));
        }
    }

    #[test]
    fn test_precomputed_inverse_matches_recomputed() {
        let c_t_b = calibration();
        let compositor = ExtrinsicCompositor::new(c_t_b.clone(), ExtrinsicConfig::default())
            .unwrap();
        let trajectory = random_trajectory(20);
        let output = compositor.apply(&trajectory).unwrap();

        for (input, output) in trajectory.iter().zip(output.iter()) {
            let fresh = ExtrinsicCompositor::new(c_t_b.clone(), ExtrinsicConfig::default())
                .unwrap()
                .compose_pose(input);
            assert_eq!(fresh.to_row(), output.to_row());
        }
        assert_eq!(&c_t_b.inverse(), compositor.extrinsic_inverse());
    }

    #[test]
    fn test_calibration_of_identity_body_pose() {
        // With A_T_B = I the result is the camera pose in the body frame, B_T_C
        let compositor =
            ExtrinsicCompositor::new(calibration(), ExtrinsicConfig::default()).unwrap();
        let pose = Pose::new(0.0, Vector3::zeros(), Orientation::identity());
        let a_t_c = compositor.compose_pose(&pose);

        let expected = calibration().inverse();
        assert!((a_t_c.translation - expected.translation()).norm() < TOLERANCE);

        let rotation = a_t_c.orientation.to_so3().rotation_matrix();
        assert!((rotation - expected.rotation_matrix()).abs().max() < 1e-5);
    }

    #[test]
    fn test_translation_only_extrinsic() {
        let c_t_b = SE3::new(Vector3::new(0.0, 0.0, -1.0), Matrix3::identity());
        let trajectory: Trajectory = vec![Pose::new(
            2.0,
            Vector3::new(1.0, 2.0, 3.0),
            Orientation::identity(),
        )]
        .into();
        let output = compose_extrinsic(&trajectory, &c_t_b).unwrap();
        assert_eq!(
            vec![2.0, 1.0, 2.0, 4.0, 0.0, 0.0, 0.0, 1.0],
            output.get(0).unwrap().to_row()
        );
    }

    #[test]
    fn test_euler_output() {
        let config =
            ExtrinsicConfig::new().with_output_encoding(OrientationEncoding::euler_degrees());
        let compositor = ExtrinsicCompositor::new(SE3::identity(), config).unwrap();
        let trajectory: Trajectory =
            vec![Pose::new(0.0, Vector3::zeros(), Orientation::identity())].into();

        let output = compositor.apply(&trajectory).unwrap();
        let row = output.get(0).unwrap().to_row();
        assert_eq!(7, row.len());
        for value in &row[4..] {
            assert!(value.abs() < TOLERANCE);
        }
    }

    #[test]
    fn test_rotation_validation() {
        // The calibration carries ~1e-6 of orthonormality drift
        let loose = ExtrinsicConfig::new().with_rotation_tolerance(1e-4);
        assert!(ExtrinsicCompositor::new(calibration(), loose).is_ok());

        let strict = ExtrinsicConfig::new().with_rotation_tolerance(1e-12);
        assert!(matches!(
            ExtrinsicCompositor::new(calibration(), strict),
            Err(TrajectoryError::InvalidRotation { row: 0, .. })
        ));

        let config = ExtrinsicConfig::new().with_rotation_tolerance(1e-6);
        let compositor = ExtrinsicCompositor::new(SE3::identity(), config).unwrap();
        let trajectory: Trajectory = vec![
            Pose::new(0.0, Vector3::zeros(), Orientation::identity()),
            Pose::new(
                1.0,
                Vector3::zeros(),
                Orientation::Quaternion {
                    x: 0.0,
                    y: 0.0,
                    z: 0.0,
                    w: 2.0,
                },
            ),
        ]
        .into();
        assert!(matches!(
            compositor.apply(&trajectory),
            Err(TrajectoryError::InvalidRotation { row: 2, .. })
        ));
    }

    #[test]
    fn test_empty_trajectory() {
        let output = compose_extrinsic(&Trajectory::new(), &calibration()).unwrap();
        assert!(output.is_empty());
    }
}
