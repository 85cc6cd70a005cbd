//! Trajectory relativization.
//!
//! Given a reference pose `P0 = (t0, p0, q0)`, every pose `Pi = (ti, pi, qi)`
//! is mapped to
//!
//! ```text
//! translation = R0ᵀ · (pi − p0)     global displacement in the reference's local frame
//! orientation = qi ∘ q0⁻¹            R_rel = R_i · R0ᵀ
//! time        = ti                   or ti − t0 with shift_time
//! ```
//!
//! The reference row therefore maps to zero translation and identity
//! orientation. Quaternions are used as stored; normalization is the
//! parser's job.

use crate::error::{TrajectoryError, TrajectoryResult};
use crate::manifold::LieGroup;
use crate::manifold::so3::SO3;
use crate::pose::{Orientation, OrientationEncoding, Pose, Trajectory};
use crate::trajectory::map_rows;
use nalgebra::Vector3;
use tracing::debug;

/// Which pose the trajectory is re-expressed against.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Reference {
    /// The first pose of the trajectory
    #[default]
    First,
    /// A caller-supplied pose, not necessarily part of the trajectory
    Pose(Pose),
}

/// Configuration for [`Relativizer`].
#[derive(Clone, Debug, PartialEq)]
pub struct RelativizerConfig {
    pub reference: Reference,
    /// Subtract the reference timestamp from every row
    pub shift_time: bool,
    pub output_encoding: OrientationEncoding,
    /// Reject rows whose rotation deviates from orthonormal by more than this
    pub rotation_tolerance: Option<f64>,
}

impl Default for RelativizerConfig {
    fn default() -> Self {
        Self {
            reference: Reference::First,
            shift_time: false,
            output_encoding: OrientationEncoding::Quaternion,
            rotation_tolerance: None,
        }
    }
}

impl RelativizerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reference(mut self, reference: Pose) -> Self {
        self.reference = Reference::Pose(reference);
        self
    }

    pub fn with_shift_time(mut self, shift_time: bool) -> Self {
        self.shift_time = shift_time;
        self
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

/// Reference frame resolved from a [`Reference`], shared read-only by all rows.
#[derive(Clone, Debug)]
struct ReferenceFrame {
    time: f64,
    origin: Vector3<f64>,
    rotation_inv: SO3,
}

impl ReferenceFrame {
    fn from_pose(pose: &Pose) -> Self {
        Self {
            time: pose.time,
            origin: pose.translation,
            rotation_inv: pose.orientation.to_so3().inverse(),
        }
    }
}

/// Re-expresses trajectories in the frame of a reference pose.
#[derive(Clone, Debug, Default)]
pub struct Relativizer {
    config: RelativizerConfig,
}

impl Relativizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: RelativizerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RelativizerConfig {
        &self.config
    }

    /// Relativize a whole trajectory.
    ///
    /// An empty trajectory yields an empty trajectory. With
    /// [`Reference::First`] the first row maps to the identity pose.
    pub fn relativize(&self, trajectory: &Trajectory) -> TrajectoryResult<Trajectory> {
        // Row of the reference within the trajectory, 0 when supplied from outside
        let (reference, reference_row) = match &self.config.reference {
            Reference::Pose(pose) => (pose, 0),
            Reference::First => match trajectory.first() {
                Some(pose) => (pose, 1),
                None => return Ok(Trajectory::new()),
            },
        };

        if let Some(tolerance) = self.config.rotation_tolerance {
            reference
                .to_se3()
                .check_rotation(tolerance)
                .map_err(|err| with_row(err, reference_row))?;
        }

        let frame = ReferenceFrame::from_pose(reference);
        debug!(
            "Relativizing {} poses against reference at t={}",
            trajectory.len(),
            frame.time
        );

        map_rows(trajectory, |index, pose| {
            if let Some(tolerance) = self.config.rotation_tolerance {
                pose.to_se3()
                    .check_rotation(tolerance)
                    .map_err(|err| with_row(err, index + 1))?;
            }
            Ok(self.relativize_pose(&frame, pose))
        })
    }

    fn relativize_pose(&self, frame: &ReferenceFrame, pose: &Pose) -> Pose {
        let translation = frame.rotation_inv.act(&(pose.translation - frame.origin));
        let rotation = pose.orientation.to_so3().compose(&frame.rotation_inv);
        let time = if self.config.shift_time {
            pose.time - frame.time
        } else {
            pose.time
        };

        Pose::new(
            time,
            translation,
            Orientation::from_so3(&rotation, self.config.output_encoding),
        )
    }
}

/// Relativize against the first pose with default settings.
pub fn relativize(trajectory: &Trajectory) -> TrajectoryResult<Trajectory> {
    Relativizer::new().relativize(trajectory)
}

fn with_row(err: TrajectoryError, row: usize) -> TrajectoryError {
    match err {
        TrajectoryError::InvalidRotation { deviation, .. } => {
            TrajectoryError::InvalidRotation { row, deviation }
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifold::so3::{AngleUnit, EulerSequence};
    use crate::parser::ColumnLayout;
    use std::f64::consts::FRAC_PI_2;

    const TOLERANCE: f64 = 1e-12;

    fn parse(rows: &[&str]) -> Trajectory {
        let layout = ColumnLayout::default();
        rows.iter()
            .enumerate()
            .map(|(i, row)| {
                let tokens: Vec<&str> = row.split_whitespace().collect();
                layout.parse_row(&tokens, i + 1).unwrap()
            })
            .collect()
    }

    fn assert_row_approx(expected: &[f64], actual: &[f64]) {
        assert_eq!(expected.len(), actual.len());
        for (e, a) in expected.iter().zip(actual) {
            assert!((e - a).abs() < TOLERANCE, "expected {expected:?}, got {actual:?}");
        }
    }

    fn yaw_pose(time: f64, translation: Vector3<f64>, yaw: f64) -> Pose {
        Pose::new(
            time,
            translation,
            Orientation::Euler {
                roll: 0.0,
                pitch: 0.0,
                yaw,
                unit: AngleUnit::Radians,
                sequence: EulerSequence::IntrinsicXyz,
            },
        )
    }

    #[test]
    fn test_single_row_maps_to_identity() {
        let trajectory = parse(&["0.0 1 0 0 0 0 0 1"]);
        let relative = relativize(&trajectory).unwrap();
        assert_eq!(1, relative.len());
        assert_row_approx(
            &[0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0],
            &relative.rows()[0],
        );
    }

    #[test]
    fn test_pure_translation_unchanged() {
        let trajectory = parse(&["0 0 0 0 0 0 0 1", "1 1 0 0 0 0 0 1"]);
        let relative = relativize(&trajectory).unwrap();
        let rows = relative.rows();
        assert_row_approx(&[0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0], &rows[0]);
        assert_row_approx(&[1.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0], &rows[1]);
    }

    #[test]
    fn test_empty_trajectory() {
        let relative = relativize(&Trajectory::new()).unwrap();
        assert!(relative.is_empty());
    }

    #[test]
    fn test_reference_row_is_identity() {
        for _ in 0..20 {
            let reference = Pose::from_se3(
                5.0,
                &crate::manifold::se3::SE3::random(),
                OrientationEncoding::Quaternion,
            );
            let other = Pose::from_se3(
                6.0,
                &crate::manifold::se3::SE3::random(),
                OrientationEncoding::Quaternion,
            );
            let trajectory: Trajectory = vec![reference, other].into();
            let relative = relativize(&trajectory).unwrap();
            let first = relative.first().unwrap();

            assert!(first.translation.norm() < 1e-9);
            assert!(first.orientation.to_so3().is_approx(&SO3::identity(), 1e-9));
            assert_eq!(5.0, first.time);
        }
    }

    #[test]
    fn test_displacement_rotated_into_reference_frame() {
        // Reference faces +Y (yaw 90°); moving +Y in the world is +X locally
        let trajectory: Trajectory = vec![
            yaw_pose(0.0, Vector3::new(1.0, 1.0, 0.0), FRAC_PI_2),
            yaw_pose(1.0, Vector3::new(1.0, 3.0, 0.0), FRAC_PI_2),
        ]
        .into();

        let relative = relativize(&trajectory).unwrap();
        let second = relative.get(1).unwrap();
        assert!((second.translation - Vector3::new(2.0, 0.0, 0.0)).norm() < TOLERANCE);
        assert!(second.orientation.to_so3().is_approx(&SO3::identity(), TOLERANCE));
    }

    #[test]
    fn test_relative_orientation_order() {
        let q0 = SO3::random();
        let qi = SO3::random();
        let trajectory: Trajectory = vec![
            Pose::new(
                0.0,
                Vector3::zeros(),
                Orientation::from_so3(&q0, OrientationEncoding::Quaternion),
            ),
            Pose::new(
                1.0,
                Vector3::zeros(),
                Orientation::from_so3(&qi, OrientationEncoding::Quaternion),
            ),
        ]
        .into();

        let relative = relativize(&trajectory).unwrap();
        let rotation = relative.get(1).unwrap().orientation.to_so3();
        let expected = qi.rotation_matrix() * q0.rotation_matrix().transpose();
        assert!((rotation.rotation_matrix() - expected).norm() < 1e-9);
    }

    #[test]
    fn test_shift_time() {
        let trajectory = parse(&["10 0 0 0 0 0 0 1", "12.5 1 0 0 0 0 0 1"]);

        let relative = relativize(&trajectory).unwrap();
        assert_eq!(10.0, relative.get(0).unwrap().time);
        assert_eq!(12.5, relative.get(1).unwrap().time);

        let relativizer =
            Relativizer::with_config(RelativizerConfig::new().with_shift_time(true));
        let relative = relativizer.relativize(&trajectory).unwrap();
        assert_eq!(0.0, relative.get(0).unwrap().time);
        assert_eq!(2.5, relative.get(1).unwrap().time);
    }

    #[test]
    fn test_explicit_reference() {
        let trajectory = parse(&["0 5 0 0 0 0 0 1", "1 6 0 0 0 0 0 1"]);
        let reference = yaw_pose(0.0, Vector3::new(4.0, 0.0, 0.0), 0.0);
        let relativizer =
            Relativizer::with_config(RelativizerConfig::new().with_reference(reference));

        let relative = relativizer.relativize(&trajectory).unwrap();
        assert!((relative.get(0).unwrap().translation.x - 1.0).abs() < TOLERANCE);
        assert!((relative.get(1).unwrap().translation.x - 2.0).abs() < TOLERANCE);

        // Explicit reference also applies to an empty trajectory
        assert!(relativizer.relativize(&Trajectory::new()).unwrap().is_empty());
    }

    #[test]
    fn test_euler_output_encoding() {
        let trajectory: Trajectory = vec![
            yaw_pose(0.0, Vector3::zeros(), 0.25),
            yaw_pose(1.0, Vector3::zeros(), 1.0),
        ]
        .into();
        let relativizer = Relativizer::with_config(
            RelativizerConfig::new().with_output_encoding(OrientationEncoding::euler_radians()),
        );
        let relative = relativizer.relativize(&trajectory).unwrap();
        let rows = relative.rows();
        assert_eq!(7, rows[1].len());
        assert_row_approx(&[1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.75], &rows[1]);
    }

    #[test]
    fn test_rotation_validation() {
        let layout = ColumnLayout::default().with_normalize_quaternions(false);
        let trajectory: Trajectory = ["0 0 0 0 0 0 0 1", "1 0 0 0 0 0 0 1.5"]
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let tokens: Vec<&str> = row.split_whitespace().collect();
                layout.parse_row(&tokens, i + 1).unwrap()
            })
            .collect();

        // Permissive by default
        assert!(relativize(&trajectory).is_ok());

        let relativizer =
            Relativizer::with_config(RelativizerConfig::new().with_rotation_tolerance(1e-6));
        assert!(matches!(
            relativizer.relativize(&trajectory),
            Err(TrajectoryError::InvalidRotation { row: 2, .. })
        ));
    }

    #[test]
    fn test_invalid_reference_row() {
        let layout = ColumnLayout::default().with_normalize_quaternions(false);
        let trajectory: Trajectory = ["0 0 0 0 0 0 0 1.5", "1 0 0 0 0 0 0 1"]
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let tokens: Vec<&str> = row.split_whitespace().collect();
                layout.parse_row(&tokens, i + 1).unwrap()
            })
            .collect();
        let bad_pose = trajectory.first().unwrap().clone();
        let config = RelativizerConfig::new().with_rotation_tolerance(1e-6);

        // First row of the trajectory
        let relativizer = Relativizer::with_config(config.clone());
        assert!(matches!(
            relativizer.relativize(&trajectory),
            Err(TrajectoryError::InvalidRotation { row: 1, .. })
        ));

        // Supplied from outside the trajectory
        let good = parse(&["0 0 0 0 0 0 0 1"]);
        let relativizer = Relativizer::with_config(config.with_reference(bad_pose));
        assert!(matches!(
            relativizer.relativize(&good),
            Err(TrajectoryError::InvalidRotation { row: 0, .. })
        ));
    }
}
