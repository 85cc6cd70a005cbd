//! Whole-trajectory frame changes.
//!
//! - [`relativize`]: re-express a trajectory in the frame of one of its poses
//! - [`extrinsic`]: push every pose through a fixed calibration transform
//!
//! Both are row-wise maps over an immutable shared transform. Rows are
//! independent, so long trajectories are mapped with rayon; output order is
//! always input order.

use crate::error::TrajectoryResult;
use crate::pose::{Pose, Trajectory};
use rayon::prelude::*;

pub mod extrinsic;
pub mod relativize;

pub use extrinsic::{ExtrinsicCompositor, ExtrinsicConfig};
pub use relativize::{Reference, Relativizer, RelativizerConfig};

/// Row count above which trajectories are mapped in parallel.
pub const PARALLEL_THRESHOLD: usize = 5000;

/// Map every pose with its 0-based row index, preserving order.
pub(crate) fn map_rows<F>(trajectory: &Trajectory, f: F) -> TrajectoryResult<Trajectory>
where
    F: Fn(usize, &Pose) -> TrajectoryResult<Pose> + Sync + Send,
{
    let poses = trajectory.poses();
    let mapped: TrajectoryResult<Vec<Pose>> = if poses.len() > PARALLEL_THRESHOLD {
        poses
            .par_iter()
            .enumerate()
            .map(|(index, pose)| f(index, pose))
            .collect()
    } else {
        poses
            .iter()
            .enumerate()
            .map(|(index, pose)| f(index, pose))
            .collect()
    };

    mapped.map(Trajectory::from)
}
