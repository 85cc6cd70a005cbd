//! Rigid-body manifolds used to move poses between coordinate frames.
//!
//! - **SO(3)**: rotations in 3D, carried as unit quaternions
//! - **SE(3)**: rigid body transformations, carried as rotation matrix + translation
//!
//! Lie group    | size | dim | X ∈ M        | Constraint | Comp. | Action
//! ------------ | ---- | --- | ------------ | ---------- | ----- | ------
//! SO(3)        | 9    | 3   | R            | RᵀR = I    | R₁R₂  | Rx
//! SE(3)        | 16   | 6   | [R t; 0 1]   | RᵀR = I    | M₁M₂  | Rx+t
//!
//! Composition follows matrix multiplication order throughout: `a.compose(&b)`
//! applies `b` first, then `a`.
//!
//! # Example
//!
//! ```rust
//! use apex_trajectory::manifold::{LieGroup, se3::SE3, so3::SO3};
//! use nalgebra::Vector3;
//!
//! let a_t_b = SE3::from_translation_so3(
//!     Vector3::new(1.0, 0.0, 0.0),
//!     SO3::from_quaternion_coeffs(0.0, 0.0, 0.0, 1.0).unwrap(),
//! );
//! let identity = a_t_b.compose(&a_t_b.inverse());
//! assert!(identity.is_approx(&SE3::identity(), 1e-12));
//! ```

use nalgebra::Vector3;
use std::fmt::Debug;

pub mod se3;
pub mod so3;

/// Core trait for the group operations shared by SO(3) and SE(3).
///
/// Only the primitives needed to move poses between frames are exposed:
/// identity, inverse, composition and the group action on points.
pub trait LieGroup: Clone + Debug + PartialEq + Sized {
    /// Get the identity element of the group.
    fn identity() -> Self;

    /// Compute the inverse, such that `g ∘ g⁻¹ = e`.
    fn inverse(&self) -> Self;

    /// Compose two elements, `self ∘ other`.
    ///
    /// `other` is applied first, then `self`.
    fn compose(&self, other: &Self) -> Self;

    /// Apply the group action to a 3D point.
    fn act(&self, vector: &Vector3<f64>) -> Vector3<f64>;

    /// Get a random element (used by property tests).
    fn random() -> Self;

    /// Check whether the element satisfies its group constraint.
    fn is_valid(&self, tolerance: f64) -> bool;

    /// Compare two elements up to the given tolerance.
    fn is_approx(&self, other: &Self, tolerance: f64) -> bool;

    /// `self⁻¹ ∘ other`
    fn between(&self, other: &Self) -> Self {
        self.inverse().compose(other)
    }
}
