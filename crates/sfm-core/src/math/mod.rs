//! Mathematical utilities and type definitions.
//!
//! This module provides fundamental types used throughout the library
//! and a few small rotation helpers shared by the view-graph and
//! position-estimation code.

use nalgebra::{Matrix3, Point2, Point3, Rotation3, Vector2, Vector3};

/// Scalar type used throughout the library (currently `f64`).
pub type Real = f64;

/// 2D vector with [`Real`] components.
pub type Vec2 = Vector2<Real>;
/// 3D vector with [`Real`] components.
pub type Vec3 = Vector3<Real>;
/// 2D point with [`Real`] coordinates.
pub type Pt2 = Point2<Real>;
/// 3D point with [`Real`] coordinates.
pub type Pt3 = Point3<Real>;
/// 3×3 matrix with [`Real`] entries.
pub type Mat3 = Matrix3<Real>;
/// 3D rotation using [`Real`].
pub type Rot3 = Rotation3<Real>;

/// Build a rotation from an angle-axis vector (axis scaled by angle in radians).
pub fn rotation_from_angle_axis(angle_axis: &Vec3) -> Rot3 {
    Rot3::from_scaled_axis(*angle_axis)
}

/// Express a relative translation observed in camera `i` in the world frame.
///
/// `orientation_i` is the world-to-camera rotation of view `i`. The returned
/// vector is `R_iᵀ · t_ij`, i.e. the direction from camera `i` towards
/// camera `j` in world coordinates.
pub fn rotate_to_world(orientation_i: &Rot3, relative_translation: &Vec3) -> Vec3 {
    orientation_i.transpose() * relative_translation
}

/// Centroid of a set of points, or `None` for an empty set.
pub fn centroid<'a, I>(points: I) -> Option<Vec3>
where
    I: IntoIterator<Item = &'a Vec3>,
{
    let mut sum = Vec3::zeros();
    let mut n = 0usize;
    for p in points {
        sum += p;
        n += 1;
    }
    (n > 0).then(|| sum / n as Real)
}
