use crate::{rotation_from_angle_axis, Real, Rot3, Vec3};
use serde::{Deserialize, Serialize};

/// Relative geometry between the two views of a [`crate::ViewIdPair`].
///
/// The pose of the second view is expressed in the coordinate frame of the
/// first view (the one with the smaller id): `rotation_2` maps camera-1
/// coordinates to camera-2 coordinates and `position_2` is the centre of
/// camera 2 seen from camera 1. Only the direction of `position_2` is
/// meaningful; it is kept at unit length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TwoViewInfo {
    /// Focal length of view 1 used during two-view estimation (pixels).
    pub focal_length_1: Real,
    /// Focal length of view 2 used during two-view estimation (pixels).
    pub focal_length_2: Real,
    /// Relative rotation as an angle-axis vector.
    pub rotation_2: Vec3,
    /// Unit direction towards camera 2, in camera-1 coordinates.
    pub position_2: Vec3,
    /// Number of matches that survived geometric verification.
    pub num_verified_matches: usize,
    /// Number of matches explained by a homography.
    pub num_homography_inliers: usize,
    /// Confidence score of the pair (higher is better).
    pub visibility_score: i32,
}

impl Default for TwoViewInfo {
    fn default() -> Self {
        Self {
            focal_length_1: 0.0,
            focal_length_2: 0.0,
            rotation_2: Vec3::zeros(),
            position_2: Vec3::zeros(),
            num_verified_matches: 0,
            num_homography_inliers: 0,
            visibility_score: 0,
        }
    }
}

impl TwoViewInfo {
    /// Build an observation from a relative rotation and a translation
    /// direction. The direction is normalised.
    pub fn from_relative_pose(rotation_2: &Rot3, position_2: &Vec3) -> Self {
        Self {
            rotation_2: rotation_2.scaled_axis(),
            position_2: position_2.normalize(),
            ..Self::default()
        }
    }

    /// Relative rotation as a rotation matrix.
    pub fn relative_rotation(&self) -> Rot3 {
        rotation_from_angle_axis(&self.rotation_2)
    }

    /// Same relationship seen from the other view.
    ///
    /// Used when a pair was estimated with the larger id as the reference view.
    pub fn swapped(&self) -> Self {
        let r = self.relative_rotation();
        let position_1 = -(r * self.position_2);
        Self {
            focal_length_1: self.focal_length_2,
            focal_length_2: self.focal_length_1,
            rotation_2: r.inverse().scaled_axis(),
            position_2: position_1,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_relative_pose_normalises_direction() {
        let info = TwoViewInfo::from_relative_pose(&Rot3::identity(), &Vec3::new(0.0, 3.0, 4.0));
        assert!((info.position_2.norm() - 1.0).abs() < 1e-12);
        assert!((info.position_2 - Vec3::new(0.0, 0.6, 0.8)).norm() < 1e-12);
    }

    #[test]
    fn swapping_twice_is_identity() {
        let r = rotation_from_angle_axis(&Vec3::new(0.05, 0.2, -0.1));
        let mut info = TwoViewInfo::from_relative_pose(&r, &Vec3::new(1.0, 0.2, -0.3));
        info.focal_length_1 = 500.0;
        info.focal_length_2 = 600.0;

        let swapped = info.swapped();
        assert_eq!(swapped.focal_length_1, 600.0);
        let back = swapped.swapped();
        assert!((back.position_2 - info.position_2).norm() < 1e-12);
        assert!((back.rotation_2 - info.rotation_2).norm() < 1e-12);
    }

    #[test]
    fn swapped_direction_points_back_to_first_camera() {
        // Camera 1 at origin with identity, camera 2 at +x rotated about y.
        let r_w2 = rotation_from_angle_axis(&Vec3::new(0.0, 0.3, 0.0));
        let c2 = Vec3::new(1.0, 0.0, 0.0);
        let info = TwoViewInfo::from_relative_pose(&r_w2, &c2);

        let swapped = info.swapped();
        // Direction towards camera 1 in camera-2 coordinates.
        let expected = (r_w2 * (Vec3::zeros() - c2)).normalize();
        assert!((swapped.position_2 - expected).norm() < 1e-12);
    }
}
