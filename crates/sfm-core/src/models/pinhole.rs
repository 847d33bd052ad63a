use nalgebra::{convert, RealField, Vector2, Vector3};
use serde::{Deserialize, Serialize};

use super::{
    CameraIntrinsicsModel, CameraIntrinsicsModelType, CameraIntrinsicsPrior,
    OptimizeIntrinsicsMask,
};
use crate::{Mat3, Real};

const UNDISTORT_MAX_ITERS: usize = 100;
const UNDISTORT_EPS: Real = 1e-10;

/// Pinhole camera with skew and two-coefficient radial distortion.
///
/// Parameter layout: `[f, aspect_ratio, skew, cx, cy, k1, k2]`, with the
/// radial factor `1 + k1 r² + k2 r⁴` applied to normalized coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PinholeCameraModel {
    parameters: [Real; 7],
}

impl PinholeCameraModel {
    pub const ASPECT_RATIO: usize = 1;
    pub const SKEW: usize = 2;
    pub const RADIAL_DISTORTION_1: usize = 5;
    pub const RADIAL_DISTORTION_2: usize = 6;

    pub fn focal_length(&self) -> Real {
        self.parameters[Self::FOCAL_LENGTH]
    }

    pub fn set_focal_length(&mut self, focal_length: Real) {
        self.parameters[Self::FOCAL_LENGTH] = focal_length;
    }

    pub fn aspect_ratio(&self) -> Real {
        self.parameters[Self::ASPECT_RATIO]
    }

    pub fn set_aspect_ratio(&mut self, aspect_ratio: Real) {
        self.parameters[Self::ASPECT_RATIO] = aspect_ratio;
    }

    pub fn skew(&self) -> Real {
        self.parameters[Self::SKEW]
    }

    pub fn set_skew(&mut self, skew: Real) {
        self.parameters[Self::SKEW] = skew;
    }

    pub fn principal_point(&self) -> (Real, Real) {
        (
            self.parameters[Self::PRINCIPAL_POINT_X],
            self.parameters[Self::PRINCIPAL_POINT_Y],
        )
    }

    pub fn set_principal_point(&mut self, x: Real, y: Real) {
        self.parameters[Self::PRINCIPAL_POINT_X] = x;
        self.parameters[Self::PRINCIPAL_POINT_Y] = y;
    }

    pub fn radial_distortion(&self) -> (Real, Real) {
        (
            self.parameters[Self::RADIAL_DISTORTION_1],
            self.parameters[Self::RADIAL_DISTORTION_2],
        )
    }

    pub fn set_radial_distortion(&mut self, k1: Real, k2: Real) {
        self.parameters[Self::RADIAL_DISTORTION_1] = k1;
        self.parameters[Self::RADIAL_DISTORTION_2] = k2;
    }

    fn radial_factor<T: RealField>(params: &[T], r2: T) -> T {
        let k1 = params[Self::RADIAL_DISTORTION_1].clone();
        let k2 = params[Self::RADIAL_DISTORTION_2].clone();
        T::one() + k1 * r2.clone() + k2 * r2.clone() * r2
    }
}

impl Default for PinholeCameraModel {
    fn default() -> Self {
        Self {
            parameters: [1.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        }
    }
}

impl CameraIntrinsicsModel for PinholeCameraModel {
    const MODEL_TYPE: CameraIntrinsicsModelType = CameraIntrinsicsModelType::Pinhole;
    const NUM_PARAMETERS: usize = 7;
    const FOCAL_LENGTH: usize = 0;
    const PRINCIPAL_POINT_X: usize = 3;
    const PRINCIPAL_POINT_Y: usize = 4;

    fn parameters(&self) -> &[Real] {
        &self.parameters
    }

    fn parameters_mut(&mut self) -> &mut [Real] {
        &mut self.parameters
    }

    fn set_from_priors(&mut self, prior: &CameraIntrinsicsPrior) {
        if let Some(f) = prior.focal_length {
            self.set_focal_length(f);
        }
        if let Some(a) = prior.aspect_ratio {
            self.set_aspect_ratio(a);
        }
        if let Some(s) = prior.skew {
            self.set_skew(s);
        }
        if let Some([x, y]) = prior.principal_point_or_image_center() {
            self.set_principal_point(x, y);
        }
        if let Some(k) = prior.radial_distortion {
            self.set_radial_distortion(k[0], k[1]);
        }
    }

    fn constant_parameter_indices(&self, mask: &OptimizeIntrinsicsMask) -> Vec<usize> {
        let mut constant = Vec::new();
        if !mask.focal_length {
            constant.push(Self::FOCAL_LENGTH);
        }
        if !mask.aspect_ratio {
            constant.push(Self::ASPECT_RATIO);
        }
        if !mask.skew {
            constant.push(Self::SKEW);
        }
        if !mask.principal_point {
            constant.push(Self::PRINCIPAL_POINT_X);
            constant.push(Self::PRINCIPAL_POINT_Y);
        }
        if !mask.radial_distortion {
            constant.push(Self::RADIAL_DISTORTION_1);
            constant.push(Self::RADIAL_DISTORTION_2);
        }
        constant
    }

    fn calibration_matrix(&self) -> Mat3 {
        let f = self.focal_length();
        let (cx, cy) = self.principal_point();
        Mat3::new(f, self.skew(), cx, 0.0, f * self.aspect_ratio(), cy, 0.0, 0.0, 1.0)
    }

    fn camera_to_pixel<T: RealField>(params: &[T], point: &Vector3<T>) -> Vector2<T> {
        let depth = point.z.clone();
        let normalized = Vector2::new(point.x.clone() / depth.clone(), point.y.clone() / depth);
        let d = Self::distort_point(params, &normalized);

        let f = params[Self::FOCAL_LENGTH].clone();
        let fy = f.clone() * params[Self::ASPECT_RATIO].clone();
        let skew = params[Self::SKEW].clone();
        Vector2::new(
            f * d.x.clone() + skew * d.y.clone() + params[Self::PRINCIPAL_POINT_X].clone(),
            fy * d.y.clone() + params[Self::PRINCIPAL_POINT_Y].clone(),
        )
    }

    fn pixel_to_camera<T: RealField>(params: &[T], pixel: &Vector2<T>) -> Vector3<T> {
        let f = params[Self::FOCAL_LENGTH].clone();
        let fy = f.clone() * params[Self::ASPECT_RATIO].clone();
        let skew = params[Self::SKEW].clone();

        let y = (pixel.y.clone() - params[Self::PRINCIPAL_POINT_Y].clone()) / fy;
        let x = (pixel.x.clone() - params[Self::PRINCIPAL_POINT_X].clone() - skew * y.clone()) / f;
        let u = Self::undistort_point(params, &Vector2::new(x, y));
        Vector3::new(u.x.clone(), u.y.clone(), T::one())
    }

    fn distort_point<T: RealField>(params: &[T], undistorted: &Vector2<T>) -> Vector2<T> {
        let factor = Self::radial_factor(params, undistorted.norm_squared());
        Vector2::new(
            factor.clone() * undistorted.x.clone(),
            factor * undistorted.y.clone(),
        )
    }

    /// Inverts the radial polynomial by fixed-point iteration
    /// `u ← d / factor(|u|²)`.
    fn undistort_point<T: RealField>(params: &[T], distorted: &Vector2<T>) -> Vector2<T> {
        let eps: T = convert(UNDISTORT_EPS);
        let mut u = distorted.clone();
        for _ in 0..UNDISTORT_MAX_ITERS {
            let factor = Self::radial_factor(params, u.norm_squared());
            let next = Vector2::new(
                distorted.x.clone() / factor.clone(),
                distorted.y.clone() / factor,
            );
            let dx = (next.x.clone() - u.x.clone()).abs();
            let dy = (next.y.clone() - u.y.clone()).abs();
            u = next;
            if dx < eps && dy < eps {
                break;
            }
        }
        u
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Vec2, Vec3};

    fn params() -> [Real; 7] {
        [800.0, 1.0, 0.0, 320.0, 240.0, -0.15, 0.02]
    }

    #[test]
    fn distort_undistort_round_trip() {
        let p = params();
        for x in [-0.5, -0.1, 0.0, 0.2, 0.45] {
            for y in [-0.4, 0.0, 0.3] {
                let u = Vec2::new(x, y);
                let d = PinholeCameraModel::distort_point(&p, &u);
                let back = PinholeCameraModel::undistort_point(&p, &d);
                assert!((back - u).norm() < 1e-8, "u={u:?}, back={back:?}");
            }
        }
    }

    #[test]
    fn zero_distortion_projects_like_k_matrix() {
        let mut model = PinholeCameraModel::default();
        model.set_focal_length(600.0);
        model.set_skew(2.0);
        model.set_principal_point(300.0, 200.0);

        let pw = Vec3::new(0.2, -0.1, 2.0);
        let px = PinholeCameraModel::camera_to_pixel(model.parameters(), &pw);
        let h = model.calibration_matrix() * pw;
        let expected = Vec2::new(h.x / h.z, h.y / h.z);
        assert!((px - expected).norm() < 1e-10);
    }

    #[test]
    fn priors_fill_only_given_fields() {
        let mut model = PinholeCameraModel::default();
        let prior = CameraIntrinsicsPrior {
            focal_length: Some(1000.0),
            image_width: Some(1920),
            image_height: Some(1080),
            ..CameraIntrinsicsPrior::default()
        };
        model.set_from_priors(&prior);
        assert_eq!(model.focal_length(), 1000.0);
        assert_eq!(model.principal_point(), (960.0, 540.0));
        assert_eq!(model.aspect_ratio(), 1.0);
        assert_eq!(model.radial_distortion(), (0.0, 0.0));
    }

    #[test]
    fn default_mask_optimizes_focal_length_and_radial_distortion() {
        let model = PinholeCameraModel::default();
        let constant = model.constant_parameter_indices(&OptimizeIntrinsicsMask::default());
        assert_eq!(constant, vec![1, 2, 3, 4]);
    }
}
