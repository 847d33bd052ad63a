use nalgebra::{convert, RealField, Vector2, Vector3};
use serde::{Deserialize, Serialize};

use super::{
    CameraIntrinsicsModel, CameraIntrinsicsModelType, CameraIntrinsicsPrior,
    OptimizeIntrinsicsMask,
};
use crate::{Mat3, Real};

/// Below this value of `omega` or of the squared radius, the FOV
/// distortion degenerates to the identity.
pub const FOV_IDENTITY_THRESHOLD: Real = 1e-8;

/// Field-of-view camera model (Devernay & Faugeras, 2001).
///
/// A single distortion parameter `omega` approximates the field of view of a
/// wide-angle lens:
///
/// ```text
/// r_d = atan(2 r_u tan(omega / 2)) / omega
/// r_u = tan(r_d omega) / (2 tan(omega / 2))
/// ```
///
/// Parameter layout: `[f, aspect_ratio, cx, cy, omega]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FovCameraModel {
    parameters: [Real; 5],
}

impl FovCameraModel {
    pub const ASPECT_RATIO: usize = 1;
    pub const OMEGA: usize = 4;

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

    pub fn radial_distortion(&self) -> Real {
        self.parameters[Self::OMEGA]
    }

    pub fn set_radial_distortion(&mut self, omega: Real) {
        self.parameters[Self::OMEGA] = omega;
    }
}

impl Default for FovCameraModel {
    fn default() -> Self {
        Self {
            parameters: [1.0, 1.0, 0.0, 0.0, 0.0],
        }
    }
}

impl CameraIntrinsicsModel for FovCameraModel {
    const MODEL_TYPE: CameraIntrinsicsModelType = CameraIntrinsicsModelType::Fov;
    const NUM_PARAMETERS: usize = 5;
    const FOCAL_LENGTH: usize = 0;
    const PRINCIPAL_POINT_X: usize = 2;
    const PRINCIPAL_POINT_Y: usize = 3;

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
        if let Some([x, y]) = prior.principal_point_or_image_center() {
            self.set_principal_point(x, y);
        }
        if let Some(k) = prior.radial_distortion {
            self.set_radial_distortion(k[0]);
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
        if !mask.principal_point {
            constant.push(Self::PRINCIPAL_POINT_X);
            constant.push(Self::PRINCIPAL_POINT_Y);
        }
        if !mask.radial_distortion {
            constant.push(Self::OMEGA);
        }
        constant
    }

    fn calibration_matrix(&self) -> Mat3 {
        let f = self.focal_length();
        let (cx, cy) = self.principal_point();
        Mat3::new(f, 0.0, cx, 0.0, f * self.aspect_ratio(), cy, 0.0, 0.0, 1.0)
    }

    fn camera_to_pixel<T: RealField>(params: &[T], point: &Vector3<T>) -> Vector2<T> {
        let depth = point.z.clone();
        let normalized = Vector2::new(point.x.clone() / depth.clone(), point.y.clone() / depth);
        let d = Self::distort_point(params, &normalized);

        let f = params[Self::FOCAL_LENGTH].clone();
        let fy = f.clone() * params[Self::ASPECT_RATIO].clone();
        Vector2::new(
            f * d.x.clone() + params[Self::PRINCIPAL_POINT_X].clone(),
            fy * d.y.clone() + params[Self::PRINCIPAL_POINT_Y].clone(),
        )
    }

    fn pixel_to_camera<T: RealField>(params: &[T], pixel: &Vector2<T>) -> Vector3<T> {
        let f = params[Self::FOCAL_LENGTH].clone();
        let fy = f.clone() * params[Self::ASPECT_RATIO].clone();
        let distorted = Vector2::new(
            (pixel.x.clone() - params[Self::PRINCIPAL_POINT_X].clone()) / f,
            (pixel.y.clone() - params[Self::PRINCIPAL_POINT_Y].clone()) / fy,
        );
        let u = Self::undistort_point(params, &distorted);
        Vector3::new(u.x.clone(), u.y.clone(), T::one())
    }

    fn distort_point<T: RealField>(params: &[T], undistorted: &Vector2<T>) -> Vector2<T> {
        let omega = params[Self::OMEGA].clone();
        let r_u_sq = undistorted.norm_squared();
        let tiny: T = convert(FOV_IDENTITY_THRESHOLD);
        if omega < tiny || r_u_sq < tiny {
            return undistorted.clone();
        }

        let two: T = convert(2.0);
        let r_u = r_u_sq.sqrt();
        let r_d = (two.clone() * r_u.clone() * (omega.clone() / two).tan()).atan();
        let scale = r_d / (r_u * omega);
        Vector2::new(
            scale.clone() * undistorted.x.clone(),
            scale * undistorted.y.clone(),
        )
    }

    fn undistort_point<T: RealField>(params: &[T], distorted: &Vector2<T>) -> Vector2<T> {
        let omega = params[Self::OMEGA].clone();
        let r_d_sq = distorted.norm_squared();
        let tiny: T = convert(FOV_IDENTITY_THRESHOLD);
        if omega < tiny || r_d_sq < tiny {
            return distorted.clone();
        }

        let two: T = convert(2.0);
        let r_d = r_d_sq.sqrt();
        let r_u = (r_d.clone() * omega.clone()).tan();
        let scale = r_u / (two * r_d * (omega / convert::<Real, T>(2.0)).tan());
        Vector2::new(
            scale.clone() * distorted.x.clone(),
            scale * distorted.y.clone(),
        )
    }
}
