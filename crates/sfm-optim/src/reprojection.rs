//! Reprojection residuals with autodiff Jacobians w.r.t. camera intrinsics.
//!
//! The residual is evaluated through the scalar-generic camera math of
//! [`sfm_core::CameraIntrinsicsModel`], once with `f64` and once with
//! `num-dual` dual numbers, so values and derivatives come from the same code.
//! Robust weights are applied as a constant `sqrt(w)` and never differentiated.

use nalgebra::{convert, DMatrix, RealField, SVector, Vector2, Vector3};
use num_dual::{jacobian, DualSVec64};
use sfm_core::{
    CameraIntrinsics, CameraIntrinsicsModel, CameraIntrinsicsModelType, FovCameraModel,
    OptimizeIntrinsicsMask, PinholeCameraModel, Real, Vec2, Vec3,
};

/// A camera-frame point and the pixel it was observed at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReprojectionObservation {
    pub point_camera: Vec3,
    pub pixel: Vec2,
    pub weight: Real,
}

impl ReprojectionObservation {
    pub fn new(point_camera: Vec3, pixel: Vec2) -> Self {
        Self {
            point_camera,
            pixel,
            weight: 1.0,
        }
    }
}

/// `sqrt(w) * (project(point) - pixel)` for any scalar type.
pub fn reprojection_residual_generic<T: RealField>(
    model_type: CameraIntrinsicsModelType,
    params: &[T],
    obs: &ReprojectionObservation,
) -> Vector2<T> {
    let point: Vector3<T> = obs.point_camera.map(convert);
    let projected = model_type.camera_to_pixel(params, &point);
    let sqrt_w: T = convert(obs.weight.sqrt());
    Vector2::new(
        (projected.x.clone() - convert::<Real, T>(obs.pixel.x)) * sqrt_w.clone(),
        (projected.y.clone() - convert::<Real, T>(obs.pixel.y)) * sqrt_w,
    )
}

pub fn reprojection_residual(camera: &CameraIntrinsics, obs: &ReprojectionObservation) -> Vec2 {
    reprojection_residual_generic(camera.model_type(), camera.parameters(), obs)
}

fn residual_and_jacobian<const N: usize>(
    model_type: CameraIntrinsicsModelType,
    params: &[Real],
    obs: &ReprojectionObservation,
) -> (Vec2, DMatrix<Real>) {
    let p0 = SVector::<Real, N>::from_column_slice(params);
    let (r, j) = jacobian(
        |p: SVector<DualSVec64<N>, N>| reprojection_residual_generic(model_type, p.as_slice(), obs),
        p0,
    );
    (Vec2::new(r[0], r[1]), DMatrix::from_fn(2, N, |row, col| j[(row, col)]))
}

/// Residual and its `2 × num_parameters` Jacobian w.r.t. the intrinsics.
///
/// With a mask, columns of parameters held constant are zeroed.
pub fn reprojection_jacobian_ad(
    camera: &CameraIntrinsics,
    obs: &ReprojectionObservation,
    mask: Option<&OptimizeIntrinsicsMask>,
) -> (Vec2, DMatrix<Real>) {
    let params = camera.parameters();
    let (r, mut j) = match camera.model_type() {
        CameraIntrinsicsModelType::Pinhole => residual_and_jacobian::<
            { PinholeCameraModel::NUM_PARAMETERS },
        >(CameraIntrinsicsModelType::Pinhole, params, obs),
        CameraIntrinsicsModelType::Fov => residual_and_jacobian::<{ FovCameraModel::NUM_PARAMETERS }>(
            CameraIntrinsicsModelType::Fov,
            params,
            obs,
        ),
    };

    if let Some(mask) = mask {
        for idx in camera.constant_parameter_indices(mask) {
            j.column_mut(idx).fill(0.0);
        }
    }
    (r, j)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cameras() -> Vec<CameraIntrinsics> {
        vec![
            CameraIntrinsics::from_parameters(
                CameraIntrinsicsModelType::Pinhole,
                &[700.0, 1.01, 0.2, 320.0, 240.0, -0.1, 0.02],
            )
            .unwrap(),
            CameraIntrinsics::from_parameters(
                CameraIntrinsicsModelType::Fov,
                &[400.0, 0.99, 330.0, 250.0, 0.85],
            )
            .unwrap(),
        ]
    }

    fn observation(camera: &CameraIntrinsics) -> ReprojectionObservation {
        let point = Vec3::new(0.3, -0.1, 1.8);
        let pixel = camera.camera_to_pixel(&point) + Vec2::new(0.5, -0.25);
        ReprojectionObservation {
            point_camera: point,
            pixel,
            weight: 4.0,
        }
    }

    #[test]
    fn residual_is_weighted_pixel_error() {
        for camera in cameras() {
            let r = reprojection_residual(&camera, &observation(&camera));
            assert!((r - Vec2::new(-1.0, 0.5)).norm() < 1e-9, "{r:?}");
        }
    }

    #[test]
    fn autodiff_matches_finite_differences() {
        for camera in cameras() {
            let obs = observation(&camera);
            let (r, j) = reprojection_jacobian_ad(&camera, &obs, None);
            assert!((r - reprojection_residual(&camera, &obs)).norm() < 1e-12);

            for col in 0..camera.num_parameters() {
                let h = 1e-6 * camera.parameters()[col].abs().max(1.0);
                let mut plus = camera.clone();
                let mut minus = camera.clone();
                plus.parameters_mut()[col] += h;
                minus.parameters_mut()[col] -= h;
                let fd = (reprojection_residual(&plus, &obs) - reprojection_residual(&minus, &obs))
                    / (2.0 * h);
                let err = (j.column(col) - fd).amax();
                assert!(err < 1e-4, "{} column {col}: err={err}", camera.model_type());
            }
        }
    }

    #[test]
    fn constant_parameters_have_zero_columns() {
        let mask = OptimizeIntrinsicsMask::default();
        for camera in cameras() {
            let (_, j) = reprojection_jacobian_ad(&camera, &observation(&camera), Some(&mask));
            for idx in camera.constant_parameter_indices(&mask) {
                assert!(j.column(idx).iter().all(|v| *v == 0.0));
            }
            assert!(j.column(0).amax() > 0.0, "focal length stays free");
        }
    }
}
