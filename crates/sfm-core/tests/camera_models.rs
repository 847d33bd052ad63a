//! Integration tests for the camera intrinsics models.
//!
//! Covers forward/inverse consistency of both lens models, the FOV identity
//! fallback, and evaluation of the generic projection with dual numbers.

use nalgebra::{SVector, Vector2};
use num_dual::{jacobian, DualSVec64};
use sfm_core::{
    CameraIntrinsics, CameraIntrinsicsModel, CameraIntrinsicsModelType, CameraIntrinsicsPrior,
    FovCameraModel, PinholeCameraModel, Real, Vec2, Vec3,
};

fn fov_camera(omega: Real) -> CameraIntrinsics {
    CameraIntrinsics::from_parameters(
        CameraIntrinsicsModelType::Fov,
        &[500.0, 1.02, 640.0, 360.0, omega],
    )
    .unwrap()
}

fn pinhole_camera() -> CameraIntrinsics {
    CameraIntrinsics::from_parameters(
        CameraIntrinsicsModelType::Pinhole,
        &[900.0, 0.98, 0.3, 640.0, 360.0, -0.2, 0.05],
    )
    .unwrap()
}

#[test]
fn fov_undistort_inverts_distort_on_a_grid() {
    for omega in [0.05, 0.4, 0.9, 1.3] {
        let camera = fov_camera(omega);
        for i in -6..=6 {
            for j in -6..=6 {
                let p = Vec2::new(i as Real * 0.1, j as Real * 0.1);
                if p.norm_squared() < 1e-8 {
                    continue;
                }
                let back = camera.undistort_point(&camera.distort_point(&p));
                assert!(
                    (back - p).norm() < 1e-6,
                    "omega={omega}, p={p:?}, back={back:?}"
                );
            }
        }
    }
}

#[test]
fn fov_identity_fallback_is_bit_exact() {
    let near_zero_omega = fov_camera(5e-9);
    let p = Vec2::new(0.731, -0.412);
    assert_eq!(near_zero_omega.distort_point(&p), p);
    assert_eq!(near_zero_omega.undistort_point(&p), p);

    let camera = fov_camera(1.1);
    let centre = Vec2::new(-3e-5, 6e-5);
    assert_eq!(camera.distort_point(&centre), centre);
    assert_eq!(camera.undistort_point(&centre), centre);
}

#[test]
fn pixel_round_trip_recovers_depth_scaled_point() {
    for camera in [fov_camera(0.8), pinhole_camera()] {
        let points = [
            Vec3::new(0.0, 0.0, 2.0),
            Vec3::new(0.2, 0.1, 2.5),
            Vec3::new(-0.15, -0.08, 1.8),
            Vec3::new(0.3, -0.2, 3.0),
        ];
        for point in points {
            let pixel = camera.camera_to_pixel(&point);
            let ray = camera.pixel_to_camera(&pixel);
            let reconstructed = ray * point.z;
            let err = (reconstructed - point).norm();
            assert!(
                err < 1e-7,
                "{}: point={point:?}, reconstructed={reconstructed:?}, err={err}",
                camera.model_type()
            );
        }
    }
}

#[test]
fn priors_set_focal_length_for_every_model() {
    let prior = CameraIntrinsicsPrior {
        focal_length: Some(1234.0),
        ..Default::default()
    };
    for ty in [CameraIntrinsicsModelType::Pinhole, CameraIntrinsicsModelType::Fov] {
        let mut camera = CameraIntrinsics::create(ty);
        camera.set_from_priors(&prior);
        assert_eq!(camera.focal_length(), 1234.0);
        assert_eq!(camera.calibration_matrix()[(0, 0)], 1234.0);
    }
}

#[test]
fn stored_camera_reloads_with_identical_projection() {
    for camera in [fov_camera(0.7), pinhole_camera()] {
        let json = camera.to_json().unwrap();
        let restored = CameraIntrinsics::from_json(&json).unwrap();
        assert_eq!(restored.num_parameters(), camera.num_parameters());
        let p = Vec3::new(0.12, -0.34, 1.7);
        assert_eq!(restored.camera_to_pixel(&p), camera.camera_to_pixel(&p));
    }
}

fn fd_jacobian<const N: usize>(
    f: impl Fn(&SVector<Real, N>) -> Vec2,
    x: &SVector<Real, N>,
) -> nalgebra::SMatrix<Real, 2, N> {
    let mut jac = nalgebra::SMatrix::<Real, 2, N>::zeros();
    for k in 0..N {
        let h = 1e-6 * x[k].abs().max(1.0);
        let mut xp = *x;
        let mut xm = *x;
        xp[k] += h;
        xm[k] -= h;
        let col = (f(&xp) - f(&xm)) / (2.0 * h);
        jac.set_column(k, &col);
    }
    jac
}

#[test]
fn fov_projection_autodiff_matches_finite_differences() {
    let params = SVector::<Real, 5>::from_row_slice(&[500.0, 1.02, 640.0, 360.0, 0.9]);
    let point = Vec3::new(0.3, -0.2, 1.5);

    let (value, jac) = jacobian(
        |p: SVector<DualSVec64<5>, 5>| {
            let pt = point.map(DualSVec64::<5>::from);
            let px = FovCameraModel::camera_to_pixel(p.as_slice(), &pt);
            Vector2::new(px.x, px.y)
        },
        params,
    );

    let plain = FovCameraModel::camera_to_pixel(params.as_slice(), &point);
    assert!((value - plain).norm() < 1e-9);

    let fd = fd_jacobian(
        |p| FovCameraModel::camera_to_pixel(p.as_slice(), &point),
        &params,
    );
    let err = (jac - fd).amax();
    assert!(err < 1e-4, "autodiff vs finite differences: max err={err}");
}

#[test]
fn pinhole_projection_autodiff_matches_finite_differences() {
    let params =
        SVector::<Real, 7>::from_row_slice(&[900.0, 0.98, 0.3, 640.0, 360.0, -0.2, 0.05]);
    let point = Vec3::new(-0.25, 0.1, 2.0);

    let (_, jac) = jacobian(
        |p: SVector<DualSVec64<7>, 7>| {
            let pt = point.map(DualSVec64::<7>::from);
            PinholeCameraModel::camera_to_pixel(p.as_slice(), &pt)
        },
        params,
    );

    let fd = fd_jacobian(
        |p| PinholeCameraModel::camera_to_pixel(p.as_slice(), &point),
        &params,
    );
    let err = (jac - fd).amax();
    assert!(err < 1e-4, "autodiff vs finite differences: max err={err}");
}
