use nalgebra::{RealField, Vector2, Vector3};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::{CameraIntrinsicsPrior, FovCameraModel, OptimizeIntrinsicsMask, PinholeCameraModel};
use crate::{Mat3, Real, Vec2, Vec3};

/// Tag identifying a concrete camera intrinsics model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraIntrinsicsModelType {
    /// Pinhole camera with two-term polynomial radial distortion.
    Pinhole,
    /// Field-of-view (Devernay–Faugeras) model for wide-angle lenses.
    Fov,
}

impl fmt::Display for CameraIntrinsicsModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraIntrinsicsModelType::Pinhole => f.write_str("pinhole"),
            CameraIntrinsicsModelType::Fov => f.write_str("fov"),
        }
    }
}

#[derive(Debug, Error)]
pub enum CameraIntrinsicsError {
    #[error("parameter index {index} is out of range for the {model} model ({num_parameters} parameters)")]
    ParameterIndexOutOfRange {
        model: CameraIntrinsicsModelType,
        index: usize,
        num_parameters: usize,
    },
    #[error("the {model} model has {expected} parameters, got {found}")]
    ParameterCountMismatch {
        model: CameraIntrinsicsModelType,
        expected: usize,
        found: usize,
    },
    #[error("unsupported camera intrinsics record version {found} (supported: {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },
    #[error("camera intrinsics serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Contract implemented by every concrete camera intrinsics model.
///
/// Parameter storage is model specific, but the logical slots for focal
/// length and principal point are always exposed through
/// [`Self::FOCAL_LENGTH`], [`Self::PRINCIPAL_POINT_X`] and
/// [`Self::PRINCIPAL_POINT_Y`].
///
/// The associated functions operate on a raw parameter slice and are generic
/// over the scalar type so they can be used inside autodiff cost functions.
/// [`Self::distort_point`] and [`Self::undistort_point`] work in normalized
/// coordinates (before `K` is applied) and are mutual inverses.
pub trait CameraIntrinsicsModel {
    const MODEL_TYPE: CameraIntrinsicsModelType;
    const NUM_PARAMETERS: usize;
    const FOCAL_LENGTH: usize;
    const PRINCIPAL_POINT_X: usize;
    const PRINCIPAL_POINT_Y: usize;

    fn parameters(&self) -> &[Real];
    fn parameters_mut(&mut self) -> &mut [Real];

    /// Initialise parameters from externally supplied best guesses.
    fn set_from_priors(&mut self, prior: &CameraIntrinsicsPrior);

    /// Indices of the parameters that stay constant for the given mask.
    fn constant_parameter_indices(&self, mask: &OptimizeIntrinsicsMask) -> Vec<usize>;

    /// 3×3 calibration matrix `K`.
    fn calibration_matrix(&self) -> Mat3;

    /// Project a camera-frame point to a distorted pixel.
    ///
    /// `point.z` must be non-zero; the result is meaningless otherwise.
    fn camera_to_pixel<T: RealField>(params: &[T], point: &Vector3<T>) -> Vector2<T>;

    /// Back-project a pixel to a ray with `z == 1`.
    fn pixel_to_camera<T: RealField>(params: &[T], pixel: &Vector2<T>) -> Vector3<T>;

    fn distort_point<T: RealField>(params: &[T], undistorted: &Vector2<T>) -> Vector2<T>;

    fn undistort_point<T: RealField>(params: &[T], distorted: &Vector2<T>) -> Vector2<T>;
}

impl CameraIntrinsicsModelType {
    pub fn num_parameters(self) -> usize {
        match self {
            CameraIntrinsicsModelType::Pinhole => PinholeCameraModel::NUM_PARAMETERS,
            CameraIntrinsicsModelType::Fov => FovCameraModel::NUM_PARAMETERS,
        }
    }

    /// Generic projection dispatched on the tag, for callers that hold the
    /// parameters in their own (possibly dual-number) storage.
    pub fn camera_to_pixel<T: RealField>(self, params: &[T], point: &Vector3<T>) -> Vector2<T> {
        match self {
            CameraIntrinsicsModelType::Pinhole => PinholeCameraModel::camera_to_pixel(params, point),
            CameraIntrinsicsModelType::Fov => FovCameraModel::camera_to_pixel(params, point),
        }
    }

    pub fn pixel_to_camera<T: RealField>(self, params: &[T], pixel: &Vector2<T>) -> Vector3<T> {
        match self {
            CameraIntrinsicsModelType::Pinhole => PinholeCameraModel::pixel_to_camera(params, pixel),
            CameraIntrinsicsModelType::Fov => FovCameraModel::pixel_to_camera(params, pixel),
        }
    }

    pub fn distort_point<T: RealField>(self, params: &[T], point: &Vector2<T>) -> Vector2<T> {
        match self {
            CameraIntrinsicsModelType::Pinhole => PinholeCameraModel::distort_point(params, point),
            CameraIntrinsicsModelType::Fov => FovCameraModel::distort_point(params, point),
        }
    }

    pub fn undistort_point<T: RealField>(self, params: &[T], point: &Vector2<T>) -> Vector2<T> {
        match self {
            CameraIntrinsicsModelType::Pinhole => PinholeCameraModel::undistort_point(params, point),
            CameraIntrinsicsModelType::Fov => FovCameraModel::undistort_point(params, point),
        }
    }
}

/// A camera intrinsics model of any supported type.
///
/// Downstream code (reprojection errors, calibration-matrix export,
/// optimisation subsets) works through this type and never needs to know the
/// concrete lens model.
#[derive(Debug, Clone, PartialEq)]
pub enum CameraIntrinsics {
    Pinhole(PinholeCameraModel),
    Fov(FovCameraModel),
}

macro_rules! dispatch {
    ($self:expr, $m:ident => $body:expr) => {
        match $self {
            CameraIntrinsics::Pinhole($m) => $body,
            CameraIntrinsics::Fov($m) => $body,
        }
    };
}

impl CameraIntrinsics {
    /// Create a model of the given type with default parameters.
    pub fn create(model_type: CameraIntrinsicsModelType) -> Self {
        match model_type {
            CameraIntrinsicsModelType::Pinhole => {
                CameraIntrinsics::Pinhole(PinholeCameraModel::default())
            }
            CameraIntrinsicsModelType::Fov => CameraIntrinsics::Fov(FovCameraModel::default()),
        }
    }

    /// Create a model from a raw parameter vector.
    pub fn from_parameters(
        model_type: CameraIntrinsicsModelType,
        parameters: &[Real],
    ) -> Result<Self, CameraIntrinsicsError> {
        let expected = model_type.num_parameters();
        if parameters.len() != expected {
            return Err(CameraIntrinsicsError::ParameterCountMismatch {
                model: model_type,
                expected,
                found: parameters.len(),
            });
        }
        let mut camera = Self::create(model_type);
        camera.parameters_mut().copy_from_slice(parameters);
        Ok(camera)
    }

    pub fn model_type(&self) -> CameraIntrinsicsModelType {
        match self {
            CameraIntrinsics::Pinhole(_) => PinholeCameraModel::MODEL_TYPE,
            CameraIntrinsics::Fov(_) => FovCameraModel::MODEL_TYPE,
        }
    }

    pub fn num_parameters(&self) -> usize {
        self.parameters().len()
    }

    pub fn parameters(&self) -> &[Real] {
        dispatch!(self, m => m.parameters())
    }

    pub fn parameters_mut(&mut self) -> &mut [Real] {
        dispatch!(self, m => m.parameters_mut())
    }

    pub fn parameter(&self, index: usize) -> Result<Real, CameraIntrinsicsError> {
        self.parameters()
            .get(index)
            .copied()
            .ok_or_else(|| self.index_error(index))
    }

    pub fn set_parameter(&mut self, index: usize, value: Real) -> Result<(), CameraIntrinsicsError> {
        let err = self.index_error(index);
        let slot = self.parameters_mut().get_mut(index).ok_or(err)?;
        *slot = value;
        Ok(())
    }

    fn index_error(&self, index: usize) -> CameraIntrinsicsError {
        CameraIntrinsicsError::ParameterIndexOutOfRange {
            model: self.model_type(),
            index,
            num_parameters: self.num_parameters(),
        }
    }

    fn focal_length_index(&self) -> usize {
        match self {
            CameraIntrinsics::Pinhole(_) => PinholeCameraModel::FOCAL_LENGTH,
            CameraIntrinsics::Fov(_) => FovCameraModel::FOCAL_LENGTH,
        }
    }

    fn principal_point_indices(&self) -> (usize, usize) {
        match self {
            CameraIntrinsics::Pinhole(_) => (
                PinholeCameraModel::PRINCIPAL_POINT_X,
                PinholeCameraModel::PRINCIPAL_POINT_Y,
            ),
            CameraIntrinsics::Fov(_) => (
                FovCameraModel::PRINCIPAL_POINT_X,
                FovCameraModel::PRINCIPAL_POINT_Y,
            ),
        }
    }

    pub fn focal_length(&self) -> Real {
        self.parameters()[self.focal_length_index()]
    }

    pub fn set_focal_length(&mut self, focal_length: Real) {
        let idx = self.focal_length_index();
        self.parameters_mut()[idx] = focal_length;
    }

    pub fn principal_point_x(&self) -> Real {
        self.parameters()[self.principal_point_indices().0]
    }

    pub fn principal_point_y(&self) -> Real {
        self.parameters()[self.principal_point_indices().1]
    }

    pub fn set_principal_point(&mut self, x: Real, y: Real) {
        let (ix, iy) = self.principal_point_indices();
        let params = self.parameters_mut();
        params[ix] = x;
        params[iy] = y;
    }

    pub fn set_from_priors(&mut self, prior: &CameraIntrinsicsPrior) {
        dispatch!(self, m => m.set_from_priors(prior))
    }

    pub fn constant_parameter_indices(&self, mask: &OptimizeIntrinsicsMask) -> Vec<usize> {
        dispatch!(self, m => m.constant_parameter_indices(mask))
    }

    pub fn calibration_matrix(&self) -> Mat3 {
        dispatch!(self, m => m.calibration_matrix())
    }

    pub fn camera_to_pixel(&self, point: &Vec3) -> Vec2 {
        self.model_type().camera_to_pixel(self.parameters(), point)
    }

    pub fn pixel_to_camera(&self, pixel: &Vec2) -> Vec3 {
        self.model_type().pixel_to_camera(self.parameters(), pixel)
    }

    pub fn distort_point(&self, undistorted: &Vec2) -> Vec2 {
        self.model_type().distort_point(self.parameters(), undistorted)
    }

    pub fn undistort_point(&self, distorted: &Vec2) -> Vec2 {
        self.model_type().undistort_point(self.parameters(), distorted)
    }
}

impl From<PinholeCameraModel> for CameraIntrinsics {
    fn from(model: PinholeCameraModel) -> Self {
        CameraIntrinsics::Pinhole(model)
    }
}

impl From<FovCameraModel> for CameraIntrinsics {
    fn from(model: FovCameraModel) -> Self {
        CameraIntrinsics::Fov(model)
    }
}
