use serde::{Deserialize, Serialize};

use crate::Real;

/// Externally supplied best guesses for camera intrinsics (EXIF, a
/// calibration file, user input). Unset fields leave the model untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraIntrinsicsPrior {
    pub focal_length: Option<Real>,
    pub principal_point: Option<[Real; 2]>,
    pub aspect_ratio: Option<Real>,
    pub skew: Option<Real>,
    /// Model specific radial coefficients, lowest order first.
    pub radial_distortion: Option<[Real; 2]>,
    pub image_width: Option<u32>,
    pub image_height: Option<u32>,
}

impl CameraIntrinsicsPrior {
    /// The principal point prior, or the image center when only the image
    /// size is known.
    pub fn principal_point_or_image_center(&self) -> Option<[Real; 2]> {
        self.principal_point.or_else(|| match (self.image_width, self.image_height) {
            (Some(w), Some(h)) => Some([w as Real / 2.0, h as Real / 2.0]),
            _ => None,
        })
    }
}

/// Which intrinsic parameter groups are free during refinement.
///
/// Groups that a model does not have (skew for the FOV model, tangential
/// distortion for both supported models) are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizeIntrinsicsMask {
    pub focal_length: bool,
    pub aspect_ratio: bool,
    pub skew: bool,
    pub principal_point: bool,
    pub radial_distortion: bool,
    pub tangential_distortion: bool,
}

impl OptimizeIntrinsicsMask {
    pub fn all() -> Self {
        Self {
            focal_length: true,
            aspect_ratio: true,
            skew: true,
            principal_point: true,
            radial_distortion: true,
            tangential_distortion: true,
        }
    }

    pub fn none() -> Self {
        Self {
            focal_length: false,
            aspect_ratio: false,
            skew: false,
            principal_point: false,
            radial_distortion: false,
            tangential_distortion: false,
        }
    }
}

impl Default for OptimizeIntrinsicsMask {
    fn default() -> Self {
        Self {
            focal_length: true,
            radial_distortion: true,
            ..Self::none()
        }
    }
}
