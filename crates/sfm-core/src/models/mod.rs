//! Camera intrinsics models.
//!
//! A camera intrinsics model maps between two coordinate systems:
//!
//! 1. the camera frame: 3D, centred at the camera, +z looking forward;
//! 2. the image frame: 2D pixels, origin at the top-left corner, +x right,
//!    +y down.
//!
//! The mapping is always composed of the same three stages:
//! `pixel = K ∘ distortion ∘ perspective_divide(point)`.
//!
//! Every concrete model implements [`CameraIntrinsicsModel`], whose math is
//! written once, generically over [`nalgebra::RealField`], so the same code
//! serves plain `f64` evaluation and dual numbers for automatic
//! differentiation. [`CameraIntrinsics`] is the closed set of supported
//! models, selected by [`CameraIntrinsicsModelType`] at construction.

mod fov;
mod intrinsics;
mod pinhole;
mod prior;
mod record;

pub use fov::*;
pub use intrinsics::*;
pub use pinhole::*;
pub use prior::*;
pub use record::*;
