//! Non-linear least squares and robust global position estimation.
//!
//! This crate provides:
//! - a backend-agnostic [`NllsProblem`] trait with IRLS row scaling and a dense
//!   Levenberg–Marquardt backend ([`LmBackend`]),
//! - [`LudPositionEstimator`], which recovers camera positions from known
//!   orientations and pairwise translation directions,
//! - autodiff reprojection Jacobians over the generic camera intrinsics.

mod backend_lm;
pub mod positions;
pub mod reprojection;
mod traits;

pub use backend_lm::LmBackend;
pub use positions::*;
pub use traits::*;
