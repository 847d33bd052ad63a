//! High-level entry crate for global structure-from-motion geometry.
//!
//! The workflow is:
//!
//! 1. collect pairwise observations (`ViewIdPair → TwoViewInfo`) and absolute
//!    orientations from earlier pipeline stages,
//! 2. prune the view graph to its largest connected component,
//! 3. estimate camera positions with the robust LUD/IRLS estimator.
//!
//! ```no_run
//! use sfm::prelude::*;
//! use sfm::core::synthetic::scene::{PairTopology, SyntheticScene};
//!
//! # fn main() -> anyhow::Result<()> {
//! let scene = SyntheticScene::random(10, 42)?;
//! let mut view_pairs = scene.view_pairs(PairTopology::Complete);
//!
//! let (positions, report) = estimate_global_positions(
//!     &mut view_pairs,
//!     &scene.orientations,
//!     LudPositionEstimatorOptions::default(),
//! )?;
//! println!(
//!     "{} positions, {:?}",
//!     positions.len(),
//!     report.summary.termination
//! );
//! # Ok(())
//! # }
//! ```
//!
//! Camera intrinsics models live in [`core`] and are independent of the
//! position estimator; they serve the stages that produce and consume these
//! positions.

/// Filter-then-estimate convenience pipeline.
pub mod pipeline;

/// Core math types, camera intrinsics models, and the view-graph filter.
pub mod core {
    pub use sfm_core::*;
}

/// Non-linear least squares and position estimation.
pub mod optim {
    pub use sfm_optim::*;
}

/// Convenient re-exports for common use cases.
///
/// Import with `use sfm::prelude::*;` to get started quickly.
pub mod prelude {
    pub use crate::core::{
        largest_connected_component_pairs, remove_disconnected_view_pairs, CameraIntrinsics,
        CameraIntrinsicsModelType, CameraIntrinsicsPrior, OptimizeIntrinsicsMask, Real, Rot3,
        TwoViewInfo, Vec2, Vec3, ViewId, ViewIdPair,
    };
    pub use crate::optim::{
        LudPositionEstimator, LudPositionEstimatorOptions, PositionEstimationError,
        PositionEstimationSummary, PositionEstimationTermination,
    };
    pub use crate::pipeline::{estimate_global_positions, GlobalPositionsReport};
}
