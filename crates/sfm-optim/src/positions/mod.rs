//! Global camera position estimation from pairwise translation directions.
//!
//! Given known absolute orientations, each view pair `(i, j)` contributes the
//! world-frame direction `d_ij = R_iᵀ t_ij` and the constraint
//! `c_j − c_i ≈ s_ij d_ij` with an unknown scale `s_ij ≥ 1`. Positions are
//! recovered by minimising the sum of unsquared residual norms with
//! iteratively reweighted least squares (least unsquared deviations).

mod estimator;
mod options;
mod problem;

pub use estimator::*;
pub use options::*;
