//! Deterministic synthetic data generation helpers.
//!
//! Ground-truth scenes for exercising the view-graph filter and the global
//! position estimator: random camera positions and orientations, exact
//! pairwise observations under a chosen graph topology, outlier injection,
//! and similarity alignment of estimates back onto ground truth.
//!
//! Everything is seeded explicitly and iterates views in id order, so the
//! same seed always produces the same scene.
//!
//! # Example
//!
//! ```
//! use sfm_core::synthetic::scene::{PairTopology, SyntheticScene};
//!
//! let scene = SyntheticScene::random(6, 7).unwrap();
//! let pairs = scene.view_pairs(PairTopology::Complete);
//! assert_eq!(pairs.len(), 15);
//! ```

pub mod scene;
