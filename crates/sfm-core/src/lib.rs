//! Core geometry for global structure-from-motion.
//!
//! This crate contains:
//! - linear algebra type aliases (`Real`, `Vec3`, `Rot3`, ...),
//! - view identifiers and pairwise two-view observations,
//! - camera intrinsics models (pinhole, field-of-view) with scalar-generic
//!   projection and distortion,
//! - union-find connected components and the view-graph connectivity filter,
//! - deterministic synthetic scenes for tests.
//!
//! Camera pipeline:
//! `pixel = K ∘ distortion ∘ perspective_divide(point)`

/// Union-find over view ids.
pub mod graph;
/// Linear algebra type aliases and rotation helpers.
pub mod math;
/// Camera intrinsics models, priors and persistence.
pub mod models;
/// Deterministic synthetic scene generators.
pub mod synthetic;
/// View identifiers and two-view observations.
pub mod types;
/// Largest-connected-component filtering of the view graph.
pub mod view_graph;

pub use graph::*;
pub use math::*;
pub use models::*;
pub use types::*;
pub use view_graph::*;
