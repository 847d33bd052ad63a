//! End-to-end global position estimation: prune the view graph to its
//! largest connected component, then estimate positions.

use std::collections::HashMap;

use log::info;
use sfm_core::{remove_disconnected_view_pairs, Rot3, TwoViewInfo, Vec3, ViewId, ViewIdPair};
use sfm_optim::{
    LudPositionEstimator, LudPositionEstimatorOptions, PositionEstimationError,
    PositionEstimationSummary,
};

#[derive(Debug, Clone)]
pub struct GlobalPositionsReport {
    /// View pairs dropped because they lie outside the largest component.
    pub num_removed_pairs: usize,
    pub summary: PositionEstimationSummary,
}

/// Filter `view_pairs` in place and estimate one position per remaining view.
///
/// Views outside the largest connected component never appear in the
/// returned map.
pub fn estimate_global_positions(
    view_pairs: &mut HashMap<ViewIdPair, TwoViewInfo>,
    orientations: &HashMap<ViewId, Rot3>,
    options: LudPositionEstimatorOptions,
) -> Result<(HashMap<ViewId, Vec3>, GlobalPositionsReport), PositionEstimationError> {
    let num_removed_pairs = remove_disconnected_view_pairs(view_pairs);
    if num_removed_pairs > 0 {
        info!("dropped {num_removed_pairs} view pairs outside the largest connected component");
    }

    let estimator = LudPositionEstimator::new(options);
    let mut positions = HashMap::new();
    let summary = estimator.estimate_positions(view_pairs, orientations, &mut positions)?;

    Ok((
        positions,
        GlobalPositionsReport {
            num_removed_pairs,
            summary,
        },
    ))
}
