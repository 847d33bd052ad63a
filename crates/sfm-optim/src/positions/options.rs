use serde::{Deserialize, Serialize};
use sfm_core::Real;

/// Configuration of [`super::LudPositionEstimator`].
///
/// Passed by value to the estimator constructor and never changed during a
/// solve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LudPositionEstimatorOptions {
    /// Worker threads used to assemble residuals and Jacobians.
    pub num_threads: usize,
    /// Iteration cap of each inner weighted least-squares solve.
    pub max_num_iterations: usize,
    /// Start from random positions instead of the caller-supplied ones.
    pub initialize_random_positions: bool,
    /// Number of reweighting rounds after the initial unit-weight solve.
    pub max_num_reweighted_iterations: usize,
    /// Relative change in positions below which reweighting stops.
    pub convergence_criterion: Real,
    /// Seed for random initialisation; `None` draws one from the OS.
    pub random_seed: Option<u64>,
}

impl Default for LudPositionEstimatorOptions {
    fn default() -> Self {
        Self {
            num_threads: 1,
            max_num_iterations: 400,
            initialize_random_positions: true,
            max_num_reweighted_iterations: 10,
            convergence_criterion: 1e-4,
            random_seed: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let opts: LudPositionEstimatorOptions =
            serde_json::from_str(r#"{ "num_threads": 4, "random_seed": 11 }"#).unwrap();
        assert_eq!(opts.num_threads, 4);
        assert_eq!(opts.random_seed, Some(11));
        assert_eq!(opts.max_num_iterations, 400);
        assert_eq!(opts.max_num_reweighted_iterations, 10);
        assert!(opts.initialize_random_positions);
        assert_eq!(opts.convergence_criterion, 1e-4);
    }
}
