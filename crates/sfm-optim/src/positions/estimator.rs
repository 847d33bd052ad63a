use std::collections::HashMap;

use log::{debug, info, warn};
use nalgebra::DVector;
use rand::{rngs::StdRng, Rng, SeedableRng};
use rayon::ThreadPool;
use thiserror::Error;

use sfm_core::{rotate_to_world, Real, Rot3, TwoViewInfo, Vec3, ViewId, ViewIdPair};

use super::problem::{position, DirectionConstraint, LudProblem};
use super::LudPositionEstimatorOptions;
use crate::{LmBackend, NllsSolverBackend, SolveOptions, SolveStatus};

/// Lower bound on residual norms when computing IRLS weights.
pub const IRLS_WEIGHT_EPSILON: Real = 1e-6;

/// Random initial positions are drawn from `[-R, R]^3`.
const RANDOM_POSITION_RANGE: Real = 100.0;

/// A round whose starting positions cost less than this (sum of residual
/// norms) keeps them unchanged.
const NEGLIGIBLE_COST: Real = 1e-9;

#[derive(Debug, Error)]
pub enum PositionEstimationError {
    #[error("not enough constraints to estimate positions: {num_pairs} usable view pairs over {num_views} views")]
    InsufficientConstraints { num_pairs: usize, num_views: usize },
    #[error("inner solve failed in reweighting round {round}: {reason}")]
    SolverFailure { round: usize, reason: String },
    #[error("reweighting round {round} produced non-finite positions")]
    NonFinitePositions { round: usize },
    #[error("failed to build the worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// How the reweighting loop ended. Both outcomes return usable positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionEstimationTermination {
    Converged,
    IterationLimitReached,
}

#[derive(Debug, Clone)]
pub struct PositionEstimationSummary {
    pub termination: PositionEstimationTermination,
    /// Reweighting rounds run after the initial unit-weight solve.
    pub num_reweighted_iterations: usize,
    /// Sum of residual norms at the initial positions.
    pub initial_cost: Real,
    /// Sum of residual norms at the returned positions.
    pub final_cost: Real,
    /// IRLS weight of every used pair in the last solve.
    pub weights: HashMap<ViewIdPair, Real>,
    /// Pairs ignored because of a missing orientation or a degenerate direction.
    pub num_skipped_pairs: usize,
}

/// Constraint set built once per solve.
struct ConstraintGraph {
    views: Vec<ViewId>,
    pairs: Vec<ViewIdPair>,
    constraints: Vec<DirectionConstraint>,
    num_skipped: usize,
}

impl ConstraintGraph {
    fn build(
        view_pairs: &HashMap<ViewIdPair, TwoViewInfo>,
        orientations: &HashMap<ViewId, Rot3>,
    ) -> Self {
        let mut keys: Vec<&ViewIdPair> = view_pairs.keys().collect();
        keys.sort_unstable();

        let mut index: HashMap<ViewId, usize> = HashMap::new();
        let mut views = Vec::new();
        let mut pairs = Vec::with_capacity(keys.len());
        let mut constraints = Vec::with_capacity(keys.len());
        let mut num_skipped = 0;

        for pair in keys {
            let (a, b) = (pair.first(), pair.second());
            let (Some(orientation_a), true) = (orientations.get(&a), orientations.contains_key(&b))
            else {
                warn!("skipping view pair {pair}: missing orientation");
                num_skipped += 1;
                continue;
            };

            let direction = rotate_to_world(orientation_a, &view_pairs[pair].position_2);
            let norm = direction.norm();
            if !(norm.is_finite() && norm > 0.0) {
                warn!("skipping view pair {pair}: degenerate translation direction");
                num_skipped += 1;
                continue;
            }

            let mut intern = |id: ViewId| {
                *index.entry(id).or_insert_with(|| {
                    views.push(id);
                    views.len() - 1
                })
            };
            let i = intern(a);
            let j = intern(b);
            constraints.push(DirectionConstraint {
                i,
                j,
                direction: direction / norm,
            });
            pairs.push(*pair);
        }

        Self {
            views,
            pairs,
            constraints,
            num_skipped,
        }
    }
}

/// Robust global position estimator (least unsquared deviations via IRLS).
///
/// The solve starts with one ordinary least-squares round (unit weights),
/// then alternates weight updates `w = 1 / max(‖r‖, ε)` with weighted
/// re-solves until the positions stop changing or the round budget is spent.
///
/// The first view (lowest id among usable pairs) stays at its initial
/// position in every inner solve. The result is still defined only up to a
/// global scale.
#[derive(Debug, Clone, Default)]
pub struct LudPositionEstimator {
    options: LudPositionEstimatorOptions,
}

impl LudPositionEstimator {
    pub fn new(options: LudPositionEstimatorOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &LudPositionEstimatorOptions {
        &self.options
    }

    /// Estimate one position per view of `view_pairs`.
    ///
    /// On success `positions` is replaced by the estimates for exactly the
    /// views that take part in a usable pair. When random initialisation is
    /// disabled, its previous content seeds the solve. On failure
    /// `positions` is left untouched.
    pub fn estimate_positions(
        &self,
        view_pairs: &HashMap<ViewIdPair, TwoViewInfo>,
        orientations: &HashMap<ViewId, Rot3>,
        positions: &mut HashMap<ViewId, Vec3>,
    ) -> Result<PositionEstimationSummary, PositionEstimationError> {
        let graph = ConstraintGraph::build(view_pairs, orientations);
        if graph.constraints.is_empty() || graph.views.len() < 2 {
            return Err(PositionEstimationError::InsufficientConstraints {
                num_pairs: graph.constraints.len(),
                num_views: graph.views.len(),
            });
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.options.num_threads.max(1))
            .thread_name(|idx| format!("lud-positions-{idx}"))
            .build()?;

        let mut x = self.initial_positions(&graph.views, positions);
        let mut row_scales = vec![1.0; graph.constraints.len()];
        let initial_cost = self
            .problem(&graph, &row_scales, &pool, &x)
            .unsquared_cost(&x);
        info!(
            "estimating {} positions from {} view pairs ({} skipped), initial cost {:.6e}",
            graph.views.len(),
            graph.constraints.len(),
            graph.num_skipped,
            initial_cost
        );

        let status = self.solve_round(0, &graph, &row_scales, &pool, &mut x)?;
        let mut termination = if self.options.max_num_reweighted_iterations == 0
            && status == SolveStatus::Converged
        {
            PositionEstimationTermination::Converged
        } else {
            PositionEstimationTermination::IterationLimitReached
        };

        let mut num_rounds = 0;
        for round in 1..=self.options.max_num_reweighted_iterations {
            let norms = self
                .problem(&graph, &row_scales, &pool, &x)
                .residual_norms(&x);
            for (scale, norm) in row_scales.iter_mut().zip(&norms) {
                *scale = irls_weight(*norm).sqrt();
            }

            let previous = x.clone();
            self.solve_round(round, &graph, &row_scales, &pool, &mut x)?;
            num_rounds = round;

            let change = relative_change(&previous, &x);
            debug!("reweighting round {round}: relative change {change:.3e}");
            if change < self.options.convergence_criterion {
                termination = PositionEstimationTermination::Converged;
                break;
            }
        }

        let final_cost = self
            .problem(&graph, &row_scales, &pool, &x)
            .unsquared_cost(&x);
        info!(
            "position estimation finished: {termination:?} after {num_rounds} reweighting rounds, cost {initial_cost:.6e} -> {final_cost:.6e}"
        );

        positions.clear();
        positions.extend(
            graph
                .views
                .iter()
                .enumerate()
                .map(|(k, id)| (*id, position(&x, k))),
        );

        let weights = graph
            .pairs
            .iter()
            .zip(&row_scales)
            .map(|(pair, s)| (*pair, s * s))
            .collect();

        Ok(PositionEstimationSummary {
            termination,
            num_reweighted_iterations: num_rounds,
            initial_cost,
            final_cost,
            weights,
            num_skipped_pairs: graph.num_skipped,
        })
    }

    /// Problem over `graph` with the first view anchored at its position in `x`.
    fn problem<'a>(
        &self,
        graph: &'a ConstraintGraph,
        row_scales: &'a [Real],
        pool: &'a ThreadPool,
        x: &DVector<Real>,
    ) -> LudProblem<'a> {
        LudProblem {
            constraints: &graph.constraints,
            row_scales,
            num_views: graph.views.len(),
            anchor: position(x, 0),
            pool,
        }
    }

    fn solve_round(
        &self,
        round: usize,
        graph: &ConstraintGraph,
        row_scales: &[Real],
        pool: &ThreadPool,
        x: &mut DVector<Real>,
    ) -> Result<SolveStatus, PositionEstimationError> {
        let problem = self.problem(graph, row_scales, pool, x);
        let cost = problem.unsquared_cost(x);
        if cost < NEGLIGIBLE_COST {
            debug!("round {round}: starting cost {cost:.3e} is negligible, keeping positions");
            return Ok(SolveStatus::Converged);
        }

        let opts = SolveOptions {
            max_iters: self.options.max_num_iterations,
            ..SolveOptions::default()
        };
        let (solution, report) =
            LmBackend.solve(&problem, LudProblem::free_parameters(x), &opts);

        match &report.status {
            SolveStatus::Failed(reason) => {
                return Err(PositionEstimationError::SolverFailure {
                    round,
                    reason: reason.clone(),
                })
            }
            SolveStatus::IterationLimit => {
                warn!("round {round}: inner solve hit its iteration limit")
            }
            SolveStatus::Converged => {}
        }
        if !solution.iter().all(|v| v.is_finite()) {
            return Err(PositionEstimationError::NonFinitePositions { round });
        }

        debug!(
            "round {round}: weighted cost {:.6e} after {} evaluations",
            report.final_cost, report.iterations
        );
        *x = problem.positions(&solution);
        Ok(report.status)
    }

    fn initial_positions(&self, views: &[ViewId], seeds: &HashMap<ViewId, Vec3>) -> DVector<Real> {
        let mut rng = match self.options.random_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let mut random_position = || {
            Vec3::from_fn(|_, _| rng.random_range(-RANDOM_POSITION_RANGE..=RANDOM_POSITION_RANGE))
        };

        let use_seeds = !self.options.initialize_random_positions;
        let mut x = DVector::zeros(3 * views.len());
        let mut num_unseeded = 0;
        for (k, id) in views.iter().enumerate() {
            let seed = seeds
                .get(id)
                .filter(|p| use_seeds && p.iter().all(|v| v.is_finite()));
            let p = match seed {
                Some(p) => *p,
                None => {
                    if use_seeds {
                        num_unseeded += 1;
                    }
                    random_position()
                }
            };
            x.fixed_rows_mut::<3>(3 * k).copy_from(&p);
        }
        if num_unseeded > 0 {
            warn!("{num_unseeded} views have no initial position; initialising them randomly");
        }
        x
    }
}

/// IRLS weight of an unsquared-deviation residual, `1 / max(‖r‖, ε)`.
fn irls_weight(residual_norm: Real) -> Real {
    1.0 / residual_norm.max(IRLS_WEIGHT_EPSILON)
}

/// Change between two stacked position vectors after removing their
/// centroids, relative to the size of the previous configuration.
fn relative_change(previous: &DVector<Real>, next: &DVector<Real>) -> Real {
    let a = centered(previous);
    let b = centered(next);
    (b - &a).norm() / a.norm().max(Real::EPSILON)
}

fn centered(x: &DVector<Real>) -> DVector<Real> {
    let n = x.len() / 3;
    let mut mean = Vec3::zeros();
    for k in 0..n {
        mean += position(x, k);
    }
    mean /= n.max(1) as Real;

    let mut out = x.clone();
    for k in 0..n {
        let mut block = out.fixed_rows_mut::<3>(3 * k);
        block -= mean;
    }
    out
}
