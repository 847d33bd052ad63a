use crate::{NllsProblem, NllsSolverBackend, SolveOptions, SolveReport, SolveStatus};
use levenberg_marquardt::{LeastSquaresProblem, LevenbergMarquardt, TerminationReason};
use log::debug;
use nalgebra::{storage::Owned, DMatrix, DVector, Dyn};
use sfm_core::Real;

struct LmWrapper<'a, P: NllsProblem> {
    problem: &'a P,
    params: DVector<Real>,
}

impl<'a, P: NllsProblem> LeastSquaresProblem<Real, Dyn, Dyn> for LmWrapper<'a, P> {
    type ResidualStorage = Owned<Real, Dyn>;
    type JacobianStorage = Owned<Real, Dyn, Dyn>;
    type ParameterStorage = Owned<Real, Dyn>;

    fn set_params(&mut self, x: &DVector<Real>) {
        self.params.clone_from(x);
    }

    fn params(&self) -> DVector<Real> {
        self.params.clone()
    }

    fn residuals(&self) -> Option<DVector<Real>> {
        let r = self.problem.residuals(&self.params);
        r.iter().all(|v| v.is_finite()).then_some(r)
    }

    fn jacobian(&self) -> Option<DMatrix<Real>> {
        let j = self.problem.jacobian(&self.params);
        j.iter().all(|v| v.is_finite()).then_some(j)
    }
}

fn status_from_termination(reason: &TerminationReason) -> SolveStatus {
    match reason {
        TerminationReason::ResidualsZero
        | TerminationReason::Orthogonal
        | TerminationReason::Converged { .. }
        | TerminationReason::NoImprovementPossible(_) => SolveStatus::Converged,
        TerminationReason::LostPatience => SolveStatus::IterationLimit,
        other => SolveStatus::Failed(format!("{other:?}")),
    }
}

/// Dense Levenberg–Marquardt backend (`levenberg-marquardt` crate).
#[derive(Debug, Default, Clone)]
pub struct LmBackend;

impl NllsSolverBackend for LmBackend {
    fn solve<P: NllsProblem>(
        &self,
        problem: &P,
        x0: DVector<Real>,
        opts: &SolveOptions,
    ) -> (DVector<Real>, SolveReport) {
        let lm = LevenbergMarquardt::new()
            .with_ftol(opts.ftol)
            .with_xtol(opts.xtol)
            .with_gtol(opts.gtol)
            .with_patience(opts.max_iters.max(1));

        let wrapper = LmWrapper {
            problem,
            params: x0,
        };

        let (wrapper, report) = lm.minimize(wrapper);
        debug!(
            "lm: {:?} after {} evaluations, cost {:.6e}",
            report.termination, report.number_of_evaluations, report.objective_function
        );

        (
            wrapper.params(),
            SolveReport {
                iterations: report.number_of_evaluations,
                final_cost: report.objective_function,
                status: status_from_termination(&report.termination),
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::LmBackend;
    use crate::{NllsProblem, NllsSolverBackend, SolveOptions, SolveStatus};
    use nalgebra::{DMatrix, DVector};
    use sfm_core::Real;

    #[derive(Debug)]
    struct OneDimProblem;

    impl NllsProblem for OneDimProblem {
        fn num_params(&self) -> usize {
            1
        }

        fn num_residuals(&self) -> usize {
            1
        }

        fn residuals_unweighted(&self, x: &DVector<Real>) -> DVector<Real> {
            DVector::from_element(1, x[0] - 3.0)
        }

        fn jacobian_unweighted(&self, _x: &DVector<Real>) -> DMatrix<Real> {
            DMatrix::from_element(1, 1, 1.0)
        }
    }

    /// Residual that is never finite.
    struct PoisonedProblem;

    impl NllsProblem for PoisonedProblem {
        fn num_params(&self) -> usize {
            1
        }

        fn num_residuals(&self) -> usize {
            1
        }

        fn residuals_unweighted(&self, _x: &DVector<Real>) -> DVector<Real> {
            DVector::from_element(1, Real::NAN)
        }

        fn jacobian_unweighted(&self, _x: &DVector<Real>) -> DMatrix<Real> {
            DMatrix::from_element(1, 1, 1.0)
        }
    }

    #[test]
    fn lm_backend_solves_trivial_problem() {
        let backend = LmBackend;
        let problem = OneDimProblem;
        let x0 = DVector::from_element(1, 10.0);
        let opts = SolveOptions::default();

        let (x_opt, report) = backend.solve(&problem, x0, &opts);
        let x_final = x_opt[0];

        assert!(
            (x_final - 3.0).abs() < 1e-6,
            "expected optimizer to reach 3.0, got {}",
            x_final
        );
        assert!(
            report.final_cost.abs() < 1e-12,
            "final cost too high: {}",
            report.final_cost
        );
        assert!(
            report.converged(),
            "LM backend did not report convergence: {:?}",
            report
        );
        assert!(
            report.iterations > 0,
            "expected positive iterations, got {}",
            report.iterations
        );
    }

    #[test]
    fn non_finite_residuals_are_reported_as_failure() {
        let (_, report) = LmBackend.solve(
            &PoisonedProblem,
            DVector::from_element(1, 0.0),
            &SolveOptions::default(),
        );
        assert!(
            matches!(report.status, SolveStatus::Failed(_)),
            "unexpected status {:?}",
            report.status
        );
    }
}
