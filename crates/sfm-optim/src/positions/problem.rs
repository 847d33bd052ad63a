use nalgebra::{DMatrix, DVector, Matrix3};
use rayon::prelude::*;
use rayon::ThreadPool;
use sfm_core::{Real, Vec3};

use crate::NllsProblem;

/// World-frame direction observed from view `i` towards view `j`.
#[derive(Debug, Clone)]
pub(crate) struct DirectionConstraint {
    pub i: usize,
    pub j: usize,
    /// Unit length.
    pub direction: Vec3,
}

pub(crate) fn position(x: &DVector<Real>, view: usize) -> Vec3 {
    Vec3::new(x[3 * view], x[3 * view + 1], x[3 * view + 2])
}

impl DirectionConstraint {
    fn baseline(&self, positions: &DVector<Real>) -> Vec3 {
        position(positions, self.j) - position(positions, self.i)
    }

    /// `c_j − c_i − s d` with the optimal scale `s = max(1, d · (c_j − c_i))`.
    pub fn residual(&self, positions: &DVector<Real>) -> Vec3 {
        let baseline = self.baseline(positions);
        let scale = self.direction.dot(&baseline).max(1.0);
        baseline - self.direction * scale
    }

    /// Derivative of [`Self::residual`] with respect to `c_j`; the block for
    /// `c_i` is its negation.
    fn jacobian_block(&self, positions: &DVector<Real>) -> Matrix3<Real> {
        let d = &self.direction;
        if d.dot(&self.baseline(positions)) > 1.0 {
            Matrix3::identity() - d * d.transpose()
        } else {
            Matrix3::identity()
        }
    }
}

/// One weighted least-squares round over all direction constraints.
///
/// View 0 is held at `anchor`, which removes the translation gauge. The
/// parameter vector stacks the positions of views `1..num_views`.
/// `row_scales` holds `sqrt(w)` per constraint; each constraint owns three
/// consecutive residual rows.
pub(crate) struct LudProblem<'a> {
    pub constraints: &'a [DirectionConstraint],
    pub row_scales: &'a [Real],
    pub num_views: usize,
    pub anchor: Vec3,
    pub pool: &'a ThreadPool,
}

impl LudProblem<'_> {
    /// Free parameters of the stacked positions of all views.
    pub fn free_parameters(positions: &DVector<Real>) -> DVector<Real> {
        positions.rows(3, positions.len() - 3).into_owned()
    }

    /// Stacked positions of all views, with the anchor in front of `x`.
    pub fn positions(&self, x: &DVector<Real>) -> DVector<Real> {
        let mut out = DVector::zeros(3 * self.num_views);
        out.fixed_rows_mut::<3>(0).copy_from(&self.anchor);
        out.rows_mut(3, x.len()).copy_from(x);
        out
    }

    /// Unweighted residual norm of every constraint at the stacked positions.
    pub fn residual_norms(&self, positions: &DVector<Real>) -> Vec<Real> {
        self.pool.install(|| {
            self.constraints
                .par_iter()
                .map(|c| c.residual(positions).norm())
                .collect()
        })
    }

    /// Sum of unweighted residual norms.
    pub fn unsquared_cost(&self, positions: &DVector<Real>) -> Real {
        self.residual_norms(positions).iter().sum()
    }

    fn column(view: usize) -> Option<usize> {
        view.checked_sub(1).map(|k| 3 * k)
    }
}

impl NllsProblem for LudProblem<'_> {
    fn num_params(&self) -> usize {
        3 * (self.num_views - 1)
    }

    fn num_residuals(&self) -> usize {
        3 * self.constraints.len()
    }

    fn residuals_unweighted(&self, x: &DVector<Real>) -> DVector<Real> {
        let positions = self.positions(x);
        let blocks: Vec<Vec3> = self.pool.install(|| {
            self.constraints
                .par_iter()
                .map(|c| c.residual(&positions))
                .collect()
        });
        DVector::from_iterator(
            self.num_residuals(),
            blocks.iter().flat_map(|r| r.iter().copied()),
        )
    }

    fn jacobian_unweighted(&self, x: &DVector<Real>) -> DMatrix<Real> {
        let positions = self.positions(x);
        let blocks: Vec<Matrix3<Real>> = self.pool.install(|| {
            self.constraints
                .par_iter()
                .map(|c| c.jacobian_block(&positions))
                .collect()
        });

        let mut jac = DMatrix::zeros(self.num_residuals(), self.num_params());
        for (k, (c, block)) in self.constraints.iter().zip(&blocks).enumerate() {
            if let Some(col) = Self::column(c.j) {
                jac.fixed_view_mut::<3, 3>(3 * k, col).copy_from(block);
            }
            if let Some(col) = Self::column(c.i) {
                jac.fixed_view_mut::<3, 3>(3 * k, col).copy_from(&(-block));
            }
        }
        jac
    }

    fn robust_row_scales(&self, r_unweighted: &DVector<Real>) -> DVector<Real> {
        debug_assert_eq!(r_unweighted.len(), 3 * self.row_scales.len());
        DVector::from_iterator(
            r_unweighted.len(),
            self.row_scales
                .iter()
                .flat_map(|s| std::iter::repeat(*s).take(3)),
        )
    }
}
