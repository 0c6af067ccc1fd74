//! Finite-difference solver for the linear BVP `y'' + p(x) y' + q(x) y = f(x)`
//! with Dirichlet data `y(a) = alpha`, `y(b) = beta`.
//!
//! Central differences on `n` equal intervals give one tridiagonal row per interior point:
//! `A = 1/h² - p/(2h)`, `B = -2/h² + q`, `C = 1/h² + p/(2h)`, `D = f(x_i)`.
//! Both boundary rows are identity equations, so coefficients are never evaluated at the
//! end points and a singular `p(a)` needs no special care. The system is solved by the
//! Thomas algorithm.
use crate::numerical::grid::Grid;
use crate::numerical::linear_ode2::LinearODE2;
use crate::numerical::solver_errors::NumError;
use crate::somelinalg::Thomas::TridiagonalSystem;
use log::{debug, info};
use nalgebra::DVector;

pub struct FDProblem {
    pub ode: LinearODE2,
    pub a: f64,
    pub b: f64,
    /// y(a)
    pub alpha: f64,
    /// y(b)
    pub beta: f64,
}

#[derive(Debug, Clone)]
pub struct FDSolution {
    pub x_mesh: DVector<f64>,
    pub y: DVector<f64>,
}

impl FDSolution {
    pub fn len(&self) -> usize {
        self.y.len()
    }

    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }

    /// Max-norm distance to a reference solution.
    pub fn max_error(&self, exact: impl Fn(f64) -> f64) -> f64 {
        self.x_mesh
            .iter()
            .zip(self.y.iter())
            .map(|(x, y)| (y - exact(*x)).abs())
            .fold(0.0, f64::max)
    }
}

pub fn assemble_system(problem: &FDProblem, grid: &Grid) -> Result<TridiagonalSystem, NumError> {
    let n = grid.intervals();
    if n < 2 {
        return Err(NumError::invalid(
            "n",
            format!("finite differences need at least 2 intervals, got {}", n),
        ));
    }
    if !(problem.alpha.is_finite() && problem.beta.is_finite()) {
        return Err(NumError::invalid("boundary", "boundary values must be finite"));
    }
    // last step is unaffected by a perturbed start
    let h = grid.step(n - 1);
    let x = grid.points();
    let ode = &problem.ode;
    let mut a = vec![0.0; n + 1];
    let mut b = vec![0.0; n + 1];
    let mut c = vec![0.0; n + 1];
    let mut d = vec![0.0; n + 1];
    b[0] = 1.0;
    d[0] = problem.alpha;
    b[n] = 1.0;
    d[n] = problem.beta;
    for i in 1..n {
        let p = (ode.p)(x[i]);
        let q = (ode.q)(x[i]);
        a[i] = 1.0 / (h * h) - p / (2.0 * h);
        b[i] = -2.0 / (h * h) + q;
        c[i] = 1.0 / (h * h) + p / (2.0 * h);
        d[i] = (ode.f)(x[i]);
    }
    TridiagonalSystem::new(a, b, c, d)
}

/// Solves on `n` equal intervals of `[a, b]`.
pub fn solve_fd(problem: &FDProblem, n: usize) -> Result<FDSolution, NumError> {
    let grid = Grid::uniform_between(problem.a, problem.b, n)?;
    solve_fd_on_grid(problem, &grid)
}

/// Solves on a prepared uniform grid, e.g. one with a perturbed first point.
pub fn solve_fd_on_grid(problem: &FDProblem, grid: &Grid) -> Result<FDSolution, NumError> {
    info!(
        "finite differences on [{}, {}] with {} intervals",
        grid.first(),
        grid.last(),
        grid.intervals()
    );
    let system = assemble_system(problem, grid)?;
    let y = system.solve()?;
    debug!("tridiagonal residual {:e}", system.residual(&y));
    Ok(FDSolution {
        x_mesh: grid.to_dvector(),
        y: DVector::from_vec(y),
    })
}
