//! # Shooting Method for linear Boundary Value Problems (BVP)
//!
//! Solves `y'' + p(x) y' + q(x) y = f(x)` on `[a, b]` with
//! - left data: `y(a)` fixed, `y'(a)` used as the first guess of the unknown slope `s`;
//! - right Robin condition: `c_y * y(b) + c_dy * y'(b) = target`.
//!
//! ## Method Overview
//! 1. Integrate the IVP `[y, y'](a) = [y(a), s]` with RK4 on the grid
//! 2. Evaluate the boundary residual `F(s)` at `x = b`
//! 3. Adjust `s` with the secant method until `|F(s)| < tolerance` or the iteration cap is hit
//!
//! `y'(b)` is taken either from the one-sided difference `(3y_n - 4y_{n-1} + y_{n-2}) / (2h)`
//! (default) or from the integrated slope component, see [`TerminalSlope`].
//! A singular coefficient at `x = a` is stepped around by moving the first grid point
//! to `a + start_eps`.
//!
//! The secant denominator is `F2 - F1`, replaced by `±denominator_guard` (sign of `F2 - F1`)
//! only when `|F2 - F1| < denominator_guard`. Any other step is the plain secant step, and a
//! flat residual still takes a finite step, so stagnation shows up as
//! [`IterationOutcome::MaxIterationsReached`] and is never reported as convergence.
//!
//! ## Usage Example
//! ```rust, ignore
//! use RustedNumLabs::numerical::linear_ode2::LinearODE2;
//! use RustedNumLabs::numerical::ShootingBVP::Shooting_simple::*;
//! // y'' = y, y(0) = 0, y(1) = sinh(1)
//! let problem = ShootingProblem {
//!     ode: LinearODE2::homogeneous(|_x| 0.0, |_x| -1.0),
//!     a: 0.0,
//!     b: 1.0,
//!     y_a: 0.0,
//!     slope_guess: 0.5,
//!     right: RobinCondition::dirichlet(1.0_f64.sinh()),
//! };
//! let mut solver = ShootingMethodSolver::new(ShootingSettings { n: 100, start_eps: None, ..Default::default() });
//! let result = solver.solve(&problem)?.require_convergence()?;
//! ```
use crate::numerical::IVP_fixed_step::{IVPSolution, rk4_on_grid};
use crate::numerical::grid::Grid;
use crate::numerical::linear_ode2::LinearODE2;
use crate::numerical::solver_errors::{IterationOutcome, NumError};
use log::{debug, info, warn};
use nalgebra::{DVector, Dyn, Matrix, Storage, U1};
use strum_macros::{Display, EnumString};

/// How `y'(b)` enters the right boundary residual.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Default)]
#[strum(ascii_case_insensitive)]
pub enum TerminalSlope {
    /// second-order one-sided difference of the last three `y` values
    #[default]
    #[strum(to_string = "one_sided")]
    OneSidedDifference,
    /// slope component of the RK4 state
    #[strum(to_string = "integrated")]
    Integrated,
}

/// `value_coeff * y(b) + slope_coeff * y'(b) = target`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RobinCondition {
    pub value_coeff: f64,
    pub slope_coeff: f64,
    pub target: f64,
}

impl RobinCondition {
    pub fn dirichlet(value: f64) -> Self {
        RobinCondition {
            value_coeff: 1.0,
            slope_coeff: 0.0,
            target: value,
        }
    }

    pub fn neumann(slope: f64) -> Self {
        RobinCondition {
            value_coeff: 0.0,
            slope_coeff: 1.0,
            target: slope,
        }
    }

    pub fn residual(&self, y_b: f64, dy_b: f64) -> f64 {
        self.value_coeff * y_b + self.slope_coeff * dy_b - self.target
    }
}

pub struct ShootingProblem {
    pub ode: LinearODE2,
    pub a: f64,
    pub b: f64,
    /// y(a)
    pub y_a: f64,
    /// first guess of y'(a)
    pub slope_guess: f64,
    pub right: RobinCondition,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShootingSettings {
    /// number of grid intervals
    pub n: usize,
    pub tolerance: f64,
    pub max_iterations: usize,
    pub denominator_guard: f64,
    /// second slope is `slope_guess + second_guess_offset`
    pub second_guess_offset: f64,
    pub start_eps: Option<f64>,
    pub terminal_slope: TerminalSlope,
}

impl Default for ShootingSettings {
    fn default() -> Self {
        ShootingSettings {
            n: 10,
            tolerance: 1e-10,
            max_iterations: 10,
            denominator_guard: 1e-10,
            second_guess_offset: 1.0,
            start_eps: Some(1e-10),
            terminal_slope: TerminalSlope::OneSidedDifference,
        }
    }
}

impl ShootingSettings {
    pub fn validate(&self) -> Result<(), NumError> {
        if self.n < 2 {
            return Err(NumError::invalid(
                "n",
                format!("shooting needs at least 2 intervals, got {}", self.n),
            ));
        }
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(NumError::invalid("tolerance", "must be finite and positive"));
        }
        if self.max_iterations == 0 {
            return Err(NumError::invalid("max_iterations", "must be at least 1"));
        }
        if !(self.denominator_guard.is_finite() && self.denominator_guard >= 0.0) {
            return Err(NumError::invalid("denominator_guard", "must be finite and non-negative"));
        }
        if !(self.second_guess_offset.is_finite() && self.second_guess_offset != 0.0) {
            return Err(NumError::invalid("second_guess_offset", "must be finite and non-zero"));
        }
        Ok(())
    }

    pub fn grid(&self, a: f64, b: f64) -> Result<Grid, NumError> {
        let grid = Grid::uniform_between(a, b, self.n)?;
        match self.start_eps {
            Some(eps) => grid.with_perturbed_start(eps),
            None => Ok(grid),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ShootingMethodResult {
    pub solution: IVPSolution,
    /// slope y'(a) of the returned solution
    pub s: f64,
    /// boundary residual of the returned solution
    pub residual: f64,
    pub outcome: IterationOutcome<f64>,
}

impl ShootingMethodResult {
    pub fn x_mesh(&self) -> &DVector<f64> {
        &self.solution.x_mesh
    }

    pub fn y(&self) -> Vec<f64> {
        self.solution.component(0)
    }

    pub fn require_convergence(self) -> Result<Self, NumError> {
        match self.outcome {
            IterationOutcome::Converged { .. } => Ok(self),
            IterationOutcome::MaxIterationsReached {
                iterations,
                last_residual,
                ..
            } => Err(NumError::DidNotConverge {
                iterations,
                last_residual,
            }),
        }
    }
}

pub fn one_sided_terminal_slope<S>(y: &Matrix<f64, Dyn, U1, S>, h: f64) -> f64
where
    S: Storage<f64, Dyn, U1>,
{
    let n = y.len() - 1;
    (3.0 * y[n] - 4.0 * y[n - 1] + y[n - 2]) / (2.0 * h)
}

/// `diff` itself, or `guard` with the sign of `diff` when `|diff| < guard`; zero maps to `+guard`.
pub fn guarded_denominator(diff: f64, guard: f64) -> f64 {
    if diff.abs() >= guard {
        diff
    } else if diff < 0.0 {
        -guard
    } else {
        guard
    }
}

/// Secant iteration on `residual(s)`, which also returns a payload (e.g. the trajectory).
///
/// Returns the outcome for the last evaluated `s`, its residual and payload.
pub fn secant_method<F, T>(
    mut residual: F,
    s1: f64,
    s2: f64,
    settings: &ShootingSettings,
) -> Result<(IterationOutcome<f64>, f64, T), NumError>
where
    F: FnMut(f64) -> Result<(f64, T), NumError>,
{
    let guard = settings.denominator_guard;
    let (mut s1, mut s2) = (s1, s2);
    let (mut f1, _) = residual(s1)?;
    let (mut f2, _) = residual(s2)?;
    debug!("secant start: s1 = {}, F1 = {}, s2 = {}, F2 = {}", s1, f1, s2, f2);

    let mut s = s1 - f1 * (s2 - s1) / guarded_denominator(f2 - f1, guard);
    let mut last: Option<(f64, f64, T)> = None;
    for iteration in 1..=settings.max_iterations {
        if !s.is_finite() {
            warn!("secant iterate became {} at iteration {}", s, iteration);
            return Err(NumError::Diverged { iteration });
        }
        let (f, payload) = residual(s)?;
        debug!("secant iteration {}: s = {}, F(s) = {}", iteration, s, f);
        if f.abs() < settings.tolerance {
            info!("secant converged after {} iterations, s = {}, F = {:e}", iteration, s, f);
            return Ok((
                IterationOutcome::Converged {
                    value: s,
                    iterations: iteration,
                },
                f,
                payload,
            ));
        }
        last = Some((s, f, payload));
        s1 = s2;
        f1 = f2;
        s2 = s;
        f2 = f;
        s = s1 - f1 * (s2 - s1) / guarded_denominator(f2 - f1, guard);
    }
    let (value, last_residual, payload) = last.ok_or_else(|| {
        NumError::invalid("max_iterations", "must be at least 1")
    })?;
    warn!(
        "secant stopped after {} iterations, |F| = {:e}",
        settings.max_iterations, last_residual
    );
    Ok((
        IterationOutcome::MaxIterationsReached {
            value,
            iterations: settings.max_iterations,
            last_residual,
        },
        last_residual,
        payload,
    ))
}

/// Shooting method solver; keeps the last result.
pub struct ShootingMethodSolver {
    pub settings: ShootingSettings,
    result: Option<ShootingMethodResult>,
}

impl ShootingMethodSolver {
    pub fn new(settings: ShootingSettings) -> Self {
        Self {
            settings,
            result: None,
        }
    }

    pub fn solve(&mut self, problem: &ShootingProblem) -> Result<ShootingMethodResult, NumError> {
        let settings = self.settings;
        settings.validate()?;
        let grid = settings.grid(problem.a, problem.b)?;
        let h = grid.step(grid.intervals() - 1);
        info!("Starting shooting method solver");
        debug!(
            "Problem: [{}, {}], y(a) = {}, right = {:?}; settings: {:?}",
            problem.a, problem.b, problem.y_a, problem.right, settings
        );

        let rhs = problem.ode.rhs_system();
        let shoot = |s: f64| -> Result<(f64, IVPSolution), NumError> {
            let y0 = DVector::from_vec(vec![problem.y_a, s]);
            let solution = rk4_on_grid(&rhs, &grid, &y0)?;
            let n = solution.len() - 1;
            let y_b = solution.y[(n, 0)];
            let dy_b = match settings.terminal_slope {
                TerminalSlope::OneSidedDifference => one_sided_terminal_slope(&solution.y.column(0), h),
                TerminalSlope::Integrated => solution.y[(n, 1)],
            };
            let residual = problem.right.residual(y_b, dy_b);
            debug!("shot s = {}: y(b) = {}, y'(b) = {}, F = {}", s, y_b, dy_b, residual);
            Ok((residual, solution))
        };

        let s1 = problem.slope_guess;
        let s2 = s1 + settings.second_guess_offset;
        let (outcome, residual, solution) = secant_method(shoot, s1, s2, &settings)?;
        let s = *outcome.value();
        info!(
            "Shooting finished: s = {}, residual = {:e}, converged = {}",
            s,
            residual,
            outcome.is_converged()
        );
        let result = ShootingMethodResult {
            solution,
            s,
            residual,
            outcome,
        };
        self.result = Some(result.clone());
        Ok(result)
    }

    pub fn get_solution(&self) -> Option<ShootingMethodResult> {
        self.result.clone()
    }
}

/////////////////////////////////////////////////////////////////////////
//          tests
//////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_abs_diff_eq;
    use simplelog::*;

    fn init_logger() {
        let _ = SimpleLogger::init(LevelFilter::Debug, Config::default());
    }

    fn y_exact(x: f64) -> f64 {
        x.powi(3) + x.powi(2) + 2.0
    }

    /// x(x^2+6)y'' - 4(x^2+3)y' + 6xy = 0,  y'(0) = 0,  y(4) - y'(4) = 26
    fn singular_problem() -> ShootingProblem {
        ShootingProblem {
            ode: LinearODE2::homogeneous(
                |x| -4.0 * (x * x + 3.0) / (x * (x * x + 6.0)),
                |x| 6.0 / (x * x + 6.0),
            ),
            a: 0.0,
            b: 4.0,
            y_a: 2.0,
            slope_guess: 0.0,
            right: RobinCondition {
                value_coeff: 1.0,
                slope_coeff: -1.0,
                target: 26.0,
            },
        }
    }

    fn y_equals_ypp_problem() -> ShootingProblem {
        ShootingProblem {
            ode: LinearODE2::homogeneous(|_x| 0.0, |_x| -1.0),
            a: 0.0,
            b: 1.0,
            y_a: 0.0,
            slope_guess: 0.5,
            right: RobinCondition::dirichlet(1.0_f64.sinh()),
        }
    }

    #[test]
    fn singular_problem_converges_within_cap() {
        init_logger();
        let mut solver = ShootingMethodSolver::new(ShootingSettings::default());
        let result = solver.solve(&singular_problem()).unwrap();
        assert!(result.outcome.is_converged());
        assert!(result.outcome.iterations() <= 10);
        assert!(result.residual.abs() < 1e-10);
        assert_eq!(result.y().len(), 11);
        assert_eq!(result.y()[0], 2.0);
        assert!(solver.get_solution().is_some());
    }

    #[test]
    fn integrated_slope_matches_cubic_solution() {
        init_logger();
        let settings = ShootingSettings {
            n: 200,
            terminal_slope: TerminalSlope::Integrated,
            ..Default::default()
        };
        let mut solver = ShootingMethodSolver::new(settings);
        let result = solver
            .solve(&singular_problem())
            .unwrap()
            .require_convergence()
            .unwrap();
        assert!(result.residual.abs() < 1e-10);
        let x = result.x_mesh().clone();
        let y = result.y();
        // skip the singular endpoint
        for i in 1..x.len() {
            assert_abs_diff_eq!(y[i], y_exact(x[i]), epsilon = 1e-6);
        }
    }

    #[test]
    fn one_sided_slope_error_is_second_order() {
        // (3y_n - 4y_{n-1} + y_{n-2})/(2h) misses y'(b) by 2h^2 for a cubic,
        // so at n = 10 the profile is visibly off while the integrated slope is not
        let solve_with = |terminal_slope| {
            let settings = ShootingSettings {
                terminal_slope,
                ..Default::default()
            };
            let result = ShootingMethodSolver::new(settings)
                .solve(&singular_problem())
                .unwrap();
            let x = result.x_mesh().clone();
            result
                .y()
                .iter()
                .zip(x.iter())
                .map(|(y, x)| (y - y_exact(*x)).abs())
                .fold(0.0, f64::max)
        };
        let one_sided = solve_with(TerminalSlope::OneSidedDifference);
        let integrated = solve_with(TerminalSlope::Integrated);
        assert!(one_sided > 0.5 && one_sided < 2.0, "one-sided error {}", one_sided);
        assert!(integrated < 0.05, "integrated error {}", integrated);
    }

    #[test]
    fn one_sided_difference_is_exact_for_quadratics() {
        let h = 0.1;
        let y = DVector::from_fn(5, |i, _| {
            let x = i as f64 * h;
            x * x + 3.0 * x
        });
        // y' = 2x + 3 at x = 0.4
        assert_abs_diff_eq!(one_sided_terminal_slope(&y, h), 3.8, epsilon = 1e-12);
    }

    #[test]
    fn linear_ode() {
        init_logger();
        let settings = ShootingSettings {
            n: 100,
            tolerance: 1e-8,
            start_eps: None,
            ..Default::default()
        };
        let mut solver = ShootingMethodSolver::new(settings);
        let result = solver.solve(&y_equals_ypp_problem()).unwrap();
        assert!(result.outcome.is_converged());
        let last = result.solution.last_state();
        // Check boundary condition at x = b
        assert_abs_diff_eq!(last[0], 1.0_f64.sinh(), epsilon = 1e-6);
        // Check initial slope s ≈ y'(0) = 1 (exact for this problem)
        assert_abs_diff_eq!(result.s, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn flat_residual_is_not_reported_as_converged() {
        // the right condition does not depend on s: F2 - F1 = 0 and only the guard
        // keeps the secant step finite
        init_logger();
        let mut problem = y_equals_ypp_problem();
        problem.right = RobinCondition {
            value_coeff: 0.0,
            slope_coeff: 0.0,
            target: 1e-3,
        };
        let settings = ShootingSettings {
            n: 20,
            start_eps: None,
            ..Default::default()
        };
        let result = ShootingMethodSolver::new(settings).solve(&problem).unwrap();
        match &result.outcome {
            IterationOutcome::MaxIterationsReached {
                iterations,
                last_residual,
                ..
            } => {
                assert_eq!(*iterations, 10);
                assert_abs_diff_eq!(*last_residual, -1e-3, epsilon = 1e-15);
            }
            other => panic!("stagnation reported as {:?}", other),
        }
        assert!(matches!(
            result.require_convergence(),
            Err(NumError::DidNotConverge { iterations: 10, .. })
        ));
    }

    #[test]
    fn test_non_convergence() {
        // a single secant step on s^2 - 2 from (1, 2) lands at 4/3
        let settings = ShootingSettings {
            max_iterations: 1,
            ..Default::default()
        };
        let (outcome, f, _) = secant_method(|s| Ok((s * s - 2.0, ())), 1.0, 2.0, &settings).unwrap();
        assert!(!outcome.is_converged());
        assert_eq!(outcome.iterations(), 1);
        assert_abs_diff_eq!(*outcome.value(), 4.0 / 3.0, epsilon = 1e-9);
        assert_abs_diff_eq!(f, 16.0 / 9.0 - 2.0, epsilon = 1e-9);
    }

    #[test]
    fn secant_on_plain_function() {
        let settings = ShootingSettings::default();
        let (outcome, f, root) = secant_method(|s| Ok((s * s - 2.0, s)), 1.0, 2.0, &settings).unwrap();
        assert!(outcome.is_converged());
        assert!(outcome.iterations() <= 7, "took {} iterations", outcome.iterations());
        assert!(f.abs() < 1e-10);
        assert_abs_diff_eq!(root, 2.0_f64.sqrt(), epsilon = 1e-10);
    }

    #[test]
    fn guard_keeps_the_sign_of_the_difference() {
        assert_eq!(guarded_denominator(0.5, 1e-10), 0.5);
        assert_eq!(guarded_denominator(-0.5, 1e-10), -0.5);
        assert_eq!(guarded_denominator(1e-12, 1e-10), 1e-10);
        assert_eq!(guarded_denominator(-1e-12, 1e-10), -1e-10);
        assert_eq!(guarded_denominator(0.0, 1e-10), 1e-10);
        assert_eq!(guarded_denominator(0.0, 0.0), 0.0);
    }

    #[test]
    fn nearly_flat_decreasing_residual_steps_forward() {
        // F(s) = 1e-3 - 1e-12 s: the raw difference is -1e-12, the guard replaces it by
        // -1e-10 and the step still moves towards the root
        let settings = ShootingSettings {
            max_iterations: 1,
            ..Default::default()
        };
        let (outcome, _, _) =
            secant_method(|s| Ok((1e-3 - 1e-12 * s, ())), 0.0, 1.0, &settings).unwrap();
        assert_abs_diff_eq!(*outcome.value(), 1e7, epsilon = 1e-3);
    }

    #[test]
    fn invalid_settings_are_rejected() {
        let problem = singular_problem();
        for settings in [
            ShootingSettings { n: 1, ..Default::default() },
            ShootingSettings { tolerance: 0.0, ..Default::default() },
            ShootingSettings { max_iterations: 0, ..Default::default() },
            ShootingSettings { start_eps: Some(1.0), ..Default::default() },
        ] {
            assert!(matches!(
                ShootingMethodSolver::new(settings).solve(&problem),
                Err(NumError::InvalidParameter { .. })
            ));
        }
    }
}
