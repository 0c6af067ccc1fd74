//! Root localisation and refinement for a scalar equation `f(x) = 0`.
//!
//! ```rust, ignore
//! use RustedNumLabs::numerical::Nonlinear_equations::*;
//! use RustedNumLabs::numerical::solver_errors::IterationSettings;
//! let f = |x: f64| (x + 2.0).ln() - (x.powi(4) - 0.5);
//! let df = |x: f64| 1.0 / (x + 2.0) - 4.0 * x.powi(3);
//! check_bracket(&f, 0.5, 1.2)?;
//! let report = newton_scalar(&f, &df, 0.85, &IterationSettings::default())?;
//! let root = report.outcome.into_result()?;
//! ```
use crate::numerical::solver_errors::{IterationOutcome, IterationSettings, NumError};
use itertools::Itertools;
use log::{debug, info, warn};

/// Derivatives with a smaller magnitude stop Newton's method.
pub const DERIVATIVE_EPS: f64 = 1e-12;

/// One row of an iteration history.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IterationStep {
    pub iteration: usize,
    pub x: f64,
    /// `|x_new - x_old|`
    pub step: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RootReport {
    pub outcome: IterationOutcome<f64>,
    pub history: Vec<IterationStep>,
}

impl RootReport {
    pub fn root(&self) -> f64 {
        *self.outcome.value()
    }
}

/// Intervals `[x_i, x_{i+1}]` of consecutive samples where `f` changes sign.
/// An exact zero at `x_i` opens an interval starting at it.
pub fn sign_change_intervals<F>(f: F, xs: &[f64]) -> Vec<(f64, f64)>
where
    F: Fn(f64) -> f64,
{
    xs.iter()
        .map(|x| (*x, f(*x)))
        .tuple_windows()
        .filter(|((_, fl), (_, fr))| fl * fr < 0.0 || *fl == 0.0)
        .map(|((xl, _), (xr, _))| (xl, xr))
        .collect()
}

pub fn check_bracket<F>(f: F, a: f64, b: f64) -> Result<(), NumError>
where
    F: Fn(f64) -> f64,
{
    if !(a.is_finite() && b.is_finite() && a < b) {
        return Err(NumError::invalid(
            "bracket",
            format!("need finite a < b, got [{}, {}]", a, b),
        ));
    }
    if f(a) * f(b) > 0.0 {
        return Err(NumError::NoSignChange { a, b });
    }
    Ok(())
}

/// Generic one-point iteration `x_{k+1} = next(k, x_k)` stopped on `|x_{k+1} - x_k| < tolerance`.
fn iterate<N>(mut next: N, x0: f64, settings: &IterationSettings, name: &str) -> Result<RootReport, NumError>
where
    N: FnMut(usize, f64) -> Result<f64, NumError>,
{
    settings.validate()?;
    if !x0.is_finite() {
        return Err(NumError::invalid("x0", "initial guess must be finite"));
    }
    let mut history = Vec::new();
    let mut x = x0;
    for iteration in 1..=settings.max_iterations {
        let x_new = next(iteration, x)?;
        if !x_new.is_finite() {
            warn!("{}: iterate {} at iteration {}", name, x_new, iteration);
            return Err(NumError::Diverged { iteration });
        }
        let step = (x_new - x).abs();
        debug!("{}: iteration {}, x = {}, step = {:e}", name, iteration, x_new, step);
        history.push(IterationStep {
            iteration,
            x: x_new,
            step,
        });
        x = x_new;
        if step < settings.tolerance {
            info!("{} converged to {} in {} iterations", name, x, iteration);
            return Ok(RootReport {
                outcome: IterationOutcome::Converged {
                    value: x,
                    iterations: iteration,
                },
                history,
            });
        }
    }
    let last_residual = history.last().map_or(f64::NAN, |s| s.step);
    warn!("{} reached {} iterations, last step {:e}", name, settings.max_iterations, last_residual);
    Ok(RootReport {
        outcome: IterationOutcome::MaxIterationsReached {
            value: x,
            iterations: settings.max_iterations,
            last_residual,
        },
        history,
    })
}

pub fn newton_scalar<F, D>(f: F, df: D, x0: f64, settings: &IterationSettings) -> Result<RootReport, NumError>
where
    F: Fn(f64) -> f64,
    D: Fn(f64) -> f64,
{
    iterate(
        |iteration, x| {
            let d = df(x);
            if d.abs() < DERIVATIVE_EPS {
                return Err(NumError::DegenerateDerivative { iteration });
            }
            Ok(x - f(x) / d)
        },
        x0,
        settings,
        "Newton",
    )
}

/// Fixed-point iteration `x = phi(x)`.
pub fn simple_iteration<P>(phi: P, x0: f64, settings: &IterationSettings) -> Result<RootReport, NumError>
where
    P: Fn(f64) -> f64,
{
    iterate(|_, x| Ok(phi(x)), x0, settings, "simple iteration")
}
