//! Two-dimensional nonlinear systems `F(x1, x2) = 0`: Newton's method with an analytic
//! Jacobian, fixed-point iteration with an admissibility guard, and zero-contour extraction
//! by marching squares for plotting.
use crate::numerical::solver_errors::{IterationOutcome, IterationSettings, NumError};
use itertools::Itertools;
use log::{debug, info, warn};
use nalgebra::{Matrix2, Vector2};

/// Jacobians with a smaller determinant magnitude stop Newton's method.
pub const DETERMINANT_EPS: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SystemStep {
    pub iteration: usize,
    pub x: Vector2<f64>,
    /// Euclidean length of the step
    pub step: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SystemReport {
    pub outcome: IterationOutcome<Vector2<f64>>,
    pub history: Vec<SystemStep>,
}

impl SystemReport {
    pub fn root(&self) -> Vector2<f64> {
        *self.outcome.value()
    }
}

/// Segment of a zero contour, `((x1, y1), (x2, y2))`.
pub type Segment = ((f64, f64), (f64, f64));

fn iterate_2d<N>(
    mut next: N,
    x0: Vector2<f64>,
    settings: &IterationSettings,
    name: &str,
) -> Result<SystemReport, NumError>
where
    N: FnMut(usize, &Vector2<f64>) -> Result<Vector2<f64>, NumError>,
{
    settings.validate()?;
    if !x0.iter().all(|v| v.is_finite()) {
        return Err(NumError::invalid("x0", "initial guess must be finite"));
    }
    let mut history: Vec<SystemStep> = Vec::new();
    let mut x = x0;
    for iteration in 1..=settings.max_iterations {
        let x_new = next(iteration, &x)?;
        let step = (x_new - x).norm();
        debug!(
            "{}: iteration {}, x = ({}, {}), step = {:e}",
            name, iteration, x_new[0], x_new[1], step
        );
        history.push(SystemStep {
            iteration,
            x: x_new,
            step,
        });
        x = x_new;
        if step < settings.tolerance {
            info!("{} converged to ({}, {}) in {} iterations", name, x[0], x[1], iteration);
            return Ok(SystemReport {
                outcome: IterationOutcome::Converged {
                    value: x,
                    iterations: iteration,
                },
                history,
            });
        }
    }
    let last_residual = history.last().map_or(f64::NAN, |s| s.step);
    warn!("{} stopped after {} iterations", name, settings.max_iterations);
    Ok(SystemReport {
        outcome: IterationOutcome::MaxIterationsReached {
            value: x,
            iterations: settings.max_iterations,
            last_residual,
        },
        history,
    })
}

/// Newton's method `x <- x - J(x)^-1 F(x)`.
pub fn newton_2d<F, J>(
    f: F,
    jacobian: J,
    x0: Vector2<f64>,
    settings: &IterationSettings,
) -> Result<SystemReport, NumError>
where
    F: Fn(&Vector2<f64>) -> Vector2<f64>,
    J: Fn(&Vector2<f64>) -> Matrix2<f64>,
{
    iterate_2d(
        |iteration, x| {
            let jac = jacobian(x);
            if jac.determinant().abs() < DETERMINANT_EPS {
                return Err(NumError::DegenerateDerivative { iteration });
            }
            let inverse = jac
                .try_inverse()
                .ok_or(NumError::DegenerateDerivative { iteration })?;
            let x_new = x - inverse * f(x);
            if !x_new.iter().all(|v| v.is_finite()) {
                return Err(NumError::Diverged { iteration });
            }
            Ok(x_new)
        },
        x0,
        settings,
        "Newton 2D",
    )
}

/// Fixed-point iteration `x <- phi(x)`; an iterate rejected by `admissible` (or non-finite)
/// aborts with [`NumError::Diverged`].
pub fn simple_iteration_2d<P, A>(
    phi: P,
    admissible: A,
    x0: Vector2<f64>,
    settings: &IterationSettings,
) -> Result<SystemReport, NumError>
where
    P: Fn(&Vector2<f64>) -> Vector2<f64>,
    A: Fn(&Vector2<f64>) -> bool,
{
    iterate_2d(
        |iteration, x| {
            let x_new = phi(x);
            if !x_new.iter().all(|v| v.is_finite()) || !admissible(&x_new) {
                warn!("iterate ({}, {}) rejected at iteration {}", x_new[0], x_new[1], iteration);
                return Err(NumError::Diverged { iteration });
            }
            Ok(x_new)
        },
        x0,
        settings,
        "simple iteration 2D",
    )
}

fn crossing(p: (f64, f64), q: (f64, f64), vp: f64, vq: f64) -> (f64, f64) {
    let t = vp / (vp - vq);
    (p.0 + t * (q.0 - p.0), p.1 + t * (q.1 - p.1))
}

/// Zero level set of `f` sampled on the tensor grid `xs × ys`, as line segments.
///
/// Cells with a non-finite corner value are skipped. Saddle cells are resolved by the sign
/// of the cell-centre average.
pub fn zero_contour<F>(f: F, xs: &[f64], ys: &[f64]) -> Vec<Segment>
where
    F: Fn(f64, f64) -> f64,
{
    // values[i][j] = f(xs[i], ys[j])
    let values: Vec<Vec<f64>> = xs
        .iter()
        .map(|x| ys.iter().map(|y| f(*x, *y)).collect())
        .collect();
    let mut segments = Vec::new();
    for ((i, (x0, x1)), (j, (y0, y1))) in xs
        .iter()
        .tuple_windows()
        .enumerate()
        .cartesian_product(ys.iter().tuple_windows().enumerate())
    {
        // corners counter-clockwise from (x0, y0)
        let corners = [(*x0, *y0), (*x1, *y0), (*x1, *y1), (*x0, *y1)];
        let v = [
            values[i][j],
            values[i + 1][j],
            values[i + 1][j + 1],
            values[i][j + 1],
        ];
        if v.iter().any(|val| !val.is_finite()) {
            continue;
        }
        // edges bottom, right, top, left
        let points: Vec<Option<(f64, f64)>> = (0..4)
            .map(|e| {
                let (k, l) = (e, (e + 1) % 4);
                if (v[k] > 0.0) != (v[l] > 0.0) {
                    Some(crossing(corners[k], corners[l], v[k], v[l]))
                } else {
                    None
                }
            })
            .collect();
        let found: Vec<(f64, f64)> = points.iter().flatten().copied().collect();
        match found.len() {
            2 => segments.push((found[0], found[1])),
            4 => {
                let centre = v.iter().sum::<f64>() / 4.0;
                let [b, r, t, l] = [found[0], found[1], found[2], found[3]];
                if (centre > 0.0) == (v[0] > 0.0) {
                    segments.push((b, r));
                    segments.push((t, l));
                } else {
                    segments.push((l, b));
                    segments.push((r, t));
                }
            }
            _ => {}
        }
    }
    debug!("zero contour: {} segments", segments.len());
    segments
}
