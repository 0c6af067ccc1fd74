//! Composite quadrature on a grid: midpoint rectangles, trapezoids and Simpson's rule.
//! Gauss-Legendre (gauss-quad) gives an independent reference value.
//!
//! Besides the total, every rule reports the running integral `∫_{x_0}^{x_i} f dx` at the grid
//! points. Simpson panels span two intervals, so its running value exists only at even `i`.
//!
//! ## Usage Example
//! ```rust, ignore
//! use RustedNumLabs::numerical::grid::Grid;
//! use RustedNumLabs::numerical::quadrature::{QuadratureRule, integrate};
//! let grid = Grid::uniform_with_step(0.0, 4.0, 0.5)?;
//! let value = integrate(QuadratureRule::Simpson, &|x: f64| x.exp(), &grid)?;
//! ```
use crate::numerical::grid::Grid;
use crate::numerical::solver_errors::NumError;
use gauss_quad::GaussLegendre;
use log::debug;
use strum_macros::{Display, EnumIter, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(ascii_case_insensitive)]
pub enum QuadratureRule {
    #[strum(to_string = "rectangle", serialize = "midpoint")]
    Rectangle,
    #[strum(to_string = "trapezoid")]
    Trapezoid,
    #[strum(to_string = "Simpson")]
    Simpson,
}

impl QuadratureRule {
    /// Order of the composite error in `h`.
    pub fn order(&self) -> i32 {
        match self {
            QuadratureRule::Rectangle => 2,
            QuadratureRule::Trapezoid => 2,
            QuadratureRule::Simpson => 4,
        }
    }
}

fn sample<F>(f: &F, x: f64) -> Result<f64, NumError>
where
    F: Fn(f64) -> f64,
{
    let y = f(x);
    if y.is_finite() {
        Ok(y)
    } else {
        Err(NumError::invalid(
            "integrand",
            format!("value {} at x = {}", y, x),
        ))
    }
}

/// Running integral at every grid point; `None` where the rule has no panel boundary.
pub fn running_integral<F>(rule: QuadratureRule, f: &F, grid: &Grid) -> Result<Vec<Option<f64>>, NumError>
where
    F: Fn(f64) -> f64,
{
    let x = grid.points();
    let n = grid.intervals();
    let mut running = Vec::with_capacity(n + 1);
    running.push(Some(0.0));
    let mut sum = 0.0;
    match rule {
        QuadratureRule::Rectangle => {
            for i in 0..n {
                sum += sample(f, 0.5 * (x[i] + x[i + 1]))? * grid.step(i);
                running.push(Some(sum));
            }
        }
        QuadratureRule::Trapezoid => {
            let mut left = sample(f, x[0])?;
            for i in 0..n {
                let right = sample(f, x[i + 1])?;
                sum += 0.5 * (left + right) * grid.step(i);
                running.push(Some(sum));
                left = right;
            }
        }
        QuadratureRule::Simpson => {
            if n % 2 != 0 {
                return Err(NumError::invalid(
                    "grid",
                    format!("Simpson's rule needs an even number of intervals, got {}", n),
                ));
            }
            let mut left = sample(f, x[0])?;
            for i in (0..n).step_by(2) {
                let middle = sample(f, x[i + 1])?;
                let right = sample(f, x[i + 2])?;
                sum += (x[i + 2] - x[i]) / 6.0 * (left + 4.0 * middle + right);
                running.push(None);
                running.push(Some(sum));
                left = right;
            }
        }
    }
    debug!("{} rule on {} intervals: {}", rule, n, sum);
    Ok(running)
}

/// `∫_{x_0}^{x_n} f dx` by the given composite rule.
pub fn integrate<F>(rule: QuadratureRule, f: &F, grid: &Grid) -> Result<f64, NumError>
where
    F: Fn(f64) -> f64,
{
    let running = running_integral(rule, f, grid)?;
    running
        .last()
        .copied()
        .flatten()
        .ok_or_else(|| NumError::invalid("grid", "no panel ends at the last point"))
}

/// Gauss-Legendre rule with `degree` nodes on `[a, b]`.
pub fn gauss_legendre<F>(f: &F, a: f64, b: f64, degree: usize) -> Result<f64, NumError>
where
    F: Fn(f64) -> f64,
{
    let quad = GaussLegendre::new(degree)
        .map_err(|e| NumError::invalid("degree", format!("Gauss-Legendre rule: {:?}", e)))?;
    let value = quad.integrate(a, b, f);
    if !value.is_finite() {
        return Err(NumError::invalid("integrand", format!("Gauss-Legendre value {}", value)));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn exact_for_low_degree_polynomials() {
        let grid = Grid::uniform_with_step(0.0, 2.0, 0.5).unwrap();
        // linear: every rule is exact
        for rule in QuadratureRule::iter() {
            let value = integrate(rule, &|x: f64| 3.0 * x + 1.0, &grid).unwrap();
            assert_abs_diff_eq!(value, 8.0, epsilon = 1e-12);
        }
        // Simpson is exact for cubics
        let cubic = integrate(QuadratureRule::Simpson, &|x: f64| x.powi(3), &grid).unwrap();
        assert_abs_diff_eq!(cubic, 4.0, epsilon = 1e-12);
    }

    #[test]
    fn errors_shrink_with_rule_order() {
        let exact = 1.0_f64.exp() - 1.0;
        let error = |rule: QuadratureRule, h: f64| {
            let grid = Grid::uniform_with_step(0.0, 1.0, h).unwrap();
            (integrate(rule, &|x: f64| x.exp(), &grid).unwrap() - exact).abs()
        };
        for rule in QuadratureRule::iter() {
            let ratio = error(rule, 0.1) / error(rule, 0.05);
            let expected = 2.0_f64.powi(rule.order());
            assert_relative_eq!(ratio, expected, max_relative = 0.05);
        }
        // midpoint error is about half the trapezoid one, with the opposite sign
        let rect = error(QuadratureRule::Rectangle, 0.1);
        let trap = error(QuadratureRule::Trapezoid, 0.1);
        assert_relative_eq!(trap / rect, 2.0, max_relative = 0.01);
    }

    #[test]
    fn running_values_accumulate() {
        let grid = Grid::uniform_with_step(0.0, 4.0, 1.0).unwrap();
        let trap = running_integral(QuadratureRule::Trapezoid, &|x: f64| x, &grid).unwrap();
        let expected = [0.0, 0.5, 2.0, 4.5, 8.0];
        for (value, exact) in trap.iter().zip(expected.iter()) {
            assert_abs_diff_eq!(value.unwrap(), *exact, epsilon = 1e-12);
        }
        let simpson = running_integral(QuadratureRule::Simpson, &|x: f64| x, &grid).unwrap();
        assert_eq!(simpson.len(), 5);
        assert!(simpson[1].is_none() && simpson[3].is_none());
        assert_abs_diff_eq!(simpson[2].unwrap(), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn simpson_rejects_odd_interval_count() {
        let grid = Grid::uniform_with_step(0.0, 3.0, 1.0).unwrap();
        assert!(matches!(
            integrate(QuadratureRule::Simpson, &|x: f64| x, &grid),
            Err(NumError::InvalidParameter { name: "grid", .. })
        ));
        assert!(integrate(QuadratureRule::Trapezoid, &|x: f64| x, &grid).is_ok());
    }

    #[test]
    fn singular_integrand_is_reported() {
        let grid = Grid::uniform_with_step(0.0, 1.0, 0.5).unwrap();
        assert!(matches!(
            integrate(QuadratureRule::Trapezoid, &|x: f64| 1.0 / x, &grid),
            Err(NumError::InvalidParameter { name: "integrand", .. })
        ));
        // the midpoint rule never samples the endpoints
        assert!(integrate(QuadratureRule::Rectangle, &|x: f64| 1.0 / x.sqrt(), &grid).is_ok());
    }

    #[test]
    fn composite_rules_agree_with_gauss_legendre() {
        let f = |x: f64| x.powi(4) + x * x;
        let reference = gauss_legendre(&f, 0.0, 1.0, 25).unwrap();
        assert_abs_diff_eq!(reference, 0.2 + 1.0 / 3.0, epsilon = 1e-12);
        let grid = Grid::uniform_between(0.0, 1.0, 1000).unwrap();
        let simpson = integrate(QuadratureRule::Simpson, &f, &grid).unwrap();
        assert_relative_eq!(simpson, reference, epsilon = 1e-10);
    }

    #[test]
    fn rule_names_parse() {
        assert_eq!(QuadratureRule::from_str("midpoint").unwrap(), QuadratureRule::Rectangle);
        assert_eq!(QuadratureRule::from_str("simpson").unwrap(), QuadratureRule::Simpson);
        assert_eq!(QuadratureRule::Trapezoid.to_string(), "trapezoid");
        assert!(QuadratureRule::from_str("gauss").is_err());
    }
}
