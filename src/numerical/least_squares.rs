//! Polynomial least-squares approximation via normal equations.
//!
//! For degree `m` the normal matrix is `G[k][j] = Σ x^(k+j)` and the right-hand side
//! `r[k] = Σ y x^k`, `k, j = 0..=m`. Coefficients are returned in ascending powers.
use crate::numerical::solver_errors::NumError;
use itertools::Itertools;
use log::{debug, info};
use nalgebra::{DMatrix, DVector};

#[derive(Debug, Clone, PartialEq)]
pub struct PolynomialFit {
    /// ascending powers: `c[0] + c[1] x + ...`
    pub coefficients: DVector<f64>,
    /// sum of squared errors at the data points
    pub sse: f64,
}

impl PolynomialFit {
    pub fn degree(&self) -> usize {
        self.coefficients.len() - 1
    }

    pub fn eval(&self, x: f64) -> f64 {
        eval_polynomial(self.coefficients.as_slice(), x)
    }

    /// `c0 + c1*x + c2*x^2` with four decimals.
    pub fn to_formula(&self) -> String {
        self.coefficients
            .iter()
            .enumerate()
            .map(|(k, c)| match k {
                0 => format!("{:.4}", c),
                1 => format!("{:+.4}*x", c),
                _ => format!("{:+.4}*x^{}", c, k),
            })
            .join(" ")
    }
}

/// Horner evaluation, coefficients in ascending powers.
pub fn eval_polynomial(coefficients: &[f64], x: f64) -> f64 {
    coefficients.iter().rev().fold(0.0, |acc, c| acc * x + c)
}

fn check_data(x: &[f64], y: &[f64], degree: usize) -> Result<(), NumError> {
    if x.len() != y.len() {
        return Err(NumError::invalid(
            "data",
            format!("x has {} points, y has {}", x.len(), y.len()),
        ));
    }
    if degree >= x.len() {
        return Err(NumError::invalid(
            "degree",
            format!("degree {} needs more than {} points", degree, x.len()),
        ));
    }
    if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
        return Err(NumError::invalid("data", "values must be finite"));
    }
    Ok(())
}

pub fn normal_equations(x: &[f64], y: &[f64], degree: usize) -> Result<(DMatrix<f64>, DVector<f64>), NumError> {
    check_data(x, y, degree)?;
    let size = degree + 1;
    // power sums Σ x^k, k = 0..=2m
    let power_sums: Vec<f64> = (0..2 * size - 1)
        .map(|k| x.iter().map(|xi| xi.powi(k as i32)).sum::<f64>())
        .collect();
    let matrix = DMatrix::from_fn(size, size, |k, j| power_sums[k + j]);
    let rhs = DVector::from_fn(size, |k, _| {
        x.iter()
            .zip_eq(y.iter())
            .map(|(xi, yi)| yi * xi.powi(k as i32))
            .sum::<f64>()
    });
    Ok((matrix, rhs))
}

pub fn sum_squared_errors(coefficients: &[f64], x: &[f64], y: &[f64]) -> f64 {
    x.iter()
        .zip(y.iter())
        .map(|(xi, yi)| (eval_polynomial(coefficients, *xi) - yi).powi(2))
        .sum()
}

pub fn polynomial_fit(x: &[f64], y: &[f64], degree: usize) -> Result<PolynomialFit, NumError> {
    let (matrix, rhs) = normal_equations(x, y, degree)?;
    debug!("normal matrix of degree {}: {}", degree, matrix);
    let coefficients = matrix
        .lu()
        .solve(&rhs)
        .ok_or_else(|| NumError::invalid("data", "normal matrix is singular"))?;
    let sse = sum_squared_errors(coefficients.as_slice(), x, y);
    info!("degree {} fit: coefficients {:?}, SSE {}", degree, coefficients.as_slice(), sse);
    Ok(PolynomialFit { coefficients, sse })
}
