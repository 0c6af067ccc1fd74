//! Runge-Romberg a-posteriori error estimate.
//!
//! For a method of order `p` run with steps `h` and `h/k` the error of the fine solution is
//! estimated as `|y_fine - y_coarse| / (k^p - 1)`. The per-point variant aligns the grids by
//! the rule: fine index `k*i` is the same abscissa as coarse index `i`.
use crate::numerical::solver_errors::NumError;
use itertools::Itertools;

fn denominator(k: usize, p: i32) -> Result<f64, NumError> {
    if k < 2 {
        return Err(NumError::invalid(
            "k",
            format!("refinement ratio must be at least 2, got {}", k),
        ));
    }
    if p < 1 {
        return Err(NumError::invalid(
            "p",
            format!("method order must be positive, got {}", p),
        ));
    }
    Ok((k as f64).powi(p) - 1.0)
}

/// Scalar estimate from two values of the same quantity, e.g. terminal values.
pub fn runge_romberg_error(f_coarse: f64, f_fine: f64, k: usize, p: i32) -> Result<f64, NumError> {
    let denom = denominator(k, p)?;
    Ok((f_fine - f_coarse).abs() / denom)
}

/// Richardson-refined value of a scalar: `f_fine + (f_fine - f_coarse)/(k^p - 1)`.
pub fn runge_romberg_refined_value(f_coarse: f64, f_fine: f64, k: usize, p: i32) -> Result<f64, NumError> {
    let denom = denominator(k, p)?;
    Ok(f_fine + (f_fine - f_coarse) / denom)
}

/// Fine-grid values at the coarse abscissas: `fine[k*i]` for every coarse index `i`.
pub fn coincident_points(coarse: &[f64], fine: &[f64], k: usize) -> Result<Vec<f64>, NumError> {
    if coarse.is_empty() {
        return Err(NumError::invalid("coarse", "empty solution"));
    }
    if k < 2 {
        return Err(NumError::invalid("k", "refinement ratio must be at least 2"));
    }
    let expected = k * (coarse.len() - 1) + 1;
    if fine.len() != expected {
        return Err(NumError::invalid(
            "fine",
            format!(
                "{} coarse points with ratio {} need {} fine points, got {}",
                coarse.len(),
                k,
                expected,
                fine.len()
            ),
        ));
    }
    Ok(fine.iter().step_by(k).copied().collect())
}

/// Per-point estimate, one value per coarse grid point.
pub fn runge_romberg_pointwise(
    coarse: &[f64],
    fine: &[f64],
    k: usize,
    p: i32,
) -> Result<Vec<f64>, NumError> {
    let denom = denominator(k, p)?;
    let aligned = coincident_points(coarse, fine, k)?;
    Ok(coarse
        .iter()
        .zip_eq(aligned.iter())
        .map(|(c, f)| (f - c).abs() / denom)
        .collect())
}

/// Richardson-refined values at the coarse abscissas: `y_fine + (y_fine - y_coarse)/(k^p - 1)`.
pub fn runge_romberg_refine(
    coarse: &[f64],
    fine: &[f64],
    k: usize,
    p: i32,
) -> Result<Vec<f64>, NumError> {
    let denom = denominator(k, p)?;
    let aligned = coincident_points(coarse, fine, k)?;
    Ok(coarse
        .iter()
        .zip_eq(aligned.iter())
        .map(|(c, f)| f + (f - c) / denom)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numerical::IVP_fixed_step::{IVPTask, euler_system};
    use approx::assert_relative_eq;
    use nalgebra::DVector;

    fn euler_terminal(h: f64, n: usize) -> f64 {
        let rhs = |_x: f64, y: &DVector<f64>| y.clone();
        let task = IVPTask::new(0.0, DVector::from_vec(vec![1.0]), h, n);
        let solution = euler_system(&rhs, &task).unwrap();
        solution.y[(n, 0)]
    }

    #[test]
    fn scalar_formula() {
        assert_relative_eq!(runge_romberg_error(1.0, 1.3, 2, 1).unwrap(), 0.3);
        assert_relative_eq!(runge_romberg_error(1.0, 1.15, 2, 4).unwrap(), 0.01);
        assert_relative_eq!(runge_romberg_error(1.0, 1.8, 3, 2).unwrap(), 0.1);
        assert_relative_eq!(runge_romberg_refined_value(1.0, 1.15, 2, 4).unwrap(), 1.16, epsilon = 1e-12);
        assert!(runge_romberg_refined_value(1.0, 1.15, 1, 4).is_err());
    }

    #[test]
    fn euler_estimates_halve_with_the_step() {
        let y_h = euler_terminal(0.1, 10);
        let y_h2 = euler_terminal(0.05, 20);
        let y_h4 = euler_terminal(0.025, 40);
        let first = runge_romberg_error(y_h, y_h2, 2, 1).unwrap();
        let second = runge_romberg_error(y_h2, y_h4, 2, 1).unwrap();
        let ratio = first / second;
        // first-order method: about 2 (1.87 at these steps)
        assert!(ratio > 1.7 && ratio < 2.2, "ratio = {}", ratio);
        // and the estimate is close to the true error of the fine solution
        let true_error = (y_h2 - 1.0_f64.exp()).abs();
        assert!((first - true_error).abs() / true_error < 0.15);
    }

    #[test]
    fn pointwise_alignment_uses_every_kth_fine_point() {
        let coarse = [0.0, 1.0, 2.0];
        let fine = [0.3, 9.0, 1.3, 9.0, 2.3];
        let errors = runge_romberg_pointwise(&coarse, &fine, 2, 1).unwrap();
        assert_eq!(errors.len(), 3);
        for e in errors {
            assert_relative_eq!(e, 0.3, epsilon = 1e-12);
        }
        let fine3 = [0.0, 7.0, 7.0, 1.7, 7.0, 7.0, 2.0];
        let errors3 = runge_romberg_pointwise(&coarse, &fine3, 3, 1).unwrap();
        assert_relative_eq!(errors3[1], 0.35, epsilon = 1e-12);
    }

    #[test]
    fn refinement_removes_leading_error_term() {
        // y = x^2 sampled with an O(h^2) perturbation c*h^2
        let exact = |x: f64| x * x;
        let coarse: Vec<f64> = (0..=4).map(|i| exact(i as f64 * 0.25) + 0.5 * 0.25 * 0.25).collect();
        let fine: Vec<f64> = (0..=8)
            .map(|i| exact(i as f64 * 0.125) + 0.5 * 0.125 * 0.125)
            .collect();
        let refined = runge_romberg_refine(&coarse, &fine, 2, 2).unwrap();
        for (i, y) in refined.iter().enumerate() {
            assert_relative_eq!(*y, exact(i as f64 * 0.25), epsilon = 1e-12);
        }
    }

    #[test]
    fn incompatible_grids_are_rejected() {
        let coarse = [0.0, 1.0, 2.0];
        assert!(matches!(
            runge_romberg_pointwise(&coarse, &[0.0, 1.0, 2.0, 3.0], 2, 2),
            Err(NumError::InvalidParameter { name: "fine", .. })
        ));
        assert!(runge_romberg_pointwise(&[], &[], 2, 2).is_err());
        assert!(runge_romberg_error(1.0, 2.0, 1, 2).is_err());
        assert!(runge_romberg_error(1.0, 2.0, 2, 0).is_err());
    }
}
