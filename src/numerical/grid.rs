//! Grids of abscissas for fixed-step integration and boundary-value discretisation.
use crate::numerical::solver_errors::NumError;
use itertools::Itertools;
use nalgebra::DVector;

/// Strictly increasing sequence of grid points.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    points: Vec<f64>,
}

pub(crate) fn check_step(h: f64) -> Result<(), NumError> {
    if !(h.is_finite() && h > 0.0) {
        return Err(NumError::invalid(
            "h",
            format!("step must be finite and positive, got {}", h),
        ));
    }
    Ok(())
}

pub(crate) fn check_intervals(n: usize) -> Result<(), NumError> {
    if n < 1 {
        return Err(NumError::invalid("n", "at least one step is required"));
    }
    Ok(())
}

impl Grid {
    /// `n + 1` points `x0 + i*h`.
    pub fn uniform(x0: f64, h: f64, n: usize) -> Result<Self, NumError> {
        check_step(h)?;
        check_intervals(n)?;
        if !x0.is_finite() {
            return Err(NumError::invalid("x0", "must be finite"));
        }
        let points = (0..=n).map(|i| x0 + i as f64 * h).collect();
        Ok(Grid { points })
    }

    /// `n` equal intervals on `[a, b]`.
    pub fn uniform_between(a: f64, b: f64, n: usize) -> Result<Self, NumError> {
        check_intervals(n)?;
        if !(a.is_finite() && b.is_finite() && b > a) {
            return Err(NumError::invalid(
                "interval",
                format!("need finite a < b, got [{}, {}]", a, b),
            ));
        }
        let h = (b - a) / n as f64;
        let mut points: Vec<f64> = (0..=n).map(|i| a + i as f64 * h).collect();
        // pin the right end exactly
        points[n] = b;
        Ok(Grid { points })
    }

    /// Equal steps of length `h` on `[a, b]`; `b - a` must be a whole number of steps.
    pub fn uniform_with_step(a: f64, b: f64, h: f64) -> Result<Self, NumError> {
        check_step(h)?;
        let steps = (b - a) / h;
        let n = steps.round();
        if !(n >= 1.0 && (steps - n).abs() <= 1e-9 * steps.abs().max(1.0)) {
            return Err(NumError::invalid(
                "h",
                format!("[{}, {}] is not a whole number of steps {}", a, b, h),
            ));
        }
        Self::uniform_between(a, b, n as usize)
    }

    pub fn from_points(points: Vec<f64>) -> Result<Self, NumError> {
        if points.len() < 2 {
            return Err(NumError::invalid("grid", "at least two points are required"));
        }
        if points.iter().any(|x| !x.is_finite()) {
            return Err(NumError::invalid("grid", "points must be finite"));
        }
        if points.iter().tuple_windows().any(|(l, r)| r <= l) {
            return Err(NumError::invalid("grid", "points must be strictly increasing"));
        }
        Ok(Grid { points })
    }

    /// Replaces the first point by `x0 + eps`, e.g. to step off a singular coefficient at `x = 0`.
    pub fn with_perturbed_start(mut self, eps: f64) -> Result<Self, NumError> {
        let shifted = self.points[0] + eps;
        if !(eps.is_finite() && eps >= 0.0) || shifted >= self.points[1] {
            return Err(NumError::invalid(
                "start_eps",
                format!("perturbation {} does not keep the grid increasing", eps),
            ));
        }
        self.points[0] = shifted;
        Ok(self)
    }

    pub fn points(&self) -> &[f64] {
        &self.points
    }

    /// Number of intervals.
    pub fn intervals(&self) -> usize {
        self.points.len() - 1
    }

    pub fn step(&self, i: usize) -> f64 {
        self.points[i + 1] - self.points[i]
    }

    pub fn first(&self) -> f64 {
        self.points[0]
    }

    pub fn last(&self) -> f64 {
        self.points[self.points.len() - 1]
    }

    pub fn to_dvector(&self) -> DVector<f64> {
        DVector::from_column_slice(&self.points)
    }
}

/// `n` evenly spaced samples on `[start, end]`, both ends included.
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let h = (end - start) / (n - 1) as f64;
            (0..n)
                .map(|i| if i == n - 1 { end } else { start + i as f64 * h })
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn uniform_grid_has_n_plus_one_points() {
        let grid = Grid::uniform(1.0, 0.1, 10).unwrap();
        assert_eq!(grid.points().len(), 11);
        assert_eq!(grid.intervals(), 10);
        assert_relative_eq!(grid.last(), 2.0, epsilon = 1e-12);
        assert_relative_eq!(grid.step(3), 0.1, epsilon = 1e-12);
    }

    #[test]
    fn bad_steps_are_rejected() {
        assert!(matches!(
            Grid::uniform(0.0, 0.0, 10),
            Err(NumError::InvalidParameter { name: "h", .. })
        ));
        assert!(Grid::uniform(0.0, -0.1, 10).is_err());
        assert!(Grid::uniform(0.0, f64::NAN, 10).is_err());
        assert!(matches!(
            Grid::uniform(0.0, 0.1, 0),
            Err(NumError::InvalidParameter { name: "n", .. })
        ));
        assert!(Grid::uniform_between(1.0, 1.0, 4).is_err());
    }

    #[test]
    fn perturbed_start_moves_only_first_point() {
        let grid = Grid::uniform_between(0.0, 4.0, 10)
            .unwrap()
            .with_perturbed_start(1e-10)
            .unwrap();
        assert_eq!(grid.first(), 1e-10);
        assert_relative_eq!(grid.points()[1], 0.4, epsilon = 1e-12);
        assert_eq!(grid.last(), 4.0);
        let too_big = Grid::uniform_between(0.0, 4.0, 10)
            .unwrap()
            .with_perturbed_start(1.0);
        assert!(too_big.is_err());
    }

    #[test]
    fn step_must_divide_the_interval() {
        let grid = Grid::uniform_with_step(0.0, 4.0, 0.5).unwrap();
        assert_eq!(grid.intervals(), 8);
        assert_eq!(grid.last(), 4.0);
        assert_eq!(Grid::uniform_with_step(0.0, 1.0, 0.1).unwrap().intervals(), 10);
        assert!(matches!(
            Grid::uniform_with_step(0.0, 4.0, 0.3),
            Err(NumError::InvalidParameter { name: "h", .. })
        ));
        assert!(Grid::uniform_with_step(0.0, 4.0, 8.0).is_err());
        assert!(Grid::uniform_with_step(4.0, 0.0, 1.0).is_err());
    }

    #[test]
    fn explicit_points_must_increase() {
        assert!(Grid::from_points(vec![0.0, 0.5, 0.4]).is_err());
        assert!(Grid::from_points(vec![0.0]).is_err());
        assert!(Grid::from_points(vec![0.0, 0.2, 0.7]).is_ok());
    }

    #[test]
    fn linspace_includes_both_ends() {
        let xs = linspace(0.0, 1.5, 500);
        assert_eq!(xs.len(), 500);
        assert_eq!(xs[0], 0.0);
        assert_eq!(xs[499], 1.5);
        assert!(linspace(0.0, 1.0, 0).is_empty());
        assert_eq!(linspace(2.0, 3.0, 1), vec![2.0]);
    }
}
