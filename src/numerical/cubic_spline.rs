//! Natural cubic spline through tabulated points.
//!
//! On `[x_i, x_{i+1}]` the spline is `a_i + b_i t + c_i t^2 + d_i t^3` with `t = x - x_i`.
//! The curvature coefficients `c_1..c_{n-2}` solve the tridiagonal system
//! `h_{i-1} c_{i-1} + 2(h_{i-1} + h_i) c_i + h_i c_{i+1} = 3((f_{i+1} - f_i)/h_i - (f_i - f_{i-1})/h_{i-1})`
//! with the natural conditions `c_0 = c_{n-1} = 0`, i.e. `S'' = 0` at both ends.
use crate::numerical::grid::Grid;
use crate::numerical::solver_errors::NumError;
use crate::somelinalg::Thomas::TridiagonalSystem;
use log::{debug, info};

#[derive(Debug, Clone, PartialEq)]
pub struct CubicSpline {
    /// nodes
    pub x: Vec<f64>,
    pub a: Vec<f64>,
    pub b: Vec<f64>,
    /// one value per node, the last one is the right-end curvature (zero)
    pub c: Vec<f64>,
    pub d: Vec<f64>,
}

impl CubicSpline {
    pub fn natural(x: &[f64], f: &[f64]) -> Result<Self, NumError> {
        if x.len() != f.len() {
            return Err(NumError::invalid(
                "data",
                format!("x has {} points, f has {}", x.len(), f.len()),
            ));
        }
        if x.len() < 3 {
            return Err(NumError::invalid(
                "data",
                format!("a cubic spline needs at least 3 nodes, got {}", x.len()),
            ));
        }
        if f.iter().any(|v| !v.is_finite()) {
            return Err(NumError::invalid("data", "values must be finite"));
        }
        let grid = Grid::from_points(x.to_vec())?;
        let n = x.len();
        let h: Vec<f64> = (0..n - 1).map(|i| grid.step(i)).collect();
        let slope = |i: usize| (f[i + 1] - f[i]) / h[i];

        // unknowns c_1..c_{n-2}
        let interior = n - 2;
        let system = TridiagonalSystem::new(
            (0..interior).map(|k| h[k]).collect(),
            (0..interior).map(|k| 2.0 * (h[k] + h[k + 1])).collect(),
            (0..interior).map(|k| h[k + 1]).collect(),
            (0..interior).map(|k| 3.0 * (slope(k + 1) - slope(k))).collect(),
        )?;
        let inner = system.solve()?;
        debug!("spline curvature system residual {:e}", system.residual(&inner));

        let mut c = Vec::with_capacity(n);
        c.push(0.0);
        c.extend(inner);
        c.push(0.0);

        let a = f[..n - 1].to_vec();
        let b = (0..n - 1)
            .map(|i| slope(i) - h[i] * (2.0 * c[i] + c[i + 1]) / 3.0)
            .collect();
        let d = (0..n - 1).map(|i| (c[i + 1] - c[i]) / (3.0 * h[i])).collect();
        info!("natural cubic spline built on {} nodes", n);
        Ok(CubicSpline {
            x: x.to_vec(),
            a,
            b,
            c,
            d,
        })
    }

    /// Number of polynomial pieces.
    pub fn pieces(&self) -> usize {
        self.a.len()
    }

    /// Piece containing `x`; points outside the nodes use the nearest end piece.
    pub fn interval(&self, x: f64) -> usize {
        let upper = self.x[1..self.x.len() - 1].partition_point(|node| *node <= x);
        upper.min(self.pieces() - 1)
    }

    pub fn eval(&self, x: f64) -> f64 {
        let i = self.interval(x);
        let t = x - self.x[i];
        self.a[i] + t * (self.b[i] + t * (self.c[i] + t * self.d[i]))
    }

    pub fn derivative(&self, x: f64) -> f64 {
        let i = self.interval(x);
        let t = x - self.x[i];
        self.b[i] + t * (2.0 * self.c[i] + 3.0 * t * self.d[i])
    }

    pub fn second_derivative(&self, x: f64) -> f64 {
        let i = self.interval(x);
        let t = x - self.x[i];
        2.0 * self.c[i] + 6.0 * self.d[i] * t
    }

    /// `S''` at the first and the last node.
    pub fn end_curvatures(&self) -> (f64, f64) {
        let last = self.x[self.x.len() - 1];
        (self.second_derivative(self.x[0]), self.second_derivative(last))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn lab_spline() -> CubicSpline {
        CubicSpline::natural(&[0.1, 0.5, 0.9, 1.3, 1.7], &[10.0, 2.0, 1.1111, 0.76923, 0.58824]).unwrap()
    }

    #[test]
    fn passes_through_nodes_with_natural_ends() {
        let spline = lab_spline();
        for (x, f) in spline.x.iter().zip([10.0, 2.0, 1.1111, 0.76923, 0.58824]) {
            assert_abs_diff_eq!(spline.eval(*x), f, epsilon = 1e-12);
        }
        let (left, right) = spline.end_curvatures();
        assert_abs_diff_eq!(left, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(right, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn lab_coefficients() {
        let spline = lab_spline();
        assert_eq!(spline.pieces(), 4);
        assert_abs_diff_eq!(spline.b[0], -24.671396, epsilon = 1e-6);
        assert_abs_diff_eq!(spline.c[1], 35.035467, epsilon = 1e-6);
        assert_abs_diff_eq!(spline.c[2], -6.808741, epsilon = 1e-6);
        assert_abs_diff_eq!(spline.d[3], -2.046925, epsilon = 1e-6);
        assert_abs_diff_eq!(spline.eval(0.8), 1.014535, epsilon = 1e-6);
    }

    #[test]
    fn first_and_second_derivatives_are_continuous() {
        let spline = lab_spline();
        for i in 1..spline.x.len() - 1 {
            let node = spline.x[i];
            let (l, t) = (i - 1, node - spline.x[i - 1]);
            let left_slope = spline.b[l] + t * (2.0 * spline.c[l] + 3.0 * t * spline.d[l]);
            let left_curvature = 2.0 * spline.c[l] + 6.0 * spline.d[l] * t;
            assert_abs_diff_eq!(left_slope, spline.derivative(node), epsilon = 1e-9);
            assert_abs_diff_eq!(left_curvature, spline.second_derivative(node), epsilon = 1e-9);
        }
    }

    #[test]
    fn reproduces_straight_lines_and_finds_intervals() {
        let spline = CubicSpline::natural(&[0.0, 1.0, 3.0], &[1.0, 3.0, 7.0]).unwrap();
        assert!(spline.c.iter().all(|c| c.abs() < 1e-12));
        assert_abs_diff_eq!(spline.eval(2.0), 5.0, epsilon = 1e-12);
        assert_eq!(spline.interval(-1.0), 0);
        assert_eq!(spline.interval(1.0), 1);
        assert_eq!(spline.interval(3.0), 1);
        assert_eq!(spline.interval(10.0), 1);
    }

    #[test]
    fn bad_nodes_are_rejected() {
        assert!(CubicSpline::natural(&[0.0, 1.0], &[0.0, 1.0]).is_err());
        assert!(CubicSpline::natural(&[0.0, 1.0, 2.0], &[0.0, 1.0]).is_err());
        assert!(CubicSpline::natural(&[0.0, 2.0, 1.0], &[0.0, 1.0, 2.0]).is_err());
        assert!(CubicSpline::natural(&[0.0, 1.0, 2.0], &[0.0, f64::NAN, 2.0]).is_err());
    }
}
