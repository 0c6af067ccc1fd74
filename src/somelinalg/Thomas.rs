//! Tridiagonal linear systems and the Thomas algorithm (O(n) Gaussian elimination without pivoting).
//!
//! Row `i` reads `a[i]*y[i-1] + b[i]*y[i] + c[i]*y[i+1] = d[i]`; `a[0]` and `c[n-1]` are ignored.
//! Diagonal dominance is assumed, not checked: a zero pivot or a non-finite intermediate value
//! is reported as [`NumError::ZeroPivot`].
use crate::numerical::solver_errors::NumError;
use log::debug;
use nalgebra::{DMatrix, DVector};

#[derive(Debug, Clone, PartialEq)]
pub struct TridiagonalSystem {
    /// sub-diagonal
    pub a: Vec<f64>,
    /// diagonal
    pub b: Vec<f64>,
    /// super-diagonal
    pub c: Vec<f64>,
    /// right-hand side
    pub d: Vec<f64>,
}

impl TridiagonalSystem {
    pub fn new(a: Vec<f64>, b: Vec<f64>, c: Vec<f64>, d: Vec<f64>) -> Result<Self, NumError> {
        let n = d.len();
        if n == 0 {
            return Err(NumError::invalid("d", "empty system"));
        }
        if a.len() != n || b.len() != n || c.len() != n {
            return Err(NumError::invalid(
                "tridiagonal",
                format!(
                    "diagonals must have equal lengths, got a: {}, b: {}, c: {}, d: {}",
                    a.len(),
                    b.len(),
                    c.len(),
                    n
                ),
            ));
        }
        Ok(TridiagonalSystem { a, b, c, d })
    }

    pub fn len(&self) -> usize {
        self.d.len()
    }

    pub fn is_empty(&self) -> bool {
        self.d.is_empty()
    }

    pub fn solve(&self) -> Result<Vec<f64>, NumError> {
        thomas_algorithm(&self.a, &self.b, &self.c, &self.d)
    }

    pub fn to_dense(&self) -> DMatrix<f64> {
        let n = self.len();
        DMatrix::from_fn(n, n, |i, j| {
            if i == j {
                self.b[i]
            } else if j + 1 == i {
                self.a[i]
            } else if i + 1 == j {
                self.c[i]
            } else {
                0.0
            }
        })
    }

    /// Max-norm of `A*y - d`.
    pub fn residual(&self, y: &[f64]) -> f64 {
        let ay = self.to_dense() * DVector::from_column_slice(y);
        ay.iter()
            .zip(self.d.iter())
            .map(|(l, r)| (l - r).abs())
            .fold(0.0, f64::max)
    }
}

pub fn thomas_algorithm(a: &[f64], b: &[f64], c: &[f64], d: &[f64]) -> Result<Vec<f64>, NumError> {
    let n = d.len();
    if n == 0 || a.len() != n || b.len() != n || c.len() != n {
        return Err(NumError::invalid(
            "tridiagonal",
            "diagonals must be non-empty and of equal length",
        ));
    }
    let mut cp = vec![0.0; n];
    let mut dp = vec![0.0; n];

    if b[0] == 0.0 {
        return Err(NumError::ZeroPivot { row: 0 });
    }
    cp[0] = c[0] / b[0];
    dp[0] = d[0] / b[0];

    // forward sweep
    for i in 1..n {
        let denom = b[i] - a[i] * cp[i - 1];
        if denom == 0.0 || !denom.is_finite() {
            debug!("Thomas algorithm: pivot {} at row {}", denom, i);
            return Err(NumError::ZeroPivot { row: i });
        }
        cp[i] = c[i] / denom;
        dp[i] = (d[i] - a[i] * dp[i - 1]) / denom;
    }

    // back substitution
    let mut y = vec![0.0; n];
    y[n - 1] = dp[n - 1];
    for i in (0..n - 1).rev() {
        y[i] = dp[i] - cp[i] * y[i + 1];
    }
    if let Some(row) = y.iter().position(|v| !v.is_finite()) {
        return Err(NumError::ZeroPivot { row });
    }
    Ok(y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// `-1, 4, -1` rows with the right-hand side of a unit solution
    fn unit_solution_system(n: usize) -> TridiagonalSystem {
        let a = vec![-1.0; n];
        let b = vec![4.0; n];
        let c = vec![-1.0; n];
        let d = (0..n)
            .map(|i| {
                let mut s = 4.0;
                if i > 0 {
                    s -= 1.0;
                }
                if i + 1 < n {
                    s -= 1.0;
                }
                s
            })
            .collect();
        TridiagonalSystem::new(a, b, c, d).unwrap()
    }

    #[test]
    fn reproduces_unit_solution() {
        for n in [1, 2, 5, 50] {
            let system = unit_solution_system(n);
            let y = system.solve().unwrap();
            assert_eq!(y.len(), n);
            for v in &y {
                assert_relative_eq!(*v, 1.0, epsilon = 1e-9);
            }
            assert!(system.residual(&y) < 1e-9);
        }
    }

    #[test]
    fn agrees_with_dense_lu() {
        let system = TridiagonalSystem::new(
            vec![0.0, 1.0, -2.0, 0.5, 1.5],
            vec![5.0, 6.0, 7.0, 4.0, 3.5],
            vec![1.0, -1.0, 2.0, 1.0, 0.0],
            vec![1.0, 2.0, 3.0, 4.0, 5.0],
        )
        .unwrap();
        let y = system.solve().unwrap();
        let dense = system
            .to_dense()
            .lu()
            .solve(&DVector::from_column_slice(&system.d))
            .unwrap();
        for (t, l) in y.iter().zip(dense.iter()) {
            assert_relative_eq!(*t, *l, epsilon = 1e-12);
        }
    }

    #[test]
    fn identity_boundary_rows_pin_values() {
        // y0 = 2, y2 = 8, y0 - 2y1 + y2 = 0  =>  y1 = 5
        let system = TridiagonalSystem::new(
            vec![0.0, 1.0, 0.0],
            vec![1.0, -2.0, 1.0],
            vec![0.0, 1.0, 0.0],
            vec![2.0, 0.0, 8.0],
        )
        .unwrap();
        let y = system.solve().unwrap();
        assert_relative_eq!(y[0], 2.0);
        assert_relative_eq!(y[1], 5.0);
        assert_relative_eq!(y[2], 8.0);
    }

    #[test]
    fn zero_pivot_is_reported() {
        let zero_first = thomas_algorithm(&[0.0, 1.0], &[0.0, 1.0], &[1.0, 0.0], &[1.0, 1.0]);
        assert_eq!(zero_first, Err(NumError::ZeroPivot { row: 0 }));
        // second pivot: 1 - 1*1 = 0
        let zero_second = thomas_algorithm(&[0.0, 1.0], &[1.0, 1.0], &[1.0, 0.0], &[1.0, 1.0]);
        assert_eq!(zero_second, Err(NumError::ZeroPivot { row: 1 }));
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        assert!(matches!(
            TridiagonalSystem::new(vec![0.0; 3], vec![1.0; 2], vec![0.0; 3], vec![1.0; 3]),
            Err(NumError::InvalidParameter { .. })
        ));
        assert!(TridiagonalSystem::new(vec![], vec![], vec![], vec![]).is_err());
    }
}
