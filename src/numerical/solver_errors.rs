//! Error taxonomy shared by all solvers and the tagged outcome of capped iterations.
//!
//! Solvers never hide a breakdown behind NaN: malformed input is rejected with
//! [`NumError::InvalidParameter`], and iterative methods report whether they actually
//! converged through [`IterationOutcome`].
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum NumError {
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
    #[error("no convergence after {iterations} iterations, last residual {last_residual:e}")]
    DidNotConverge {
        iterations: usize,
        last_residual: f64,
    },
    #[error("zero pivot in tridiagonal elimination at row {row}")]
    ZeroPivot { row: usize },
    #[error("derivative (jacobian) vanished at iteration {iteration}")]
    DegenerateDerivative { iteration: usize },
    #[error("iterate left the admissible domain at iteration {iteration}")]
    Diverged { iteration: usize },
    #[error("function has the same sign at both ends of [{a}, {b}]")]
    NoSignChange { a: f64, b: f64 },
}

impl NumError {
    pub fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        NumError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

/// Result of an iteration with a hard cap.
#[derive(Debug, Clone, PartialEq)]
pub enum IterationOutcome<T> {
    Converged { value: T, iterations: usize },
    MaxIterationsReached {
        value: T,
        iterations: usize,
        last_residual: f64,
    },
}

impl<T> IterationOutcome<T> {
    pub fn value(&self) -> &T {
        match self {
            IterationOutcome::Converged { value, .. } => value,
            IterationOutcome::MaxIterationsReached { value, .. } => value,
        }
    }

    pub fn iterations(&self) -> usize {
        match self {
            IterationOutcome::Converged { iterations, .. } => *iterations,
            IterationOutcome::MaxIterationsReached { iterations, .. } => *iterations,
        }
    }

    pub fn is_converged(&self) -> bool {
        matches!(self, IterationOutcome::Converged { .. })
    }

    /// Turns a capped-out iteration into [`NumError::DidNotConverge`].
    pub fn into_result(self) -> Result<T, NumError> {
        match self {
            IterationOutcome::Converged { value, .. } => Ok(value),
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

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> IterationOutcome<U> {
        match self {
            IterationOutcome::Converged { value, iterations } => IterationOutcome::Converged {
                value: f(value),
                iterations,
            },
            IterationOutcome::MaxIterationsReached {
                value,
                iterations,
                last_residual,
            } => IterationOutcome::MaxIterationsReached {
                value: f(value),
                iterations,
                last_residual,
            },
        }
    }
}

/// Tolerance and iteration cap of a fixed-point / Newton type iteration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IterationSettings {
    pub tolerance: f64,
    pub max_iterations: usize,
}

impl Default for IterationSettings {
    fn default() -> Self {
        Self {
            tolerance: 1e-6,
            max_iterations: 100,
        }
    }
}

impl IterationSettings {
    pub fn new(tolerance: f64, max_iterations: usize) -> Self {
        Self {
            tolerance,
            max_iterations,
        }
    }

    pub fn validate(&self) -> Result<(), NumError> {
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(NumError::invalid(
                "tolerance",
                format!("must be finite and positive, got {}", self.tolerance),
            ));
        }
        if self.max_iterations == 0 {
            return Err(NumError::invalid("max_iterations", "must be at least 1"));
        }
        Ok(())
    }
}
