//! Linear second-order ODE `y'' + p(x) y' + q(x) y = f(x)`.
use nalgebra::DVector;

pub struct LinearODE2 {
    pub p: Box<dyn Fn(f64) -> f64>,
    pub q: Box<dyn Fn(f64) -> f64>,
    pub f: Box<dyn Fn(f64) -> f64>,
}

impl LinearODE2 {
    pub fn new(
        p: impl Fn(f64) -> f64 + 'static,
        q: impl Fn(f64) -> f64 + 'static,
        f: impl Fn(f64) -> f64 + 'static,
    ) -> Self {
        LinearODE2 {
            p: Box::new(p),
            q: Box::new(q),
            f: Box::new(f),
        }
    }

    pub fn homogeneous(
        p: impl Fn(f64) -> f64 + 'static,
        q: impl Fn(f64) -> f64 + 'static,
    ) -> Self {
        Self::new(p, q, |_x| 0.0)
    }

    /// `y''` expressed through `x`, `y`, `y'`.
    pub fn second_derivative(&self, x: f64, y: f64, dy: f64) -> f64 {
        (self.f)(x) - (self.p)(x) * dy - (self.q)(x) * y
    }

    /// First-order form for the state `[y, y']`.
    pub fn rhs_system(&self) -> impl Fn(f64, &DVector<f64>) -> DVector<f64> + '_ {
        move |x: f64, state: &DVector<f64>| {
            DVector::from_vec(vec![state[1], self.second_derivative(x, state[0], state[1])])
        }
    }
}
