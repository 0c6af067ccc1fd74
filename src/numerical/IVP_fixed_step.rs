//! # Fixed-step solvers for first-order ODE systems
//!
//! Explicit Euler, classical Runge-Kutta 4 and the Adams 4th-order predictor-corrector for
//! systems `dy/dx = F(x, y)` where `y` is a [`DVector`] state (for a 2nd-order equation the
//! state is `[y, y']`).
//!
//! Every solver returns `n + 1` points, the initial state first and unchanged. There is no
//! adaptive step control: accuracy is checked by the caller, usually with the Runge-Romberg
//! estimate from [`crate::numerical::Runge_Romberg`] at two step sizes.
//!
//! ## Usage Example
//! ```rust, ignore
//! use nalgebra::DVector;
//! use RustedNumLabs::numerical::IVP_fixed_step::{FixedStepMethod, IVPTask, solve_fixed_step};
//! // y'' = -y as [y, y']
//! let rhs = |_x: f64, y: &DVector<f64>| DVector::from_vec(vec![y[1], -y[0]]);
//! let task = IVPTask::new(0.0, DVector::from_vec(vec![1.0, 0.0]), 0.01, 100);
//! let solution = solve_fixed_step(FixedStepMethod::Adams4, &rhs, &task).unwrap();
//! let (x_mesh, y) = solution.get_result();
//! ```
use crate::Utils::logger::save_matrix_to_csv;
use crate::numerical::grid::{Grid, check_intervals, check_step};
use crate::numerical::solver_errors::NumError;
use log::{debug, info};
use nalgebra::{DMatrix, DVector};
use std::collections::VecDeque;
use std::path::Path;
use strum_macros::{Display, EnumIter, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(ascii_case_insensitive)]
pub enum FixedStepMethod {
    #[strum(to_string = "Euler")]
    Euler,
    #[strum(to_string = "RK4")]
    RK4,
    #[strum(to_string = "Adams4", serialize = "AB4")]
    Adams4,
}

impl FixedStepMethod {
    /// Global order of accuracy, used by the Runge-Romberg estimate.
    pub fn order(&self) -> i32 {
        match self {
            FixedStepMethod::Euler => 1,
            FixedStepMethod::RK4 => 4,
            FixedStepMethod::Adams4 => 4,
        }
    }
}

/// Initial point, step and number of steps of a fixed-step IVP.
#[derive(Debug, Clone)]
pub struct IVPTask {
    pub x0: f64,
    pub y0: DVector<f64>,
    pub h: f64,
    pub n: usize,
}

impl IVPTask {
    pub fn new(x0: f64, y0: DVector<f64>, h: f64, n: usize) -> Self {
        IVPTask { x0, y0, h, n }
    }

    /// Same task with the step divided by `k` and `k` times more steps (same end point).
    pub fn refined(&self, k: usize) -> Self {
        IVPTask {
            x0: self.x0,
            y0: self.y0.clone(),
            h: self.h / k as f64,
            n: self.n * k,
        }
    }

    pub fn validate(&self) -> Result<(), NumError> {
        check_step(self.h)?;
        check_intervals(self.n)?;
        if self.y0.is_empty() {
            return Err(NumError::invalid("y0", "initial state is empty"));
        }
        if self.y0.iter().any(|v| !v.is_finite()) {
            return Err(NumError::invalid("y0", "initial state must be finite"));
        }
        Ok(())
    }

    pub fn grid(&self) -> Result<Grid, NumError> {
        self.validate()?;
        Grid::uniform(self.x0, self.h, self.n)
    }
}

/// Grid and states of a fixed-step integration: one row of `y` per grid point.
#[derive(Debug, Clone, PartialEq)]
pub struct IVPSolution {
    pub x_mesh: DVector<f64>,
    pub y: DMatrix<f64>,
}

impl IVPSolution {
    fn from_states(x: &[f64], states: Vec<DVector<f64>>) -> Self {
        let rows = states.len();
        let cols = states[0].len();
        let mut flat_vec: Vec<f64> = Vec::with_capacity(rows * cols);
        for vector in states.iter() {
            flat_vec.extend(vector.iter());
        }
        let y: DMatrix<f64> = DMatrix::from_vec(cols, rows, flat_vec).transpose();
        IVPSolution {
            x_mesh: DVector::from_column_slice(&x[..rows]),
            y,
        }
    }

    pub fn len(&self) -> usize {
        self.x_mesh.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x_mesh.is_empty()
    }

    pub fn state(&self, i: usize) -> DVector<f64> {
        self.y.row(i).transpose()
    }

    pub fn last_state(&self) -> DVector<f64> {
        self.state(self.len() - 1)
    }

    /// All values of state component `j`, e.g. `component(0)` is `y` for a `[y, y']` state.
    pub fn component(&self, j: usize) -> Vec<f64> {
        self.y.column(j).iter().copied().collect()
    }

    pub fn get_result(&self) -> (DVector<f64>, DMatrix<f64>) {
        (self.x_mesh.clone(), self.y.clone())
    }

    pub fn save_to_csv(
        &self,
        filename: &Path,
        arg: &str,
        values: &[String],
    ) -> Result<(), Box<dyn std::error::Error>> {
        save_matrix_to_csv(&self.y, values, filename, &self.x_mesh, arg)?;
        Ok(())
    }
}

fn eval_rhs<F>(f: &F, x: f64, y: &DVector<f64>) -> Result<DVector<f64>, NumError>
where
    F: Fn(f64, &DVector<f64>) -> DVector<f64>,
{
    let dydx = f(x, y);
    if dydx.len() != y.len() {
        return Err(NumError::invalid(
            "rhs",
            format!(
                "right-hand side returned {} components for a state of {}",
                dydx.len(),
                y.len()
            ),
        ));
    }
    Ok(dydx)
}

pub fn euler_step<F>(f: &F, x: f64, y: &DVector<f64>, h: f64) -> Result<DVector<f64>, NumError>
where
    F: Fn(f64, &DVector<f64>) -> DVector<f64>,
{
    let dydx = eval_rhs(f, x, y)?;
    Ok(y + h * dydx)
}

pub fn rk4_step<F>(f: &F, x: f64, y: &DVector<f64>, h: f64) -> Result<DVector<f64>, NumError>
where
    F: Fn(f64, &DVector<f64>) -> DVector<f64>,
{
    let k1 = eval_rhs(f, x, y)?;
    let k2 = eval_rhs(f, x + h / 2.0, &(y + (h / 2.0) * &k1))?;
    let k3 = eval_rhs(f, x + h / 2.0, &(y + (h / 2.0) * &k2))?;
    let k4 = eval_rhs(f, x + h, &(y + h * &k3))?;
    Ok(y + (h / 6.0) * (k1 + 2.0 * k2 + 2.0 * k3 + k4))
}

fn march_on_grid<F, S>(f: &F, grid: &Grid, y0: &DVector<f64>, step: S) -> Result<IVPSolution, NumError>
where
    F: Fn(f64, &DVector<f64>) -> DVector<f64>,
    S: Fn(&F, f64, &DVector<f64>, f64) -> Result<DVector<f64>, NumError>,
{
    if y0.is_empty() {
        return Err(NumError::invalid("y0", "initial state is empty"));
    }
    let x = grid.points();
    let mut states: Vec<DVector<f64>> = Vec::with_capacity(x.len());
    states.push(y0.clone());
    for i in 0..grid.intervals() {
        let next = step(f, x[i], &states[i], grid.step(i))?;
        states.push(next);
    }
    Ok(IVPSolution::from_states(x, states))
}

/// Explicit Euler on an arbitrary increasing grid.
pub fn euler_on_grid<F>(f: &F, grid: &Grid, y0: &DVector<f64>) -> Result<IVPSolution, NumError>
where
    F: Fn(f64, &DVector<f64>) -> DVector<f64>,
{
    march_on_grid(f, grid, y0, euler_step::<F>)
}

/// Classical RK4 on an arbitrary increasing grid, each step uses its own width.
pub fn rk4_on_grid<F>(f: &F, grid: &Grid, y0: &DVector<f64>) -> Result<IVPSolution, NumError>
where
    F: Fn(f64, &DVector<f64>) -> DVector<f64>,
{
    march_on_grid(f, grid, y0, rk4_step::<F>)
}

pub fn euler_system<F>(f: &F, task: &IVPTask) -> Result<IVPSolution, NumError>
where
    F: Fn(f64, &DVector<f64>) -> DVector<f64>,
{
    let grid = task.grid()?;
    debug!("Euler: x0 = {}, h = {}, n = {}", task.x0, task.h, task.n);
    euler_on_grid(f, &grid, &task.y0)
}

pub fn rk4_system<F>(f: &F, task: &IVPTask) -> Result<IVPSolution, NumError>
where
    F: Fn(f64, &DVector<f64>) -> DVector<f64>,
{
    let grid = task.grid()?;
    debug!("RK4: x0 = {}, h = {}, n = {}", task.x0, task.h, task.n);
    rk4_on_grid(f, &grid, &task.y0)
}

/// Adams 4th order predictor-corrector.
///
/// The first 3 steps are taken with RK4 to fill a 4-entry derivative history; each further
/// step is an Adams-Bashforth predictor `(55, -59, 37, -9)/24` followed by one
/// Adams-Moulton correction `(9, 19, -5, 1)/24`. With `n < 4` the whole range is
/// integrated by RK4 and the result is identical to [`rk4_system`].
pub fn adams4_system<F>(f: &F, task: &IVPTask) -> Result<IVPSolution, NumError>
where
    F: Fn(f64, &DVector<f64>) -> DVector<f64>,
{
    let grid = task.grid()?;
    if task.n < 4 {
        debug!("Adams4: n = {} < 4, falling back to RK4", task.n);
        return rk4_on_grid(f, &grid, &task.y0);
    }
    debug!("Adams4: x0 = {}, h = {}, n = {}", task.x0, task.h, task.n);
    let h = task.h;
    let x = grid.points();
    let mut states: Vec<DVector<f64>> = Vec::with_capacity(x.len());
    states.push(task.y0.clone());
    for i in 0..3 {
        let next = rk4_step(f, x[i], &states[i], h)?;
        states.push(next);
    }
    // f_history[3] is the newest derivative
    let mut f_history: VecDeque<DVector<f64>> = VecDeque::with_capacity(4);
    for i in 0..4 {
        f_history.push_back(eval_rhs(f, x[i], &states[i])?);
    }

    for i in 3..task.n {
        let f_n = &f_history[3];
        let f_n1 = &f_history[2];
        let f_n2 = &f_history[1];
        let f_n3 = &f_history[0];

        let predictor = &states[i]
            + (h / 24.0) * (55.0 * f_n - 59.0 * f_n1 + 37.0 * f_n2 - 9.0 * f_n3);
        let f_pred = eval_rhs(f, x[i + 1], &predictor)?;
        let corrector =
            &states[i] + (h / 24.0) * (9.0 * &f_pred + 19.0 * f_n - 5.0 * f_n1 + f_n2);

        let f_current = eval_rhs(f, x[i + 1], &corrector)?;
        f_history.pop_front();
        f_history.push_back(f_current);
        states.push(corrector);
    }
    Ok(IVPSolution::from_states(x, states))
}

pub fn solve_fixed_step<F>(
    method: FixedStepMethod,
    f: &F,
    task: &IVPTask,
) -> Result<IVPSolution, NumError>
where
    F: Fn(f64, &DVector<f64>) -> DVector<f64>,
{
    let solution = match method {
        FixedStepMethod::Euler => euler_system(f, task)?,
        FixedStepMethod::RK4 => rk4_system(f, task)?,
        FixedStepMethod::Adams4 => adams4_system(f, task)?,
    };
    info!(
        "{} finished: {} points, state at x = {}: {}",
        method,
        solution.len(),
        solution.x_mesh[solution.len() - 1],
        solution.last_state().transpose()
    );
    Ok(solution)
}

////////////////////////////////////////////////////////////////////////////////////////
//          TESTS
///////////////////////////////////////////////////////////////////////////////////////
#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    fn growth(_x: f64, y: &DVector<f64>) -> DVector<f64> {
        y.clone()
    }

    fn oscillator(_x: f64, y: &DVector<f64>) -> DVector<f64> {
        DVector::from_vec(vec![y[1], -y[0]])
    }

    fn growth_task(h: f64, n: usize) -> IVPTask {
        IVPTask::new(0.0, DVector::from_vec(vec![1.0]), h, n)
    }

    #[test]
    fn rk4_exponential_growth_matches_e() {
        let solution = rk4_system(&growth, &growth_task(0.1, 10)).unwrap();
        assert_eq!(solution.len(), 11);
        let final_y = solution.y[(10, 0)];
        // O(h^4) global error, about 2e-6 here
        assert!((final_y - 1.0_f64.exp()).abs() < 1e-5);
        assert_relative_eq!(solution.x_mesh[10], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn initial_state_is_first_row_unchanged() {
        let y0 = DVector::from_vec(vec![1.0, 0.0]);
        let task = IVPTask::new(0.0, y0.clone(), 0.1, 5);
        for method in FixedStepMethod::iter() {
            let solution = solve_fixed_step(method, &oscillator, &task).unwrap();
            assert_eq!(solution.state(0), y0);
            assert_eq!(solution.len(), 6);
        }
    }

    #[test]
    fn adams4_beats_euler_on_growth() {
        let task = growth_task(0.1, 10);
        let exact = 1.0_f64.exp();
        let euler = euler_system(&growth, &task).unwrap();
        let adams = adams4_system(&growth, &task).unwrap();
        let euler_err = (euler.y[(10, 0)] - exact).abs();
        let adams_err = (adams.y[(10, 0)] - exact).abs();
        assert!(adams_err < euler_err);
        assert!(adams_err < 1e-4);
    }

    #[test]
    fn adams4_with_few_steps_is_rk4() {
        for n in 1..4 {
            let task = growth_task(0.1, n);
            let adams = adams4_system(&growth, &task).unwrap();
            let rk4 = rk4_system(&growth, &task).unwrap();
            assert_eq!(adams, rk4);
        }
    }

    #[test]
    fn adams4_bootstrap_is_rk4() {
        let task = IVPTask::new(0.0, DVector::from_vec(vec![1.0, 0.0]), 0.05, 20);
        let adams = adams4_system(&oscillator, &task).unwrap();
        let rk4 = rk4_system(&oscillator, &task).unwrap();
        for i in 0..4 {
            assert_eq!(adams.state(i), rk4.state(i));
        }
        // the multistep part differs from RK4 but stays accurate
        assert_ne!(adams.state(10), rk4.state(10));
        assert_relative_eq!(adams.y[(20, 0)], 1.0_f64.cos(), epsilon = 1e-5);
        assert_relative_eq!(adams.y[(20, 1)], -1.0_f64.sin(), epsilon = 1e-5);
    }

    #[test]
    fn euler_is_first_order() {
        let exact = 1.0_f64.exp();
        let coarse = euler_system(&growth, &growth_task(0.01, 100)).unwrap();
        let fine = euler_system(&growth, &growth_task(0.005, 200)).unwrap();
        let ratio = (coarse.y[(100, 0)] - exact).abs() / (fine.y[(200, 0)] - exact).abs();
        assert!(ratio > 1.9 && ratio < 2.1, "ratio = {}", ratio);
    }

    #[test]
    fn rk4_harmonic_oscillator_quarter_period() {
        let n = 157;
        let h = std::f64::consts::FRAC_PI_2 / n as f64;
        let task = IVPTask::new(0.0, DVector::from_vec(vec![1.0, 0.0]), h, n);
        let solution = rk4_system(&oscillator, &task).unwrap();
        let last = solution.last_state();
        assert_relative_eq!(last[0], 0.0, epsilon = 1e-8);
        assert_relative_eq!(last[1], -1.0, epsilon = 1e-8);
        // x'' = -x conserves x^2 + x'^2
        for i in 0..solution.len() {
            let s = solution.state(i);
            assert_relative_eq!(s[0] * s[0] + s[1] * s[1], 1.0, epsilon = 1e-8);
        }
    }

    #[test]
    fn rk4_on_nonuniform_grid() {
        let grid = Grid::from_points(vec![0.0, 0.05, 0.2, 0.4, 0.45, 0.5]).unwrap();
        let solution = rk4_on_grid(&growth, &grid, &DVector::from_vec(vec![1.0])).unwrap();
        for (x, y) in solution.x_mesh.iter().zip(solution.component(0)) {
            assert_relative_eq!(y, x.exp(), epsilon = 1e-5);
        }
    }

    #[test]
    fn invalid_parameters_are_reported() {
        for (h, n) in [(0.0, 10), (-0.1, 10), (f64::INFINITY, 10), (0.1, 0)] {
            for method in FixedStepMethod::iter() {
                let result = solve_fixed_step(method, &growth, &growth_task(h, n));
                assert!(
                    matches!(result, Err(NumError::InvalidParameter { .. })),
                    "{} accepted h = {}, n = {}",
                    method,
                    h,
                    n
                );
            }
        }
        let empty = IVPTask::new(0.0, DVector::zeros(0), 0.1, 10);
        assert!(rk4_system(&growth, &empty).is_err());
    }

    #[test]
    fn rhs_length_mismatch_is_reported() {
        let broken = |_x: f64, _y: &DVector<f64>| DVector::from_vec(vec![1.0]);
        let task = IVPTask::new(0.0, DVector::from_vec(vec![1.0, 0.0]), 0.1, 10);
        for method in FixedStepMethod::iter() {
            assert!(matches!(
                solve_fixed_step(method, &broken, &task),
                Err(NumError::InvalidParameter { name: "rhs", .. })
            ));
        }
    }

    #[test]
    fn method_names_parse_and_print() {
        assert_eq!(FixedStepMethod::from_str("rk4").unwrap(), FixedStepMethod::RK4);
        assert_eq!(FixedStepMethod::from_str("AB4").unwrap(), FixedStepMethod::Adams4);
        assert_eq!(FixedStepMethod::from_str("euler").unwrap(), FixedStepMethod::Euler);
        assert!(FixedStepMethod::from_str("BDF").is_err());
        assert_eq!(FixedStepMethod::Adams4.to_string(), "Adams4");
        assert_eq!(FixedStepMethod::Euler.order(), 1);
        assert_eq!(FixedStepMethod::RK4.order(), 4);
    }

    #[test]
    fn refined_task_ends_at_same_point() {
        let task = growth_task(0.1, 10);
        let fine = task.refined(2);
        assert_eq!(fine.n, 20);
        assert_relative_eq!(fine.h, 0.05);
        let solution = rk4_system(&growth, &fine).unwrap();
        assert_relative_eq!(solution.x_mesh[20], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn solution_saves_to_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("oscillator.csv");
        let task = IVPTask::new(0.0, DVector::from_vec(vec![1.0, 0.0]), 0.1, 4);
        let solution = rk4_system(&oscillator, &task).unwrap();
        solution
            .save_to_csv(&path, "x", &["y".to_string(), "dy".to_string()])
            .unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next().unwrap(), "x,y,dy");
        assert_eq!(lines.count(), 5);
    }
}
