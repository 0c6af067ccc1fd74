//! Boundary-value problem `x(x^2 + 6) y'' - 4(x^2 + 3) y' + 6x y = 0` on `[0, 4]`,
//! `y'(0) = 0`, `y(4) - y'(4) = 26`, exact solution `y = x^3 + x^2 + 2`.
//!
//! Solved by the shooting method and by finite differences (with Dirichlet data taken from
//! the exact solution); the finite-difference error is estimated by Runge-Romberg from the
//! `n` and `2n` grids.
use crate::Examples::lab_config::{BvpParams, LabOutput};
use crate::Examples::lab_error::LabError;
use crate::Utils::logger::save_table_to_csv;
use crate::Utils::plots::{Chart, Curve, plot_chart};
use crate::Utils::tables::{fmt_error, fmt_value, render_table};
use crate::numerical::FD_BVP::{FDProblem, FDSolution, solve_fd_on_grid};
use crate::numerical::Runge_Romberg::{runge_romberg_pointwise, runge_romberg_refine};
use crate::numerical::ShootingBVP::Shooting_simple::{
    RobinCondition, ShootingMethodResult, ShootingMethodSolver, ShootingProblem, ShootingSettings,
};
use crate::numerical::grid::{Grid, linspace};
use crate::numerical::linear_ode2::LinearODE2;
use crate::numerical::solver_errors::NumError;
use log::{info, warn};

/// Order of the central-difference scheme.
const FD_ORDER: i32 = 2;

pub fn exact_solution(x: f64) -> f64 {
    x.powi(3) + x.powi(2) + 2.0
}

/// `y'' + p y' + q y = 0` with `p = -4(x^2 + 3) / (x(x^2 + 6))`, `q = 6 / (x^2 + 6)`
pub fn lab_ode() -> LinearODE2 {
    LinearODE2::homogeneous(
        |x| -4.0 * (x * x + 3.0) / (x * (x * x + 6.0)),
        |x| 6.0 / (x * x + 6.0),
    )
}

/// `y(b) - y'(b) = 26`
pub fn lab_right_condition() -> RobinCondition {
    RobinCondition {
        value_coeff: 1.0,
        slope_coeff: -1.0,
        target: 26.0,
    }
}

#[derive(Debug, Clone)]
pub struct BvpReport {
    pub params: BvpParams,
    pub shooting: ShootingMethodResult,
    pub fd_coarse: FDSolution,
    pub fd_fine: FDSolution,
    /// Runge-Romberg estimate at the coarse points
    pub fd_error_estimate: Vec<f64>,
    /// Richardson-refined values at the coarse points
    pub fd_refined: Vec<f64>,
}

impl BvpReport {
    pub fn shooting_max_error(&self) -> f64 {
        self.shooting
            .x_mesh()
            .iter()
            .zip(self.shooting.y().iter())
            .map(|(x, y)| (y - exact_solution(*x)).abs())
            .fold(0.0, f64::max)
    }

    pub fn refined_max_error(&self) -> f64 {
        self.fd_coarse
            .x_mesh
            .iter()
            .zip(self.fd_refined.iter())
            .map(|(x, y)| (y - exact_solution(*x)).abs())
            .fold(0.0, f64::max)
    }
}

fn fd_grid(params: &BvpParams, n: usize) -> Result<Grid, NumError> {
    ShootingSettings { n, ..params.shooting }.grid(params.a, params.b)
}

pub fn compute_bvp_lab(params: &BvpParams) -> Result<BvpReport, NumError> {
    let settings = ShootingSettings {
        n: params.n,
        ..params.shooting
    };
    let problem = ShootingProblem {
        ode: lab_ode(),
        a: params.a,
        b: params.b,
        y_a: exact_solution(params.a),
        slope_guess: params.slope_guess,
        right: lab_right_condition(),
    };
    let mut solver = ShootingMethodSolver::new(settings);
    let shooting = solver.solve(&problem)?;
    if !shooting.outcome.is_converged() {
        warn!(
            "shooting stopped after {} iterations with residual {:e}",
            shooting.outcome.iterations(),
            shooting.residual
        );
    }

    let fd_problem = FDProblem {
        ode: lab_ode(),
        a: params.a,
        b: params.b,
        alpha: exact_solution(params.a),
        beta: exact_solution(params.b),
    };
    let fd_coarse = solve_fd_on_grid(&fd_problem, &fd_grid(params, params.n)?)?;
    let fd_fine = solve_fd_on_grid(&fd_problem, &fd_grid(params, 2 * params.n)?)?;
    let (coarse, fine) = (fd_coarse.y.as_slice(), fd_fine.y.as_slice());
    let fd_error_estimate = runge_romberg_pointwise(coarse, fine, 2, FD_ORDER)?;
    let fd_refined = runge_romberg_refine(coarse, fine, 2, FD_ORDER)?;
    info!(
        "finite differences: max error {:e} (n = {}), {:e} (n = {})",
        fd_coarse.max_error(exact_solution),
        params.n,
        fd_fine.max_error(exact_solution),
        2 * params.n
    );
    Ok(BvpReport {
        params: params.clone(),
        shooting,
        fd_coarse,
        fd_fine,
        fd_error_estimate,
        fd_refined,
    })
}

pub fn present_bvp_lab(report: &BvpReport, output: &LabOutput) -> Result<(), LabError> {
    let shooting_rows: Vec<Vec<String>> = report
        .shooting
        .x_mesh()
        .iter()
        .zip(report.shooting.y().iter())
        .enumerate()
        .map(|(i, (x, y))| {
            let exact = exact_solution(*x);
            vec![
                i.to_string(),
                fmt_value(*x),
                fmt_value(*y),
                fmt_value(exact),
                fmt_error((y - exact).abs()),
            ]
        })
        .collect();
    println!(
        "Shooting method: y'(a) = {}, residual = {:e}, iterations = {}, converged = {}",
        fmt_value(report.shooting.s),
        report.shooting.residual,
        report.shooting.outcome.iterations(),
        report.shooting.outcome.is_converged()
    );
    println!("{}", render_table(&["i", "x", "y", "exact", "|y - exact|"], &shooting_rows));

    let fd_headers = ["i", "x", "y (n)", "y (2n)", "exact", "|y - exact|", "RR estimate", "refined"];
    let fd_rows: Vec<Vec<String>> = (0..report.fd_coarse.len())
        .map(|i| {
            let x = report.fd_coarse.x_mesh[i];
            let exact = exact_solution(x);
            vec![
                i.to_string(),
                fmt_value(x),
                fmt_value(report.fd_coarse.y[i]),
                fmt_value(report.fd_fine.y[2 * i]),
                fmt_value(exact),
                fmt_error((report.fd_coarse.y[i] - exact).abs()),
                fmt_error(report.fd_error_estimate[i]),
                fmt_value(report.fd_refined[i]),
            ]
        })
        .collect();
    println!("Finite differences, n = {} and {}", report.params.n, 2 * report.params.n);
    println!("{}", render_table(&fd_headers, &fd_rows));

    let summary = vec![
        vec!["shooting".to_string(), fmt_error(report.shooting_max_error())],
        vec![
            "finite differences (n)".to_string(),
            fmt_error(report.fd_coarse.max_error(exact_solution)),
        ],
        vec![
            "finite differences (2n)".to_string(),
            fmt_error(report.fd_fine.max_error(exact_solution)),
        ],
        vec![
            "Runge-Romberg refined".to_string(),
            fmt_error(report.refined_max_error()),
        ],
    ];
    println!("{}", render_table(&["solution", "max |y - exact|"], &summary));

    let fine_x = linspace(report.params.a, report.params.b, 200);
    let exact_y: Vec<f64> = fine_x.iter().map(|x| exact_solution(*x)).collect();
    let chart = Chart {
        title: "Boundary-value problem".to_string(),
        x_desc: "x".to_string(),
        y_desc: "y".to_string(),
        size: (1200, 600),
        curves: vec![
            Curve::line("exact", &fine_x, &exact_y),
            Curve::markers("shooting", report.shooting.x_mesh().as_slice(), &report.shooting.y()),
            Curve::markers(
                "finite differences",
                report.fd_coarse.x_mesh.as_slice(),
                report.fd_coarse.y.as_slice(),
            ),
        ],
    };
    let path = output.path("bvp.png");
    plot_chart(&path, &chart).map_err(|e| LabError::render(&path, e))?;
    info!("plot saved to {}", path.display());

    if output.csv {
        save_table_to_csv(&output.path("bvp_finite_differences.csv"), &fd_headers, &fd_rows)?;
        save_table_to_csv(
            &output.path("bvp_shooting.csv"),
            &["i", "x", "y", "exact", "|y - exact|"],
            &shooting_rows,
        )?;
    }
    Ok(())
}

pub fn run_bvp_lab(params: &BvpParams, output: &LabOutput) -> Result<BvpReport, LabError> {
    let report = compute_bvp_lab(params)?;
    present_bvp_lab(&report, output)?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numerical::ShootingBVP::Shooting_simple::TerminalSlope;

    #[test]
    fn lab_with_defaults() {
        let report = compute_bvp_lab(&BvpParams::default()).unwrap();
        assert!(report.shooting.outcome.is_converged());
        assert!(report.shooting.residual.abs() < 1e-10);
        assert_eq!(report.shooting.y().len(), 11);
        assert_eq!(report.fd_coarse.len(), 11);
        assert_eq!(report.fd_fine.len(), 21);
        assert_eq!(report.fd_error_estimate.len(), 11);
        let e_coarse = report.fd_coarse.max_error(exact_solution);
        let e_fine = report.fd_fine.max_error(exact_solution);
        assert!(e_coarse / e_fine > 3.5);
        assert!(report.refined_max_error() < 0.01);
    }

    #[test]
    fn estimate_tracks_fine_grid_error() {
        let report = compute_bvp_lab(&BvpParams::default()).unwrap();
        for (i, estimate) in report.fd_error_estimate.iter().enumerate() {
            let x = report.fd_coarse.x_mesh[i];
            let true_error = (report.fd_fine.y[2 * i] - exact_solution(x)).abs();
            if true_error > 1e-6 {
                assert!((estimate - true_error).abs() / true_error < 0.1, "point {}", i);
            }
        }
    }

    #[test]
    fn integrated_terminal_slope_reaches_exact_solution() {
        let params = BvpParams {
            n: 200,
            shooting: ShootingSettings {
                terminal_slope: TerminalSlope::Integrated,
                ..Default::default()
            },
            ..Default::default()
        };
        let report = compute_bvp_lab(&params).unwrap();
        assert!(report.shooting.outcome.is_converged());
        assert!(report.shooting_max_error() < 1e-6);
    }
}
