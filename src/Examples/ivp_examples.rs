//! Cauchy problem `x^2 y'' + x y' - y - 3x^2 = 0`, `y(1) = 3`, `y'(1) = 2` on `[1, 2]`,
//! exact solution `y = x^2 + x + 1/x`, solved by every fixed-step method at `h` and `h/2`.
use crate::Examples::lab_config::{IvpParams, LabOutput};
use crate::Examples::lab_error::LabError;
use crate::Utils::logger::{save_matrix_to_csv, save_table_to_csv};
use crate::Utils::plots::{Chart, Curve, plot_chart};
use crate::Utils::tables::{fmt_error, fmt_value, render_records, render_table};
use crate::numerical::IVP_fixed_step::{FixedStepMethod, IVPSolution, IVPTask, solve_fixed_step};
use crate::numerical::Runge_Romberg::runge_romberg_error;
use crate::numerical::grid::linspace;
use crate::numerical::solver_errors::NumError;
use log::info;
use nalgebra::DVector;
use tabled::Tabled;

pub fn exact_solution(x: f64) -> f64 {
    x * x + x + 1.0 / x
}

/// `[y, y']' = [y', (3x^2 + y - x y') / x^2]`
pub fn lab_rhs(x: f64, state: &DVector<f64>) -> DVector<f64> {
    let (y, dy) = (state[0], state[1]);
    DVector::from_vec(vec![dy, (3.0 * x * x + y - x * dy) / (x * x)])
}

#[derive(Debug, Clone)]
pub struct MethodRun {
    pub method: FixedStepMethod,
    pub solution: IVPSolution,
    pub refined: IVPSolution,
    /// max |y - exact| over the coarse grid
    pub max_error: f64,
    /// Runge-Romberg estimate of the refined terminal value
    pub rr_estimate: f64,
    /// true error of the refined terminal value
    pub refined_error: f64,
}

#[derive(Debug, Clone)]
pub struct IvpReport {
    pub params: IvpParams,
    pub runs: Vec<MethodRun>,
}

#[derive(Tabled)]
struct RungeRombergRow {
    method: String,
    #[tabled(rename = "y_n(h)")]
    coarse: String,
    #[tabled(rename = "y_2n(h/2)")]
    fine: String,
    exact: String,
    #[tabled(rename = "RR estimate")]
    estimate: String,
    #[tabled(rename = "true error (h/2)")]
    true_error: String,
}

pub fn compute_ivp_lab(params: &IvpParams) -> Result<IvpReport, NumError> {
    if params.methods.is_empty() {
        return Err(NumError::invalid("methods", "no method selected"));
    }
    let task = IVPTask::new(
        params.x0,
        DVector::from_vec(vec![params.y0, params.dy0]),
        params.h,
        params.n,
    );
    // h and h/2 end at the same point, so the terminal values are comparable
    let refined_task = task.refined(2);
    let mut runs = Vec::with_capacity(params.methods.len());
    for method in &params.methods {
        let solution = solve_fixed_step(*method, &lab_rhs, &task)?;
        let refined = solve_fixed_step(*method, &lab_rhs, &refined_task)?;
        let max_error = solution
            .x_mesh
            .iter()
            .zip(solution.y.column(0).iter())
            .map(|(x, y)| (y - exact_solution(*x)).abs())
            .fold(0.0, f64::max);
        let coarse_end = solution.last_state()[0];
        let fine_end = refined.last_state()[0];
        let x_end = refined.x_mesh[refined.len() - 1];
        let rr_estimate = runge_romberg_error(coarse_end, fine_end, 2, method.order())?;
        let refined_error = (fine_end - exact_solution(x_end)).abs();
        info!(
            "{}: max error {:e}, Runge-Romberg {:e}, true {:e}",
            method, max_error, rr_estimate, refined_error
        );
        runs.push(MethodRun {
            method: *method,
            solution,
            refined,
            max_error,
            rr_estimate,
            refined_error,
        });
    }
    Ok(IvpReport {
        params: params.clone(),
        runs,
    })
}

/// One row per (point, method), grouped by point so the methods can be compared at each `x_i`.
fn solution_rows(report: &IvpReport) -> Vec<Vec<String>> {
    let points = report
        .runs
        .iter()
        .map(|run| run.solution.len())
        .min()
        .unwrap_or(0);
    (0..points)
        .flat_map(|i| {
            report.runs.iter().map(move |run| {
                let x = run.solution.x_mesh[i];
                let y = run.solution.y[(i, 0)];
                let exact = exact_solution(x);
                vec![
                    i.to_string(),
                    run.method.to_string(),
                    fmt_value(x),
                    fmt_value(y),
                    fmt_value(exact),
                    fmt_error((y - exact).abs()),
                ]
            })
        })
        .collect()
}

pub fn present_ivp_lab(report: &IvpReport, output: &LabOutput) -> Result<(), LabError> {
    let headers = ["i", "method", "x", "y", "exact", "|y - exact|"];
    let rows = solution_rows(report);
    println!("x^2 y'' + x y' - y - 3x^2 = 0, h = {}", report.params.h);
    println!("{}", render_table(&headers, &rows));

    let rr_rows: Vec<RungeRombergRow> = report
        .runs
        .iter()
        .map(|run| {
            let x_end = run.refined.x_mesh[run.refined.len() - 1];
            RungeRombergRow {
                method: format!("{} (p = {})", run.method, run.method.order()),
                coarse: fmt_value(run.solution.last_state()[0]),
                fine: fmt_value(run.refined.last_state()[0]),
                exact: fmt_value(exact_solution(x_end)),
                estimate: fmt_error(run.rr_estimate),
                true_error: fmt_error(run.refined_error),
            }
        })
        .collect();
    println!("Runge-Romberg estimate of the terminal value");
    println!("{}", render_records(&rr_rows));

    let x0 = report.params.x0;
    let x_end = x0 + report.params.h * report.params.n as f64;
    let fine_x = linspace(x0, x_end, 200);
    let exact_y: Vec<f64> = fine_x.iter().map(|x| exact_solution(*x)).collect();
    let mut curves = vec![Curve::line("exact", &fine_x, &exact_y)];
    for run in &report.runs {
        curves.push(Curve::markers(
            run.method.to_string(),
            run.solution.x_mesh.as_slice(),
            &run.solution.component(0),
        ));
    }
    let chart = Chart {
        title: "Cauchy problem: numerical vs exact".to_string(),
        x_desc: "x".to_string(),
        y_desc: "y".to_string(),
        size: (1200, 600),
        curves,
    };
    let path = output.path("ivp.png");
    plot_chart(&path, &chart).map_err(|e| LabError::render(&path, e))?;
    info!("plot saved to {}", path.display());

    if output.csv {
        save_table_to_csv(&output.path("ivp_solutions.csv"), &headers, &rows)?;
        for run in &report.runs {
            let name = format!("ivp_{}.csv", run.method.to_string().to_lowercase());
            save_matrix_to_csv(
                &run.solution.y,
                &["y".to_string(), "dy".to_string()],
                &output.path(&name),
                &run.solution.x_mesh,
                "x",
            )?;
        }
    }
    Ok(())
}

pub fn run_ivp_lab(params: &IvpParams, output: &LabOutput) -> Result<IvpReport, LabError> {
    let report = compute_ivp_lab(params)?;
    present_ivp_lab(&report, output)?;
    Ok(report)
}
