//! Scalar equation `ln(x + 2) = x^4 - 0.5`: graphical localisation of the root,
//! then refinement by simple iteration and Newton's method.
use crate::Examples::lab_config::{EquationParams, LabOutput};
use crate::Examples::lab_error::LabError;
use crate::Utils::logger::save_table_to_csv;
use crate::Utils::plots::{Chart, Curve, plot_chart};
use crate::Utils::tables::{fmt_error, fmt_value, render_table};
use crate::numerical::Nonlinear_equations::{
    RootReport, check_bracket, newton_scalar, sign_change_intervals, simple_iteration,
};
use crate::numerical::grid::linspace;
use crate::numerical::solver_errors::NumError;
use log::info;

pub fn f1(x: f64) -> f64 {
    (x + 2.0).ln()
}

pub fn f2(x: f64) -> f64 {
    x.powi(4) - 0.5
}

/// `f1 - f2`
pub fn residual(x: f64) -> f64 {
    f1(x) - f2(x)
}

pub fn residual_derivative(x: f64) -> f64 {
    1.0 / (x + 2.0) - 4.0 * x.powi(3)
}

/// `x = (ln(x + 2) + 0.5)^(1/4)`, the positive root branch
pub fn phi(x: f64) -> f64 {
    (f1(x) + 0.5).powf(0.25)
}

#[derive(Debug, Clone)]
pub struct EquationReport {
    pub xs: Vec<f64>,
    pub f1: Vec<f64>,
    pub f2: Vec<f64>,
    pub intervals: Vec<(f64, f64)>,
    pub bracket: (f64, f64),
    pub simple: RootReport,
    pub newton: RootReport,
}

pub fn compute_equation_lab(params: &EquationParams) -> Result<EquationReport, NumError> {
    if params.samples < 2 {
        return Err(NumError::invalid("samples", "at least 2 samples are required"));
    }
    let (start, end) = params.sample_range;
    let xs = linspace(start, end, params.samples);
    let intervals = sign_change_intervals(residual, &xs);
    info!("sign changes of f1 - f2 on [{}, {}]: {:?}", start, end, intervals);

    let (a, b) = params.bracket;
    check_bracket(residual, a, b)?;
    let x0 = (a + b) / 2.0;
    let simple = simple_iteration(phi, x0, &params.settings)?;
    let newton = newton_scalar(residual, residual_derivative, x0, &params.settings)?;
    Ok(EquationReport {
        f1: xs.iter().map(|x| f1(*x)).collect(),
        f2: xs.iter().map(|x| f2(*x)).collect(),
        xs,
        intervals,
        bracket: (a, b),
        simple,
        newton,
    })
}

fn history_rows(report: &RootReport, method: &str) -> Vec<Vec<String>> {
    report
        .history
        .iter()
        .map(|step| {
            vec![
                method.to_string(),
                step.iteration.to_string(),
                fmt_value(step.x),
                fmt_error(step.step),
            ]
        })
        .collect()
}

pub fn present_equation_lab(report: &EquationReport, output: &LabOutput) -> Result<(), LabError> {
    let interval_rows: Vec<Vec<String>> = report
        .intervals
        .iter()
        .map(|(l, r)| vec![fmt_value(*l), fmt_value(*r)])
        .collect();
    println!("Sign changes of ln(x+2) - (x^4 - 0.5)");
    println!("{}", render_table(&["left", "right"], &interval_rows));

    let mut rows = history_rows(&report.simple, "simple iteration");
    rows.extend(history_rows(&report.newton, "Newton"));
    let headers = ["method", "iteration", "x", "|x_new - x|"];
    println!("Refinement on [{}, {}]", report.bracket.0, report.bracket.1);
    println!("{}", render_table(&headers, &rows));

    let summary: Vec<Vec<String>> = [("simple iteration", &report.simple), ("Newton", &report.newton)]
        .iter()
        .map(|(name, r)| {
            vec![
                name.to_string(),
                fmt_value(r.root()),
                r.outcome.iterations().to_string(),
                r.outcome.is_converged().to_string(),
            ]
        })
        .collect();
    println!("{}", render_table(&["method", "root", "iterations", "converged"], &summary));

    let y_all = report.f1.iter().chain(report.f2.iter()).copied();
    let (y_lo, y_hi) = y_all.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), y| (lo.min(y), hi.max(y)));
    let mut curves = vec![
        Curve::line("ln(x+2)", &report.xs, &report.f1),
        Curve::line("x^4 - 0.5", &report.xs, &report.f2),
    ];
    for (l, r) in &report.intervals {
        curves.push(Curve::vertical(format!("x = {:.4}", l), *l, y_lo, y_hi));
        curves.push(Curve::vertical(format!("x = {:.4}", r), *r, y_lo, y_hi));
    }
    let chart = Chart {
        title: "ln(x+2) and x^4 - 0.5".to_string(),
        x_desc: "x".to_string(),
        y_desc: "y".to_string(),
        size: (1200, 600),
        curves,
    };
    let path = output.path("nonlinear_equation.png");
    plot_chart(&path, &chart).map_err(|e| LabError::render(&path, e))?;
    info!("plot saved to {}", path.display());

    if output.csv {
        save_table_to_csv(&output.path("nonlinear_equation_iterations.csv"), &headers, &rows)?;
    }
    Ok(())
}

pub fn run_equation_lab(params: &EquationParams, output: &LabOutput) -> Result<EquationReport, LabError> {
    let report = compute_equation_lab(params)?;
    present_equation_lab(&report, output)?;
    Ok(report)
}
