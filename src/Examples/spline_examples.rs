//! Natural cubic spline of the tabulated `1/x` data, evaluated at `x*` and compared with `1/x*`.
use crate::Examples::lab_config::{LabOutput, SplineParams};
use crate::Examples::lab_error::LabError;
use crate::Utils::logger::save_table_to_csv;
use crate::Utils::plots::{Chart, Curve, plot_chart};
use crate::Utils::tables::{fmt_error, fmt_value, render_table};
use crate::numerical::cubic_spline::CubicSpline;
use crate::numerical::grid::linspace;
use crate::numerical::solver_errors::NumError;
use log::{info, warn};

/// Node values are checked against the data with this tolerance.
const NODE_TOLERANCE: f64 = 1e-9;

pub fn reference_function(x: f64) -> f64 {
    1.0 / x
}

#[derive(Debug, Clone)]
pub struct SplineReport {
    pub params: SplineParams,
    pub spline: CubicSpline,
    pub value: f64,
    pub exact: f64,
    /// largest |S(x_i) - f_i|
    pub node_error: f64,
    /// S'' at both ends
    pub end_curvatures: (f64, f64),
    pub plot_x: Vec<f64>,
}

impl SplineReport {
    pub fn error(&self) -> f64 {
        (self.value - self.exact).abs()
    }

    pub fn passes_nodes(&self) -> bool {
        self.node_error <= NODE_TOLERANCE
    }

    pub fn natural_ends(&self) -> bool {
        let (left, right) = self.end_curvatures;
        left.abs() <= NODE_TOLERANCE && right.abs() <= NODE_TOLERANCE
    }

    fn coefficient_rows(&self) -> Vec<Vec<String>> {
        let s = &self.spline;
        (0..s.pieces())
            .map(|i| {
                vec![
                    (i + 1).to_string(),
                    format!("[{}, {}]", s.x[i], s.x[i + 1]),
                    fmt_value(s.a[i]),
                    fmt_value(s.b[i]),
                    fmt_value(s.c[i]),
                    fmt_value(s.d[i]),
                ]
            })
            .collect()
    }
}

pub fn compute_spline_lab(params: &SplineParams) -> Result<SplineReport, NumError> {
    if params.x_star <= 0.0 {
        return Err(NumError::invalid("x_star", "1/x is compared only for x > 0"));
    }
    let spline = CubicSpline::natural(&params.x, &params.y)?;
    let (first, last) = (spline.x[0], spline.x[spline.x.len() - 1]);
    if !(first..=last).contains(&params.x_star) {
        warn!("x* = {} lies outside the nodes, the end piece is extrapolated", params.x_star);
    }
    let value = spline.eval(params.x_star);
    let exact = reference_function(params.x_star);
    let node_error = params
        .x
        .iter()
        .zip(params.y.iter())
        .map(|(x, y)| (spline.eval(*x) - y).abs())
        .fold(0.0, f64::max);
    let end_curvatures = spline.end_curvatures();
    info!(
        "S({}) = {}, 1/x* = {}, error {:e}",
        params.x_star,
        value,
        exact,
        (value - exact).abs()
    );
    Ok(SplineReport {
        params: params.clone(),
        plot_x: linspace(first, last, params.plot_samples),
        spline,
        value,
        exact,
        node_error,
        end_curvatures,
    })
}

pub fn present_spline_lab(report: &SplineReport, output: &LabOutput) -> Result<(), LabError> {
    let headers = ["i", "interval", "a", "b", "c", "d"];
    let rows = report.coefficient_rows();
    println!("Natural cubic spline");
    println!("{}", render_table(&headers, &rows));
    println!(
        "S({}) = {}, 1/x* = {}, |S - 1/x| = {}",
        report.params.x_star,
        fmt_value(report.value),
        fmt_value(report.exact),
        fmt_error(report.error())
    );
    println!(
        "passes through the nodes: {}, natural ends: {}",
        report.passes_nodes(),
        report.natural_ends()
    );

    let spline_y: Vec<f64> = report.plot_x.iter().map(|x| report.spline.eval(*x)).collect();
    let exact_y: Vec<f64> = report.plot_x.iter().map(|x| reference_function(*x)).collect();
    let chart = Chart {
        title: "Natural cubic spline".to_string(),
        x_desc: "x".to_string(),
        y_desc: "y".to_string(),
        size: (1200, 600),
        curves: vec![
            Curve::line("S(x)", &report.plot_x, &spline_y),
            Curve::line("1/x", &report.plot_x, &exact_y),
            Curve::markers("nodes", &report.params.x, &report.params.y),
            Curve::markers("x*", &[report.params.x_star], &[report.value]),
        ],
    };
    let path = output.path("spline.png");
    plot_chart(&path, &chart).map_err(|e| LabError::render(&path, e))?;
    info!("plot saved to {}", path.display());

    if output.csv {
        save_table_to_csv(&output.path("spline_coefficients.csv"), &headers, &rows)?;
    }
    Ok(())
}

pub fn run_spline_lab(params: &SplineParams, output: &LabOutput) -> Result<SplineReport, LabError> {
    let report = compute_spline_lab(params)?;
    present_spline_lab(&report, output)?;
    Ok(report)
}
