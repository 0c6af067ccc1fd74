//! System `a*x1^2 - x1 + x2^2 - 1 = 0`, `x2 - tan(x1) = 0`: zero contours for the initial guess,
//! then Newton's method and simple iteration from it.
use crate::Examples::lab_config::{LabOutput, SystemParams};
use crate::Examples::lab_error::LabError;
use crate::Utils::logger::save_table_to_csv;
use crate::Utils::plots::{Chart, Curve, plot_chart};
use crate::Utils::tables::{fmt_error, fmt_value, render_table};
use crate::numerical::Nonlinear_systems::{
    Segment, SystemReport, newton_2d, simple_iteration_2d, zero_contour,
};
use crate::numerical::grid::linspace;
use crate::numerical::solver_errors::NumError;
use log::{info, warn};
use nalgebra::{Matrix2, Vector2};
use std::f64::consts::FRAC_PI_2;

/// Closest approach of `x1` to the tan asymptote accepted by simple iteration.
pub const ASYMPTOTE_MARGIN: f64 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabSystem {
    pub a: f64,
    pub relaxation: f64,
}

impl LabSystem {
    pub fn f1(&self, x1: f64, x2: f64) -> f64 {
        self.a * x1 * x1 - x1 + x2 * x2 - 1.0
    }

    pub fn f2(&self, x1: f64, x2: f64) -> f64 {
        x2 - x1.tan()
    }

    pub fn residual(&self, x: &Vector2<f64>) -> Vector2<f64> {
        Vector2::new(self.f1(x[0], x[1]), self.f2(x[0], x[1]))
    }

    pub fn jacobian(&self, x: &Vector2<f64>) -> Matrix2<f64> {
        Matrix2::new(
            2.0 * self.a * x[0] - 1.0,
            2.0 * x[1],
            -1.0 / x[0].cos().powi(2),
            1.0,
        )
    }

    /// `x2' = tan(x1)`, `x1' = x1 - relaxation * f1(x1, x2')`
    pub fn phi(&self, x: &Vector2<f64>) -> Vector2<f64> {
        let x2 = x[0].tan();
        let x1 = x[0] - self.relaxation * self.f1(x[0], x2);
        Vector2::new(x1, x2)
    }

    pub fn admissible(x: &Vector2<f64>) -> bool {
        x[0].abs() <= FRAC_PI_2 - ASYMPTOTE_MARGIN
    }
}

#[derive(Debug, Clone)]
pub struct SystemLabReport {
    pub contour_f1: Vec<Segment>,
    pub contour_f2: Vec<Segment>,
    pub x1_range: (f64, f64),
    pub x2_range: (f64, f64),
    pub start: Vector2<f64>,
    pub newton: Result<SystemReport, NumError>,
    pub simple: Result<SystemReport, NumError>,
}

/// Contours are always produced; each refinement method keeps its own error so that a
/// diverging simple iteration does not hide the Newton result.
pub fn compute_system_lab(params: &SystemParams) -> Result<SystemLabReport, NumError> {
    if params.grid < 2 {
        return Err(NumError::invalid("grid", "at least 2 samples per axis are required"));
    }
    let system = LabSystem {
        a: params.a,
        relaxation: params.relaxation,
    };
    let x1s = linspace(params.x1_range.0, params.x1_range.1, params.grid);
    let x2s = linspace(params.x2_range.0, params.x2_range.1, params.grid);
    let contour_f1 = zero_contour(|x1, x2| system.f1(x1, x2), &x1s, &x2s);
    let contour_f2 = zero_contour(|x1, x2| system.f2(x1, x2), &x1s, &x2s);
    info!(
        "zero contours: {} segments for f1, {} for f2",
        contour_f1.len(),
        contour_f2.len()
    );

    params.settings.validate()?;
    let newton = newton_2d(
        |x| system.residual(x),
        |x| system.jacobian(x),
        params.start,
        &params.settings,
    );
    let simple = simple_iteration_2d(
        |x| system.phi(x),
        LabSystem::admissible,
        params.start,
        &params.settings,
    );
    for (name, result) in [("Newton", &newton), ("simple iteration", &simple)] {
        if let Err(e) = result {
            warn!("{} failed: {}", name, e);
        }
    }
    Ok(SystemLabReport {
        contour_f1,
        contour_f2,
        x1_range: params.x1_range,
        x2_range: params.x2_range,
        start: params.start,
        newton,
        simple,
    })
}

fn method_rows(name: &str, result: &Result<SystemReport, NumError>) -> Vec<Vec<String>> {
    match result {
        Ok(report) => report
            .history
            .iter()
            .map(|s| {
                vec![
                    name.to_string(),
                    s.iteration.to_string(),
                    fmt_value(s.x[0]),
                    fmt_value(s.x[1]),
                    fmt_error(s.step),
                ]
            })
            .collect(),
        Err(e) => vec![vec![
            name.to_string(),
            "-".to_string(),
            "-".to_string(),
            "-".to_string(),
            e.to_string(),
        ]],
    }
}

pub fn present_system_lab(report: &SystemLabReport, output: &LabOutput) -> Result<(), LabError> {
    let headers = ["method", "iteration", "x1", "x2", "step"];
    let mut rows = method_rows("Newton", &report.newton);
    rows.extend(method_rows("simple iteration", &report.simple));
    println!(
        "2x1^2 - x1 + x2^2 - 1 = 0, x2 - tan(x1) = 0 from ({}, {})",
        report.start[0], report.start[1]
    );
    println!("{}", render_table(&headers, &rows));

    let (x1_lo, x1_hi) = report.x1_range;
    let (x2_lo, x2_hi) = report.x2_range;
    let axes = [((x1_lo, 0.0), (x1_hi, 0.0)), ((0.0, x2_lo), (0.0, x2_hi))];
    let mut curves = vec![
        Curve::segments("axes", &axes),
        Curve::segments("f1 = 0", &report.contour_f1),
        Curve::segments("f2 = 0", &report.contour_f2),
    ];
    if let Ok(newton) = &report.newton {
        let root = newton.root();
        curves.push(Curve::markers("Newton root", &[root[0]], &[root[1]]));
    }
    let chart = Chart {
        title: "Zero contours".to_string(),
        x_desc: "x1".to_string(),
        y_desc: "x2".to_string(),
        size: (1000, 800),
        curves,
    };
    let path = output.path("nonlinear_system.png");
    plot_chart(&path, &chart).map_err(|e| LabError::render(&path, e))?;
    info!("plot saved to {}", path.display());

    if output.csv {
        save_table_to_csv(&output.path("nonlinear_system_iterations.csv"), &headers, &rows)?;
    }
    Ok(())
}

pub fn run_system_lab(params: &SystemParams, output: &LabOutput) -> Result<SystemLabReport, LabError> {
    let report = compute_system_lab(params)?;
    present_system_lab(&report, output)?;
    Ok(report)
}
