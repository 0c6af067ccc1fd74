//! Least-squares polynomials of the tabulated data.
use crate::Examples::lab_config::{ApproximationParams, LabOutput};
use crate::Examples::lab_error::LabError;
use crate::Utils::logger::save_table_to_csv;
use crate::Utils::plots::{Chart, Curve, plot_chart};
use crate::Utils::tables::{fmt_value, render_records, render_table};
use crate::numerical::grid::linspace;
use crate::numerical::least_squares::{PolynomialFit, polynomial_fit};
use crate::numerical::solver_errors::NumError;
use log::info;
use tabled::Tabled;

#[derive(Debug, Clone)]
pub struct ApproximationReport {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub fits: Vec<PolynomialFit>,
    pub plot_x: Vec<f64>,
}

#[derive(Tabled)]
struct FitRow {
    degree: usize,
    polynomial: String,
    #[tabled(rename = "sum of squared errors")]
    sse: String,
}

pub fn compute_approximation_lab(params: &ApproximationParams) -> Result<ApproximationReport, NumError> {
    if params.degrees.is_empty() {
        return Err(NumError::invalid("degrees", "no polynomial degree requested"));
    }
    let fits = params
        .degrees
        .iter()
        .map(|m| polynomial_fit(&params.x, &params.y, *m))
        .collect::<Result<Vec<_>, _>>()?;
    for fit in &fits {
        info!("P{}(x) = {}", fit.degree(), fit.to_formula());
    }
    Ok(ApproximationReport {
        x: params.x.clone(),
        y: params.y.clone(),
        fits,
        plot_x: linspace(params.plot_range.0, params.plot_range.1, params.plot_samples),
    })
}

fn residual_rows(report: &ApproximationReport) -> Vec<Vec<String>> {
    report
        .x
        .iter()
        .zip(report.y.iter())
        .map(|(x, y)| {
            let mut row = vec![fmt_value(*x), fmt_value(*y)];
            for fit in &report.fits {
                let p = fit.eval(*x);
                row.push(fmt_value(p));
                row.push(fmt_value(p - y));
            }
            row
        })
        .collect()
}

pub fn present_approximation_lab(report: &ApproximationReport, output: &LabOutput) -> Result<(), LabError> {
    let fit_rows: Vec<FitRow> = report
        .fits
        .iter()
        .map(|fit| FitRow {
            degree: fit.degree(),
            polynomial: fit.to_formula(),
            sse: fmt_value(fit.sse),
        })
        .collect();
    println!("Least-squares polynomials");
    println!("{}", render_records(&fit_rows));

    let mut headers: Vec<String> = vec!["x".to_string(), "y".to_string()];
    for fit in &report.fits {
        headers.push(format!("P{}(x)", fit.degree()));
        headers.push(format!("P{}(x) - y", fit.degree()));
    }
    let header_refs: Vec<&str> = headers.iter().map(|h| h.as_str()).collect();
    let rows = residual_rows(report);
    println!("{}", render_table(&header_refs, &rows));

    let mut curves = vec![Curve::markers("data", &report.x, &report.y)];
    for fit in &report.fits {
        let values: Vec<f64> = report.plot_x.iter().map(|x| fit.eval(*x)).collect();
        curves.push(Curve::line(format!("P{}(x)", fit.degree()), &report.plot_x, &values));
    }
    let chart = Chart {
        title: "Least-squares approximation".to_string(),
        x_desc: "x".to_string(),
        y_desc: "y".to_string(),
        size: (1200, 600),
        curves,
    };
    let path = output.path("approximation.png");
    plot_chart(&path, &chart).map_err(|e| LabError::render(&path, e))?;
    info!("plot saved to {}", path.display());

    if output.csv {
        save_table_to_csv(&output.path("approximation_residuals.csv"), &header_refs, &rows)?;
    }
    Ok(())
}

pub fn run_approximation_lab(
    params: &ApproximationParams,
    output: &LabOutput,
) -> Result<ApproximationReport, LabError> {
    let report = compute_approximation_lab(params)?;
    present_approximation_lab(&report, output)?;
    Ok(report)
}
