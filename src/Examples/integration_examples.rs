//! Definite integral `∫_0^4 dx / sqrt((2x + 7)(3x + 4))` by midpoint rectangles, trapezoids
//! and Simpson's rule at steps `h` and `h / ratio`, refined by Runge-Romberg.
use crate::Examples::lab_config::{IntegrationParams, LabOutput};
use crate::Examples::lab_error::LabError;
use crate::Utils::logger::save_table_to_csv;
use crate::Utils::plots::{Chart, Curve, plot_chart};
use crate::Utils::tables::{fmt_error, fmt_value, render_records, render_table};
use crate::numerical::Runge_Romberg::{runge_romberg_error, runge_romberg_refined_value};
use crate::numerical::grid::{Grid, linspace};
use crate::numerical::quadrature::{QuadratureRule, gauss_legendre, running_integral};
use crate::numerical::solver_errors::NumError;
use log::{info, warn};
use tabled::Tabled;

/// Nodes of the Gauss-Legendre cross-check.
const GAUSS_DEGREE: usize = 20;

pub fn integrand(x: f64) -> f64 {
    1.0 / ((2.0 * x + 7.0) * (3.0 * x + 4.0)).sqrt()
}

/// `ln(2 sqrt(6) sqrt(6x^2 + 29x + 28) + 12x + 29) / sqrt(6)`
pub fn antiderivative(x: f64) -> f64 {
    let root6 = 6.0_f64.sqrt();
    let q = 6.0 * x * x + 29.0 * x + 28.0;
    (2.0 * root6 * q.sqrt() + 12.0 * x + 29.0).ln() / root6
}

pub fn exact_integral(a: f64, b: f64) -> f64 {
    antiderivative(b) - antiderivative(a)
}

/// Integrand samples and running integrals of every rule at one step size.
#[derive(Debug, Clone)]
pub struct StepTable {
    pub h: f64,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub running: Vec<(QuadratureRule, Vec<Option<f64>>)>,
}

impl StepTable {
    fn build(params: &IntegrationParams, h: f64) -> Result<Self, NumError> {
        let grid = Grid::uniform_with_step(params.a, params.b, h)?;
        let running = params
            .rules
            .iter()
            .map(|rule| Ok((*rule, running_integral(*rule, &integrand, &grid)?)))
            .collect::<Result<Vec<_>, NumError>>()?;
        Ok(StepTable {
            h,
            x: grid.points().to_vec(),
            y: grid.points().iter().map(|x| integrand(*x)).collect(),
            running,
        })
    }

    pub fn total(&self, rule: QuadratureRule) -> Option<f64> {
        self.running
            .iter()
            .find(|(r, _)| *r == rule)
            .and_then(|(_, values)| values.last().copied().flatten())
    }

    pub fn rows(&self) -> Vec<Vec<String>> {
        (0..self.x.len())
            .map(|i| {
                let mut row = vec![i.to_string(), fmt_value(self.x[i]), fmt_value(self.y[i])];
                row.extend(
                    self.running
                        .iter()
                        .map(|(_, values)| values[i].map_or_else(|| "-".to_string(), fmt_value)),
                );
                row
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RuleSummary {
    pub rule: QuadratureRule,
    pub coarse: f64,
    pub fine: f64,
    /// Runge-Romberg estimate of the fine-step error
    pub rr_estimate: f64,
    pub refined: f64,
    /// |fine - exact|
    pub fine_error: f64,
    /// |refined - exact|
    pub refined_error: f64,
}

#[derive(Debug, Clone)]
pub struct IntegrationReport {
    pub params: IntegrationParams,
    pub exact: f64,
    /// Gauss-Legendre value, independent of the antiderivative
    pub gauss_reference: f64,
    pub coarse: StepTable,
    pub fine: StepTable,
    pub summary: Vec<RuleSummary>,
}

impl IntegrationReport {
    /// Rule with the smallest Runge-Romberg estimate.
    pub fn most_accurate(&self) -> Option<QuadratureRule> {
        self.summary
            .iter()
            .min_by(|l, r| l.rr_estimate.total_cmp(&r.rr_estimate))
            .map(|s| s.rule)
    }

    /// Every rule is closer to the refined value at the fine step than at the coarse one.
    pub fn errors_decrease(&self) -> bool {
        self.summary
            .iter()
            .all(|s| (s.refined - s.fine).abs() < (s.refined - s.coarse).abs())
    }
}

#[derive(Tabled)]
struct SummaryRow {
    rule: String,
    #[tabled(rename = "F(h)")]
    coarse: String,
    #[tabled(rename = "F(h/k)")]
    fine: String,
    #[tabled(rename = "RR estimate")]
    estimate: String,
    refined: String,
    #[tabled(rename = "|F(h/k) - exact|")]
    fine_error: String,
    #[tabled(rename = "|refined - exact|")]
    refined_error: String,
}

pub fn compute_integration_lab(params: &IntegrationParams) -> Result<IntegrationReport, NumError> {
    if params.rules.is_empty() {
        return Err(NumError::invalid("rules", "no quadrature rule requested"));
    }
    if params.ratio < 2 {
        return Err(NumError::invalid(
            "ratio",
            format!("step ratio must be at least 2, got {}", params.ratio),
        ));
    }
    let coarse = StepTable::build(params, params.h)?;
    let fine = StepTable::build(params, params.h / params.ratio as f64)?;
    let exact = exact_integral(params.a, params.b);
    let gauss_reference = gauss_legendre(&integrand, params.a, params.b, GAUSS_DEGREE)?;
    info!("exact {}, Gauss-Legendre ({} nodes) {}", exact, GAUSS_DEGREE, gauss_reference);

    let mut summary = Vec::with_capacity(params.rules.len());
    for rule in &params.rules {
        let missing = || NumError::invalid("rules", format!("{} has no total", rule));
        let f_coarse = coarse.total(*rule).ok_or_else(missing)?;
        let f_fine = fine.total(*rule).ok_or_else(missing)?;
        let refined = runge_romberg_refined_value(f_coarse, f_fine, params.ratio, rule.order())?;
        let rr_estimate = runge_romberg_error(f_coarse, f_fine, params.ratio, rule.order())?;
        info!(
            "{}: F(h) = {}, F(h/k) = {}, estimate {:e}, refined {}",
            rule, f_coarse, f_fine, rr_estimate, refined
        );
        summary.push(RuleSummary {
            rule: *rule,
            coarse: f_coarse,
            fine: f_fine,
            rr_estimate,
            refined,
            fine_error: (f_fine - exact).abs(),
            refined_error: (refined - exact).abs(),
        });
    }
    let report = IntegrationReport {
        params: params.clone(),
        exact,
        gauss_reference,
        coarse,
        fine,
        summary,
    };
    if !report.errors_decrease() {
        warn!("refining the step did not reduce every error");
    }
    Ok(report)
}

pub fn present_integration_lab(report: &IntegrationReport, output: &LabOutput) -> Result<(), LabError> {
    let mut headers: Vec<String> = vec!["i".to_string(), "x".to_string(), "y".to_string()];
    headers.extend(report.params.rules.iter().map(|rule| rule.to_string()));
    let header_refs: Vec<&str> = headers.iter().map(|h| h.as_str()).collect();
    let tables = [("integration_coarse.csv", &report.coarse), ("integration_fine.csv", &report.fine)];
    for (file_name, table) in tables {
        let rows = table.rows();
        println!("Step h = {}", table.h);
        println!("{}", render_table(&header_refs, &rows));
        if output.csv {
            save_table_to_csv(&output.path(file_name), &header_refs, &rows)?;
        }
    }

    let summary: Vec<SummaryRow> = report
        .summary
        .iter()
        .map(|s| SummaryRow {
            rule: s.rule.to_string(),
            coarse: fmt_value(s.coarse),
            fine: fmt_value(s.fine),
            estimate: fmt_error(s.rr_estimate),
            refined: fmt_value(s.refined),
            fine_error: fmt_error(s.fine_error),
            refined_error: fmt_error(s.refined_error),
        })
        .collect();
    println!(
        "Runge-Romberg, k = {}, exact value {}, Gauss-Legendre {}",
        report.params.ratio,
        fmt_value(report.exact),
        fmt_value(report.gauss_reference)
    );
    println!("{}", render_records(&summary));
    println!("errors decrease with the step: {}", report.errors_decrease());
    if let Some(rule) = report.most_accurate() {
        println!("most accurate rule: {}", rule);
    }

    let plot_x = linspace(report.params.a, report.params.b, 200);
    let plot_y: Vec<f64> = plot_x.iter().map(|x| integrand(*x)).collect();
    let mut curves = vec![Curve::line("f(x)", &plot_x, &plot_y)];
    for (rule, values) in &report.fine.running {
        let (x, y): (Vec<f64>, Vec<f64>) = report
            .fine
            .x
            .iter()
            .zip(values.iter())
            .filter_map(|(x, v)| v.map(|v| (*x, v)))
            .unzip();
        curves.push(Curve::markers(format!("running integral, {}", rule), &x, &y));
    }
    let chart = Chart {
        title: "Numerical integration".to_string(),
        x_desc: "x".to_string(),
        y_desc: "y".to_string(),
        size: (1200, 600),
        curves,
    };
    let path = output.path("integration.png");
    plot_chart(&path, &chart).map_err(|e| LabError::render(&path, e))?;
    info!("plot saved to {}", path.display());
    Ok(())
}

pub fn run_integration_lab(
    params: &IntegrationParams,
    output: &LabOutput,
) -> Result<IntegrationReport, LabError> {
    let report = compute_integration_lab(params)?;
    present_integration_lab(&report, output)?;
    Ok(report)
}
