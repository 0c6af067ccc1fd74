//! Typed parameters of all labs.
//!
//! Defaults reproduce the classic exercises; any value can be overridden by a keyed document:
//! ```text
//! ivp
//! h: 0.05
//! n: 20
//! methods: Euler, RK4, Adams4
//! bvp
//! n: 40
//! terminal_slope: integrated
//! ```
use crate::Examples::lab_error::LabError;
use crate::Utils::task_parser::Document;
use crate::numerical::IVP_fixed_step::FixedStepMethod;
use crate::numerical::ShootingBVP::Shooting_simple::{ShootingSettings, TerminalSlope};
use crate::numerical::quadrature::QuadratureRule;
use crate::numerical::solver_errors::IterationSettings;
use log::info;
use nalgebra::Vector2;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Where the presentation stage writes plots and CSV files.
#[derive(Debug, Clone, PartialEq)]
pub struct LabOutput {
    pub dir: PathBuf,
    pub csv: bool,
}

impl LabOutput {
    pub fn new(dir: impl Into<PathBuf>, csv: bool) -> Self {
        LabOutput {
            dir: dir.into(),
            csv,
        }
    }

    pub fn path(&self, file_name: &str) -> PathBuf {
        self.dir.join(file_name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EquationParams {
    pub sample_range: (f64, f64),
    pub samples: usize,
    pub bracket: (f64, f64),
    pub settings: IterationSettings,
}

impl Default for EquationParams {
    fn default() -> Self {
        EquationParams {
            sample_range: (0.0, 1.5),
            samples: 500,
            bracket: (0.5, 1.2),
            settings: IterationSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SystemParams {
    /// coefficient of x1^2 in f1
    pub a: f64,
    pub x1_range: (f64, f64),
    pub x2_range: (f64, f64),
    /// contour samples per axis
    pub grid: usize,
    pub start: Vector2<f64>,
    /// step of the fixed-point map x1' = x1 - relaxation * f1
    pub relaxation: f64,
    pub settings: IterationSettings,
}

impl Default for SystemParams {
    fn default() -> Self {
        SystemParams {
            a: 2.0,
            x1_range: (-1.5, 1.5),
            x2_range: (-2.0, 2.5),
            grid: 400,
            start: Vector2::new(0.8, 1.0),
            relaxation: 0.1,
            settings: IterationSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApproximationParams {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub degrees: Vec<usize>,
    pub plot_range: (f64, f64),
    pub plot_samples: usize,
}

impl Default for ApproximationParams {
    fn default() -> Self {
        ApproximationParams {
            x: vec![0.1, 0.5, 0.9, 1.3, 1.7, 2.1],
            y: vec![10.0, 2.0, 1.1111, 0.76923, 0.58824, 0.47618],
            degrees: vec![1, 2],
            plot_range: (0.05, 2.15),
            plot_samples: 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SplineParams {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    /// interpolation point
    pub x_star: f64,
    pub plot_samples: usize,
}

impl Default for SplineParams {
    fn default() -> Self {
        SplineParams {
            x: vec![0.1, 0.5, 0.9, 1.3, 1.7],
            y: vec![10.0, 2.0, 1.1111, 0.76923, 0.58824],
            x_star: 0.8,
            plot_samples: 400,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IntegrationParams {
    pub a: f64,
    pub b: f64,
    /// coarse step; the fine step is `h / ratio`
    pub h: f64,
    pub ratio: usize,
    pub rules: Vec<QuadratureRule>,
}

impl Default for IntegrationParams {
    fn default() -> Self {
        IntegrationParams {
            a: 0.0,
            b: 4.0,
            h: 1.0,
            ratio: 2,
            rules: vec![
                QuadratureRule::Rectangle,
                QuadratureRule::Trapezoid,
                QuadratureRule::Simpson,
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IvpParams {
    pub x0: f64,
    pub y0: f64,
    pub dy0: f64,
    pub h: f64,
    pub n: usize,
    pub methods: Vec<FixedStepMethod>,
}

impl Default for IvpParams {
    fn default() -> Self {
        IvpParams {
            x0: 1.0,
            y0: 3.0,
            dy0: 2.0,
            h: 0.1,
            n: 10,
            methods: vec![
                FixedStepMethod::Euler,
                FixedStepMethod::RK4,
                FixedStepMethod::Adams4,
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BvpParams {
    pub a: f64,
    pub b: f64,
    pub n: usize,
    pub slope_guess: f64,
    pub shooting: ShootingSettings,
}

impl Default for BvpParams {
    fn default() -> Self {
        BvpParams {
            a: 0.0,
            b: 4.0,
            n: 10,
            slope_guess: 0.0,
            shooting: ShootingSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct LabConfig {
    pub equation: EquationParams,
    pub system: SystemParams,
    pub approximation: ApproximationParams,
    pub spline: SplineParams,
    pub integration: IntegrationParams,
    pub ivp: IvpParams,
    pub bvp: BvpParams,
}

const ALLOWED_KEYS: &[(&str, &[&str])] = &[
    (
        "nonlinear_equation",
        &["sample_range", "samples", "bracket", "tolerance", "max_iterations"],
    ),
    (
        "nonlinear_system",
        &[
            "a",
            "x1_range",
            "x2_range",
            "grid",
            "start",
            "relaxation",
            "tolerance",
            "max_iterations",
        ],
    ),
    ("approximation", &["x", "y", "degrees", "plot_range", "plot_samples"]),
    ("spline", &["x", "y", "x_star", "plot_samples"]),
    ("integration", &["a", "b", "h", "ratio", "rules"]),
    ("ivp", &["x0", "y0", "dy0", "h", "n", "methods"]),
    (
        "bvp",
        &[
            "n",
            "slope_guess",
            "tolerance",
            "max_iterations",
            "start_eps",
            "terminal_slope",
        ],
    ),
];

fn pair(document: &Document, section: &str, key: &str) -> Result<Option<(f64, f64)>, LabError> {
    match document.floats(section, key)? {
        None => Ok(None),
        Some(v) if v.len() == 2 => Ok(Some((v[0], v[1]))),
        Some(v) => Err(LabError::config_value(
            key,
            format!("expected 2 numbers, got {}", v.len()),
        )),
    }
}

fn override_settings(document: &Document, section: &str, settings: &mut IterationSettings) -> Result<(), LabError> {
    if let Some(tolerance) = document.float(section, "tolerance")? {
        settings.tolerance = tolerance;
    }
    if let Some(max_iterations) = document.count(section, "max_iterations")? {
        settings.max_iterations = max_iterations;
    }
    Ok(())
}

impl LabConfig {
    pub fn from_document(document: &Document) -> Result<Self, LabError> {
        document.check_keys(ALLOWED_KEYS)?;
        let mut config = LabConfig::default();

        let section = "nonlinear_equation";
        let eq = &mut config.equation;
        if let Some(range) = pair(document, section, "sample_range")? {
            eq.sample_range = range;
        }
        if let Some(samples) = document.count(section, "samples")? {
            eq.samples = samples;
        }
        if let Some(bracket) = pair(document, section, "bracket")? {
            eq.bracket = bracket;
        }
        override_settings(document, section, &mut eq.settings)?;

        let section = "nonlinear_system";
        let sys = &mut config.system;
        if let Some(a) = document.float(section, "a")? {
            sys.a = a;
        }
        if let Some(range) = pair(document, section, "x1_range")? {
            sys.x1_range = range;
        }
        if let Some(range) = pair(document, section, "x2_range")? {
            sys.x2_range = range;
        }
        if let Some(grid) = document.count(section, "grid")? {
            sys.grid = grid;
        }
        if let Some((x1, x2)) = pair(document, section, "start")? {
            sys.start = Vector2::new(x1, x2);
        }
        if let Some(relaxation) = document.float(section, "relaxation")? {
            sys.relaxation = relaxation;
        }
        override_settings(document, section, &mut sys.settings)?;

        let section = "approximation";
        let approx = &mut config.approximation;
        if let Some(x) = document.floats(section, "x")? {
            approx.x = x;
        }
        if let Some(y) = document.floats(section, "y")? {
            approx.y = y;
        }
        if let Some(degrees) = document.counts(section, "degrees")? {
            approx.degrees = degrees;
        }
        if let Some(range) = pair(document, section, "plot_range")? {
            approx.plot_range = range;
        }
        if let Some(samples) = document.count(section, "plot_samples")? {
            approx.plot_samples = samples;
        }

        let section = "spline";
        let spline = &mut config.spline;
        if let Some(x) = document.floats(section, "x")? {
            spline.x = x;
        }
        if let Some(y) = document.floats(section, "y")? {
            spline.y = y;
        }
        if let Some(x_star) = document.float(section, "x_star")? {
            spline.x_star = x_star;
        }
        if let Some(samples) = document.count(section, "plot_samples")? {
            spline.plot_samples = samples;
        }

        let section = "integration";
        let integration = &mut config.integration;
        for (key, target) in [("a", &mut integration.a), ("b", &mut integration.b), ("h", &mut integration.h)] {
            if let Some(value) = document.float(section, key)? {
                *target = value;
            }
        }
        if let Some(ratio) = document.count(section, "ratio")? {
            integration.ratio = ratio;
        }
        if let Some(values) = document.get(section, "rules") {
            integration.rules = values
                .iter()
                .map(|v| {
                    QuadratureRule::from_str(&v.to_string())
                        .map_err(|_| LabError::config_value("rules", format!("unknown rule `{}`", v)))
                })
                .collect::<Result<Vec<_>, _>>()?;
        }

        let section = "ivp";
        let ivp = &mut config.ivp;
        for (key, target) in [("x0", &mut ivp.x0), ("y0", &mut ivp.y0), ("dy0", &mut ivp.dy0), ("h", &mut ivp.h)] {
            if let Some(value) = document.float(section, key)? {
                *target = value;
            }
        }
        if let Some(n) = document.count(section, "n")? {
            ivp.n = n;
        }
        if let Some(values) = document.get(section, "methods") {
            ivp.methods = values
                .iter()
                .map(|v| {
                    FixedStepMethod::from_str(&v.to_string())
                        .map_err(|_| LabError::config_value("methods", format!("unknown method `{}`", v)))
                })
                .collect::<Result<Vec<_>, _>>()?;
        }

        let section = "bvp";
        let bvp = &mut config.bvp;
        if let Some(n) = document.count(section, "n")? {
            bvp.n = n;
            bvp.shooting.n = n;
        }
        if let Some(slope) = document.float(section, "slope_guess")? {
            bvp.slope_guess = slope;
        }
        if let Some(tolerance) = document.float(section, "tolerance")? {
            bvp.shooting.tolerance = tolerance;
        }
        if let Some(max_iterations) = document.count(section, "max_iterations")? {
            bvp.shooting.max_iterations = max_iterations;
        }
        if let Some(eps) = document.float(section, "start_eps")? {
            bvp.shooting.start_eps = if eps == 0.0 { None } else { Some(eps) };
        }
        if let Some(word) = document.word(section, "terminal_slope")? {
            bvp.shooting.terminal_slope = TerminalSlope::from_str(&word)
                .map_err(|_| LabError::config_value("terminal_slope", format!("unknown value `{}`", word)))?;
        }

        info!("configuration loaded: {:?}", config);
        Ok(config)
    }

    pub fn from_str_document(input: &str) -> Result<Self, LabError> {
        let document = Document::parse(input)?;
        Self::from_document(&document)
    }

    pub fn from_file(path: &Path) -> Result<Self, LabError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_str_document(&text)
    }
}
