//! The seven numerical-analysis labs, each split into a pure `compute_*` stage and a
//! `present_*` stage that prints tables, draws a plot and optionally exports CSV.
/// errors of the lab pipelines
pub mod lab_error;
/// lab parameters and the keyed config document
pub mod lab_config;
/// scalar equation: localisation, simple iteration, Newton
pub mod nonlinear_eq_examples;
/// 2x2 system: zero contours, Newton, simple iteration
pub mod nonlinear_system_examples;
/// least-squares polynomials
pub mod approximation_examples;
/// natural cubic spline of tabulated data
pub mod spline_examples;
/// rectangles, trapezoids and Simpson with Runge-Romberg refinement
pub mod integration_examples;
/// Cauchy problem by Euler, RK4 and Adams
pub mod ivp_examples;
/// BVP by shooting and finite differences
pub mod bvp_examples;
