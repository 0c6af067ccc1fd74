//! Numerical methods of the labs: fixed-step IVP solvers, boundary-value solvers,
//! error estimation, root finding, least squares, quadrature and splines.

/// error taxonomy and the tagged outcome of capped iterations
pub mod solver_errors;
/// uniform, explicit and perturbed-start grids
pub mod grid;
/// Euler, RK4 and Adams 4th order predictor-corrector for first-order systems
/// Example
/// ```rust, ignore
/// let rhs = |_x: f64, y: &DVector<f64>| DVector::from_vec(vec![y[1], -y[0]]);
/// let task = IVPTask::new(0.0, DVector::from_vec(vec![1.0, 0.0]), 0.01, 100);
/// let solution = solve_fixed_step(FixedStepMethod::RK4, &rhs, &task)?;
/// ```
pub mod IVP_fixed_step;
/// a-posteriori error estimate from two step sizes and Richardson refinement
pub mod Runge_Romberg;
/// linear 2nd-order ODE y'' + p y' + q y = f and its first-order form
pub mod linear_ode2;
/// shooting method for linear BVPs
pub mod ShootingBVP;
/// finite-difference solver for linear BVPs with Dirichlet data
pub mod FD_BVP;
/// scalar equations: sign-change scan, Newton, simple iteration
pub mod Nonlinear_equations;
/// 2D systems: Newton, simple iteration, zero contours
pub mod Nonlinear_systems;
/// polynomial least squares
pub mod least_squares;
/// midpoint rectangles, trapezoids and Simpson's rule with running integrals
pub mod quadrature;
/// natural cubic splines
pub mod cubic_spline;
