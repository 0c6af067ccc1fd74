//! some linear algebra functions used throughout the code
#![allow(non_snake_case)]
/// tridiagonal systems and the Thomas algorithm
pub mod Thomas;
