/// shooting method with secant iteration on the unknown initial slope of a linear 2nd-order BVP
pub mod Shooting_simple;
