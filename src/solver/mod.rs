//! Optimization algorithms for logistic regression

pub mod gradient_descent;

pub use self::gradient_descent::*;
