//! # ggs-types
//!
//! Shared types for greedy grid search: parameter values, the discrete
//! search space and the error types every search operation returns.

pub mod errors;
pub mod non_finite;
pub mod space;

pub use errors::*;
pub use space::*;
