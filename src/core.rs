//! Core abstractions and types for Tron.
//!
//! *Users* are mainly interested in implementing the [`Objective`] trait,
//! optionally specifying the [domain](Domain).
//!
//! Algorithms *developers* are interested in [`LinearOperator`] and the
//! [`Domain`] operations for projected steps, breakpoints and free variables
//! as well as tools in [derivatives](crate::derivatives) module.

mod base;
mod domain;
mod function;
mod operator;

pub use base::*;
pub use domain::*;
pub use function::*;
pub use operator::*;
