//! The collection of implemented algorithms.

pub mod tron;

pub use tron::Tron;
