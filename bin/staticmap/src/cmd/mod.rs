//! Command implementations.

pub mod build;
pub mod check;
pub mod schedule;
pub mod stylesheet;
