//! Freight Manifest Library
//!
//! Heuristic extraction of cargo manifest records from loosely formatted
//! partner spreadsheets. Finds the batch number, the block of client rows
//! and the meaning of each column without relying on a fixed template,
//! then normalizes every row and aggregates batch totals.

pub mod app;
pub mod cli;
pub mod config;
pub mod constants;
pub mod errors;
pub mod prelude;

// Re-export commonly used types for convenience
pub use errors::{AppError, Result};
