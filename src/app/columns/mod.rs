//! Column mapping
//!
//! Resolves the fifteen logical manifest fields to physical columns using
//! header keywords first and layout conventions second.

pub mod fuzzy;
pub mod mapper;

pub use fuzzy::partial_ratio;
pub use mapper::{ColumnMapper, MappingConfig};
