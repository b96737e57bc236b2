//! Row extraction, normalization and composite place grouping

pub mod composite;
pub mod normalize;
pub mod rows;

pub use composite::{CompositeGroup, CompositeGroups, CompositeTag};
pub use normalize::{client_code_numeric, embedded_decimal, FieldNormalizer};
pub use rows::{RowExtraction, RowExtractor};
