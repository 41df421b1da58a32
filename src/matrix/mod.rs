//! The labeled-matrix abstraction shared by every IO dataset.
pub mod labeled;

pub use labeled::{Label, LabeledMatrix, MatrixError};
