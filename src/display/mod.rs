//! Plain-text and JSON renderings of analysis results.
pub mod table;

pub use table::{ImpactRow, ImpactTable, ShockRow, ShockTable};
