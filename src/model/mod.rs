//! The IO model: construction from provider blocks, shock propagation,
//! and trade-flow aggregation.
pub mod blocks;
pub mod error;
pub mod io_model;
pub mod shock;
pub mod trade;

pub use blocks::{ModelBlocks, OutputBlock};
pub use error::ModelError;
pub use io_model::IoModel;
pub use shock::{GroupBy, ShockMode, ShockSpec};
pub use trade::{TradeFlowQuery, UseType};
