//! Multi-region input-output analysis core.
//!
//! Loads IO datasets (already parsed into labeled tables by per-provider
//! tooling) into a common matrix representation and runs Leontief
//! demand-side and Ghosh supply-side shock analysis plus trade-flow
//! aggregation over them.

pub mod display;
pub mod matrix;
pub mod model;
pub mod providers;

#[cfg(feature = "python")]
pub mod bindings;

pub use display::{ImpactRow, ImpactTable, ShockRow, ShockTable};
pub use matrix::{Label, LabeledMatrix, MatrixError};
pub use model::{
    GroupBy, IoModel, ModelBlocks, ModelError, OutputBlock, ShockMode, ShockSpec,
    TradeFlowQuery, UseType,
};
pub use providers::{ProviderError, ProviderMeta, RawTable};

// --- Python Module Definition ---
/// This function defines the `mrio._core` Python module.
/// The name `_core` is chosen to indicate it's an internal, compiled component.
#[cfg(feature = "python")]
#[pyo3::pymodule]
fn _core(_py: pyo3::Python, m: &pyo3::Bound<'_, pyo3::types::PyModule>) -> pyo3::PyResult<()> {
    use pyo3::prelude::PyModuleMethods;

    m.add_class::<bindings::python::PyIoModel>()?;
    Ok(())
}
