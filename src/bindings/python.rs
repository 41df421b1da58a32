//! Python-facing wrappers around the model.
//!
//! Validation failures map to `ValueError`, the singular-inversion
//! numeric failure to `RuntimeError`. Everything crosses the boundary as
//! plain lists, strings and dicts; the numeric core stays on the Rust side.

use crate::matrix::MatrixError;
use crate::model::{IoModel, ModelError, ShockMode, ShockSpec, TradeFlowQuery, UseType};
use crate::providers::{exiobase, figaro, oecd, ProviderError, ProviderMeta, RawTable};
use nalgebra::DMatrix;
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use std::collections::BTreeMap;

fn model_err(err: ModelError) -> PyErr {
    match &err {
        ModelError::Matrix(MatrixError::Singular { .. }) => {
            PyRuntimeError::new_err(err.to_string())
        }
        _ => PyValueError::new_err(err.to_string()),
    }
}

fn provider_err(err: ProviderError) -> PyErr {
    PyValueError::new_err(err.to_string())
}

fn raw_table(
    values: Vec<Vec<f64>>,
    row_keys: Vec<String>,
    col_keys: Vec<String>,
) -> PyResult<RawTable> {
    let nrows = values.len();
    let ncols = values.first().map(|row| row.len()).unwrap_or(0);
    if values.iter().any(|row| row.len() != ncols) {
        return Err(PyValueError::new_err("table rows have unequal lengths"));
    }
    let data = DMatrix::from_fn(nrows, ncols, |i, j| values[i][j]);
    RawTable::new(data, row_keys, col_keys).map_err(provider_err)
}

#[allow(clippy::too_many_arguments)]
fn meta(
    num_regions: usize,
    num_sectors: usize,
    sector_name_mapping: BTreeMap<String, String>,
    demand_items: BTreeMap<String, String>,
    unit: String,
    reference: String,
    contact: String,
) -> ProviderMeta {
    ProviderMeta {
        num_regions,
        num_sectors,
        sector_name_mapping,
        demand_items,
        unit,
        reference,
        contact,
    }
}

#[pyclass(name = "_IoModel")]
#[derive(Debug, Clone)]
pub struct PyIoModel {
    inner: IoModel,
}

#[pymethods]
impl PyIoModel {
    #[staticmethod]
    #[allow(clippy::too_many_arguments)]
    #[pyo3(signature = (values, row_keys, col_keys, num_regions, num_sectors,
                        sector_name_mapping, demand_items, unit, reference="", contact=""))]
    fn from_figaro(
        values: Vec<Vec<f64>>,
        row_keys: Vec<String>,
        col_keys: Vec<String>,
        num_regions: usize,
        num_sectors: usize,
        sector_name_mapping: BTreeMap<String, String>,
        demand_items: BTreeMap<String, String>,
        unit: String,
        reference: &str,
        contact: &str,
    ) -> PyResult<Self> {
        let table = raw_table(values, row_keys, col_keys)?;
        let blocks = figaro::carve(
            &table,
            meta(
                num_regions,
                num_sectors,
                sector_name_mapping,
                demand_items,
                unit,
                reference.to_string(),
                contact.to_string(),
            ),
        )
        .map_err(provider_err)?;
        let inner = IoModel::from_blocks(blocks).map_err(model_err)?;
        Ok(Self { inner })
    }

    #[staticmethod]
    #[allow(clippy::too_many_arguments)]
    #[pyo3(signature = (values, row_keys, col_keys, num_regions, num_sectors,
                        sector_name_mapping, demand_items, unit, reference="", contact=""))]
    fn from_oecd(
        values: Vec<Vec<f64>>,
        row_keys: Vec<String>,
        col_keys: Vec<String>,
        num_regions: usize,
        num_sectors: usize,
        sector_name_mapping: BTreeMap<String, String>,
        demand_items: BTreeMap<String, String>,
        unit: String,
        reference: &str,
        contact: &str,
    ) -> PyResult<Self> {
        let table = raw_table(values, row_keys, col_keys)?;
        let blocks = oecd::carve(
            &table,
            meta(
                num_regions,
                num_sectors,
                sector_name_mapping,
                demand_items,
                unit,
                reference.to_string(),
                contact.to_string(),
            ),
        )
        .map_err(provider_err)?;
        let inner = IoModel::from_blocks(blocks).map_err(model_err)?;
        Ok(Self { inner })
    }

    #[staticmethod]
    #[allow(clippy::too_many_arguments)]
    #[pyo3(signature = (z_values, z_row_keys, z_col_keys, fd_values, fd_col_keys,
                        x_values, num_regions, num_sectors, sector_name_mapping,
                        demand_items, unit, reference="", contact=""))]
    fn from_exiobase(
        z_values: Vec<Vec<f64>>,
        z_row_keys: Vec<String>,
        z_col_keys: Vec<String>,
        fd_values: Vec<Vec<f64>>,
        fd_col_keys: Vec<String>,
        x_values: Vec<f64>,
        num_regions: usize,
        num_sectors: usize,
        sector_name_mapping: BTreeMap<String, String>,
        demand_items: BTreeMap<String, String>,
        unit: String,
        reference: &str,
        contact: &str,
    ) -> PyResult<Self> {
        let z = raw_table(z_values, z_row_keys.clone(), z_col_keys)?;
        let fd = raw_table(fd_values, z_row_keys.clone(), fd_col_keys)?;
        let x = raw_table(
            x_values.into_iter().map(|v| vec![v]).collect(),
            z_row_keys,
            vec!["indout".to_string()],
        )?;
        let blocks = exiobase::carve(
            &z,
            &fd,
            &x,
            meta(
                num_regions,
                num_sectors,
                sector_name_mapping,
                demand_items,
                unit,
                reference.to_string(),
                contact.to_string(),
            ),
        )
        .map_err(provider_err)?;
        let inner = IoModel::from_blocks(blocks).map_err(model_err)?;
        Ok(Self { inner })
    }

    // --- Read-only attributes ---

    fn rs(&self) -> usize {
        self.inner.rs()
    }

    fn regions(&self) -> Vec<String> {
        self.inner.regions().to_vec()
    }

    fn sectors(&self) -> Vec<String> {
        self.inner.sectors().to_vec()
    }

    fn unit(&self) -> String {
        self.inner.unit().to_string()
    }

    fn output(&self) -> Vec<f64> {
        self.inner.output().flatten()
    }

    fn final_demand(&self) -> Vec<f64> {
        self.inner.final_demand().flatten()
    }

    fn value_added(&self) -> Vec<f64> {
        self.inner.value_added().flatten()
    }

    // --- Analysis ---

    #[pyo3(signature = (model, shock=None, regions=None, sectors=None, custom_shock_vector=None))]
    fn compute_shock(
        &self,
        model: &str,
        shock: Option<f64>,
        regions: Option<Vec<String>>,
        sectors: Option<Vec<String>>,
        custom_shock_vector: Option<Vec<f64>>,
    ) -> PyResult<Vec<f64>> {
        let mode: ShockMode = model.parse().map_err(model_err)?;
        let spec = ShockSpec {
            shock_percent: shock,
            regions,
            sectors,
            custom_shock_vector,
        };
        let x_new = self.inner.compute_shock(mode, &spec).map_err(model_err)?;
        Ok(x_new.flatten())
    }

    #[pyo3(signature = (shock=None, regions=None, sectors=None, custom_shock_vector=None))]
    fn leontief_demand_shock(
        &self,
        shock: Option<f64>,
        regions: Option<Vec<String>>,
        sectors: Option<Vec<String>>,
        custom_shock_vector: Option<Vec<f64>>,
    ) -> PyResult<Vec<(String, String, f64, f64)>> {
        self.tabulated_shock(ShockMode::Leontief, shock, regions, sectors, custom_shock_vector)
    }

    #[pyo3(signature = (shock=None, regions=None, sectors=None, custom_shock_vector=None))]
    fn ghosh_supply_shock(
        &self,
        shock: Option<f64>,
        regions: Option<Vec<String>>,
        sectors: Option<Vec<String>>,
        custom_shock_vector: Option<Vec<f64>>,
    ) -> PyResult<Vec<(String, String, f64, f64)>> {
        self.tabulated_shock(ShockMode::Ghosh, shock, regions, sectors, custom_shock_vector)
    }

    #[pyo3(signature = (import_regions, export_regions, import_sectors=None, export_sectors=None, use_type="both"))]
    fn get_trade_flow(
        &self,
        import_regions: Vec<String>,
        export_regions: Vec<String>,
        import_sectors: Option<Vec<String>>,
        export_sectors: Option<Vec<String>>,
        use_type: &str,
    ) -> PyResult<f64> {
        let use_type: UseType = use_type.parse().map_err(model_err)?;
        let mut query = TradeFlowQuery::new()
            .import_regions(import_regions)
            .export_regions(export_regions)
            .use_type(use_type);
        if let Some(sectors) = import_sectors {
            query = query.import_sectors(sectors);
        }
        if let Some(sectors) = export_sectors {
            query = query.export_sectors(sectors);
        }
        self.inner.trade_flow(&query).map_err(model_err)
    }
}

impl PyIoModel {
    fn tabulated_shock(
        &self,
        mode: ShockMode,
        shock: Option<f64>,
        regions: Option<Vec<String>>,
        sectors: Option<Vec<String>>,
        custom_shock_vector: Option<Vec<f64>>,
    ) -> PyResult<Vec<(String, String, f64, f64)>> {
        let spec = ShockSpec {
            shock_percent: shock,
            regions,
            sectors,
            custom_shock_vector,
        };
        let x_new = self.inner.compute_shock(mode, &spec).map_err(model_err)?;
        let table = self.inner.shock_to_table(&x_new);
        Ok(table
            .rows()
            .iter()
            .map(|row| (row.region.clone(), row.sector.clone(), row.x, row.x_new))
            .collect())
    }
}
