//! Carves already-parsed provider tables into model blocks.
//!
//! Each statistical provider ships the same economic content in a
//! differently-shaped table; the functions here slice a resident
//! [`RawTable`] into the blocks `IoModel::from_blocks` consumes.
//! Downloading, caching, archive extraction and file parsing are the
//! caller's concern and never enter this crate, as is any region-code
//! normalization (keys are used as given).
pub mod exiobase;
pub mod figaro;
pub mod oecd;

use crate::matrix::{Label, LabeledMatrix, MatrixError};
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::Range;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    #[error("table keys imply shape ({key_rows}, {key_cols}), array is ({array_rows}, {array_cols})")]
    TableShape {
        key_rows: usize,
        key_cols: usize,
        array_rows: usize,
        array_cols: usize,
    },

    #[error(
        "table is {rows}x{cols}, need at least {need_rows}x{need_cols} \
         for {regions} regions x {sectors} sectors"
    )]
    TableTooSmall {
        rows: usize,
        cols: usize,
        need_rows: usize,
        need_cols: usize,
        regions: usize,
        sectors: usize,
    },

    #[error("required row '{key}' not found")]
    MissingRow { key: String },

    #[error(transparent)]
    Matrix(#[from] MatrixError),
}

/// A rectangular numeric table with raw string keys on both axes, as an
/// out-of-scope file parser would produce it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTable {
    values: DMatrix<f64>,
    row_keys: Vec<String>,
    col_keys: Vec<String>,
}

impl RawTable {
    pub fn new(
        values: DMatrix<f64>,
        row_keys: Vec<String>,
        col_keys: Vec<String>,
    ) -> Result<Self, ProviderError> {
        if values.shape() != (row_keys.len(), col_keys.len()) {
            return Err(ProviderError::TableShape {
                key_rows: row_keys.len(),
                key_cols: col_keys.len(),
                array_rows: values.nrows(),
                array_cols: values.ncols(),
            });
        }
        Ok(Self { values, row_keys, col_keys })
    }

    pub fn nrows(&self) -> usize { self.values.nrows() }
    pub fn ncols(&self) -> usize { self.values.ncols() }
    pub fn row_keys(&self) -> &[String] { &self.row_keys }
    pub fn col_keys(&self) -> &[String] { &self.col_keys }

    /// Position of the first row whose key matches one of `keys`.
    pub(crate) fn find_row(&self, keys: &[&str]) -> Option<usize> {
        self.row_keys.iter().position(|k| keys.contains(&k.as_str()))
    }

    /// Copies a rectangular block out of the table, labeling both axes by
    /// splitting each key on the first underscore.
    pub(crate) fn block(
        &self,
        name: &str,
        rows: Range<usize>,
        cols: Range<usize>,
    ) -> Result<LabeledMatrix, ProviderError> {
        let data = self
            .values
            .view((rows.start, cols.start), (rows.len(), cols.len()))
            .into_owned();
        let row_labels = self.row_keys[rows].iter().map(|k| split_pair(k)).collect();
        let col_labels = self.col_keys[cols].iter().map(|k| split_pair(k)).collect();
        Ok(LabeledMatrix::new(name, data, row_labels, col_labels)?)
    }
}

/// Shared per-dataset metadata the carving functions stamp onto the blocks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderMeta {
    pub num_regions: usize,
    pub num_sectors: usize,
    pub sector_name_mapping: BTreeMap<String, String>,
    pub demand_items: BTreeMap<String, String>,
    pub unit: String,
    pub reference: String,
    pub contact: String,
}

/// `"AU_A01"` becomes a (region, sector) pair; keys without an underscore
/// stay bare.
pub(crate) fn split_pair(key: &str) -> Label {
    match key.split_once('_') {
        Some((region, sector)) => Label::pair(region, sector),
        None => Label::key(key),
    }
}

pub(crate) fn require_at_least(
    table: &RawTable,
    need_rows: usize,
    need_cols: usize,
    meta: &ProviderMeta,
) -> Result<(), ProviderError> {
    if table.nrows() < need_rows || table.ncols() < need_cols {
        return Err(ProviderError::TableTooSmall {
            rows: table.nrows(),
            cols: table.ncols(),
            need_rows,
            need_cols,
            regions: meta.num_regions,
            sectors: meta.num_sectors,
        });
    }
    Ok(())
}
