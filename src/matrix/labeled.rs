//! labeled.rs
//! A dense 2-D array tagged with row and column label sequences.
//!
//! The numeric buffer and its labels live side by side in one struct;
//! derived operations (transpose, inverse) return new values and never
//! mutate the receiver.

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MatrixError {
    #[error("'{name}': labels imply shape ({label_rows}, {label_cols}), array is ({array_rows}, {array_cols})")]
    ShapeMismatch {
        name: String,
        label_rows: usize,
        label_cols: usize,
        array_rows: usize,
        array_cols: usize,
    },
    #[error("'{name}' is singular and cannot be inverted")]
    Singular { name: String },
}

/// A row or column label: either a bare key (`"FD"`, `"GVA"`, `"X"`) or a
/// (region, sector) pair identifying one cell of the region-sector universe.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Label {
    Key(String),
    Pair { region: String, sector: String },
}

impl Label {
    pub fn key(key: impl Into<String>) -> Self {
        Label::Key(key.into())
    }

    pub fn pair(region: impl Into<String>, sector: impl Into<String>) -> Self {
        Label::Pair {
            region: region.into(),
            sector: sector.into(),
        }
    }

    pub fn region(&self) -> Option<&str> {
        match self {
            Label::Key(_) => None,
            Label::Pair { region, .. } => Some(region),
        }
    }

    pub fn sector(&self) -> Option<&str> {
        match self {
            Label::Key(_) => None,
            Label::Pair { sector, .. } => Some(sector),
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Key(k) => write!(f, "{}", k),
            Label::Pair { region, sector } => write!(f, "{}_{}", region, sector),
        }
    }
}

/// A named 2-D array whose axes carry label sequences.
///
/// Invariant: `data.shape() == (rows.len(), columns.len())`, enforced at
/// construction. Labels are immutable afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledMatrix {
    name: String,
    data: DMatrix<f64>,
    rows: Vec<Label>,
    columns: Vec<Label>,
}

impl LabeledMatrix {
    pub fn new(
        name: impl Into<String>,
        data: DMatrix<f64>,
        rows: Vec<Label>,
        columns: Vec<Label>,
    ) -> Result<Self, MatrixError> {
        let name = name.into();
        if data.shape() != (rows.len(), columns.len()) {
            return Err(MatrixError::ShapeMismatch {
                name,
                label_rows: rows.len(),
                label_cols: columns.len(),
                array_rows: data.nrows(),
                array_cols: data.ncols(),
            });
        }
        Ok(Self { name, data, rows, columns })
    }

    // --- Accessors ---

    pub fn name(&self) -> &str { &self.name }
    pub fn data(&self) -> &DMatrix<f64> { &self.data }
    pub fn rows(&self) -> &[Label] { &self.rows }
    pub fn columns(&self) -> &[Label] { &self.columns }
    pub fn nrows(&self) -> usize { self.data.nrows() }
    pub fn ncols(&self) -> usize { self.data.ncols() }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[(row, col)]
    }

    // --- Derived copies ---

    /// Numeric matrix inverse. The result is positionally aligned with the
    /// original row/column order; no labels are carried.
    pub fn inverse(&self) -> Result<DMatrix<f64>, MatrixError> {
        self.data
            .clone()
            .try_inverse()
            .ok_or_else(|| MatrixError::Singular { name: self.name.clone() })
    }

    /// New matrix with the array transposed and the label sequences swapped.
    pub fn transpose(&self) -> LabeledMatrix {
        LabeledMatrix {
            name: self.name.clone(),
            data: self.data.transpose(),
            rows: self.columns.clone(),
            columns: self.rows.clone(),
        }
    }

    /// The coefficients as a flat row-major sequence, stripped of labels.
    ///
    /// nalgebra stores column-major, so this walks rows explicitly.
    pub fn flatten(&self) -> Vec<f64> {
        let mut out = Vec::with_capacity(self.data.len());
        for i in 0..self.data.nrows() {
            for j in 0..self.data.ncols() {
                out.push(self.data[(i, j)]);
            }
        }
        out
    }
}
