//! io_model.rs
//! Derives the full coefficient/inverse matrix set from provider blocks.
//!
//! The derivation is provider-agnostic: every dataset that reaches this
//! point has already been carved into the same block shapes, so Figaro,
//! OECD and ExioBase models are constructed by exactly the same code.

use crate::matrix::{Label, LabeledMatrix};
use crate::model::blocks::{ModelBlocks, OutputBlock};
use crate::model::error::ModelError;
use nalgebra::{DMatrix, DVector};
use std::collections::{BTreeMap, BTreeSet};

/// One multi-region IO dataset in matrix form, immutable once constructed.
///
/// Field naming follows the standard IO notation: `Z` intermediate use,
/// `X` output, `V` value added, `FD` final demand, `A`/`L` the Leontief
/// pair, `B`/`G` the Ghosh pair. Accessors carry the spelled-out names.
#[derive(Debug, Clone)]
pub struct IoModel {
    z: LabeledMatrix,
    x: LabeledMatrix,
    v: LabeledMatrix,
    fd: LabeledMatrix,
    fd_gran: LabeledMatrix,
    fd_region: LabeledMatrix,
    a: LabeledMatrix,
    l: LabeledMatrix,
    b: LabeledMatrix,
    g: LabeledMatrix,
    rs: usize,
    regions: Vec<String>,
    sectors: Vec<String>,
    sector_name_mapping: BTreeMap<String, String>,
    demand_items: BTreeMap<String, String>,
    add: BTreeMap<String, LabeledMatrix>,
    unit: String,
    reference: String,
    contact: String,
}

impl IoModel {
    /// Builds the derived matrix set from raw provider blocks.
    ///
    /// Validation is eager: every block shape and the region-sector
    /// universe are checked before any coefficient arithmetic starts.
    /// The only failure past validation is a singular `(I - A)` or
    /// `(I - B)`, surfaced as [`MatrixError::Singular`] and never retried.
    pub fn from_blocks(blocks: ModelBlocks) -> Result<IoModel, ModelError> {
        let z = blocks.intermediate_use;
        let (rs, cols) = z.data().shape();
        if rs != cols {
            return Err(ModelError::NotSquare { rows: rs, cols });
        }

        // The region-sector universe comes from Z's row labels: every row
        // must be a (region, sector) pair and every pair must occur once.
        let mut regions = BTreeSet::new();
        let mut sectors = BTreeSet::new();
        let mut seen = BTreeSet::new();
        for (i, label) in z.rows().iter().enumerate() {
            let (Some(r), Some(s)) = (label.region(), label.sector()) else {
                return Err(ModelError::NonPairLabel {
                    name: z.name().to_string(),
                    index: i,
                });
            };
            regions.insert(r.to_string());
            sectors.insert(s.to_string());
            seen.insert((r.to_string(), s.to_string()));
        }
        let regions: Vec<String> = regions.into_iter().collect();
        let sectors: Vec<String> = sectors.into_iter().collect();
        if regions.len() * sectors.len() != rs
            || seen.len() != rs
            || blocks.num_regions * blocks.num_sectors != rs
        {
            return Err(ModelError::UniverseMismatch {
                regions: blocks.num_regions,
                sectors: blocks.num_sectors,
                rs,
            });
        }

        let fd_gran = blocks.final_demand;
        if fd_gran.nrows() != rs {
            return Err(ModelError::BlockShape {
                name: fd_gran.name().to_string(),
                expected: rs,
                actual: fd_gran.nrows(),
            });
        }

        let fd_vec = DVector::from_fn(rs, |i, _| fd_gran.data().row(i).sum());

        let x_vec = match blocks.output {
            OutputBlock::Explicit(out) => {
                if out.nrows() != rs || out.ncols() != 1 {
                    return Err(ModelError::BlockShape {
                        name: out.name().to_string(),
                        expected: rs,
                        actual: out.nrows(),
                    });
                }
                out.data().column(0).into_owned()
            }
            OutputBlock::DemandPlusIntermediate => {
                &fd_vec + DVector::from_fn(rs, |i, _| z.data().row(i).sum())
            }
        };

        // Value added: output minus intermediate input cost. Negative
        // entries are economically meaningful and retained as-is.
        let v_vec = DVector::from_fn(rs, |j, _| x_vec[j] - z.data().column(j).sum());

        // Coefficient matrices. Zero-output positions divide by 1 so the
        // coefficient stays finite instead of turning into NaN/Inf.
        let x_filled = x_vec.map(|v| if v == 0.0 { 1.0 } else { v });
        let a_data = DMatrix::from_fn(rs, rs, |i, j| z.get(i, j) / x_filled[j]);
        let b_data = DMatrix::from_fn(rs, rs, |i, j| z.get(i, j) / x_filled[i]);

        let row_labels = z.rows().to_vec();
        let col_labels = z.columns().to_vec();

        let identity = DMatrix::identity(rs, rs);
        let l_data = LabeledMatrix::new(
            "I - A",
            &identity - &a_data,
            row_labels.clone(),
            col_labels.clone(),
        )?
        .inverse()?;
        let g_data = LabeledMatrix::new(
            "I - B",
            &identity - &b_data,
            row_labels.clone(),
            col_labels.clone(),
        )?
        .inverse()?;

        // Final demand collapsed to destination regions, sorted by region key.
        let mut groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (j, label) in fd_gran.columns().iter().enumerate() {
            let Some(r) = label.region() else {
                return Err(ModelError::NonPairLabel {
                    name: fd_gran.name().to_string(),
                    index: j,
                });
            };
            groups.entry(r.to_string()).or_default().push(j);
        }
        let fd_region_cols: Vec<Label> = groups.keys().map(Label::key).collect();
        let group_indices: Vec<&Vec<usize>> = groups.values().collect();
        let fd_region_data = DMatrix::from_fn(rs, groups.len(), |i, g| {
            group_indices[g].iter().map(|&j| fd_gran.get(i, j)).sum()
        });

        Ok(IoModel {
            x: LabeledMatrix::new("Output", DMatrix::from_column_slice(rs, 1, x_vec.as_slice()), row_labels.clone(), vec![Label::key("X")])?,
            v: LabeledMatrix::new("GVA", DMatrix::from_row_slice(1, rs, v_vec.as_slice()), vec![Label::key("GVA")], col_labels.clone())?,
            fd: LabeledMatrix::new("Final demand", DMatrix::from_column_slice(rs, 1, fd_vec.as_slice()), row_labels.clone(), vec![Label::key("FD")])?,
            fd_region: LabeledMatrix::new("Final demand by region", fd_region_data, row_labels.clone(), fd_region_cols)?,
            a: LabeledMatrix::new("Technical coefficients", a_data, row_labels.clone(), col_labels.clone())?,
            l: LabeledMatrix::new("Leontief inverse", l_data, row_labels.clone(), col_labels.clone())?,
            b: LabeledMatrix::new("Allocation coefficients", b_data, row_labels.clone(), col_labels.clone())?,
            g: LabeledMatrix::new("Output inverse", g_data, row_labels, col_labels)?,
            z,
            fd_gran,
            rs,
            regions,
            sectors,
            sector_name_mapping: blocks.sector_name_mapping,
            demand_items: blocks.demand_items,
            add: blocks.add,
            unit: blocks.unit,
            reference: blocks.reference,
            contact: blocks.contact,
        })
    }

    // --- Accessors ---

    /// Intermediate-use flows (Z).
    pub fn intermediate_use(&self) -> &LabeledMatrix { &self.z }
    /// Total output per region-sector (X), shape `(rs, 1)`.
    pub fn output(&self) -> &LabeledMatrix { &self.x }
    /// Gross value added (V), shape `(1, rs)`.
    pub fn value_added(&self) -> &LabeledMatrix { &self.v }
    /// Total final demand per region-sector (FD), shape `(rs, 1)`.
    pub fn final_demand(&self) -> &LabeledMatrix { &self.fd }
    /// Final demand by (destination region, demand item) (FD_GRAN).
    pub fn final_demand_granular(&self) -> &LabeledMatrix { &self.fd_gran }
    /// Final demand collapsed to destination regions (FD_REGION).
    pub fn final_demand_by_region(&self) -> &LabeledMatrix { &self.fd_region }
    /// Technical coefficients (A).
    pub fn technical_coefficients(&self) -> &LabeledMatrix { &self.a }
    /// Leontief inverse (L).
    pub fn leontief_inverse(&self) -> &LabeledMatrix { &self.l }
    /// Allocation coefficients (B).
    pub fn allocation_coefficients(&self) -> &LabeledMatrix { &self.b }
    /// Output inverse (G).
    pub fn output_inverse(&self) -> &LabeledMatrix { &self.g }

    /// Size of the region-sector universe.
    pub fn rs(&self) -> usize { self.rs }
    /// Distinct region keys, sorted.
    pub fn regions(&self) -> &[String] { &self.regions }
    /// Distinct sector keys, sorted.
    pub fn sectors(&self) -> &[String] { &self.sectors }
    pub fn sector_name_mapping(&self) -> &BTreeMap<String, String> { &self.sector_name_mapping }
    pub fn demand_items(&self) -> &BTreeMap<String, String> { &self.demand_items }
    /// Provider-specific auxiliary matrices.
    pub fn add(&self) -> &BTreeMap<String, LabeledMatrix> { &self.add }
    pub fn unit(&self) -> &str { &self.unit }
    pub fn reference(&self) -> &str { &self.reference }
    pub fn contact(&self) -> &str { &self.contact }
}
