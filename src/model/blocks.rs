//! blocks.rs
//! The handoff structure between a provider adapter and model construction.
//!
//! An adapter (or the carving helpers in `providers`) fills these fields
//! from an already-parsed dataset; `IoModel::from_blocks` consumes them.
//! Acquisition, caching and file parsing never enter this crate.

use crate::matrix::LabeledMatrix;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Where the total-output vector comes from.
///
/// OECD and ExioBase tables ship an explicit output column; Figaro tables
/// do not, and output is derived as final demand plus intermediate-use
/// row sums.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OutputBlock {
    /// An explicit `rs x 1` output vector.
    Explicit(LabeledMatrix),
    /// Derive `X = FD + row_sum(Z)`.
    DemandPlusIntermediate,
}

/// Raw blocks plus label metadata for one (provider, version, year, kind)
/// dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelBlocks {
    /// Intermediate-use flows, square over the region-sector universe.
    pub intermediate_use: LabeledMatrix,
    /// Final demand disaggregated by (destination region, demand item).
    pub final_demand: LabeledMatrix,
    pub output: OutputBlock,
    /// Provider-specific auxiliary matrices (value-added detail, taxes
    /// less subsidies, ...), keyed by name.
    pub add: BTreeMap<String, LabeledMatrix>,
    pub sector_name_mapping: BTreeMap<String, String>,
    pub demand_items: BTreeMap<String, String>,
    pub num_regions: usize,
    pub num_sectors: usize,
    /// Monetary unit of the flows, e.g. "Million EUR".
    pub unit: String,
    pub reference: String,
    pub contact: String,
}
