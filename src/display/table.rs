//! table.rs
//! Result tables produced by the shock engine: one row per region-sector
//! with baseline and counterfactual output, plus the grouped impact
//! summary. Both render as aligned text and export to JSON.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShockRow {
    pub region: String,
    pub sector: String,
    pub x: f64,
    pub x_new: f64,
}

/// Tabular shock result: `region`, `sector`, baseline `x`, new `x_new`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ShockTable {
    rows: Vec<ShockRow>,
}

impl ShockTable {
    pub fn new(rows: Vec<ShockRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[ShockRow] { &self.rows }
    pub fn len(&self) -> usize { self.rows.len() }
    pub fn is_empty(&self) -> bool { self.rows.is_empty() }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.rows)
    }
}

impl fmt::Display for ShockTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{: <8}{: <10}{: >14}{: >14}", "region", "sector", "x", "x_new")?;
        for row in &self.rows {
            writeln!(
                f,
                "{: <8}{: <10}{: >14.3}{: >14.3}",
                row.region, row.sector, row.x, row.x_new
            )?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactRow {
    /// Region key or mapped sector name, depending on the grouping.
    pub key: String,
    /// Aggregated weight before the shock (GVA or final demand).
    pub baseline: f64,
    /// Aggregated weight after applying the relative output change.
    pub shocked: f64,
    /// Percentage change, 0 where the baseline weight is 0.
    pub pct_change: f64,
}

/// Grouped impact summary, sorted by percentage change (descending).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ImpactTable {
    rows: Vec<ImpactRow>,
}

impl ImpactTable {
    pub fn new(rows: Vec<ImpactRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[ImpactRow] { &self.rows }
    pub fn len(&self) -> usize { self.rows.len() }
    pub fn is_empty(&self) -> bool { self.rows.is_empty() }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.rows)
    }
}

impl fmt::Display for ImpactTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{: <28}{: >14}{: >14}{: >10}", "key", "baseline", "shocked", "% change")?;
        for row in &self.rows {
            writeln!(
                f,
                "{: <28}{: >14.3}{: >14.3}{: >10.3}",
                row.key, row.baseline, row.shocked, row.pct_change
            )?;
        }
        Ok(())
    }
}
