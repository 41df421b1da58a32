//! shock.rs
//! Counterfactual output under Leontief demand-side or Ghosh supply-side
//! shocks.
//!
//! A shock is a percentage change applied to final demand (Leontief) or
//! primary inputs (Ghosh) at selected region-sector positions. The shock
//! never mutates the model; every call returns a fresh output vector.

use crate::display::{ImpactRow, ImpactTable, ShockRow, ShockTable};
use crate::matrix::{Label, LabeledMatrix};
use crate::model::error::{check_subset, ModelError};
use crate::model::io_model::IoModel;
use nalgebra::{DMatrix, DVector};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Propagation model for a shock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShockMode {
    /// Demand-side: `x_new = L (FD * s) + X`.
    Leontief,
    /// Supply-side: `x_new = G' (V' * s) + X`.
    Ghosh,
}

impl FromStr for ShockMode {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "leontief" => Ok(ShockMode::Leontief),
            "ghosh" => Ok(ShockMode::Ghosh),
            other => Err(ModelError::UnknownMode(other.to_string())),
        }
    }
}

impl fmt::Display for ShockMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShockMode::Leontief => write!(f, "leontief"),
            ShockMode::Ghosh => write!(f, "ghosh"),
        }
    }
}

/// Axis for the impact summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupBy {
    Region,
    Sector,
}

impl FromStr for GroupBy {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "region" => Ok(GroupBy::Region),
            "sector" => Ok(GroupBy::Sector),
            other => Err(ModelError::UnknownGroupBy(other.to_string())),
        }
    }
}

/// Shock specification. Exactly one form is honored: a custom per-position
/// percentage vector overrides the uniform triple; otherwise all three
/// uniform fields must be present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShockSpec {
    /// Uniform shock in percent of final demand / primary inputs.
    pub shock_percent: Option<f64>,
    /// Regions the uniform shock targets.
    pub regions: Option<Vec<String>>,
    /// Sectors the uniform shock targets.
    pub sectors: Option<Vec<String>>,
    /// Per-position percentages of length `rs`; overrides the other fields.
    pub custom_shock_vector: Option<Vec<f64>>,
}

impl ShockSpec {
    pub fn uniform<R, S>(shock_percent: f64, regions: R, sectors: S) -> Self
    where
        R: IntoIterator,
        R::Item: Into<String>,
        S: IntoIterator,
        S::Item: Into<String>,
    {
        Self {
            shock_percent: Some(shock_percent),
            regions: Some(regions.into_iter().map(Into::into).collect()),
            sectors: Some(sectors.into_iter().map(Into::into).collect()),
            custom_shock_vector: None,
        }
    }

    pub fn custom(vector: Vec<f64>) -> Self {
        Self {
            custom_shock_vector: Some(vector),
            ..Self::default()
        }
    }
}

impl IoModel {
    /// Resolves a [`ShockSpec`] into the per-position shock fraction vector.
    fn shock_vector(&self, spec: &ShockSpec) -> Result<DVector<f64>, ModelError> {
        if let Some(custom) = &spec.custom_shock_vector {
            if custom.len() != self.rs() {
                return Err(ModelError::ShockVectorLength {
                    expected: self.rs(),
                    actual: custom.len(),
                });
            }
            return Ok(DVector::from_column_slice(custom) / 100.0);
        }

        let (Some(pct), Some(regions), Some(sectors)) = (
            spec.shock_percent,
            spec.regions.as_deref(),
            spec.sectors.as_deref(),
        ) else {
            return Err(ModelError::MissingShockParameters);
        };
        check_subset("regions", regions, self.regions())?;
        check_subset("sectors", sectors, self.sectors())?;

        let row_labels = self.intermediate_use().rows();
        let vector = DVector::from_fn(self.rs(), |i, _| match &row_labels[i] {
            Label::Pair { region, sector }
                if regions.contains(region) && sectors.contains(sector) =>
            {
                pct
            }
            _ => 0.0,
        });
        Ok(vector / 100.0)
    }

    /// New output vector under the given shock, aligned with `X`'s rows.
    pub fn compute_shock(
        &self,
        mode: ShockMode,
        spec: &ShockSpec,
    ) -> Result<LabeledMatrix, ModelError> {
        let shock = self.shock_vector(spec)?;
        let x = DVector::from_column_slice(self.output().data().as_slice());

        let x_new = match mode {
            ShockMode::Leontief => {
                let fd = DVector::from_column_slice(self.final_demand().data().as_slice());
                self.leontief_inverse().data() * fd.component_mul(&shock) + x
            }
            ShockMode::Ghosh => {
                let g_t = self.output_inverse().transpose();
                let v_t = self.value_added().transpose();
                let v_col = DVector::from_column_slice(v_t.data().as_slice());
                g_t.data() * v_col.component_mul(&shock) + x
            }
        };

        let data = DMatrix::from_column_slice(self.rs(), 1, x_new.as_slice());
        LabeledMatrix::new(
            "Shocked output",
            data,
            self.intermediate_use().rows().to_vec(),
            vec![Label::key("X_NEW")],
        )
        .map_err(Into::into)
    }

    /// Evaluates several independent shock scenarios in parallel.
    pub fn compute_shock_batch(
        &self,
        mode: ShockMode,
        specs: &[ShockSpec],
    ) -> Result<Vec<LabeledMatrix>, ModelError> {
        specs
            .par_iter()
            .map(|spec| self.compute_shock(mode, spec))
            .collect()
    }

    /// Tabulates a shocked output vector against the baseline.
    pub fn shock_to_table(&self, x_new: &LabeledMatrix) -> ShockTable {
        let baseline = self.output().flatten();
        let shocked = x_new.flatten();
        let rows = self
            .intermediate_use()
            .rows()
            .iter()
            .zip(baseline.iter().zip(shocked.iter()))
            .map(|(label, (&x, &xn))| {
                let (region, sector) = match label {
                    Label::Pair { region, sector } => (region.clone(), sector.clone()),
                    Label::Key(k) => (k.clone(), String::new()),
                };
                ShockRow { region, sector, x, x_new: xn }
            })
            .collect();
        ShockTable::new(rows)
    }

    /// Executes a Leontief demand shock and tabulates the result.
    pub fn leontief_demand_shock(&self, spec: &ShockSpec) -> Result<ShockTable, ModelError> {
        let x_new = self.compute_shock(ShockMode::Leontief, spec)?;
        Ok(self.shock_to_table(&x_new))
    }

    /// Executes a Ghosh supply shock and tabulates the result.
    pub fn ghosh_supply_shock(&self, spec: &ShockSpec) -> Result<ShockTable, ModelError> {
        let x_new = self.compute_shock(ShockMode::Ghosh, spec)?;
        Ok(self.shock_to_table(&x_new))
    }

    /// Summarizes a shocked output vector as the relative change in GVA
    /// (Leontief) or final demand (Ghosh), grouped by region or sector and
    /// restricted to the given reporting regions.
    ///
    /// Sector keys are mapped through the sector-name table (truncated to
    /// 25 characters) and only the 20 largest movers are kept when
    /// grouping by sector.
    pub fn shock_impact(
        &self,
        x_new: &LabeledMatrix,
        mode: ShockMode,
        by: GroupBy,
        regions: &[String],
    ) -> Result<ImpactTable, ModelError> {
        check_subset("regions", regions, self.regions())?;

        let baseline = self.output().flatten();
        let shocked = x_new.flatten();
        let weights = match mode {
            ShockMode::Leontief => self.value_added().flatten(),
            ShockMode::Ghosh => self.final_demand().flatten(),
        };

        let mut groups: BTreeMap<String, (f64, f64)> = BTreeMap::new();
        for (i, label) in self.intermediate_use().rows().iter().enumerate() {
            let (Some(region), Some(sector)) = (label.region(), label.sector()) else {
                continue;
            };
            if !regions.contains(&region.to_string()) {
                continue;
            }
            let diff = if baseline[i] != 0.0 {
                shocked[i] / baseline[i] - 1.0
            } else {
                0.0
            };
            let key = match by {
                GroupBy::Region => region.to_string(),
                GroupBy::Sector => self
                    .sector_name_mapping()
                    .get(sector)
                    .map(|name| name.chars().take(25).collect())
                    .unwrap_or_else(|| sector.to_string()),
            };
            let entry = groups.entry(key).or_insert((0.0, 0.0));
            entry.0 += weights[i];
            entry.1 += weights[i] * (1.0 + diff);
        }

        let mut rows: Vec<ImpactRow> = groups
            .into_iter()
            .map(|(key, (baseline, shocked))| {
                let pct_change = if baseline != 0.0 {
                    100.0 * (shocked / baseline - 1.0)
                } else {
                    0.0
                };
                ImpactRow { key, baseline, shocked, pct_change }
            })
            .collect();
        rows.sort_by(|a, b| {
            b.pct_change
                .partial_cmp(&a.pct_change)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        if by == GroupBy::Sector && rows.len() > 20 {
            let mean: f64 =
                rows.iter().map(|r| r.pct_change).sum::<f64>() / rows.len() as f64;
            if mean < 0.0 {
                rows.drain(..rows.len() - 20);
            } else {
                rows.truncate(20);
            }
        }

        Ok(ImpactTable::new(rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::testkit::demo_model;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[rstest]
    #[case("leontief", ShockMode::Leontief)]
    #[case("ghosh", ShockMode::Ghosh)]
    fn mode_parses_known_names(#[case] input: &str, #[case] expected: ShockMode) {
        assert_eq!(input.parse::<ShockMode>().unwrap(), expected);
    }

    #[rstest]
    #[case("keynes")]
    #[case("Leontief")]
    #[case("")]
    fn mode_rejects_unknown_names(#[case] input: &str) {
        let err = input.parse::<ShockMode>().unwrap_err();
        assert_eq!(err, ModelError::UnknownMode(input.to_string()));
    }

    #[test]
    fn uniform_shock_scales_all_output() {
        // A +10% shock everywhere scales output by exactly 1.1 in both
        // modes, since L @ FD == X and G' @ V' == X.
        let m = demo_model();
        let spec = ShockSpec::uniform(10.0, ["AU", "CN"], ["A01", "B05"]);
        let x = m.output().flatten();
        for mode in [ShockMode::Leontief, ShockMode::Ghosh] {
            let x_new = m.compute_shock(mode, &spec).unwrap();
            for (xn, x0) in x_new.flatten().iter().zip(&x) {
                assert_relative_eq!(*xn, 1.1 * x0, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn zero_percent_shock_returns_baseline() {
        let m = demo_model();
        let spec = ShockSpec::uniform(0.0, ["AU", "CN"], ["A01", "B05"]);
        let x_new = m.compute_shock(ShockMode::Leontief, &spec).unwrap();
        assert_eq!(x_new.flatten(), m.output().flatten());
    }

    #[test]
    fn uniform_and_custom_specs_are_equivalent() {
        let m = demo_model();
        let uniform = ShockSpec::uniform(-10.0, ["CN"], ["A01", "B05"]);
        // Rows are (AU,A01), (AU,B05), (CN,A01), (CN,B05).
        let custom = ShockSpec::custom(vec![0.0, 0.0, -10.0, -10.0]);
        for mode in [ShockMode::Leontief, ShockMode::Ghosh] {
            let a = m.compute_shock(mode, &uniform).unwrap();
            let b = m.compute_shock(mode, &custom).unwrap();
            for (va, vb) in a.flatten().iter().zip(b.flatten()) {
                assert_relative_eq!(*va, vb, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn custom_vector_overrides_uniform_fields() {
        let m = demo_model();
        let mut spec = ShockSpec::uniform(50.0, ["AU"], ["A01"]);
        spec.custom_shock_vector = Some(vec![0.0; 4]);
        let x_new = m.compute_shock(ShockMode::Leontief, &spec).unwrap();
        assert_eq!(x_new.flatten(), m.output().flatten());
    }

    #[test]
    fn missing_parameters_fail_validation() {
        let m = demo_model();
        let err = m
            .compute_shock(ShockMode::Leontief, &ShockSpec::default())
            .unwrap_err();
        assert_eq!(err, ModelError::MissingShockParameters);

        let partial = ShockSpec {
            shock_percent: Some(5.0),
            ..ShockSpec::default()
        };
        let err = m.compute_shock(ShockMode::Ghosh, &partial).unwrap_err();
        assert_eq!(err, ModelError::MissingShockParameters);
    }

    #[test]
    fn unknown_selectors_are_listed() {
        let m = demo_model();
        let spec = ShockSpec::uniform(5.0, ["CN", "XX"], ["A01"]);
        let err = m.compute_shock(ShockMode::Leontief, &spec).unwrap_err();
        assert_eq!(
            err,
            ModelError::UnknownKeys { kind: "regions", keys: vec!["XX".into()] }
        );

        let spec = ShockSpec::uniform(5.0, ["CN"], ["Z99"]);
        let err = m.compute_shock(ShockMode::Leontief, &spec).unwrap_err();
        assert_eq!(
            err,
            ModelError::UnknownKeys { kind: "sectors", keys: vec!["Z99".into()] }
        );
    }

    #[test]
    fn custom_vector_length_is_validated() {
        let m = demo_model();
        let err = m
            .compute_shock(ShockMode::Leontief, &ShockSpec::custom(vec![1.0; 3]))
            .unwrap_err();
        assert_eq!(err, ModelError::ShockVectorLength { expected: 4, actual: 3 });
    }

    #[test]
    fn batch_matches_individual_computation() {
        let m = demo_model();
        let specs = vec![
            ShockSpec::uniform(10.0, ["AU"], ["A01"]),
            ShockSpec::uniform(-5.0, ["CN"], ["A01", "B05"]),
            ShockSpec::custom(vec![1.0, 2.0, 3.0, 4.0]),
        ];
        let batch = m.compute_shock_batch(ShockMode::Leontief, &specs).unwrap();
        assert_eq!(batch.len(), 3);
        for (spec, got) in specs.iter().zip(&batch) {
            let single = m.compute_shock(ShockMode::Leontief, spec).unwrap();
            assert_eq!(got.flatten(), single.flatten());
        }
    }

    #[test]
    fn batch_fails_on_any_invalid_spec() {
        let m = demo_model();
        let specs = vec![
            ShockSpec::uniform(10.0, ["AU"], ["A01"]),
            ShockSpec::default(),
        ];
        let err = m.compute_shock_batch(ShockMode::Leontief, &specs).unwrap_err();
        assert_eq!(err, ModelError::MissingShockParameters);
    }

    #[test]
    fn shock_table_aligns_with_row_order() {
        let m = demo_model();
        let table = m
            .leontief_demand_shock(&ShockSpec::uniform(10.0, ["AU", "CN"], ["A01", "B05"]))
            .unwrap();
        assert_eq!(table.len(), 4);
        let first = &table.rows()[0];
        assert_eq!((first.region.as_str(), first.sector.as_str()), ("AU", "A01"));
        assert_relative_eq!(first.x_new, 1.1 * first.x, epsilon = 1e-9);
    }

    #[test]
    fn impact_by_region_reports_uniform_change() {
        let m = demo_model();
        let x_new = m
            .compute_shock(ShockMode::Leontief, &ShockSpec::uniform(10.0, ["AU", "CN"], ["A01", "B05"]))
            .unwrap();
        let summary = m
            .shock_impact(&x_new, ShockMode::Leontief, GroupBy::Region, &["AU".into(), "CN".into()])
            .unwrap();
        assert_eq!(summary.len(), 2);
        for row in summary.rows() {
            assert_relative_eq!(row.pct_change, 10.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn impact_by_sector_maps_and_truncates_names() {
        let m = demo_model();
        let x_new = m
            .compute_shock(ShockMode::Leontief, &ShockSpec::uniform(10.0, ["AU"], ["A01"]))
            .unwrap();
        let summary = m
            .shock_impact(&x_new, ShockMode::Leontief, GroupBy::Sector, &["AU".into()])
            .unwrap();
        let keys: Vec<&str> = summary.rows().iter().map(|r| r.key.as_str()).collect();
        // 25-char truncation of the A01 mapping.
        assert!(keys.contains(&"Products of agriculture, "));
        assert!(keys.contains(&"Coal and lignite"));
    }

    #[test]
    fn impact_rejects_unknown_reporting_regions() {
        let m = demo_model();
        let x_new = m
            .compute_shock(ShockMode::Leontief, &ShockSpec::uniform(10.0, ["AU"], ["A01"]))
            .unwrap();
        let err = m
            .shock_impact(&x_new, ShockMode::Leontief, GroupBy::Region, &["QQ".into()])
            .unwrap_err();
        assert_eq!(
            err,
            ModelError::UnknownKeys { kind: "regions", keys: vec!["QQ".into()] }
        );
    }
}
