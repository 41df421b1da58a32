//! trade.rs
//! Aggregates trade flow between arbitrary region/sector subsets.
//!
//! Flow is broken down into intermediate use (read from Z) and final
//! demand (read from FD_REGION, which has no sector dimension on the
//! importing side). Selector problems that change the meaning of the
//! query but not its validity are warnings, not errors.

use crate::matrix::Label;
use crate::model::error::{check_subset, ModelError};
use crate::model::io_model::IoModel;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which flow component to sum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum UseType {
    Intermediate,
    Final,
    #[default]
    Both,
}

impl FromStr for UseType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "intermediate" => Ok(UseType::Intermediate),
            "final" => Ok(UseType::Final),
            "both" => Ok(UseType::Both),
            other => Err(ModelError::UnknownUseType(other.to_string())),
        }
    }
}

impl fmt::Display for UseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UseType::Intermediate => write!(f, "intermediate"),
            UseType::Final => write!(f, "final"),
            UseType::Both => write!(f, "both"),
        }
    }
}

/// Builder for a trade-flow aggregation. Sector selectors default to all
/// sectors; single keys go through the singular methods.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TradeFlowQuery {
    pub import_regions: Vec<String>,
    pub export_regions: Vec<String>,
    pub import_sectors: Option<Vec<String>>,
    pub export_sectors: Option<Vec<String>>,
    pub use_type: UseType,
}

impl TradeFlowQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn import_regions<I>(mut self, regions: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.import_regions = regions.into_iter().map(Into::into).collect();
        self
    }

    pub fn import_region(self, region: impl Into<String>) -> Self {
        self.import_regions([region.into()])
    }

    pub fn export_regions<I>(mut self, regions: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.export_regions = regions.into_iter().map(Into::into).collect();
        self
    }

    pub fn export_region(self, region: impl Into<String>) -> Self {
        self.export_regions([region.into()])
    }

    pub fn import_sectors<I>(mut self, sectors: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.import_sectors = Some(sectors.into_iter().map(Into::into).collect());
        self
    }

    pub fn import_sector(self, sector: impl Into<String>) -> Self {
        self.import_sectors([sector.into()])
    }

    pub fn export_sectors<I>(mut self, sectors: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.export_sectors = Some(sectors.into_iter().map(Into::into).collect());
        self
    }

    pub fn export_sector(self, sector: impl Into<String>) -> Self {
        self.export_sectors([sector.into()])
    }

    pub fn use_type(mut self, use_type: UseType) -> Self {
        self.use_type = use_type;
        self
    }
}

fn label_in(label: &Label, regions: &[String], sectors: &[String]) -> bool {
    match label {
        Label::Pair { region, sector } => regions.contains(region) && sectors.contains(sector),
        Label::Key(_) => false,
    }
}

impl IoModel {
    /// Sums trade flow from the exporting region-sector set to the
    /// importing one, per the query's `use_type`.
    pub fn trade_flow(&self, query: &TradeFlowQuery) -> Result<f64, ModelError> {
        check_subset("regions", &query.import_regions, self.regions())?;
        check_subset("regions", &query.export_regions, self.regions())?;
        if let Some(sectors) = &query.import_sectors {
            check_subset("sectors", sectors, self.sectors())?;
        }
        if let Some(sectors) = &query.export_sectors {
            check_subset("sectors", sectors, self.sectors())?;
        }

        let overlap: Vec<&String> = query
            .import_regions
            .iter()
            .filter(|r| query.export_regions.contains(r))
            .collect();
        if !overlap.is_empty() {
            log::warn!(
                "overlap between import_regions and export_regions: {}",
                overlap.iter().map(|r| r.as_str()).collect::<Vec<_>>().join(", ")
            );
        }
        if query.import_sectors.is_some() && query.use_type != UseType::Intermediate {
            log::warn!(
                "import_sectors only applies to intermediate use; the final-demand \
                 component is selected by import_regions alone"
            );
        }

        let all_sectors = self.sectors();
        let import_sectors = query.import_sectors.as_deref().unwrap_or(all_sectors);
        let export_sectors = query.export_sectors.as_deref().unwrap_or(all_sectors);

        let z = self.intermediate_use();
        let export_rows: Vec<usize> = z
            .rows()
            .iter()
            .enumerate()
            .filter(|(_, l)| label_in(l, &query.export_regions, export_sectors))
            .map(|(i, _)| i)
            .collect();

        let intermediate = || -> f64 {
            let import_cols: Vec<usize> = z
                .columns()
                .iter()
                .enumerate()
                .filter(|(_, l)| label_in(l, &query.import_regions, import_sectors))
                .map(|(j, _)| j)
                .collect();
            export_rows
                .iter()
                .map(|&i| import_cols.iter().map(|&j| z.get(i, j)).sum::<f64>())
                .sum()
        };

        let final_demand = || -> f64 {
            let fdr = self.final_demand_by_region();
            let import_cols: Vec<usize> = fdr
                .columns()
                .iter()
                .enumerate()
                .filter(|(_, l)| match l {
                    Label::Key(region) => query.import_regions.contains(region),
                    Label::Pair { .. } => false,
                })
                .map(|(j, _)| j)
                .collect();
            export_rows
                .iter()
                .map(|&i| import_cols.iter().map(|&j| fdr.get(i, j)).sum::<f64>())
                .sum()
        };

        Ok(match query.use_type {
            UseType::Intermediate => intermediate(),
            UseType::Final => final_demand(),
            UseType::Both => intermediate() + final_demand(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::testkit::{bilateral_model, demo_model};
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[rstest]
    #[case("intermediate", UseType::Intermediate)]
    #[case("final", UseType::Final)]
    #[case("both", UseType::Both)]
    fn use_type_parses_known_names(#[case] input: &str, #[case] expected: UseType) {
        assert_eq!(input.parse::<UseType>().unwrap(), expected);
    }

    #[test]
    fn use_type_rejects_unknown_names() {
        let err = "gross".parse::<UseType>().unwrap_err();
        assert_eq!(err, ModelError::UnknownUseType("gross".to_string()));
    }

    #[test]
    fn bilateral_intermediate_flow_is_recovered() {
        // Z[(CN,A01), (AU,A01)] = 100 is the only flow from CN into AU.
        let m = bilateral_model();
        let query = TradeFlowQuery::new()
            .import_region("AU")
            .export_region("CN")
            .export_sector("A01")
            .use_type(UseType::Intermediate);
        assert_relative_eq!(m.trade_flow(&query).unwrap(), 100.0);
    }

    #[test]
    fn both_decomposes_into_intermediate_plus_final() {
        let m = demo_model();
        let base = TradeFlowQuery::new()
            .import_region("AU")
            .export_region("CN");
        let inter = m
            .trade_flow(&base.clone().use_type(UseType::Intermediate))
            .unwrap();
        let fin = m.trade_flow(&base.clone().use_type(UseType::Final)).unwrap();
        let both = m.trade_flow(&base.use_type(UseType::Both)).unwrap();
        assert_relative_eq!(both, inter + fin, epsilon = 1e-12);
        assert!(inter > 0.0);
        assert!(fin > 0.0);
    }

    #[test]
    fn sector_selectors_restrict_the_sum() {
        let m = demo_model();
        // Exports from CN to AU: Z rows (CN,*), columns (AU,*):
        //   (CN,A01)->(AU,A01) 6, (CN,A01)->(AU,B05) 2,
        //   (CN,B05)->(AU,A01) 1, (CN,B05)->(AU,B05) 3.
        let query = TradeFlowQuery::new()
            .import_region("AU")
            .export_region("CN")
            .export_sector("A01")
            .import_sector("B05")
            .use_type(UseType::Intermediate);
        assert_relative_eq!(m.trade_flow(&query).unwrap(), 2.0);

        let all = TradeFlowQuery::new()
            .import_region("AU")
            .export_region("CN")
            .use_type(UseType::Intermediate);
        assert_relative_eq!(m.trade_flow(&all).unwrap(), 12.0);
    }

    #[test]
    fn final_component_ignores_import_sectors() {
        let m = demo_model();
        let with_sectors = TradeFlowQuery::new()
            .import_region("AU")
            .export_region("CN")
            .import_sector("A01")
            .use_type(UseType::Final);
        let without = TradeFlowQuery::new()
            .import_region("AU")
            .export_region("CN")
            .use_type(UseType::Final);
        // Warns, proceeds, and returns the same value.
        assert_relative_eq!(
            m.trade_flow(&with_sectors).unwrap(),
            m.trade_flow(&without).unwrap()
        );
    }

    #[test]
    fn overlapping_regions_still_return_a_result() {
        let m = demo_model();
        let query = TradeFlowQuery::new()
            .import_regions(["AU", "CN"])
            .export_regions(["AU"])
            .use_type(UseType::Intermediate);
        // AU exports to everyone: row (AU,*) over all columns.
        let total = m.trade_flow(&query).unwrap();
        assert_relative_eq!(total, 10.0 + 5.0 + 2.0 + 1.0 + 4.0 + 8.0 + 3.0 + 2.0);
    }

    #[rstest]
    #[case(&["AU", "XX"][..], &["CN"][..], "regions")]
    #[case(&["AU"][..], &["YY"][..], "regions")]
    fn unknown_regions_fail_validation(
        #[case] imports: &[&str],
        #[case] exports: &[&str],
        #[case] kind: &str,
    ) {
        let m = demo_model();
        let query = TradeFlowQuery::new()
            .import_regions(imports.iter().copied())
            .export_regions(exports.iter().copied());
        let err = m.trade_flow(&query).unwrap_err();
        match err {
            ModelError::UnknownKeys { kind: k, keys } => {
                assert_eq!(k, kind);
                assert!(!keys.is_empty());
            }
            other => panic!("expected UnknownKeys, got {other:?}"),
        }
    }

    #[test]
    fn unknown_sectors_fail_validation() {
        let m = demo_model();
        let query = TradeFlowQuery::new()
            .import_region("AU")
            .export_region("CN")
            .export_sector("Z99");
        let err = m.trade_flow(&query).unwrap_err();
        assert_eq!(
            err,
            ModelError::UnknownKeys { kind: "sectors", keys: vec!["Z99".into()] }
        );
    }

    #[test]
    fn valid_selectors_never_fail_subset_validation() {
        let m = demo_model();
        for region in m.regions() {
            for sector in m.sectors() {
                let query = TradeFlowQuery::new()
                    .import_region(region.clone())
                    .export_region(region.clone())
                    .import_sector(sector.clone())
                    .export_sector(sector.clone())
                    .use_type(UseType::Intermediate);
                assert!(m.trade_flow(&query).is_ok());
            }
        }
    }
}
