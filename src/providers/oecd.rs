//! Block layout of the OECD inter-country input-output (ICIO) tables.
//!
//! One combined table with an explicit output column at the far right,
//! final demand between the region-sector square and that column, and
//! value-added / taxes-less-subsidies rows underneath (the bottom two
//! rows repeat value added and output and are skipped).

use crate::model::blocks::{ModelBlocks, OutputBlock};
use crate::providers::{require_at_least, ProviderError, ProviderMeta, RawTable};
use std::collections::BTreeMap;

/// Row keys under which the editions publish net value added.
const VALUE_ADDED_KEYS: [&str; 2] = ["VA", "VALU"];

pub fn carve(table: &RawTable, meta: ProviderMeta) -> Result<ModelBlocks, ProviderError> {
    let rs = meta.num_regions * meta.num_sectors;
    require_at_least(table, rs, rs + 2, &meta)?;

    let intermediate_use = table.block("Intermediate use", 0..rs, 0..rs)?;
    let final_demand =
        table.block("Final demand granular", 0..rs, rs..table.ncols() - 1)?;
    let output = table.block("Output", 0..rs, table.ncols() - 1..table.ncols())?;

    let va_idx = table
        .find_row(&VALUE_ADDED_KEYS)
        .ok_or_else(|| ProviderError::MissingRow { key: "VA".to_string() })?;
    let mut add = BTreeMap::new();
    add.insert(
        "VA".to_string(),
        table.block("Value added at basic prices (net)", va_idx..va_idx + 1, 0..rs)?,
    );

    let tls_end = table.nrows().saturating_sub(2);
    if tls_end > rs {
        add.insert(
            "TLS".to_string(),
            table.block(
                "Taxes less subsidies on intermediate and final products",
                rs..tls_end,
                0..table.ncols() - 1,
            )?,
        );
    }

    Ok(ModelBlocks {
        intermediate_use,
        final_demand,
        output: OutputBlock::Explicit(output),
        add,
        sector_name_mapping: meta.sector_name_mapping,
        demand_items: meta.demand_items,
        num_regions: meta.num_regions,
        num_sectors: meta.num_sectors,
        unit: meta.unit,
        reference: meta.reference,
        contact: meta.contact,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::IoModel;
    use approx::assert_relative_eq;
    use nalgebra::DMatrix;

    fn demo_table() -> RawTable {
        // Consistent totals: X equals FD plus intermediate-use row sums.
        RawTable::new(
            DMatrix::from_row_slice(5, 5, &[
                2.0, 1.0, 4.0, 3.0, 10.0,
                0.0, 3.0, 5.0, 2.0, 10.0,
                1.0, 1.0, 0.0, 0.0, 0.0,
                7.0, 5.0, 0.0, 0.0, 0.0,
                10.0, 10.0, 0.0, 0.0, 0.0,
            ]),
            vec![
                "AU_A01".into(),
                "CN_A01".into(),
                "TAXSUB".into(),
                "VA".into(),
                "OUT".into(),
            ],
            vec![
                "AU_A01".into(),
                "CN_A01".into(),
                "AU_HFCE".into(),
                "CN_HFCE".into(),
                "OUT".into(),
            ],
        )
        .unwrap()
    }

    fn demo_meta() -> ProviderMeta {
        ProviderMeta {
            num_regions: 2,
            num_sectors: 1,
            unit: "Million USD".into(),
            ..ProviderMeta::default()
        }
    }

    #[test]
    fn carve_extracts_explicit_output_and_auxiliaries() {
        let blocks = carve(&demo_table(), demo_meta()).unwrap();
        match &blocks.output {
            OutputBlock::Explicit(x) => {
                assert_eq!(x.flatten(), vec![10.0, 10.0]);
            }
            other => panic!("expected explicit output, got {other:?}"),
        }
        let va = &blocks.add["VA"];
        assert_eq!((va.nrows(), va.ncols()), (1, 2));
        assert_eq!(va.get(0, 0), 7.0);
        let tls = &blocks.add["TLS"];
        assert_eq!((tls.nrows(), tls.ncols()), (1, 4));
        assert_eq!(tls.get(0, 0), 1.0);
    }

    #[test]
    fn carved_blocks_build_a_consistent_model() {
        let model = IoModel::from_blocks(carve(&demo_table(), demo_meta()).unwrap()).unwrap();
        assert_eq!(model.output().flatten(), vec![10.0, 10.0]);
        // V = X - column sums of Z = [10 - 2, 10 - 4].
        assert_eq!(model.value_added().flatten(), vec![8.0, 6.0]);
        let x = model.output().flatten();
        let back = model.output_inverse().data().transpose()
            * nalgebra::DVector::from_vec(model.value_added().flatten());
        for (b, x0) in back.iter().zip(&x) {
            assert_relative_eq!(*b, x0, epsilon = 0.001);
        }
    }

    #[test]
    fn missing_value_added_row_is_reported() {
        let table = RawTable::new(
            DMatrix::from_element(3, 4, 1.0),
            vec!["AU_A01".into(), "CN_A01".into(), "OUT".into()],
            vec!["AU_A01".into(), "CN_A01".into(), "AU_HFCE".into(), "OUT".into()],
        )
        .unwrap();
        let err = carve(&table, demo_meta()).unwrap_err();
        assert_eq!(err, ProviderError::MissingRow { key: "VA".to_string() });
    }
}
