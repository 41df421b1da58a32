//! Block layout of the Eurostat Figaro inter-country tables.
//!
//! One combined table: the region-sector square in the top-left, final
//! demand columns to its right, value-added rows underneath. Figaro ships
//! no output column; output is derived from demand plus intermediate use.

use crate::model::blocks::{ModelBlocks, OutputBlock};
use crate::providers::{require_at_least, ProviderError, ProviderMeta, RawTable};
use std::collections::BTreeMap;

pub fn carve(table: &RawTable, meta: ProviderMeta) -> Result<ModelBlocks, ProviderError> {
    let rs = meta.num_regions * meta.num_sectors;
    require_at_least(table, rs, rs + 1, &meta)?;

    let intermediate_use = table.block("Intermediate use", 0..rs, 0..rs)?;
    let final_demand = table.block("Final demand granular", 0..rs, rs..table.ncols())?;

    let mut add = BTreeMap::new();
    if table.nrows() > rs {
        add.insert(
            "GVA_GRAN".to_string(),
            table.block("Value added granular", rs..table.nrows(), 0..rs)?,
        );
    }

    Ok(ModelBlocks {
        intermediate_use,
        final_demand,
        output: OutputBlock::DemandPlusIntermediate,
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
