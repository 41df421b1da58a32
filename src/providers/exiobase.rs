//! Block layout of the ExioBase datasets.
//!
//! ExioBase ships the blocks as separate tables (Z, Y and x files), so
//! carving is mostly validation: the output vector is the last column of
//! the x table and no auxiliary matrices are published.

use crate::model::blocks::{ModelBlocks, OutputBlock};
use crate::providers::{require_at_least, ProviderError, ProviderMeta, RawTable};
use std::collections::BTreeMap;

pub fn carve(
    z_table: &RawTable,
    fd_table: &RawTable,
    x_table: &RawTable,
    meta: ProviderMeta,
) -> Result<ModelBlocks, ProviderError> {
    let rs = meta.num_regions * meta.num_sectors;
    require_at_least(z_table, rs, rs, &meta)?;
    require_at_least(fd_table, rs, 1, &meta)?;
    require_at_least(x_table, rs, 1, &meta)?;

    let intermediate_use = z_table.block("Intermediate use", 0..rs, 0..rs)?;
    let final_demand = fd_table.block("Final demand granular", 0..rs, 0..fd_table.ncols())?;
    let output = x_table.block("Output", 0..rs, x_table.ncols() - 1..x_table.ncols())?;

    Ok(ModelBlocks {
        intermediate_use,
        final_demand,
        output: OutputBlock::Explicit(output),
        add: BTreeMap::new(),
        sector_name_mapping: meta.sector_name_mapping,
        demand_items: meta.demand_items,
        num_regions: meta.num_regions,
        num_sectors: meta.num_sectors,
        unit: meta.unit,
        reference: meta.reference,
        contact: meta.contact,
    })
}
