//! Defines the error taxonomy for model construction and queries.
//!
//! Validation failures (bad selectors, missing parameters, malformed
//! blocks) and the single numeric failure (singular inversion, carried
//! inside [`MatrixError`]) share one enum so callers match on variants
//! instead of string content. Every message names the offending values.

use crate::matrix::MatrixError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error(transparent)]
    Matrix(#[from] MatrixError),

    #[error("intermediate-use block must be square, got ({rows}, {cols})")]
    NotSquare { rows: usize, cols: usize },

    #[error(
        "region-sector universe mismatch: {regions} regions x {sectors} sectors \
         must cover the {rs} rows exactly once"
    )]
    UniverseMismatch {
        regions: usize,
        sectors: usize,
        rs: usize,
    },

    #[error("'{name}' must have {expected} rows to align with the intermediate-use block, got {actual}")]
    BlockShape {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("'{name}' row {index} is not a (region, sector) pair")]
    NonPairLabel { name: String, index: usize },

    #[error("unknown {kind}: {}", .keys.join(", "))]
    UnknownKeys {
        kind: &'static str,
        keys: Vec<String>,
    },

    #[error("must supply 'shock_percent', 'regions' and 'sectors' when no custom shock vector is given")]
    MissingShockParameters,

    #[error("custom shock vector has length {actual}, expected {expected}")]
    ShockVectorLength { expected: usize, actual: usize },

    #[error("model must be 'leontief' or 'ghosh', got '{0}'")]
    UnknownMode(String),

    #[error("use_type must be 'intermediate', 'final' or 'both', got '{0}'")]
    UnknownUseType(String),

    #[error("impact summary must group by 'region' or 'sector', got '{0}'")]
    UnknownGroupBy(String),
}

/// Checks that every key in `subset` occurs in the sorted `superset`;
/// the unrecognized keys are listed in the error, sorted and deduplicated.
pub(crate) fn check_subset(
    kind: &'static str,
    subset: &[String],
    superset: &[String],
) -> Result<(), ModelError> {
    let mut missing: Vec<String> = subset
        .iter()
        .filter(|k| superset.binary_search(k).is_err())
        .cloned()
        .collect();
    if missing.is_empty() {
        return Ok(());
    }
    missing.sort();
    missing.dedup();
    Err(ModelError::UnknownKeys { kind, keys: missing })
}
