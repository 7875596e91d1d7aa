use std::collections::HashMap;

use rayon::prelude::*;

use crate::config::TieBreak;
use crate::math::{arithmetic_mean, population_stddev};
use crate::matrix::GeneSignatureMatrix;

/// Number of population standard deviations at which z-scores are clipped.
const Z_CLIP: f64 = 3.0;

/// One signature's ordinal gene ranking.
///
/// Every gene of the source matrix is assigned a rank in `1..=N` with the
/// largest raw value at rank 1.
#[derive(Debug, Clone)]
pub struct RankedSignatureColumn {
    signature_id: String,
    n_genes: usize,
    ranks: HashMap<String, u32>,
}

impl RankedSignatureColumn {
    pub fn signature_id(&self) -> &str {
        &self.signature_id
    }

    /// Total gene count N of the source matrix, the denominator of the
    /// enrichment statistic.
    pub fn n_genes(&self) -> usize {
        self.n_genes
    }

    pub fn rank(&self, gene: &str) -> Option<u32> {
        self.ranks.get(gene).copied()
    }
}

/// Ranks one signature column descending: the largest value gets rank 1,
/// ties resolved by `tie`.
pub fn rank_column(
    matrix: &GeneSignatureMatrix,
    index: usize,
    tie: TieBreak,
) -> RankedSignatureColumn {
    let values = matrix.column(index);
    let mut order: Vec<usize> = (0..values.len()).collect();
    // Stable sort: equal values keep matrix order, so First needs no extra key.
    order.sort_by(|&a, &b| {
        let by_value = values[b].total_cmp(&values[a]);
        match tie {
            TieBreak::First => by_value,
            TieBreak::Last => by_value.then(b.cmp(&a)),
        }
    });

    let mut ranks = HashMap::with_capacity(values.len());
    for (position, &row) in order.iter().enumerate() {
        ranks.insert(matrix.genes()[row].clone(), (position + 1) as u32);
    }

    RankedSignatureColumn {
        signature_id: matrix.signatures()[index].clone(),
        n_genes: values.len(),
        ranks,
    }
}

/// Ranks every column of `matrix`, returning the columns keyed by signature
/// id.
pub fn rank_all(
    matrix: &GeneSignatureMatrix,
    tie: TieBreak,
) -> HashMap<String, RankedSignatureColumn> {
    (0..matrix.n_signatures())
        .into_par_iter()
        .map(|i| {
            let column = rank_column(matrix, i, tie);
            (column.signature_id().to_string(), column)
        })
        .collect()
}

/// Batch z-score transform applied to every signature column in parallel.
///
/// Each value becomes `(x - mean) / population stddev`, clipped to
/// `[-3, 3]` and shifted into `[0, 6]`. Values at the column mean map to 3,
/// as does every value of a constant column. Gene identifiers and signature
/// ids are untouched.
pub fn zscore_clip(matrix: &mut GeneSignatureMatrix) {
    matrix.values_mut().par_iter_mut().for_each(|column| {
        let mean = arithmetic_mean(column);
        let stddev = population_stddev(column, mean);
        for value in column.iter_mut() {
            let z = if stddev == 0.0 {
                0.0
            } else {
                (*value - mean) / stddev
            };
            *value = z.clamp(-Z_CLIP, Z_CLIP) + Z_CLIP;
        }
    });
}
