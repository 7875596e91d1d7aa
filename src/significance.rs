use adjustp::{adjust, Procedure};
use derive_new::new;
use serde::Serialize;
use tracing::warn;

use crate::permutation::NullDistribution;
use crate::results::BatchScores;

/// Observed RGES with its permutation p-value.
#[derive(Debug, Clone, Serialize, new)]
pub struct SignificanceResult {
    pub signature_id: String,
    pub rges: f64,
    pub p_value: f64,
    pub p_adjusted: f64,
}

/// Left-tail empirical p-values of observed scores against the permutation
/// null.
///
/// Reversal is the interesting tail: p is the add-one-corrected fraction of
/// null scores at or below the observed RGES, so it can never be zero.
/// P-values are Benjamini-Hochberg adjusted and results returned by
/// ascending p. Signatures without a usable null list are skipped with a
/// warning; failed observed scores are already marked in `observed`.
pub fn empirical_significance(
    observed: &BatchScores,
    null: &NullDistribution,
) -> Vec<SignificanceResult> {
    let mut results = Vec::new();
    let mut pvalues = Vec::new();

    for score in &observed.scores {
        let Ok(result) = &score.outcome else { continue };
        let Some(null_scores) = null.scores.get(&score.signature_id) else {
            warn!(signature = %score.signature_id, "no null scores for signature");
            continue;
        };
        if null_scores.is_empty() {
            warn!(signature = %score.signature_id, "empty null score list for signature");
            continue;
        }
        let at_or_below = null_scores.iter().filter(|&&s| s <= result.rges).count();
        let p = (at_or_below + 1) as f64 / (null_scores.len() + 1) as f64;
        results.push(SignificanceResult::new(
            score.signature_id.clone(),
            result.rges,
            p,
            1.0,
        ));
        pvalues.push(p);
    }

    let adjusted = adjust(&pvalues, Procedure::BenjaminiHochberg);
    for (result, p_adjusted) in results.iter_mut().zip(adjusted) {
        result.p_adjusted = p_adjusted;
    }
    results.sort_by(|a, b| a.p_value.total_cmp(&b.p_value));

    results
}
