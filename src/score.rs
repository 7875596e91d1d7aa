use derive_new::new;
use serde::Serialize;

use crate::config::{Direction, TieBreak};
use crate::diffex::DeGene;
use crate::error::{Error, Result};
use crate::matrix::GeneSignatureMatrix;
use crate::normalize::{rank_column, RankedSignatureColumn};
use crate::profile::RankedProfile;

/// Running deviation terms for one direction of a joined profile.
///
/// Over a profile of size t drawn from a signature of N genes:
///
/// ```text
/// a = max over j in 1..t of ( j/t - rank(j)/N )
/// b = max over j in 1..t of ( rank(j)/N - (j-1)/t )
/// ```
///
/// following Lamb et al. (2006). Both lie in [-1, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, new)]
pub struct EnrichmentTerms {
    pub a: f64,
    pub b: f64,
}

impl EnrichmentTerms {
    /// Collapses the terms to the signed enrichment score:
    /// `a` when `a > b`, `-b` otherwise.
    pub fn enrichment_score(&self) -> f64 {
        if self.a > self.b {
            self.a
        } else {
            -self.b
        }
    }
}

/// Per-signature RGES with intermediate terms retained for diagnostics.
#[derive(Debug, Clone, Serialize, new)]
pub struct EnrichmentResult {
    pub signature_id: String,
    /// `es_up - es_down`, in [-2, 2]. Values near -2 indicate strong
    /// reversal of the disease profile, values near +2 concordance.
    pub rges: f64,
    pub es_up: f64,
    pub es_down: f64,
    pub up_terms: EnrichmentTerms,
    pub down_terms: EnrichmentTerms,
    /// Joined profile sizes for each direction.
    pub t_up: usize,
    pub t_down: usize,
}

/// Computes the deviation terms for one direction of a joined profile.
///
/// An empty profile has no defined enrichment and is surfaced as
/// [`Error::EmptyProfile`], never folded into a zero or NaN.
pub fn enrichment_terms(
    profile: &RankedProfile,
    n_genes: usize,
    signature: &str,
    direction: Direction,
) -> Result<EnrichmentTerms> {
    if profile.is_empty() {
        return Err(Error::EmptyProfile {
            signature: signature.to_string(),
            direction,
        });
    }
    let t = profile.len() as f64;
    let n = n_genes as f64;
    let mut a = f64::NEG_INFINITY;
    let mut b = f64::NEG_INFINITY;
    for (index, entry) in profile.entries().iter().enumerate() {
        let j = (index + 1) as f64;
        let r = f64::from(entry.rank) / n;
        a = a.max(j / t - r);
        b = b.max(r - (j - 1.0) / t);
    }
    Ok(EnrichmentTerms::new(a, b))
}

/// Scores one ranked signature against the up- and down-regulated gene lists
/// of a disease profile.
pub fn score_ranked(
    up: &[DeGene],
    down: &[DeGene],
    ranks: &RankedSignatureColumn,
) -> Result<EnrichmentResult> {
    let signature = ranks.signature_id();
    let n = ranks.n_genes();

    let up_profile = RankedProfile::join(up, ranks);
    let down_profile = RankedProfile::join(down, ranks);

    let up_terms = enrichment_terms(&up_profile, n, signature, Direction::Up)?;
    let down_terms = enrichment_terms(&down_profile, n, signature, Direction::Down)?;

    let es_up = up_terms.enrichment_score();
    let es_down = down_terms.enrichment_score();

    Ok(EnrichmentResult::new(
        signature.to_string(),
        es_up - es_down,
        es_up,
        es_down,
        up_terms,
        down_terms,
        up_profile.len(),
        down_profile.len(),
    ))
}

/// Ranks one matrix column and scores it against a disease profile.
pub fn score_signature(
    matrix: &GeneSignatureMatrix,
    index: usize,
    up: &[DeGene],
    down: &[DeGene],
    tie: TieBreak,
) -> Result<EnrichmentResult> {
    let ranks = rank_column(matrix, index, tie);
    score_ranked(up, down, &ranks)
}
