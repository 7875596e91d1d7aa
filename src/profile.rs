use derive_new::new;
use itertools::Itertools;

use crate::diffex::DeGene;
use crate::normalize::RankedSignatureColumn;

/// One gene surviving the join: identifier, disease fold change, and its
/// rank within the signature.
#[derive(Debug, Clone, PartialEq, new)]
pub struct ProfileEntry {
    pub gene: String,
    pub log2_fold_change: f64,
    pub rank: u32,
}

/// A differential-expression gene list aligned against one ranked signature.
///
/// Entries keep the list order of the input; the dense 1-based position of
/// an entry is its index plus one. An empty profile means the signature has
/// no defined enrichment for that direction; the scorer turns it into an
/// explicit error rather than a degenerate statistic.
#[derive(Debug, Clone)]
pub struct RankedProfile {
    entries: Vec<ProfileEntry>,
}

impl RankedProfile {
    /// Inner-joins `list` against `ranks`.
    ///
    /// Genes absent from the signature are dropped silently; absence is
    /// expected, not an error. Duplicate identifiers keep their first
    /// surviving occurrence in list order.
    pub fn join(list: &[DeGene], ranks: &RankedSignatureColumn) -> Self {
        let entries = list
            .iter()
            .filter_map(|g| {
                ranks
                    .rank(&g.id)
                    .map(|rank| ProfileEntry::new(g.id.clone(), g.log2_fold_change, rank))
            })
            .unique_by(|entry| entry.gene.clone())
            .collect();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[ProfileEntry] {
        &self.entries
    }
}
