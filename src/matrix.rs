use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::warn;

use crate::error::Result;
use crate::utils::normalize_gene_id;

/// Per-signature treatment attributes from the text matrix metadata block.
///
/// Absent for matrices loaded through a binary codec.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignatureMetadata {
    pub perturbagen: Option<String>,
    pub dose: Option<String>,
    pub cell_line: Option<String>,
    pub treatment_time: Option<String>,
}

/// Metadata for every signature in a loaded matrix, keyed by signature id.
pub type SignatureCatalog = BTreeMap<String, SignatureMetadata>;

/// A gene-by-signature expression matrix.
///
/// Rows are keyed by canonical gene identifier, columns by signature
/// identifier. Values are stored column-major, one `Vec<f64>` per signature
/// aligned with `genes`. A single-signature matrix is simply the one-column
/// case of this type.
#[derive(Debug, Clone)]
pub struct GeneSignatureMatrix {
    genes: Vec<String>,
    gene_index: HashMap<String, usize>,
    signatures: Vec<String>,
    values: Vec<Vec<f64>>,
}

impl GeneSignatureMatrix {
    /// Assembles a matrix from per-gene rows.
    ///
    /// Gene identifiers are normalized to canonical form; rows whose
    /// identifier cannot be normalized are dropped with a warning, as are
    /// duplicates of an already-seen identifier (first row wins). Every row
    /// must carry exactly one value per signature; the loaders validate
    /// widths before calling this.
    pub fn from_rows(signatures: Vec<String>, rows: Vec<(String, Vec<f64>)>) -> Self {
        let n_sigs = signatures.len();
        let mut genes = Vec::with_capacity(rows.len());
        let mut gene_index = HashMap::with_capacity(rows.len());
        let mut values: Vec<Vec<f64>> = vec![Vec::with_capacity(rows.len()); n_sigs];

        for (raw_id, row) in rows {
            let gene = match normalize_gene_id(&raw_id) {
                Ok(gene) => gene,
                Err(_) => {
                    warn!(identifier = %raw_id, "dropping row with unnormalizable gene identifier");
                    continue;
                }
            };
            if gene_index.contains_key(&gene) {
                warn!(gene = %gene, "dropping duplicate gene row, keeping first");
                continue;
            }
            gene_index.insert(gene.clone(), genes.len());
            genes.push(gene);
            for (col, v) in values.iter_mut().zip(row) {
                col.push(v);
            }
        }

        Self {
            genes,
            gene_index,
            signatures,
            values,
        }
    }

    pub fn n_genes(&self) -> usize {
        self.genes.len()
    }

    pub fn n_signatures(&self) -> usize {
        self.signatures.len()
    }

    pub fn genes(&self) -> &[String] {
        &self.genes
    }

    pub fn signatures(&self) -> &[String] {
        &self.signatures
    }

    pub fn contains_gene(&self, gene: &str) -> bool {
        self.gene_index.contains_key(gene)
    }

    /// Raw values of one signature column, aligned with `genes()`.
    pub fn column(&self, index: usize) -> &[f64] {
        &self.values[index]
    }

    pub fn column_by_id(&self, signature_id: &str) -> Option<&[f64]> {
        self.signatures
            .iter()
            .position(|s| s == signature_id)
            .map(|i| self.values[i].as_slice())
    }

    pub(crate) fn values_mut(&mut self) -> &mut [Vec<f64>] {
        &mut self.values
    }

    /// Permutes each signature column's values independently, breaking the
    /// gene-to-value correspondence. Gene identifiers and signature ids are
    /// untouched, and each column keeps its value multiset.
    pub fn shuffle_values<R: Rng>(&mut self, rng: &mut R) {
        for col in &mut self.values {
            col.shuffle(rng);
        }
    }
}

/// Decoder for an external binary matrix representation.
///
/// The binary path yields only the numeric matrix; signature metadata is not
/// retrievable through a codec and callers needing it must obtain it
/// separately.
pub trait MatrixCodec {
    fn read_matrix(&self, path: &Path) -> Result<GeneSignatureMatrix>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn small_matrix() -> GeneSignatureMatrix {
        GeneSignatureMatrix::from_rows(
            vec!["sig_a".to_string(), "sig_b".to_string()],
            vec![
                ("5720".to_string(), vec![1.0, -0.5]),
                ("7124.0".to_string(), vec![2.0, 0.25]),
                ("3553".to_string(), vec![-1.0, 4.0]),
            ],
        )
    }

    #[test]
    fn test_from_rows_normalizes_identifiers() {
        let m = small_matrix();
        assert_eq!(m.genes(), &["5720", "7124", "3553"]);
        assert!(m.contains_gene("7124"));
        assert_eq!(m.n_genes(), 3);
        assert_eq!(m.n_signatures(), 2);
    }

    #[test]
    fn test_from_rows_drops_bad_and_duplicate_rows() {
        let m = GeneSignatureMatrix::from_rows(
            vec!["s".to_string()],
            vec![
                ("5720".to_string(), vec![1.0]),
                ("NA".to_string(), vec![2.0]),
                ("5720.0".to_string(), vec![3.0]),
            ],
        );
        assert_eq!(m.n_genes(), 1);
        assert_eq!(m.column(0), &[1.0]);
    }

    #[test]
    fn test_column_lookup() {
        let m = small_matrix();
        assert_eq!(m.column_by_id("sig_b").unwrap(), &[-0.5, 0.25, 4.0]);
        assert!(m.column_by_id("missing").is_none());
    }

    #[test]
    fn test_shuffle_preserves_value_multiset() {
        let mut m = small_matrix();
        let before: Vec<Vec<f64>> = (0..2)
            .map(|c| {
                let mut v = m.column(c).to_vec();
                v.sort_by(f64::total_cmp);
                v
            })
            .collect();

        let mut rng = ChaCha8Rng::seed_from_u64(7);
        m.shuffle_values(&mut rng);

        for c in 0..2 {
            let mut after = m.column(c).to_vec();
            after.sort_by(f64::total_cmp);
            assert_eq!(after, before[c]);
        }
        assert_eq!(m.genes(), &["5720", "7124", "3553"]);
    }
}
