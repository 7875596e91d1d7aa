use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use derive_new::new;
use itertools::Itertools;
use tracing::warn;

use crate::config::DownListOrder;
use crate::error::{Error, Result};
use crate::utils::normalize_gene_id;

/// Statistic columns every differential-expression table must carry, in
/// addition to an identifier column (`entrezgene` or `gene_id`).
const REQUIRED_COLUMNS: [&str; 7] = [
    "baseMean",
    "log2FoldChange",
    "lfcSE",
    "stat",
    "pvalue",
    "padj",
    "symbol",
];

/// One measured gene from a differential-expression table.
#[derive(Debug, Clone, new)]
pub struct DeRecord {
    pub gene_id: String,
    pub symbol: String,
    pub base_mean: f64,
    pub log2_fold_change: f64,
    pub lfc_se: f64,
    pub stat: f64,
    pub pvalue: f64,
    pub padj: f64,
}

/// A gene identifier paired with its fold change, the unit consumed by the
/// profile joiner.
#[derive(Debug, Clone, PartialEq, new)]
pub struct DeGene {
    pub id: String,
    pub log2_fold_change: f64,
}

/// A loaded differential-expression table with derived up-/down-regulated
/// gene lists.
#[derive(Debug)]
pub struct DifferentialExpressionSet {
    records: Vec<DeRecord>,
}

impl DifferentialExpressionSet {
    /// Loads a tab-delimited differential-expression table.
    ///
    /// The header is validated before any row is read; a missing required
    /// column aborts the load. The identifier column is `entrezgene` when
    /// present (the Entrez variant of the format), `gene_id` otherwise. Rows
    /// whose identifier cannot be normalized are dropped with a warning.
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| Error::io(path, e))?;
        let mut lines = BufReader::new(file).lines();

        let header = match lines.next() {
            Some(line) => line.map_err(|e| Error::io(path, e))?,
            None => return Err(Error::schema(path, "empty differential-expression table")),
        };
        let columns: HashMap<&str, usize> = header
            .split('\t')
            .enumerate()
            .map(|(i, name)| (name.trim(), i))
            .collect();

        for required in REQUIRED_COLUMNS {
            if !columns.contains_key(required) {
                return Err(Error::schema(
                    path,
                    format!("missing required column {required:?}"),
                ));
            }
        }
        let id_column = *columns
            .get("entrezgene")
            .or_else(|| columns.get("gene_id"))
            .ok_or_else(|| {
                Error::schema(path, "missing identifier column (entrezgene or gene_id)")
            })?;
        let column = |name: &str| columns[name];
        let (base_mean, log2_fold_change, lfc_se, stat, pvalue, padj, symbol) = (
            column("baseMean"),
            column("log2FoldChange"),
            column("lfcSE"),
            column("stat"),
            column("pvalue"),
            column("padj"),
            column("symbol"),
        );

        let mut records = Vec::new();
        let mut dropped = 0usize;
        for line in lines {
            let line = line.map_err(|e| Error::io(path, e))?;
            if line.trim().is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() != columns.len() {
                warn!(
                    fields = fields.len(),
                    expected = columns.len(),
                    "skipping short differential-expression row"
                );
                dropped += 1;
                continue;
            }
            let gene_id = match normalize_gene_id(fields[id_column]) {
                Ok(id) => id,
                Err(_) => {
                    warn!(identifier = fields[id_column], "dropping row with unnormalizable gene identifier");
                    dropped += 1;
                    continue;
                }
            };
            records.push(DeRecord::new(
                gene_id,
                fields[symbol].trim().to_string(),
                parse_stat(fields[base_mean]),
                parse_stat(fields[log2_fold_change]),
                parse_stat(fields[lfc_se]),
                parse_stat(fields[stat]),
                parse_stat(fields[pvalue]),
                parse_stat(fields[padj]),
            ));
        }
        if dropped > 0 {
            warn!(dropped, kept = records.len(), "dropped unusable differential-expression rows");
        }

        Ok(Self { records })
    }

    pub fn from_records(records: Vec<DeRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[DeRecord] {
        &self.records
    }

    /// Up-regulated genes (fold change > 0), strongest effect first.
    pub fn up_list(&self) -> Vec<DeGene> {
        self.records
            .iter()
            .filter(|r| r.log2_fold_change > 0.0)
            .map(|r| DeGene::new(r.gene_id.clone(), r.log2_fold_change))
            .sorted_by(|a, b| b.log2_fold_change.total_cmp(&a.log2_fold_change))
            .collect()
    }

    /// Down-regulated genes (fold change < 0), ordered per `order`.
    pub fn down_list(&self, order: DownListOrder) -> Vec<DeGene> {
        self.records
            .iter()
            .filter(|r| r.log2_fold_change < 0.0)
            .map(|r| DeGene::new(r.gene_id.clone(), r.log2_fold_change))
            .sorted_by(|a, b| match order {
                DownListOrder::Descending => b.log2_fold_change.total_cmp(&a.log2_fold_change),
                DownListOrder::Ascending => a.log2_fold_change.total_cmp(&b.log2_fold_change),
            })
            .collect()
    }
}

/// DESeq2-style tables mark unavailable statistics with NA.
fn parse_stat(field: &str) -> f64 {
    let trimmed = field.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("na") {
        return f64::NAN;
    }
    trimmed.parse().unwrap_or(f64::NAN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const HEADER: &str = "baseMean\tlog2FoldChange\tlfcSE\tstat\tpvalue\tpadj\tgene_id\tsymbol";

    fn de_row(gene: &str, symbol: &str, l2fc: &str) -> String {
        format!("10.0\t{l2fc}\t0.1\t2.0\t0.01\t0.05\t{gene}\t{symbol}")
    }

    fn write_table(rows: &[String]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{HEADER}").unwrap();
        for row in rows {
            writeln!(file, "{row}").unwrap();
        }
        file
    }

    fn test_set() -> DifferentialExpressionSet {
        DifferentialExpressionSet::from_records(vec![
            DeRecord::new("1".into(), "A".into(), 1.0, 2.5, 0.1, 1.0, 0.01, 0.05),
            DeRecord::new("2".into(), "B".into(), 1.0, -0.5, 0.1, -1.0, 0.01, 0.05),
            DeRecord::new("3".into(), "C".into(), 1.0, 0.75, 0.1, 1.0, 0.01, 0.05),
            DeRecord::new("4".into(), "D".into(), 1.0, -3.0, 0.1, -1.0, 0.01, 0.05),
            DeRecord::new("5".into(), "E".into(), 1.0, f64::NAN, 0.1, 0.0, 0.5, 0.9),
        ])
    }

    #[test]
    fn test_up_list_descending_fold_change() {
        let ids: Vec<String> = test_set().up_list().into_iter().map(|g| g.id).collect();
        assert_eq!(ids, vec!["1", "3"]);
    }

    #[test]
    fn test_down_list_descending_policy() {
        let ids: Vec<String> = test_set()
            .down_list(DownListOrder::Descending)
            .into_iter()
            .map(|g| g.id)
            .collect();
        assert_eq!(ids, vec!["2", "4"]);
    }

    #[test]
    fn test_down_list_ascending_policy() {
        let ids: Vec<String> = test_set()
            .down_list(DownListOrder::Ascending)
            .into_iter()
            .map(|g| g.id)
            .collect();
        assert_eq!(ids, vec!["4", "2"]);
    }

    #[test]
    fn test_nan_fold_change_in_neither_list() {
        let set = test_set();
        assert!(set.up_list().iter().all(|g| g.id != "5"));
        assert!(set.down_list(DownListOrder::Descending).iter().all(|g| g.id != "5"));
    }

    #[test]
    fn test_from_path_parses_and_normalizes() {
        let file = write_table(&[
            de_row("5720.0", "PTGIS", "1.5"),
            de_row("7124", "TNF", "-2.0"),
            de_row("NA", "BAD", "0.5"),
        ]);
        let set = DifferentialExpressionSet::from_path(file.path()).unwrap();
        assert_eq!(set.records().len(), 2);
        assert_eq!(set.records()[0].gene_id, "5720");
        assert_eq!(set.records()[1].symbol, "TNF");
    }

    #[test]
    fn test_missing_column_is_schema_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "baseMean\tlog2FoldChange\tgene_id\tsymbol").unwrap();
        writeln!(file, "{}", de_row("1", "A", "1.0")).unwrap();
        let err = DifferentialExpressionSet::from_path(file.path()).unwrap_err();
        assert!(matches!(err, Error::Schema { .. }));
    }

    #[test]
    fn test_entrezgene_column_takes_precedence() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{HEADER}\tentrezgene").unwrap();
        writeln!(file, "{}\t5743.0", de_row("ENSG000001", "PTGS2", "1.5")).unwrap();
        let set = DifferentialExpressionSet::from_path(file.path()).unwrap();
        assert_eq!(set.records()[0].gene_id, "5743");
    }
}
