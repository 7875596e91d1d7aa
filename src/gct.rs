use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{Error, Result};
use crate::matrix::{GeneSignatureMatrix, MatrixCodec, SignatureCatalog, SignatureMetadata};

/// Preamble lines (format version, dimensions) before the column header.
const PREAMBLE_ROWS: usize = 2;
/// Metadata rows between the column header and the matrix body.
const METADATA_ROWS: usize = 7;
/// Metadata key naming each signature. Required.
const ID_KEY: &str = "id";

/// On-disk representation of a signature matrix.
pub enum MatrixSource<'a> {
    /// Tab-delimited text with an embedded per-signature metadata block.
    Text,
    /// Opaque binary large-matrix format decoded by an external codec.
    /// Metadata is not available through this path.
    Binary(&'a dyn MatrixCodec),
}

/// Loads a signature matrix, returning metadata when the format carries it.
pub fn load_matrix(
    path: &Path,
    source: MatrixSource<'_>,
) -> Result<(GeneSignatureMatrix, Option<SignatureCatalog>)> {
    match source {
        MatrixSource::Text => {
            let (matrix, catalog) = load_text_matrix(path)?;
            Ok((matrix, Some(catalog)))
        }
        MatrixSource::Binary(codec) => Ok((codec.read_matrix(path)?, None)),
    }
}

/// Loads the tab-delimited text matrix format.
///
/// Layout: two preamble rows, a column header naming the gene-id column and
/// one column per signature, a block of metadata rows (`key` followed by one
/// value per signature), then gene rows. The `id` metadata row names the
/// signatures and is required. Any structural defect is a schema error and
/// nothing is returned; a matrix is never partially populated.
pub fn load_text_matrix(path: &Path) -> Result<(GeneSignatureMatrix, SignatureCatalog)> {
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    let reader = BufReader::new(file);
    let mut lines = reader.lines();

    let mut next_line = |what: &str| -> Result<String> {
        match lines.next() {
            Some(Ok(line)) => Ok(line),
            Some(Err(e)) => Err(Error::io(path, e)),
            None => Err(Error::schema(path, format!("unexpected end of file, expected {what}"))),
        }
    };

    for _ in 0..PREAMBLE_ROWS {
        next_line("preamble row")?;
    }

    let header = next_line("column header")?;
    let n_signatures = header.split('\t').count().saturating_sub(1);
    if n_signatures == 0 {
        return Err(Error::schema(path, "column header names no signatures"));
    }

    let mut metadata: HashMap<String, Vec<String>> = HashMap::with_capacity(METADATA_ROWS);
    for _ in 0..METADATA_ROWS {
        let line = next_line("metadata row")?;
        let mut fields = line.split('\t');
        let key = fields
            .next()
            .unwrap_or_default()
            .trim()
            .to_string();
        let values: Vec<String> = fields.map(|f| f.trim().to_string()).collect();
        if values.len() != n_signatures {
            return Err(Error::schema(
                path,
                format!(
                    "metadata row {key:?} has {} values, expected {n_signatures}",
                    values.len()
                ),
            ));
        }
        metadata.insert(key, values);
    }

    let signature_ids = metadata
        .get(ID_KEY)
        .ok_or_else(|| Error::schema(path, format!("missing required metadata key {ID_KEY:?}")))?
        .clone();

    let mut catalog = SignatureCatalog::new();
    for (i, id) in signature_ids.iter().enumerate() {
        let field = |key: &str| metadata.get(key).map(|v| v[i].clone());
        catalog.insert(
            id.clone(),
            SignatureMetadata {
                perturbagen: field("compound"),
                dose: field("concentration"),
                cell_line: field("cellLine"),
                treatment_time: field("time"),
            },
        );
    }

    let mut rows = Vec::new();
    for line in lines {
        let line = line.map_err(|e| Error::io(path, e))?;
        if line.trim().is_empty() {
            continue;
        }
        let mut fields = line.split('\t');
        let gene = fields.next().unwrap_or_default().to_string();
        let values = fields
            .map(|f| parse_cell(f, path))
            .collect::<Result<Vec<f64>>>()?;
        if values.len() != n_signatures {
            return Err(Error::schema(
                path,
                format!(
                    "gene row {gene:?} has {} values, expected {n_signatures}",
                    values.len()
                ),
            ));
        }
        rows.push((gene, values));
    }

    Ok((GeneSignatureMatrix::from_rows(signature_ids, rows), catalog))
}

fn parse_cell(field: &str, path: &Path) -> Result<f64> {
    let trimmed = field.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("na") {
        return Ok(f64::NAN);
    }
    trimmed
        .parse::<f64>()
        .map_err(|_| Error::schema(path, format!("unparseable expression value {trimmed:?}")))
}
