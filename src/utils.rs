use crate::error::{Error, Result};

/// Reduces a raw gene identifier to canonical string form.
///
/// Integer-valued identifiers (Entrez) frequently arrive with a decimal or
/// scientific suffix after round-tripping through floating point ("5720.0",
/// "5.72e3"); these collapse to the plain integer form. Symbolic identifiers
/// pass through unchanged. Empty fields, NA markers and non-integral numerics
/// cannot be normalized.
pub fn normalize_gene_id(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("na") {
        return Err(Error::IdentifierNormalization {
            raw: raw.to_string(),
        });
    }
    if let Ok(v) = trimmed.parse::<i64>() {
        return Ok(v.to_string());
    }
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() && v.fract() == 0.0 && v.abs() < i64::MAX as f64 => {
            Ok((v as i64).to_string())
        }
        // Numeric but not an integer: no canonical form exists.
        Ok(_) => Err(Error::IdentifierNormalization {
            raw: raw.to_string(),
        }),
        Err(_) => Ok(trimmed.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_integer_passes() {
        assert_eq!(normalize_gene_id("5720").unwrap(), "5720");
    }

    #[test]
    fn test_decimal_suffix_stripped() {
        assert_eq!(normalize_gene_id("5720.0").unwrap(), "5720");
    }

    #[test]
    fn test_scientific_suffix_stripped() {
        assert_eq!(normalize_gene_id("5.72e3").unwrap(), "5720");
    }

    #[test]
    fn test_symbol_passes_through() {
        assert_eq!(normalize_gene_id("TP53").unwrap(), "TP53");
        assert_eq!(normalize_gene_id(" ENSG00000141510 ").unwrap(), "ENSG00000141510");
    }

    #[test]
    fn test_non_integral_numeric_rejected() {
        assert!(normalize_gene_id("5720.5").is_err());
    }

    #[test]
    fn test_empty_and_na_rejected() {
        assert!(normalize_gene_id("").is_err());
        assert!(normalize_gene_id("  ").is_err());
        assert!(normalize_gene_id("NA").is_err());
        assert!(normalize_gene_id("NaN").is_err());
    }
}
