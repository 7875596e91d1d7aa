//! RGES: Reverse Gene Expression Score
//!
//! This library implements the rank-based enrichment statistic of Lamb et al.
//! (2006) used in drug-repurposing analysis: given a disease
//! differential-expression profile and a matrix of drug-induced expression
//! signatures, it quantifies how strongly each signature reverses the disease
//! profile. Scores near -2 indicate strong reversal, scores near +2 indicate
//! concordance.
//!
//! The main components of this library are:
//! - `GeneSignatureMatrix`: gene-by-signature expression data and its loaders
//! - `DifferentialExpressionSet`: a disease differential-expression table and
//!   its derived up-/down-regulated gene lists
//! - `rank_column` / `zscore_clip`: signature normalization transforms
//! - `RankedProfile`: a differential-expression gene list joined against one
//!   ranked signature
//! - `score_signature` / `score_all`: the up/down enrichment statistics and
//!   the combined RGES
//! - `PermutationEngine`: a parallel permutation procedure building an
//!   empirical null distribution per signature
//! - `empirical_significance`: permutation p-values with BH adjustment

mod config;
mod diffex;
mod error;
mod gct;
mod math;
mod matrix;
mod normalize;
mod permutation;
mod profile;
mod results;
mod score;
mod significance;
mod utils;

pub use config::{Direction, DownListOrder, TieBreak};
pub use diffex::{DeGene, DeRecord, DifferentialExpressionSet};
pub use error::{Error, Result};
pub use gct::{load_matrix, load_text_matrix, MatrixSource};
pub use matrix::{GeneSignatureMatrix, MatrixCodec, SignatureCatalog, SignatureMetadata};
pub use normalize::{rank_all, rank_column, zscore_clip, RankedSignatureColumn};
pub use permutation::{NullDistribution, PermutationEngine};
pub use profile::{ProfileEntry, RankedProfile};
pub use results::{score_all, BatchScores, SignatureScore};
pub use score::{enrichment_terms, score_ranked, score_signature, EnrichmentResult, EnrichmentTerms};
pub use significance::{empirical_significance, SignificanceResult};
pub use utils::normalize_gene_id;
