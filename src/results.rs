use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use rayon::prelude::*;

use crate::config::{DownListOrder, TieBreak};
use crate::diffex::DifferentialExpressionSet;
use crate::error::{Error, Result};
use crate::matrix::GeneSignatureMatrix;
use crate::score::{score_signature, EnrichmentResult};

/// Outcome of scoring one signature: a result, or an explicit failure marker
/// so a bad signature stays visible in batch output.
#[derive(Debug)]
pub struct SignatureScore {
    pub signature_id: String,
    pub outcome: std::result::Result<EnrichmentResult, Error>,
}

/// Per-signature outcomes for one scoring pass, in matrix column order.
#[derive(Debug)]
pub struct BatchScores {
    pub scores: Vec<SignatureScore>,
}

/// Scores every signature of `matrix` against `diffex` in parallel.
///
/// Per-signature failures are isolated: they are reported alongside the
/// successes and never abort the batch.
pub fn score_all(
    matrix: &GeneSignatureMatrix,
    diffex: &DifferentialExpressionSet,
    down_order: DownListOrder,
    tie: TieBreak,
) -> BatchScores {
    let up = diffex.up_list();
    let down = diffex.down_list(down_order);

    let scores = (0..matrix.n_signatures())
        .into_par_iter()
        .map(|index| SignatureScore {
            signature_id: matrix.signatures()[index].clone(),
            outcome: score_signature(matrix, index, &up, &down, tie),
        })
        .collect();

    BatchScores { scores }
}

impl BatchScores {
    /// Successfully scored signatures, in matrix column order.
    pub fn ok_scores(&self) -> impl Iterator<Item = &EnrichmentResult> + '_ {
        self.scores.iter().filter_map(|s| s.outcome.as_ref().ok())
    }

    pub fn pprint(&self) {
        println!("signature\trges\tes_up\tes_down\tt_up\tt_down\tstatus");
        for score in &self.scores {
            println!("{}", Self::format_row(score));
        }
    }

    pub fn write_tsv(&self, path: &Path) -> Result<()> {
        let file = File::create(path).map_err(|e| Error::io(path, e))?;
        let mut writer = BufWriter::new(file);
        let write = |w: &mut BufWriter<File>, line: &str| -> Result<()> {
            writeln!(w, "{line}").map_err(|e| Error::io(path, e))
        };
        write(&mut writer, "signature\trges\tes_up\tes_down\tt_up\tt_down\tstatus")?;
        for score in &self.scores {
            write(&mut writer, &Self::format_row(score))?;
        }
        writer.flush().map_err(|e| Error::io(path, e))
    }

    fn format_row(score: &SignatureScore) -> String {
        match &score.outcome {
            Ok(r) => format!(
                "{}\t{}\t{}\t{}\t{}\t{}\tok",
                score.signature_id, r.rges, r.es_up, r.es_down, r.t_up, r.t_down
            ),
            Err(e) => format!("{}\tNA\tNA\tNA\tNA\tNA\t{e}", score.signature_id),
        }
    }
}
