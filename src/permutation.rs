use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use bon::Builder;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::{DownListOrder, TieBreak};
use crate::diffex::DifferentialExpressionSet;
use crate::error::{Error, Result};
use crate::matrix::GeneSignatureMatrix;
use crate::score::score_signature;

/// Accumulated per-signature null scores.
///
/// `scores` maps every scorable signature to one RGES per completed round,
/// in round order. Signatures that cannot be scored appear in `failures`
/// with the reason instead of being silently absent.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct NullDistribution {
    pub rounds: usize,
    pub scores: BTreeMap<String, Vec<f64>>,
    pub failures: BTreeMap<String, String>,
}

impl NullDistribution {
    pub fn write(&self, path: &Path) -> Result<()> {
        let file = File::create(path).map_err(|e| Error::io(path, e))?;
        let writer = BufWriter::new(file);
        serde_json::to_writer(writer, self).map_err(|source| Error::Checkpoint {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn read(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| Error::io(path, e))?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader).map_err(|source| Error::Checkpoint {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Builds an empirical null distribution of RGES per signature by repeated
/// random reshuffling.
///
/// Each round permutes every signature column in place (single-threaded,
/// before any fan-out), then rescores all signatures against the fixed
/// differential-expression profile on a bounded worker pool. The round
/// commits only once every scoring task has returned; scores are appended in
/// matrix column order, so results never depend on task completion order.
/// The engine owns its matrix because shuffling destroys the gene-to-value
/// correspondence.
#[derive(Builder)]
pub struct PermutationEngine<'a> {
    matrix: GeneSignatureMatrix,
    diffex: &'a DifferentialExpressionSet,
    /// Total rounds the null distribution should reach.
    rounds: usize,
    seed: u64,
    /// Worker threads for the scoring fan-out. Defaults to one per core.
    threads: Option<usize>,
    /// Checkpoint rewritten after every completed round. Without one the
    /// distribution is kept in memory only.
    checkpoint: Option<PathBuf>,
    #[builder(default)]
    down_order: DownListOrder,
    #[builder(default)]
    tie_break: TieBreak,
}

impl PermutationEngine<'_> {
    /// Runs rounds until the distribution holds `rounds` scores per
    /// signature, checkpointing after each.
    ///
    /// When the checkpoint file already exists, its fully completed rounds
    /// are reused and only the remainder is executed. The unit of
    /// recoverable work is one full round, never a partial one.
    pub fn run(mut self) -> Result<NullDistribution> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.threads.unwrap_or(0))
            .build()?;

        let up = self.diffex.up_list();
        let down = self.diffex.down_list(self.down_order);

        let mut null = match &self.checkpoint {
            Some(path) if path.exists() => {
                let existing = NullDistribution::read(path)?;
                info!(completed = existing.rounds, "resuming from checkpoint");
                existing
            }
            _ => NullDistribution::default(),
        };

        while null.rounds < self.rounds {
            let round = null.rounds + 1;
            info!(round, total = self.rounds, "starting permutation round");

            // Derived per-round seed: resumable without replaying the rng.
            let mut rng = ChaCha8Rng::seed_from_u64(self.seed.wrapping_add(round as u64));
            self.matrix.shuffle_values(&mut rng);

            let outcomes: Vec<_> = pool.install(|| {
                (0..self.matrix.n_signatures())
                    .into_par_iter()
                    .map(|index| {
                        score_signature(&self.matrix, index, &up, &down, self.tie_break)
                            .map(|result| result.rges)
                    })
                    .collect()
            });

            for (index, outcome) in outcomes.into_iter().enumerate() {
                let id = &self.matrix.signatures()[index];
                match outcome {
                    Ok(score) => null.scores.entry(id.clone()).or_default().push(score),
                    Err(e) => {
                        if !null.failures.contains_key(id.as_str()) {
                            warn!(signature = %id, error = %e, "signature cannot be scored");
                            null.failures.insert(id.clone(), e.to_string());
                        }
                    }
                }
            }

            null.rounds = round;
            if let Some(path) = &self.checkpoint {
                null.write(path)?;
            }
        }

        Ok(null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diffex::DeRecord;

    fn matrix() -> GeneSignatureMatrix {
        GeneSignatureMatrix::from_rows(
            vec!["sig_a".to_string(), "sig_b".to_string()],
            vec![
                ("g1".to_string(), vec![4.0, 1.0]),
                ("g2".to_string(), vec![3.0, 2.0]),
                ("g3".to_string(), vec![2.0, 3.0]),
                ("g4".to_string(), vec![1.0, 4.0]),
            ],
        )
    }

    fn record(gene: &str, l2fc: f64) -> DeRecord {
        DeRecord::new(gene.into(), gene.into(), 1.0, l2fc, 0.1, 1.0, 0.01, 0.05)
    }

    fn diffex() -> DifferentialExpressionSet {
        DifferentialExpressionSet::from_records(vec![
            record("g1", 2.0),
            record("g2", 1.0),
            record("g3", -1.0),
            record("g4", -2.0),
        ])
    }

    #[test]
    fn test_every_signature_gets_one_score_per_round() {
        let diffex = diffex();
        let null = PermutationEngine::builder()
            .matrix(matrix())
            .diffex(&diffex)
            .rounds(5)
            .seed(11)
            .build()
            .run()
            .unwrap();

        assert_eq!(null.rounds, 5);
        assert_eq!(null.scores.len(), 2);
        for scores in null.scores.values() {
            assert_eq!(scores.len(), 5);
            for &s in scores {
                assert!((-2.0..=2.0).contains(&s));
            }
        }
        assert!(null.failures.is_empty());
    }

    #[test]
    fn test_same_seed_reproduces_the_null() {
        let diffex = diffex();
        let run = |seed| {
            PermutationEngine::builder()
                .matrix(matrix())
                .diffex(&diffex)
                .rounds(3)
                .seed(seed)
                .build()
                .run()
                .unwrap()
        };
        assert_eq!(run(7).scores, run(7).scores);
    }

    #[test]
    fn test_unscorable_signature_is_marked() {
        let diffex = DifferentialExpressionSet::from_records(vec![
            record("g1", 2.0),
            record("absent", -1.0),
        ]);
        let null = PermutationEngine::builder()
            .matrix(matrix())
            .diffex(&diffex)
            .rounds(2)
            .seed(3)
            .build()
            .run()
            .unwrap();

        assert!(null.scores.is_empty());
        assert_eq!(null.failures.len(), 2);
    }

    #[test]
    fn test_checkpoint_written_and_resumed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("null.json");
        let diffex = diffex();

        let first = PermutationEngine::builder()
            .matrix(matrix())
            .diffex(&diffex)
            .rounds(2)
            .seed(11)
            .checkpoint(path.clone())
            .build()
            .run()
            .unwrap();
        assert_eq!(first.rounds, 2);

        let on_disk = NullDistribution::read(&path).unwrap();
        assert_eq!(on_disk.rounds, 2);
        assert_eq!(on_disk.scores["sig_a"].len(), 2);

        // A second engine pointed at the same checkpoint only runs the
        // remaining rounds and extends the existing lists.
        let resumed = PermutationEngine::builder()
            .matrix(matrix())
            .diffex(&diffex)
            .rounds(5)
            .seed(11)
            .checkpoint(path.clone())
            .build()
            .run()
            .unwrap();
        assert_eq!(resumed.rounds, 5);
        assert_eq!(resumed.scores["sig_a"].len(), 5);
        assert_eq!(resumed.scores["sig_a"][..2], first.scores["sig_a"][..]);

        let reread = NullDistribution::read(&path).unwrap();
        assert_eq!(reread.scores["sig_b"].len(), 5);
    }

    #[test]
    fn test_bounded_worker_pool() {
        let diffex = diffex();
        let null = PermutationEngine::builder()
            .matrix(matrix())
            .diffex(&diffex)
            .rounds(2)
            .seed(5)
            .threads(2)
            .build()
            .run()
            .unwrap();
        assert_eq!(null.rounds, 2);
    }
}
