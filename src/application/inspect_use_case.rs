// ============================================================
// Layer 2 — InspectUseCase
// ============================================================
// Streams every definition partition through the configured
// assembler exactly as training would, without a model:
//
//   Step 1: Save run config                  (Layer 6 - infra)
//   Step 2: Load records + vocabularies      (Layer 4 - data)
//           reusing vocab.json / cond_vocab.json from a
//           previous `vocab` run when present
//   Step 3: Load pretrained vectors          (Layer 4 - data)
//           and seed conditioning embeddings (examples mode),
//           saved as cond_embeddings.json
//   Step 4: Shuffle training records         (optional)
//   Step 5: Batch each split, convert every
//           batch to tensors and score it    (Layer 5 - ml)
//   Step 6: Append per-split stats to CSV    (Layer 6 - infra)
//
// Scoring uses UniformObjective, so every split's perplexity
// should come out equal to the vocabulary size. Anything else
// points at a broken batch stream.

use anyhow::{bail, Context, Result};
use burn::backend::NdArray;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

use crate::application::config::{Conditioning, PipelineConfig};
use crate::data::{
    batcher::{batchify_defs, batchify_defs_with_examples, EncodedBatch},
    conditioning::{seed_embeddings, PretrainedVectors},
    shuffle::shuffle_records,
};
use crate::domain::traits::ConditionSource;
use crate::infra::{
    config_store::ConfigStore,
    metrics::{BatchStats, StatsLogger},
    vocab_store::{VocabStore, CONDITION_VOCAB, DEFINITION_VOCAB},
};
use crate::ml::objective::{perplexity, BatchObjective, TensorObjective, UniformObjective};

// ─── Reports ──────────────────────────────────────────────────────────────────
/// What one split's batch stream looked like
#[derive(Debug, Clone)]
pub struct SplitReport {
    pub stats:      BatchStats,

    /// None when the split produced no tokens
    pub perplexity: Option<f64>,
}

/// Conditioning embedding matrix, one row per conditioning-vocab id.
/// Rows for words the pretrained table lacks stay zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeededEmbeddings {
    pub rows:   Vec<Vec<f32>>,

    /// Rows copied from the pretrained table
    pub seeded: usize,
}

pub const SEEDED_EMBEDDINGS: &str = "cond_embeddings.json";

#[derive(Debug, Clone)]
pub struct InspectReport {
    pub splits:     Vec<SplitReport>,

    /// Present in examples mode when pretrained vectors were given
    pub embeddings: Option<SeededEmbeddings>,
}

/// Drain `batches` into `objective`, collecting statistics on the way.
pub(crate) fn score_split<T, O>(
    split:     &str,
    batches:   impl IntoIterator<Item = T>,
    objective: &mut O,
) -> Result<SplitReport>
where
    T: EncodedBatch,
    O: BatchObjective<T>,
{
    let mut stats = BatchStats::new(split);
    let scored    = perplexity(batches.into_iter().inspect(|b| stats.record(b)), objective);

    let perplexity = if stats.tokens == 0 { None } else { Some(scored?) };

    match perplexity {
        Some(ppl) => tracing::info!(
            "{}: {} batches, {} sequences, perplexity {:.3}",
            split,
            stats.batches,
            stats.sequences,
            ppl
        ),
        None => tracing::warn!("{}: no batches produced", split),
    }

    Ok(SplitReport { stats, perplexity })
}

// ─── InspectUseCase ───────────────────────────────────────────────────────────
pub struct InspectUseCase {
    config: PipelineConfig,
}

impl InspectUseCase {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<InspectReport> {
        let cfg = &self.config;

        if cfg.conditioning == Conditioning::Plain {
            bail!("'batches' needs a conditioning mode: pass --examples or --vectors <file>");
        }

        // ── Step 1: Save config ───────────────────────────────────────────────
        ConfigStore::new(&cfg.output_dir).save(cfg)?;

        // ── Step 2: Records and vocabularies ──────────────────────────────────
        let store      = VocabStore::new(&cfg.output_dir);
        let vocab_path = match &cfg.vocab_path {
            Some(path) => Some(Path::new(path).to_path_buf()),
            None if store.exists(DEFINITION_VOCAB) => Some(store.path(DEFINITION_VOCAB)),
            None => None,
        };

        let mut defs = cfg.load_definitions(vocab_path.as_deref())?;

        if cfg.conditioning.with_examples() && store.exists(CONDITION_VOCAB) {
            defs.cond_vocab = Some(store.load(CONDITION_VOCAB)?);
        }

        // ── Step 4: Shuffle ───────────────────────────────────────────────────
        if cfg.shuffle {
            shuffle_records(&mut defs.train, cfg.seed, 0);
        }

        let logger    = StatsLogger::new(&cfg.output_dir)?;
        let objective = UniformObjective::new(defs.vocab.len());
        let mut objective = TensorObjective::<NdArray, _>::new(objective, Default::default());

        // ── Steps 3 + 5: Conditioning and batching ────────────────────────────
        let mut report = InspectReport { splits: Vec::with_capacity(3), embeddings: None };

        match &cfg.conditioning {
            Conditioning::Examples { vectors } => {
                let cond_vocab = defs
                    .cond_vocab
                    .as_ref()
                    .context("Conditioning vocabulary was not built")?;

                if let Some(path) = vectors {
                    let table    = load_vectors(path)?;
                    let mut rows = vec![vec![0.0f32; table.dim()]; cond_vocab.len()];
                    let seeded   = seed_embeddings(cond_vocab, &table, &mut rows)?;

                    let embeddings = SeededEmbeddings { rows, seeded };
                    save_embeddings(Path::new(&cfg.output_dir), &embeddings)?;
                    report.embeddings = Some(embeddings);
                }

                for (split, records) in defs.splits() {
                    let batches = batchify_defs_with_examples(
                        records,
                        &defs.vocab,
                        cond_vocab,
                        cfg.batch_size,
                    )?;
                    report.splits.push(score_split(split, batches, &mut objective)?);
                }
            }
            Conditioning::Vectors { path } => {
                let table = load_vectors(path)?;
                for (split, records) in defs.splits() {
                    let batches = batchify_defs(records, &defs.vocab, &table, cfg.batch_size)?;
                    report.splits.push(score_split(split, batches, &mut objective)?);
                }
            }
            Conditioning::Plain => {}
        }

        // ── Step 6: Stats CSV ─────────────────────────────────────────────────
        for split in &report.splits {
            logger.log(&split.stats)?;
        }
        tracing::info!("Batch statistics written to '{}'", logger.csv_path().display());

        Ok(report)
    }
}

fn load_vectors(path: &str) -> Result<PretrainedVectors> {
    PretrainedVectors::from_file(Path::new(path))
        .with_context(|| format!("Cannot load pretrained vectors from '{path}'"))
}

fn save_embeddings(dir: &Path, embeddings: &SeededEmbeddings) -> Result<()> {
    let path = dir.join(SEEDED_EMBEDDINGS);
    let json = serde_json::to_string(embeddings)?;
    fs::write(&path, json)
        .with_context(|| format!("Cannot write embeddings to '{}'", path.display()))?;

    tracing::info!("Conditioning embeddings written to '{}'", path.display());
    Ok(())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::prepare_use_case::PrepareUseCase;
    use tempfile::TempDir;

    const TRAIN: &str = r#"[
        [["cat"], ["a", "small", "pet"], ["the", "cat", "sat"]],
        [["dog"], ["a", "loyal", "pet", "animal"], []],
        [["fox"], ["a", "wild", "animal"], ["a", "fox", "ran"]]
    ]"#;
    const VAL: &str  = r#"[[["owl"], ["a", "night", "bird"], []]]"#;
    const TEST: &str = r#"[]"#;

    const VECTORS: &str = "3 2\ncat 1.0 0.0\ndog 0.0 1.0\nbird 0.5 0.5\n";

    fn workspace() -> (TempDir, PipelineConfig) {
        let dir  = tempfile::tempdir().unwrap();
        let path = |name: &str| dir.path().join(name).to_string_lossy().into_owned();

        fs::write(path("train.json"), TRAIN).unwrap();
        fs::write(path("valid.json"), VAL).unwrap();
        fs::write(path("test.json"), TEST).unwrap();
        fs::write(path("w2v.txt"), VECTORS).unwrap();

        let cfg = PipelineConfig {
            train_path: path("train.json"),
            val_path:   path("valid.json"),
            test_path:  path("test.json"),
            output_dir: path("out"),
            batch_size: 2,
            ..PipelineConfig::default()
        };
        (dir, cfg)
    }

    fn vectors_path(dir: &TempDir) -> String {
        dir.path().join("w2v.txt").to_string_lossy().into_owned()
    }

    #[test]
    fn test_examples_mode_reports_every_split() {
        let (dir, mut cfg) = workspace();
        cfg.conditioning   = Conditioning::Examples { vectors: Some(vectors_path(&dir)) };

        let report = InspectUseCase::new(cfg.clone()).execute().unwrap();
        assert_eq!(report.splits.len(), 3);

        let train = &report.splits[0];
        assert_eq!(train.stats.split, "train");
        assert_eq!(train.stats.batches, 2);
        assert_eq!(train.stats.sequences, 3);
        // 4 + 5 + 4 real input tokens
        assert_eq!(train.stats.tokens, 13);

        // the empty test split produces nothing to score
        assert_eq!(report.splits[2].stats.batches, 0);
        assert!(report.splits[2].perplexity.is_none());

        // cat and dog are in both the conditioning vocab and the table
        let embeddings = report.embeddings.as_ref().unwrap();
        assert_eq!(embeddings.seeded, 2);

        let csv = fs::read_to_string(Path::new(&cfg.output_dir).join("batch_stats.csv")).unwrap();
        assert_eq!(csv.lines().count(), 4);
        assert!(Path::new(&cfg.output_dir).join("run_config.json").is_file());
    }

    #[test]
    fn test_uniform_perplexity_matches_vocab_size() {
        let (dir, mut cfg) = workspace();
        cfg.conditioning   = Conditioning::Vectors { path: vectors_path(&dir) };

        let report = InspectUseCase::new(cfg).execute().unwrap();
        // 4 reserved + a small pet loyal animal wild night bird
        let vocab_size = 12.0;
        for split in report.splits.iter().filter(|s| s.perplexity.is_some()) {
            let ppl = split.perplexity.unwrap();
            assert!((ppl - vocab_size).abs() < 1e-6, "{}: {}", split.stats.split, ppl);
        }
    }

    #[test]
    fn test_reuses_vocabulary_from_prepare_run() {
        let (_dir, mut cfg) = workspace();
        cfg.conditioning    = Conditioning::Examples { vectors: None };

        PrepareUseCase::new(cfg.clone()).execute().unwrap();
        // appending a token to the saved vocabulary must be visible here
        let store     = VocabStore::new(&cfg.output_dir);
        let mut vocab = store.load(DEFINITION_VOCAB).unwrap();
        vocab.add_word("extra");
        store.save(DEFINITION_VOCAB, &vocab).unwrap();

        let report = InspectUseCase::new(cfg.clone()).execute().unwrap();
        let ppl    = report.splits[0].perplexity.unwrap();
        assert!((ppl - 13.0).abs() < 1e-6);
        assert!(report.embeddings.is_none());
        assert!(!Path::new(&cfg.output_dir).join(SEEDED_EMBEDDINGS).exists());
    }

    #[test]
    fn test_seeded_embeddings_are_saved() {
        let (dir, mut cfg) = workspace();
        cfg.conditioning   = Conditioning::Examples { vectors: Some(vectors_path(&dir)) };

        let report     = InspectUseCase::new(cfg.clone()).execute().unwrap();
        let embeddings = report.embeddings.unwrap();

        // one row per conditioning id, table width 2
        assert!(embeddings.rows.iter().all(|row| row.len() == 2));
        let mut filled: Vec<Vec<f32>> = embeddings
            .rows
            .iter()
            .filter(|row| row.iter().any(|&x| x != 0.0))
            .cloned()
            .collect();
        filled.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(filled, vec![vec![0.0, 1.0], vec![1.0, 0.0]]);

        let json  = fs::read_to_string(Path::new(&cfg.output_dir).join(SEEDED_EMBEDDINGS)).unwrap();
        let saved: SeededEmbeddings = serde_json::from_str(&json).unwrap();
        assert_eq!(saved, embeddings);
    }

    #[test]
    fn test_shuffle_keeps_split_totals() {
        let (_dir, mut cfg) = workspace();
        cfg.conditioning    = Conditioning::Examples { vectors: None };
        cfg.shuffle         = true;

        let report = InspectUseCase::new(cfg).execute().unwrap();
        assert_eq!(report.splits[0].stats.sequences, 3);
        assert_eq!(report.splits[0].stats.tokens, 13);
    }

    #[test]
    fn test_plain_conditioning_is_rejected() {
        let (_dir, cfg) = workspace();
        assert!(InspectUseCase::new(cfg).execute().is_err());
    }
}
