// ============================================================
// Layer 2 — CorpusUseCase
// ============================================================
// The language-model side of the pipeline: a plain text corpus
// split into train / valid / test files.
//
//   Step 1: Save run config                       (Layer 6)
//   Step 2: Tokenise the three files, build vocab (Layer 4)
//   Step 3: Save corpus_vocab.json                (Layer 6)
//   Step 4: Window each split with batchify,
//           convert to tensors and score          (Layer 5)
//   Step 5: Append per-split stats to CSV         (Layer 6)

use anyhow::Result;
use burn::backend::NdArray;
use std::path::Path;

use crate::application::config::PipelineConfig;
use crate::application::inspect_use_case::{score_split, SplitReport};
use crate::data::{batcher::batchify, loader::PlainCorpus};
use crate::infra::{
    config_store::ConfigStore,
    metrics::StatsLogger,
    vocab_store::{VocabStore, CORPUS_VOCAB},
};
use crate::ml::objective::{TensorObjective, UniformObjective};

pub struct CorpusUseCase {
    config: PipelineConfig,
}

impl CorpusUseCase {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<Vec<SplitReport>> {
        let cfg = &self.config;

        ConfigStore::new(&cfg.output_dir).save(cfg)?;

        let corpus = PlainCorpus::load(
            Path::new(&cfg.train_path),
            Path::new(&cfg.val_path),
            Path::new(&cfg.test_path),
        )?;
        VocabStore::new(&cfg.output_dir).save(CORPUS_VOCAB, &corpus.vocab)?;

        let logger        = StatsLogger::new(&cfg.output_dir)?;
        let objective     = UniformObjective::new(corpus.vocab.len());
        let mut objective = TensorObjective::<NdArray, _>::new(objective, Default::default());

        let mut reports = Vec::with_capacity(3);
        for (split, tokens) in corpus.splits() {
            let batches = batchify(tokens, &corpus.vocab, cfg.seqlen, cfg.batch_size)?;
            let report  = score_split(split, batches, &mut objective)?;
            logger.log(&report.stats)?;
            reports.push(report);
        }

        Ok(reports)
    }
}
