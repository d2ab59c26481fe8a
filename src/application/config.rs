// ============================================================
// Layer 2 — Run Configuration
// ============================================================
// Every knob a run needs, independent of how it was supplied.
// The CLI converts its clap args into this struct, and each run
// saves it as run_config.json next to its outputs so the exact
// settings can be reloaded later.
//
// Defaults match the reference training setup: 16 records per
// batch, a 35-token LM window and RNG seed 42.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::data::loader::Definitions;

/// How definition records are conditioned when batched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Conditioning {
    /// No conditioning (plain corpora, or a vocabulary-only run)
    Plain,

    /// Target context and example sentence through the conditioning
    /// vocabulary. `vectors` optionally seeds the conditioning
    /// embeddings from a pretrained table.
    Examples { vectors: Option<String> },

    /// One pretrained vector per target word
    Vectors { path: String },
}

impl Conditioning {
    pub fn with_examples(&self) -> bool {
        matches!(self, Conditioning::Examples { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub train_path:   String,
    pub val_path:     String,
    pub test_path:    String,
    pub output_dir:   String,

    /// Restore the definition vocabulary from here instead of building it
    pub vocab_path:   Option<String>,

    pub conditioning: Conditioning,
    pub batch_size:   usize,

    /// LM window length (plain corpora only)
    pub seqlen:       usize,

    pub seed:         u64,

    /// Shuffle the training records before batching
    pub shuffle:      bool,
}

impl PipelineConfig {
    /// Load the three definition partitions this config points at.
    pub fn load_definitions(&self, vocab_path: Option<&Path>) -> Result<Definitions> {
        Definitions::load(
            Path::new(&self.train_path),
            Path::new(&self.val_path),
            Path::new(&self.test_path),
            self.conditioning.with_examples(),
            vocab_path,
        )
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            train_path:   "data/train.json".to_string(),
            val_path:     "data/valid.json".to_string(),
            test_path:    "data/test.json".to_string(),
            output_dir:   "out".to_string(),
            vocab_path:   None,
            conditioning: Conditioning::Plain,
            batch_size:   16,
            seqlen:       35,
            seed:         42,
            shuffle:      false,
        }
    }
}
