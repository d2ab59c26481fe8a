// ============================================================
// Layer 6 — Vocabulary Store
// ============================================================
// Keeps the vocabularies of a run side by side in the output
// directory so later runs encode with the same ids:
//
//   out/
//     vocab.json        ← definition vocabulary
//     cond_vocab.json   ← conditioning vocabulary (examples mode)
//     corpus_vocab.json ← plain-corpus vocabulary
//
// Each file is the pretty-printed i2w list written by
// Dictionary's Persistable impl.

use anyhow::{Context, Result};
use std::{fs, path::PathBuf};

use crate::data::dictionary::Dictionary;
use crate::domain::traits::Persistable;

pub const DEFINITION_VOCAB: &str = "vocab";
pub const CONDITION_VOCAB: &str  = "cond_vocab";
pub const CORPUS_VOCAB: &str     = "corpus_vocab";

pub struct VocabStore {
    dir: PathBuf,
}

impl VocabStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Where the vocabulary called `name` lives
    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.json"))
    }

    pub fn exists(&self, name: &str) -> bool {
        self.path(name).is_file()
    }

    /// Write `vocab` under `name`, creating the directory if needed
    pub fn save(&self, name: &str, vocab: &Dictionary) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create '{}'", self.dir.display()))?;

        let path = self.path(name);
        vocab
            .save(&path)
            .with_context(|| format!("Cannot write vocabulary to '{}'", path.display()))?;

        tracing::info!("Saved {} vocabulary ({} tokens) to '{}'", name, vocab.len(), path.display());
        Ok(path)
    }

    pub fn load(&self, name: &str) -> Result<Dictionary> {
        let path = self.path(name);
        let vocab = Dictionary::load(&path).with_context(|| {
            format!("Cannot load vocabulary from '{}'. Have you run 'vocab' first?", path.display())
        })?;

        tracing::info!("Loaded {} vocabulary ({} tokens)", name, vocab.len());
        Ok(vocab)
    }
}
