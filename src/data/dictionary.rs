// ============================================================
// Layer 4 — Dictionary (Vocabulary)
// ============================================================
// A bidirectional token <-> id mapping.
//
//   w2i: HashMap<String, TokenId>   token → id
//   i2w: Vec<String>                id → token (position = id)
//
// The four reserved tokens are seeded at construction, so the
// first corpus token always gets id 4. After that ids are handed
// out in first-seen order and never reused: add_word only ever
// appends.
//
// The same type serves as both the definition vocabulary and
// the conditioning vocabulary; the two differ only in which
// tokens were fed to add_word.
//
// Persisted form is the JSON list i2w, pretty-printed:
//   ["<pad>", "<unk>", "<bos>", "<eos>", "the", "a", ...]
//
// Why are ids never reassigned?
//   A saved vocab.json is reloaded by later runs and by the
//   model that trains on these batches. If a rebuilt vocabulary
//   could hand "river" a different id, an embedding row learned
//   for one word would silently be read back for another.
//   Append-only ids keep every id stable across reloads.
//
// Why seed the reserved tokens first?
//   Padding is filled with id 0 all over the batchers, and the
//   model masks on it. Fixing <pad>=0 <unk>=1 <bos>=2 <eos>=3
//   before any corpus word is seen means those ids mean the
//   same thing in every vocabulary this crate writes.
//
// Reference: Rust Book §8.3 (Hash Maps)

use std::{
    collections::{HashMap, HashSet},
    fs::File,
    io::{BufReader, BufWriter},
    path::Path,
};

use crate::domain::special::{SpecialTokens, TokenId, SPECIALS};
use crate::domain::traits::Persistable;
use crate::error::{PipelineError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dictionary {
    w2i: HashMap<String, TokenId>,
    i2w: Vec<String>,
}

impl Dictionary {
    /// A dictionary holding only the reserved tokens
    pub fn new() -> Self {
        let i2w: Vec<String> = SPECIALS.words().iter().map(|w| w.to_string()).collect();
        let w2i = index_words(&i2w);
        Self { w2i, i2w }
    }

    /// Insert `word` with the next free id. No-op if already present.
    pub fn add_word(&mut self, word: &str) {
        if !self.w2i.contains_key(word) {
            self.w2i.insert(word.to_string(), self.i2w.len() as TokenId);
            self.i2w.push(word.to_string());
        }
    }

    /// Add every token in order
    pub fn add_words<'a>(&mut self, words: impl IntoIterator<Item = &'a String>) {
        for word in words {
            self.add_word(word);
        }
    }

    /// Map tokens to ids; unseen tokens become UNK.
    pub fn encode_seq<S: AsRef<str>>(&self, seq: &[S]) -> Vec<TokenId> {
        seq.iter()
            .map(|word| self.id(word.as_ref()).unwrap_or(SpecialTokens::UNK))
            .collect()
    }

    /// Map ids back to tokens.
    ///
    /// Each id must index into the inverse list; the first one that
    /// doesn't aborts the whole decode with InvalidId.
    pub fn decode_seq(&self, seq: &[TokenId]) -> Result<Vec<&str>> {
        seq.iter()
            .map(|&id| {
                self.word(id).ok_or(PipelineError::InvalidId {
                    id,
                    len: self.i2w.len(),
                })
            })
            .collect()
    }

    pub fn id(&self, word: &str) -> Option<TokenId> {
        self.w2i.get(word).copied()
    }

    pub fn word(&self, id: TokenId) -> Option<&str> {
        self.i2w.get(id as usize).map(String::as_str)
    }

    pub fn contains(&self, word: &str) -> bool {
        self.w2i.contains_key(word)
    }

    /// Number of entries, reserved tokens included
    pub fn len(&self) -> usize {
        self.i2w.len()
    }

    /// Always false in practice: the reserved tokens are never removed
    pub fn is_empty(&self) -> bool {
        self.i2w.is_empty()
    }

    /// Tokens in id order
    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.i2w.iter().map(String::as_str)
    }

    /// (token, id) pairs in id order
    pub fn entries(&self) -> impl Iterator<Item = (&str, TokenId)> {
        self.i2w
            .iter()
            .enumerate()
            .map(|(id, word)| (word.as_str(), id as TokenId))
    }

    /// Replace this dictionary's state with the one stored at `path`.
    /// On failure the current state is left untouched.
    pub fn restore(&mut self, path: &Path) -> Result<()> {
        *self = Self::load(path)?;
        Ok(())
    }

    fn from_words(i2w: Vec<String>, path: &Path) -> Result<Self> {
        let corrupt = |reason: String| PipelineError::CorruptVocabulary {
            path: path.to_path_buf(),
            reason,
        };

        let reserved = SPECIALS.words();
        if i2w.len() < reserved.len()
            || i2w.iter().zip(reserved.iter()).any(|(have, want)| have != want)
        {
            return Err(corrupt(format!(
                "the first {} entries must be {:?}",
                reserved.len(),
                reserved
            )));
        }

        let mut seen = HashSet::with_capacity(i2w.len());
        if let Some(dup) = i2w.iter().find(|w| !seen.insert(w.as_str())) {
            return Err(corrupt(format!("token {dup:?} is listed more than once")));
        }

        let w2i = index_words(&i2w);
        Ok(Self { w2i, i2w })
    }
}

impl Default for Dictionary {
    fn default() -> Self {
        Self::new()
    }
}

impl Persistable for Dictionary {
    fn save(&self, path: &Path) -> Result<()> {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, &self.i2w)?;
        tracing::debug!("Saved {} tokens to '{}'", self.len(), path.display());
        Ok(())
    }

    fn load(path: &Path) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let i2w: Vec<String> = serde_json::from_reader(reader)?;
        let dict = Self::from_words(i2w, path)?;
        tracing::debug!("Restored {} tokens from '{}'", dict.len(), path.display());
        Ok(dict)
    }
}

fn index_words(i2w: &[String]) -> HashMap<String, TokenId> {
    i2w.iter()
        .enumerate()
        .map(|(id, word)| (word.clone(), id as TokenId))
        .collect()
}
