// ============================================================
// Layer 4 — Conditioning Vector Source
// ============================================================
// A pretrained word-vector table read from the word2vec TEXT
// format:
//
//   3 4                      ← header: <count> <dim>
//   bank 0.1 0.2 0.3 0.4
//   river 0.5 0.1 0.0 0.2
//   cat -0.3 0.9 0.1 0.1
//
// Row i belongs to the i-th word in the file, which gives the
// membership-testable word → row id map used when seeding the
// conditioning embeddings.
//
// Lookups for words the table has never seen return a zero
// vector of the table's dimension, so a batch can always be
// assembled.
//
// Why the text format and not the binary one?
//   The text form can be produced and inspected with ordinary
//   tools, and parsing it needs nothing beyond BufRead::lines.
//   Each malformed line is reported with its 1-based line
//   number so a broken export can be found quickly.
//
// Reference: Mikolov et al. (2013), word2vec text format

use std::{
    collections::HashMap,
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use crate::data::dictionary::Dictionary;
use crate::domain::traits::ConditionSource;
use crate::error::{PipelineError, Result};

#[derive(Debug, Clone)]
pub struct PretrainedVectors {
    dim:     usize,
    w2i:     HashMap<String, usize>,
    vectors: Vec<Vec<f32>>,
}

impl PretrainedVectors {
    /// An empty table of the given dimension
    pub fn new(dim: usize) -> Self {
        Self { dim, w2i: HashMap::new(), vectors: Vec::new() }
    }

    /// Add or overwrite the vector for `word`.
    pub fn insert(&mut self, word: &str, vector: Vec<f32>) -> Result<()> {
        if vector.len() != self.dim {
            return Err(PipelineError::ShapeMismatch(format!(
                "expected {} values for '{word}', got {}",
                self.dim,
                vector.len()
            )));
        }
        match self.w2i.get(word) {
            Some(&row) => self.vectors[row] = vector,
            None => {
                self.w2i.insert(word.to_string(), self.vectors.len());
                self.vectors.push(vector);
            }
        }
        Ok(())
    }

    /// Read a word2vec text file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let table = Self::from_reader(BufReader::new(File::open(path)?))?;
        tracing::info!(
            "Loaded {} pretrained vectors (dim={}) from '{}'",
            table.len(),
            table.dim,
            path.display()
        );
        Ok(table)
    }

    /// Parse the word2vec text format from any buffered reader.
    pub fn from_reader(reader: impl BufRead) -> Result<Self> {
        let mut lines = reader.lines();

        let header = lines.next().transpose()?.ok_or(PipelineError::InvalidVectors {
            line:   1,
            reason: "file is empty".to_string(),
        })?;
        let (count, dim) = parse_header(&header)?;

        let mut table = Self::new(dim);
        for (offset, line) in lines.enumerate() {
            let line_no = offset + 2;
            let line    = line?;
            if line.trim().is_empty() {
                continue;
            }

            let mut parts = line.split_whitespace();
            let word = parts.next().unwrap_or_default();
            let vector = parts
                .map(str::parse::<f32>)
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| PipelineError::InvalidVectors {
                    line:   line_no,
                    reason: format!("bad value for '{word}': {e}"),
                })?;

            if vector.len() != dim {
                return Err(PipelineError::InvalidVectors {
                    line:   line_no,
                    reason: format!("expected {dim} values for '{word}', got {}", vector.len()),
                });
            }
            table.insert(word, vector)?;
        }

        if table.len() != count {
            tracing::warn!("Vector header promised {} rows, found {}", count, table.len());
        }
        Ok(table)
    }

    /// Row id of `word` in the table
    pub fn id(&self, word: &str) -> Option<usize> {
        self.w2i.get(word).copied()
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}

impl ConditionSource for PretrainedVectors {
    fn dim(&self) -> usize {
        self.dim
    }

    fn contains(&self, token: &str) -> bool {
        self.w2i.contains_key(token)
    }

    // Keyed on the token alone; the definition context is not used.
    fn get_cond_vector(&self, token: &str, _context: Option<&[String]>) -> Vec<f32> {
        match self.w2i.get(token) {
            Some(&row) => self.vectors[row].clone(),
            None => vec![0.0; self.dim],
        }
    }
}

fn parse_header(header: &str) -> Result<(usize, usize)> {
    let bad = |reason: &str| PipelineError::InvalidVectors {
        line:   1,
        reason: format!("{reason} in header '{header}'"),
    };

    let mut parts = header.split_whitespace();
    let count = parts
        .next()
        .and_then(|s| s.parse::<usize>().ok())
        .ok_or_else(|| bad("missing row count"))?;
    let dim = parts
        .next()
        .and_then(|s| s.parse::<usize>().ok())
        .filter(|&d| d > 0)
        .ok_or_else(|| bad("missing or zero dimension"))?;
    Ok((count, dim))
}

// ─── Embedding Seeding ────────────────────────────────────────────────────────
/// Copy pretrained vectors into an embedding matrix indexed by
/// conditioning-vocabulary id.
///
/// `rows[id]` is overwritten for every vocabulary token the source
/// knows; every other row keeps its existing (random) initialisation.
/// Returns how many rows were seeded.
pub fn seed_embeddings(
    cond_vocab: &Dictionary,
    source:     &impl ConditionSource,
    rows:       &mut [Vec<f32>],
) -> Result<usize> {
    if rows.len() < cond_vocab.len() {
        return Err(PipelineError::ShapeMismatch(format!(
            "embedding matrix has {} rows but the vocabulary has {} tokens",
            rows.len(),
            cond_vocab.len()
        )));
    }

    let mut seeded = 0usize;
    for (word, id) in cond_vocab.entries() {
        if source.contains(word) {
            rows[id as usize] = source.get_cond_vector(word, None);
            seeded += 1;
        }
    }

    tracing::info!(
        "Seeded {} of {} conditioning embeddings from pretrained vectors",
        seeded,
        cond_vocab.len()
    );
    Ok(seeded)
}
