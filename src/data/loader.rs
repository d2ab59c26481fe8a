// ============================================================
// Layer 4 — Dataset Loaders
// ============================================================
// Two corpora feed the pipeline:
//
//   PlainCorpus   — three raw text files (train/val/test), used
//                   for language-model pretraining. Each file is
//                   read in full, lower-cased, whitespace-split,
//                   and kept as ONE flat token stream. Every token
//                   goes into a single shared vocabulary.
//
//   Definitions   — three JSON partition files, each an array of
//                   [target_context, definition, example_context]
//                   records. Builds the definition vocabulary from
//                   every definition token in every partition (or
//                   restores a saved one), and optionally a second
//                   conditioning vocabulary from target words and
//                   example-context tokens.
//
// Vocabulary ids depend on the order records are visited:
// train, then val, then test, each in file order.
//
// All loading happens up front; batching never touches disk.

use anyhow::{Context, Result};
use serde_json::Value;
use std::{
    fs::{self, File},
    io::BufReader,
    path::{Path, PathBuf},
};

use crate::data::{dictionary::Dictionary, preprocessor::Preprocessor};
use crate::domain::record::DefinitionRecord;
use crate::domain::traits::{Persistable, RecordSource};

// ─── JsonPartition ────────────────────────────────────────────────────────────
/// One partition file of definition records.
pub struct JsonPartition {
    path: PathBuf,
}

impl JsonPartition {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordSource for JsonPartition {
    fn load_records(&self) -> crate::error::Result<Vec<DefinitionRecord>> {
        let reader = BufReader::new(File::open(&self.path)?);
        let values: Vec<Value> = serde_json::from_reader(reader)?;

        let source_name = self.path.display().to_string();
        let records = values
            .iter()
            .enumerate()
            .map(|(i, v)| DefinitionRecord::from_json(v, &source_name, i))
            .collect::<crate::error::Result<Vec<_>>>()?;

        tracing::debug!("Loaded {} records from '{}'", records.len(), source_name);
        Ok(records)
    }
}

// ─── Definitions ──────────────────────────────────────────────────────────────
/// The three definition partitions plus their vocabularies.
#[derive(Debug, Clone)]
pub struct Definitions {
    pub train: Vec<DefinitionRecord>,
    pub val:   Vec<DefinitionRecord>,
    pub test:  Vec<DefinitionRecord>,

    /// Surface-word vocabulary used for inputs and targets
    pub vocab: Dictionary,

    /// Target words + example contexts; only built in examples mode
    pub cond_vocab: Option<Dictionary>,
}

impl Definitions {
    /// Load the three partitions from JSON files.
    ///
    /// When `vocab_path` is given the definition vocabulary is restored
    /// from it instead of being built from the definitions, which keeps
    /// ids aligned with a pretrained language model.
    pub fn load(
        train:         &Path,
        val:           &Path,
        test:          &Path,
        with_examples: bool,
        vocab_path:    Option<&Path>,
    ) -> Result<Self> {
        let load = |path: &Path| {
            JsonPartition::new(path)
                .load_records()
                .with_context(|| format!("Cannot load definitions from '{}'", path.display()))
        };

        let train = load(train)?;
        let val   = load(val)?;
        let test  = load(test)?;

        tracing::info!(
            "Loaded definitions: {} train, {} val, {} test",
            train.len(),
            val.len(),
            test.len()
        );

        let vocab = match vocab_path {
            Some(path) => {
                tracing::info!("Restoring definition vocabulary from '{}'", path.display());
                Dictionary::load(path)
                    .with_context(|| format!("Cannot restore vocabulary '{}'", path.display()))?
            }
            None => build_definition_vocab([&train, &val, &test]),
        };

        Ok(Self::from_parts(train, val, test, vocab, with_examples))
    }

    /// Assemble from already-loaded records and a definition vocabulary.
    pub fn from_parts(
        train:         Vec<DefinitionRecord>,
        val:           Vec<DefinitionRecord>,
        test:          Vec<DefinitionRecord>,
        vocab:         Dictionary,
        with_examples: bool,
    ) -> Self {
        let cond_vocab = with_examples.then(|| build_condition_vocab([&train, &val, &test]));

        tracing::info!(
            "Vocabulary sizes: definitions={}, conditioning={}",
            vocab.len(),
            cond_vocab.as_ref().map_or(0, Dictionary::len)
        );

        Self { train, val, test, vocab, cond_vocab }
    }

    /// Partitions by name, in vocabulary-building order
    pub fn splits(&self) -> [(&'static str, &[DefinitionRecord]); 3] {
        [
            ("train", self.train.as_slice()),
            ("val",   self.val.as_slice()),
            ("test",  self.test.as_slice()),
        ]
    }
}

/// Every token of every definition, partition by partition.
pub fn build_definition_vocab(partitions: [&Vec<DefinitionRecord>; 3]) -> Dictionary {
    let mut vocab = Dictionary::new();
    for records in partitions {
        for record in records {
            vocab.add_words(&record.definition);
        }
    }
    vocab
}

/// The target word, then the example context, of every record.
pub fn build_condition_vocab(partitions: [&Vec<DefinitionRecord>; 3]) -> Dictionary {
    let mut vocab = Dictionary::new();
    for records in partitions {
        for record in records {
            if let Some(word) = record.target_word() {
                vocab.add_word(word);
            }
            vocab.add_words(&record.example_context);
        }
    }
    vocab
}

// ─── PlainCorpus ──────────────────────────────────────────────────────────────
/// Flat token streams for train/val/test and the one vocabulary built from all three.
#[derive(Debug, Clone)]
pub struct PlainCorpus {
    pub vocab: Dictionary,
    pub train: Vec<String>,
    pub val:   Vec<String>,
    pub test:  Vec<String>,
}

impl PlainCorpus {
    pub fn load(train: &Path, val: &Path, test: &Path) -> Result<Self> {
        let read = |path: &Path| {
            fs::read_to_string(path)
                .with_context(|| format!("Cannot read corpus file '{}'", path.display()))
        };

        let corpus = Self::from_texts(&read(train)?, &read(val)?, &read(test)?);

        tracing::info!(
            "Loaded corpus: {} train, {} val, {} test tokens, vocabulary {}",
            corpus.train.len(),
            corpus.val.len(),
            corpus.test.len(),
            corpus.vocab.len()
        );
        Ok(corpus)
    }

    /// Tokenise in-memory texts; the vocabulary sees train, val, test in that order.
    pub fn from_texts(train: &str, val: &str, test: &str) -> Self {
        let prep      = Preprocessor::new();
        let mut vocab = Dictionary::new();

        let mut tokenize = |text: &str| {
            let tokens = prep.tokenize(text);
            vocab.add_words(&tokens);
            tokens
        };

        let train = tokenize(train);
        let val   = tokenize(val);
        let test  = tokenize(test);

        Self { vocab, train, val, test }
    }

    pub fn splits(&self) -> [(&'static str, &[String]); 3] {
        [
            ("train", self.train.as_slice()),
            ("val",   self.val.as_slice()),
            ("test",  self.test.as_slice()),
        ]
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use tempfile::tempdir;

    fn write(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, body).unwrap();
        path
    }

    fn write_partitions(dir: &Path) -> (PathBuf, PathBuf, PathBuf) {
        (
            write(dir, "train.json", r#"[[["bank","river"],["land","by","water"],["sat","on","bank"]]]"#),
            write(dir, "val.json",   r#"[[["cat"],["small","pet"],["the","cat","purrs"]]]"#),
            write(dir, "test.json",  r#"[[["run"],["move","fast"],[]]]"#),
        )
    }

    #[test]
    fn test_definitions_build_vocab_from_all_partitions() {
        let dir           = tempdir().unwrap();
        let (tr, va, te)  = write_partitions(dir.path());
        let defs          = Definitions::load(&tr, &va, &te, false, None).unwrap();

        assert_eq!(defs.train.len(), 1);
        for word in ["land", "by", "water", "small", "pet", "move", "fast"] {
            assert!(defs.vocab.contains(word), "missing {word}");
        }
        // target words are not definition tokens
        assert!(!defs.vocab.contains("bank"));
        assert!(defs.cond_vocab.is_none());
    }

    #[test]
    fn test_definitions_build_condition_vocab() {
        let dir          = tempdir().unwrap();
        let (tr, va, te) = write_partitions(dir.path());
        let defs         = Definitions::load(&tr, &va, &te, true, None).unwrap();

        let cond = defs.cond_vocab.as_ref().unwrap();
        for word in ["bank", "cat", "run", "sat", "on", "the", "purrs"] {
            assert!(cond.contains(word), "missing {word}");
        }
        // context words after the target word are not conditioning tokens
        assert!(!cond.contains("river"));
        assert!(!cond.contains("land"));
    }

    #[test]
    fn test_definitions_restore_vocab_instead_of_building() {
        let dir          = tempdir().unwrap();
        let (tr, va, te) = write_partitions(dir.path());

        let mut saved = Dictionary::new();
        saved.add_word("pretrained");
        let vocab_path = dir.path().join("vocab.json");
        saved.save(&vocab_path).unwrap();

        let defs = Definitions::load(&tr, &va, &te, false, Some(vocab_path.as_path())).unwrap();
        assert_eq!(defs.vocab, saved);
        assert!(!defs.vocab.contains("land"));
    }

    #[test]
    fn test_malformed_record_is_reported() {
        let dir = tempdir().unwrap();
        let tr  = write(dir.path(), "train.json", r#"[[["cat"],["pet"]]]"#);
        let va  = write(dir.path(), "val.json", "[]");
        let te  = write(dir.path(), "test.json", "[]");

        let err = Definitions::load(&tr, &va, &te, false, None).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::MalformedRecord { index: 0, .. })
        ));
    }

    #[test]
    fn test_missing_partition_is_io_error() {
        let dir = tempdir().unwrap();
        let va  = write(dir.path(), "val.json", "[]");
        let err = Definitions::load(&dir.path().join("absent.json"), &va, &va, false, None)
            .unwrap_err();
        assert!(matches!(err.downcast_ref::<PipelineError>(), Some(PipelineError::Io(_))));
    }

    #[test]
    fn test_plain_corpus_is_flat_and_lowercased() {
        let corpus = PlainCorpus::from_texts("The cat\nsat.", "THE dog", "");

        assert_eq!(corpus.train, vec!["the", "cat", "sat."]);
        assert_eq!(corpus.val, vec!["the", "dog"]);
        assert!(corpus.test.is_empty());
        for word in ["the", "cat", "sat.", "dog"] {
            assert!(corpus.vocab.contains(word));
        }
        assert!(!corpus.vocab.contains("The"));
    }

    #[test]
    fn test_plain_corpus_keeps_zero_width_characters_in_tokens() {
        let corpus = PlainCorpus::from_texts("\u{FEFF}The a\u{200B}b", "", "");

        assert_eq!(corpus.train, vec!["\u{feff}the", "a\u{200b}b"]);
        assert_eq!(corpus.vocab.len(), 6);
        assert!(!corpus.vocab.contains("the"));
    }

    #[test]
    fn test_plain_corpus_encode_decode_consistent() {
        let corpus  = PlainCorpus::from_texts("a b c a", "b d", "e");
        let ids     = corpus.vocab.encode_seq(&corpus.train);
        let decoded = corpus.vocab.decode_seq(&ids).unwrap();
        assert_eq!(decoded, corpus.train);
    }

    #[test]
    fn test_plain_corpus_from_files() {
        let dir = tempdir().unwrap();
        let tr  = write(dir.path(), "train.txt", "Hello World");
        let va  = write(dir.path(), "valid.txt", "hello");
        let te  = write(dir.path(), "test.txt", "world again");

        let corpus = PlainCorpus::load(&tr, &va, &te).unwrap();
        assert_eq!(corpus.train, vec!["hello", "world"]);
        assert!(corpus.vocab.contains("again"));
    }
}
