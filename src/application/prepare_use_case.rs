// ============================================================
// Layer 2 — PrepareUseCase
// ============================================================
// Builds the vocabularies for a definition dataset once, so
// that every later run encodes with the same ids:
//
//   Step 1: Save run config              (Layer 6 - infra)
//   Step 2: Load the three partitions    (Layer 4 - data)
//           building the definition vocabulary, or
//           restoring it from --vocab
//   Step 3: Build the conditioning vocab (examples mode only)
//   Step 4: Save vocab.json and
//           cond_vocab.json              (Layer 6 - infra)

use anyhow::Result;
use std::path::Path;

use crate::application::config::PipelineConfig;
use crate::data::loader::Definitions;
use crate::infra::{
    config_store::ConfigStore,
    vocab_store::{VocabStore, CONDITION_VOCAB, DEFINITION_VOCAB},
};

pub struct PrepareUseCase {
    config: PipelineConfig,
}

impl PrepareUseCase {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<Definitions> {
        let cfg = &self.config;

        ConfigStore::new(&cfg.output_dir).save(cfg)?;

        let defs  = cfg.load_definitions(cfg.vocab_path.as_deref().map(Path::new))?;
        let store = VocabStore::new(&cfg.output_dir);

        store.save(DEFINITION_VOCAB, &defs.vocab)?;
        if let Some(cond_vocab) = &defs.cond_vocab {
            store.save(CONDITION_VOCAB, cond_vocab)?;
        }

        Ok(defs)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::config::Conditioning;
    use crate::data::dictionary::Dictionary;
    use crate::domain::traits::Persistable;
    use std::fs;

    fn config(dir: &Path, conditioning: Conditioning) -> PipelineConfig {
        let path = |name: &str| dir.join(name).to_string_lossy().into_owned();

        fs::write(path("train.json"), r#"[[["cat"], ["a", "pet"], ["my", "cat"]]]"#).unwrap();
        fs::write(path("valid.json"), r#"[[["owl"], ["a", "bird"], []]]"#).unwrap();
        fs::write(path("test.json"), "[]").unwrap();

        PipelineConfig {
            train_path: path("train.json"),
            val_path:   path("valid.json"),
            test_path:  path("test.json"),
            output_dir: path("out"),
            conditioning,
            ..PipelineConfig::default()
        }
    }

    #[test]
    fn test_writes_both_vocabularies_in_examples_mode() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path(), Conditioning::Examples { vectors: None });

        let defs  = PrepareUseCase::new(cfg.clone()).execute().unwrap();
        let store = VocabStore::new(&cfg.output_dir);

        let vocab = store.load(DEFINITION_VOCAB).unwrap();
        assert_eq!(vocab, defs.vocab);
        assert_eq!(vocab.encode_seq(&["a", "pet", "bird"]), vec![4, 5, 6]);

        let cond = store.load(CONDITION_VOCAB).unwrap();
        assert_eq!(cond.encode_seq(&["cat", "my", "owl"]), vec![4, 5, 6]);

        assert!(Path::new(&cfg.output_dir).join("run_config.json").is_file());
    }

    #[test]
    fn test_no_condition_vocab_without_examples() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path(), Conditioning::Plain);

        PrepareUseCase::new(cfg.clone()).execute().unwrap();
        assert!(!VocabStore::new(&cfg.output_dir).exists(CONDITION_VOCAB));
    }

    #[test]
    fn test_restores_a_given_vocabulary() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = config(dir.path(), Conditioning::Plain);

        let mut pretrained = Dictionary::new();
        pretrained.add_words(&["bird".to_string(), "pet".to_string(), "a".to_string()]);
        let vocab_path = dir.path().join("lm_vocab.json");
        pretrained.save(&vocab_path).unwrap();
        cfg.vocab_path = Some(vocab_path.to_string_lossy().into_owned());

        let defs = PrepareUseCase::new(cfg).execute().unwrap();
        assert_eq!(defs.vocab, pretrained);
        assert_eq!(defs.vocab.id("bird"), Some(4));
    }
}
