// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Three subcommands: `vocab`, `batches` and `corpus`.
//
// Each *Args struct converts into a PipelineConfig, so the
// application layer never sees clap types.

use clap::{Args, Subcommand};

use crate::application::config::{Conditioning, PipelineConfig};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build and save the vocabularies of a definition dataset
    Vocab(VocabArgs),

    /// Stream definition batches and report statistics
    Batches(BatchesArgs),

    /// Stream language-model batches over a plain text corpus
    Corpus(CorpusArgs),
}

/// Train / valid / test files and the output directory
#[derive(Args, Debug, Clone)]
pub struct DataArgs {
    #[arg(long, default_value = "data/train.json")]
    pub train: String,

    #[arg(long, default_value = "data/valid.json")]
    pub valid: String,

    #[arg(long, default_value = "data/test.json")]
    pub test: String,

    /// Where vocabularies, run_config.json and batch_stats.csv go
    #[arg(long, default_value = "out")]
    pub output_dir: String,
}

#[derive(Args, Debug)]
pub struct VocabArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Restore the definition vocabulary from this file instead of building it
    #[arg(long)]
    pub vocab: Option<String>,

    /// Also build the conditioning vocabulary (target words + examples)
    #[arg(long)]
    pub examples: bool,
}

#[derive(Args, Debug)]
pub struct BatchesArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Restore the definition vocabulary from this file
    #[arg(long)]
    pub vocab: Option<String>,

    /// Condition on target context and example sentence
    #[arg(long)]
    pub examples: bool,

    /// word2vec text file. Conditions on one vector per target word,
    /// or with --examples seeds the conditioning embeddings
    #[arg(long)]
    pub vectors: Option<String>,

    #[arg(long, default_value_t = 16)]
    pub batch_size: usize,

    /// Shuffle training records before batching
    #[arg(long)]
    pub shuffle: bool,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

#[derive(Args, Debug)]
pub struct CorpusArgs {
    #[arg(long, default_value = "data/train.txt")]
    pub train: String,

    #[arg(long, default_value = "data/valid.txt")]
    pub valid: String,

    #[arg(long, default_value = "data/test.txt")]
    pub test: String,

    #[arg(long, default_value = "out")]
    pub output_dir: String,

    /// Tokens per LM window
    #[arg(long, default_value_t = 35)]
    pub seqlen: usize,

    #[arg(long, default_value_t = 16)]
    pub batch_size: usize,
}

fn base_config(data: DataArgs) -> PipelineConfig {
    PipelineConfig {
        train_path: data.train,
        val_path:   data.valid,
        test_path:  data.test,
        output_dir: data.output_dir,
        ..PipelineConfig::default()
    }
}

impl From<VocabArgs> for PipelineConfig {
    fn from(a: VocabArgs) -> Self {
        let conditioning = if a.examples {
            Conditioning::Examples { vectors: None }
        } else {
            Conditioning::Plain
        };
        PipelineConfig {
            vocab_path: a.vocab,
            conditioning,
            ..base_config(a.data)
        }
    }
}

impl From<BatchesArgs> for PipelineConfig {
    fn from(a: BatchesArgs) -> Self {
        let conditioning = match (a.examples, a.vectors) {
            (true, vectors)     => Conditioning::Examples { vectors },
            (false, Some(path)) => Conditioning::Vectors { path },
            (false, None)       => Conditioning::Plain,
        };
        PipelineConfig {
            vocab_path: a.vocab,
            conditioning,
            batch_size: a.batch_size,
            shuffle:    a.shuffle,
            seed:       a.seed,
            ..base_config(a.data)
        }
    }
}

impl From<CorpusArgs> for PipelineConfig {
    fn from(a: CorpusArgs) -> Self {
        PipelineConfig {
            train_path: a.train,
            val_path:   a.valid,
            test_path:  a.test,
            output_dir: a.output_dir,
            seqlen:     a.seqlen,
            batch_size: a.batch_size,
            ..PipelineConfig::default()
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    fn config_for(args: &[&str]) -> PipelineConfig {
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Commands::Vocab(a)   => a.into(),
            Commands::Batches(a) => a.into(),
            Commands::Corpus(a)  => a.into(),
        }
    }

    #[test]
    fn test_batches_defaults() {
        let cfg = config_for(&["defgen", "batches", "--examples"]);
        assert_eq!(cfg.batch_size, 16);
        assert_eq!(cfg.seed, 42);
        assert_eq!(cfg.train_path, "data/train.json");
        assert_eq!(cfg.conditioning, Conditioning::Examples { vectors: None });
    }

    #[test]
    fn test_vectors_flag_picks_vector_conditioning() {
        let cfg = config_for(&["defgen", "batches", "--vectors", "w2v.txt", "--batch-size", "4"]);
        assert_eq!(cfg.conditioning, Conditioning::Vectors { path: "w2v.txt".into() });
        assert_eq!(cfg.batch_size, 4);

        let cfg = config_for(&["defgen", "batches", "--examples", "--vectors", "w2v.txt"]);
        assert_eq!(cfg.conditioning, Conditioning::Examples { vectors: Some("w2v.txt".into()) });
    }

    #[test]
    fn test_corpus_window() {
        let cfg = config_for(&["defgen", "corpus", "--seqlen", "20", "--output-dir", "lm"]);
        assert_eq!(cfg.seqlen, 20);
        assert_eq!(cfg.output_dir, "lm");
        assert_eq!(cfg.train_path, "data/train.txt");
        assert_eq!(cfg.conditioning, Conditioning::Plain);
    }

    #[test]
    fn test_vocab_restore_path() {
        let cfg = config_for(&["defgen", "vocab", "--vocab", "lm.json", "--valid", "v.json"]);
        assert_eq!(cfg.vocab_path.as_deref(), Some("lm.json"));
        assert_eq!(cfg.val_path, "v.json");
    }
}
