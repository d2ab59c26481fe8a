// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Parses the command line with clap and hands off to Layer 2.
//
//   defgen vocab   --train … --valid … --test … [--examples]
//   defgen batches --examples | --vectors w2v.txt [--shuffle]
//   defgen corpus  --train train.txt … --seqlen 35
//
// This layer only routes and prints; every decision is made
// by the use cases.

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{BatchesArgs, Commands, CorpusArgs, VocabArgs};

#[derive(Parser, Debug)]
#[command(
    name = "defgen",
    version,
    about = "Vocabulary and batch pipeline for definition-modelling datasets."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Vocab(args)   => run_vocab(args),
            Commands::Batches(args) => run_batches(args),
            Commands::Corpus(args)  => run_corpus(args),
        }
    }
}

fn run_vocab(args: VocabArgs) -> Result<()> {
    use crate::application::prepare_use_case::PrepareUseCase;

    tracing::info!("Preparing vocabularies from '{}'", args.data.train);

    let defs = PrepareUseCase::new(args.into()).execute()?;

    println!("Definition vocabulary: {} tokens", defs.vocab.len());
    if let Some(cond_vocab) = &defs.cond_vocab {
        println!("Conditioning vocabulary: {} tokens", cond_vocab.len());
    }
    Ok(())
}

fn run_batches(args: BatchesArgs) -> Result<()> {
    use crate::application::inspect_use_case::InspectUseCase;

    let report = InspectUseCase::new(args.into()).execute()?;

    if let Some(embeddings) = &report.embeddings {
        println!(
            "Seeded {} of {} conditioning embeddings from pretrained vectors",
            embeddings.seeded,
            embeddings.rows.len()
        );
    }
    for split in &report.splits {
        print_split(&split.stats.split, split.stats.batches, split.stats.sequences, split.perplexity);
    }
    Ok(())
}

fn run_corpus(args: CorpusArgs) -> Result<()> {
    use crate::application::corpus_use_case::CorpusUseCase;

    let reports = CorpusUseCase::new(args.into()).execute()?;

    for split in &reports {
        print_split(&split.stats.split, split.stats.batches, split.stats.sequences, split.perplexity);
    }
    Ok(())
}

fn print_split(name: &str, batches: usize, sequences: usize, perplexity: Option<f64>) {
    match perplexity {
        Some(ppl) => println!("{name:<6} {batches:>6} batches {sequences:>8} sequences  ppl {ppl:.3}"),
        None      => println!("{name:<6} {batches:>6} batches {sequences:>8} sequences  (empty)"),
    }
}
