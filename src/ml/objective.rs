// ============================================================
// Layer 5 — Loss Contract and Perplexity
// ============================================================
// The model itself lives outside this crate. All the pipeline
// needs from it is "give me a batch, I give you back its mean
// per-token loss", which is BatchObjective.
//
// Perplexity is token-weighted: each batch's mean loss is
// multiplied by the number of real tokens in that batch, summed,
// divided by the total token count, then exponentiated.
//
//   ppl = exp( Σ_b loss_b · tokens_b  /  Σ_b tokens_b )

use anyhow::Result;
use burn::prelude::*;

use crate::data::batcher::EncodedBatch;
use crate::error::PipelineError;
use crate::ml::tensors::ToTensors;

/// Anything that can score one batch with a mean per-token loss (in nats).
pub trait BatchObjective<T> {
    fn loss(&mut self, batch: &T) -> Result<f64>;
}

// ─── UniformObjective ─────────────────────────────────────────────────────────
/// Baseline that spreads probability evenly over the vocabulary.
/// Its perplexity is exactly the vocabulary size.
#[derive(Debug, Clone, Copy)]
pub struct UniformObjective {
    vocab_size: usize,
}

impl UniformObjective {
    pub fn new(vocab_size: usize) -> Self {
        Self { vocab_size }
    }
}

impl<T> BatchObjective<T> for UniformObjective {
    fn loss(&mut self, _batch: &T) -> Result<f64> {
        Ok((self.vocab_size.max(1) as f64).ln())
    }
}

// ─── TensorObjective ──────────────────────────────────────────────────────────
/// Lets an objective written against tensors score encoded batches:
/// each batch is moved onto `device` before `inner` sees it.
pub struct TensorObjective<B: Backend, O> {
    inner:  O,
    device: B::Device,
}

impl<B: Backend, O> TensorObjective<B, O> {
    pub fn new(inner: O, device: B::Device) -> Self {
        Self { inner, device }
    }

    pub fn into_inner(self) -> O {
        self.inner
    }
}

impl<B, O, T> BatchObjective<T> for TensorObjective<B, O>
where
    B: Backend,
    T: ToTensors<B>,
    O: BatchObjective<<T as ToTensors<B>>::Output>,
{
    fn loss(&mut self, batch: &T) -> Result<f64> {
        let tensors = batch.to_tensors(&self.device);
        self.inner.loss(&tensors)
    }
}

// ─── PerplexityMeter ──────────────────────────────────────────────────────────
/// Running token-weighted loss accumulator.
#[derive(Debug, Clone, Copy, Default)]
pub struct PerplexityMeter {
    weighted_loss: f64,
    tokens:        usize,
}

impl PerplexityMeter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one batch's mean loss, weighted by its real token count
    pub fn record(&mut self, loss: f64, tokens: usize) {
        self.weighted_loss += loss * tokens as f64;
        self.tokens        += tokens;
    }

    pub fn tokens(&self) -> usize {
        self.tokens
    }

    /// Token-weighted mean loss. Undefined before any token is seen.
    pub fn mean_loss(&self) -> Result<f64> {
        if self.tokens == 0 {
            return Err(PipelineError::EmptyBatchInput(
                "no tokens were scored".to_string(),
            ).into());
        }
        Ok(self.weighted_loss / self.tokens as f64)
    }

    pub fn perplexity(&self) -> Result<f64> {
        Ok(self.mean_loss()?.exp())
    }
}

/// Score every batch with `objective` and return the stream's perplexity.
pub fn perplexity<T, O>(batches: impl IntoIterator<Item = T>, objective: &mut O) -> Result<f64>
where
    T: EncodedBatch,
    O: BatchObjective<T> + ?Sized,
{
    let mut meter = PerplexityMeter::new();
    for batch in batches {
        let loss = objective.loss(&batch)?;
        meter.record(loss, batch.token_count());
    }
    meter.perplexity()
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    use crate::data::batcher::{batchify, LmBatch};
    use crate::data::dictionary::Dictionary;
    use crate::ml::tensors::LmTensors;

    /// Returns a fixed loss per call, in order
    struct Scripted {
        losses: Vec<f64>,
        calls:  usize,
    }

    impl BatchObjective<LmBatch> for Scripted {
        fn loss(&mut self, _batch: &LmBatch) -> Result<f64> {
            let loss = self.losses[self.calls];
            self.calls += 1;
            Ok(loss)
        }
    }

    fn corpus() -> (Vec<String>, Dictionary) {
        let data: Vec<String> = "a b c d e f g".split(' ').map(String::from).collect();
        let mut vocab = Dictionary::new();
        vocab.add_words(&data);
        (data, vocab)
    }

    #[test]
    fn test_uniform_perplexity_is_vocab_size() {
        let (data, vocab) = corpus();
        let batches       = batchify(&data, &vocab, 2, 2).unwrap();
        let mut objective = UniformObjective::new(vocab.len());

        let ppl = perplexity(batches, &mut objective).unwrap();
        assert!((ppl - vocab.len() as f64).abs() < 1e-9);
    }

    #[test]
    fn test_losses_are_weighted_by_tokens() {
        let mut meter = PerplexityMeter::new();
        meter.record(1.0, 3);
        meter.record(4.0, 1);
        assert!((meter.mean_loss().unwrap() - 1.75).abs() < 1e-12);
        assert_eq!(meter.tokens(), 4);
    }

    #[test]
    fn test_scripted_objective_sees_every_batch() {
        let (data, vocab) = corpus();
        // windows of 1 with stride 2 over 7 tokens → 4 windows, 1 per batch
        let batches       = batchify(&data, &vocab, 1, 1).unwrap();
        let mut objective = Scripted { losses: vec![0.0; 4], calls: 0 };

        let ppl = perplexity(batches, &mut objective).unwrap();
        assert_eq!(objective.calls, 4);
        assert!((ppl - 1.0).abs() < 1e-12);
    }

    /// Records the tensor width of every batch it scores
    #[derive(Default)]
    struct WidthRecorder {
        widths: Vec<usize>,
    }

    impl BatchObjective<LmTensors<NdArray>> for WidthRecorder {
        fn loss(&mut self, batch: &LmTensors<NdArray>) -> Result<f64> {
            self.widths.push(batch.inputs.dims()[1]);
            Ok(1.0)
        }
    }

    #[test]
    fn test_tensor_objective_scores_converted_batches() {
        let (data, vocab) = corpus();
        // windows at 0 and 3, then 6 → [a b] [d e] | [g]
        let batches       = batchify(&data, &vocab, 2, 2).unwrap();
        let mut objective = TensorObjective::<NdArray, _>::new(WidthRecorder::default(), Default::default());

        let ppl = perplexity(batches, &mut objective).unwrap();
        assert!((ppl - 1.0_f64.exp()).abs() < 1e-9);
        assert_eq!(objective.into_inner().widths, vec![2, 1]);
    }

    #[test]
    fn test_no_tokens_is_an_error() {
        let meter = PerplexityMeter::new();
        assert!(meter.perplexity().is_err());

        let data: Vec<String> = Vec::new();
        let vocab             = Dictionary::new();
        let batches           = batchify(&data, &vocab, 2, 2).unwrap();
        assert!(perplexity(batches, &mut UniformObjective::new(10)).is_err());
    }
}
