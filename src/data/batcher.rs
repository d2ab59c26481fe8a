// ============================================================
// Layer 4 — Batch Assemblers
// ============================================================
// Three lazy producers that slice a dataset into batches of at
// most `batch_size` encoded sequences:
//
//   batchify                     flat token stream → LmBatch
//   batchify_defs                records + vector table → DefBatch
//   batchify_defs_with_examples  records + conditioning vocab
//                                → ExampleBatch
//
// Each producer is an Iterator whose only state is a read cursor
// into a borrowed, immutable dataset. Pulling a batch does all
// the work for that batch and nothing more. To start over, call
// the constructor again with the same data.
//
// Padding:
//   Every input and target row in a batch is right-padded with
//   PAD up to the batch's longest true length, so each field is
//   a rectangular [n, max_len] block.
//
// Length sorting (definition batches only):
//   Rows are reordered by true length, longest first, because the
//   downstream recurrent model packs variable-length sequences
//   and needs lengths to be non-increasing. The sort is stable:
//   rows of equal length keep their dataset order. Each row
//   carries its input, target, lengths and conditioning together
//   through the sort, so index k means the same record in every
//   field.
//
// Shift-by-one:
//   LM mode:          input = w[i .. i+seqlen]
//                     target = w[i+1 .. i+seqlen+1]
//   Definition mode:  input = target_context ++ definition
//                     target = definition ++ [EOS]
//
// Why iterators instead of a Vec of batches?
//   A full definitions partition encodes to several times its
//   on-disk size once every row is padded. Producing one batch
//   per next() call keeps only the batch being scored in memory,
//   and the caller can stop early without paying for the rest.
//
// Why validate at construction?
//   An iterator's next() can only say "no more batches", not
//   "this batch is wrong". Bad arguments (batch_size 0, a record
//   with no target word) are therefore rejected when the
//   producer is built, before the first batch exists.
//
// Reference: Rust Book §13.2 (Processing a Series of Items
//            with Iterators)

use std::cmp::Reverse;

use crate::data::dictionary::Dictionary;
use crate::domain::record::DefinitionRecord;
use crate::domain::special::{SpecialTokens, TokenId};
use crate::domain::traits::ConditionSource;
use crate::error::{PipelineError, Result};

// ─── EncodedBatch ─────────────────────────────────────────────────────────────
/// What every batch kind exposes to statistics and loss weighting.
pub trait EncodedBatch {
    /// True (pre-padding) length of each input row
    fn lengths(&self) -> &[usize];

    /// Padded width of the input and target rows
    fn max_len(&self) -> usize;

    /// Number of rows
    fn len(&self) -> usize {
        self.lengths().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Real (non-padding) input tokens in the batch
    fn token_count(&self) -> usize {
        self.lengths().iter().sum()
    }

    /// PAD slots added to the input rows
    fn pad_count(&self) -> usize {
        self.len() * self.max_len() - self.token_count()
    }
}

// ─── Padding helpers ──────────────────────────────────────────────────────────
/// Right-pad `seq` with PAD up to `size`. Longer sequences are left alone.
pub fn pad(seq: &mut Vec<TokenId>, size: usize) {
    if seq.len() < size {
        seq.resize(size, SpecialTokens::PAD);
    }
}

/// Pad every sequence to the longest one and return that length.
///
/// There is no sensible width for zero sequences, so an empty
/// slice is an EmptyBatchInput error rather than a width of 0.
pub fn pad_batch(seqs: &mut [Vec<TokenId>]) -> Result<usize> {
    let max_len = seqs
        .iter()
        .map(Vec::len)
        .max()
        .ok_or_else(|| PipelineError::EmptyBatchInput("no sequences to pad".to_string()))?;

    for seq in seqs.iter_mut() {
        pad(seq, max_len);
    }
    Ok(max_len)
}

/// Definition records are keyed on their target word, so a record
/// whose target_context is empty cannot be batched. Records loaded
/// from JSON are already validated; this catches hand-built ones
/// before any batch is produced.
fn check_records(records: &[DefinitionRecord]) -> Result<()> {
    match records.iter().position(|r| r.target_word().is_none()) {
        Some(index) => Err(PipelineError::MalformedRecord {
            source_name: "batch input".to_string(),
            index,
            reason:      "target_context is empty".to_string(),
        }),
        None => Ok(()),
    }
}

fn check_batch_size(batch_size: usize) -> Result<()> {
    if batch_size == 0 {
        return Err(PipelineError::EmptyBatchInput(
            "batch_size must be at least 1".to_string(),
        ));
    }
    Ok(())
}

// ─── LM batches ───────────────────────────────────────────────────────────────
/// Fixed-window language-model batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LmBatch {
    /// [n, max_len] windows of the token stream
    pub inputs: Vec<Vec<TokenId>>,

    /// [n, max_len] the same windows shifted one token right
    pub targets: Vec<Vec<TokenId>>,

    /// True input length per row
    pub lengths: Vec<usize>,
}

impl EncodedBatch for LmBatch {
    fn lengths(&self) -> &[usize] {
        &self.lengths
    }

    fn max_len(&self) -> usize {
        self.inputs.first().map_or(0, Vec::len)
    }
}

/// Lazy producer over a flat token stream. See [`batchify`].
pub struct LmBatches<'a, S> {
    data:       &'a [S],
    vocab:      &'a Dictionary,
    seqlen:     usize,
    batch_size: usize,
    cursor:     usize,
}

/// Walk `data` in windows of `seqlen` tokens, `batch_size` windows per batch.
///
/// After each window the cursor skips `seqlen + 1` tokens, so the token
/// that served only as the last target of one window is never an input.
/// Inputs and targets are padded together to the longest row of the batch.
pub fn batchify<'a, S: AsRef<str>>(
    data:       &'a [S],
    vocab:      &'a Dictionary,
    seqlen:     usize,
    batch_size: usize,
) -> Result<LmBatches<'a, S>> {
    check_batch_size(batch_size)?;
    if seqlen == 0 {
        return Err(PipelineError::EmptyBatchInput("seqlen must be at least 1".to_string()));
    }
    Ok(LmBatches { data, vocab, seqlen, batch_size, cursor: 0 })
}

impl<S: AsRef<str>> LmBatches<'_, S> {
    fn remaining(&self) -> usize {
        let tokens = self.data.len().saturating_sub(self.cursor);
        let slots  = tokens.div_ceil(self.seqlen + 1);
        slots.div_ceil(self.batch_size)
    }
}

impl<S: AsRef<str>> Iterator for LmBatches<'_, S> {
    type Item = LmBatch;

    fn next(&mut self) -> Option<LmBatch> {
        let n = self.data.len();
        if self.cursor >= n {
            return None;
        }

        let mut inputs  = Vec::with_capacity(self.batch_size);
        let mut targets = Vec::with_capacity(self.batch_size);

        for _ in 0..self.batch_size {
            let i = self.cursor;
            let x = &self.data[i..(i + self.seqlen).min(n)];
            let y = &self.data[(i + 1).min(n)..(i + self.seqlen + 1).min(n)];

            inputs.push(self.vocab.encode_seq(x));
            targets.push(self.vocab.encode_seq(y));

            self.cursor += self.seqlen + 1;
            if self.cursor >= n {
                break;
            }
        }

        let lengths = inputs.iter().map(Vec::len).collect();

        // inputs and targets share one width
        let max_len = inputs.iter().chain(targets.iter()).map(Vec::len).max()?;
        for seq in inputs.iter_mut().chain(targets.iter_mut()) {
            pad(seq, max_len);
        }

        Some(LmBatch { inputs, targets, lengths })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining();
        (remaining, Some(remaining))
    }
}

impl<S: AsRef<str>> ExactSizeIterator for LmBatches<'_, S> {}

// ─── Definition batches (vector conditioning) ─────────────────────────────────
/// Definition batch conditioned on one dense vector per record.
#[derive(Debug, Clone, PartialEq)]
pub struct DefBatch {
    /// [n, max_len] encode(target_context ++ definition)
    pub inputs: Vec<Vec<TokenId>>,

    /// [n, max_len] encode(definition ++ [EOS])
    pub targets: Vec<Vec<TokenId>>,

    /// True input lengths, non-increasing
    pub lengths: Vec<usize>,

    /// [n, dim] vector for each record's target word
    pub conds: Vec<Vec<f32>>,
}

impl EncodedBatch for DefBatch {
    fn lengths(&self) -> &[usize] {
        &self.lengths
    }

    fn max_len(&self) -> usize {
        self.inputs.first().map_or(0, Vec::len)
    }
}

/// Lazy producer of [`DefBatch`]es. See [`batchify_defs`].
pub struct DefBatches<'a, C: ?Sized> {
    records:    &'a [DefinitionRecord],
    vocab:      &'a Dictionary,
    cond:       &'a C,
    batch_size: usize,
    cursor:     usize,
}

/// Batch definition records, conditioning each on the pretrained
/// vector of its target word (looked up with the definition as context).
pub fn batchify_defs<'a, C: ConditionSource + ?Sized>(
    records:    &'a [DefinitionRecord],
    vocab:      &'a Dictionary,
    cond:       &'a C,
    batch_size: usize,
) -> Result<DefBatches<'a, C>> {
    check_batch_size(batch_size)?;
    check_records(records)?;
    Ok(DefBatches { records, vocab, cond, batch_size, cursor: 0 })
}

impl<C: ConditionSource + ?Sized> Iterator for DefBatches<'_, C> {
    type Item = DefBatch;

    fn next(&mut self) -> Option<DefBatch> {
        let chunk = next_chunk(self.records, &mut self.cursor, self.batch_size)?;

        let rows = assemble(chunk, self.vocab, |record| {
            // every record was checked for a target word in batchify_defs
            let word = record.target_word().unwrap_or_default();
            self.cond.get_cond_vector(word, Some(record.definition.as_slice()))
        })?;

        let (inputs, targets, lengths, conds) = rows.into_iter().fold(
            (Vec::new(), Vec::new(), Vec::new(), Vec::new()),
            |mut acc, row| {
                acc.0.push(row.input);
                acc.1.push(row.target);
                acc.2.push(row.length);
                acc.3.push(row.extra);
                acc
            },
        );

        Some(DefBatch { inputs, targets, lengths, conds })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = remaining_chunks(self.records.len(), self.cursor, self.batch_size);
        (remaining, Some(remaining))
    }
}

impl<C: ConditionSource + ?Sized> ExactSizeIterator for DefBatches<'_, C> {}

// ─── Definition batches (example conditioning) ────────────────────────────────
/// Definition batch conditioned on id sequences from the conditioning vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExampleBatch {
    /// [n, max_len] encode(target_context ++ definition)
    pub inputs: Vec<Vec<TokenId>>,

    /// [n, max_len] encode(definition ++ [EOS])
    pub targets: Vec<Vec<TokenId>>,

    /// True input lengths, non-increasing
    pub lengths: Vec<usize>,

    /// cond_vocab.encode(target_context), NOT padded
    pub conds: Vec<Vec<TokenId>>,

    /// cond_vocab.encode(example_context), NOT padded
    pub contexts: Vec<Vec<TokenId>>,
}

impl EncodedBatch for ExampleBatch {
    fn lengths(&self) -> &[usize] {
        &self.lengths
    }

    fn max_len(&self) -> usize {
        self.inputs.first().map_or(0, Vec::len)
    }
}

/// Lazy producer of [`ExampleBatch`]es. See [`batchify_defs_with_examples`].
pub struct ExampleBatches<'a> {
    records:    &'a [DefinitionRecord],
    vocab:      &'a Dictionary,
    cond_vocab: &'a Dictionary,
    batch_size: usize,
    cursor:     usize,
}

/// Batch definition records, conditioning each on its target context
/// and its example sentence, both encoded through `cond_vocab`.
pub fn batchify_defs_with_examples<'a>(
    records:    &'a [DefinitionRecord],
    vocab:      &'a Dictionary,
    cond_vocab: &'a Dictionary,
    batch_size: usize,
) -> Result<ExampleBatches<'a>> {
    check_batch_size(batch_size)?;
    check_records(records)?;
    Ok(ExampleBatches { records, vocab, cond_vocab, batch_size, cursor: 0 })
}

impl Iterator for ExampleBatches<'_> {
    type Item = ExampleBatch;

    fn next(&mut self) -> Option<ExampleBatch> {
        let chunk = next_chunk(self.records, &mut self.cursor, self.batch_size)?;

        let rows = assemble(chunk, self.vocab, |record| {
            (
                self.cond_vocab.encode_seq(&record.target_context),
                self.cond_vocab.encode_seq(&record.example_context),
            )
        })?;

        let mut batch = ExampleBatch {
            inputs:   Vec::with_capacity(rows.len()),
            targets:  Vec::with_capacity(rows.len()),
            lengths:  Vec::with_capacity(rows.len()),
            conds:    Vec::with_capacity(rows.len()),
            contexts: Vec::with_capacity(rows.len()),
        };
        for row in rows {
            let (cond, context) = row.extra;
            batch.inputs.push(row.input);
            batch.targets.push(row.target);
            batch.lengths.push(row.length);
            batch.conds.push(cond);
            batch.contexts.push(context);
        }

        Some(batch)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = remaining_chunks(self.records.len(), self.cursor, self.batch_size);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for ExampleBatches<'_> {}

// ─── Shared record assembly ───────────────────────────────────────────────────
/// One encoded record travelling through padding and sorting.
struct Row<E> {
    input:  Vec<TokenId>,
    target: Vec<TokenId>,
    length: usize,
    extra:  E,
}

fn next_chunk<'a>(
    records:    &'a [DefinitionRecord],
    cursor:     &mut usize,
    batch_size: usize,
) -> Option<&'a [DefinitionRecord]> {
    if *cursor >= records.len() {
        return None;
    }
    let end   = (*cursor + batch_size).min(records.len());
    let chunk = &records[*cursor..end];
    *cursor   = end;
    Some(chunk)
}

fn remaining_chunks(total: usize, cursor: usize, batch_size: usize) -> usize {
    total.saturating_sub(cursor).div_ceil(batch_size)
}

/// Encode, pad and length-sort one chunk of records.
///
/// Returns None only for an empty chunk, which the producers never pass.
fn assemble<E>(
    chunk:      &[DefinitionRecord],
    vocab:      &Dictionary,
    mut extra:  impl FnMut(&DefinitionRecord) -> E,
) -> Option<Vec<Row<E>>> {
    let mut rows: Vec<Row<E>> = chunk
        .iter()
        .map(|record| {
            let mut input = vocab.encode_seq(&record.target_context);
            input.extend(vocab.encode_seq(&record.definition));

            let mut target = vocab.encode_seq(&record.definition);
            target.push(SpecialTokens::EOS);

            Row {
                length: input.len(),
                input,
                target,
                extra: extra(record),
            }
        })
        .collect();

    let max_len = rows.iter().map(|r| r.length).max()?;
    for row in rows.iter_mut() {
        pad(&mut row.input, max_len);
        pad(&mut row.target, max_len);
    }

    // stable: equal lengths keep dataset order
    rows.sort_by_key(|row| Reverse(row.length));
    Some(rows)
}
