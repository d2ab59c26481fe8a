// ============================================================
// Layer 5 — Batch → Tensor Conversion
// ============================================================
// Turns encoded batches into the burn tensors the recurrent
// model consumes:
//
//   forward(inputs, lengths, max_len, conds, contexts, hidden)
//
// Shapes (n = rows in the batch):
//   inputs / targets   [n, max_len]  Int
//   lengths            [n]           Int   true lengths
//   conds (vectors)    [n, dim]      Float
//   conds (ids)        [n, c]        Int   right-padded with PAD
//   contexts           [n, k]        Int   right-padded with PAD
//
// The id-sequence conditioning fields arrive ragged from the
// batcher, so they are padded here to their own widest row. A
// width of at least 1 is kept so that a batch whose contexts are
// all empty still makes a valid tensor.
//
// burn Int tensors are built from i32, as in the rest of the
// codebase.

use burn::prelude::*;

use crate::data::batcher::{DefBatch, ExampleBatch, LmBatch};
use crate::domain::special::{SpecialTokens, TokenId};

// ─── Tensor bundles ───────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct LmTensors<B: Backend> {
    pub inputs:  Tensor<B, 2, Int>,
    pub targets: Tensor<B, 2, Int>,
    pub lengths: Tensor<B, 1, Int>,
    pub max_len: usize,
}

#[derive(Debug, Clone)]
pub struct DefTensors<B: Backend> {
    pub inputs:  Tensor<B, 2, Int>,
    pub targets: Tensor<B, 2, Int>,
    pub lengths: Tensor<B, 1, Int>,
    pub max_len: usize,
    pub conds:   Tensor<B, 2>,
}

#[derive(Debug, Clone)]
pub struct ExampleTensors<B: Backend> {
    pub inputs:   Tensor<B, 2, Int>,
    pub targets:  Tensor<B, 2, Int>,
    pub lengths:  Tensor<B, 1, Int>,
    pub max_len:  usize,
    pub conds:    Tensor<B, 2, Int>,
    pub contexts: Tensor<B, 2, Int>,
}

impl<B: Backend> LmTensors<B> {
    pub fn from_batch(batch: &LmBatch, device: &B::Device) -> Self {
        let max_len = row_width(&batch.inputs);
        Self {
            inputs:  int_matrix(&batch.inputs, max_len, device),
            targets: int_matrix(&batch.targets, max_len, device),
            lengths: int_vector(&batch.lengths, device),
            max_len,
        }
    }
}

impl<B: Backend> DefTensors<B> {
    pub fn from_batch(batch: &DefBatch, device: &B::Device) -> Self {
        let max_len = row_width(&batch.inputs);
        let dim     = batch.conds.first().map_or(0, Vec::len);

        let flat: Vec<f32> = batch.conds.iter().flatten().copied().collect();
        let conds = Tensor::<B, 1>::from_floats(flat.as_slice(), device)
            .reshape([batch.conds.len(), dim]);

        Self {
            inputs:  int_matrix(&batch.inputs, max_len, device),
            targets: int_matrix(&batch.targets, max_len, device),
            lengths: int_vector(&batch.lengths, device),
            max_len,
            conds,
        }
    }
}

impl<B: Backend> ExampleTensors<B> {
    pub fn from_batch(batch: &ExampleBatch, device: &B::Device) -> Self {
        let max_len = row_width(&batch.inputs);
        Self {
            inputs:   int_matrix(&batch.inputs, max_len, device),
            targets:  int_matrix(&batch.targets, max_len, device),
            lengths:  int_vector(&batch.lengths, device),
            max_len,
            conds:    ragged_matrix(&batch.conds, device),
            contexts: ragged_matrix(&batch.contexts, device),
        }
    }
}

// ─── ToTensors ────────────────────────────────────────────────────────────────
/// An encoded batch that knows its tensor form.
pub trait ToTensors<B: Backend> {
    type Output;

    fn to_tensors(&self, device: &B::Device) -> Self::Output;
}

impl<B: Backend> ToTensors<B> for LmBatch {
    type Output = LmTensors<B>;

    fn to_tensors(&self, device: &B::Device) -> LmTensors<B> {
        LmTensors::from_batch(self, device)
    }
}

impl<B: Backend> ToTensors<B> for DefBatch {
    type Output = DefTensors<B>;

    fn to_tensors(&self, device: &B::Device) -> DefTensors<B> {
        DefTensors::from_batch(self, device)
    }
}

impl<B: Backend> ToTensors<B> for ExampleBatch {
    type Output = ExampleTensors<B>;

    fn to_tensors(&self, device: &B::Device) -> ExampleTensors<B> {
        ExampleTensors::from_batch(self, device)
    }
}

// ─── Helpers ──────────────────────────────────────────────────────────────────
fn row_width(rows: &[Vec<TokenId>]) -> usize {
    rows.first().map_or(0, Vec::len)
}

/// Rows that already share `width`
fn int_matrix<B: Backend>(
    rows:   &[Vec<TokenId>],
    width:  usize,
    device: &B::Device,
) -> Tensor<B, 2, Int> {
    let flat: Vec<i32> = rows
        .iter()
        .flat_map(|row| row.iter().map(|&id| id as i32))
        .collect();

    Tensor::<B, 1, Int>::from_ints(flat.as_slice(), device).reshape([rows.len(), width])
}

/// Ragged rows, right-padded with PAD to the widest row (minimum 1)
fn ragged_matrix<B: Backend>(rows: &[Vec<TokenId>], device: &B::Device) -> Tensor<B, 2, Int> {
    let width = rows.iter().map(Vec::len).max().unwrap_or(0).max(1);

    let flat: Vec<i32> = rows
        .iter()
        .flat_map(|row| {
            row.iter()
                .map(|&id| id as i32)
                .chain(std::iter::repeat(SpecialTokens::PAD as i32).take(width - row.len()))
        })
        .collect();

    Tensor::<B, 1, Int>::from_ints(flat.as_slice(), device).reshape([rows.len(), width])
}

fn int_vector<B: Backend>(values: &[usize], device: &B::Device) -> Tensor<B, 1, Int> {
    let ints: Vec<i32> = values.iter().map(|&v| v as i32).collect();
    Tensor::<B, 1, Int>::from_ints(ints.as_slice(), device)
}
