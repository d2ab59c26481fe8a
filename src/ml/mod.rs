// ============================================================
// Layer 5 — ML Boundary (Burn)
// ============================================================
// The only layer that imports burn. Everything upstream works
// on plain Vec<Vec<TokenId>> batches; this layer turns them into
// tensors and defines what a model must provide to be scored.
//
//   tensors.rs    — LmBatch / DefBatch / ExampleBatch → burn
//                   Int and Float tensors with the shapes the
//                   recurrent definition model expects
//
//   objective.rs  — BatchObjective (batch → mean token loss)
//                   and token-weighted perplexity
//
// The model architecture and optimiser live with whoever
// implements BatchObjective; this crate only feeds it.

/// Batch → tensor conversion
pub mod tensors;

/// Loss contract and perplexity
pub mod objective;
