// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// One use case per CLI command. Each owns a PipelineConfig,
// saves it next to its outputs, then drives the data, ml and
// infra layers in order.
//
//   vocab    → PrepareUseCase   build + save vocabularies
//   batches  → InspectUseCase   stream definition batches
//   corpus   → CorpusUseCase    stream plain-corpus LM batches
//
// No printing here (that's Layer 1) and no batching logic
// (that's Layer 4). Only workflow coordination.

/// Run configuration shared by every use case
pub mod config;

/// Vocabulary preparation for definition datasets
pub mod prepare_use_case;

/// Definition batch streaming, statistics and perplexity
pub mod inspect_use_case;

/// Plain-corpus language-model batch streaming
pub mod corpus_use_case;
