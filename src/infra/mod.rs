// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Everything a run writes next to its outputs:
//
//   vocab_store.rs   — vocab.json / cond_vocab.json /
//                      corpus_vocab.json, so later runs encode
//                      with the same ids
//
//   config_store.rs  — run_config.json, the PipelineConfig the
//                      run was started with
//
//   metrics.rs       — batch_stats.csv, one summary row per
//                      split (batches, rows, tokens, padding)
//
// The data layer knows how to serialise a Dictionary; this
// layer decides where files live and adds the context an
// operator needs when something is missing.

/// Vocabulary files in the output directory
pub mod vocab_store;

/// Run configuration persistence
pub mod config_store;

/// Per-split batch statistics CSV
pub mod metrics;
