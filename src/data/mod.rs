// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything between raw files and encoded batches:
//
//   corpus .txt / definitions .json
//       │
//       ▼
//   loader          → PlainCorpus / Definitions (records in memory)
//       │
//       ▼
//   dictionary      → token ↔ id vocabularies
//       │
//       ▼
//   batcher         → LmBatch / DefBatch / ExampleBatch
//       │             (conditioning → pretrained vectors)
//       ▼
//   ml::tensors     → burn tensors for the model
//
// No module here reads from disk once loading has finished.

/// Token ↔ id vocabulary with reserved tokens and JSON persistence
pub mod dictionary;

/// Lower-cases and whitespace-splits plain corpus text
pub mod preprocessor;

/// Loads plain corpora and definition partitions, builds vocabularies
pub mod loader;

/// Pretrained word vectors and conditioning-embedding seeding
pub mod conditioning;

/// The three lazy batch assemblers
pub mod batcher;

/// Seeded per-epoch record shuffling
pub mod shuffle;
