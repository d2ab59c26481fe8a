// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain structs and traits describing what the pipeline works
// with. No burn types, no file formats beyond the JSON shape of
// a record, no batching logic.

/// Reserved control tokens and the TokenId alias
pub mod special;

/// A raw definitions record (target context, definition, example)
pub mod record;

/// Core abstractions (traits) that other layers implement
pub mod traits;
