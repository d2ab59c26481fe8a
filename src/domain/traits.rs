// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The seams between layers:
//
//   RecordSource     — where definition records come from
//                      (JsonPartition today)
//   ConditionSource  — where dense conditioning vectors come
//                      from (PretrainedVectors today)
//   Persistable      — anything saved to and restored from disk
//                      (Dictionary)
//
// The batchers and the application layer only see these traits,
// so a different record format or vector table slots in without
// touching them.

use std::path::Path;

use crate::domain::record::DefinitionRecord;
use crate::error::Result;

// ─── RecordSource ─────────────────────────────────────────────────────────────
/// Any component that can produce definition records.
pub trait RecordSource {
    /// Load every record in source order.
    /// Fails with MalformedRecord on the first bad record.
    fn load_records(&self) -> Result<Vec<DefinitionRecord>>;
}

// ─── ConditionSource ──────────────────────────────────────────────────────────
/// A read-only table mapping a conditioning token to a fixed-size vector.
///
/// Shared by reference between batchers, so implementations must
/// not mutate themselves while answering lookups.
pub trait ConditionSource {
    /// Length of every vector this source returns
    fn dim(&self) -> usize;

    /// True when the table holds a vector for `token`
    fn contains(&self, token: &str) -> bool;

    /// The conditioning vector for `token`.
    ///
    /// `context` carries the tokens the vector is conditioned
    /// alongside (the definition, during batching). Sources that
    /// only key on the token are free to ignore it.
    fn get_cond_vector(&self, token: &str, context: Option<&[String]>) -> Vec<f32>;
}

// ─── Persistable ──────────────────────────────────────────────────────────────
/// Any component whose state can be saved and restored from disk.
pub trait Persistable: Sized {
    /// Save this component's state to the given path
    fn save(&self, path: &Path) -> Result<()>;

    /// Load a component's state from the given path
    fn load(path: &Path) -> Result<Self>;
}
