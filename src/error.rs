// ============================================================
// Pipeline Errors
// ============================================================
// Typed failures raised by the library layers (domain, data,
// infra, ml). The application and CLI layers wrap these in
// anyhow::Error and attach context about which file or split
// was being processed.
//
// Unknown tokens are deliberately NOT an error: encoding maps
// them to UNK and carries on.

use std::path::PathBuf;

use crate::domain::special::TokenId;

/// Every failure the pipeline can report to its caller.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// `decode_seq` was handed an id outside the inverse list
    #[error("token id {id} is out of range for a vocabulary of {len} entries")]
    InvalidId { id: TokenId, len: usize },

    /// A batch boundary was requested over zero sequences, or an
    /// assembler was configured so that it could never make progress
    #[error("cannot build a batch: {0}")]
    EmptyBatchInput(String),

    /// A structured record is missing fields or has the wrong shape
    #[error("malformed record #{index} in {source_name}: {reason}")]
    MalformedRecord {
        source_name: String,
        index:       usize,
        reason:      String,
    },

    /// A persisted vocabulary does not start with the reserved tokens
    /// or lists the same token twice
    #[error("corrupt vocabulary file '{path}': {reason}")]
    CorruptVocabulary { path: PathBuf, reason: String },

    /// A pretrained vector table line could not be parsed
    #[error("invalid vector table at line {line}: {reason}")]
    InvalidVectors { line: usize, reason: String },

    /// Two collaborating buffers disagree on size
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
