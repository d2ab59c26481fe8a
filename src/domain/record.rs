// ============================================================
// Layer 3 — DefinitionRecord Domain Type
// ============================================================
// One training example for definition modelling:
//
//   target_context   ["bank", "river"]          target word first,
//                                               optionally followed by
//                                               its surrounding words
//   definition       ["the", "land", "alongside", "a", "river"]
//   example_context  ["they", "sat", "on", "the", "bank"]
//
// The definition is what the model learns to generate. The
// target context and example context only condition it.
//
// On disk a record is a JSON triple of token lists:
//   [["bank","river"], ["the","land",...], ["they","sat",...]]

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{PipelineError, Result};

/// A raw (not yet encoded) definitions record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefinitionRecord {
    /// Target word at position 0, then any context words
    pub target_context: Vec<String>,

    /// The definition tokens the model must produce
    pub definition: Vec<String>,

    /// Independent example-sentence tokens (may be empty)
    pub example_context: Vec<String>,
}

impl DefinitionRecord {
    /// Create a record from token lists.
    /// Accepts anything that turns into Strings so tests can pass &str.
    ///
    /// Fails with MalformedRecord when `target_context` is empty, the
    /// same check `from_json` applies.
    pub fn new<S: Into<String>>(
        target_context:  impl IntoIterator<Item = S>,
        definition:      impl IntoIterator<Item = S>,
        example_context: impl IntoIterator<Item = S>,
    ) -> Result<Self> {
        let record = Self {
            target_context:  target_context.into_iter().map(Into::into).collect(),
            definition:      definition.into_iter().map(Into::into).collect(),
            example_context: example_context.into_iter().map(Into::into).collect(),
        };

        if record.target_context.is_empty() {
            return Err(PipelineError::MalformedRecord {
                source_name: "<memory>".to_string(),
                index:       0,
                reason:      "target_context is empty".to_string(),
            });
        }
        Ok(record)
    }

    /// The word being defined.
    /// Records built through `new` or `from_json` always have one;
    /// a struct literal can still leave it out.
    pub fn target_word(&self) -> Option<&str> {
        self.target_context.first().map(String::as_str)
    }

    /// Parse the `[target_context, definition, example_context]` triple.
    ///
    /// `source_name` and `index` only feed the error message so the
    /// user can find the offending line in a large partition file.
    pub fn from_json(value: &Value, source_name: &str, index: usize) -> Result<Self> {
        let malformed = |reason: String| PipelineError::MalformedRecord {
            source_name: source_name.to_string(),
            index,
            reason,
        };

        let fields = value
            .as_array()
            .ok_or_else(|| malformed("record is not a JSON array".to_string()))?;

        if fields.len() != 3 {
            return Err(malformed(format!(
                "expected 3 fields [target_context, definition, example_context], found {}",
                fields.len()
            )));
        }

        let names = ["target_context", "definition", "example_context"];
        let mut lists: Vec<Vec<String>> = Vec::with_capacity(3);

        for (field, name) in fields.iter().zip(names) {
            let items = field
                .as_array()
                .ok_or_else(|| malformed(format!("{name} is not a list of tokens")))?;

            let mut tokens = Vec::with_capacity(items.len());
            for item in items {
                let token = item
                    .as_str()
                    .ok_or_else(|| malformed(format!("{name} contains a non-string token")))?;
                tokens.push(token.to_string());
            }
            lists.push(tokens);
        }

        // Batching looks the target word up at index 0
        if lists[0].is_empty() {
            return Err(malformed("target_context is empty".to_string()));
        }

        let example_context = lists.pop().unwrap_or_default();
        let definition      = lists.pop().unwrap_or_default();
        let target_context  = lists.pop().unwrap_or_default();

        Ok(Self { target_context, definition, example_context })
    }
}
