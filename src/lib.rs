//! Vocabulary, record loading and batch assembly for definition
//! modelling: turning a word's context into batches a recurrent
//! model can learn to define it from.
//!
//! Layers, outermost first:
//!
//! - `cli`          clap commands (Layer 1)
//! - `application`  use cases (Layer 2)
//! - `domain`       records, reserved tokens, traits (Layer 3)
//! - `data`         vocabularies, loaders, batch assemblers (Layer 4)
//! - `ml`           burn tensors and the loss contract (Layer 5)
//! - `infra`        files written next to a run (Layer 6)

pub mod application;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod infra;
pub mod ml;
