//! HuggingFace Hub integration for sftprep.
//!
//! Resolves tokenizer identifiers (local files, local directories, or Hub
//! repo IDs) to the `tokenizer.json` / `tokenizer_config.json` pair the data
//! crate loads.

#![warn(missing_docs)]

mod resolve;

pub use resolve::*;
