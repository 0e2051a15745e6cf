//! Dataset preparation for supervised fine-tuning.
//!
//! This crate provides:
//! - Parquet loading of instruction/input/response records
//! - Deterministic seeded train/eval splitting
//! - The instruction prompt template
//! - Fixed-length tokenization with labels
//! - JSONL export of the tokenized partitions
//!
//! ```no_run
//! use sftprep_core::LoaderConfig;
//! use sftprep_data::InstructionLoader;
//!
//! let config = LoaderConfig::new("./data/alpaca", "meta-llama/Llama-3.2-1B");
//! let loader = InstructionLoader::new(config)?;
//! let splits = loader.load()?;
//! println!("{} train / {} eval", splits.train.len(), splits.eval.len());
//! # Ok::<(), sftprep_core::SftPrepError>(())
//! ```

#![warn(missing_docs)]

pub mod export;
pub mod loader;
pub mod prompt;
pub mod records;
pub mod split;
pub mod tokenizer;

pub use export::*;
pub use loader::*;
pub use prompt::*;
pub use records::*;
pub use split::*;
pub use tokenizer::*;
