//! Core types, configuration, and errors for sftprep.
//!
//! - `LoaderConfig`, `ColumnMapping` and `PaddingSide`
//! - `SftPrepError` and the crate-wide `Result` alias
//! - `SecretString` for Hub credentials

#![warn(missing_docs)]

mod config;
mod error;
mod secrets;

pub use config::*;
pub use error::*;
pub use secrets::SecretString;
