//! Configuration types for sftprep.

use crate::{Result, SftPrepError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// File name the loader expects inside the data directory.
pub const TRAIN_FILE_NAME: &str = "train.parquet";

/// Side on which pad tokens are inserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaddingSide {
    /// Pad tokens before the real tokens.
    Left,
    /// Pad tokens after the real tokens.
    #[default]
    Right,
}

impl PaddingSide {
    /// String form used in config files and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

impl fmt::Display for PaddingSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaddingSide {
    type Err = SftPrepError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            other => Err(SftPrepError::config(format!(
                "padding side must be 'left' or 'right', got '{other}'"
            ))),
        }
    }
}

/// Names of the three text columns read from every record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    /// Column holding the instruction text.
    pub instruction: String,
    /// Column holding the auxiliary input text.
    pub input: String,
    /// Column holding the target response text.
    pub target: String,
}

impl ColumnMapping {
    /// Create a mapping from explicit column names.
    pub fn new(
        instruction: impl Into<String>,
        input: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            instruction: instruction.into(),
            input: input.into(),
            target: target.into(),
        }
    }

    /// Iterate over `(role, column)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            ("instruction", self.instruction.as_str()),
            ("input", self.input.as_str()),
            ("target", self.target.as_str()),
        ]
        .into_iter()
    }
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self::new(
            default_instruction_column(),
            default_input_column(),
            default_target_column(),
        )
    }
}

/// Loader configuration.
///
/// Immutable once handed to the loader. Every field can be set from YAML;
/// missing fields fall back to the defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Directory containing `train.parquet`.
    #[serde(default)]
    pub data_path: PathBuf,

    /// Fraction of rows assigned to the eval partition, in (0, 1).
    #[serde(default = "default_split_ratio")]
    pub split_ratio: f64,

    /// Seed for the train/eval shuffle.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Column holding the instruction text.
    #[serde(default = "default_instruction_column")]
    pub instruction_column: String,

    /// Column holding the auxiliary input text.
    #[serde(default = "default_input_column")]
    pub input_column: String,

    /// Column holding the target response text.
    #[serde(default = "default_target_column")]
    pub target_column: String,

    /// Every tokenized example is padded or truncated to this length.
    #[serde(default = "default_max_length")]
    pub max_length: usize,

    /// Tokenizer identifier (local path or HuggingFace repo ID).
    #[serde(default)]
    pub model_path: String,

    /// Side on which pad tokens are inserted.
    #[serde(default)]
    pub padding_side: PaddingSide,

    /// Hub revision/branch for the tokenizer.
    #[serde(default)]
    pub revision: Option<String>,

    /// Override for the Hub download cache.
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::new(),
            split_ratio: default_split_ratio(),
            seed: default_seed(),
            instruction_column: default_instruction_column(),
            input_column: default_input_column(),
            target_column: default_target_column(),
            max_length: default_max_length(),
            model_path: String::new(),
            padding_side: PaddingSide::default(),
            revision: None,
            cache_dir: None,
        }
    }
}

impl LoaderConfig {
    /// Create a config for the given data directory and tokenizer, defaults elsewhere.
    pub fn new(data_path: impl AsRef<Path>, model_path: impl Into<String>) -> Self {
        Self {
            data_path: data_path.as_ref().to_path_buf(),
            model_path: model_path.into(),
            ..Self::default()
        }
    }

    /// Path of the parquet file the loader reads.
    pub fn train_file(&self) -> PathBuf {
        self.data_path.join(TRAIN_FILE_NAME)
    }

    /// The three configured column names.
    pub fn columns(&self) -> ColumnMapping {
        ColumnMapping::new(
            self.instruction_column.clone(),
            self.input_column.clone(),
            self.target_column.clone(),
        )
    }

    /// Check every field, returning the first problem found.
    pub fn validate(&self) -> Result<()> {
        if self.data_path.as_os_str().is_empty() {
            return Err(SftPrepError::config("data_path is required"));
        }
        if !self.split_ratio.is_finite() || self.split_ratio <= 0.0 || self.split_ratio >= 1.0 {
            return Err(SftPrepError::config(format!(
                "split_ratio must be in (0, 1), got {}",
                self.split_ratio
            )));
        }
        if self.max_length == 0 {
            return Err(SftPrepError::config("max_length must be positive"));
        }
        if self.model_path.trim().is_empty() {
            return Err(SftPrepError::config("model_path is required"));
        }
        for (role, column) in self.columns().iter() {
            if column.trim().is_empty() {
                return Err(SftPrepError::config(format!(
                    "{role} column name must not be empty"
                )));
            }
        }
        Ok(())
    }
}

// Default value functions
fn default_split_ratio() -> f64 {
    0.1
}
fn default_seed() -> u64 {
    42
}
fn default_instruction_column() -> String {
    "instruction".into()
}
fn default_input_column() -> String {
    "input".into()
}
fn default_target_column() -> String {
    "output".into()
}
fn default_max_length() -> usize {
    512
}
