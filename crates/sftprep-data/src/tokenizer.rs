//! Tokenizer integration.

use sftprep_core::{PaddingSide, Result, SftPrepError};
use sftprep_hub::{HubOptions, TokenizerFiles};
use std::fmt;
use std::path::Path;
use tokenizers::{
    PaddingDirection, PaddingParams, PaddingStrategy, PostProcessor, TruncationDirection,
    TruncationParams,
};

const PAD_TOKEN_NAMES: &[&str] = &["<pad>", "[PAD]", "<|pad|>", "<|finetune_right_pad_id|>"];
const EOS_TOKEN_NAMES: &[&str] = &[
    "</s>",
    "<|endoftext|>",
    "<|end_of_text|>",
    "<|eot_id|>",
    "<eos>",
];

/// One prompt encoded to a fixed length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedEncoding {
    /// Token IDs, exactly `max_length` long.
    pub input_ids: Vec<u32>,
    /// 1 for real tokens, 0 for padding.
    pub attention_mask: Vec<u32>,
    /// Whether tokens were dropped to fit `max_length`.
    pub truncated: bool,
}

/// Wrapper around the tokenizers library.
///
/// Tracks the pad/eos token IDs and padding side alongside the inner
/// tokenizer, mirroring the attributes of a HuggingFace fast tokenizer.
pub struct Tokenizer {
    inner: tokenizers::Tokenizer,
    pad_token_id: Option<u32>,
    eos_token_id: Option<u32>,
    padding_side: PaddingSide,
    max_length: Option<usize>,
}

impl fmt::Debug for Tokenizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tokenizer")
            .field("pad_token_id", &self.pad_token_id)
            .field("eos_token_id", &self.eos_token_id)
            .field("padding_side", &self.padding_side)
            .field("max_length", &self.max_length)
            .finish_non_exhaustive()
    }
}

impl Tokenizer {
    fn wrap(inner: tokenizers::Tokenizer) -> Self {
        let pad_token_id = first_known(&inner, PAD_TOKEN_NAMES);
        let eos_token_id = first_known(&inner, EOS_TOKEN_NAMES);
        Self {
            inner,
            pad_token_id,
            eos_token_id,
            padding_side: PaddingSide::default(),
            max_length: None,
        }
    }

    /// Load a tokenizer from a `tokenizer.json` file.
    ///
    /// Special tokens are guessed from well-known token names.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let inner = tokenizers::Tokenizer::from_file(path.as_ref()).map_err(|e| {
            SftPrepError::config(format!(
                "Failed to load tokenizer from {}: {e}",
                path.as_ref().display()
            ))
        })?;
        Ok(Self::wrap(inner))
    }

    /// Load a tokenizer from the bytes of a `tokenizer.json`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let inner = tokenizers::Tokenizer::from_bytes(bytes)
            .map_err(|e| SftPrepError::config(format!("Failed to parse tokenizer: {e}")))?;
        Ok(Self::wrap(inner))
    }

    /// Load a tokenizer from resolved files.
    ///
    /// `pad_token` and `eos_token` declared in `tokenizer_config.json` or
    /// `special_tokens_map.json` take precedence over name-based guessing.
    /// A non-null value in the config wins over the map. A token declared
    /// in neither file keeps its guessed ID.
    pub fn from_files(files: &TokenizerFiles) -> Result<Self> {
        let mut tokenizer = Self::from_file(&files.tokenizer)?;
        let config = files.config.as_deref().map(read_json).transpose()?;
        let map = files.special_tokens_map.as_deref().map(read_json).transpose()?;

        if let Some(pad) = declared_token(config.as_ref(), map.as_ref(), "pad_token") {
            tokenizer.pad_token_id = pad.and_then(|t| tokenizer.token_to_id(t));
        }
        if let Some(eos) = declared_token(config.as_ref(), map.as_ref(), "eos_token") {
            tokenizer.eos_token_id = eos.and_then(|t| tokenizer.token_to_id(t));
        }
        Ok(tokenizer)
    }

    /// Resolve `identifier` (path or Hub repo ID) and load the tokenizer.
    pub fn from_pretrained(identifier: &str, options: &HubOptions) -> Result<Self> {
        let files = sftprep_hub::resolve_tokenizer(identifier, options).map_err(|e| match e {
            SftPrepError::Hub(msg) => {
                SftPrepError::config(format!("Cannot resolve tokenizer '{identifier}': {msg}"))
            }
            other => other,
        })?;
        Self::from_files(&files)
    }

    /// Encode text to token IDs without special tokens or padding.
    pub fn encode(&self, text: &str) -> Result<Vec<u32>> {
        self.encode_raw(text, false)
    }

    /// Encode text with special tokens, without padding or truncation.
    pub fn encode_with_special_tokens(&self, text: &str) -> Result<Vec<u32>> {
        self.encode_raw(text, true)
    }

    fn encode_raw(&self, text: &str, add_special_tokens: bool) -> Result<Vec<u32>> {
        let mut plain = self.inner.clone();
        plain.with_padding(None);
        plain
            .with_truncation(None)
            .map_err(|e| SftPrepError::Encoding(e.to_string()))?;
        let encoding = plain
            .encode(text, add_special_tokens)
            .map_err(|e| SftPrepError::Encoding(e.to_string()))?;
        Ok(encoding.get_ids().to_vec())
    }

    /// Install fixed-length padding and truncation.
    ///
    /// Falls back to the eos token when no pad token is defined; fails when
    /// neither exists since padding would be impossible.
    pub fn configure_fixed_length(&mut self, max_length: usize) -> Result<()> {
        if max_length == 0 {
            return Err(SftPrepError::config("max_length must be positive"));
        }
        if self.pad_token_id.is_none() {
            self.pad_token_id = self.eos_token_id;
        }
        let pad_id = self.pad_token_id.ok_or_else(|| {
            SftPrepError::config("tokenizer defines neither a pad token nor an eos token")
        })?;
        let n_special = self.num_special_tokens();
        if max_length < n_special {
            return Err(SftPrepError::config(format!(
                "max_length {max_length} cannot hold the {n_special} special tokens this tokenizer adds"
            )));
        }

        self.inner
            .with_truncation(Some(TruncationParams {
                max_length,
                direction: TruncationDirection::Right,
                ..Default::default()
            }))
            .map_err(|e| SftPrepError::config(format!("Invalid truncation: {e}")))?;
        let padding = PaddingParams {
            strategy: PaddingStrategy::Fixed(max_length),
            direction: match self.padding_side {
                PaddingSide::Left => PaddingDirection::Left,
                PaddingSide::Right => PaddingDirection::Right,
            },
            pad_id,
            pad_token: self.inner.id_to_token(pad_id).unwrap_or_default(),
            ..Default::default()
        };
        self.inner.with_padding(Some(padding));
        self.max_length = Some(max_length);
        Ok(())
    }

    /// Encode one prompt with special tokens to exactly the configured length.
    pub fn encode_fixed(&self, text: &str) -> Result<FixedEncoding> {
        let max_length = self.max_length.ok_or_else(|| {
            SftPrepError::Encoding("tokenizer has no fixed length configured".into())
        })?;
        let encoding = self
            .inner
            .encode(text, true)
            .map_err(|e| SftPrepError::Encoding(e.to_string()))?;

        let input_ids = encoding.get_ids().to_vec();
        let attention_mask = encoding.get_attention_mask().to_vec();
        if input_ids.len() != max_length || attention_mask.len() != max_length {
            return Err(SftPrepError::Encoding(format!(
                "expected {max_length} tokens, tokenizer produced {}",
                input_ids.len()
            )));
        }

        Ok(FixedEncoding {
            input_ids,
            attention_mask,
            truncated: !encoding.get_overflowing().is_empty(),
        })
    }

    /// Number of special tokens the post-processor adds to a single sequence.
    pub fn num_special_tokens(&self) -> usize {
        self.inner
            .get_post_processor()
            .map_or(0, |p| p.added_tokens(false))
    }

    /// Look up a token's ID.
    pub fn token_to_id(&self, token: &str) -> Option<u32> {
        self.inner.token_to_id(token)
    }

    /// Pad token ID, if defined.
    pub fn pad_token_id(&self) -> Option<u32> {
        self.pad_token_id
    }

    /// EOS token ID, if defined.
    pub fn eos_token_id(&self) -> Option<u32> {
        self.eos_token_id
    }

    /// Current padding side.
    pub fn padding_side(&self) -> PaddingSide {
        self.padding_side
    }

    /// Change the padding side. Takes effect on the next `configure_fixed_length`.
    pub fn set_padding_side(&mut self, side: PaddingSide) {
        self.padding_side = side;
    }
}

fn first_known(inner: &tokenizers::Tokenizer, names: &[&str]) -> Option<u32> {
    names.iter().find_map(|name| inner.token_to_id(name))
}

fn read_json(path: &Path) -> Result<serde_json::Value> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| SftPrepError::config(format!("Cannot read {}: {e}", path.display())))?;
    serde_json::from_str(&content)
        .map_err(|e| SftPrepError::config(format!("Invalid {}: {e}", path.display())))
}

/// Content of a special token entry, either `"tok"` or `{"content": "tok", ...}`.
fn token_content(entry: &serde_json::Value) -> Option<&str> {
    match entry {
        serde_json::Value::String(s) => Some(s.as_str()),
        serde_json::Value::Object(obj) => obj.get("content").and_then(|v| v.as_str()),
        _ => None,
    }
}

/// Merge one special token across the config and the special tokens map.
///
/// Returns `None` when neither file declares `key`, and `Some(None)` when it
/// is declared but null.
fn declared_token<'a>(
    config: Option<&'a serde_json::Value>,
    map: Option<&'a serde_json::Value>,
    key: &str,
) -> Option<Option<&'a str>> {
    let config_entry = config.and_then(|c| c.get(key));
    let map_entry = map.and_then(|m| m.get(key));
    match (config_entry.and_then(token_content), map_entry) {
        (Some(token), _) => Some(Some(token)),
        (None, Some(entry)) => Some(token_content(entry)),
        (None, None) => config_entry.map(|_| None),
    }
}
