//! Tokenizer resolution from local paths and the HuggingFace Hub.

use hf_hub::api::sync::{Api, ApiBuilder, ApiRepo};
use hf_hub::{Repo, RepoType};
use sftprep_core::{Result, SecretString, SftPrepError};
use std::path::{Path, PathBuf};

/// Serialized fast-tokenizer file.
pub const TOKENIZER_FILE: &str = "tokenizer.json";
/// Tokenizer metadata carrying special token names.
pub const TOKENIZER_CONFIG_FILE: &str = "tokenizer_config.json";
/// Legacy special token declarations, still the only source in many repos.
pub const SPECIAL_TOKENS_MAP_FILE: &str = "special_tokens_map.json";

/// Options for Hub downloads.
#[derive(Debug, Clone, Default)]
pub struct HubOptions {
    /// Revision/branch (e.g. "main").
    pub revision: Option<String>,
    /// Authentication token for gated or private repos.
    pub token: Option<SecretString>,
    /// Cache directory; the hf-hub default is used when unset.
    pub cache_dir: Option<PathBuf>,
}

/// Local files backing a resolved tokenizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenizerFiles {
    /// Path to `tokenizer.json`.
    pub tokenizer: PathBuf,
    /// Path to `tokenizer_config.json`, when available.
    pub config: Option<PathBuf>,
    /// Path to `special_tokens_map.json`, when available.
    pub special_tokens_map: Option<PathBuf>,
}

impl TokenizerFiles {
    fn from_dir(dir: &Path) -> Result<Self> {
        let tokenizer = dir.join(TOKENIZER_FILE);
        if !tokenizer.is_file() {
            return Err(SftPrepError::config(format!(
                "Tokenizer not found at {}",
                tokenizer.display()
            )));
        }
        Ok(Self {
            tokenizer,
            config: existing(dir.join(TOKENIZER_CONFIG_FILE)),
            special_tokens_map: existing(dir.join(SPECIAL_TOKENS_MAP_FILE)),
        })
    }

    fn from_file(file: &Path) -> Self {
        let sibling = |name: &str| file.parent().and_then(|dir| existing(dir.join(name)));
        Self {
            tokenizer: file.to_path_buf(),
            config: sibling(TOKENIZER_CONFIG_FILE),
            special_tokens_map: sibling(SPECIAL_TOKENS_MAP_FILE),
        }
    }
}

fn existing(path: PathBuf) -> Option<PathBuf> {
    path.is_file().then_some(path)
}

/// Whether `identifier` has the shape of a Hub repo ID, either `name`
/// (e.g. `gpt2`) or `owner/name`.
pub fn is_repo_id(identifier: &str) -> bool {
    let segments: Vec<&str> = identifier.split('/').collect();
    let valid = |s: &str| {
        !s.is_empty()
            && !s.starts_with('.')
            && !s.contains("..")
            && s
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    };
    matches!(segments.len(), 1 | 2) && segments.iter().all(|s| valid(s))
}

/// Build the blocking Hub client.
fn build_api(options: &HubOptions) -> Result<Api> {
    let mut builder = ApiBuilder::new().with_progress(false);

    if let Some(cache) = &options.cache_dir {
        builder = builder.with_cache_dir(cache.clone());
    }
    if let Some(secret) = &options.token {
        builder = builder.with_token(Some(secret.expose_secret().to_string()));
    }

    builder.build().map_err(|e| SftPrepError::Hub(e.to_string()))
}

fn model_repo(api: &Api, model_id: &str, revision: Option<&str>) -> ApiRepo {
    match revision {
        Some(rev) => api.repo(Repo::with_revision(
            model_id.to_string(),
            RepoType::Model,
            rev.to_string(),
        )),
        None => api.model(model_id.to_string()),
    }
}

/// Download the tokenizer files of a Hub model.
///
/// `tokenizer.json` is required. The special token metadata files are
/// fetched on a best effort basis since many repos ship only one of them.
pub fn download_tokenizer(model_id: &str, options: &HubOptions) -> Result<TokenizerFiles> {
    let api = build_api(options)?;
    let repo = model_repo(&api, model_id, options.revision.as_deref());

    tracing::info!(model = %model_id, "Downloading tokenizer from HuggingFace Hub");
    let tokenizer = repo
        .get(TOKENIZER_FILE)
        .map_err(|e| SftPrepError::Hub(format!("{model_id}: {e}")))?;

    let optional = |name: &str| match repo.get(name) {
        Ok(path) => Some(path),
        Err(e) => {
            tracing::debug!(model = %model_id, file = name, error = %e, "Optional file not on Hub");
            None
        }
    };

    Ok(TokenizerFiles {
        tokenizer,
        config: optional(TOKENIZER_CONFIG_FILE),
        special_tokens_map: optional(SPECIAL_TOKENS_MAP_FILE),
    })
}

/// Resolve a tokenizer identifier to local files.
///
/// Accepts a `tokenizer.json` file, a directory containing one, or a Hub
/// repo ID. Local paths win over Hub IDs of the same spelling.
pub fn resolve_tokenizer(identifier: &str, options: &HubOptions) -> Result<TokenizerFiles> {
    let path = Path::new(identifier);
    if path.is_file() {
        return Ok(TokenizerFiles::from_file(path));
    }
    if path.is_dir() {
        return TokenizerFiles::from_dir(path);
    }
    if is_repo_id(identifier) {
        return download_tokenizer(identifier, options);
    }
    Err(SftPrepError::config(format!(
        "Cannot resolve tokenizer '{identifier}': not a local path or HuggingFace repo ID"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_repo_id_shape() {
        assert!(is_repo_id("meta-llama/Llama-3.2-1B"));
        assert!(is_repo_id("Qwen/Qwen2.5-0.5B-Instruct"));
        assert!(is_repo_id("gpt2"));
        assert!(is_repo_id("bert-base-uncased"));
        assert!(!is_repo_id(""));
        assert!(!is_repo_id("not a repo"));
        assert!(!is_repo_id("/abs/path"));
        assert!(!is_repo_id("a/b/c"));
        assert!(!is_repo_id("../escape"));
        assert!(!is_repo_id("owner/"));
    }

    #[test]
    fn test_resolve_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(TOKENIZER_FILE), "{}").unwrap();
        fs::write(dir.path().join(TOKENIZER_CONFIG_FILE), "{}").unwrap();

        let files =
            resolve_tokenizer(dir.path().to_str().unwrap(), &HubOptions::default()).unwrap();
        assert_eq!(files.tokenizer, dir.path().join(TOKENIZER_FILE));
        assert_eq!(files.config, Some(dir.path().join(TOKENIZER_CONFIG_FILE)));
        assert!(files.special_tokens_map.is_none());
    }

    #[test]
    fn test_resolve_special_tokens_map_next_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join(TOKENIZER_FILE);
        fs::write(&file, "{}").unwrap();
        fs::write(dir.path().join(SPECIAL_TOKENS_MAP_FILE), "{}").unwrap();

        let files = resolve_tokenizer(file.to_str().unwrap(), &HubOptions::default()).unwrap();
        assert!(files.config.is_none());
        assert_eq!(
            files.special_tokens_map,
            Some(dir.path().join(SPECIAL_TOKENS_MAP_FILE))
        );
    }

    #[test]
    fn test_resolve_file_without_config() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("custom.json");
        fs::write(&file, "{}").unwrap();

        let files = resolve_tokenizer(file.to_str().unwrap(), &HubOptions::default()).unwrap();
        assert_eq!(files.tokenizer, file);
        assert!(files.config.is_none());
        assert!(files.special_tokens_map.is_none());
    }

    #[test]
    fn test_directory_without_tokenizer() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve_tokenizer(dir.path().to_str().unwrap(), &HubOptions::default())
            .unwrap_err();
        assert!(matches!(err, SftPrepError::Configuration(_)));
    }

    #[test]
    fn test_unresolvable_identifier() {
        let err = resolve_tokenizer("not a/repo id", &HubOptions::default()).unwrap_err();
        assert!(err.to_string().contains("Cannot resolve tokenizer"));
    }
}
