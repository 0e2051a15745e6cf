//! Instruction-tuning loader: Parquet in, fixed-length tokenized splits out.

use serde::{Deserialize, Serialize};
use sftprep_core::{ColumnMapping, LoaderConfig, Result, SftPrepError};
use sftprep_hub::HubOptions;
use std::fmt;

use super::{load_parquet_records, train_eval_split, FixedEncoding, InstructionRecord, Tokenizer};

/// Which side of the split a set of examples belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Partition {
    /// Training rows.
    Train,
    /// Evaluation rows.
    Eval,
}

impl Partition {
    /// Both partitions, train first.
    pub const ALL: [Partition; 2] = [Partition::Train, Partition::Eval];

    /// Key used in output mappings and file names.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Train => "train",
            Self::Eval => "eval",
        }
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tokenized training example.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenizedExample {
    /// Input token IDs, `max_length` long.
    pub input_ids: Vec<u32>,
    /// 1 for real tokens, 0 for padding.
    pub attention_mask: Vec<u32>,
    /// Loss targets. An unmasked copy of `input_ids`, so the loss covers
    /// instruction, input and response alike.
    pub labels: Vec<u32>,
}

impl From<FixedEncoding> for TokenizedExample {
    fn from(encoding: FixedEncoding) -> Self {
        Self {
            labels: encoding.input_ids.clone(),
            input_ids: encoding.input_ids,
            attention_mask: encoding.attention_mask,
        }
    }
}

/// Counters collected while tokenizing one partition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PartitionStats {
    /// Number of examples.
    pub rows: usize,
    /// Examples whose prompt did not fit in `max_length`.
    pub truncated: usize,
    /// Total pad positions across all examples.
    pub pad_tokens: usize,
}

/// Tokenized examples of one partition.
#[derive(Debug, Clone, Default)]
pub struct TokenizedPartition {
    /// Examples in shuffled order.
    pub examples: Vec<TokenizedExample>,
    /// Counters for this partition.
    pub stats: PartitionStats,
}

impl TokenizedPartition {
    /// Number of examples.
    pub fn len(&self) -> usize {
        self.examples.len()
    }

    /// Check if the partition is empty.
    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }
}

/// Output of [`InstructionLoader::load`].
#[derive(Debug, Clone, Default)]
pub struct TokenizedSplits {
    /// Training partition.
    pub train: TokenizedPartition,
    /// Evaluation partition.
    pub eval: TokenizedPartition,
}

impl TokenizedSplits {
    /// Look up a partition.
    pub fn get(&self, partition: Partition) -> &TokenizedPartition {
        match partition {
            Partition::Train => &self.train,
            Partition::Eval => &self.eval,
        }
    }

    /// Iterate over `(partition, examples)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (Partition, &TokenizedPartition)> {
        Partition::ALL.into_iter().map(move |p| (p, self.get(p)))
    }
}

/// Loads `train.parquet`, splits it, and tokenizes both partitions.
pub struct InstructionLoader {
    config: LoaderConfig,
    columns: ColumnMapping,
    tokenizer: Tokenizer,
}

impl InstructionLoader {
    /// Validate `config` and load its tokenizer.
    pub fn new(config: LoaderConfig) -> Result<Self> {
        let options = hub_options(&config);
        Self::with_hub_options(config, options)
    }

    /// Like [`new`](Self::new) with explicit Hub options (e.g. an access token).
    pub fn with_hub_options(config: LoaderConfig, options: HubOptions) -> Result<Self> {
        config.validate()?;
        tracing::info!(model = %config.model_path, "Loading tokenizer");
        let tokenizer = Tokenizer::from_pretrained(&config.model_path, &options)?;
        Self::with_tokenizer(config, tokenizer)
    }

    /// Build a loader around an already-loaded tokenizer.
    pub fn with_tokenizer(config: LoaderConfig, mut tokenizer: Tokenizer) -> Result<Self> {
        config.validate()?;
        tokenizer.set_padding_side(config.padding_side);
        tokenizer.configure_fixed_length(config.max_length)?;
        tracing::debug!(
            pad_token_id = ?tokenizer.pad_token_id(),
            eos_token_id = ?tokenizer.eos_token_id(),
            padding_side = %config.padding_side,
            max_length = config.max_length,
            "Tokenizer configured"
        );

        Ok(Self {
            columns: config.columns(),
            config,
            tokenizer,
        })
    }

    /// The configured tokenizer.
    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    /// Run the full pipeline.
    ///
    /// Any failure aborts the whole call; there is no partial output.
    pub fn load(&self) -> Result<TokenizedSplits> {
        let path = self.config.train_file();
        tracing::info!(path = %path.display(), "Loading dataset");
        let records = load_parquet_records(&path, &self.columns)?;
        let total = records.len();

        let (train_records, eval_records) =
            train_eval_split(records, self.config.split_ratio, self.config.seed)?;
        tracing::info!(
            total,
            train = train_records.len(),
            eval = eval_records.len(),
            seed = self.config.seed,
            "Split dataset"
        );

        let splits = TokenizedSplits {
            train: self.process_partition(Partition::Train, &train_records)?,
            eval: self.process_partition(Partition::Eval, &eval_records)?,
        };
        tracing::info!(
            train = splits.train.len(),
            eval = splits.eval.len(),
            "Tokenization complete"
        );
        Ok(splits)
    }

    /// Format and tokenize one partition. Shared by train and eval.
    pub fn process_partition(
        &self,
        partition: Partition,
        records: &[InstructionRecord],
    ) -> Result<TokenizedPartition> {
        let mut stats = PartitionStats::default();
        let mut examples = Vec::with_capacity(records.len());

        for (row, record) in records.iter().enumerate() {
            let encoding = self
                .tokenizer
                .encode_fixed(&record.prompt())
                .map_err(|e| match e {
                    SftPrepError::Encoding(msg) => {
                        SftPrepError::Encoding(format!("{partition} row {row}: {msg}"))
                    }
                    other => other,
                })?;

            stats.rows += 1;
            stats.truncated += usize::from(encoding.truncated);
            stats.pad_tokens += encoding.attention_mask.iter().filter(|&&m| m == 0).count();
            examples.push(TokenizedExample::from(encoding));
        }

        tracing::debug!(
            %partition,
            rows = stats.rows,
            truncated = stats.truncated,
            pad_tokens = stats.pad_tokens,
            "Partition tokenized"
        );
        if stats.truncated > 0 {
            tracing::warn!(
                %partition,
                truncated = stats.truncated,
                max_length = self.config.max_length,
                "Prompts truncated to max_length"
            );
        }

        Ok(TokenizedPartition { examples, stats })
    }
}

/// Hub options derived from a config (no token).
pub fn hub_options(config: &LoaderConfig) -> HubOptions {
    HubOptions {
        revision: config.revision.clone(),
        token: None,
        cache_dir: config.cache_dir.clone(),
    }
}
