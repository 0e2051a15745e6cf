//! sftprep CLI - prepare instruction-tuning data for fine-tuning.

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use sftprep_core::{LoaderConfig, PaddingSide, SecretString};
use sftprep_data::{hub_options, load_parquet_records, write_jsonl, InstructionLoader, Tokenizer};

#[derive(Parser)]
#[command(name = "sftprep")]
#[command(author, version, about = "Tokenize instruction datasets for supervised fine-tuning", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Split, format, and tokenize `train.parquet`
    Prepare {
        #[command(flatten)]
        loader: LoaderArgs,

        /// Output directory for train.jsonl / eval.jsonl
        #[arg(short, long)]
        output: Option<String>,

        /// HuggingFace token for gated tokenizers
        #[arg(long, env = "HF_TOKEN", hide_env_values = true)]
        hf_token: Option<String>,
    },

    /// Print the rendered prompts of the first rows
    Preview {
        #[command(flatten)]
        loader: LoaderArgs,

        /// Number of rows to show
        #[arg(short = 'n', long, default_value = "3")]
        rows: usize,

        /// Also report token counts using the configured tokenizer
        #[arg(long)]
        tokens: bool,
    },

    /// Write a sample configuration file
    Init {
        /// Output path
        #[arg(short, long, default_value = "sftprep.yaml")]
        output: String,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Loader settings; each flag overrides the config file.
#[derive(Args)]
struct LoaderArgs {
    /// Path to configuration file (YAML)
    #[arg(short, long)]
    config: Option<String>,

    /// Directory containing train.parquet
    #[arg(short, long)]
    data_path: Option<String>,

    /// Tokenizer (HuggingFace repo ID, directory, or tokenizer.json)
    #[arg(short, long)]
    model: Option<String>,

    /// Fraction of rows held out for evaluation
    #[arg(long)]
    split_ratio: Option<f64>,

    /// Shuffle seed
    #[arg(long)]
    seed: Option<u64>,

    /// Instruction column name
    #[arg(long)]
    instruction_column: Option<String>,

    /// Input column name
    #[arg(long)]
    input_column: Option<String>,

    /// Response column name
    #[arg(long)]
    target_column: Option<String>,

    /// Padded/truncated sequence length
    #[arg(long)]
    max_length: Option<usize>,

    /// Padding side (left or right)
    #[arg(long)]
    padding_side: Option<PaddingSide>,

    /// Hub revision for the tokenizer
    #[arg(long)]
    revision: Option<String>,
}

impl LoaderArgs {
    /// Load the config file (if any) and apply command-line overrides.
    fn resolve(self) -> anyhow::Result<LoaderConfig> {
        let mut config = if let Some(ref path) = self.config {
            let content = std::fs::read_to_string(path)
                .map_err(|e| anyhow::anyhow!("Failed to read config {}: {}", path, e))?;
            serde_yaml::from_str(&content)?
        } else {
            LoaderConfig::default()
        };

        if let Some(data_path) = self.data_path {
            config.data_path = PathBuf::from(data_path);
        }
        if let Some(model) = self.model {
            config.model_path = model;
        }
        if let Some(ratio) = self.split_ratio {
            config.split_ratio = ratio;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(col) = self.instruction_column {
            config.instruction_column = col;
        }
        if let Some(col) = self.input_column {
            config.input_column = col;
        }
        if let Some(col) = self.target_column {
            config.target_column = col;
        }
        if let Some(max_length) = self.max_length {
            config.max_length = max_length;
        }
        if let Some(side) = self.padding_side {
            config.padding_side = side;
        }
        if self.revision.is_some() {
            config.revision = self.revision;
        }

        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(std::env::var("RUST_LOG").ok().as_deref()))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Prepare {
            loader,
            output,
            hf_token,
        } => {
            let config = loader.resolve()?;
            run_prepare(config, output.as_deref(), SecretString::from_option(hf_token))?;
        }

        Commands::Preview {
            loader,
            rows,
            tokens,
        } => {
            let config = loader.resolve()?;
            run_preview(&config, rows, tokens)?;
        }

        Commands::Init { output, force } => {
            generate_sample_config(Path::new(&output), force)?;
        }
    }

    Ok(())
}

/// `RUST_LOG` when set and valid, otherwise `info`.
fn log_filter(directives: Option<&str>) -> tracing_subscriber::EnvFilter {
    directives
        .and_then(|d| tracing_subscriber::EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| tracing_subscriber::EnvFilter::new("info"))
}

fn run_prepare(
    config: LoaderConfig,
    output: Option<&str>,
    token: Option<SecretString>,
) -> anyhow::Result<()> {
    config.validate()?;

    println!("========================================");
    println!("  sftprep");
    println!("========================================");
    println!("Data:          {}", config.train_file().display());
    println!("Tokenizer:     {}", config.model_path);
    println!(
        "Columns:       {} / {} / {}",
        config.instruction_column, config.input_column, config.target_column
    );
    println!("Split Ratio:   {}", config.split_ratio);
    println!("Seed:          {}", config.seed);
    println!("Max Length:    {}", config.max_length);
    println!("Padding Side:  {}", config.padding_side);
    if let Some(dir) = output {
        println!("Output:        {}", dir);
    }
    println!("========================================\n");

    let mut options = hub_options(&config);
    options.token = token;
    let loader = InstructionLoader::with_hub_options(config, options)?;
    let splits = loader.load()?;

    println!("=== Results ===\n");
    for (partition, data) in splits.iter() {
        println!(
            "{:<6} {:>8} rows  {:>6} truncated  {:>10} pad tokens",
            partition.as_str(),
            data.stats.rows,
            data.stats.truncated,
            data.stats.pad_tokens
        );
    }

    if let Some(dir) = output {
        let paths = write_jsonl(&splits, dir)?;
        println!();
        for path in paths {
            println!("Wrote {}", path.display());
        }
    } else {
        tracing::info!("No --output given; results were not written");
    }

    Ok(())
}

fn run_preview(config: &LoaderConfig, rows: usize, tokens: bool) -> anyhow::Result<()> {
    let records = load_parquet_records(config.train_file(), &config.columns())?;
    println!("{} rows in {}\n", records.len(), config.train_file().display());

    let tokenizer = if tokens {
        Some(Tokenizer::from_pretrained(
            &config.model_path,
            &hub_options(config),
        )?)
    } else {
        None
    };

    for (i, record) in records.iter().take(rows).enumerate() {
        let prompt = record.prompt();
        println!("--- row {} ---", i);
        println!("{}", prompt);
        if let Some(ref tok) = tokenizer {
            let count = tok.encode_with_special_tokens(&prompt)?.len();
            let note = if count > config.max_length {
                " (will be truncated)"
            } else {
                ""
            };
            println!("[{} tokens{}]", count, note);
        }
        println!();
    }

    Ok(())
}

fn generate_sample_config(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
    }

    let sample = LoaderConfig {
        revision: Some("main".into()),
        ..LoaderConfig::new("./data", "meta-llama/Llama-3.2-1B")
    };
    let content = format!(
        "# sftprep configuration\n# Expects {{data_path}}/train.parquet\n{}",
        serde_yaml::to_string(&sample)?
    );
    std::fs::write(path, content)?;
    println!("Sample configuration written to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn prepare_config(args: &[&str]) -> LoaderConfig {
        match Cli::try_parse_from(args).unwrap().command {
            Commands::Prepare { loader, .. } => loader.resolve().unwrap(),
            _ => panic!("expected prepare"),
        }
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_flags_without_config_file() {
        let config = prepare_config(&[
            "sftprep",
            "prepare",
            "--data-path",
            "./data",
            "--model",
            "Qwen/Qwen2.5-0.5B",
            "--padding-side",
            "left",
            "--max-length",
            "1024",
        ]);
        assert_eq!(config.data_path, PathBuf::from("./data"));
        assert_eq!(config.padding_side, PaddingSide::Left);
        assert_eq!(config.max_length, 1024);
        assert_eq!(config.seed, 42);
    }

    #[test]
    fn test_flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg.yaml");
        std::fs::write(
            &path,
            "data_path: ./a\nmodel_path: ./tok\nseed: 7\ninput_column: context\n",
        )
        .unwrap();

        let config = prepare_config(&[
            "sftprep",
            "prepare",
            "--config",
            path.to_str().unwrap(),
            "--seed",
            "11",
        ]);
        assert_eq!(config.seed, 11);
        assert_eq!(config.input_column, "context");
        assert_eq!(config.model_path, "./tok");
    }

    #[test]
    fn test_invalid_padding_side_rejected() {
        let result = Cli::try_parse_from([
            "sftprep",
            "prepare",
            "--padding-side",
            "middle",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_log_filter_honours_rust_log() {
        use tracing::level_filters::LevelFilter;

        assert_eq!(log_filter(Some("debug")).max_level_hint(), Some(LevelFilter::DEBUG));
        assert_eq!(
            log_filter(Some("sftprep_data=trace")).max_level_hint(),
            Some(LevelFilter::TRACE)
        );
        assert_eq!(log_filter(None).max_level_hint(), Some(LevelFilter::INFO));
    }

    #[test]
    fn test_init_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sftprep.yaml");
        generate_sample_config(&path, false).unwrap();

        let written: LoaderConfig =
            serde_yaml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert!(written.validate().is_ok());

        assert!(generate_sample_config(&path, false).is_err());
        assert!(generate_sample_config(&path, true).is_ok());
    }
}
