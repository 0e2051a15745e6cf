//! Writing tokenized partitions to disk.

use sftprep_core::{Result, SftPrepError};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use super::{TokenizedExample, TokenizedSplits};

/// Write `train.jsonl` and `eval.jsonl` into `dir`, creating it if needed.
///
/// Returns the written paths, train first.
pub fn write_jsonl<P: AsRef<Path>>(splits: &TokenizedSplits, dir: P) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)?;

    let mut written = Vec::with_capacity(2);
    for (partition, data) in splits.iter() {
        let path = dir.join(format!("{}.jsonl", partition.as_str()));
        let mut writer = BufWriter::new(File::create(&path)?);
        for example in &data.examples {
            serde_json::to_writer(&mut writer, example)
                .map_err(|e| SftPrepError::Serialization(e.to_string()))?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
        tracing::info!(%partition, rows = data.len(), path = %path.display(), "Wrote partition");
        written.push(path);
    }
    Ok(written)
}

/// Read examples back from a JSONL file written by [`write_jsonl`].
pub fn read_jsonl<P: AsRef<Path>>(path: P) -> Result<Vec<TokenizedExample>> {
    let reader = BufReader::new(File::open(path.as_ref())?);
    let mut examples = Vec::new();
    for (line_num, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let example = serde_json::from_str(&line).map_err(|e| {
            SftPrepError::Serialization(format!("Line {}: {e}", line_num + 1))
        })?;
        examples.push(example);
    }
    Ok(examples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PartitionStats, TokenizedPartition};

    fn example(ids: &[u32]) -> TokenizedExample {
        TokenizedExample {
            input_ids: ids.to_vec(),
            attention_mask: ids.iter().map(|&id| u32::from(id != 0)).collect(),
            labels: ids.to_vec(),
        }
    }

    #[test]
    fn test_write_creates_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested/out");
        let splits = TokenizedSplits {
            train: TokenizedPartition {
                examples: vec![example(&[5, 6, 0]), example(&[7, 0, 0])],
                stats: PartitionStats::default(),
            },
            eval: TokenizedPartition {
                examples: vec![example(&[8, 9, 10])],
                stats: PartitionStats::default(),
            },
        };

        let paths = write_jsonl(&splits, &out).unwrap();
        assert_eq!(paths, vec![out.join("train.jsonl"), out.join("eval.jsonl")]);

        let train = read_jsonl(&paths[0]).unwrap();
        assert_eq!(train, splits.train.examples);
        let raw = std::fs::read_to_string(&paths[1]).unwrap();
        assert_eq!(
            raw,
            "{\"input_ids\":[8,9,10],\"attention_mask\":[1,1,1],\"labels\":[8,9,10]}\n"
        );
    }

    #[test]
    fn test_read_reports_bad_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("train.jsonl");
        std::fs::write(&path, "{\"input_ids\":[1],\"attention_mask\":[1],\"labels\":[1]}\nnope\n")
            .unwrap();
        let err = read_jsonl(&path).unwrap_err().to_string();
        assert!(err.contains("Line 2"), "{err}");
    }
}
