//! Shared fixtures: a tiny WordLevel tokenizer and Parquet tables.

#![allow(dead_code)]

use arrow::array::{ArrayRef, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_writer::ArrowWriter;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

pub const UNK_ID: u32 = 0;
pub const EOS_ID: u32 = 1;
pub const PAD_ID: u32 = 2;
/// ID of the `row{i}` token is `ROW_BASE + i`.
pub const ROW_BASE: u32 = 100;
pub const MAX_ROWS: u32 = 200;

/// Serialized WordLevel tokenizer.
///
/// The vocabulary covers the prompt template words and `row0..row199`, so
/// each row's instruction maps to a unique token. A `</s>` is appended to
/// every sequence; `<pad>` is only present when `with_pad` is set.
pub fn tokenizer_json(with_pad: bool) -> String {
    let mut vocab = vec![
        ("<unk>".to_string(), UNK_ID),
        ("</s>".to_string(), EOS_ID),
        ("###".to_string(), 3),
        ("Instruction".to_string(), 4),
        ("Input".to_string(), 5),
        ("Response".to_string(), 6),
        (":".to_string(), 7),
        ("long".to_string(), 8),
    ];
    if with_pad {
        vocab.push(("<pad>".to_string(), PAD_ID));
    }
    for i in 0..MAX_ROWS {
        vocab.push((format!("row{i}"), ROW_BASE + i));
    }
    let vocab_json = vocab
        .iter()
        .map(|(t, i)| format!("\"{t}\": {i}"))
        .collect::<Vec<_>>()
        .join(", ");

    let special = |id: u32, content: &str| {
        format!(
            r#"{{"id": {id}, "content": "{content}", "single_word": false, "lstrip": false, "rstrip": false, "normalized": false, "special": true}}"#
        )
    };
    let mut added = vec![special(EOS_ID, "</s>")];
    if with_pad {
        added.push(special(PAD_ID, "<pad>"));
    }

    format!(
        r#"{{
  "version": "1.0",
  "truncation": null,
  "padding": null,
  "added_tokens": [{added}],
  "normalizer": null,
  "pre_tokenizer": {{"type": "Whitespace"}},
  "post_processor": {{
    "type": "TemplateProcessing",
    "single": [{{"Sequence": {{"id": "A", "type_id": 0}}}}, {{"SpecialToken": {{"id": "</s>", "type_id": 0}}}}],
    "pair": [{{"Sequence": {{"id": "A", "type_id": 0}}}}, {{"Sequence": {{"id": "B", "type_id": 1}}}}],
    "special_tokens": {{"</s>": {{"id": "</s>", "ids": [{EOS_ID}], "tokens": ["</s>"]}}}}
  }},
  "decoder": null,
  "model": {{"type": "WordLevel", "vocab": {{{vocab_json}}}, "unk_token": "<unk>"}}
}}"#,
        added = added.join(", "),
    )
}

/// Write `tokenizer.json` into `dir`.
pub fn write_tokenizer(dir: &Path, with_pad: bool) {
    std::fs::write(dir.join("tokenizer.json"), tokenizer_json(with_pad)).unwrap();
}

/// Number of tokens (with `</s>`) of the prompt built from `row{i}`, `x`, `y`.
pub const SHORT_PROMPT_TOKENS: usize = 13;

/// Write a `train.parquet` with `rows` records under the given column names.
///
/// Row `i` has instruction `row{i}`, input `x`, response `y`. Rows listed in
/// `long_rows` get a 40-word response instead.
pub fn write_dataset(dir: &Path, columns: [&str; 3], rows: usize, long_rows: &[usize]) {
    let instructions: Vec<String> = (0..rows).map(|i| format!("row{i}")).collect();
    let inputs: Vec<String> = vec!["x".to_string(); rows];
    let responses: Vec<String> = (0..rows)
        .map(|i| {
            if long_rows.contains(&i) {
                vec!["long"; 40].join(" ")
            } else {
                "y".to_string()
            }
        })
        .collect();

    let schema = Arc::new(Schema::new(vec![
        Field::new(columns[0], DataType::Utf8, false),
        Field::new(columns[1], DataType::Utf8, false),
        Field::new(columns[2], DataType::Utf8, false),
    ]));
    let arrays: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from(instructions)),
        Arc::new(StringArray::from(inputs)),
        Arc::new(StringArray::from(responses)),
    ];
    let batch = RecordBatch::try_new(schema.clone(), arrays).unwrap();

    let file = File::create(dir.join("train.parquet")).unwrap();
    let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();
}

/// The `row{i}` index an example was built from.
pub fn row_of(input_ids: &[u32]) -> usize {
    let id = input_ids
        .iter()
        .copied()
        .find(|&id| (ROW_BASE..ROW_BASE + MAX_ROWS).contains(&id))
        .expect("example carries a row token");
    (id - ROW_BASE) as usize
}
