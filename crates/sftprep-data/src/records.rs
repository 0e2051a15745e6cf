//! Raw instruction records read from Parquet.

use arrow::array::{Array as ArrowArray, ArrayRef, LargeStringArray, StringArray};
use arrow::datatypes::{DataType, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ProjectionMask;
use sftprep_core::{ColumnMapping, Result, SftPrepError};
use std::fs::File;
use std::path::Path;

use super::generate_prompt;

/// One row of the source table, reduced to the three text fields.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InstructionRecord {
    /// Instruction text.
    pub instruction: String,
    /// Auxiliary input text.
    pub input: String,
    /// Target response text.
    pub response: String,
}

impl InstructionRecord {
    /// Create a record from its three fields.
    pub fn new(
        instruction: impl Into<String>,
        input: impl Into<String>,
        response: impl Into<String>,
    ) -> Self {
        Self {
            instruction: instruction.into(),
            input: input.into(),
            response: response.into(),
        }
    }

    /// Render this record with the instruction prompt template.
    pub fn prompt(&self) -> String {
        generate_prompt(&self.instruction, &self.input, &self.response)
    }
}

/// Check that every mapped column exists and holds strings.
///
/// Runs before any row is read so a bad mapping fails fast.
pub fn validate_schema(schema: &Schema, columns: &ColumnMapping) -> Result<Vec<usize>> {
    columns
        .iter()
        .map(|(role, name)| {
            let idx = schema.index_of(name).map_err(|_| {
                SftPrepError::data_format(format!(
                    "{role} column '{name}' not found in Parquet file. Available columns: {:?}",
                    schema.fields().iter().map(|f| f.name()).collect::<Vec<_>>()
                ))
            })?;
            match schema.field(idx).data_type() {
                DataType::Utf8 | DataType::LargeUtf8 => Ok(idx),
                other => Err(SftPrepError::data_format(format!(
                    "{role} column '{name}' has type {other}, expected a string column"
                ))),
            }
        })
        .collect()
}

/// A string column of either offset width.
enum TextColumn<'a> {
    Utf8(&'a StringArray),
    LargeUtf8(&'a LargeStringArray),
}

impl<'a> TextColumn<'a> {
    fn from_batch(batch: &'a RecordBatch, name: &str) -> Result<Self> {
        let col: &ArrayRef = batch.column_by_name(name).ok_or_else(|| {
            SftPrepError::data_format(format!("Column '{name}' missing from record batch"))
        })?;
        if let Some(arr) = col.as_any().downcast_ref::<StringArray>() {
            return Ok(Self::Utf8(arr));
        }
        if let Some(arr) = col.as_any().downcast_ref::<LargeStringArray>() {
            return Ok(Self::LargeUtf8(arr));
        }
        Err(SftPrepError::data_format(format!(
            "Column '{name}' is not a string type"
        )))
    }

    fn value(&self, i: usize) -> Option<&'a str> {
        match *self {
            Self::Utf8(arr) => (!arr.is_null(i)).then(|| arr.value(i)),
            Self::LargeUtf8(arr) => (!arr.is_null(i)).then(|| arr.value(i)),
        }
    }
}

/// Load instruction records from a Parquet file.
///
/// Only the three mapped columns are decoded. Null cells become empty
/// strings.
///
/// # Errors
/// * `DataNotFound` if `path` does not exist
/// * `DataFormat` if the file is not valid Parquet or a column is missing
///   or not string-typed, or if the file cannot be opened
pub fn load_parquet_records<P: AsRef<Path>>(
    path: P,
    columns: &ColumnMapping,
) -> Result<Vec<InstructionRecord>> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(SftPrepError::DataNotFound(path.to_path_buf()));
    }
    let file = File::open(path).map_err(|e| {
        SftPrepError::data_format(format!("Cannot open {}: {e}", path.display()))
    })?;

    let builder = ParquetRecordBatchReaderBuilder::try_new(file).map_err(|e| {
        SftPrepError::data_format(format!(
            "Failed to read Parquet file {}: {e}",
            path.display()
        ))
    })?;

    let indices = validate_schema(builder.schema(), columns)?;
    let mask = ProjectionMask::roots(builder.parquet_schema(), indices);

    let reader = builder
        .with_projection(mask)
        .build()
        .map_err(|e| SftPrepError::data_format(format!("Failed to build Parquet reader: {e}")))?;

    let mut records = Vec::new();
    let mut null_cells = 0usize;

    for batch_result in reader {
        let batch = batch_result
            .map_err(|e| SftPrepError::data_format(format!("Failed to read Parquet batch: {e}")))?;

        let instruction = TextColumn::from_batch(&batch, &columns.instruction)?;
        let input = TextColumn::from_batch(&batch, &columns.input)?;
        let response = TextColumn::from_batch(&batch, &columns.target)?;

        for i in 0..batch.num_rows() {
            let mut cell = |col: &TextColumn<'_>| match col.value(i) {
                Some(s) => s.to_string(),
                None => {
                    null_cells += 1;
                    String::new()
                }
            };
            records.push(InstructionRecord {
                instruction: cell(&instruction),
                input: cell(&input),
                response: cell(&response),
            });
        }
    }

    if null_cells > 0 {
        tracing::debug!(null_cells, "Null cells read as empty strings");
    }
    tracing::debug!(rows = records.len(), path = %path.display(), "Loaded Parquet records");

    Ok(records)
}
