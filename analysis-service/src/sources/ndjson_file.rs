use std::path::PathBuf;

use amr_core::domain::{Field, RawReading};
use async_stream::try_stream;
use serde_json::{Map, Value};
use tokio::{
    fs::File,
    io::{AsyncBufReadExt, BufReader},
};

use crate::pipeline::{Envelope, EnvelopeStream, PipelineError, Source};
use crate::sources::delimited_file::DEFAULT_LOCATION_COLUMN;
use crate::sources::normalize::{note_skipped_row, parse_numeric_cell};

/// NDJSON source for AMR readings.
///
/// Each non-blank line is a JSON object keyed by the export column names
/// (`LOCATION_CODE`, `CURRENT_L1`, ...). Numbers may arrive as JSON numbers or
/// strings; `null` means absent.
pub struct NdjsonReadingsSource {
    path: PathBuf,
    location_column: String,
}

impl NdjsonReadingsSource {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            location_column: DEFAULT_LOCATION_COLUMN.to_string(),
        }
    }

    pub fn with_location_column(mut self, column: impl Into<String>) -> Self {
        self.location_column = column.into();
        self
    }
}

fn location_of(obj: &Map<String, Value>, column: &str) -> Option<String> {
    let id = match obj.get(column)? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!id.is_empty()).then_some(id)
}

fn numeric_of(field: Field, value: &Value, row: usize) -> Option<f64> {
    match value {
        Value::Null => None,
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => parse_numeric_cell(field, s, row),
        other => parse_numeric_cell(field, &other.to_string(), row),
    }
}

/// Turn one parsed line into a reading; `None` when it has no location id.
pub(crate) fn object_to_reading(obj: &Map<String, Value>, location_column: &str, row: usize) -> Option<RawReading> {
    let mut reading = RawReading::new(location_of(obj, location_column)?);
    for field in Field::ALL {
        if let Some(v) = obj.get(field.column()).and_then(|v| numeric_of(field, v, row)) {
            reading.set(field, v);
        }
    }
    Some(reading)
}

#[async_trait::async_trait]
impl Source<RawReading> for NdjsonReadingsSource {
    async fn stream(&self) -> EnvelopeStream<RawReading> {
        let path = self.path.clone();
        let location_column = self.location_column.clone();
        let s = try_stream! {
            let file = File::open(&path).await.map_err(|e| {
                PipelineError::Source(format!("failed to open NDJSON file '{}': {e}", path.display()))
            })?;
            let reader = BufReader::new(file);
            let mut lines = reader.lines();
            let mut row = 0usize;

            while let Some(line) = lines.next_line().await.map_err(|e| {
                PipelineError::Source(format!("failed to read NDJSON line: {e}"))
            })? {
                if line.trim().is_empty() {
                    continue;
                }
                row += 1;

                let obj: Map<String, Value> = serde_json::from_str(&line).map_err(|e| {
                    PipelineError::Source(format!("failed to parse NDJSON record {row}: {e}"))
                })?;

                match object_to_reading(&obj, &location_column, row) {
                    Some(reading) => {
                        yield Envelope::new(reading, row);
                    }
                    None => note_skipped_row(row),
                }
            }
        };

        Box::pin(s)
    }
}
