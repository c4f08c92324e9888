use std::{
    fs::File,
    io::{Cursor, Read},
    path::PathBuf,
    sync::Arc,
};

use amr_core::domain::RawReading;

use crate::pipeline::{Envelope, EnvelopeStream, PipelineError, Source};
use crate::sources::normalize::{note_skipped_row, ColumnLayout};

pub const DEFAULT_LOCATION_COLUMN: &str = "LOCATION_CODE";

#[derive(Debug, Clone)]
enum Input {
    File(PathBuf),
    Memory(Arc<[u8]>),
}

/// Delimited-text source for AMR readings: `,` CSV exports, `|` DAT exports,
/// or an uploaded body held in memory.
///
/// Expects a header row. The location column is required; recognized numeric
/// columns are optional and matched by exact name.
#[derive(Debug, Clone)]
pub struct DelimitedReadingsSource {
    input: Input,
    delimiter: u8,
    location_column: String,
}

impl DelimitedReadingsSource {
    pub fn csv_file<P: Into<PathBuf>>(path: P) -> Self {
        Self::new(Input::File(path.into()), b',')
    }

    /// Pipe-delimited `.dat` export.
    pub fn dat_file<P: Into<PathBuf>>(path: P) -> Self {
        Self::new(Input::File(path.into()), b'|')
    }

    pub fn from_bytes(bytes: impl Into<Arc<[u8]>>, delimiter: u8) -> Self {
        Self::new(Input::Memory(bytes.into()), delimiter)
    }

    pub fn with_location_column(mut self, column: impl Into<String>) -> Self {
        self.location_column = column.into();
        self
    }

    fn new(input: Input, delimiter: u8) -> Self {
        Self {
            input,
            delimiter,
            location_column: DEFAULT_LOCATION_COLUMN.to_string(),
        }
    }

    fn label(&self) -> &'static str {
        match (&self.input, self.delimiter) {
            (Input::Memory(_), _) => "upload",
            (Input::File(_), b'|') => "DAT file",
            (Input::File(_), _) => "CSV file",
        }
    }
}

#[async_trait::async_trait]
impl Source<RawReading> for DelimitedReadingsSource {
    async fn stream(&self) -> EnvelopeStream<RawReading> {
        // Blocking CSV reader inside a single async task; inputs are one
        // day's export, small enough not to starve the runtime.
        let input = self.input.clone();
        let delimiter = self.delimiter;
        let location_column = self.location_column.clone();
        let label = self.label();

        let s = async_stream::try_stream! {
            let reader: Box<dyn Read + Send> = match input {
                Input::File(path) => Box::new(File::open(&path).map_err(|e| {
                    PipelineError::Source(format!("failed to open {label} '{}': {e}", path.display()))
                })?),
                Input::Memory(bytes) => Box::new(Cursor::new(bytes)),
            };

            let mut rdr = csv::ReaderBuilder::new()
                .delimiter(delimiter)
                .flexible(true)
                .from_reader(reader);
            let headers = rdr
                .byte_headers()
                .map_err(|e| PipelineError::Source(format!("failed to read {label} headers: {e}")))?
                .clone();
            let layout = ColumnLayout::from_headers(&headers, &location_column)?;

            for (idx, result) in rdr.byte_records().enumerate() {
                let row = idx + 1;
                let record = result.map_err(|e| PipelineError::Source(format!(
                    "failed to read {label} record {row}: {e}"
                )))?;

                match layout.decode(&record, row) {
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
