pub mod delimited_file;
pub mod ndjson_file;
pub mod normalize;

use std::path::Path;

use amr_core::domain::RawReading;

pub use delimited_file::{DelimitedReadingsSource, DEFAULT_LOCATION_COLUMN};
pub use ndjson_file::NdjsonReadingsSource;

use crate::pipeline::{EnvelopeStream, PipelineError, Source};

/// File-backed source, picked by extension.
pub enum ReadingsFileSource {
    Delimited(DelimitedReadingsSource),
    Ndjson(NdjsonReadingsSource),
}

impl ReadingsFileSource {
    /// `.csv` and `.dat` map to delimited sources, `.ndjson`/`.jsonl` to NDJSON.
    pub fn from_path(path: &Path, location_column: &str) -> Result<Self, PipelineError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match ext.as_str() {
            "csv" | "txt" => Ok(Self::Delimited(
                DelimitedReadingsSource::csv_file(path).with_location_column(location_column),
            )),
            "dat" => Ok(Self::Delimited(
                DelimitedReadingsSource::dat_file(path).with_location_column(location_column),
            )),
            "ndjson" | "jsonl" => Ok(Self::Ndjson(
                NdjsonReadingsSource::new(path).with_location_column(location_column),
            )),
            other => Err(PipelineError::Source(format!(
                "unsupported input extension '{other}' for '{}' (expected csv, dat, ndjson or jsonl)",
                path.display()
            ))),
        }
    }
}

#[async_trait::async_trait]
impl Source<RawReading> for ReadingsFileSource {
    async fn stream(&self) -> EnvelopeStream<RawReading> {
        match self {
            Self::Delimited(s) => s.stream().await,
            Self::Ndjson(s) => s.stream().await,
        }
    }
}
