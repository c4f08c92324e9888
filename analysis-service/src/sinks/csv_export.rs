use std::{io, path::Path};

use amr_core::analysis::AnalysisResult;
use amr_core::domain::Indicator;

use crate::pipeline::PipelineError;

/// Export columns: location, one per indicator, then the active count.
pub fn header() -> Vec<&'static str> {
    let mut cols = Vec::with_capacity(Indicator::COUNT + 2);
    cols.push("location_id");
    cols.extend(Indicator::ALL.iter().map(|i| i.name()));
    cols.push("active_indicator_count");
    cols
}

fn sink_err(e: impl std::fmt::Display) -> PipelineError {
    PipelineError::Sink(format!("csv export failed: {e}"))
}

/// Write results as UTF-8 CSV with a header row, one line per result.
pub fn write_results<'a, W, I>(writer: W, results: I) -> Result<(), PipelineError>
where
    W: io::Write,
    I: IntoIterator<Item = &'a AnalysisResult>,
{
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(header()).map_err(sink_err)?;

    let mut row: Vec<String> = Vec::with_capacity(Indicator::COUNT + 2);
    for result in results {
        row.clear();
        row.push(result.location_id.clone());
        row.extend(result.indicators.iter().map(|(_, on)| on.to_string()));
        row.push(result.active_indicator_count.to_string());
        wtr.write_record(&row).map_err(sink_err)?;
    }

    wtr.flush().map_err(sink_err)?;
    Ok(())
}

pub fn to_csv_bytes<'a, I>(results: I) -> Result<Vec<u8>, PipelineError>
where
    I: IntoIterator<Item = &'a AnalysisResult>,
{
    let mut buf = Vec::new();
    write_results(&mut buf, results)?;
    Ok(buf)
}

pub fn write_results_file<'a, I>(path: &Path, results: I) -> Result<(), PipelineError>
where
    I: IntoIterator<Item = &'a AnalysisResult>,
{
    let file = std::fs::File::create(path)
        .map_err(|e| PipelineError::Sink(format!("failed to create '{}': {e}", path.display())))?;
    write_results(io::BufWriter::new(file), results)
}

/// BLAKE3 digest (hex) of an export; identical input gives identical digests.
pub fn digest(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}
