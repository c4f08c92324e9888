use amr_core::domain::{Field, RawReading};
use csv::ByteRecord;

use crate::pipeline::PipelineError;

/// Parse one numeric cell.
///
/// Empty cells are absent. Anything that does not parse to a finite number is
/// coerced to 0, the same way the upstream export tooling treats junk cells.
pub fn parse_numeric_cell(field: Field, cell: &str, row: usize) -> Option<f64> {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return None;
    }
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() => Some(v),
        _ => {
            metrics::counter!("amr_numeric_coercions_total").increment(1);
            tracing::warn!(row, column = field.column(), value = trimmed, "non-numeric cell coerced to 0");
            Some(0.0)
        }
    }
}

/// Where the location column and each recognized field sit in a header row.
#[derive(Debug, Clone)]
pub struct ColumnLayout {
    location: usize,
    fields: Vec<(usize, Field)>,
}

impl ColumnLayout {
    pub fn from_headers(headers: &ByteRecord, location_column: &str) -> Result<Self, PipelineError> {
        let names: Vec<Option<&str>> = headers
            .iter()
            .map(|h| std::str::from_utf8(h).ok().map(str::trim))
            .collect();

        let location = names
            .iter()
            .position(|h| *h == Some(location_column))
            .ok_or_else(|| PipelineError::Source(format!("missing column '{location_column}' in header")))?;

        let mut fields: Vec<(usize, Field)> = Vec::new();
        for (idx, name) in names.iter().copied().enumerate() {
            let Some(field) = name.and_then(Field::from_column) else {
                continue;
            };
            // First occurrence wins on duplicated headers.
            if !fields.iter().any(|(_, f)| *f == field) {
                fields.push((idx, field));
            }
        }

        Ok(Self { location, fields })
    }

    /// Decode one data row. Rows without a location id yield `None`.
    ///
    /// Only the location cell and the recognized columns are decoded, so
    /// text in any other encoding elsewhere in the row is harmless.
    pub fn decode(&self, record: &ByteRecord, row: usize) -> Option<RawReading> {
        let location = String::from_utf8_lossy(record.get(self.location).unwrap_or_default());
        let location_id = location.trim();
        if location_id.is_empty() {
            return None;
        }

        let mut reading = RawReading::new(location_id);
        for (idx, field) in &self.fields {
            let Some(cell) = record.get(*idx) else {
                continue;
            };
            if let Some(v) = parse_numeric_cell(*field, &String::from_utf8_lossy(cell), row) {
                reading.set(*field, v);
            }
        }
        Some(reading)
    }
}

/// Bookkeeping for rows dropped before evaluation.
pub(crate) fn note_skipped_row(row: usize) {
    metrics::counter!("amr_rows_skipped_total").increment(1);
    tracing::debug!(row, "row without location id skipped");
}
