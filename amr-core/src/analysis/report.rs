use std::collections::HashSet;

use serde::Serialize;

use crate::analysis::evaluator::{evaluate_with, IndicatorThresholds};
use crate::domain::{Indicator, IndicatorSet, MeasurementRecord};

/// One row of the derived table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub location_id: String,
    #[serde(flatten)]
    pub indicators: IndicatorSet,
    pub active_indicator_count: u8,
}

impl AnalysisResult {
    pub fn new(location_id: impl Into<String>, indicators: IndicatorSet) -> Self {
        Self {
            location_id: location_id.into(),
            active_indicator_count: indicators.active_count(),
            indicators,
        }
    }

    pub fn from_record(record: &MeasurementRecord, thresholds: &IndicatorThresholds) -> Self {
        Self::new(record.location_id(), evaluate_with(record, thresholds))
    }

    /// A target-operation candidate has at least one active indicator.
    pub fn is_candidate(&self) -> bool {
        self.active_indicator_count > 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IndicatorCount {
    pub indicator: Indicator,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AnalysisSummary {
    pub total_rows: usize,
    pub unique_locations: usize,
    pub candidates: usize,
    pub rejected_rows: usize,
}

/// Result table of one analysis run, in input order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub results: Vec<AnalysisResult>,
    pub rejected_rows: usize,
}

impl AnalysisReport {
    pub fn new(results: Vec<AnalysisResult>, rejected_rows: usize) -> Self {
        Self { results, rejected_rows }
    }

    pub fn evaluate_all<'a, I>(records: I, thresholds: &IndicatorThresholds) -> Self
    where
        I: IntoIterator<Item = &'a MeasurementRecord>,
    {
        let results = records
            .into_iter()
            .map(|r| AnalysisResult::from_record(r, thresholds))
            .collect();
        Self::new(results, 0)
    }

    pub fn summary(&self) -> AnalysisSummary {
        let unique: HashSet<&str> = self.results.iter().map(|r| r.location_id.as_str()).collect();
        AnalysisSummary {
            total_rows: self.results.len(),
            unique_locations: unique.len(),
            candidates: self.results.iter().filter(|r| r.is_candidate()).count(),
            rejected_rows: self.rejected_rows,
        }
    }

    /// How many rows triggered each indicator, most frequent first. Ties keep
    /// indicator order.
    pub fn indicator_counts(&self) -> Vec<IndicatorCount> {
        let mut counts: Vec<IndicatorCount> = Indicator::ALL
            .iter()
            .map(|&indicator| IndicatorCount {
                indicator,
                count: self.results.iter().filter(|r| r.indicators.get(indicator)).count(),
            })
            .collect();
        counts.sort_by(|a, b| b.count.cmp(&a.count));
        counts
    }

    pub fn top_candidates(&self, n: usize) -> Vec<&AnalysisResult> {
        top_candidates(&self.results, n)
    }
}

/// Rank rows by `active_indicator_count` descending and keep the first `n`.
///
/// The sort is stable, so equal counts keep their input order.
pub fn top_candidates(results: &[AnalysisResult], n: usize) -> Vec<&AnalysisResult> {
    let mut ranked: Vec<&AnalysisResult> = results.iter().collect();
    ranked.sort_by(|a, b| b.active_indicator_count.cmp(&a.active_indicator_count));
    ranked.truncate(n);
    ranked
}
