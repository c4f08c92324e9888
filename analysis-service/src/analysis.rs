use std::sync::Arc;

use amr_core::analysis::{AnalysisReport, AnalysisResult, AnalysisSummary, IndicatorCount};
use amr_core::domain::RawReading;
use serde::Serialize;

use crate::config::AnalysisConfig;
use crate::pipeline::{Pipeline, PipelineError, Source};
use crate::sinks::AnalysisSink;
use crate::transform::RequiredFieldCheck;

/// Run one analysis over `source` with the configured policy and thresholds.
pub async fn analyze<S>(source: S, cfg: &AnalysisConfig) -> Result<AnalysisReport, PipelineError>
where
    S: Source<RawReading> + Send + Sync + 'static,
{
    let pipeline: Pipeline<_, RawReading, _> = Pipeline {
        source,
        transforms: vec![Arc::new(RequiredFieldCheck::new(cfg.required_fields))],
        sink: AnalysisSink::new(cfg.thresholds.clone()),
    };
    pipeline.run().await
}

/// Serializable view of a report: summary, indicator counts, the ranked
/// candidates and optionally the full result table.
#[derive(Debug, Serialize)]
pub struct ReportView<'a> {
    pub summary: AnalysisSummary,
    pub indicator_counts: Vec<IndicatorCount>,
    pub top_candidates: Vec<&'a AnalysisResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<&'a [AnalysisResult]>,
}

impl<'a> ReportView<'a> {
    pub fn new(report: &'a AnalysisReport, top_n: usize) -> Self {
        Self {
            summary: report.summary(),
            indicator_counts: report.indicator_counts(),
            top_candidates: report.top_candidates(top_n),
            results: None,
        }
    }

    pub fn with_results(mut self, report: &'a AnalysisReport) -> Self {
        self.results = Some(&report.results);
        self
    }
}
