use amr_core::analysis::{AnalysisReport, AnalysisResult, IndicatorThresholds};
use amr_core::domain::{MeasurementRecord, RawReading};
use futures::StreamExt;

use crate::pipeline::{Envelope, PipelineError, Sink};

/// Evaluates every reading that reaches it and assembles the report.
///
/// Rows rejected upstream by a transform are counted and skipped. A source
/// error aborts the run, since the rest of the input cannot be trusted.
pub struct AnalysisSink {
    thresholds: IndicatorThresholds,
}

impl AnalysisSink {
    pub fn new(thresholds: IndicatorThresholds) -> Self {
        Self { thresholds }
    }

    fn record_result(result: &AnalysisResult) {
        metrics::counter!("amr_rows_evaluated_total").increment(1);
        for indicator in result.indicators.active() {
            metrics::counter!("amr_indicator_triggered_total", "indicator" => indicator.name()).increment(1);
        }
    }

    fn reject(row: usize, reason: &dyn std::fmt::Display) {
        metrics::counter!("amr_rows_rejected_total").increment(1);
        tracing::warn!(row, reason = %reason, "row rejected");
    }
}

impl Default for AnalysisSink {
    fn default() -> Self {
        Self::new(IndicatorThresholds::default())
    }
}

#[async_trait::async_trait]
impl Sink<RawReading> for AnalysisSink {
    type Output = AnalysisReport;

    async fn run<S>(&self, mut input: S) -> Result<AnalysisReport, PipelineError>
    where
        S: futures::Stream<Item = Result<Envelope<RawReading>, PipelineError>> + Send + Unpin + 'static,
    {
        let mut results = Vec::new();
        let mut rejected = 0usize;

        while let Some(item) = input.next().await {
            let env = match item {
                Ok(env) => env,
                Err(PipelineError::Transform { row, reason }) => {
                    Self::reject(row, &reason);
                    rejected += 1;
                    continue;
                }
                Err(e) => {
                    tracing::error!(error = %e, "analysis run aborted");
                    return Err(e);
                }
            };

            match MeasurementRecord::from_raw(&env.payload) {
                Ok(record) => {
                    let result = AnalysisResult::from_record(&record, &self.thresholds);
                    Self::record_result(&result);
                    results.push(result);
                }
                Err(e) => {
                    Self::reject(env.row, &e);
                    rejected += 1;
                }
            }
        }

        let report = AnalysisReport::new(results, rejected);
        let summary = report.summary();
        tracing::info!(
            total_rows = summary.total_rows,
            unique_locations = summary.unique_locations,
            candidates = summary.candidates,
            rejected_rows = summary.rejected_rows,
            "analysis run complete"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use amr_core::domain::Field;

    use crate::pipeline::Pipeline;
    use crate::sinks::csv_export;
    use crate::sources::DelimitedReadingsSource;
    use crate::transform::{RequiredFieldCheck, RequiredFieldPolicy};

    const BODY: &str = "LOCATION_CODE,CURRENT_L1,CURRENT_L2,CURRENT_L3,VOLTAGE_L1,VOLTAGE_L2,VOLTAGE_L3,POWER_FACTOR_L1,POWER_FACTOR_L3\n\
                        P-001,0,0,0,220,220,220,0.9,0.9\n\
                        P-002,10,10,10,250,220,220,0.9,0.9\n\
                        P-003,10,,10,220,220,220,0.9,0.9\n\
                        ,1,1,1,1,1,1,1,1\n\
                        P-001,10,10.5,10,221,220,222,0.95,0.95\n";

    async fn run(policy: RequiredFieldPolicy) -> Result<AnalysisReport, PipelineError> {
        let pipeline: Pipeline<_, RawReading, _> = Pipeline {
            source: DelimitedReadingsSource::from_bytes(BODY.as_bytes().to_vec(), b','),
            transforms: vec![Arc::new(RequiredFieldCheck::new(policy))],
            sink: AnalysisSink::default(),
        };
        pipeline.run().await
    }

    #[tokio::test]
    async fn reject_policy_drops_incomplete_rows() {
        let report = run(RequiredFieldPolicy::Reject).await.unwrap();

        let locations: Vec<&str> = report.results.iter().map(|r| r.location_id.as_str()).collect();
        assert_eq!(locations, vec!["P-001", "P-002", "P-001"]);
        assert_eq!(report.rejected_rows, 1);

        let first = &report.results[0];
        assert!(first.indicators.current_lost);
        assert!(!first.indicators.current_unbalance);
        assert!(!first.indicators.over_current);

        let second = &report.results[1];
        assert!(second.indicators.over_voltage);
        assert!(second.indicators.voltage_drop);

        let summary = report.summary();
        assert_eq!(summary.total_rows, 3);
        assert_eq!(summary.unique_locations, 2);
        assert_eq!(summary.rejected_rows, 1);
    }

    #[tokio::test]
    async fn default_policy_evaluates_incomplete_rows_with_zero() {
        let report = run(RequiredFieldPolicy::DefaultToZero).await.unwrap();

        assert_eq!(report.results.len(), 4);
        assert_eq!(report.rejected_rows, 0);
        let third = &report.results[2];
        assert_eq!(third.location_id, "P-003");
        // 10, 0, 10 -> spread/max = 1.0
        assert!(third.indicators.current_unbalance);
        assert!(!third.indicators.current_lost);
    }

    #[tokio::test]
    async fn every_count_matches_its_flags() {
        let report = run(RequiredFieldPolicy::Reject).await.unwrap();
        for r in &report.results {
            assert_eq!(r.indicators.active_count(), r.active_indicator_count);
        }
    }

    #[tokio::test]
    async fn rerun_is_byte_identical() {
        let a = csv_export::to_csv_bytes(&run(RequiredFieldPolicy::Reject).await.unwrap().results).unwrap();
        let b = csv_export::to_csv_bytes(&run(RequiredFieldPolicy::Reject).await.unwrap().results).unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn source_error_aborts_the_run() {
        let pipeline: Pipeline<_, RawReading, _> = Pipeline {
            source: DelimitedReadingsSource::from_bytes(b"CURRENT_L1\n1\n".to_vec(), b','),
            transforms: vec![],
            sink: AnalysisSink::default(),
        };
        assert!(matches!(pipeline.run().await, Err(PipelineError::Source(_))));
    }

    #[tokio::test]
    async fn foreign_encoded_text_column_still_evaluates_every_row() {
        let mut body = b"LOCATION_CODE,NAMA,CURRENT_L1,CURRENT_L2,CURRENT_L3,VOLTAGE_L1,VOLTAGE_L2,VOLTAGE_L3\n".to_vec();
        body.extend_from_slice(b"A,JOS\xC9,0,0,0,220,220,220\nB,BUDI,1,1,1,220,220,220\n");

        let pipeline: Pipeline<_, RawReading, _> = Pipeline {
            source: DelimitedReadingsSource::from_bytes(body, b','),
            transforms: vec![Arc::new(RequiredFieldCheck::new(RequiredFieldPolicy::Reject))],
            sink: AnalysisSink::default(),
        };
        let report = pipeline.run().await.unwrap();

        assert_eq!(report.results.len(), 2);
        assert_eq!(report.rejected_rows, 0);
        assert!(report.results[0].indicators.current_lost);
        assert!(!report.results[1].indicators.current_lost);
    }

    #[tokio::test]
    async fn sink_alone_rejects_incomplete_readings() {
        let complete = RawReading::new("A")
            .with(Field::CurrentL1, 1.0)
            .with(Field::CurrentL2, 1.0)
            .with(Field::CurrentL3, 1.0)
            .with(Field::VoltageL1, 220.0)
            .with(Field::VoltageL2, 220.0)
            .with(Field::VoltageL3, 220.0);
        let mut partial = complete.clone();
        partial.clear(Field::VoltageL1);

        let items: Vec<Result<Envelope<RawReading>, PipelineError>> =
            vec![Ok(Envelope::new(complete, 1)), Ok(Envelope::new(partial, 2))];
        let report = AnalysisSink::default()
            .run(futures::stream::iter(items))
            .await
            .unwrap();

        assert_eq!(report.results.len(), 1);
        assert_eq!(report.rejected_rows, 1);
    }
}
