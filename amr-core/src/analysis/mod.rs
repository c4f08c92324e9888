pub mod evaluator;
pub mod report;

pub use evaluator::{evaluate, evaluate_with, IndicatorThresholds};
pub use report::{top_candidates, AnalysisReport, AnalysisResult, AnalysisSummary, IndicatorCount};
