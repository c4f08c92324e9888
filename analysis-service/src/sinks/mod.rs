pub mod analysis;
pub mod csv_export;

pub use analysis::AnalysisSink;
