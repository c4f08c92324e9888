use analysis_service::{
    analyze,
    config::AppConfig,
    observability,
    sinks::csv_export,
    sources::ReadingsFileSource,
    ReportView,
};
use anyhow::{bail, Result};
use std::{
    env,
    path::{Path, PathBuf},
};

const DEFAULT_OUTPUT: &str = "analysis_result.csv";

/// `report.csv` -> `report.top.csv`
fn top_output_path(output: &Path) -> PathBuf {
    let stem = output.file_stem().and_then(|s| s.to_str()).unwrap_or("analysis_result");
    output.with_file_name(format!("{stem}.top.csv"))
}

/// Analyze one AMR export and write the result table as CSV.
///
/// Usage:
///   analyze_readings <input.csv|.dat|.ndjson> [output.csv]
///
/// The summary and per-indicator counts are printed to stdout as JSON.
#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        bail!("usage: analyze_readings <input_path> [output_csv]");
    }
    let input = Path::new(&args[1]);
    let output = PathBuf::from(args.get(2).map(String::as_str).unwrap_or(DEFAULT_OUTPUT));

    // Load configuration (AMR_ANALYSIS_CONFIG can point to a run-specific file).
    let cfg = AppConfig::load()?;
    let analysis_cfg = &cfg.analysis;

    let source = ReadingsFileSource::from_path(input, &analysis_cfg.location_column)?;
    let report = analyze(source, analysis_cfg).await?;

    let csv = csv_export::to_csv_bytes(&report.results)?;
    std::fs::write(&output, &csv)?;

    let top_path = top_output_path(&output);
    csv_export::write_results_file(&top_path, report.top_candidates(analysis_cfg.top_n))?;

    tracing::info!(
        input = %input.display(),
        output = %output.display(),
        top = %top_path.display(),
        digest = %csv_export::digest(&csv),
        "analysis written"
    );

    let view = ReportView::new(&report, analysis_cfg.top_n);
    let stdout = std::io::stdout();
    serde_json::to_writer_pretty(stdout.lock(), &serde_json::json!({
        "summary": view.summary,
        "indicator_counts": view.indicator_counts,
    }))?;
    println!();

    Ok(())
}
