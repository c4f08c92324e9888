pub mod analysis;
pub mod config;
pub mod metrics_server;
pub mod observability;
pub mod pipeline;
pub mod server;
pub mod sinks;
pub mod sources;
pub mod transform;

pub use analysis::{analyze, ReportView};
pub use pipeline::{Envelope, Pipeline};
