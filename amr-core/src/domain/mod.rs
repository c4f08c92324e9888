pub mod field;
pub mod indicator;
pub mod reading;

pub use field::{Field, FieldDefault};
pub use indicator::{Indicator, IndicatorSet};
pub use reading::{MeasurementRecord, RawReading, RecordError};
