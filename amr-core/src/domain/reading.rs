use crate::domain::field::{Field, FieldDefault};

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum RecordError {
    #[error("reading for location '{location_id}' is missing required field {field}")]
    MissingRequiredField { location_id: String, field: Field },
    #[error("reading has an empty location id")]
    MissingLocation,
}

/// One decoded row, before defaults are applied.
///
/// `None` means the column was absent or the cell was empty. Values are
/// expected to already be numeric; coercion of bad cells happens upstream.
#[derive(Debug, Clone, PartialEq)]
pub struct RawReading {
    pub location_id: String,
    values: [Option<f64>; Field::COUNT],
}

impl RawReading {
    pub fn new(location_id: impl Into<String>) -> Self {
        Self {
            location_id: location_id.into(),
            values: [None; Field::COUNT],
        }
    }

    /// Builder-style setter, mostly useful in tests and fixtures.
    pub fn with(mut self, field: Field, value: f64) -> Self {
        self.set(field, value);
        self
    }

    pub fn set(&mut self, field: Field, value: f64) {
        self.values[field.index()] = Some(value);
    }

    pub fn clear(&mut self, field: Field) {
        self.values[field.index()] = None;
    }

    pub fn get(&self, field: Field) -> Option<f64> {
        self.values[field.index()]
    }

    /// Required fields that have no value, in column order.
    pub fn missing_required(&self) -> Vec<Field> {
        Field::ALL
            .iter()
            .copied()
            .filter(|f| f.is_required() && self.get(*f).is_none())
            .collect()
    }

    /// Resolve one field against its default contract.
    fn resolve(&self, field: Field) -> Result<f64, RecordError> {
        match (self.get(field), field.default_value()) {
            (Some(v), _) => Ok(v),
            (None, FieldDefault::Value(d)) => Ok(d),
            (None, FieldDefault::Required) => Err(RecordError::MissingRequiredField {
                location_id: self.location_id.clone(),
                field,
            }),
        }
    }
}

/// A validated reading: every field holds a concrete value.
///
/// Only constructible from a [`RawReading`], so the required/default split in
/// [`Field::default_value`] is always applied.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementRecord {
    location_id: String,
    pub current: [f64; 3],
    pub voltage: [f64; 3],
    pub active_power: [f64; 3],
    pub power_factor: [f64; 3],
    pub active_power_day: f64,
    pub active_power_night: f64,
    pub current_loop: f64,
    pub freeze: f64,
}

impl MeasurementRecord {
    pub fn from_raw(raw: &RawReading) -> Result<Self, RecordError> {
        if raw.location_id.trim().is_empty() {
            return Err(RecordError::MissingLocation);
        }

        let phases = |l1: Field, l2: Field, l3: Field| -> Result<[f64; 3], RecordError> {
            Ok([raw.resolve(l1)?, raw.resolve(l2)?, raw.resolve(l3)?])
        };

        Ok(Self {
            location_id: raw.location_id.clone(),
            current: phases(Field::CurrentL1, Field::CurrentL2, Field::CurrentL3)?,
            voltage: phases(Field::VoltageL1, Field::VoltageL2, Field::VoltageL3)?,
            active_power: phases(Field::ActivePowerL1, Field::ActivePowerL2, Field::ActivePowerL3)?,
            power_factor: phases(Field::PowerFactorL1, Field::PowerFactorL2, Field::PowerFactorL3)?,
            active_power_day: raw.resolve(Field::ActivePowerDay)?,
            active_power_night: raw.resolve(Field::ActivePowerNight)?,
            current_loop: raw.resolve(Field::CurrentLoop)?,
            freeze: raw.resolve(Field::Freeze)?,
        })
    }

    pub fn location_id(&self) -> &str {
        &self.location_id
    }
}

impl TryFrom<RawReading> for MeasurementRecord {
    type Error = RecordError;

    fn try_from(raw: RawReading) -> Result<Self, Self::Error> {
        MeasurementRecord::from_raw(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phases_only(location: &str) -> RawReading {
        RawReading::new(location)
            .with(Field::CurrentL1, 5.0)
            .with(Field::CurrentL2, 6.0)
            .with(Field::CurrentL3, 7.0)
            .with(Field::VoltageL1, 220.0)
            .with(Field::VoltageL2, 221.0)
            .with(Field::VoltageL3, 222.0)
    }

    #[test]
    fn optional_fields_take_their_declared_defaults() {
        let record = MeasurementRecord::from_raw(&phases_only("LOC-1")).unwrap();

        assert_eq!(record.location_id(), "LOC-1");
        assert_eq!(record.current, [5.0, 6.0, 7.0]);
        assert_eq!(record.voltage, [220.0, 221.0, 222.0]);
        assert_eq!(record.power_factor, [1.0, 1.0, 1.0]);
        assert_eq!(record.active_power, [0.0, 0.0, 0.0]);
        assert_eq!(record.active_power_day, 0.0);
        assert_eq!(record.active_power_night, 0.0);
        assert_eq!(record.current_loop, 0.0);
        assert_eq!(record.freeze, 0.0);
    }

    #[test]
    fn missing_phase_current_is_rejected() {
        let mut raw = phases_only("LOC-2");
        raw.clear(Field::CurrentL2);

        let err = MeasurementRecord::from_raw(&raw).unwrap_err();
        assert_eq!(
            err,
            RecordError::MissingRequiredField {
                location_id: "LOC-2".to_string(),
                field: Field::CurrentL2,
            }
        );
        assert_eq!(raw.missing_required(), vec![Field::CurrentL2]);
    }

    #[test]
    fn missing_voltage_is_rejected_via_try_from() {
        let mut raw = phases_only("LOC-3");
        raw.clear(Field::VoltageL3);

        let res = MeasurementRecord::try_from(raw);
        assert!(matches!(
            res,
            Err(RecordError::MissingRequiredField { field: Field::VoltageL3, .. })
        ));
    }

    #[test]
    fn blank_location_is_rejected() {
        let raw = RawReading { location_id: "  ".to_string(), ..phases_only("x") };
        assert_eq!(MeasurementRecord::from_raw(&raw), Err(RecordError::MissingLocation));
    }

    #[test]
    fn present_values_override_defaults() {
        let raw = phases_only("LOC-4")
            .with(Field::PowerFactorL1, 0.5)
            .with(Field::Freeze, 1.0);
        let record = MeasurementRecord::from_raw(&raw).unwrap();
        assert_eq!(record.power_factor, [0.5, 1.0, 1.0]);
        assert_eq!(record.freeze, 1.0);
    }
}
