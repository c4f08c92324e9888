use std::fmt;

/// What a reading holds for a field whose column is absent or empty.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldDefault {
    /// The field must be present; a reading without it is rejected.
    Required,
    /// The field falls back to this value.
    Value(f64),
}

/// The numeric columns recognized in an AMR export.
///
/// Column names match the upstream export headers exactly. Every other column
/// in the input is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    CurrentL1,
    CurrentL2,
    CurrentL3,
    VoltageL1,
    VoltageL2,
    VoltageL3,
    ActivePowerL1,
    ActivePowerL2,
    ActivePowerL3,
    PowerFactorL1,
    PowerFactorL2,
    PowerFactorL3,
    ActivePowerDay,
    ActivePowerNight,
    CurrentLoop,
    Freeze,
}

impl Field {
    pub const COUNT: usize = 16;

    pub const ALL: [Field; Field::COUNT] = [
        Field::CurrentL1,
        Field::CurrentL2,
        Field::CurrentL3,
        Field::VoltageL1,
        Field::VoltageL2,
        Field::VoltageL3,
        Field::ActivePowerL1,
        Field::ActivePowerL2,
        Field::ActivePowerL3,
        Field::PowerFactorL1,
        Field::PowerFactorL2,
        Field::PowerFactorL3,
        Field::ActivePowerDay,
        Field::ActivePowerNight,
        Field::CurrentLoop,
        Field::Freeze,
    ];

    /// Header name of the column in the source table.
    pub fn column(self) -> &'static str {
        match self {
            Field::CurrentL1 => "CURRENT_L1",
            Field::CurrentL2 => "CURRENT_L2",
            Field::CurrentL3 => "CURRENT_L3",
            Field::VoltageL1 => "VOLTAGE_L1",
            Field::VoltageL2 => "VOLTAGE_L2",
            Field::VoltageL3 => "VOLTAGE_L3",
            Field::ActivePowerL1 => "ACTIVE_POWER_L1",
            Field::ActivePowerL2 => "ACTIVE_POWER_L2",
            Field::ActivePowerL3 => "ACTIVE_POWER_L3",
            Field::PowerFactorL1 => "POWER_FACTOR_L1",
            Field::PowerFactorL2 => "POWER_FACTOR_L2",
            Field::PowerFactorL3 => "POWER_FACTOR_L3",
            Field::ActivePowerDay => "ACTIVE_POWER_SIANG",
            Field::ActivePowerNight => "ACTIVE_POWER_MALAM",
            Field::CurrentLoop => "CURRENT_LOOP",
            Field::Freeze => "FREEZE",
        }
    }

    pub fn from_column(name: &str) -> Option<Field> {
        Field::ALL.iter().copied().find(|f| f.column() == name)
    }

    /// The per-field default contract.
    ///
    /// Phase currents and voltages are required: defaulting them to zero would
    /// turn a data-quality gap into a `current_lost` or `voltage_lost` hit.
    pub fn default_value(self) -> FieldDefault {
        match self {
            Field::CurrentL1
            | Field::CurrentL2
            | Field::CurrentL3
            | Field::VoltageL1
            | Field::VoltageL2
            | Field::VoltageL3 => FieldDefault::Required,
            Field::PowerFactorL1 | Field::PowerFactorL2 | Field::PowerFactorL3 => {
                FieldDefault::Value(1.0)
            }
            Field::ActivePowerL1
            | Field::ActivePowerL2
            | Field::ActivePowerL3
            | Field::ActivePowerDay
            | Field::ActivePowerNight
            | Field::CurrentLoop
            | Field::Freeze => FieldDefault::Value(0.0),
        }
    }

    pub fn is_required(self) -> bool {
        self.default_value() == FieldDefault::Required
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_names_round_trip() {
        for field in Field::ALL {
            assert_eq!(Field::from_column(field.column()), Some(field));
        }
        assert_eq!(Field::from_column("LOCATION_CODE"), None);
        assert_eq!(Field::from_column("current_l1"), None);
    }

    #[test]
    fn only_phase_current_and_voltage_are_required() {
        let required: Vec<Field> = Field::ALL.iter().copied().filter(|f| f.is_required()).collect();
        assert_eq!(
            required,
            vec![
                Field::CurrentL1,
                Field::CurrentL2,
                Field::CurrentL3,
                Field::VoltageL1,
                Field::VoltageL2,
                Field::VoltageL3,
            ]
        );
    }

    #[test]
    fn power_factor_defaults_to_one() {
        assert_eq!(Field::PowerFactorL2.default_value(), FieldDefault::Value(1.0));
        assert_eq!(Field::Freeze.default_value(), FieldDefault::Value(0.0));
    }

    #[test]
    fn index_matches_position_in_all() {
        for (i, field) in Field::ALL.iter().enumerate() {
            assert_eq!(field.index(), i);
        }
    }
}
