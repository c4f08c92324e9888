use std::fmt;

use serde::Serialize;

/// Named anomaly indicators, in their fixed report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Indicator {
    CurrentLost,
    OverCurrent,
    OverVoltage,
    VoltageDrop,
    LowPowerFactor,
    NegativeActivePower,
    LowCurrentLowVoltageWithPower,
    CurrentUnbalance,
    VoltageLost,
    CurrentExceedsMax,
    NegativeActivePowerDay,
    NegativeActivePowerNight,
    ActivePowerLost,
    CurrentLoopFlag,
    FreezeFlag,
}

impl Indicator {
    pub const COUNT: usize = 15;

    pub const ALL: [Indicator; Indicator::COUNT] = [
        Indicator::CurrentLost,
        Indicator::OverCurrent,
        Indicator::OverVoltage,
        Indicator::VoltageDrop,
        Indicator::LowPowerFactor,
        Indicator::NegativeActivePower,
        Indicator::LowCurrentLowVoltageWithPower,
        Indicator::CurrentUnbalance,
        Indicator::VoltageLost,
        Indicator::CurrentExceedsMax,
        Indicator::NegativeActivePowerDay,
        Indicator::NegativeActivePowerNight,
        Indicator::ActivePowerLost,
        Indicator::CurrentLoopFlag,
        Indicator::FreezeFlag,
    ];

    /// Column / key name used in every export.
    pub fn name(self) -> &'static str {
        match self {
            Indicator::CurrentLost => "current_lost",
            Indicator::OverCurrent => "over_current",
            Indicator::OverVoltage => "over_voltage",
            Indicator::VoltageDrop => "voltage_drop",
            Indicator::LowPowerFactor => "low_power_factor",
            Indicator::NegativeActivePower => "negative_active_power",
            Indicator::LowCurrentLowVoltageWithPower => "low_current_low_voltage_with_power",
            Indicator::CurrentUnbalance => "current_unbalance",
            Indicator::VoltageLost => "voltage_lost",
            Indicator::CurrentExceedsMax => "current_exceeds_max",
            Indicator::NegativeActivePowerDay => "negative_active_power_day",
            Indicator::NegativeActivePowerNight => "negative_active_power_night",
            Indicator::ActivePowerLost => "active_power_lost",
            Indicator::CurrentLoopFlag => "current_loop_flag",
            Indicator::FreezeFlag => "freeze_flag",
        }
    }
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Indicator outcome for one record.
///
/// A plain struct rather than a map, so every set carries exactly the same
/// keys in the same order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IndicatorSet {
    pub current_lost: bool,
    pub over_current: bool,
    pub over_voltage: bool,
    pub voltage_drop: bool,
    pub low_power_factor: bool,
    pub negative_active_power: bool,
    pub low_current_low_voltage_with_power: bool,
    pub current_unbalance: bool,
    pub voltage_lost: bool,
    pub current_exceeds_max: bool,
    pub negative_active_power_day: bool,
    pub negative_active_power_night: bool,
    pub active_power_lost: bool,
    pub current_loop_flag: bool,
    pub freeze_flag: bool,
}

impl IndicatorSet {
    pub fn get(&self, indicator: Indicator) -> bool {
        match indicator {
            Indicator::CurrentLost => self.current_lost,
            Indicator::OverCurrent => self.over_current,
            Indicator::OverVoltage => self.over_voltage,
            Indicator::VoltageDrop => self.voltage_drop,
            Indicator::LowPowerFactor => self.low_power_factor,
            Indicator::NegativeActivePower => self.negative_active_power,
            Indicator::LowCurrentLowVoltageWithPower => self.low_current_low_voltage_with_power,
            Indicator::CurrentUnbalance => self.current_unbalance,
            Indicator::VoltageLost => self.voltage_lost,
            Indicator::CurrentExceedsMax => self.current_exceeds_max,
            Indicator::NegativeActivePowerDay => self.negative_active_power_day,
            Indicator::NegativeActivePowerNight => self.negative_active_power_night,
            Indicator::ActivePowerLost => self.active_power_lost,
            Indicator::CurrentLoopFlag => self.current_loop_flag,
            Indicator::FreezeFlag => self.freeze_flag,
        }
    }

    /// All indicators with their values, always in [`Indicator::ALL`] order.
    pub fn iter(&self) -> impl Iterator<Item = (Indicator, bool)> + '_ {
        Indicator::ALL.iter().map(move |i| (*i, self.get(*i)))
    }

    pub fn active(&self) -> impl Iterator<Item = Indicator> + '_ {
        self.iter().filter(|(_, on)| *on).map(|(i, _)| i)
    }

    pub fn active_count(&self) -> u8 {
        self.active().count() as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iteration_order_is_fixed() {
        let set = IndicatorSet::default();
        let names: Vec<&str> = set.iter().map(|(i, _)| i.name()).collect();
        assert_eq!(names.len(), Indicator::COUNT);
        assert_eq!(names.first(), Some(&"current_lost"));
        assert_eq!(names.last(), Some(&"freeze_flag"));
    }

    #[test]
    fn serialized_keys_match_indicator_names() {
        let set = IndicatorSet {
            voltage_drop: true,
            ..Default::default()
        };
        let value = serde_json::to_value(set).unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(obj.len(), Indicator::COUNT);
        for indicator in Indicator::ALL {
            assert_eq!(obj[indicator.name()], serde_json::json!(set.get(indicator)));
            assert_eq!(
                serde_json::to_value(indicator).unwrap(),
                serde_json::json!(indicator.name())
            );
        }
    }

    #[test]
    fn active_count_matches_true_flags() {
        let set = IndicatorSet {
            current_lost: true,
            active_power_lost: true,
            freeze_flag: true,
            ..Default::default()
        };
        assert_eq!(set.active_count(), 3);
        assert_eq!(
            set.active().collect::<Vec<_>>(),
            vec![Indicator::CurrentLost, Indicator::ActivePowerLost, Indicator::FreezeFlag]
        );
    }
}
