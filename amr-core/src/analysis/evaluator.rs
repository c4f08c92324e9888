use serde::{Deserialize, Serialize};

use crate::domain::{IndicatorSet, MeasurementRecord};

/// Rule thresholds. `Default` holds the reference values used by the P2TL
/// target-operation screening.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorThresholds {
    /// `over_current`: any phase current above this (A).
    pub over_current: f64,
    /// `current_exceeds_max`: any phase current above this (A).
    pub current_max: f64,
    /// `over_voltage`: any phase voltage above this (V).
    pub over_voltage: f64,
    /// `voltage_drop`: spread between highest and lowest phase voltage (V).
    pub voltage_spread: f64,
    /// `low_power_factor`: any phase power factor below this.
    pub min_power_factor: f64,
    /// `low_current_low_voltage_with_power`: every current below this (A)...
    pub low_current: f64,
    /// ...every voltage below this (V)...
    pub low_voltage: f64,
    /// ...and some phase active power above this.
    pub active_power_floor: f64,
    /// `current_unbalance`: (max - min) / max above this ratio.
    pub current_unbalance_ratio: f64,
}

impl Default for IndicatorThresholds {
    fn default() -> Self {
        Self {
            over_current: 100.0,
            current_max: 120.0,
            over_voltage: 240.0,
            voltage_spread: 10.0,
            min_power_factor: 0.85,
            low_current: 1.0,
            low_voltage: 180.0,
            active_power_floor: 10.0,
            current_unbalance_ratio: 0.15,
        }
    }
}

/// Value the `CURRENT_LOOP` and `FREEZE` columns carry when the meter raised
/// the flag.
const FLAG_RAISED: f64 = 1.0;

/// Evaluate a record against the reference thresholds.
pub fn evaluate(record: &MeasurementRecord) -> IndicatorSet {
    evaluate_with(record, &IndicatorThresholds::default())
}

/// Evaluate every indicator for one record.
///
/// Pure and independent per record; rules do not influence each other.
pub fn evaluate_with(record: &MeasurementRecord, t: &IndicatorThresholds) -> IndicatorSet {
    let current = &record.current;
    let voltage = &record.voltage;
    let active_power = &record.active_power;

    let (min_i, max_i) = min_max(current);
    let (min_v, max_v) = min_max(voltage);

    IndicatorSet {
        current_lost: current.iter().all(|&i| i == 0.0),
        over_current: current.iter().any(|&i| i > t.over_current),
        over_voltage: voltage.iter().any(|&v| v > t.over_voltage),
        voltage_drop: max_v - min_v > t.voltage_spread,
        low_power_factor: record.power_factor.iter().any(|&pf| pf < t.min_power_factor),
        negative_active_power: active_power.iter().any(|&p| p < 0.0),
        low_current_low_voltage_with_power: current.iter().all(|&i| i < t.low_current)
            && voltage.iter().all(|&v| v < t.low_voltage)
            && active_power.iter().any(|&p| p > t.active_power_floor),
        // All-zero currents are balanced by definition; never divide by zero.
        current_unbalance: max_i > 0.0 && (max_i - min_i) / max_i > t.current_unbalance_ratio,
        voltage_lost: voltage.iter().any(|&v| v == 0.0),
        current_exceeds_max: current.iter().any(|&i| i > t.current_max),
        negative_active_power_day: record.active_power_day < 0.0,
        negative_active_power_night: record.active_power_night < 0.0,
        active_power_lost: active_power.iter().all(|&p| p == 0.0),
        current_loop_flag: record.current_loop == FLAG_RAISED,
        freeze_flag: record.freeze == FLAG_RAISED,
    }
}

fn min_max(phases: &[f64; 3]) -> (f64, f64) {
    phases
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &x| (lo.min(x), hi.max(x)))
}
