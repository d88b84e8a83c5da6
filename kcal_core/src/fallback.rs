//! Deterministic calorie formula used when the estimator's answer is unusable.
//!
//! `calories = round(base_rate_per_minute × duration × intensity_multiplier)`

/// Base rate for workout types not in the table
pub const DEFAULT_BASE_RATE: f64 = 6.0;

/// Per-minute base rates for the recognized workout types
const BASE_RATES: &[(&str, f64)] = &[
    ("walking", 4.0),
    ("running", 10.0),
    ("cycling", 8.0),
    ("swimming", 7.0),
    ("weightlifting", 5.0),
    ("yoga", 3.0),
];

/// Calories burned per minute for a workout type (case-insensitive)
pub fn base_rate(workout_type: &str) -> f64 {
    let key = workout_type.trim().to_lowercase();
    BASE_RATES
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, rate)| *rate)
        .unwrap_or(DEFAULT_BASE_RATE)
}

/// Multiplier for an intensity label; unknown labels count as medium
pub fn intensity_multiplier(intensity: &str) -> f64 {
    match intensity.trim().to_lowercase().as_str() {
        "low" => 0.8,
        "medium" => 1.0,
        "high" => 1.2,
        _ => 1.0,
    }
}

/// Closed-form estimate
///
/// Durations accepted by `WorkoutParams::validate` (at most
/// `MAX_DURATION_MINUTES`) keep the result far below `u32::MAX`.
pub fn calories(workout_type: &str, duration_minutes: u32, intensity: &str) -> u32 {
    let raw = base_rate(workout_type) * f64::from(duration_minutes) * intensity_multiplier(intensity);
    // Inputs are non-negative, so rounding half away from zero matches
    // rounding half up.
    raw.round() as u32
}
