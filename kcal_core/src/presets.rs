//! Built-in quick-start workouts.

use crate::Intensity;
use once_cell::sync::Lazy;

/// A named workout with a suggested duration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkoutPreset {
    pub name: &'static str,
    pub default_duration_minutes: u32,
}

impl WorkoutPreset {
    /// Presets always start at medium intensity
    pub fn intensity(&self) -> Intensity {
        Intensity::Medium
    }
}

static DEFAULT_PRESETS: Lazy<Vec<WorkoutPreset>> = Lazy::new(|| {
    vec![
        WorkoutPreset {
            name: "Running",
            default_duration_minutes: 30,
        },
        WorkoutPreset {
            name: "Swimming",
            default_duration_minutes: 45,
        },
        WorkoutPreset {
            name: "Cycling",
            default_duration_minutes: 40,
        },
        WorkoutPreset {
            name: "Weight Training",
            default_duration_minutes: 60,
        },
        WorkoutPreset {
            name: "Walking",
            default_duration_minutes: 30,
        },
    ]
});

/// All built-in presets, in display order
pub fn default_presets() -> &'static [WorkoutPreset] {
    &DEFAULT_PRESETS
}

/// Look up a preset by name (case-insensitive)
pub fn find_preset(name: &str) -> Option<&'static WorkoutPreset> {
    let name = name.trim();
    DEFAULT_PRESETS
        .iter()
        .find(|p| p.name.eq_ignore_ascii_case(name))
}
