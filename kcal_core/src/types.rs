//! Core domain types for kcal.
//!
//! This module defines the fundamental types used throughout the system:
//! - Workout intensity and validated workout parameters
//! - Recorded workouts and derived statistics
//! - The inbound estimation request/response contract

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// Intensity
// ============================================================================

/// Perceived effort of a workout
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Intensity {
    Low,
    #[default]
    Medium,
    High,
}

impl Intensity {
    /// Lowercase label as stored and sent to the estimator
    pub fn as_str(&self) -> &'static str {
        match self {
            Intensity::Low => "low",
            Intensity::Medium => "medium",
            Intensity::High => "high",
        }
    }
}

impl FromStr for Intensity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Intensity::Low),
            "medium" => Ok(Intensity::Medium),
            "high" => Ok(Intensity::High),
            "" => Err(Error::Validation("intensity is required".into())),
            other => Err(Error::Validation(format!(
                "intensity must be one of low, medium, high (got '{}')",
                other
            ))),
        }
    }
}

/// Capitalized form used in tables ("Low", "Medium", "High")
impl fmt::Display for Intensity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Intensity::Low => "Low",
            Intensity::Medium => "Medium",
            Intensity::High => "High",
        };
        f.write_str(label)
    }
}

// ============================================================================
// Workout parameters
// ============================================================================

/// Longest accepted workout (24 hours)
///
/// Keeps every fallback estimate (at most 10 kcal/min × 1.2) well inside `u32`.
pub const MAX_DURATION_MINUTES: u32 = 24 * 60;

/// A validated (workout type, duration, intensity) triple
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkoutParams {
    pub workout_type: String,
    pub duration_minutes: u32,
    pub intensity: Intensity,
}

impl WorkoutParams {
    /// Validate raw caller input
    ///
    /// The workout type is trimmed, must be non-empty and may not contain
    /// control characters (it ends up as a single CSV field). The duration
    /// must be a whole number of minutes in `1..=MAX_DURATION_MINUTES` and the
    /// intensity one of low/medium/high (case-insensitive).
    pub fn validate(workout_type: &str, duration_minutes: i64, intensity: &str) -> Result<Self> {
        let workout_type = workout_type.trim();
        if workout_type.is_empty() {
            return Err(Error::Validation("workout type is required".into()));
        }
        if workout_type.chars().any(char::is_control) {
            return Err(Error::Validation(
                "workout type must be a single line of text".into(),
            ));
        }

        if duration_minutes <= 0 {
            return Err(Error::Validation(format!(
                "duration must be a positive number of minutes (got {})",
                duration_minutes
            )));
        }
        let duration_minutes = u32::try_from(duration_minutes)
            .ok()
            .filter(|minutes| *minutes <= MAX_DURATION_MINUTES)
            .ok_or_else(|| {
                Error::Validation(format!(
                    "duration of {} minutes is too large (at most {})",
                    duration_minutes, MAX_DURATION_MINUTES
                ))
            })?;

        let intensity = intensity.parse::<Intensity>()?;

        Ok(Self {
            workout_type: workout_type.to_string(),
            duration_minutes,
            intensity,
        })
    }
}

// ============================================================================
// Workout record
// ============================================================================

/// One completed, estimated workout
///
/// Records are immutable once created: there are getters but no setters. The
/// serialized field names (`type`, `duration`, `date`) match the layout of
/// previously exported history files.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkoutRecord {
    id: String,
    #[serde(rename = "type")]
    workout_type: String,
    #[serde(rename = "duration")]
    duration_minutes: u32,
    calories: u32,
    #[serde(rename = "date")]
    recorded_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    intensity: Option<Intensity>,
}

impl WorkoutRecord {
    /// Create a new record with a fresh id, stamped with the current time
    pub fn new(params: &WorkoutParams, calories: u32) -> Self {
        Self::with_id_and_time(
            Uuid::new_v4().to_string(),
            params.workout_type.clone(),
            params.duration_minutes,
            Some(params.intensity),
            calories,
            Utc::now(),
        )
    }

    /// Create a record with an explicit id and timestamp (imports, tests)
    pub fn with_id_and_time(
        id: impl Into<String>,
        workout_type: impl Into<String>,
        duration_minutes: u32,
        intensity: Option<Intensity>,
        calories: u32,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            workout_type: workout_type.into(),
            duration_minutes,
            calories,
            recorded_at,
            intensity,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn workout_type(&self) -> &str {
        &self.workout_type
    }

    pub fn duration_minutes(&self) -> u32 {
        self.duration_minutes
    }

    pub fn calories(&self) -> u32 {
        self.calories
    }

    pub fn recorded_at(&self) -> DateTime<Utc> {
        self.recorded_at
    }

    /// Stored intensity, if the record carries one
    pub fn intensity(&self) -> Option<Intensity> {
        self.intensity
    }

    /// Intensity for display; records without one read as medium
    pub fn display_intensity(&self) -> Intensity {
        self.intensity.unwrap_or_default()
    }
}

// ============================================================================
// Statistics
// ============================================================================

/// Aggregate metrics derived from the full history (never persisted)
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutStats {
    pub total_workouts: usize,
    pub total_calories: u64,
    pub total_duration: u64,
    pub avg_calories_per_workout: u64,
    pub avg_duration: u64,
    pub most_frequent_workout: String,
}

// ============================================================================
// Estimation wire contract
// ============================================================================

/// Inbound estimation request
///
/// Missing fields deserialize to empty/zero values so that they are reported
/// as validation failures rather than parse errors.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct EstimateRequest {
    #[serde(default)]
    pub workout_type: String,
    #[serde(default, alias = "duration")]
    pub duration_minutes: i64,
    #[serde(default)]
    pub intensity: String,
}

impl EstimateRequest {
    /// Parse a JSON request body; malformed bodies are validation failures
    pub fn from_json(body: &str) -> Result<Self> {
        serde_json::from_str(body)
            .map_err(|e| Error::Validation(format!("malformed request body: {}", e)))
    }

    pub fn validate(&self) -> Result<WorkoutParams> {
        WorkoutParams::validate(&self.workout_type, self.duration_minutes, &self.intensity)
    }
}

/// Successful estimation response
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct EstimateResponse {
    pub calories: u32,
}

/// Error payload returned to the caller of the estimation contract
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorPayload {
    #[serde(skip)]
    pub status: u16,
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorPayload {
    /// Map an error to its payload: 400 for validation, 503 when the
    /// estimator is unavailable, 500 otherwise
    pub fn from_error(err: &Error) -> Self {
        let (status, error) = match err {
            Error::Validation(_) => (400, "Invalid workout details"),
            Error::EstimatorUnavailable(_) => (503, "Calorie estimator unavailable"),
            _ => (500, "Failed to calculate calories"),
        };
        let details = match err {
            Error::Validation(msg) | Error::EstimatorUnavailable(msg) => msg.clone(),
            other => other.to_string(),
        };
        Self {
            status,
            error: error.to_string(),
            details: Some(details),
        }
    }

    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status)
    }
}
