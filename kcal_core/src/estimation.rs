//! Calorie estimation service.
//!
//! The remote estimator is asked first. If its answer is not a plain integer,
//! or the call fails for any reason, the deterministic formula in
//! [`crate::fallback`] answers instead. Only validation failures and an
//! unavailable estimator ever reach the caller.

use crate::config::EstimatorConfig;
use crate::estimator::{Estimator, GeminiEstimator};
use crate::types::{ErrorPayload, EstimateRequest, EstimateResponse, WorkoutParams};
use crate::{fallback, Error, Result};
use std::sync::Arc;

/// Where an estimate came from
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EstimateSource {
    Estimator,
    Fallback,
}

/// A calorie estimate and its provenance
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Estimate {
    pub calories: u32,
    pub source: EstimateSource,
}

/// Stateless estimation service; clones share the underlying client
#[derive(Clone)]
pub struct EstimationService {
    estimator: Arc<dyn Estimator>,
}

impl EstimationService {
    pub fn new(estimator: Arc<dyn Estimator>) -> Self {
        Self { estimator }
    }

    /// Build the service against the Gemini estimator
    ///
    /// Fails with [`Error::EstimatorUnavailable`] when the client cannot be
    /// constructed. Missing credentials are already rejected while resolving
    /// the [`EstimatorConfig`].
    pub fn from_config(config: &EstimatorConfig) -> Result<Self> {
        let estimator = GeminiEstimator::new(config)?;
        tracing::debug!("Estimation service ready ({:?})", estimator);
        Ok(Self::new(Arc::new(estimator)))
    }

    /// Estimate calories for raw caller input
    pub async fn estimate(
        &self,
        workout_type: &str,
        duration_minutes: i64,
        intensity: &str,
    ) -> Result<u32> {
        let params = WorkoutParams::validate(workout_type, duration_minutes, intensity)?;
        Ok(self.estimate_params(&params).await.calories)
    }

    /// Estimate calories for already-validated parameters; never fails
    pub async fn estimate_params(&self, params: &WorkoutParams) -> Estimate {
        let prompt = build_prompt(params);

        let outcome = match self.estimator.generate(&prompt).await {
            Ok(text) => parse_calories(&text),
            Err(e) => Err(e),
        };

        match outcome {
            Ok(calories) => {
                tracing::info!(
                    estimator = self.estimator.name(),
                    calories,
                    "Estimated {} minutes of {}",
                    params.duration_minutes,
                    params.workout_type
                );
                Estimate {
                    calories,
                    source: EstimateSource::Estimator,
                }
            }
            Err(e) => {
                let calories = fallback::calories(
                    &params.workout_type,
                    params.duration_minutes,
                    params.intensity.as_str(),
                );
                tracing::warn!("Using fallback calculation ({} kcal): {}", calories, e);
                Estimate {
                    calories,
                    source: EstimateSource::Fallback,
                }
            }
        }
    }

    /// Serve the inbound request contract
    pub async fn handle(
        &self,
        request: &EstimateRequest,
    ) -> std::result::Result<EstimateResponse, ErrorPayload> {
        let params = request.validate().map_err(|e| ErrorPayload::from_error(&e))?;
        let estimate = self.estimate_params(&params).await;
        Ok(EstimateResponse {
            calories: estimate.calories,
        })
    }
}

/// Natural-language prompt describing the workout
pub fn build_prompt(params: &WorkoutParams) -> String {
    format!(
        "Calculate the approximate calories burned for a {} workout lasting {} minutes with {} intensity. \
         Consider factors like intensity and provide a reasonable estimate. \
         Return only the number of calories as a single integer.",
        params.workout_type,
        params.duration_minutes,
        params.intensity.as_str()
    )
}

/// Interpret estimator text as a non-negative base-10 integer
///
/// Surrounding whitespace is ignored; anything else (words, decimals, several
/// lines, a negative number) is a parse failure.
pub fn parse_calories(text: &str) -> Result<u32> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(Error::EstimationParse("empty response".into()));
    }
    if trimmed.lines().count() > 1 {
        return Err(Error::EstimationParse("multi-line response".into()));
    }
    trimmed.parse::<u32>().map_err(|e| {
        let snippet: String = trimmed.chars().take(64).collect();
        Error::EstimationParse(format!("'{}' is not a calorie count: {}", snippet, e))
    })
}
